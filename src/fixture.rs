//! Server-side entities owned by a single test.
//!
//! [`with_resource`] creates an entity, hands it to the test body and deletes it
//! afterwards on every exit path: normal return, returned error, panic, or the
//! fixture future being dropped before it completes. The
//! deletion is best effort and its failures are only logged, so the body's own
//! outcome is always the one reported.
//!
//! [`provision`] creates without ever deleting, for tests that observe or remove
//! the entity themselves.

use futures::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;

use crate::client::GraphQLClient;
use crate::factory::{self, PostOverrides, TodoOverrides, UserOverrides};
use crate::graphql::Envelope;
use crate::models::{
    CreatePostInput, CreateTodoInput, CreateUserInput, DeleteInput, Post, Todo, User,
};
use crate::{Error, Result, operations};

/// An entity type with uniform `create<Entity>` / `delete<Entity>` mutations.
pub trait Resource: DeserializeOwned + Send + 'static {
    type Input: Serialize + Send + Sync;

    const CREATE_MUTATION: &'static str;
    const DELETE_MUTATION: &'static str;
    /// Name of the create mutation's payload field, e.g. `createUser`.
    const CREATE_FIELD: &'static str;
    /// Name of the entity inside create and delete payloads, e.g. `user`.
    const ENTITY_FIELD: &'static str;
}

impl Resource for User {
    type Input = CreateUserInput;

    const CREATE_MUTATION: &'static str = operations::CREATE_USER;
    const DELETE_MUTATION: &'static str = operations::DELETE_USER;
    const CREATE_FIELD: &'static str = "createUser";
    const ENTITY_FIELD: &'static str = "user";
}

impl Resource for Post {
    type Input = CreatePostInput;

    const CREATE_MUTATION: &'static str = operations::CREATE_POST;
    const DELETE_MUTATION: &'static str = operations::DELETE_POST;
    const CREATE_FIELD: &'static str = "createPost";
    const ENTITY_FIELD: &'static str = "post";
}

impl Resource for Todo {
    type Input = CreateTodoInput;

    const CREATE_MUTATION: &'static str = operations::CREATE_TODO;
    const DELETE_MUTATION: &'static str = operations::DELETE_TODO;
    const CREATE_FIELD: &'static str = "createTodo";
    const ENTITY_FIELD: &'static str = "todo";
}

/// What a fixture hands to the test body.
#[derive(Clone, Debug)]
pub struct Created<I, E> {
    pub input: I,
    pub entity: E,
}

/// Creates an `R` and returns the raw entity, `None` when the service did not
/// hand one back.
async fn create_raw<R: Resource>(
    client: &GraphQLClient,
    input: &R::Input,
) -> Result<Option<Value>> {
    let variables = json!({ "input": serde_json::to_value(input)? });
    let envelope = client
        .mutation::<Value>(R::CREATE_MUTATION, Some(variables))
        .await?;
    if let Some(message) = envelope.first_error_message() {
        log::debug!("{} rejected: {}", R::CREATE_FIELD, message);
    }
    Ok(envelope
        .data
        .and_then(|mut data| data.get_mut(R::CREATE_FIELD).map(Value::take))
        .and_then(|mut payload| payload.get_mut(R::ENTITY_FIELD).map(Value::take))
        .filter(|entity| !entity.is_null()))
}

/// Sends `delete<Entity>` for `id` in strict mode.
pub async fn delete<R: Resource>(client: &GraphQLClient, id: u64) -> Result<Envelope<Value>> {
    let input = DeleteInput { id };
    client
        .mutation(R::DELETE_MUTATION, Some(json!({ "input": input })))
        .await
}

async fn release<R: Resource>(client: &GraphQLClient, id: u64) {
    match delete::<R>(client, id).await {
        Ok(envelope) if envelope.has_errors() => log::warn!(
            "cleanup of {} {} reported: {}",
            R::ENTITY_FIELD,
            id,
            envelope.first_error_message().unwrap_or_default()
        ),
        Ok(..) => log::debug!("deleted {} {}", R::ENTITY_FIELD, id),
        Err(error) => log::warn!("cleanup of {} {} failed: {}", R::ENTITY_FIELD, id, error),
    }
}

/// Pending deletion of one created entity.
///
/// Dropping it before [`Cleanup::run`] has finished (the owning future was
/// cancelled, for instance by a timeout) hands the deletion to the current tokio
/// runtime instead.
struct Cleanup<R: Resource> {
    client: GraphQLClient,
    id: u64,
    done: bool,
    resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Cleanup<R> {
    fn new(client: &GraphQLClient, id: u64) -> Self {
        Self {
            client: client.clone(),
            id,
            done: false,
            resource: PhantomData,
        }
    }

    async fn run(mut self) {
        release::<R>(&self.client, self.id).await;
        self.done = true;
    }
}

impl<R: Resource> Drop for Cleanup<R> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                log::debug!("{} {} abandoned, deleting in background", R::ENTITY_FIELD, self.id);
                let client = self.client.clone();
                let id = self.id;
                handle.spawn(async move { release::<R>(&client, id).await });
            }
            Err(..) => log::warn!(
                "{} {} left behind: no runtime to delete it on",
                R::ENTITY_FIELD,
                self.id
            ),
        }
    }
}

/// Creates an `R` from `input`, runs `body` with it, then deletes it.
///
/// Fails with [`Error::MissingEntity`] without running `body` when the service
/// does not return the created entity.
pub async fn with_resource<R, F, Fut, T>(
    client: &GraphQLClient,
    input: R::Input,
    body: F,
) -> Result<T>
where
    R: Resource,
    F: FnOnce(Created<R::Input, R>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let raw = create_raw::<R>(client, &input)
        .await?
        .ok_or(Error::MissingEntity(R::ENTITY_FIELD))?;
    let id = raw
        .get("id")
        .and_then(Value::as_u64)
        .ok_or(Error::MissingEntity(R::ENTITY_FIELD))?;
    log::debug!("created {} {}", R::ENTITY_FIELD, id);
    let cleanup = Cleanup::<R>::new(client, id);

    let entity = match serde_json::from_value::<R>(raw) {
        Ok(entity) => entity,
        Err(error) => {
            cleanup.run().await;
            return Err(error.into());
        }
    };
    let outcome = AssertUnwindSafe(body(Created { input, entity }))
        .catch_unwind()
        .await;
    cleanup.run().await;
    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

pub async fn with_user<F, Fut, T>(
    client: &GraphQLClient,
    overrides: UserOverrides,
    body: F,
) -> Result<T>
where
    F: FnOnce(Created<CreateUserInput, User>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_resource::<User, _, _, _>(client, factory::user_input(overrides), body).await
}

pub async fn with_post<F, Fut, T>(
    client: &GraphQLClient,
    user_id: u64,
    overrides: PostOverrides,
    body: F,
) -> Result<T>
where
    F: FnOnce(Created<CreatePostInput, Post>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_resource::<Post, _, _, _>(client, factory::post_input(user_id, overrides), body).await
}

pub async fn with_todo<F, Fut, T>(
    client: &GraphQLClient,
    user_id: u64,
    overrides: TodoOverrides,
    body: F,
) -> Result<T>
where
    F: FnOnce(Created<CreateTodoInput, Todo>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_resource::<Todo, _, _, _>(client, factory::todo_input(user_id, overrides), body).await
}

/// Creates an `R` and leaves it in place.
///
/// Protocol-level rejections yield `entity: None` rather than an error.
pub async fn provision<R: Resource>(
    client: &GraphQLClient,
    input: R::Input,
) -> Result<Created<R::Input, Option<R>>> {
    let entity = create_raw::<R>(client, &input)
        .await?
        .map(serde_json::from_value)
        .transpose()?;
    Ok(Created { input, entity })
}

pub async fn provision_user(
    client: &GraphQLClient,
    overrides: UserOverrides,
) -> Result<Created<CreateUserInput, Option<User>>> {
    provision::<User>(client, factory::user_input(overrides)).await
}
