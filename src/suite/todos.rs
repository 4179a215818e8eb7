use serde_json::{Value, json};

use super::{entity, ensure_valid, payload};
use crate::factory::{self, TodoOverrides, UserOverrides};
use crate::fixture::{self, with_todo, with_user};
use crate::graphql::Connection;
use crate::harness::Harness;
use crate::models::{Todo, TodoStatus, UpdateTodoInput};
use crate::schema::todo_schema;
use crate::{Result, operations};

pub async fn fetch_list(harness: &Harness) -> Result<()> {
    let response = harness
        .client()
        .query::<Value>(operations::GET_TODOS, Some(json!({ "first": 10 })))
        .await?;
    ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
    let todos = payload(response, "todos")?;
    if let Some(nodes) = todos.get("nodes").and_then(Value::as_array) {
        for node in nodes {
            ensure_valid(harness, &todo_schema(), node)?;
        }
    }
    let todos: Connection<Todo> = serde_json::from_value(todos)?;
    ensure!(todos.nodes.len() <= 10, "{} nodes for a page of 10", todos.nodes.len());
    Ok(())
}

pub async fn create(harness: &Harness) -> Result<()> {
    let client = harness.client();
    with_user(client, UserOverrides::default(), |user| async move {
        let user_id = user.entity.id;
        with_todo(client, user_id, TodoOverrides::default(), |created| async move {
            let (input, todo) = (created.input, created.entity);
            ensure!(todo.title == input.title, "title {:?} != {:?}", todo.title, input.title);
            ensure!(todo.status == input.status, "status {} != {}", todo.status, input.status);
            ensure!(todo.user_id == user_id, "todo belongs to {}", todo.user_id);
            ensure_valid(harness, &todo_schema(), &serde_json::to_value(&todo)?)
        })
        .await
    })
    .await
}

pub async fn fetch_by_id(harness: &Harness) -> Result<()> {
    let client = harness.client();
    with_user(client, UserOverrides::default(), |user| async move {
        let user_id = user.entity.id;
        with_todo(client, user_id, TodoOverrides::default(), |created| async move {
            let response = client
                .query::<Value>(
                    operations::GET_TODO_BY_ID,
                    Some(json!({ "id": created.entity.id })),
                )
                .await?;
            ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
            let todo: Todo = serde_json::from_value(payload(response, "todo")?)?;
            ensure!(todo.id == created.entity.id, "fetched todo {}", todo.id);
            ensure!(todo.user_id == user_id, "todo belongs to {}", todo.user_id);
            Ok(())
        })
        .await
    })
    .await
}

pub async fn update_status(harness: &Harness) -> Result<()> {
    let client = harness.client();
    with_user(client, UserOverrides::default(), |user| async move {
        with_todo(client, user.entity.id, TodoOverrides::default(), |created| async move {
            let input = UpdateTodoInput {
                id: created.entity.id,
                status: Some(TodoStatus::Completed),
                ..Default::default()
            };
            let response = client
                .mutation::<Value>(operations::UPDATE_TODO, Some(json!({ "input": input })))
                .await?;
            ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
            let todo: Todo = serde_json::from_value(entity(payload(response, "updateTodo")?, "todo")?)?;
            ensure!(todo.status == TodoStatus::Completed, "status is {}", todo.status);
            Ok(())
        })
        .await
    })
    .await
}

pub async fn delete(harness: &Harness) -> Result<()> {
    let client = harness.client();
    with_user(client, UserOverrides::default(), |user| async move {
        let input = factory::todo_input(user.entity.id, TodoOverrides::default());
        let created = fixture::provision::<Todo>(client, input).await?;
        let Some(todo) = created.entity else {
            return Err(crate::Error::MissingEntity("todo"));
        };
        let response = fixture::delete::<Todo>(client, todo.id).await?;
        ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
        Ok(())
    })
    .await
}
