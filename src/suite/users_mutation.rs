use serde_json::{Value, json};

use super::{entity, ensure_valid, matches_validation_failure, payload};
use crate::factory::{self, UserOverrides};
use crate::fixture::{self, with_user};
use crate::harness::Harness;
use crate::models::{UpdateUserInput, User};
use crate::schema::user_schema;
use crate::{Result, operations};

pub async fn create(harness: &Harness) -> Result<()> {
    let client = harness.client();
    with_user(client, UserOverrides::default(), |created| async move {
        let (input, user) = (created.input, created.entity);
        ensure!(user.id > 0, "id {} is not positive", user.id);
        ensure!(user.name == input.name, "name {:?} != {:?}", user.name, input.name);
        ensure!(user.email == input.email, "email {:?} != {:?}", user.email, input.email);
        ensure!(user.gender == input.gender, "gender {} != {}", user.gender, input.gender);
        ensure!(user.status == input.status, "status {} != {}", user.status, input.status);
        ensure_valid(harness, &user_schema(), &serde_json::to_value(&user)?)?;

        let fetched = client
            .query::<Value>(operations::GET_USER_BY_ID, Some(json!({ "id": user.id })))
            .await?;
        let fetched: User = serde_json::from_value(payload(fetched, "user")?)?;
        ensure!(fetched == user, "round trip returned {:?}", fetched);
        Ok(())
    })
    .await
}

pub async fn update(harness: &Harness) -> Result<()> {
    let client = harness.client();
    with_user(client, UserOverrides::default(), |created| async move {
        let id = created.entity.id;
        let name = format!("Updated Name {}", factory::unique_stamp());
        let input = UpdateUserInput {
            id,
            name: Some(name.clone()),
            ..Default::default()
        };
        let response = client
            .mutation::<Value>(operations::UPDATE_USER, Some(json!({ "input": input })))
            .await?;
        ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
        let user: User = serde_json::from_value(entity(payload(response, "updateUser")?, "user")?)?;
        ensure!(user.id == id, "updated {} instead of {}", user.id, id);
        ensure!(user.name == name, "name is {:?}", user.name);
        Ok(())
    })
    .await
}

pub async fn delete(harness: &Harness) -> Result<()> {
    let client = harness.client();
    let created = fixture::provision_user(client, UserOverrides::default()).await?;
    let Some(user) = created.entity else {
        return Err(crate::Error::MissingEntity("user"));
    };
    let response = fixture::delete::<User>(client, user.id).await?;
    ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
    ensure!(
        response.data().is_some_and(|data| data.get("deleteUser").is_some()),
        "deleteUser missing from {:?}",
        response.data()
    );
    Ok(())
}

pub async fn invalid_email(harness: &Harness) -> Result<()> {
    let input = factory::user_input(UserOverrides {
        email: Some("invalid-email".to_owned()),
        ..Default::default()
    });
    let response = harness
        .client()
        .query_with_errors::<Value>(operations::CREATE_USER, Some(json!({ "input": input })))
        .await?;
    ensure!(response.has_errors(), "invalid email was accepted");
    ensure!(
        matches_validation_failure(response.first_error_message()),
        "unexpected message {:?}",
        response.first_error_message()
    );
    Ok(())
}

pub async fn duplicate_email(harness: &Harness) -> Result<()> {
    let client = harness.client();
    with_user(client, UserOverrides::default(), |created| async move {
        let duplicate = factory::user_input(UserOverrides {
            email: Some(created.entity.email.clone()),
            ..Default::default()
        });
        let response = client
            .query_with_errors::<Value>(operations::CREATE_USER, Some(json!({ "input": duplicate })))
            .await?;
        let leaked = response
            .data()
            .and_then(|data| data.pointer("/createUser/user/id"))
            .and_then(Value::as_u64);
        if let Some(id) = leaked {
            fixture::delete::<User>(client, id).await.ok();
        }
        ensure!(response.has_errors(), "duplicate email was accepted");
        Ok(())
    })
    .await
}

pub async fn cleanup(harness: &Harness) -> Result<()> {
    let client = harness.client();
    let id = with_user(client, UserOverrides::default(), |created| async move {
        Ok(created.entity.id)
    })
    .await?;

    let response = client
        .query_with_errors::<Value>(operations::GET_USER_BY_ID, Some(json!({ "id": id })))
        .await?;
    let gone = response.has_errors()
        || response
            .data()
            .and_then(|data| data.get("user"))
            .is_some_and(Value::is_null);
    ensure!(gone, "user {} still exists after cleanup", id);
    Ok(())
}
