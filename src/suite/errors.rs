use serde_json::{Value, json};

use super::{ensure_valid, matches_validation_failure};
use crate::factory::{self, UserOverrides};
use crate::fixture;
use crate::harness::Harness;
use crate::models::User;
use crate::schema::graphql_error_schema;
use crate::{Result, operations};

const INVALID_QUERY: &str = "query { users { invalid_field_name } }";

pub async fn invalid_syntax(harness: &Harness) -> Result<()> {
    let response = harness
        .client()
        .query_with_errors::<Value>(INVALID_QUERY, None)
        .await?;
    ensure!(response.has_errors(), "invalid query was accepted");
    for error in response.errors() {
        ensure!(!error.message.is_empty(), "error without a message");
        ensure_valid(harness, &graphql_error_schema(), &serde_json::to_value(error)?)?;
    }
    Ok(())
}

pub async fn missing_fields(harness: &Harness) -> Result<()> {
    let response = harness
        .client()
        .query_with_errors::<Value>(
            operations::CREATE_USER,
            Some(json!({ "input": { "name": "Test" } })),
        )
        .await?;
    ensure!(response.has_errors(), "incomplete input was accepted");
    Ok(())
}

pub async fn invalid_types(harness: &Harness) -> Result<()> {
    let response = harness
        .client()
        .query_with_errors::<Value>(operations::GET_USER_BY_ID, Some(json!({ "id": "invalid" })))
        .await?;
    ensure!(response.has_errors(), "non-numeric id was accepted");
    Ok(())
}

pub async fn field_constraints(harness: &Harness) -> Result<()> {
    let input = factory::user_input(UserOverrides {
        email: Some("invalid email".to_owned()),
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

pub async fn unauthorized(harness: &Harness) -> Result<()> {
    let anonymous = harness.unauthorized_client()?;
    let input = factory::user_input(UserOverrides::default());
    let response = anonymous
        .query_with_errors::<Value>(operations::CREATE_USER, Some(json!({ "input": input })))
        .await?;
    let leaked = response
        .data()
        .and_then(|data| data.pointer("/createUser/user/id"))
        .and_then(Value::as_u64);
    if let Some(id) = leaked {
        fixture::delete::<User>(harness.client(), id).await.ok();
    }
    ensure!(response.has_errors(), "anonymous mutation was accepted");
    Ok(())
}
