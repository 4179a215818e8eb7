use serde_json::{Value, json};

use super::{ensure_valid, payload};
use crate::graphql::Connection;
use crate::harness::Harness;
use crate::models::User;
use crate::schema::{connection_schema, user_schema};
use crate::{Result, operations};

pub async fn fetch_list(harness: &Harness) -> Result<()> {
    let response = harness
        .client()
        .query::<Value>(operations::GET_USERS, Some(json!({ "first": 10 })))
        .await?;
    ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
    let users = payload(response, "users")?;
    ensure_valid(harness, &connection_schema(user_schema()), &users)?;

    let users: Connection<User> = serde_json::from_value(users)?;
    ensure!(!users.nodes.is_empty(), "no users returned");
    ensure!(users.total_count > 0, "totalCount is {}", users.total_count);
    Ok(())
}

pub async fn fetch_by_id(harness: &Harness) -> Result<()> {
    let first = harness
        .client()
        .query::<Value>(operations::GET_USERS, Some(json!({ "first": 1 })))
        .await?;
    let first: Connection<User> = serde_json::from_value(payload(first, "users")?)?;
    let Some(expected) = first.nodes.into_iter().next() else {
        return Err(crate::Error::Assertion("no user to fetch".to_owned()));
    };

    let response = harness
        .client()
        .query::<Value>(operations::GET_USER_BY_ID, Some(json!({ "id": expected.id })))
        .await?;
    ensure!(!response.has_errors(), "unexpected errors: {:?}", response.errors());
    let user = payload(response, "user")?;
    ensure_valid(harness, &user_schema(), &user)?;
    let user: User = serde_json::from_value(user)?;
    ensure!(user.id == expected.id, "fetched {} instead of {}", user.id, expected.id);
    Ok(())
}

pub async fn page_info(harness: &Harness) -> Result<()> {
    let response = harness
        .client()
        .query::<Value>(operations::GET_USERS, Some(json!({ "first": 5 })))
        .await?;
    let users: Connection<User> = serde_json::from_value(payload(response, "users")?)?;
    ensure!(users.page_info.is_some(), "pageInfo missing");
    ensure!(users.nodes.len() <= 5, "{} nodes for a page of 5", users.nodes.len());
    Ok(())
}

pub async fn missing_user(harness: &Harness) -> Result<()> {
    let response = harness
        .client()
        .query_with_errors::<Value>(
            operations::GET_USER_BY_ID,
            Some(json!({ "id": 999_999_999 })),
        )
        .await?;
    let user = response.data().and_then(|data| data.get("user"));
    ensure!(
        user.is_some_and(|user| user.is_null()),
        "expected a null user, got {:?}",
        response.data()
    );
    Ok(())
}
