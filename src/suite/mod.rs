//! Contract scenarios against the live service.
//!
//! Every scenario owns the entities it needs through [`crate::fixture`], so any
//! subset can run in any order.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::graphql::Envelope;
use crate::harness::Harness;
use crate::{Error, Result};

/// Fails the enclosing scenario with [`Error::Assertion`].
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::Error::Assertion(format!($($arg)+)));
        }
    };
}

mod errors;
mod pagination;
mod posts;
#[cfg(test)]
mod testing;
mod todos;
mod users_mutation;
mod users_query;

pub type ScenarioFn = for<'a> fn(&'a Harness) -> BoxFuture<'a, Result<()>>;

#[derive(Clone, Copy)]
pub struct Scenario {
    pub group: &'static str,
    pub name: &'static str,
    pub run: ScenarioFn,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} > {}", self.group, self.name)
    }
}

macro_rules! scenario {
    ($group:literal, $name:literal, $run:path) => {
        Scenario {
            group: $group,
            name: $name,
            run: |harness| $run(harness).boxed(),
        }
    };
}

pub fn all() -> Vec<Scenario> {
    vec![
        scenario!("users.query", "should fetch list of users", users_query::fetch_list),
        scenario!("users.query", "should fetch user by ID", users_query::fetch_by_id),
        scenario!("users.query", "should handle pagination correctly", users_query::page_info),
        scenario!("users.query", "should return error for non-existent user", users_query::missing_user),
        scenario!("users.mutation", "should create a new user", users_mutation::create),
        scenario!("users.mutation", "should update an existing user", users_mutation::update),
        scenario!("users.mutation", "should delete a user", users_mutation::delete),
        scenario!("users.mutation", "should validate email format on creation", users_mutation::invalid_email),
        scenario!("users.mutation", "should not create user with duplicate email", users_mutation::duplicate_email),
        scenario!("users.mutation", "should leave no user behind after cleanup", users_mutation::cleanup),
        scenario!("posts", "should fetch list of posts", posts::fetch_list),
        scenario!("posts", "should create a new post", posts::create),
        scenario!("posts", "should fetch post by ID with user details", posts::fetch_with_user),
        scenario!("posts", "should update a post", posts::update),
        scenario!("posts", "should delete a post", posts::delete),
        scenario!("posts", "should fetch list of comments", posts::fetch_comments),
        scenario!("todos", "should fetch list of todos", todos::fetch_list),
        scenario!("todos", "should create a new todo", todos::create),
        scenario!("todos", "should fetch todo by ID", todos::fetch_by_id),
        scenario!("todos", "should update todo status", todos::update_status),
        scenario!("todos", "should delete a todo", todos::delete),
        scenario!("pagination", "should paginate through users using cursor", pagination::cursor_chain),
        scenario!("pagination", "should handle different page sizes", pagination::page_sizes),
        scenario!("pagination", "should return correct totalCount", pagination::total_count),
        scenario!("pagination", "should batch page requests in order", pagination::batched_pages),
        scenario!("errors", "should handle invalid query syntax", errors::invalid_syntax),
        scenario!("errors", "should handle missing required fields", errors::missing_fields),
        scenario!("errors", "should handle invalid data types", errors::invalid_types),
        scenario!("errors", "should validate field constraints", errors::field_constraints),
        scenario!("errors", "should handle unauthorized access without token", errors::unauthorized),
    ]
}

/// Scenarios whose group starts with `filter`, or all of them.
pub fn select(filter: Option<&str>) -> Vec<Scenario> {
    all()
        .into_iter()
        .filter(|scenario| filter.is_none_or(|filter| scenario.group.starts_with(filter)))
        .collect()
}

/// Narrows an envelope to one top-level field, failing on protocol errors.
fn payload(envelope: Envelope<Value>, field: &str) -> Result<Value> {
    let mut data = envelope.into_data()?;
    data.get_mut(field)
        .map(Value::take)
        .ok_or_else(|| Error::Assertion(format!("response has no `{field}`")))
}

/// Follows `createUser.user`-style paths inside a payload.
fn entity(mut value: Value, field: &str) -> Result<Value> {
    value
        .get_mut(field)
        .map(Value::take)
        .filter(|entity| !entity.is_null())
        .ok_or_else(|| Error::Assertion(format!("payload has no `{field}`")))
}

fn ensure_valid(harness: &Harness, schema: &Value, data: &Value) -> Result<()> {
    let validation = harness.validator().validate(schema, data)?;
    ensure!(
        validation.valid,
        "schema violations: {}",
        validation.messages().join("; ")
    );
    Ok(())
}

fn matches_validation_failure(message: Option<&str>) -> bool {
    message.is_some_and(|message| message.to_lowercase().contains("validation failed!"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn scenario_names_are_unique() {
        let scenarios = all();
        let names: HashSet<_> = scenarios.iter().map(|s| (s.group, s.name)).collect();
        assert_eq!(names.len(), scenarios.len());
    }

    #[test]
    fn missing_user_keeps_its_report_name() {
        assert!(select(Some("users.query"))
            .iter()
            .any(|s| s.name == "should return error for non-existent user"));
    }

    #[test]
    fn select_filters_by_group_prefix() {
        let users = select(Some("users"));
        assert!(!users.is_empty());
        assert!(users.iter().all(|s| s.group.starts_with("users")));
        assert_eq!(select(None).len(), all().len());
        assert!(select(Some("nothing")).is_empty());
    }

    #[test]
    fn validation_failure_match_ignores_case() {
        assert!(matches_validation_failure(Some("VALIDATION FAILED! email is invalid")));
        assert!(!matches_validation_failure(Some("Authentication failed")));
        assert!(!matches_validation_failure(None));
    }

    #[test]
    fn payload_narrows_and_rejects() {
        let envelope: Envelope<Value> = serde_json::from_value(serde_json::json!({
            "data": { "createUser": { "user": { "id": 1 } } }
        }))
        .unwrap();
        let user = entity(payload(envelope, "createUser").unwrap(), "user").unwrap();
        assert_eq!(user["id"], 1);

        let envelope: Envelope<Value> = serde_json::from_value(serde_json::json!({
            "data": { "user": null },
            "errors": [{ "message": "not found" }]
        }))
        .unwrap();
        assert!(matches!(payload(envelope, "user"), Err(Error::GraphQL(_))));
        assert!(matches!(
            entity(serde_json::json!({ "user": null }), "user"),
            Err(Error::Assertion(_))
        ));
    }
}
