//! Canned service responses for running scenarios against a local mock server.

use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use crate::config::Config;
use crate::harness::Harness;

pub fn harness(server: &MockServer) -> Harness {
    Harness::new(Config {
        endpoint: server.uri(),
        token: Some("test-token".to_owned()),
        ..Config::default()
    })
    .unwrap()
}

pub fn user(id: u64) -> Value {
    json!({
        "id": id,
        "name": format!("Test User {id}"),
        "email": format!("test.user.{id}@example.com"),
        "gender": "female",
        "status": "active"
    })
}

pub fn users_page(ids: &[u64], has_next_page: bool, end_cursor: &str) -> ResponseTemplate {
    let nodes: Vec<Value> = ids.iter().copied().map(user).collect();
    ResponseTemplate::new(200).set_body_json(json!({
        "data": {
            "users": {
                "nodes": nodes,
                "pageInfo": {
                    "hasNextPage": has_next_page,
                    "hasPreviousPage": false,
                    "startCursor": "c0",
                    "endCursor": end_cursor
                },
                "totalCount": 3000
            }
        }
    }))
}

/// Answers `createUser` with the submitted input plus `id`, remembering it.
pub struct CreatedUser {
    pub id: u64,
    pub stored: Arc<Mutex<Option<Value>>>,
}

impl Respond for CreatedUser {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let mut user = body["variables"]["input"].clone();
        user["id"] = json!(self.id);
        *self.stored.lock().unwrap() = Some(user.clone());
        ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createUser": { "user": user } }
        }))
    }
}

/// Answers `GetUser` with whatever [`CreatedUser`] stored, passed through `edit`.
pub struct StoredUser {
    pub stored: Arc<Mutex<Option<Value>>>,
    pub edit: fn(&mut Value),
}

impl Respond for StoredUser {
    fn respond(&self, _: &Request) -> ResponseTemplate {
        let mut user = self.stored.lock().unwrap().clone().unwrap_or(Value::Null);
        (self.edit)(&mut user);
        ResponseTemplate::new(200).set_body_json(json!({ "data": { "user": user } }))
    }
}

pub async fn mount_create_user(server: &MockServer, id: u64) -> Arc<Mutex<Option<Value>>> {
    let stored = Arc::new(Mutex::new(None));
    Mock::given(method("POST"))
        .and(body_string_contains("createUser"))
        .respond_with(CreatedUser {
            id,
            stored: stored.clone(),
        })
        .mount(server)
        .await;
    stored
}

pub async fn mount_delete_user(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_string_contains("deleteUser"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "deleteUser": { "user": null } } })),
        )
        .mount(server)
        .await;
}

pub async fn mount_get_user(server: &MockServer, response: impl Respond + 'static) {
    Mock::given(method("POST"))
        .and(body_string_contains("query GetUser("))
        .respond_with(response)
        .mount(server)
        .await;
}
