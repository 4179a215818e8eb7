//! Creation inputs for test entities.
//!
//! Every builder fills in unique, valid defaults and then applies the caller's
//! overrides on top, so a test can deliberately break one field (for example an
//! invalid email) while keeping the rest valid.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::models::{
    CreatePostInput, CreateTodoInput, CreateUserInput, Gender, TodoStatus, UserStatus,
};

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Milliseconds since the epoch, strictly increasing within this process.
///
/// Two inputs built in the same millisecond still get distinct names and emails.
pub fn unique_stamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

fn iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Clone, Default, Debug)]
pub struct UserOverrides {
    pub name: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub status: Option<UserStatus>,
}

#[derive(Clone, Default, Debug)]
pub struct PostOverrides {
    pub user_id: Option<u64>,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Clone, Default, Debug)]
pub struct TodoOverrides {
    pub user_id: Option<u64>,
    pub title: Option<String>,
    pub due_on: Option<String>,
    pub status: Option<TodoStatus>,
}

pub fn user_input(overrides: UserOverrides) -> CreateUserInput {
    let stamp = unique_stamp();
    CreateUserInput {
        name: overrides.name.unwrap_or_else(|| format!("Test User {stamp}")),
        email: overrides
            .email
            .unwrap_or_else(|| format!("test.user.{stamp}@example.com")),
        gender: overrides.gender.unwrap_or(Gender::Male),
        status: overrides.status.unwrap_or(UserStatus::Active),
    }
}

pub fn post_input(user_id: u64, overrides: PostOverrides) -> CreatePostInput {
    let stamp = unique_stamp();
    CreatePostInput {
        user_id: overrides.user_id.unwrap_or(user_id),
        title: overrides.title.unwrap_or_else(|| format!("Test Post {stamp}")),
        body: overrides
            .body
            .unwrap_or_else(|| format!("This is test post content created at {}", iso(Utc::now()))),
    }
}

pub fn todo_input(user_id: u64, overrides: TodoOverrides) -> CreateTodoInput {
    let stamp = unique_stamp();
    CreateTodoInput {
        user_id: overrides.user_id.unwrap_or(user_id),
        title: overrides.title.unwrap_or_else(|| format!("Test Todo {stamp}")),
        due_on: overrides
            .due_on
            .unwrap_or_else(|| iso(Utc::now() + Duration::days(1))),
        status: overrides.status.unwrap_or(TodoStatus::Pending),
    }
}
