//! Structural validation of response payloads against JSON schemas.

use jsonschema::JSONSchema;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::{Error, Result};

mod definitions;

pub use definitions::{
    comment_schema, connection_schema, graphql_error_schema, page_info_schema, post_schema,
    todo_schema, user_schema,
};

// Dot-atom local part, then at least two dot-separated host labels.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$",
    )
    .expect("EMAIL_REGEX: invalid regex pattern")
});

fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

fn compile(schema: &Value) -> Result<JSONSchema> {
    JSONSchema::options()
        .with_format("email", is_email)
        .compile(schema)
        .map_err(|err| Error::Schema(err.to_string()))
}

/// One schema violation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    /// JSON pointer into the validated payload, empty for the payload itself.
    pub instance_path: String,
    pub schema_path: String,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let path = if self.instance_path.is_empty() {
            "root"
        } else {
            &self.instance_path
        };
        write!(f, "{path}: {}", self.message)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Validation {
    pub valid: bool,
    pub errors: Option<Vec<Diagnostic>>,
}

impl Validation {
    pub fn messages(&self) -> Vec<String> {
        SchemaValidator::error_messages(self.errors.as_deref())
    }
}

/// Compiled validators keyed by the canonical serialisation of their schema.
///
/// Append-only: an entry is never replaced or evicted, so two threads racing to
/// compile the same schema both end up using whichever copy landed first.
#[derive(Default)]
pub struct ValidatorCache {
    compiled: RwLock<HashMap<String, Arc<JSONSchema>>>,
}

impl ValidatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(&self, schema: &Value) -> Result<Arc<JSONSchema>> {
        // serde_json keeps object keys sorted, which makes this key canonical.
        let key = serde_json::to_string(schema)?;
        if let Some(compiled) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(compiled.clone());
        }

        log::debug!("compiling validator for schema of {} bytes", key.len());
        let compiled = Arc::new(compile(schema)?);
        Ok(self
            .compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(compiled)
            .clone())
    }

    pub fn len(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct SchemaValidator {
    cache: ValidatorCache,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &ValidatorCache {
        &self.cache
    }

    /// Checks `data` against `schema`, collecting every violation.
    ///
    /// Fails only when the schema itself does not compile.
    pub fn validate(&self, schema: &Value, data: &Value) -> Result<Validation> {
        let compiled = self.cache.get_or_compile(schema)?;
        let result = match compiled.validate(data) {
            Ok(()) => Validation {
                valid: true,
                errors: None,
            },
            Err(errors) => Validation {
                valid: false,
                errors: Some(
                    errors
                        .map(|error| Diagnostic {
                            instance_path: error.instance_path.to_string(),
                            schema_path: error.schema_path.to_string(),
                            message: error.to_string(),
                        })
                        .collect(),
                ),
            },
        };
        Ok(result)
    }

    /// Serialises `data` first; convenient for typed payloads.
    pub fn validate_serialized<T: serde::Serialize>(
        &self,
        schema: &Value,
        data: &T,
    ) -> Result<Validation> {
        self.validate(schema, &serde_json::to_value(data)?)
    }

    /// `"<path or root>: <message>"` per diagnostic.
    pub fn error_messages(errors: Option<&[Diagnostic]>) -> Vec<String> {
        errors
            .unwrap_or_default()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn valid_user() -> Value {
        json!({
            "id": 7001,
            "name": "Test User 1",
            "email": "test.user.1@example.com",
            "gender": "male",
            "status": "active"
        })
    }

    #[test]
    fn accepts_valid_user() {
        let validator = SchemaValidator::new();
        let result = validator.validate(&user_schema(), &valid_user()).unwrap();
        assert!(result.valid);
        assert_eq!(result.errors, None);
        assert!(result.messages().is_empty());
    }

    #[test]
    fn reports_every_violation() {
        let validator = SchemaValidator::new();
        let user = json!({
            "id": 1,
            "name": "",
            "email": "invalid-email",
            "gender": "other",
            "status": "active",
            "role": "admin"
        });
        let result = validator.validate(&user_schema(), &user).unwrap();
        assert!(!result.valid);
        let paths: HashSet<_> = result
            .errors
            .as_ref()
            .unwrap()
            .iter()
            .map(|error| error.instance_path.as_str())
            .collect();
        assert_eq!(paths, HashSet::from(["", "/name", "/email", "/gender"]));
        assert!(result
            .messages()
            .iter()
            .any(|message| message.starts_with("root: ")));
        assert!(result
            .messages()
            .iter()
            .any(|message| message.starts_with("/email: ")));
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let validator = SchemaValidator::new();
        let result = validator
            .validate(&post_schema(), &json!({ "id": 1, "title": "t" }))
            .unwrap();
        assert!(!result.valid);
        assert_eq!(result.errors.unwrap().len(), 2);
    }

    #[test]
    fn compilation_is_cached_and_idempotent() {
        let validator = SchemaValidator::new();
        let bad = json!({ "id": "x", "userId": 1, "title": "", "status": "late" });
        let first = validator.validate(&todo_schema(), &bad).unwrap();
        let second = validator.validate(&todo_schema(), &bad).unwrap();
        assert_eq!(first, second);
        assert_eq!(validator.cache().len(), 1);

        let fresh = SchemaValidator::new();
        assert_eq!(fresh.validate(&todo_schema(), &bad).unwrap(), first);
    }

    #[test]
    fn key_ignores_property_order() {
        let cache = ValidatorCache::new();
        let a: Value = serde_json::from_str(r#"{"type":"object","required":["a"]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"required":["a"],"type":"object"}"#).unwrap();
        cache.get_or_compile(&a).unwrap();
        cache.get_or_compile(&b).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_compiles_converge() {
        let validator = SchemaValidator::new();
        let schema = connection_schema(user_schema());
        let page = json!({
            "nodes": [valid_user()],
            "pageInfo": {
                "hasNextPage": true,
                "hasPreviousPage": false,
                "startCursor": "MQ",
                "endCursor": "MQ"
            },
            "totalCount": 3000
        });
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    assert!(validator.validate(&schema, &page).unwrap().valid);
                });
            }
        });
        assert_eq!(validator.cache().len(), 1);
    }

    #[test]
    fn connection_rejects_bad_nodes() {
        let validator = SchemaValidator::new();
        let page = json!({
            "nodes": [valid_user(), { "id": 2 }],
            "pageInfo": { "hasNextPage": false, "hasPreviousPage": false },
            "totalCount": 2
        });
        let result = validator
            .validate(&connection_schema(user_schema()), &page)
            .unwrap();
        assert!(!result.valid);
        assert!(result
            .errors
            .unwrap()
            .iter()
            .all(|error| error.instance_path == "/nodes/1"));
    }

    #[test]
    fn todo_due_date_may_be_null() {
        let validator = SchemaValidator::new();
        let todo = json!({
            "id": 1,
            "userId": 2,
            "title": "t",
            "dueOn": null,
            "status": "pending"
        });
        assert!(validator.validate(&todo_schema(), &todo).unwrap().valid);
    }

    #[test]
    fn email_needs_local_part_and_dotted_host() {
        let validator = SchemaValidator::new();
        for (email, valid) in [
            ("test.user.1@example.com", true),
            ("First.Last+tag@mail.example.co", true),
            ("invalid-email", false),
            ("a@", false),
            ("@example.com", false),
            ("a b@c d", false),
            ("a@localhost", false),
            ("a..b@example.com", false),
        ] {
            let user = json!({
                "id": 1,
                "name": "Test User 1",
                "email": email,
                "gender": "female",
                "status": "inactive"
            });
            let result = validator.validate(&user_schema(), &user).unwrap();
            assert_eq!(result.valid, valid, "{email}");
        }
    }

    #[test]
    fn typed_payloads_validate_after_serialising() {
        let validator = SchemaValidator::new();
        let user = crate::models::User {
            id: 4,
            name: "Test User 4".to_owned(),
            email: "a@".to_owned(),
            gender: crate::models::Gender::Male,
            status: crate::models::UserStatus::Active,
        };
        let result = validator.validate_serialized(&user_schema(), &user).unwrap();
        assert!(!result.valid);
        assert_eq!(result.messages().len(), 1);
        assert!(result.messages()[0].starts_with("/email: "));
    }

    #[test]
    fn error_messages_of_nothing_is_empty() {
        assert!(SchemaValidator::error_messages(None).is_empty());
    }

    #[test]
    fn invalid_schema_is_an_error() {
        let validator = SchemaValidator::new();
        let result = validator.validate(&json!({ "type": 12 }), &json!({}));
        assert!(matches!(result, Err(Error::Schema(_))));
    }
}
