use serde_json::{Value, json};

pub fn user_schema() -> Value {
    json!({
        "type": "object",
        "required": ["id", "name", "email", "gender", "status"],
        "properties": {
            "id": { "type": "number" },
            "name": { "type": "string", "minLength": 1 },
            "email": { "type": "string", "format": "email" },
            "gender": { "type": "string", "enum": ["male", "female"] },
            "status": { "type": "string", "enum": ["active", "inactive"] }
        },
        "additionalProperties": false
    })
}

pub fn post_schema() -> Value {
    json!({
        "type": "object",
        "required": ["id", "userId", "title", "body"],
        "properties": {
            "id": { "type": "number" },
            "userId": { "type": "number" },
            "title": { "type": "string", "minLength": 1 },
            "body": { "type": "string", "minLength": 1 }
        },
        "additionalProperties": false
    })
}

pub fn todo_schema() -> Value {
    json!({
        "type": "object",
        "required": ["id", "userId", "title", "status"],
        "properties": {
            "id": { "type": "number" },
            "userId": { "type": "number" },
            "title": { "type": "string", "minLength": 1 },
            "dueOn": { "type": ["string", "null"], "format": "date-time" },
            "status": { "type": "string", "enum": ["pending", "completed"] }
        },
        "additionalProperties": false
    })
}

pub fn comment_schema() -> Value {
    json!({
        "type": "object",
        "required": ["id", "postId", "name", "email", "body"],
        "properties": {
            "id": { "type": "number" },
            "postId": { "type": "number" },
            "name": { "type": "string", "minLength": 1 },
            "email": { "type": "string", "format": "email" },
            "body": { "type": "string", "minLength": 1 }
        },
        "additionalProperties": false
    })
}

pub fn page_info_schema() -> Value {
    json!({
        "type": "object",
        "required": ["hasNextPage", "hasPreviousPage"],
        "properties": {
            "hasNextPage": { "type": "boolean" },
            "hasPreviousPage": { "type": "boolean" },
            "startCursor": { "type": ["string", "null"] },
            "endCursor": { "type": ["string", "null"] }
        },
        "additionalProperties": false
    })
}

/// Wraps an entity schema as `Connection<entity>`.
pub fn connection_schema(item: Value) -> Value {
    json!({
        "type": "object",
        "required": ["nodes", "pageInfo", "totalCount"],
        "properties": {
            "nodes": { "type": "array", "items": item },
            "pageInfo": page_info_schema(),
            "totalCount": { "type": "number" }
        },
        "additionalProperties": false
    })
}

pub fn graphql_error_schema() -> Value {
    json!({
        "type": "object",
        "required": ["message"],
        "properties": {
            "message": { "type": "string" },
            "locations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "line": { "type": "number" },
                        "column": { "type": "number" }
                    }
                }
            },
            "path": { "type": "array", "items": { "type": "string" } },
            "extensions": { "type": "object" }
        }
    })
}
