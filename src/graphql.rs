use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Request body of every GraphQL call. Queries and mutations share it.
#[derive(Serialize, Clone, Debug)]
pub struct Request {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

impl Request {
    pub fn new(query: impl Into<String>, variables: Option<Value>) -> Self {
        Self {
            query: query.into(),
            variables,
        }
    }
}

/// `{ data?, errors? }` as returned by the service.
///
/// Either half may be absent, and `data` may carry null leaves even when
/// `errors` is empty, so callers narrow explicitly before reading fields.
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<ErrorItem>>,
}

impl<T> Envelope<T> {
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn errors(&self) -> &[ErrorItem] {
        self.errors.as_deref().unwrap_or(&[])
    }

    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    pub fn first_error_message(&self) -> Option<&str> {
        self.errors().first().map(|error| error.message.as_str())
    }

    /// Narrows to the payload, treating any protocol error as a failure.
    pub fn into_data(self) -> Result<T> {
        match (self.data, self.errors) {
            (_, Some(errors)) if !errors.is_empty() => Err(Error::GraphQL(errors)),
            (Some(data), _) => Ok(data),
            (None, _) => Err(Error::Custom(
                "response carried neither data nor errors".to_owned(),
            )),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ErrorItem {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

#[derive(Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

#[derive(Deserialize, Serialize, Clone, PartialEq, Eq, Debug)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub nodes: Vec<T>,
    pub page_info: Option<PageInfo>,
    pub total_count: u64,
}

#[derive(Deserialize, Serialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}
