use crate::graphql::ErrorItem;
use reqwest::StatusCode;
use std::fmt::{self, Display};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    /// The transport answered with a status other than the one the caller demanded.
    Status {
        expected: StatusCode,
        actual: StatusCode,
    },
    Reqwest(reqwest::Error),
    Json(serde_json::Error),
    Toml(toml::de::Error),
    Io(std::io::Error),
    GraphQL(Vec<ErrorItem>),
    Schema(String),
    MissingEntity(&'static str),
    Assertion(String),
    Config(String),
    Custom(String),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Reqwest(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Self::Toml(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Reqwest(error) => Some(error),
            Self::Json(error) => Some(error),
            Self::Toml(error) => Some(error),
            Self::Io(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Status { expected, actual } => {
                write!(f, "expected HTTP status {expected}, got {actual}")
            }
            Self::Reqwest(error) => write!(f, "transport error: {error}"),
            Self::Json(error) => write!(f, "invalid JSON: {error}"),
            Self::Toml(error) => write!(f, "invalid config: {error}"),
            Self::Io(error) => error.fmt(f),
            Self::GraphQL(errors) => {
                write!(f, "GraphQL errors:")?;
                for error in errors {
                    write!(f, " [{}]", error.message)?;
                }
                Ok(())
            }
            Self::Schema(message) => write!(f, "schema failed to compile: {message}"),
            Self::MissingEntity(field) => {
                write!(f, "mutation response did not contain `{field}`")
            }
            Self::Assertion(message) => write!(f, "assertion failed: {message}"),
            Self::Config(message) | Self::Custom(message) => message.fmt(f),
        }
    }
}
