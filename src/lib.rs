//! Contract verification for the GoREST GraphQL API.
//!
//! [`GraphQLClient`] sends envelopes, [`schema::SchemaValidator`] checks response
//! shapes, and [`fixture`] scopes server-side entities to a single check. The
//! [`suite`] and [`runner`] modules put them together against the live service.

pub mod client;
pub mod config;
mod error;
pub mod factory;
pub mod fixture;
pub mod graphql;
pub mod harness;
pub mod models;
pub mod operations;
pub mod runner;
pub mod schema;
pub mod suite;

pub use client::GraphQLClient;
pub use config::Config;
pub use error::{Error, Result};
pub use graphql::{Connection, Envelope, ErrorItem, PageInfo, Request};
pub use harness::Harness;
