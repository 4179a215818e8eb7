use futures::future::{join_all, try_join_all};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::graphql::{Envelope, Request};
use crate::{Error, Result};

/// Sends GraphQL envelopes to one fixed endpoint.
///
/// The strict calls (`query`, `mutation`) fail with [`Error::Status`] as soon as the
/// transport answers with an unexpected status. `query_with_errors` never checks the
/// status so protocol-level rejections can be inspected as data. Nothing is retried.
#[derive(Clone, Debug)]
pub struct GraphQLClient {
    endpoint: Url,
    client: reqwest::Client,
}

impl GraphQLClient {
    /// A client that sends `Authorization: Bearer <token>` when a token is given.
    pub fn new(endpoint: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                Error::Config("bearer token is not a valid header value".to_owned())
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(Self {
            endpoint: endpoint
                .parse::<Url>()
                .map_err(|err| Error::Config(format!("invalid endpoint `{endpoint}`: {err}")))?,
            client: reqwest::Client::builder().default_headers(headers).build()?,
        })
    }

    /// A client that carries the JSON content type and no credentials.
    pub fn unauthorized(endpoint: &str) -> Result<Self> {
        Self::new(endpoint, None)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post_graphql(&self, request: &Request) -> Result<(StatusCode, String)> {
        let body = serde_json::to_string(request)?;
        log::trace!("graphql request: {}", body);
        let response = self
            .client
            .post(self.endpoint.clone())
            .body(body)
            .send()
            .await?;
        let status = response.status();
        log::trace!("http response status: {}", status);
        let body = response.text().await?;
        log::trace!("http response body: {}", body);
        Ok((status, body))
    }

    async fn send_strict<T: DeserializeOwned>(
        &self,
        request: &Request,
        expected: StatusCode,
    ) -> Result<Envelope<T>> {
        let (actual, body) = self.post_graphql(request).await?;
        if actual != expected {
            log::debug!("unexpected status {} (wanted {}): {}", actual, expected, body);
            return Err(Error::Status { expected, actual });
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<Envelope<T>> {
        self.query_with_status(query, variables, StatusCode::OK).await
    }

    pub async fn query_with_status<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<Value>,
        expected: StatusCode,
    ) -> Result<Envelope<T>> {
        self.send_strict(&Request::new(query, variables), expected)
            .await
    }

    /// Same wire envelope and status contract as [`GraphQLClient::query`].
    pub async fn mutation<T: DeserializeOwned>(
        &self,
        mutation: &str,
        variables: Option<Value>,
    ) -> Result<Envelope<T>> {
        self.query(mutation, variables).await
    }

    pub async fn mutation_with_status<T: DeserializeOwned>(
        &self,
        mutation: &str,
        variables: Option<Value>,
        expected: StatusCode,
    ) -> Result<Envelope<T>> {
        self.query_with_status(mutation, variables, expected).await
    }

    /// Decodes whatever envelope comes back, whatever the status.
    pub async fn query_with_errors<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> Result<Envelope<T>> {
        let (status, body) = self.post_graphql(&Request::new(query, variables)).await?;
        if !status.is_success() {
            log::debug!("tolerating status {} for error inspection", status);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Runs every request concurrently in strict mode.
    ///
    /// Results keep submission order. The first failure rejects the whole batch and
    /// no partial results are returned; see [`GraphQLClient::batch_query_settled`].
    pub async fn batch_query<T: DeserializeOwned>(
        &self,
        requests: &[Request],
    ) -> Result<Vec<Envelope<T>>> {
        try_join_all(
            requests
                .iter()
                .map(|request| self.send_strict(request, StatusCode::OK)),
        )
        .await
    }

    /// Runs every request concurrently in strict mode and reports each outcome
    /// separately, in submission order.
    pub async fn batch_query_settled<T: DeserializeOwned>(
        &self,
        requests: &[Request],
    ) -> Vec<Result<Envelope<T>>> {
        join_all(
            requests
                .iter()
                .map(|request| self.send_strict(request, StatusCode::OK)),
        )
        .await
    }
}
