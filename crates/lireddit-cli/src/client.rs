#![deny(clippy::all, clippy::pedantic)]

use lireddit_api_types::GraphqlResponse;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("not logged in (use `login <username-or-email> <password>` in the shell)")]
    NotAuthenticated,
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server error: {0}")]
    Server(String),
    #[error("graphql error: {0}")]
    Graphql(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// GraphQL over HTTP with a cookie jar, so the `qid` session survives between requests.
#[derive(Clone, Debug)]
pub struct Transport {
    client: Client,
    endpoint: Url,
}

impl Transport {
    pub fn new(endpoint: &str) -> Result<Self, CliError> {
        let endpoint = Url::parse(endpoint)?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .cookie_store(true)
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn user_agent() -> &'static str {
        concat!("lireddit-cli/", env!("CARGO_PKG_VERSION"))
    }

    /// Run one operation and decode its `data`. A `not authenticated` error anywhere in
    /// the response becomes [`CliError::NotAuthenticated`].
    pub async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, CliError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            return Err(CliError::Server(format!("status {status} body {text}")));
        }

        let body: GraphqlResponse<T> = serde_json::from_slice(&bytes)
            .map_err(|e| CliError::Server(format!("failed to parse body: {e}")))?;
        debug!(errors = body.errors.len(), "graphql response");

        if body.errors.iter().any(|err| err.is_not_authenticated()) {
            return Err(CliError::NotAuthenticated);
        }
        if !body.errors.is_empty() {
            let messages: Vec<&str> = body.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(CliError::Graphql(messages.join("; ")));
        }
        body.data
            .ok_or_else(|| CliError::Server("response carried no data".into()))
    }
}
