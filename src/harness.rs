use crate::client::GraphQLClient;
use crate::config::Config;
use crate::schema::SchemaValidator;
use crate::Result;

/// Everything a scenario needs, built once per process.
///
/// The validator (and with it the compiled-validator cache) lives exactly as long as
/// the harness; nothing is torn down explicitly.
pub struct Harness {
    config: Config,
    client: GraphQLClient,
    validator: SchemaValidator,
}

impl Harness {
    pub fn new(config: Config) -> Result<Self> {
        let client = GraphQLClient::new(&config.endpoint, config.token.as_deref())?;
        if config.token.is_none() {
            log::warn!("no bearer token configured, mutations will be rejected");
        }
        Ok(Self {
            config,
            client,
            validator: SchemaValidator::new(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(Config::load()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &GraphQLClient {
        &self.client
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// A client for the same endpoint that sends no bearer token.
    pub fn unauthorized_client(&self) -> Result<GraphQLClient> {
        GraphQLClient::unauthorized(&self.config.endpoint)
    }
}
