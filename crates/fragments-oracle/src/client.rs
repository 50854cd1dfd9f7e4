//! HTTP client for the `generateContent` endpoint.

use async_trait::async_trait;
use fragments_core::error::DomainError;
use fragments_core::oracle::{EndingRequest, NarrativeOracle, TurnRequest, TurnResponse};
use tracing::debug;

use crate::config::OracleConfig;
use crate::prompt::{ending_prompt, turn_prompt, turn_schema};
use crate::wire::{GenerateContentRequest, GenerateContentResponse, TurnPayload};

/// [`NarrativeOracle`] backed by a generative-language model.
#[derive(Debug, Clone)]
pub struct GenerativeOracle {
    config: OracleConfig,
    http: reqwest::Client,
}

impl GenerativeOracle {
    /// Builds the oracle and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the HTTP client cannot be
    /// built.
    pub fn new(config: OracleConfig) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::Infrastructure(format!("cannot build http client: {e}")))?;
        Ok(Self { config, http })
    }

    /// The configuration this oracle was built with.
    #[must_use]
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    async fn generate(&self, body: &GenerateContentRequest) -> Result<String, DomainError> {
        let res = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::OracleTransport(e.without_url().to_string()))?;

        let status = res.status();
        debug!(model = %self.config.model, %status, "oracle responded");
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(DomainError::OracleTransport(format!(
                "oracle returned {status}: {body}"
            )));
        }

        let payload: GenerateContentResponse = res
            .json()
            .await
            .map_err(|e| DomainError::OracleContract(format!("malformed response: {e}")))?;
        payload
            .text()
            .ok_or_else(|| DomainError::OracleContract("empty response".to_owned()))
    }
}

#[async_trait]
impl NarrativeOracle for GenerativeOracle {
    async fn resolve_turn(&self, request: &TurnRequest) -> Result<TurnResponse, DomainError> {
        let schema = turn_schema(request.current_vitals.keys().map(String::as_str));
        let body = GenerateContentRequest::new(&self.config.system_instruction, turn_prompt(request))
            .with_json_schema(schema);

        let text = self.generate(&body).await?;
        let payload: TurnPayload = serde_json::from_str(&text)
            .map_err(|e| DomainError::OracleContract(format!("turn payload: {e}")))?;
        Ok(payload.into())
    }

    async fn resolve_ending(&self, request: &EndingRequest) -> Result<String, DomainError> {
        let body =
            GenerateContentRequest::new(&self.config.ending_instruction, ending_prompt(request)?);
        let text = self.generate(&body).await?;
        Ok(text.trim().to_owned())
    }
}
