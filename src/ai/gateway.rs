use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatError, Result};

#[derive(Serialize)]
struct GatewayRequest<'a> {
    prompt: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct GatewayResponse {
    response: String,
}

/// Client for the hosted multi-model gateway. The endpoint is fixed per
/// session; the model is picked per request.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    endpoint: String,
}

impl GatewayClient {
    pub fn with_client(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    pub async fn query(&self, model: &str, prompt: &str) -> Result<String> {
        debug!(endpoint = %self.endpoint, model, "sending hosted completion");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&GatewayRequest { prompt, model })
            .send()
            .await
            .map_err(ChatError::Transport)?;

        if !response.status().is_success() {
            return Err(ChatError::Status {
                url: self.endpoint.clone(),
                status: response.status(),
            });
        }

        let gateway_response: GatewayResponse =
            response.json().await.map_err(ChatError::from_reqwest)?;
        Ok(gateway_response.response)
    }
}
