//! HTTP side of the chat: one client per remote service, plus the
//! [`ChatBackend`] trait the controller's effects are run against.

pub mod gateway;
pub mod ollama;
pub mod visitor;

use async_trait::async_trait;
use reqwest::Client;

pub use gateway::GatewayClient;
pub use ollama::OllamaClient;
pub use visitor::{format_grouped, VisitorCounter};

use crate::config::Config;
use crate::error::Result;

/// One completion call, already resolved against the backend configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionRequest {
    Hosted {
        model: String,
        prompt: String,
    },
    Local {
        server_address: String,
        model: String,
        prompt: String,
    },
}

impl CompletionRequest {
    pub fn model(&self) -> &str {
        match self {
            CompletionRequest::Hosted { model, .. } | CompletionRequest::Local { model, .. } => model,
        }
    }

    pub fn prompt(&self) -> &str {
        match self {
            CompletionRequest::Hosted { prompt, .. } | CompletionRequest::Local { prompt, .. } => {
                prompt
            }
        }
    }
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    async fn list_local_models(&self, server_address: &str) -> Result<Vec<String>>;

    async fn visitor_count(&self) -> Result<Option<u64>>;
}

/// The real backend: every call goes over the network through one shared
/// reqwest client, with its default (unbounded) timeout.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    gateway: GatewayClient,
    visitors: VisitorCounter,
}

impl HttpBackend {
    pub fn new(hosted_endpoint: &str, visitor_counter_url: &str) -> Self {
        Self::with_client(Client::new(), hosted_endpoint, visitor_counter_url)
    }

    pub fn with_client(client: Client, hosted_endpoint: &str, visitor_counter_url: &str) -> Self {
        Self {
            gateway: GatewayClient::with_client(client.clone(), hosted_endpoint),
            visitors: VisitorCounter::with_client(client.clone(), visitor_counter_url),
            client,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.hosted_endpoint, &config.visitor_counter_url)
    }

    fn ollama(&self, server_address: &str) -> OllamaClient {
        OllamaClient::with_client(self.client.clone(), server_address)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        match request {
            CompletionRequest::Hosted { model, prompt } => self.gateway.query(model, prompt).await,
            CompletionRequest::Local {
                server_address,
                model,
                prompt,
            } => self.ollama(server_address).query(model, prompt).await,
        }
    }

    async fn list_local_models(&self, server_address: &str) -> Result<Vec<String>> {
        self.ollama(server_address).list_models().await
    }

    async fn visitor_count(&self) -> Result<Option<u64>> {
        self.visitors.hit().await
    }
}
