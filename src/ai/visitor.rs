use reqwest::Client;
use serde::Deserialize;

use crate::error::{ChatError, Result};

#[derive(Deserialize)]
struct CounterResponse {
    value: Option<u64>,
}

/// Third-party hit counter, bumped once per launch
#[derive(Clone)]
pub struct VisitorCounter {
    client: Client,
    url: String,
}

impl VisitorCounter {
    pub fn with_client(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }

    /// `Ok(None)` when the counter answered without a value
    pub async fn hit(&self) -> Result<Option<u64>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(ChatError::Transport)?;

        if !response.status().is_success() {
            return Err(ChatError::Status {
                url: self.url.clone(),
                status: response.status(),
            });
        }

        let counter: CounterResponse = response.json().await.map_err(ChatError::from_reqwest)?;
        Ok(counter.value)
    }
}

/// Formats a count with `,` between thousands groups: 1234567 -> "1,234,567"
pub fn format_grouped(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
