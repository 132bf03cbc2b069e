//! Generic HTTP/JSON price feed.
//!
//! Fetches a JSON document from a URL and reads the price at a dotted path,
//! e.g. `data.rates.0.price`. Numeric path segments index into arrays.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use twap_core::Price;

use crate::error::{FeedError, FeedResult};
use crate::price_feed::PriceFeed;

/// Price feed reading a single value out of a JSON HTTP endpoint.
pub struct GenericPriceFeed {
    client: Client,
    url: String,
    json_path: String,
}

impl GenericPriceFeed {
    /// Create a new feed with an explicit request timeout.
    pub fn with_timeout(
        url: impl Into<String>,
        json_path: impl Into<String>,
        timeout: Duration,
    ) -> FeedResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            json_path: json_path.into(),
        })
    }
}

#[async_trait]
impl PriceFeed for GenericPriceFeed {
    async fn price(&self) -> FeedResult<Price> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::HttpClient(format!("HTTP {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::HttpClient(format!("Failed to read response: {e}")))?;

        let price = parse_price(&body, &self.json_path)?;
        debug!(url = %self.url, path = %self.json_path, %price, "Fetched reference price");
        Ok(price)
    }
}

/// Parse a JSON response body and read the price at `path`.
pub fn parse_price(body: &str, path: &str) -> FeedResult<Price> {
    let json: Value = serde_json::from_str(body)?;
    extract_price(&json, path)
}

/// Walk `path` through `json` and parse the value found there as a price.
///
/// An empty path reads the document root.
pub fn extract_price(json: &Value, path: &str) -> FeedResult<Price> {
    let mut cursor = json;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let next = match cursor {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        cursor = next.ok_or_else(|| FeedError::PathNotFound(path.to_string()))?;
    }

    let raw = match cursor {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(FeedError::NotAPrice {
                path: path.to_string(),
                value: other.to_string(),
            })
        }
    };

    let value = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| FeedError::NotAPrice {
            path: path.to_string(),
            value: raw.clone(),
        })?;

    Ok(Price::new(value))
}
