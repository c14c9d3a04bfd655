//! Price feed HTTP client.
//!
//! Talks to the currency overview endpoint of a poe2scout-compatible
//! price API. The primary base URL is tried first, then each configured
//! mirror in order; the first attempt that yields a usable quote wins.
//! Total failure is an error the caller degrades to fallback constants.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Where and how to fetch prices.
#[derive(Debug, Clone)]
pub struct PriceFeedConfig {
    /// Primary API base, e.g. `https://poe2scout.com/api/items/`.
    pub base_url: String,
    /// Alternate bases tried in order when the primary fails.
    pub mirrors: Vec<String>,
    /// League the prices are scoped to.
    pub league: String,
    /// Feed identifier of the reference (minor) currency.
    pub reference_currency: String,
    /// Feed identifier of the major currency.
    pub major_currency: String,
    pub timeout_secs: u64,
    pub max_response_bytes: usize,
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://poe2scout.com/api/items/".to_string(),
            mirrors: Vec::new(),
            league: "Rise of the Abyssal".to_string(),
            reference_currency: "exalted".to_string(),
            major_currency: "divine".to_string(),
            timeout_secs: 10,
            max_response_bytes: 1024 * 1024,
        }
    }
}

/// One usable quote out of the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuote {
    /// Price in reference-currency units.
    pub price: f64,
    pub icon_url: Option<String>,
}

/// Quotes extracted from one successful fetch. Either side may be
/// missing; a fetch with neither counts as a failed attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedRates {
    pub major: Option<FeedQuote>,
    pub minor: Option<FeedQuote>,
    /// Base URL the successful attempt went through.
    pub fetched_via: String,
}

impl FeedRates {
    pub fn is_empty(&self) -> bool {
        self.major.is_none() && self.minor.is_none()
    }
}

/// The feed wraps its item list differently across versions, so accept
/// the known shapes in order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedPayload {
    Wrapped { data: Vec<FeedItem> },
    Keyed { items: Vec<FeedItem> },
    Bare(Vec<FeedItem>),
}

impl FeedPayload {
    fn into_items(self) -> Vec<FeedItem> {
        match self {
            FeedPayload::Wrapped { data } => data,
            FeedPayload::Keyed { items } => items,
            FeedPayload::Bare(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    #[serde(rename = "apiId")]
    api_id: Option<String>,
    #[serde(rename = "currentPrice")]
    current_price: Option<f64>,
    #[serde(rename = "iconUrl")]
    icon_url: Option<String>,
    #[serde(rename = "itemMetadata")]
    item_metadata: Option<FeedItemMetadata>,
}

#[derive(Debug, Deserialize)]
struct FeedItemMetadata {
    icon: Option<String>,
}

pub struct PriceFeedClient {
    client: Client,
    config: PriceFeedConfig,
}

impl PriceFeedClient {
    pub fn new(config: PriceFeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("orbsplit/0.1 (party loot split service)")
            .use_rustls_tls()
            .build()
            .context("Failed to create price feed HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &PriceFeedConfig {
        &self.config
    }

    /// Fetch current quotes, walking the base URL chain until one
    /// attempt produces at least one usable quote.
    pub async fn fetch_rates(&self) -> Result<FeedRates> {
        let mut last_error = anyhow::anyhow!("No price feed base URLs configured");

        for base in self.base_chain() {
            match self.fetch_from(&base).await {
                Ok(rates) if !rates.is_empty() => {
                    info!(
                        via = %base,
                        has_major = rates.major.is_some(),
                        has_minor = rates.minor.is_some(),
                        "Price feed fetch succeeded"
                    );
                    return Ok(rates);
                }
                Ok(_) => {
                    warn!(via = %base, "Price feed responded without usable quotes");
                    last_error =
                        anyhow::anyhow!("Feed at {} had no quotes for the configured units", base);
                }
                Err(e) => {
                    warn!(via = %base, error = ?e, "Price feed attempt failed");
                    last_error = e;
                }
            }
        }

        Err(last_error).context("All price feed attempts failed")
    }

    fn base_chain(&self) -> Vec<String> {
        let mut chain = vec![self.config.base_url.clone()];
        chain.extend(self.config.mirrors.iter().cloned());
        chain
    }

    fn build_url(&self, base: &str) -> Result<Url> {
        let endpoint = format!("{}currency/currency", ensure_trailing_slash(base));
        let mut url = Url::parse(&endpoint)
            .with_context(|| format!("Invalid price feed base URL: {}", base))?;
        url.query_pairs_mut()
            .append_pair("page", "1")
            .append_pair("perPage", "25")
            .append_pair("league", &self.config.league)
            .append_pair("referenceCurrency", &self.config.reference_currency);
        Ok(url)
    }

    async fn fetch_from(&self, base: &str) -> Result<FeedRates> {
        let url = self.build_url(base)?;

        let response = self
            .client
            .get(url.as_str())
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send price feed request")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Price feed returned HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ));
        }

        let content_length = response.content_length().unwrap_or(0);
        if content_length > self.config.max_response_bytes as u64 {
            return Err(anyhow::anyhow!(
                "Price feed response too large: {} bytes (max: {})",
                content_length,
                self.config.max_response_bytes
            ));
        }

        let body = response
            .text()
            .await
            .context("Failed to read price feed response body")?;
        if body.len() > self.config.max_response_bytes {
            return Err(anyhow::anyhow!(
                "Price feed response body too large: {} bytes (max: {})",
                body.len(),
                self.config.max_response_bytes
            ));
        }

        let payload: FeedPayload =
            serde_json::from_str(&body).context("Price feed response was not valid JSON")?;

        let mut rates = self.extract_rates(payload.into_items());
        rates.fetched_via = base.to_string();
        Ok(rates)
    }

    fn extract_rates(&self, items: Vec<FeedItem>) -> FeedRates {
        let mut rates = FeedRates::default();

        for item in items {
            let Some(api_id) = item.api_id.as_deref() else {
                continue;
            };
            let quote = match item.current_price {
                // Quotes must be finite and positive before the engine
                // ever sees a rate derived from them.
                Some(price) if price.is_finite() && price > 0.0 => FeedQuote {
                    price,
                    icon_url: item
                        .icon_url
                        .clone()
                        .or_else(|| item.item_metadata.as_ref().and_then(|m| m.icon.clone())),
                },
                _ => continue,
            };

            if api_id == self.config.major_currency {
                rates.major = Some(quote);
            } else if api_id == self.config.reference_currency {
                rates.minor = Some(quote);
            }
        }

        rates
    }
}

fn ensure_trailing_slash(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> PriceFeedClient {
        PriceFeedClient::new(PriceFeedConfig::default()).unwrap()
    }

    #[test]
    fn test_build_url_carries_league_and_reference() {
        let client = test_client();
        let url = client.build_url("https://poe2scout.com/api/items/").unwrap();

        assert_eq!(url.path(), "/api/items/currency/currency");
        let query = url.query().unwrap();
        assert!(query.contains("league=Rise+of+the+Abyssal"));
        assert!(query.contains("referenceCurrency=exalted"));
    }

    #[test]
    fn test_base_chain_orders_primary_before_mirrors() {
        let config = PriceFeedConfig {
            mirrors: vec!["https://mirror.example/api/".to_string()],
            ..PriceFeedConfig::default()
        };
        let client = PriceFeedClient::new(config).unwrap();

        let chain = client.base_chain();
        assert_eq!(chain.len(), 2);
        assert!(chain[0].starts_with("https://poe2scout.com"));
        assert_eq!(chain[1], "https://mirror.example/api/");
    }

    #[test]
    fn test_extract_rates_from_wrapped_payload() {
        let client = test_client();
        let body = r#"{
            "data": [
                {"apiId": "divine", "currentPrice": 205.84, "iconUrl": "https://cdn.example/divine.png"},
                {"apiId": "exalted", "currentPrice": 1.0},
                {"apiId": "chaos", "currentPrice": 0.5}
            ]
        }"#;
        let payload: FeedPayload = serde_json::from_str(body).unwrap();
        let rates = client.extract_rates(payload.into_items());

        let major = rates.major.unwrap();
        assert_eq!(major.price, 205.84);
        assert_eq!(major.icon_url.as_deref(), Some("https://cdn.example/divine.png"));
        assert_eq!(rates.minor.unwrap().price, 1.0);
    }

    #[test]
    fn test_extract_rates_from_bare_array() {
        let client = test_client();
        let body = r#"[{"apiId": "divine", "currentPrice": 190.5}]"#;
        let payload: FeedPayload = serde_json::from_str(body).unwrap();
        let rates = client.extract_rates(payload.into_items());

        assert_eq!(rates.major.unwrap().price, 190.5);
        assert!(rates.minor.is_none());
    }

    #[test]
    fn test_extract_rates_rejects_non_positive_prices() {
        let client = test_client();
        let body = r#"{
            "data": [
                {"apiId": "divine", "currentPrice": 0.0},
                {"apiId": "exalted", "currentPrice": -1.0}
            ]
        }"#;
        let payload: FeedPayload = serde_json::from_str(body).unwrap();
        let rates = client.extract_rates(payload.into_items());

        assert!(rates.is_empty());
    }

    #[test]
    fn test_extract_rates_falls_back_to_metadata_icon() {
        let client = test_client();
        let body = r#"{
            "items": [
                {"apiId": "divine", "currentPrice": 200.0,
                 "itemMetadata": {"icon": "https://cdn.example/d.png"}}
            ]
        }"#;
        let payload: FeedPayload = serde_json::from_str(body).unwrap();
        let rates = client.extract_rates(payload.into_items());

        assert_eq!(
            rates.major.unwrap().icon_url.as_deref(),
            Some("https://cdn.example/d.png")
        );
    }
}
