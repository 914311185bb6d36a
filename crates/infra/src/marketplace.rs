//! Plugin marketplace catalogue fetched over HTTP and cached with moka.
//!
//! A non-200 response or a body that is not a plugin list yields an empty
//! catalogue. Only successful fetches are cached.

use std::time::Duration;

use async_trait::async_trait;
use kimai_core::Marketplace;
use kimai_domain::{MarketplaceConfig, MarketplacePlugin, Result};
use moka::future::Cache;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::http::HttpClient;

const CATALOGUE_KEY: &str = "kimai.marketplace_extensions";

pub struct HttpMarketplace {
    client: HttpClient,
    url: String,
    cache: Cache<&'static str, Vec<MarketplacePlugin>>,
}

impl HttpMarketplace {
    pub fn new(config: &MarketplaceConfig) -> Result<Self> {
        let client =
            HttpClient::builder().timeout(Duration::from_secs(config.timeout_secs.max(1))).build()?;
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(config.cache_ttl_secs))
            .build();
        Ok(Self { client, url: config.url.clone(), cache })
    }

    async fn download(&self) -> Result<Option<Vec<MarketplacePlugin>>> {
        let response = self.client.send(self.client.request(Method::GET, &self.url)).await?;
        if response.status() != StatusCode::OK {
            warn!(status = %response.status(), url = %self.url, "marketplace returned non-200 status");
            return Ok(None);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "failed to read marketplace response");
                return Ok(None);
            }
        };

        Ok(parse_catalogue(&body))
    }
}

#[async_trait]
impl Marketplace for HttpMarketplace {
    async fn fetch_plugins(&self) -> Result<Vec<MarketplacePlugin>> {
        if let Some(cached) = self.cache.get(CATALOGUE_KEY).await {
            debug!(plugins = cached.len(), "marketplace catalogue served from cache");
            return Ok(cached);
        }

        match self.download().await? {
            Some(plugins) => {
                self.cache.insert(CATALOGUE_KEY, plugins.clone()).await;
                Ok(plugins)
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Accepts a JSON array of plugins or an object keyed by plugin name.
fn parse_catalogue(body: &str) -> Option<Vec<MarketplacePlugin>> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "marketplace response is not valid JSON");
            return None;
        }
    };

    let entries: Vec<Value> = match value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .into_iter()
            .map(|(name, mut entry)| {
                if let Value::Object(fields) = &mut entry {
                    fields.entry("name").or_insert(Value::String(name));
                }
                entry
            })
            .collect(),
        _ => return None,
    };

    Some(
        entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value::<MarketplacePlugin>(entry).ok())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn marketplace(server: &MockServer) -> HttpMarketplace {
        let config = MarketplaceConfig {
            url: format!("{}/plugins.json", server.uri()),
            cache_ttl_secs: 60,
            timeout_secs: 2,
        };
        HttpMarketplace::new(&config).expect("marketplace client")
    }

    #[test]
    fn parses_array_and_object_catalogues() {
        let list = parse_catalogue(r#"[{"name":"CustomCSSBundle","version":"2.0"},{"bad":1}]"#)
            .expect("array parsed");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].version.as_deref(), Some("2.0"));

        let keyed = parse_catalogue(r#"{"ExpensesBundle":{"description":"Expenses"}}"#)
            .expect("object parsed");
        assert_eq!(keyed[0].name, "ExpensesBundle");

        assert!(parse_catalogue("null").is_none());
        assert!(parse_catalogue("<html>").is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn catalogue_is_cached_after_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plugins.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"[{"name":"InvoiceBundle"}]"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let marketplace = marketplace(&server);
        let first = marketplace.fetch_plugins().await.unwrap();
        let second = marketplace.fetch_plugins().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].name, "InvoiceBundle");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_200_and_invalid_json_yield_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let marketplace = marketplace(&server);
        assert!(marketplace.fetch_plugins().await.unwrap().is_empty());
        assert!(marketplace.fetch_plugins().await.unwrap().is_empty());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }
}
