//! Session-holding HTTP client for one investor

use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::{Client, RequestBuilder, Response};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tracing::{debug, instrument, warn};
use url::Url;

use super::messages::*;
use crate::common::errors::{BenchError, Result};
use crate::common::traits::ExchangeApi;
use crate::common::types::{InfoSnapshot, Order, Side};
use crate::config::types::TargetConfig;

/// Account an investor signs up and signs in with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub name: String,
    pub bank_id: String,
    pub password: String,
}

impl Credentials {
    /// Fresh account named after `prefix` and the investor index
    pub fn generate(prefix: &str, index: usize) -> Self {
        let suffix = random_token(6).to_lowercase();
        Self {
            name: format!("{prefix} investor {index}"),
            bank_id: format!("{prefix}-{index}-{suffix}"),
            password: random_token(16),
        }
    }
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// HTTP client for the exchange web app
///
/// Keeps the session cookie issued by POST /signin. After
/// `max_transport_failures` consecutive requests that never got an answer
/// the client retires itself.
#[derive(Debug)]
pub struct HttpExchangeClient {
    /// HTTP client with cookie store
    client: Client,
    /// Base URL, always ending in `/`
    base_url: Url,
    credentials: Credentials,
    retired: AtomicBool,
    transport_failures: AtomicU32,
    max_transport_failures: u32,
}

impl HttpExchangeClient {
    pub fn new(target: &TargetConfig, credentials: Credentials) -> Result<Self> {
        let mut base_url = Url::parse(&target.base_url).map_err(|e| {
            BenchError::Configuration(format!("invalid base url {}: {}", target.base_url, e))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(target.request_timeout())
            .cookie_store(true)
            .build()
            .map_err(|e| BenchError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            credentials,
            retired: AtomicBool::new(false),
            transport_failures: AtomicU32::new(0),
            max_transport_failures: target.max_transport_failures,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Consecutive requests that failed before reaching the exchange
    pub fn transport_failures(&self) -> u32 {
        self.transport_failures.load(Ordering::Acquire)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BenchError::Internal(format!("bad endpoint {}: {}", path, e)))
    }

    /// Send a request and turn non-2xx answers into [`BenchError::Status`]
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                self.record_transport_failure();
                return Err(e.into());
            }
        };
        self.transport_failures.store(0, Ordering::Release);

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) if !parsed.err.is_empty() => parsed.err,
            _ => body,
        };
        debug!(status = status.as_u16(), %message, "exchange returned an error");
        Err(BenchError::Status {
            status: status.as_u16(),
            message,
        })
    }

    fn record_transport_failure(&self) {
        let failures = self.transport_failures.fetch_add(1, Ordering::AcqRel) + 1;
        let exhausted =
            self.max_transport_failures > 0 && failures >= self.max_transport_failures;
        if exhausted && !self.retired.swap(true, Ordering::AcqRel) {
            warn!(
                bank_id = %self.credentials.bank_id,
                failures, "too many transport failures, retiring"
            );
        }
    }
}

#[async_trait]
impl ExchangeApi for HttpExchangeClient {
    fn bank_id(&self) -> String {
        self.credentials.bank_id.clone()
    }

    fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    #[instrument(skip(self))]
    async fn top(&self) -> Result<()> {
        let url = self.endpoint("/")?;
        self.send(self.client.get(url)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(bank_id = %self.credentials.bank_id))]
    async fn signup(&self) -> Result<()> {
        let url = self.endpoint("/signup")?;
        let form = SignupForm {
            name: &self.credentials.name,
            bank_id: &self.credentials.bank_id,
            password: &self.credentials.password,
        };
        self.send(self.client.post(url).form(&form)).await?;
        debug!("signed up");
        Ok(())
    }

    #[instrument(skip(self), fields(bank_id = %self.credentials.bank_id))]
    async fn signin(&self) -> Result<()> {
        let url = self.endpoint("/signin")?;
        let form = SigninForm {
            bank_id: &self.credentials.bank_id,
            password: &self.credentials.password,
        };
        self.send(self.client.post(url).form(&form)).await?;
        debug!("signed in");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn info(&self, cursor: i64) -> Result<InfoSnapshot> {
        let mut url = self.endpoint("/info")?;
        url.query_pairs_mut()
            .append_pair("cursor", &cursor.to_string());
        debug!("Fetching info from: {}", url);

        let body = self.send(self.client.get(url)).await?.text().await?;
        let info: InfoSnapshot = serde_json::from_str(&body)?;
        Ok(info)
    }

    #[instrument(skip(self))]
    async fn get_orders(&self) -> Result<Vec<Order>> {
        let url = self.endpoint("/orders")?;
        let body = self.send(self.client.get(url)).await?.text().await?;
        // the exchange encodes an empty list as null
        let orders: Option<Vec<Order>> = serde_json::from_str(&body)?;
        Ok(orders.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn add_order(&self, side: Side, amount: i64, price: i64) -> Result<Order> {
        let url = self.endpoint("/orders")?;
        let form = OrderForm {
            side: side.as_str(),
            amount,
            price,
        };
        let body = self
            .send(self.client.post(url).form(&form))
            .await?
            .text()
            .await?;
        let created: IdResponse = serde_json::from_str(&body)?;
        if created.id <= 0 {
            return Err(BenchError::InvalidResponse(format!(
                "order accepted with id {}",
                created.id
            )));
        }
        debug!(order_id = created.id, "order accepted");
        Ok(Order::placed(created.id, side, amount, price, Utc::now()))
    }

    #[instrument(skip(self))]
    async fn delete_order(&self, id: i64) -> Result<()> {
        let url = self.endpoint(&format!("/order/{}", id))?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(base_url: &str) -> TargetConfig {
        TargetConfig {
            base_url: base_url.to_string(),
            ..TargetConfig::default()
        }
    }

    #[test]
    fn test_client_creation() {
        let client = HttpExchangeClient::new(
            &target("http://localhost:5000"),
            Credentials::generate("bench", 0),
        );
        assert!(client.is_ok());
        let client = client.unwrap();
        assert!(!client.is_retired());
        assert_eq!(client.transport_failures(), 0);
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let client = HttpExchangeClient::new(
            &target("http://localhost:5000/isucoin"),
            Credentials::generate("bench", 1),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("/info").unwrap().as_str(),
            "http://localhost:5000/isucoin/info"
        );
        assert_eq!(
            client.endpoint("/order/12").unwrap().as_str(),
            "http://localhost:5000/isucoin/order/12"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpExchangeClient::new(&target("not a url"), Credentials::generate("b", 0))
            .unwrap_err();
        assert!(matches!(err, BenchError::Configuration(_)));
    }

    #[test]
    fn test_generated_credentials() {
        let a = Credentials::generate("bench", 3);
        let b = Credentials::generate("bench", 3);
        assert!(a.bank_id.starts_with("bench-3-"));
        assert_ne!(a.bank_id, b.bank_id);
        assert_eq!(a.password.len(), 16);
    }

    #[tokio::test]
    async fn test_unreachable_exchange_retires_client() {
        let config = TargetConfig {
            // nothing listens on port 9 of localhost in the test environment
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: 500,
            max_transport_failures: 2,
        };
        let client = HttpExchangeClient::new(&config, Credentials::generate("bench", 0)).unwrap();

        assert!(client.top().await.unwrap_err().is_transport());
        assert!(!client.is_retired());
        assert!(client.top().await.is_err());
        assert!(client.is_retired());
    }
}
