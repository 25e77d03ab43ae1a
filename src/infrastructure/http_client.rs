use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Longest slice of an error body kept in provider error messages
const MAX_ERROR_BODY: usize = 512;

/// JSON-over-HTTP seam shared by all provider adapters
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Client whose connection attempts give up after `connect_timeout`
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::provider("http", format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            let error_body: String = error_body.chars().take(MAX_ERROR_BODY).collect();

            return Err(DomainError::provider(
                "http",
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::provider("http", format!("Failed to parse response: {}", e)))
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Mutex, RwLock};

    use serde_json::Value;

    type Handler = Box<dyn Fn(&Value) -> Result<Value, DomainError> + Send + Sync>;

    /// A request captured by [`MockHttpClient`]
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub url: String,
        pub headers: Vec<(String, String)>,
        pub body: Value,
    }

    impl RecordedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Per-URL canned responses or handlers, recording every request it sees
    pub struct MockHttpClient {
        handlers: RwLock<HashMap<String, Handler>>,
        requests: Mutex<Vec<RecordedRequest>>,
        delay: Option<Duration>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self {
                handlers: RwLock::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub fn with_response(self, url: impl Into<String>, response: Value) -> Self {
            self.with_handler(url, move |_| Ok(response.clone()))
        }

        pub fn with_error(self, url: impl Into<String>, error: impl Into<String>) -> Self {
            let error = error.into();
            self.with_handler(url, move |_| Err(DomainError::provider("mock", error.clone())))
        }

        pub fn with_handler<F>(self, url: impl Into<String>, handler: F) -> Self
        where
            F: Fn(&Value) -> Result<Value, DomainError> + Send + Sync + 'static,
        {
            self.handlers
                .write()
                .unwrap()
                .insert(url.into(), Box::new(handler));
            self
        }

        /// Sleep before answering every request
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
            self.requests()
                .into_iter()
                .filter(|r| r.url == url)
                .collect()
        }

        pub fn call_count(&self, url: &str) -> usize {
            self.requests_to(url).len()
        }
    }

    impl Default for MockHttpClient {
        fn default() -> Self {
            Self::new()
        }
    }

    impl fmt::Debug for MockHttpClient {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("MockHttpClient")
                .field("requests", &self.requests.lock().map(|r| r.len()).unwrap_or(0))
                .finish()
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn post_json(
            &self,
            url: &str,
            headers: Vec<(&str, &str)>,
            body: &Value,
        ) -> Result<Value, DomainError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: body.clone(),
            });

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let handlers = self.handlers.read().unwrap();
            let handler = handlers.get(url).ok_or_else(|| {
                DomainError::provider("mock", format!("No mock response for {}", url))
            })?;

            handler(body)
        }
    }
}
