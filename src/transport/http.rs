use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Transport, TransportError};

/// reqwest-backed [`Transport`] carrying the bearer credential.
///
/// The token is held here and nowhere else; it goes out in the
/// `Authorization` header and is never logged.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn execute(
        &self,
        method: &str,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, TransportError> {
        let request_id = Uuid::new_v4().to_string();
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let mut req = match method {
            "POST" => self.client.post(&url),
            _ => self.client.get(&url),
        };
        req = req
            .bearer_auth(&self.token)
            .header("x-request-id", &request_id);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let start = Instant::now();
        let resp = req.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            let body_text = resp.text().await.unwrap_or_default();

            warn!(
                http_status = status.as_u16(),
                method,
                path,
                request_id = request_id.as_str(),
                duration_ms = start.elapsed().as_millis() as u64,
                "tessie request failed"
            );

            // Raw request metadata, including the auth header; the classifier
            // strips credentials before any of this is echoed to a caller.
            let meta = json!({
                "method": method,
                "path": path,
                "query": query
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect::<serde_json::Map<_, _>>(),
                "headers": {
                    "authorization": format!("Bearer {}", self.token),
                    "x-request-id": request_id,
                },
            });

            return Err(TransportError::Status {
                status: status.as_u16(),
                body: body_text,
                retry_after,
                meta,
            });
        }

        let value: serde_json::Value = resp.json().await?;

        debug!(
            http_status = status.as_u16(),
            method,
            path,
            request_id = request_id.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "tessie request ok"
        );

        Ok(value)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, TransportError> {
        self.execute("GET", path, query, None).await
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        self.execute("POST", path, &[], Some(body)).await
    }
}
