// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the dashboard backend.
//!
//! Provides [`Gateway`] which handles request construction, multi-host
//! fallback, and response envelope unwrapping.
//!
//! Fallback only applies to connection-level failures (refused, DNS,
//! timeout). Any HTTP response, including 4xx and 5xx, is a definitive
//! answer from the backend and is never retried against another host.

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;
use vitrine_core::{DashboardSnapshot, ProfileId, VitrineError};
use vitrine_config::ServerConfig;

/// HTTP client for backend communication.
///
/// Holds an ordered list of candidate base URLs: the configured primary
/// first, then the primary with each fallback host substituted in.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: reqwest::Client,
    bases: Vec<String>,
}

impl Gateway {
    /// Creates a gateway from the server configuration.
    pub fn new(config: &ServerConfig) -> Result<Self, VitrineError> {
        let bases = candidate_bases(&config.http_base_url, &config.fallback_hosts)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| VitrineError::Network {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client, bases })
    }

    /// The candidate base URLs, in the order they are tried.
    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    /// Overrides the candidate base URLs (for testing with wiremock).
    #[cfg(test)]
    pub fn with_bases(mut self, bases: Vec<String>) -> Self {
        self.bases = bases;
        self
    }

    /// GET `path` with optional query parameters, unwrapping the response
    /// envelope if present.
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, VitrineError> {
        self.request(Method::GET, path, query, None).await
    }

    /// POST `body` as JSON to `path`, unwrapping the response envelope if
    /// present.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, VitrineError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    /// Fetch the dashboard snapshot for `profile`.
    pub async fn fetch_dashboard(
        &self,
        profile: &ProfileId,
    ) -> Result<DashboardSnapshot, VitrineError> {
        let value = self
            .get("/api/dashboard/data", &[("profile", profile.as_str())])
            .await?;
        serde_json::from_value(value).map_err(|e| VitrineError::Parse {
            message: format!("dashboard payload did not deserialize: {e}"),
        })
    }

    /// Ask the backend to rebuild its dashboard data before the next fetch.
    pub async fn request_refresh(&self) -> Result<(), VitrineError> {
        self.post("/api/dashboard/refresh", &Value::Object(Default::default()))
            .await?;
        Ok(())
    }

    /// Fetch the backend's current profile identifier.
    pub async fn current_profile(&self) -> Result<String, VitrineError> {
        let value = self.get("/api/profile", &[]).await?;
        match &value {
            Value::String(s) => Ok(s.clone()),
            Value::Object(map) => map
                .get("profile")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| VitrineError::Parse {
                    message: format!("profile payload missing 'profile' field: {value}"),
                }),
            _ => Err(VitrineError::Parse {
                message: format!("unexpected profile payload: {value}"),
            }),
        }
    }

    /// Tell the backend to switch to `profile`.
    pub async fn set_profile(&self, profile: &ProfileId) -> Result<(), VitrineError> {
        self.post(
            "/api/profile",
            &serde_json::json!({ "profile": profile.as_str() }),
        )
        .await?;
        Ok(())
    }

    /// Probe the backend health endpoint.
    pub async fn health(&self) -> Result<Value, VitrineError> {
        self.get("/api/health", &[]).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, VitrineError> {
        let mut last_err = None;

        for base in &self.bases {
            let url = format!("{base}{path}");
            let mut req = self.client.request(method.clone(), &url);
            if !query.is_empty() {
                req = req.query(query);
            }
            if let Some(body) = body {
                req = req.json(body);
            }

            let response = match req.send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(url = %url, error = %e, "request failed, trying next host");
                    last_err = Some(VitrineError::Network {
                        message: format!("request to {url} failed: {e}"),
                        source: Some(Box::new(e)),
                    });
                    continue;
                }
            };

            // A response from the backend is definitive, whatever the status.
            let status = response.status();
            debug!(url = %url, status = %status, "response received");
            let is_json = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.contains("json"));
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!(url = %url, error = %e, "response body read failed, trying next host");
                    last_err = Some(VitrineError::Network {
                        message: format!("reading body from {url} failed: {e}"),
                        source: Some(Box::new(e)),
                    });
                    continue;
                }
            };

            if !status.is_success() {
                return Err(VitrineError::Http {
                    status: status.as_u16(),
                    body: text,
                });
            }

            // Only bodies declared as JSON are parsed; anything else passes
            // through as raw text.
            let value: Value = if is_json {
                serde_json::from_str(&text).map_err(|e| VitrineError::Parse {
                    message: format!("response from {url} is not valid JSON: {e}"),
                })?
            } else {
                Value::String(text)
            };
            return unwrap_envelope(value, status.as_u16());
        }

        Err(last_err.unwrap_or_else(|| VitrineError::Network {
            message: "no candidate hosts configured".into(),
            source: None,
        }))
    }
}

/// Build the ordered candidate base URLs: primary first, then the primary
/// with each fallback host substituted, duplicates removed.
fn candidate_bases(
    http_base_url: &str,
    fallback_hosts: &[String],
) -> Result<Vec<String>, VitrineError> {
    let primary = Url::parse(http_base_url)
        .map_err(|e| VitrineError::Config(format!("invalid base URL '{http_base_url}': {e}")))?;

    let mut bases = vec![normalize(&primary)];
    for host in fallback_hosts {
        let mut candidate = primary.clone();
        if candidate.set_host(Some(host)).is_err() {
            warn!(host = %host, "skipping unusable fallback host");
            continue;
        }
        let candidate = normalize(&candidate);
        if !bases.contains(&candidate) {
            bases.push(candidate);
        }
    }
    Ok(bases)
}

fn normalize(url: &Url) -> String {
    url.as_str().trim_end_matches('/').to_string()
}

/// Unwrap the `{success, data}` envelope some endpoints use. Bare payloads
/// pass through untouched so new backend shapes keep working.
fn unwrap_envelope(value: Value, status: u16) -> Result<Value, VitrineError> {
    let Some(success) = value.get("success").and_then(Value::as_bool) else {
        return Ok(value);
    };
    if success {
        Ok(value.get("data").cloned().unwrap_or(Value::Null))
    } else {
        Err(VitrineError::Http {
            status,
            body: value
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
        })
    }
}
