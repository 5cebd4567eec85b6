// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::IntegrationError;
use crate::integrations::{WebhookClient, WebhookRequest};

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Sends webhook actions over HTTP.
#[derive(Clone)]
pub struct HttpWebhookClient {
	client: Client,
}

impl HttpWebhookClient {
	pub fn new(timeout: Duration) -> Result<Self, IntegrationError> {
		let client = Client::builder().timeout(timeout).build()?;
		Ok(Self { client })
	}

	pub fn with_client(client: Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl WebhookClient for HttpWebhookClient {
	#[instrument(skip(self, request), fields(url = %request.url, method = %request.method))]
	async fn send(&self, request: WebhookRequest) -> Result<(), IntegrationError> {
		let method = Method::from_bytes(request.method.as_bytes())
			.map_err(|_| IntegrationError::Other(format!("invalid HTTP method: {}", request.method)))?;

		let mut builder = self
			.client
			.request(method, &request.url)
			.header(CONTENT_TYPE, "application/json");
		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		if let Some(body) = &request.body {
			builder = builder.body(serde_json::to_vec(body).map_err(|e| IntegrationError::Other(e.to_string()))?);
		}

		let response = builder.send().await?;
		let status = response.status();
		if !status.is_success() {
			let mut body = response.text().await.unwrap_or_default();
			if body.len() > MAX_ERROR_BODY {
				let mut cut = MAX_ERROR_BODY;
				while !body.is_char_boundary(cut) {
					cut -= 1;
				}
				body.truncate(cut);
			}
			return Err(IntegrationError::Status {
				status: status.as_u16(),
				body,
			});
		}

		debug!(status = status.as_u16(), "webhook delivered");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use std::collections::BTreeMap;
	use wiremock::matchers::{body_json, header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn client() -> HttpWebhookClient {
		HttpWebhookClient::new(Duration::from_secs(5)).unwrap()
	}

	#[tokio::test]
	async fn test_post_sends_json_body_and_headers() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/hook"))
			.and(header("x-token", "abc"))
			.and(header("content-type", "application/json"))
			.and(body_json(json!({"candidate": "Ada"})))
			.respond_with(ResponseTemplate::new(204))
			.expect(1)
			.mount(&server)
			.await;

		let mut headers = BTreeMap::new();
		headers.insert("X-Token".to_string(), "abc".to_string());
		client()
			.send(WebhookRequest {
				url: format!("{}/hook", server.uri()),
				method: "POST".to_string(),
				headers,
				body: Some(json!({"candidate": "Ada"})),
			})
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn test_get_is_sent_without_body() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/ping"))
			.respond_with(ResponseTemplate::new(200))
			.expect(1)
			.mount(&server)
			.await;

		client()
			.send(WebhookRequest {
				url: format!("{}/ping", server.uri()),
				method: "GET".to_string(),
				headers: BTreeMap::new(),
				body: None,
			})
			.await
			.unwrap();

		let received = server.received_requests().await.unwrap();
		assert_eq!(received.len(), 1);
		assert!(received[0].body.is_empty());
	}

	#[tokio::test]
	async fn test_non_success_status_is_an_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(500).set_body_string("boom"))
			.mount(&server)
			.await;

		let err = client()
			.send(WebhookRequest {
				url: server.uri(),
				method: "POST".to_string(),
				headers: BTreeMap::new(),
				body: Some(json!({})),
			})
			.await
			.unwrap_err();

		match err {
			IntegrationError::Status { status, body } => {
				assert_eq!(status, 500);
				assert_eq!(body, "boom");
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_invalid_method_is_rejected_before_sending() {
		let err = client()
			.send(WebhookRequest {
				url: "http://127.0.0.1:9/".to_string(),
				method: "NOT A METHOD".to_string(),
				headers: BTreeMap::new(),
				body: None,
			})
			.await
			.unwrap_err();
		assert!(matches!(err, IntegrationError::Other(_)));
	}
}
