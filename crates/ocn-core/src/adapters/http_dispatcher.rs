//! reqwest-backed outbound dispatcher.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde_json::Value;

use ocn_types::{header_names, PeerResponse, RequestMethod, ResponseHeaders};

use crate::domain::errors::RelayError;
use crate::domain::routing::DeliveryPlan;
use crate::ports::HttpDispatcher;

/// Shared HTTP client with a per-request timeout.
pub struct ReqwestDispatcher {
    client: reqwest::Client,
}

impl ReqwestDispatcher {
    pub fn new(timeout_ms: u64) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| RelayError::Internal(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

fn http_method(method: RequestMethod) -> reqwest::Method {
    match method {
        RequestMethod::Get => reqwest::Method::GET,
        RequestMethod::Post => reqwest::Method::POST,
        RequestMethod::Put => reqwest::Method::PUT,
        RequestMethod::Patch => reqwest::Method::PATCH,
        RequestMethod::Delete => reqwest::Method::DELETE,
    }
}

fn transport_error(error: reqwest::Error) -> RelayError {
    if error.is_timeout() {
        RelayError::DownstreamTimeout(error.to_string())
    } else {
        RelayError::DownstreamConnection(error.to_string())
    }
}

fn surfaced_headers(headers: &HeaderMap) -> ResponseHeaders {
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    ResponseHeaders {
        location: text(header_names::LOCATION),
        link: text(header_names::LINK),
        total_count: text(header_names::TOTAL_COUNT),
        limit: text(header_names::LIMIT),
    }
}

#[async_trait]
impl HttpDispatcher for ReqwestDispatcher {
    async fn dispatch(&self, plan: DeliveryPlan) -> Result<PeerResponse, RelayError> {
        match plan {
            DeliveryPlan::Local { method, url, headers, query, body } => {
                let mut request = self
                    .client
                    .request(http_method(method), &url)
                    .header(header_names::AUTHORIZATION, &headers.authorization)
                    .header(header_names::REQUEST_ID, &headers.request_id)
                    .header(header_names::CORRELATION_ID, &headers.correlation_id)
                    .header(header_names::FROM_COUNTRY, headers.sender.country_code())
                    .header(header_names::FROM_PARTY, headers.sender.party_id())
                    .header(header_names::TO_COUNTRY, headers.receiver.country_code())
                    .header(header_names::TO_PARTY, headers.receiver.party_id());
                if let Some(signature) = &headers.signature {
                    request = request.header(header_names::SIGNATURE, signature);
                }
                if let Some(query) = &query {
                    request = request.query(query);
                }
                if let Some(body) = &body {
                    request = request.json(body);
                }

                let response = request.send().await.map_err(transport_error)?;
                let status = response.status().as_u16();
                let surfaced = surfaced_headers(response.headers());
                let bytes = response.bytes().await.map_err(transport_error)?;
                let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
                    RelayError::DownstreamShape(format!("platform response is not protocol JSON: {e}"))
                })?;

                Ok(PeerResponse { status, headers: surfaced, body })
            }
            DeliveryPlan::Remote { relay_url, payload, signature } => {
                let response = self
                    .client
                    .post(&relay_url)
                    .header(CONTENT_TYPE, "application/json")
                    .header(header_names::SIGNATURE, &signature)
                    .body(payload)
                    .send()
                    .await
                    .map_err(transport_error)?;

                let status = response.status().as_u16();
                let bytes = response.bytes().await.map_err(transport_error)?;

                // A peer answers a well-formed relay with 200 and the
                // downstream response serialized verbatim. Anything else is
                // the peer's own rejection, surfaced as-is.
                if status == 200 {
                    serde_json::from_slice(&bytes).map_err(|e| {
                        RelayError::DownstreamShape(format!("peer relay response: {e}"))
                    })
                } else {
                    let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
                        RelayError::DownstreamShape(format!("peer rejection body: {e}"))
                    })?;
                    Ok(PeerResponse { status, headers: ResponseHeaders::default(), body })
                }
            }
        }
    }

    async fn fetch(&self, url: &str, token: &str) -> Result<PeerResponse, RelayError> {
        let response = self
            .client
            .get(url)
            .header(header_names::AUTHORIZATION, format!("Token {token}"))
            .header(header_names::REQUEST_ID, uuid::Uuid::new_v4().to_string())
            .header(header_names::CORRELATION_ID, uuid::Uuid::new_v4().to_string())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let surfaced = surfaced_headers(response.headers());
        let bytes = response.bytes().await.map_err(transport_error)?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            RelayError::DownstreamShape(format!("version catalog is not protocol JSON: {e}"))
        })?;

        Ok(PeerResponse { status, headers: surfaced, body })
    }
}
