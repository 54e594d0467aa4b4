//! HTTP-backed advice resolver.
//!
//! Posts `{"query": ...}` to the configured endpoint and expects
//! `{"result": ..., "recommendations": ...}` back. No request timeout is
//! set; a pending call simply stays pending.

use async_trait::async_trait;
use serde::Serialize;

use super::{AdviceResolver, ResolverError};
use crate::models::AdviceRecord;

pub struct RemoteAdviceResolver {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct AdviceRequest<'a> {
    query: &'a str,
}

impl RemoteAdviceResolver {
    pub fn new(endpoint: &str) -> Result<Self, ResolverError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ResolverError::HttpClient(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AdviceResolver for RemoteAdviceResolver {
    async fn resolve(&self, query: &str) -> Result<AdviceRecord, ResolverError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AdviceRequest { query })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ResolverError::Unavailable(self.endpoint.clone())
                } else {
                    ResolverError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Advice service rejected query");
            return Err(ResolverError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<AdviceRecord>()
            .await
            .map_err(|e| ResolverError::ResponseParsing(e.to_string()))
    }
}
