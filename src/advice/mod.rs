//! Symptom advice resolution.
//!
//! Every chat flow goes through the `AdviceResolver` trait:
//! - `RuleTableResolver`: deterministic keyword table, never fails
//! - `RemoteAdviceResolver`: HTTP inference backend with the same contract
//! - `SimulatedLatency`: wraps any resolver with a randomized delay

pub mod latency;
pub mod remote;
pub mod rules;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::AdviceRecord;

pub use latency::{LatencyRange, SimulatedLatency};
pub use remote::RemoteAdviceResolver;
pub use rules::{classify, lookup, RuleTableResolver};

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Advice service unreachable at {0}")]
    Unavailable(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Advice service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Resolver task failed: {0}")]
    Internal(String),
}

/// Maps a free-text query to an advice record.
#[async_trait]
pub trait AdviceResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<AdviceRecord, ResolverError>;
}

#[async_trait]
impl<T: AdviceResolver + ?Sized> AdviceResolver for Arc<T> {
    async fn resolve(&self, query: &str) -> Result<AdviceRecord, ResolverError> {
        (**self).resolve(query).await
    }
}

/// Build the resolver selected by configuration.
///
/// A configured advice URL selects the remote backend, otherwise the
/// keyword table. The latency range wraps either one unless disabled.
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn AdviceResolver>, ResolverError> {
    let latency = config.latency;
    let resolver: Arc<dyn AdviceResolver> = match &config.advice_url {
        Some(url) => {
            tracing::info!(endpoint = %url, "Using remote advice resolver");
            let remote = RemoteAdviceResolver::new(url)?;
            if latency.is_disabled() {
                Arc::new(remote)
            } else {
                Arc::new(SimulatedLatency::new(remote, latency))
            }
        }
        None => {
            tracing::info!(?latency, "Using keyword advice table");
            if latency.is_disabled() {
                Arc::new(RuleTableResolver)
            } else {
                Arc::new(SimulatedLatency::new(RuleTableResolver, latency))
            }
        }
    };
    Ok(resolver)
}
