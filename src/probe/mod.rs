//! Status probing.
//!
//! A probe performs one status query against a single `(host, port)` pair
//! and always hands back a definite outcome: a [`ProbeResult`] or a
//! [`ProbeFailure`]. Nothing here touches shared scan state.

pub mod codec;
pub mod slp;

use crate::error::ProbeError;
use crate::types::{Port, ScanTarget};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use slp::SlpProbe;

/// Version string a server reports when it has no real version.
///
/// Results carrying it are drained but never persisted or reported.
pub const VERSION_NOT_AVAILABLE: &str = "N/A";

/// Status metadata of one responsive port.
///
/// Field renames follow the column names of the results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    #[serde(rename = "server_address")]
    pub host: String,
    #[serde(rename = "server_port")]
    pub port: Port,
    pub online_count: i64,
    pub max_players: i64,
    pub version: String,
    #[serde(rename = "protocol")]
    pub protocol_id: i64,
    #[serde(rename = "latency")]
    pub latency_ms: f64,
}

impl ProbeResult {
    /// Whether this result counts as an active server.
    pub fn is_reportable(&self) -> bool {
        self.version != VERSION_NOT_AVAILABLE
    }
}

/// A port that produced no result, and why.
#[derive(Debug, thiserror::Error)]
#[error("{host}:{port} did not respond: {reason}")]
pub struct ProbeFailure {
    pub host: String,
    pub port: Port,
    #[source]
    pub reason: ProbeError,
}

impl ProbeFailure {
    pub fn new(target: &ScanTarget, port: Port, reason: ProbeError) -> Self {
        Self {
            host: target.host.clone(),
            port,
            reason,
        }
    }
}

/// Trait for status query implementations.
///
/// Implementations must turn every connection or protocol error into a
/// [`ProbeFailure`]; the scheduler relies on each call returning.
///
/// # Example
///
/// ```ignore
/// use mcportscan::probe::{SlpProbe, StatusProbe};
///
/// let probe = SlpProbe::default();
/// match probe.probe(&target, port, Duration::from_secs(3)).await {
///     Ok(status) => println!("{} players online", status.online_count),
///     Err(failure) => println!("{}", failure),
/// }
/// ```
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Query the status of `port` on `target`, bounded by `timeout`.
    async fn probe(
        &self,
        target: &ScanTarget,
        port: Port,
        timeout: Duration,
    ) -> Result<ProbeResult, ProbeFailure>;
}

/// Scripted probes for exercising the scheduler and controller.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    type Hook = Box<dyn Fn(Port) + Send + Sync>;

    /// Answers from a fixed table; unlisted ports are refused.
    #[derive(Default)]
    pub struct ScriptedProbe {
        answers: HashMap<u16, ProbeResult>,
        delay: Duration,
        hook: Option<Hook>,
        pub calls: Mutex<Vec<u16>>,
    }

    impl ScriptedProbe {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `port` with a server reporting `version`.
        pub fn with_server(mut self, port: u16, version: &str, online: i64, max: i64) -> Self {
            let result = ProbeResult {
                host: String::new(),
                port: Port::new(port).unwrap(),
                online_count: online,
                max_players: max,
                version: version.to_string(),
                protocol_id: 763,
                latency_ms: 42.0,
            };
            self.answers.insert(port, result);
            self
        }

        /// Sleep before answering, to keep several probes in flight.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        /// Run `hook` at the start of every probe.
        pub fn with_hook(mut self, hook: impl Fn(Port) + Send + Sync + 'static) -> Self {
            self.hook = Some(Box::new(hook));
            self
        }
    }

    #[async_trait]
    impl StatusProbe for ScriptedProbe {
        async fn probe(
            &self,
            target: &ScanTarget,
            port: Port,
            _timeout: Duration,
        ) -> Result<ProbeResult, ProbeFailure> {
            if let Some(hook) = &self.hook {
                hook(port);
            }
            self.calls.lock().unwrap().push(port.as_u16());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.answers.get(&port.as_u16()) {
                Some(result) => Ok(ProbeResult {
                    host: target.host.clone(),
                    ..result.clone()
                }),
                None => Err(ProbeFailure::new(target, port, ProbeError::ConnectionRefused)),
            }
        }
    }
}
