//! Server list ping status probe.
//!
//! Performs the Java edition status exchange over a plain TCP connection:
//! handshake, status request, one JSON response. Latency is the time from
//! sending the request to having the full response.

use super::codec;
use super::{ProbeFailure, ProbeResult, StatusProbe, VERSION_NOT_AVAILABLE};
use crate::error::ProbeError;
use crate::types::{Port, ScanTarget};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Protocol version sent in the handshake when none is configured.
pub const DEFAULT_PROTOCOL_VERSION: i32 = 47;

/// Status probe speaking the server list ping protocol.
#[derive(Debug, Clone)]
pub struct SlpProbe {
    protocol_version: i32,
}

impl SlpProbe {
    /// Create a probe that announces `protocol_version` in its handshake.
    pub fn new(protocol_version: i32) -> Self {
        Self { protocol_version }
    }

    async fn query(&self, target: &ScanTarget, port: Port) -> Result<ProbeResult, ProbeError> {
        let addr = target.socket_addr(port);
        let mut stream = match TcpStream::connect(addr).await {
            Ok(stream) => stream,
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                return Err(ProbeError::ConnectionRefused)
            }
            Err(e) => return Err(ProbeError::Connect(e.to_string())),
        };
        stream.set_nodelay(true)?;

        stream
            .write_all(&codec::handshake(&target.host, port.as_u16(), self.protocol_version))
            .await?;

        let start = Instant::now();
        stream.write_all(&codec::status_request()).await?;
        let frame = codec::read_frame(&mut stream).await?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let json = codec::parse_status_response(&frame)?;
        trace!(%addr, bytes = json.len(), "status response");

        let status: StatusJson = serde_json::from_str(&json)?;
        Ok(status.into_result(&target.host, port, latency_ms))
    }
}

impl Default for SlpProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROTOCOL_VERSION)
    }
}

#[async_trait]
impl StatusProbe for SlpProbe {
    async fn probe(
        &self,
        target: &ScanTarget,
        port: Port,
        limit: Duration,
    ) -> Result<ProbeResult, ProbeFailure> {
        match timeout(limit, self.query(target, port)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(reason)) => Err(ProbeFailure::new(target, port, reason)),
            Err(_) => Err(ProbeFailure::new(target, port, ProbeError::Timeout)),
        }
    }
}

/// The subset of the status document that gets recorded.
#[derive(Debug, Default, Deserialize)]
struct StatusJson {
    #[serde(default)]
    version: Option<VersionJson>,
    #[serde(default)]
    players: Option<PlayersJson>,
}

#[derive(Debug, Default, Deserialize)]
struct VersionJson {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    protocol: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct PlayersJson {
    #[serde(default)]
    online: i64,
    #[serde(default)]
    max: i64,
}

impl StatusJson {
    fn into_result(self, host: &str, port: Port, latency_ms: f64) -> ProbeResult {
        let version = self.version.unwrap_or_default();
        let players = self.players.unwrap_or_default();

        ProbeResult {
            host: host.to_string(),
            port,
            online_count: players.online,
            max_players: players.max,
            version: version
                .name
                .unwrap_or_else(|| VERSION_NOT_AVAILABLE.to_string()),
            protocol_id: version.protocol.unwrap_or(-1),
            latency_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    /// Serve one status exchange on an ephemeral localhost port.
    async fn fake_server(response: Vec<u8>) -> Port {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let handshake = codec::read_frame(&mut socket).await.unwrap();
            assert_eq!(handshake[0], 0x00);
            let request = codec::read_frame(&mut socket).await.unwrap();
            assert_eq!(request, vec![0x00]);
            socket.write_all(&response).await.unwrap();
        });

        Port::new(port).unwrap()
    }

    fn localhost() -> ScanTarget {
        ScanTarget::new("localhost", IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    #[tokio::test]
    async fn test_probe_reads_status() {
        let json = r#"{"version":{"name":"1.20.1","protocol":763},"players":{"max":20,"online":5},"description":"hi"}"#;
        let port = fake_server(codec::status_response(json)).await;

        let result = SlpProbe::default()
            .probe(&localhost(), port, Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(result.host, "localhost");
        assert_eq!(result.port, port);
        assert_eq!(result.online_count, 5);
        assert_eq!(result.max_players, 20);
        assert_eq!(result.version, "1.20.1");
        assert_eq!(result.protocol_id, 763);
        assert!(result.latency_ms >= 0.0);
        assert!(result.is_reportable());
    }

    #[tokio::test]
    async fn test_probe_without_version_yields_sentinel() {
        let port = fake_server(codec::status_response(r#"{"players":{"max":1,"online":0}}"#)).await;

        let result = SlpProbe::default()
            .probe(&localhost(), port, Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(result.version, VERSION_NOT_AVAILABLE);
        assert!(!result.is_reportable());
    }

    #[tokio::test]
    async fn test_probe_rejects_invalid_json() {
        let port = fake_server(codec::status_response("not json")).await;

        let failure = SlpProbe::default()
            .probe(&localhost(), port, Duration::from_secs(2))
            .await
            .unwrap_err();

        assert_eq!(failure.port, port);
        assert!(matches!(failure.reason, ProbeError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn test_probe_times_out_on_silent_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let failure = SlpProbe::default()
            .probe(&localhost(), port, Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(matches!(failure.reason, ProbeError::Timeout));
    }

    #[tokio::test]
    async fn test_probe_closed_port_fails() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let failure = SlpProbe::default()
            .probe(&localhost(), Port::new(port).unwrap(), Duration::from_millis(500))
            .await
            .unwrap_err();

        assert!(matches!(
            failure.reason,
            ProbeError::ConnectionRefused | ProbeError::Connect(_) | ProbeError::Timeout
        ));
    }
}
