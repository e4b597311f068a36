//! Health probes.
//!
//! A probe is a single liveness check against a registration's endpoint.
//! [`ProbeStrategy`] is the tagged variant over the supported probe types;
//! [`Prober`] is the seam the monitor calls through so tests can script
//! outcomes without touching the network.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use keeper_state::{ProbeType, Registration};

/// Boxed, sendable future used at the dyn seams of this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of a single health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// The endpoint answered successfully.
    Healthy,
    /// The endpoint answered with a non-2xx status.
    Unhealthy,
    /// The probe could not be executed (connection error, timeout).
    Failed,
}

impl ProbeResult {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeResult::Healthy)
    }
}

/// How to probe one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStrategy {
    /// `GET http://{address}{path}`; 2xx is healthy.
    Http { path: String },
    /// A completed TCP handshake is healthy.
    Tcp,
}

impl ProbeStrategy {
    /// Perform exactly one probe against `address`.
    pub async fn probe_once(&self, address: &str, timeout: Duration) -> ProbeResult {
        match self {
            ProbeStrategy::Http { path } => http_probe(address, path, timeout).await,
            ProbeStrategy::Tcp => tcp_probe(address, timeout).await,
        }
    }
}

/// Everything a prober needs to check one registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub service_id: String,
    /// `host:port` of the instance.
    pub address: String,
    pub strategy: ProbeStrategy,
}

impl ProbeTarget {
    pub fn from_registration(registration: &Registration) -> Result<Self, String> {
        let strategy = match registration.health_check.kind()? {
            ProbeType::Http => {
                let path = &registration.health_check.path;
                let path = if path.starts_with('/') {
                    path.clone()
                } else {
                    format!("/{path}")
                };
                ProbeStrategy::Http { path }
            }
            ProbeType::Tcp => ProbeStrategy::Tcp,
        };
        Ok(Self {
            service_id: registration.service_id.clone(),
            address: registration.address(),
            strategy,
        })
    }
}

/// Executes one probe per call. Implementations must not touch registry state.
pub trait Prober: Send + Sync + 'static {
    fn probe<'a>(&'a self, target: &'a ProbeTarget) -> BoxFuture<'a, ProbeResult>;
}

/// Prober that performs real HTTP / TCP checks with a bounded timeout.
#[derive(Debug, Clone)]
pub struct NetworkProber {
    timeout: Duration,
}

impl NetworkProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Prober for NetworkProber {
    fn probe<'a>(&'a self, target: &'a ProbeTarget) -> BoxFuture<'a, ProbeResult> {
        Box::pin(async move {
            let result = target
                .strategy
                .probe_once(&target.address, self.timeout)
                .await;
            debug!(service_id = %target.service_id, address = %target.address, ?result, "probe completed");
            result
        })
    }
}

/// Perform an HTTP health probe against an endpoint.
///
/// Returns `Healthy` if the response is 2xx, `Unhealthy` for non-2xx,
/// or `Failed` if the connection fails or times out.
pub async fn http_probe(address: &str, path: &str, timeout: Duration) -> ProbeResult {
    let uri = format!("http://{address}{path}");

    let result = tokio::time::timeout(timeout, async {
        let stream = match tokio::net::TcpStream::connect(address).await {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, %uri, "health probe connection failed");
                return ProbeResult::Failed;
            }
        };

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
            Ok(pair) => pair,
            Err(e) => {
                debug!(error = %e, %uri, "health probe handshake failed");
                return ProbeResult::Failed;
            }
        };

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = match http::Request::builder()
            .method("GET")
            .uri(path)
            .header("host", address)
            .header("user-agent", "keeper-health/0.1")
            .body(http_body_util::Empty::<bytes::Bytes>::new())
        {
            Ok(req) => req,
            Err(e) => {
                debug!(error = %e, %uri, "health probe request invalid");
                return ProbeResult::Failed;
            }
        };

        match sender.send_request(req).await {
            Ok(resp) => {
                if resp.status().is_success() {
                    ProbeResult::Healthy
                } else {
                    debug!(status = %resp.status(), %uri, "health probe non-2xx");
                    ProbeResult::Unhealthy
                }
            }
            Err(e) => {
                debug!(error = %e, %uri, "health probe request failed");
                ProbeResult::Failed
            }
        }
    })
    .await;

    match result {
        Ok(probe) => probe,
        Err(_) => {
            debug!(%uri, "health probe timed out");
            ProbeResult::Failed
        }
    }
}

/// Perform a TCP health probe: healthy once the handshake completes.
pub async fn tcp_probe(address: &str, timeout: Duration) -> ProbeResult {
    match tokio::time::timeout(timeout, tokio::net::TcpStream::connect(address)).await {
        Ok(Ok(_stream)) => ProbeResult::Healthy,
        Ok(Err(e)) => {
            debug!(error = %e, %address, "tcp probe connection failed");
            ProbeResult::Failed
        }
        Err(_) => {
            debug!(%address, "tcp probe timed out");
            ProbeResult::Failed
        }
    }
}
