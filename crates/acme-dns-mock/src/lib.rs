// # acme-dns-mock
//
// A simulated provider for exercising the API client and the challenge
// solver without a live network dependency.
//
// ## Surfaces
//
// - **HTTP** ([`http`]): the provider's `getData` / `changeRecords` API
// - **DNS** ([`dns`]): a read-only UDP responder over the same records
//
// Both surfaces share one [`RecordStore`], so a record written over HTTP is
// visible to the next DNS query.
//
// ## Lifecycle
//
// The two listeners start and stop independently. Starting a running
// listener, or stopping one that is not running, is an error. HTTP shutdown
// drains in-flight requests within a caller-supplied deadline; DNS shutdown
// cancels in-flight replies and closes the socket.

pub mod config;
pub mod dns;
pub mod http;

pub use config::MockConfig;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use acme_dns_core::{Credentials, Error, MemoryRecordStore, RecordStore, Result};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long a stopping DNS listener may take to release its socket
const DNS_STOP_GRACE: Duration = Duration::from_secs(1);

/// A running listener
struct Listener {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Simulated DNS provider
pub struct MockProvider {
    credentials: Arc<Credentials>,
    store: Arc<dyn RecordStore>,
    http: Mutex<Option<Listener>>,
    dns: Mutex<Option<Listener>>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl MockProvider {
    /// Create a provider accepting `login` / `passwd`, backed by an empty memory store
    pub fn new(login: impl Into<String>, passwd: impl Into<String>) -> Self {
        Self::with_store(
            Credentials::new(login, passwd),
            Arc::new(MemoryRecordStore::new()),
        )
    }

    /// Create a provider from its configuration
    pub fn from_config(config: &MockConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_store(
            config.credentials(),
            Arc::new(MemoryRecordStore::new()),
        ))
    }

    /// Create a provider over an existing store
    pub fn with_store(credentials: Credentials, store: Arc<dyn RecordStore>) -> Self {
        Self {
            credentials: Arc::new(credentials),
            store,
            http: Mutex::new(None),
            dns: Mutex::new(None),
        }
    }

    /// The store both surfaces read and write
    pub fn store(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.store)
    }

    /// Bind the HTTP surface to `addr` and start serving
    ///
    /// Returns the bound address, so port `0` can be used.
    pub async fn start_http(&self, addr: SocketAddr) -> Result<SocketAddr> {
        let mut slot = self.http.lock().await;
        if let Some(running) = slot.as_ref() {
            return Err(Error::server(format!(
                "HTTP server is already running on {}",
                running.addr
            )));
        }

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::server(format!("failed to bind HTTP listener on {addr}: {e}")))?;
        let local_addr = listener.local_addr()?;

        let router = http::router(http::AppState {
            credentials: Arc::clone(&self.credentials),
            store: Arc::clone(&self.store),
        });

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await;

            if let Err(e) = result {
                error!("HTTP server failed: {}", e);
            }
        });

        info!(addr = %local_addr, "HTTP server started");

        *slot = Some(Listener {
            addr: local_addr,
            shutdown,
            task,
        });
        Ok(local_addr)
    }

    /// Stop the HTTP surface, waiting at most `deadline` for in-flight requests
    ///
    /// A drain that overruns the deadline aborts the server and is reported
    /// as an error.
    pub async fn stop_http(&self, deadline: Duration) -> Result<()> {
        let Listener {
            addr,
            shutdown,
            mut task,
        } = self
            .http
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::server("HTTP server is not running"))?;

        let _ = shutdown.send(());

        match tokio::time::timeout(deadline, &mut task).await {
            Ok(Ok(())) => {
                info!(%addr, "HTTP server stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(Error::server(format!("HTTP server task failed: {e}"))),
            Err(_) => {
                task.abort();
                Err(Error::server(format!(
                    "HTTP server on {addr} did not drain within {deadline:?}"
                )))
            }
        }
    }

    /// Bind the DNS surface to `addr` and start serving
    ///
    /// Returns the bound address, so port `0` can be used.
    pub async fn start_dns(&self, addr: SocketAddr) -> Result<SocketAddr> {
        let mut slot = self.dns.lock().await;
        if let Some(running) = slot.as_ref() {
            return Err(Error::server(format!(
                "DNS server is already running on {}",
                running.addr
            )));
        }

        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| Error::server(format!("failed to bind DNS socket on {addr}: {e}")))?;
        let local_addr = socket.local_addr()?;

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(dns::serve(socket, Arc::clone(&self.store), signal));

        info!(addr = %local_addr, "DNS server started");

        *slot = Some(Listener {
            addr: local_addr,
            shutdown,
            task,
        });
        Ok(local_addr)
    }

    /// Stop the DNS surface immediately
    ///
    /// In-flight replies are cancelled and the socket is closed before this
    /// returns, so the address can be bound again right away.
    pub async fn stop_dns(&self) -> Result<()> {
        let Listener {
            addr,
            shutdown,
            mut task,
        } = self
            .dns
            .lock()
            .await
            .take()
            .ok_or_else(|| Error::server("DNS server is not running"))?;

        let _ = shutdown.send(());

        // The listener returns once its reply tasks are gone, closing the socket
        if tokio::time::timeout(DNS_STOP_GRACE, &mut task).await.is_err() {
            warn!(%addr, "DNS listener did not stop in time, aborting");
            task.abort();
            let _ = task.await;
        }

        info!(%addr, "DNS server stopped");
        Ok(())
    }

    /// Address of the running HTTP surface
    pub async fn http_addr(&self) -> Option<SocketAddr> {
        self.http.lock().await.as_ref().map(|l| l.addr)
    }

    /// Address of the running DNS surface
    pub async fn dns_addr(&self) -> Option<SocketAddr> {
        self.dns.lock().await.as_ref().map(|l| l.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_port() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[tokio::test]
    async fn test_http_lifecycle() {
        let provider = MockProvider::new("l", "p");

        let addr = provider.start_http(any_port()).await.unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(provider.http_addr().await, Some(addr));

        assert!(matches!(
            provider.start_http(any_port()).await,
            Err(Error::Server(_))
        ));

        provider.stop_http(Duration::from_secs(5)).await.unwrap();
        assert_eq!(provider.http_addr().await, None);
        assert!(provider.stop_http(Duration::from_secs(5)).await.is_err());
    }

    #[tokio::test]
    async fn test_dns_lifecycle() {
        let provider = MockProvider::new("l", "p");

        assert!(provider.stop_dns().await.is_err());

        let addr = provider.start_dns(any_port()).await.unwrap();
        assert!(provider.start_dns(any_port()).await.is_err());

        provider.stop_dns().await.unwrap();
        assert_eq!(provider.dns_addr().await, None);

        // Restart on the same port once the socket is released
        let again = provider.start_dns(addr).await.unwrap();
        assert_eq!(again, addr);
        provider.stop_dns().await.unwrap();
    }

    #[tokio::test]
    async fn test_dns_stop_releases_socket_with_queries_in_flight() {
        let provider = MockProvider::new("l", "p");
        let addr = provider.start_dns(any_port()).await.unwrap();

        let client = UdpSocket::bind(any_port()).await.unwrap();
        for _ in 0..16 {
            client.send_to(b"not dns", addr).await.unwrap();
        }

        provider.stop_dns().await.unwrap();

        // Nothing else holds the port, so a plain bind succeeds
        let rebound = UdpSocket::bind(addr).await.unwrap();
        assert_eq!(rebound.local_addr().unwrap(), addr);
    }

    #[test]
    fn test_from_config_validates() {
        assert!(MockProvider::from_config(&MockConfig::new("", "p")).is_err());
        assert!(MockProvider::from_config(&MockConfig::new("l", "p")).is_ok());
    }
}
