// # acme-dns-mockd - Simulated Provider Daemon
//
// Runs the simulated provider (HTTP API + DNS) as a standalone process, for
// exercising a webhook deployment without touching the real provider.
//
// This is a thin integration layer: all protocol behaviour lives in
// acme-dns-mock. The daemon only:
//
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Starts both listeners
// 4. Stops them on SIGTERM / SIGINT
//
// ## Configuration
//
// - `MOCK_LOGIN`: Login clients must present (required)
// - `MOCK_PASSWD`: Password clients must present (required)
// - `MOCK_HTTP_ADDR`: HTTP listen address (default `127.0.0.1:8080`)
// - `MOCK_DNS_ADDR`: DNS listen address (default `127.0.0.1:59351`)
// - `MOCK_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
//
// ## Example
//
// ```bash
// export MOCK_LOGIN=testl
// export MOCK_PASSWD=testp
// export MOCK_DNS_ADDR=0.0.0.0:5353
//
// acme-dns-mockd
// ```

use acme_dns_mock::config::{DEFAULT_DNS_ADDR, DEFAULT_HTTP_ADDR};
use acme_dns_mock::{MockConfig, MockProvider};
use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long in-flight HTTP requests may take to finish on shutdown
const HTTP_DRAIN_DEADLINE: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum MockdExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<MockdExitCode> for ExitCode {
    fn from(code: MockdExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
struct Config {
    mock: MockConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let login = env::var("MOCK_LOGIN").context("MOCK_LOGIN is required")?;
        let passwd = env::var("MOCK_PASSWD").context("MOCK_PASSWD is required")?;

        let mut mock = MockConfig::new(login, passwd);
        mock.http_addr = parse_addr("MOCK_HTTP_ADDR", DEFAULT_HTTP_ADDR)?;
        mock.dns_addr = parse_addr("MOCK_DNS_ADDR", DEFAULT_DNS_ADDR)?;

        Ok(Self {
            mock,
            log_level: env::var("MOCK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.mock.validate()?;
        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "MOCK_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn parse_addr(var: &str, default: &str) -> Result<SocketAddr> {
    let value = env::var(var).unwrap_or_else(|_| default.to_string());
    value
        .parse()
        .with_context(|| format!("{var} is not a socket address: {value}"))
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return MockdExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return MockdExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return MockdExitCode::ConfigError.into();
    }

    info!(config = ?config.mock, "Starting acme-dns-mockd");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return MockdExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => MockdExitCode::CleanShutdown,
            Err(DaemonError::Startup(e)) => {
                error!("Startup error: {:#}", e);
                MockdExitCode::ConfigError
            }
            Err(DaemonError::Runtime(e)) => {
                error!("Daemon error: {:#}", e);
                MockdExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Failures of a daemon run, split by exit code
enum DaemonError {
    Startup(anyhow::Error),
    Runtime(anyhow::Error),
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(config: Config) -> std::result::Result<(), DaemonError> {
    let provider = MockProvider::from_config(&config.mock)
        .map_err(|e| DaemonError::Startup(e.into()))?;

    let http_addr = provider
        .start_http(config.mock.http_addr)
        .await
        .map_err(|e| DaemonError::Startup(e.into()))?;

    let dns_addr = match provider.start_dns(config.mock.dns_addr).await {
        Ok(addr) => addr,
        Err(e) => {
            let _ = provider.stop_http(HTTP_DRAIN_DEADLINE).await;
            return Err(DaemonError::Startup(e.into()));
        }
    };

    info!(%http_addr, %dns_addr, "Simulated provider ready");

    let signal = wait_for_shutdown().await.map_err(DaemonError::Runtime)?;
    info!("Received shutdown signal: {}", signal);

    let http_result = provider.stop_http(HTTP_DRAIN_DEADLINE).await;
    let dns_result = provider.stop_dns().await;

    http_result.map_err(|e| DaemonError::Runtime(e.into()))?;
    dns_result.map_err(|e| DaemonError::Runtime(e.into()))?;

    info!("Shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
