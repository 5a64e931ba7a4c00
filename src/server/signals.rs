// Signal handling for graceful server shutdown

use crate::error::{Result, VulnError};
use tokio::signal::unix::{signal, Signal as TokioSignal, SignalKind};

/// Signal handler for the shutdown signals the service honours
pub struct SignalHandler {
    sigterm: TokioSignal,
    sigint: TokioSignal,
    sighup: TokioSignal,
}

impl SignalHandler {
    /// Set up handlers for SIGTERM, SIGINT and SIGHUP
    pub fn new() -> Result<Self> {
        let sigterm = signal(SignalKind::terminate()).map_err(|e| VulnError::Io {
            source: e,
            context: "Failed to setup SIGTERM handler".to_string(),
        })?;
        let sigint = signal(SignalKind::interrupt()).map_err(|e| VulnError::Io {
            source: e,
            context: "Failed to setup SIGINT handler".to_string(),
        })?;
        let sighup = signal(SignalKind::hangup()).map_err(|e| VulnError::Io {
            source: e,
            context: "Failed to setup SIGHUP handler".to_string(),
        })?;

        Ok(Self {
            sigterm,
            sigint,
            sighup,
        })
    }

    /// Wait for any signal to be received
    /// Returns a string indicating which signal was received
    pub async fn wait(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "terminate",
            _ = self.sigint.recv() => "interrupt",
            _ = self.sighup.recv() => "hangup",
        }
    }

    /// Resolve once a shutdown signal arrives
    pub async fn shutdown(mut self) {
        let sig = self.wait().await;
        tracing::info!("Received {} signal, shutting down", sig);
    }
}
