//! Air-gap check run before any command handles secrets.

use crate::{config::NetworkConfig, errors::MnemonicToolError};
use std::{future::Future, time::Duration};
use tokio::{net::TcpStream, task::JoinSet};

pub trait ConnectivityProbe {
    /// True when the host can reach the outside world.
    fn is_online(&self) -> impl Future<Output = bool> + Send;
}

/// Opens TCP connections to well-known public endpoints; any success means online.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    targets: Vec<String>,
    timeout: Duration,
}

impl TcpProbe {
    pub const fn new(targets: Vec<String>, timeout: Duration) -> Self {
        Self { targets, timeout }
    }

    pub fn from_config(cfg: &NetworkConfig) -> Self {
        Self::new(
            cfg.probe_targets.clone(),
            Duration::from_millis(cfg.probe_timeout_ms),
        )
    }
}

impl ConnectivityProbe for TcpProbe {
    async fn is_online(&self) -> bool {
        let mut set = JoinSet::new();
        for target in &self.targets {
            let target = target.clone();
            let timeout = self.timeout;
            set.spawn(async move {
                let reached = matches!(
                    tokio::time::timeout(timeout, TcpStream::connect(target.as_str())).await,
                    Ok(Ok(_))
                );
                (target, reached)
            });
        }
        while let Some(res) = set.join_next().await {
            if let Ok((target, true)) = res {
                tracing::debug!(%target, "connectivity probe reached target");
                set.abort_all();
                return true;
            }
        }
        false
    }
}

/// Refuse to continue on an online host unless the operator explicitly accepted the risk.
pub async fn check_network_security(
    probe: &impl ConnectivityProbe,
    allow_override: bool,
) -> Result<(), MnemonicToolError> {
    if allow_override {
        tracing::warn!("network isolation check skipped (--allow-internet-risk)");
        return Ok(());
    }
    if probe.is_online().await {
        tracing::error!("network connectivity detected");
        return Err(MnemonicToolError::NetworkNotIsolated);
    }
    tracing::info!("no network connectivity detected");
    Ok(())
}
