use thiserror::Error;

/// Domain errors. They travel inside `eyre::Report` and can be recovered with
/// `downcast_ref` where a caller needs to branch on the kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MnemonicToolError {
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("invalid derivation path template `{template}`: {reason}")]
    PathTemplate { template: String, reason: String },

    #[error("{coin} derivation failed for path {path}: {reason}")]
    ChainDerivation {
        coin: &'static str,
        path: String,
        reason: String,
    },

    #[error("conflicting parameters: {0}")]
    ParameterConflict(String),

    #[error(
        "network connectivity detected; refusing to handle secrets on an online host.\n\
         Disconnect all network interfaces (air-gap this machine) and retry, or pass \
         --allow-internet-risk if you accept the risk."
    )]
    NetworkNotIsolated,

    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl MnemonicToolError {
    pub fn path_template(template: &str, reason: impl Into<String>) -> Self {
        Self::PathTemplate {
            template: template.to_owned(),
            reason: reason.into(),
        }
    }

    pub fn chain(coin: &'static str, path: impl ToString, reason: impl Into<String>) -> Self {
        Self::ChainDerivation {
            coin,
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, used in JSON output and logs.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidMnemonic(_) => "invalid_mnemonic",
            Self::PathTemplate { .. } => "path_template",
            Self::ChainDerivation { .. } => "chain_derivation",
            Self::ParameterConflict(_) => "parameter_conflict",
            Self::NetworkNotIsolated => "network_not_isolated",
            Self::Persistence(_) => "persistence",
        }
    }
}

/// Find the domain error inside a report, if there is one.
pub fn domain_error(report: &eyre::Report) -> Option<&MnemonicToolError> {
    report
        .chain()
        .find_map(|e| e.downcast_ref::<MnemonicToolError>())
}
