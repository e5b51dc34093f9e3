//! Error types for the backup trigger
//!
//! Every error here is fatal to the one-shot triggering process: there is
//! no local recovery or retry. The workflow is designed to be safely
//! re-invoked instead of being internally resilient.

use thiserror::Error;

/// Main error type for trigger operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Cluster client could not be constructed from the given credentials
    #[error("config error: {0}")]
    Config(String),

    /// The requested invoker kind is not in the known set
    #[error("unsupported invoker kind: {kind}")]
    UnsupportedInvokerKind {
        /// The kind string that failed to parse
        kind: String,
    },

    /// The invoker object does not exist
    #[error("invoker {kind} {namespace}/{name} not found")]
    InvokerNotFound {
        /// Invoker kind
        kind: String,
        /// Invoker name
        name: String,
        /// Invoker namespace
        namespace: String,
    },

    /// A target existence query failed (distinct from a target being absent)
    #[error("target check failed for {kind}/{name}: {message}")]
    TargetCheck {
        /// Target workload kind
        kind: String,
        /// Target workload name
        name: String,
        /// Underlying failure
        message: String,
    },

    /// Writing the BackupSession failed
    #[error("upsert failed for BackupSession {namespace}/{name}: {message}")]
    Upsert {
        /// Session name
        name: String,
        /// Session namespace
        namespace: String,
        /// Underlying failure
        message: String,
    },

    /// Recording the skip event failed. The skip decision itself is final.
    #[error("failed to record skip event: {0}")]
    EventWrite(String),
}

impl Error {
    /// Create a config error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unsupported-invoker-kind error
    pub fn unsupported_invoker_kind(kind: impl Into<String>) -> Self {
        Self::UnsupportedInvokerKind { kind: kind.into() }
    }

    /// Create a target-check error
    pub fn target_check(
        kind: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::TargetCheck {
            kind: kind.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an upsert error
    pub fn upsert(
        namespace: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Upsert {
            name: name.into(),
            namespace: namespace.into(),
            message: message.into(),
        }
    }
}
