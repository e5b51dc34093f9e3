//! Strata backup-session triggering
//!
//! A one-shot workflow invoked once per external trigger (typically a
//! CronJob): resolve a backup invoker, verify every workload it targets
//! still exists, and idempotently create a time-stamped BackupSession
//! for the execution agent to pick up. If any target is missing, no
//! session is created; a Kubernetes Event on the invoker records the
//! skip instead.
//!
//! # Modules
//!
//! - [`crd`] - Custom Resource Definitions (BackupConfiguration, BackupBatch, BackupSession)
//! - [`invoker`] - Invoker kinds and normalization into a common shape
//! - [`workload`] - Capability probe and target existence checks
//! - [`session`] - Session naming and the create-or-patch upsert
//! - [`events`] - Skip-event recording against the invoker
//! - [`trigger`] - The skip-or-create orchestrator
//! - [`error`] - Error types for the trigger

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod events;
pub mod invoker;
pub mod session;
pub mod trigger;
pub mod workload;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API group for all Strata CRDs
pub const API_GROUP: &str = "strata.dev";

/// API version served for the Strata CRDs
pub const API_VERSION: &str = "v1beta1";

// =============================================================================
// Label contract
// =============================================================================
// The two keys below are consumed by the session-discovery agent running in
// workload sidecars. Renaming either one breaks that consumer.

/// Label key carrying the invoker's name on created BackupSessions
pub const LABEL_INVOKER_NAME: &str = "strata.dev/invoker-name";

/// Label key carrying the invoker's kind on created BackupSessions
pub const LABEL_INVOKER_TYPE: &str = "strata.dev/invoker-type";

/// Field manager / reporting component for writes and events
pub const TRIGGER_COMPONENT: &str = "strata-backup-trigger";
