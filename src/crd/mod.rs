//! Custom Resource Definitions for the Strata backup platform
//!
//! Three CRDs participate in triggering:
//!
//! - [`BackupConfiguration`] - declares a single backup target (invoker kind 1)
//! - [`BackupBatch`] - declares several targets backed up together (invoker kind 2)
//! - [`BackupSession`] - the time-stamped record a trigger creates and the
//!   execution agent consumes

mod backup_batch;
mod backup_configuration;
mod backup_session;
mod types;

pub use backup_batch::{BackupBatch, BackupBatchMember, BackupBatchSpec};
pub use backup_configuration::{BackupConfiguration, BackupConfigurationSpec};
pub use backup_session::{BackupSession, BackupSessionSpec, BackupSessionStatus, SessionPhase};
pub use types::{BackupInvokerRef, TargetRef, TargetSpec};
