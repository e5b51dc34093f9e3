//! BackupSession Custom Resource Definition
//!
//! A BackupSession signals "a backup run should happen now". The trigger
//! creates it; the execution agent discovers it via the
//! `strata.dev/invoker-name` / `strata.dev/invoker-type` labels, processes
//! it, and owns the status sub-resource. Sessions carry an owner reference
//! to their invoker so deleting the invoker garbage-collects its sessions.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::BackupInvokerRef;

/// Phase of a BackupSession, written by the execution agent
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum SessionPhase {
    /// Session created, not yet picked up
    #[default]
    Pending,
    /// Backup run in progress
    Running,
    /// Backup run completed successfully
    Succeeded,
    /// Backup run failed
    Failed,
}

/// Status of a BackupSession
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupSessionStatus {
    /// Current phase
    #[serde(default)]
    pub phase: SessionPhase,
}

/// Specification for a BackupSession
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "strata.dev",
    version = "v1beta1",
    kind = "BackupSession",
    plural = "backupsessions",
    shortname = "bs",
    namespaced,
    status = "BackupSessionStatus",
    printcolumn = r#"{"name":"Invoker-Type","type":"string","jsonPath":".spec.invoker.kind"}"#,
    printcolumn = r#"{"name":"Invoker-Name","type":"string","jsonPath":".spec.invoker.name"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BackupSessionSpec {
    /// The invoker this session was triggered for
    #[serde(default)]
    pub invoker: BackupInvokerRef,
}
