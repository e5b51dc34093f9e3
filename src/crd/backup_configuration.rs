//! BackupConfiguration Custom Resource Definition
//!
//! A BackupConfiguration declares a single workload target along with the
//! schedule an external scheduler uses to trigger sessions. The trigger
//! itself only reads the target; schedule and pause handling belong to the
//! scheduler.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::TargetSpec;

/// Specification for a BackupConfiguration
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "strata.dev",
    version = "v1beta1",
    kind = "BackupConfiguration",
    plural = "backupconfigurations",
    shortname = "bc",
    namespaced,
    printcolumn = r#"{"name":"Schedule","type":"string","jsonPath":".spec.schedule"}"#,
    printcolumn = r#"{"name":"Paused","type":"boolean","jsonPath":".spec.paused"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfigurationSpec {
    /// The workload to back up. A configuration without a target backs up
    /// cluster-external data and skips target validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetSpec>,

    /// Cron schedule the external scheduler triggers sessions on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,

    /// Pause session triggering (honored by the scheduler, not the trigger)
    #[serde(default)]
    pub paused: bool,
}
