//! BackupBatch Custom Resource Definition
//!
//! A BackupBatch declares several workloads that are backed up together
//! under one session. Each member carries its own optional target.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::TargetSpec;

/// One member of a batch
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupBatchMember {
    /// The workload this member backs up. Members without a target skip
    /// target validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetSpec>,
}

/// Specification for a BackupBatch
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "strata.dev",
    version = "v1beta1",
    kind = "BackupBatch",
    plural = "backupbatches",
    shortname = "bb",
    namespaced,
    printcolumn = r#"{"name":"Members","type":"integer","jsonPath":".spec.members.length"}"#,
    printcolumn = r#"{"name":"Schedule","type":"string","jsonPath":".spec.schedule"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BackupBatchSpec {
    /// Workloads backed up together, in declared order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<BackupBatchMember>,

    /// Cron schedule the external scheduler triggers sessions on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,

    /// Pause session triggering (honored by the scheduler, not the trigger)
    #[serde(default)]
    pub paused: bool,
}
