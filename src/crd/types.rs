//! Shared types used across the Strata CRDs

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a workload that an invoker declares it will back up
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TargetRef {
    /// API version of the referenced workload (e.g., "apps/v1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Workload kind (e.g., "Deployment", "StatefulSet")
    pub kind: String,

    /// Workload name
    pub name: String,

    /// Workload namespace. Falls back to the invoker's namespace when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl TargetRef {
    /// Create a reference with just kind and name
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            api_version: None,
            kind: kind.into(),
            name: name.into(),
            namespace: None,
        }
    }
}

/// A declared backup target
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetSpec {
    /// The workload this target points at
    #[serde(rename = "ref")]
    pub target_ref: TargetRef,

    /// Paths inside the workload's volumes to back up
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

/// Persisted pointer from a BackupSession back to the invoker that produced it
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BackupInvokerRef {
    /// API group of the invoker (always the Strata group)
    pub api_group: String,

    /// Invoker kind ("BackupConfiguration" or "BackupBatch")
    pub kind: String,

    /// Invoker name
    pub name: String,
}
