//! Invoker kinds and normalization
//!
//! An invoker may be backed by more than one underlying resource kind.
//! Each kind has its own storage location and field layout; resolution
//! normalizes whichever kind was requested into the common [`Invoker`]
//! shape the rest of the workflow operates on. Adding a new invoker kind
//! means adding one enum variant and one resolver arm, not touching the
//! callers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ObjectMeta;
use kube::{Api, Client, Resource};

use crate::crd::{BackupBatch, BackupConfiguration, TargetRef};
use crate::{Error, Result, API_GROUP, API_VERSION};

/// The closed set of resource kinds that can act as a backup invoker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvokerKind {
    /// A single-target BackupConfiguration
    BackupConfiguration,
    /// A multi-target BackupBatch
    BackupBatch,
}

impl InvokerKind {
    /// The kind string as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BackupConfiguration => "BackupConfiguration",
            Self::BackupBatch => "BackupBatch",
        }
    }
}

impl fmt::Display for InvokerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvokerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BackupConfiguration" => Ok(Self::BackupConfiguration),
            "BackupBatch" => Ok(Self::BackupBatch),
            other => Err(Error::unsupported_invoker_kind(other)),
        }
    }
}

/// A declared backup target, normalized
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetInfo {
    /// The workload reference; entries without one are automatically
    /// satisfied during validation.
    pub target_ref: Option<TargetRef>,
}

/// Normalized view of a backup invoker
#[derive(Clone, Debug)]
pub struct Invoker {
    /// Which underlying resource kind produced this view
    pub kind: InvokerKind,
    /// Invoker name
    pub name: String,
    /// Invoker namespace
    pub namespace: String,
    /// Labels copied onto created sessions
    pub labels: BTreeMap<String, String>,
    /// Persisted owner link attached to created sessions for cascading deletion
    pub owner_ref: OwnerReference,
    /// Subject for audit events recorded against the invoker
    pub object_ref: ObjectReference,
    /// Declared targets, in declared order
    pub targets: Vec<TargetInfo>,
}

/// Resolve an invoker of the given kind into the common shape.
///
/// Pure read: fetches the invoker object fresh (never cached across
/// invocations) and normalizes it. A missing object is
/// [`Error::InvokerNotFound`].
pub async fn resolve_invoker(
    client: &Client,
    kind: InvokerKind,
    name: &str,
    namespace: &str,
) -> Result<Invoker> {
    match kind {
        InvokerKind::BackupConfiguration => {
            let api: Api<BackupConfiguration> = Api::namespaced(client.clone(), namespace);
            let bc = get_invoker_object(&api, kind, name, namespace).await?;
            let targets = vec![TargetInfo {
                target_ref: bc.spec.target.as_ref().map(|t| t.target_ref.clone()),
            }];
            Ok(normalize(kind, name, namespace, bc.meta(), targets))
        }
        InvokerKind::BackupBatch => {
            let api: Api<BackupBatch> = Api::namespaced(client.clone(), namespace);
            let bb = get_invoker_object(&api, kind, name, namespace).await?;
            let targets = bb
                .spec
                .members
                .iter()
                .map(|m| TargetInfo {
                    target_ref: m.target.as_ref().map(|t| t.target_ref.clone()),
                })
                .collect();
            Ok(normalize(kind, name, namespace, bb.meta(), targets))
        }
    }
}

async fn get_invoker_object<K>(
    api: &Api<K>,
    kind: InvokerKind,
    name: &str,
    namespace: &str,
) -> Result<K>
where
    K: Clone + serde::de::DeserializeOwned + std::fmt::Debug,
{
    match api.get(name).await {
        Ok(obj) => Ok(obj),
        Err(kube::Error::Api(e)) if e.code == 404 => Err(Error::InvokerNotFound {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: namespace.to_string(),
        }),
        Err(e) => Err(Error::Kube(e)),
    }
}

fn normalize(
    kind: InvokerKind,
    name: &str,
    namespace: &str,
    meta: &ObjectMeta,
    targets: Vec<TargetInfo>,
) -> Invoker {
    let api_version = format!("{}/{}", API_GROUP, API_VERSION);
    let uid = meta.uid.clone().unwrap_or_default();

    Invoker {
        kind,
        name: name.to_string(),
        namespace: namespace.to_string(),
        labels: meta.labels.clone().unwrap_or_default(),
        owner_ref: OwnerReference {
            api_version: api_version.clone(),
            kind: kind.to_string(),
            name: name.to_string(),
            uid: uid.clone(),
            controller: Some(true),
            block_owner_deletion: Some(false),
        },
        object_ref: ObjectReference {
            api_version: Some(api_version),
            kind: Some(kind.to_string()),
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(uid),
            ..Default::default()
        },
        targets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in [InvokerKind::BackupConfiguration, InvokerKind::BackupBatch] {
            assert_eq!(kind.as_str().parse::<InvokerKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        let err = "RestoreSession".parse::<InvokerKind>().unwrap_err();
        match err {
            Error::UnsupportedInvokerKind { kind } => assert_eq!(kind, "RestoreSession"),
            other => panic!("expected UnsupportedInvokerKind, got {other:?}"),
        }
    }

    #[test]
    fn kind_matching_is_case_sensitive() {
        // The wire format uses exact kind strings; lowercase variants are
        // rejected rather than silently normalized.
        assert!("backupconfiguration".parse::<InvokerKind>().is_err());
    }

    #[test]
    fn normalize_builds_owner_and_subject_from_metadata() {
        let meta = ObjectMeta {
            name: Some("nightly".to_string()),
            namespace: Some("demo".to_string()),
            uid: Some("uid-123".to_string()),
            labels: Some(BTreeMap::from([(
                "team".to_string(),
                "payments".to_string(),
            )])),
            ..Default::default()
        };

        let invoker = normalize(
            InvokerKind::BackupConfiguration,
            "nightly",
            "demo",
            &meta,
            vec![],
        );

        assert_eq!(invoker.owner_ref.kind, "BackupConfiguration");
        assert_eq!(invoker.owner_ref.name, "nightly");
        assert_eq!(invoker.owner_ref.uid, "uid-123");
        assert_eq!(invoker.owner_ref.controller, Some(true));
        assert_eq!(invoker.owner_ref.api_version, "strata.dev/v1beta1");

        assert_eq!(invoker.object_ref.namespace.as_deref(), Some("demo"));
        assert_eq!(invoker.object_ref.uid.as_deref(), Some("uid-123"));
        assert_eq!(invoker.labels.get("team").map(String::as_str), Some("payments"));
    }
}
