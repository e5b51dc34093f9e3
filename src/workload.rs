//! Target existence checks and the platform capability probe
//!
//! Standard workload kinds are always queried through their typed APIs.
//! OpenShift's DeploymentConfig only exists on some distributions, so it
//! is probed once via API discovery at process start; when the probe finds
//! nothing, that workload family is treated as never existing.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, ReplicationController};
use kube::api::{Api, DynamicObject};
use kube::discovery::{ApiResource, Discovery};
use kube::Client;
use tracing::{debug, info, warn};

use crate::crd::TargetRef;
use crate::invoker::Invoker;
use crate::{Error, Result};

/// API group for OpenShift workload resources
pub const OPENSHIFT_APPS_GROUP: &str = "apps.openshift.io";

/// Kind string for the OpenShift DeploymentConfig workload
pub const KIND_DEPLOYMENT_CONFIG: &str = "DeploymentConfig";

/// Probe the cluster for OpenShift DeploymentConfig support.
///
/// One discovery pass; the result is held for the process lifetime.
/// `Ok(None)` means the cluster does not serve the kind, which is not an
/// error — the OpenShift family simply never exists there.
pub async fn discover_deployment_config(client: &Client) -> Result<Option<ApiResource>> {
    let discovery = Discovery::new(client.clone())
        .filter(&[OPENSHIFT_APPS_GROUP])
        .run()
        .await?;

    for group in discovery.groups() {
        if group.name() != OPENSHIFT_APPS_GROUP {
            continue;
        }
        for (ar, _caps) in group.resources_by_stability() {
            if ar.kind == KIND_DEPLOYMENT_CONFIG {
                info!(api_version = %ar.api_version, "cluster serves DeploymentConfig");
                return Ok(Some(ar));
            }
        }
    }

    debug!(group = OPENSHIFT_APPS_GROUP, "DeploymentConfig not served, skipping OpenShift kinds");
    Ok(None)
}

/// Answers "does this referenced workload currently exist?"
#[async_trait]
pub trait TargetExistence: Send + Sync {
    /// Check whether the referenced workload exists. `fallback_namespace`
    /// is used when the reference does not carry its own namespace.
    async fn target_exists(&self, target: &TargetRef, fallback_namespace: &str) -> Result<bool>;
}

/// Scan declared targets in declared order, returning the first one that
/// does not exist. Evaluation stops there; later targets are not queried.
/// Entries without a reference are automatically satisfied.
pub async fn first_missing_target(
    checker: &dyn TargetExistence,
    invoker: &Invoker,
) -> Result<Option<TargetRef>> {
    for target_info in &invoker.targets {
        let Some(target) = &target_info.target_ref else {
            continue;
        };
        if !checker.target_exists(target, &invoker.namespace).await? {
            return Ok(Some(target.clone()));
        }
    }
    Ok(None)
}

/// Clients for checking whether declared backup targets exist
pub struct WorkloadClients {
    client: Client,
    /// Discovered DeploymentConfig resource, present only on OpenShift
    deployment_config: Option<ApiResource>,
}

impl WorkloadClients {
    /// Create workload clients. `deployment_config` comes from
    /// [`discover_deployment_config`].
    pub fn new(client: Client, deployment_config: Option<ApiResource>) -> Self {
        Self {
            client,
            deployment_config,
        }
    }

    /// Convenience wrapper over [`first_missing_target`] using this checker
    pub async fn first_missing_target(&self, invoker: &Invoker) -> Result<Option<TargetRef>> {
        first_missing_target(self, invoker).await
    }

    async fn typed_exists<K>(
        &self,
        name: &str,
        namespace: &str,
    ) -> std::result::Result<bool, kube::Error>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>
            + Clone
            + serde::de::DeserializeOwned
            + std::fmt::Debug,
        <K as kube::Resource>::DynamicType: Default,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn dynamic_exists(
        &self,
        ar: &ApiResource,
        name: &str,
        namespace: &str,
    ) -> std::result::Result<bool, kube::Error> {
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, ar);
        match api.get(name).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// The namespace a reference is checked in: its own, or the invoker's
fn effective_namespace<'a>(target: &'a TargetRef, fallback: &'a str) -> &'a str {
    target.namespace.as_deref().unwrap_or(fallback)
}

/// Whether a kind can be queried at all on this cluster. Kinds outside
/// the known set, and gated kinds the probe did not find, are never
/// queried and count as absent.
fn kind_is_served(kind: &str, deployment_config: Option<&ApiResource>) -> bool {
    match kind {
        "Deployment" | "StatefulSet" | "DaemonSet" | "ReplicaSet" | "ReplicationController"
        | "PersistentVolumeClaim" => true,
        KIND_DEPLOYMENT_CONFIG => deployment_config.is_some(),
        _ => false,
    }
}

#[async_trait]
impl TargetExistence for WorkloadClients {
    /// Dispatch on the referenced kind. An unrecognized kind is reported
    /// as absent rather than an error; that keeps the skip path uniform
    /// at the cost of conflating "unknown kind" with "known kind, missing
    /// object". A non-404 query failure is a [`Error::TargetCheck`], not
    /// a skip.
    async fn target_exists(&self, target: &TargetRef, fallback_namespace: &str) -> Result<bool> {
        let namespace = effective_namespace(target, fallback_namespace);

        if !kind_is_served(&target.kind, self.deployment_config.as_ref()) {
            warn!(kind = %target.kind, name = %target.name, "target kind not served, treating as absent");
            return Ok(false);
        }

        let found = match target.kind.as_str() {
            "Deployment" => self.typed_exists::<Deployment>(&target.name, namespace).await,
            "StatefulSet" => self.typed_exists::<StatefulSet>(&target.name, namespace).await,
            "DaemonSet" => self.typed_exists::<DaemonSet>(&target.name, namespace).await,
            "ReplicaSet" => self.typed_exists::<ReplicaSet>(&target.name, namespace).await,
            "ReplicationController" => {
                self.typed_exists::<ReplicationController>(&target.name, namespace)
                    .await
            }
            "PersistentVolumeClaim" => {
                self.typed_exists::<PersistentVolumeClaim>(&target.name, namespace)
                    .await
            }
            KIND_DEPLOYMENT_CONFIG => match &self.deployment_config {
                Some(ar) => self.dynamic_exists(ar, &target.name, namespace).await,
                None => Ok(false),
            },
            // Unreachable: kind_is_served filtered everything else.
            _ => Ok(false),
        };

        found.map_err(|e| Error::target_check(&target.kind, &target.name, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use k8s_openapi::api::core::v1::ObjectReference;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

    use super::*;
    use crate::invoker::{InvokerKind, TargetInfo};

    /// Existence checker over a fixed set, recording every query it sees
    struct FixedChecker {
        existing: Vec<(String, String)>,
        queried: Mutex<Vec<String>>,
    }

    impl FixedChecker {
        fn new(existing: &[(&str, &str)]) -> Self {
            Self {
                existing: existing
                    .iter()
                    .map(|(k, n)| (k.to_string(), n.to_string()))
                    .collect(),
                queried: Mutex::new(Vec::new()),
            }
        }

        fn queried(&self) -> Vec<String> {
            self.queried.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TargetExistence for FixedChecker {
        async fn target_exists(&self, target: &TargetRef, _ns: &str) -> Result<bool> {
            self.queried.lock().unwrap().push(target.name.clone());
            Ok(self
                .existing
                .iter()
                .any(|(k, n)| *k == target.kind && *n == target.name))
        }
    }

    fn invoker(targets: Vec<TargetInfo>) -> Invoker {
        Invoker {
            kind: InvokerKind::BackupBatch,
            name: "batch".to_string(),
            namespace: "demo".to_string(),
            labels: BTreeMap::new(),
            owner_ref: OwnerReference::default(),
            object_ref: ObjectReference::default(),
            targets,
        }
    }

    fn declared(kind: &str, name: &str) -> TargetInfo {
        TargetInfo {
            target_ref: Some(TargetRef::new(kind, name)),
        }
    }

    #[tokio::test]
    async fn all_present_yields_none() {
        let checker = FixedChecker::new(&[("Deployment", "web"), ("StatefulSet", "db")]);
        let inv = invoker(vec![declared("Deployment", "web"), declared("StatefulSet", "db")]);
        assert_eq!(first_missing_target(&checker, &inv).await.unwrap(), None);
        assert_eq!(checker.queried(), vec!["web", "db"]);
    }

    #[tokio::test]
    async fn scan_short_circuits_on_first_missing() {
        // Both targets are missing; the scan must report the first and
        // never query the second.
        let checker = FixedChecker::new(&[]);
        let inv = invoker(vec![declared("Deployment", "web"), declared("StatefulSet", "db")]);

        let missing = first_missing_target(&checker, &inv).await.unwrap().unwrap();
        assert_eq!(missing.kind, "Deployment");
        assert_eq!(missing.name, "web");
        assert_eq!(checker.queried(), vec!["web"]);
    }

    #[tokio::test]
    async fn entries_without_a_ref_are_satisfied() {
        let checker = FixedChecker::new(&[("Deployment", "web")]);
        let inv = invoker(vec![
            TargetInfo { target_ref: None },
            declared("Deployment", "web"),
        ]);
        assert_eq!(first_missing_target(&checker, &inv).await.unwrap(), None);
        // The null-ref entry never reaches the checker.
        assert_eq!(checker.queried(), vec!["web"]);
    }

    #[tokio::test]
    async fn empty_targets_are_trivially_satisfied() {
        let checker = FixedChecker::new(&[]);
        let inv = invoker(vec![]);
        assert_eq!(first_missing_target(&checker, &inv).await.unwrap(), None);
        assert!(checker.queried().is_empty());
    }

    /// Checker that fails every query, standing in for a broken API server
    struct FailingChecker;

    #[async_trait]
    impl TargetExistence for FailingChecker {
        async fn target_exists(&self, target: &TargetRef, _ns: &str) -> Result<bool> {
            Err(Error::target_check(
                &target.kind,
                &target.name,
                "connection refused",
            ))
        }
    }

    #[test]
    fn reference_namespace_overrides_the_fallback() {
        let mut target = TargetRef::new("Deployment", "web");
        assert_eq!(effective_namespace(&target, "demo"), "demo");

        target.namespace = Some("other".to_string());
        assert_eq!(effective_namespace(&target, "demo"), "other");
    }

    #[test]
    fn standard_kinds_are_always_served() {
        for kind in [
            "Deployment",
            "StatefulSet",
            "DaemonSet",
            "ReplicaSet",
            "ReplicationController",
            "PersistentVolumeClaim",
        ] {
            assert!(kind_is_served(kind, None), "{kind} should be served");
        }
    }

    #[test]
    fn unrecognized_kinds_are_never_served() {
        assert!(!kind_is_served("CronJob", None));
        assert!(!kind_is_served("deployment", None));
    }

    #[test]
    fn deployment_config_is_gated_on_the_probe() {
        use kube::api::GroupVersionKind;

        assert!(!kind_is_served(KIND_DEPLOYMENT_CONFIG, None));

        let ar = ApiResource::from_gvk(&GroupVersionKind::gvk(
            OPENSHIFT_APPS_GROUP,
            "v1",
            KIND_DEPLOYMENT_CONFIG,
        ));
        assert!(kind_is_served(KIND_DEPLOYMENT_CONFIG, Some(&ar)));
    }

    #[tokio::test]
    async fn query_failure_propagates_instead_of_skipping() {
        let inv = invoker(vec![declared("Deployment", "web")]);
        let err = first_missing_target(&FailingChecker, &inv)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TargetCheck { .. }));
    }
}
