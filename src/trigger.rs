//! The skip-or-create triggering orchestrator
//!
//! One pass per external trigger: resolve the invoker, validate its
//! targets, and either record a skip event or upsert a BackupSession.
//! There is no partial creation — the session is written in full by a
//! single upsert call, or not at all.
//!
//! The collaborators sit behind traits so the sequencing can be tested
//! without a cluster; production implementations wrap the kube client.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::{Api, Client};
use tracing::{info, instrument};

#[cfg(test)]
use mockall::automock;

use crate::crd::{BackupSession, TargetRef};
use crate::events::SkipRecorder;
use crate::invoker::{resolve_invoker, Invoker, InvokerKind};
use crate::session::{apply_invoker, create_or_patch, seed_session, session_name};
use crate::workload::WorkloadClients;
use crate::Result;

/// Loads and normalizes invoker objects
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InvokerSource: Send + Sync {
    /// Resolve the invoker of the given kind into the common shape
    async fn resolve(&self, kind: InvokerKind, name: &str, namespace: &str) -> Result<Invoker>;
}

/// Validates that declared targets exist
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TargetLookup: Send + Sync {
    /// Return the first declared target that does not exist, scanning in
    /// declared order and stopping there
    async fn first_missing_target(&self, invoker: &Invoker) -> Result<Option<TargetRef>>;
}

/// Persists BackupSession records
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Idempotently create-or-patch the session named `name` for `invoker`.
    /// Returns the stored session and whether it was newly created.
    async fn upsert(&self, invoker: &Invoker, name: &str) -> Result<(BackupSession, bool)>;
}

/// Records skip events against invokers
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SkipSink: Send + Sync {
    /// Append one skip event on `subject` with the given message
    async fn record_skip(&self, subject: &ObjectReference, message: &str) -> Result<()>;
}

/// Result of one triggering pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// All targets exist; the session was written
    Created {
        /// Name of the stored session
        session_name: String,
        /// False when an overlapping invocation already created it
        newly_created: bool,
    },
    /// A target was missing; no session was written
    Skipped {
        /// The human-readable skip message, also recorded as an event
        message: String,
    },
}

/// Run one triggering pass for the invoker at `now_unix` seconds.
///
/// Sequencing: resolve, validate, then skip or create. The first missing
/// target short-circuits validation and drives the skip path; the skip
/// event names exactly that target. An event-write failure propagates as
/// an error, but the skip is already final — the session is never
/// created retroactively.
#[instrument(skip_all, fields(invoker_kind = %kind, invoker = %name, namespace = %namespace))]
pub async fn trigger_backup(
    invokers: &dyn InvokerSource,
    targets: &dyn TargetLookup,
    sessions: &dyn SessionStore,
    skips: &dyn SkipSink,
    kind: InvokerKind,
    name: &str,
    namespace: &str,
    now_unix: i64,
) -> Result<TriggerOutcome> {
    let invoker = invokers.resolve(kind, name, namespace).await?;

    if let Some(missing) = targets.first_missing_target(&invoker).await? {
        let message = skip_message(&missing);
        info!(kind = %missing.kind, target = %missing.name, "{message}");
        skips.record_skip(&invoker.object_ref, &message).await?;
        return Ok(TriggerOutcome::Skipped { message });
    }

    let session_name = session_name(name, now_unix);
    let (_, newly_created) = sessions.upsert(&invoker, &session_name).await?;
    info!(session = %session_name, newly_created, "BackupSession stored");

    Ok(TriggerOutcome::Created {
        session_name,
        newly_created,
    })
}

fn skip_message(missing: &TargetRef) -> String {
    format!(
        "Skipping creating BackupSession. Reason: Target workload {}/{} does not exist.",
        missing.kind.to_lowercase(),
        missing.name
    )
}

// =============================================================================
// Production implementations
// =============================================================================

/// Invoker source backed by the cluster read API
pub struct KubeInvokerSource {
    client: Client,
}

impl KubeInvokerSource {
    /// Wrap a kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InvokerSource for KubeInvokerSource {
    async fn resolve(&self, kind: InvokerKind, name: &str, namespace: &str) -> Result<Invoker> {
        resolve_invoker(&self.client, kind, name, namespace).await
    }
}

#[async_trait]
impl TargetLookup for WorkloadClients {
    async fn first_missing_target(&self, invoker: &Invoker) -> Result<Option<TargetRef>> {
        WorkloadClients::first_missing_target(self, invoker).await
    }
}

/// Session store backed by the cluster write API
pub struct KubeSessionStore {
    client: Client,
}

impl KubeSessionStore {
    /// Wrap a kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionStore for KubeSessionStore {
    async fn upsert(&self, invoker: &Invoker, name: &str) -> Result<(BackupSession, bool)> {
        let api: Api<BackupSession> = Api::namespaced(self.client.clone(), &invoker.namespace);
        create_or_patch(
            &api,
            &invoker.namespace,
            name,
            seed_session(name, &invoker.namespace),
            |session| apply_invoker(invoker, session),
        )
        .await
    }
}

#[async_trait]
impl SkipSink for SkipRecorder {
    async fn record_skip(&self, subject: &ObjectReference, message: &str) -> Result<()> {
        SkipRecorder::record_skip(self, subject, message).await
    }
}
