//! Session naming and the create-or-patch upsert
//!
//! Session names are `<invokerName>-<unixSeconds>`: deterministic for a
//! given invoker and second-granularity instant, so overlapping
//! invocations within the same second converge on the same object and
//! the upsert turns the second write into a patch or no-op instead of a
//! duplicate.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{Api, ObjectMeta, Patch, PatchParams, PostParams};

use crate::crd::{BackupInvokerRef, BackupSession};
use crate::invoker::Invoker;
use crate::{Error, Result, API_GROUP, LABEL_INVOKER_NAME, LABEL_INVOKER_TYPE};

/// Maximum length of a generated session name
pub const MAX_SESSION_NAME_LEN: usize = 63;

/// Current wall-clock time as unix seconds
pub fn unix_now() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64)
}

/// Derive the session name for an invoker at the given instant.
///
/// Format: `<invokerName>-<unixSeconds>`, sanitized to a valid object
/// name. The numeric suffix is always kept intact; the invoker-name
/// component is truncated from the front when the result would exceed
/// [`MAX_SESSION_NAME_LEN`].
pub fn session_name(invoker_name: &str, unix_seconds: i64) -> String {
    valid_name_with_suffix(invoker_name, &unix_seconds.to_string())
}

fn valid_name_with_suffix(name: &str, suffix: &str) -> String {
    // Lowercase and collapse anything outside [a-z0-9.-] to '-'. Multi-byte
    // characters all fall into the '-' arm, so the result is pure ASCII and
    // byte slicing below is safe.
    let sanitized: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();

    let budget = MAX_SESSION_NAME_LEN.saturating_sub(suffix.len() + 1);
    let kept = if sanitized.len() > budget {
        &sanitized[sanitized.len() - budget..]
    } else {
        sanitized.as_str()
    };
    // Truncation can leave a leading '-' or '.', which is not a valid
    // name start.
    let kept = kept.trim_start_matches(['-', '.']);

    if kept.is_empty() {
        suffix.to_string()
    } else {
        format!("{kept}-{suffix}")
    }
}

/// Merge `owner` into the object's owner references, keyed by uid.
///
/// Existing owners are preserved; the same owner is never added twice.
pub fn ensure_owner_reference(meta: &mut ObjectMeta, owner: &OwnerReference) {
    let owners = meta.owner_references.get_or_insert_with(Vec::new);
    if !owners.iter().any(|o| o.uid == owner.uid) {
        owners.push(owner.clone());
    }
}

/// The mutation applied to a session on every upsert for `invoker`.
///
/// Pure function of the session: wires the invoker's owner reference
/// (merge, not replace), the `spec.invoker` back-reference, and the
/// invoker's labels with the two reserved discovery keys taking
/// precedence over any same-named label.
pub fn apply_invoker(invoker: &Invoker, mut session: BackupSession) -> BackupSession {
    ensure_owner_reference(&mut session.metadata, &invoker.owner_ref);

    session.spec.invoker = BackupInvokerRef {
        api_group: API_GROUP.to_string(),
        kind: invoker.kind.to_string(),
        name: invoker.name.clone(),
    };

    let mut labels = invoker.labels.clone();
    labels.insert(LABEL_INVOKER_NAME.to_string(), invoker.name.clone());
    labels.insert(LABEL_INVOKER_TYPE.to_string(), invoker.kind.to_string());
    session.metadata.labels = Some(labels);

    session
}

/// Create-or-patch upsert: read current (or none), apply the pure
/// `mutate` function, write only if the result differs.
///
/// Guarantees at most one object per `(namespace, name)` and makes a
/// repeated call with identical inputs a no-op. Any underlying write
/// failure (including an optimistic-concurrency conflict) surfaces as
/// [`Error::Upsert`]; retry policy belongs to the caller.
pub async fn create_or_patch<K, F>(
    api: &Api<K>,
    namespace: &str,
    name: &str,
    seed: K,
    mutate: F,
) -> Result<(K, bool)>
where
    K: Clone + serde::Serialize + serde::de::DeserializeOwned + std::fmt::Debug,
    F: Fn(K) -> K,
{
    match api.get(name).await {
        Err(kube::Error::Api(e)) if e.code == 404 => {
            let desired = mutate(seed);
            let created = api
                .create(&PostParams::default(), &desired)
                .await
                .map_err(|e| Error::upsert(namespace, name, e.to_string()))?;
            Ok((created, true))
        }
        Ok(current) => {
            let desired = mutate(current.clone());
            if to_json(namespace, name, &current)? == to_json(namespace, name, &desired)? {
                return Ok((current, false));
            }
            let patched = api
                .patch(name, &PatchParams::default(), &Patch::Merge(&desired))
                .await
                .map_err(|e| Error::upsert(namespace, name, e.to_string()))?;
            Ok((patched, false))
        }
        Err(e) => Err(Error::upsert(namespace, name, e.to_string())),
    }
}

fn to_json<K: serde::Serialize>(
    namespace: &str,
    name: &str,
    obj: &K,
) -> Result<serde_json::Value> {
    serde_json::to_value(obj).map_err(|e| Error::upsert(namespace, name, e.to_string()))
}

/// Seed metadata for a session that does not exist yet
pub fn seed_session(name: &str, namespace: &str) -> BackupSession {
    BackupSession {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Default::default(),
        status: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::api::core::v1::ObjectReference;

    use super::*;
    use crate::invoker::InvokerKind;

    fn test_invoker(labels: BTreeMap<String, String>) -> Invoker {
        Invoker {
            kind: InvokerKind::BackupConfiguration,
            name: "nightly-backup".to_string(),
            namespace: "demo".to_string(),
            labels,
            owner_ref: OwnerReference {
                api_version: "strata.dev/v1beta1".to_string(),
                kind: "BackupConfiguration".to_string(),
                name: "nightly-backup".to_string(),
                uid: "uid-1".to_string(),
                controller: Some(true),
                block_owner_deletion: Some(false),
            },
            object_ref: ObjectReference::default(),
            targets: vec![],
        }
    }

    #[test]
    fn name_is_invoker_name_plus_timestamp() {
        assert_eq!(
            session_name("nightly-backup", 1700000000),
            "nightly-backup-1700000000"
        );
    }

    #[test]
    fn name_is_deterministic_within_a_second() {
        let a = session_name("nightly-backup", 1700000000);
        let b = session_name("nightly-backup", 1700000000);
        assert_eq!(a, b);
    }

    #[test]
    fn long_names_keep_the_full_suffix() {
        let long = "a".repeat(300);
        let name = session_name(&long, 1700000000);
        assert!(name.len() <= MAX_SESSION_NAME_LEN);
        assert!(name.ends_with("-1700000000"));
    }

    #[test]
    fn max_platform_length_name_stays_valid() {
        let long = "x".repeat(MAX_SESSION_NAME_LEN);
        let name = session_name(&long, 1700000000);
        assert!(name.len() <= MAX_SESSION_NAME_LEN);
        assert!(name.ends_with("-1700000000"));
        assert!(name.chars().next().unwrap().is_ascii_alphanumeric());
    }

    #[test]
    fn invalid_characters_are_sanitized() {
        let name = session_name("Nightly_Backup v2", 1700000000);
        assert_eq!(name, "nightly-backup-v2-1700000000");
    }

    #[test]
    fn truncation_trims_leading_punctuation() {
        // 56 chars with a 10-digit suffix leaves a 52-char budget, so the
        // cut lands inside the '-' run and the leading dashes must go.
        let long = format!("aa----{}", "b".repeat(50));
        let name = session_name(&long, 1700000000);
        assert_eq!(name, format!("{}-1700000000", "b".repeat(50)));
    }

    #[test]
    fn apply_invoker_sets_back_reference_and_labels() {
        let invoker = test_invoker(BTreeMap::from([(
            "team".to_string(),
            "payments".to_string(),
        )]));
        let session = apply_invoker(&invoker, seed_session("nightly-backup-1700000000", "demo"));

        assert_eq!(session.spec.invoker.api_group, "strata.dev");
        assert_eq!(session.spec.invoker.kind, "BackupConfiguration");
        assert_eq!(session.spec.invoker.name, "nightly-backup");

        let labels = session.metadata.labels.unwrap();
        assert_eq!(labels.get("team").map(String::as_str), Some("payments"));
        assert_eq!(
            labels.get(LABEL_INVOKER_NAME).map(String::as_str),
            Some("nightly-backup")
        );
        assert_eq!(
            labels.get(LABEL_INVOKER_TYPE).map(String::as_str),
            Some("BackupConfiguration")
        );
    }

    #[test]
    fn reserved_label_keys_win_on_conflict() {
        let invoker = test_invoker(BTreeMap::from([(
            LABEL_INVOKER_NAME.to_string(),
            "spoofed".to_string(),
        )]));
        let session = apply_invoker(&invoker, seed_session("nightly-backup-1700000000", "demo"));

        let labels = session.metadata.labels.unwrap();
        assert_eq!(
            labels.get(LABEL_INVOKER_NAME).map(String::as_str),
            Some("nightly-backup")
        );
    }

    #[test]
    fn owner_reference_merge_preserves_foreign_owners() {
        let invoker = test_invoker(BTreeMap::new());
        let mut session = seed_session("nightly-backup-1700000000", "demo");
        session.metadata.owner_references = Some(vec![OwnerReference {
            api_version: "batch/v1".to_string(),
            kind: "CronJob".to_string(),
            name: "scheduler".to_string(),
            uid: "uid-other".to_string(),
            ..Default::default()
        }]);

        let session = apply_invoker(&invoker, session);
        let owners = session.metadata.owner_references.unwrap();
        assert_eq!(owners.len(), 2);
        assert!(owners.iter().any(|o| o.uid == "uid-other"));
        assert!(owners.iter().any(|o| o.uid == "uid-1"));
    }

    #[test]
    fn apply_invoker_is_idempotent() {
        let invoker = test_invoker(BTreeMap::new());
        let once = apply_invoker(&invoker, seed_session("nightly-backup-1700000000", "demo"));
        let twice = apply_invoker(&invoker, once.clone());
        assert_eq!(
            serde_json::to_value(&once).unwrap(),
            serde_json::to_value(&twice).unwrap()
        );
    }
}
