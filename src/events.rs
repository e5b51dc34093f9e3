//! Kubernetes Event recording for skipped triggers
//!
//! When triggering is skipped because a target is missing, the trigger
//! appends one Event against the invoker so the skip shows up in
//! `kubectl describe`. Events are append-only and never deduplicated.
//! Unlike a controller's fire-and-forget recorder, a failed write here
//! surfaces as [`Error::EventWrite`] — the process reports it, though
//! the skip decision itself is already final.

use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;

use crate::{Error, Result, TRIGGER_COMPONENT};

/// Well-known event reason strings
pub mod reasons {
    /// Session creation was skipped because a target workload is missing
    pub const BACKUP_SKIPPED: &str = "BackupSkipped";
}

/// Well-known event action strings
pub mod actions {
    /// The one-shot triggering pass
    pub const TRIGGER: &str = "Trigger";
}

/// Records skip events against invoker objects
pub struct SkipRecorder {
    recorder: Recorder,
}

impl SkipRecorder {
    /// Create a recorder reporting as the trigger component
    pub fn new(client: Client) -> Self {
        let reporter = Reporter {
            controller: TRIGGER_COMPONENT.to_string(),
            instance: None,
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }

    /// Append one skip event on `subject` with the given message
    pub async fn record_skip(&self, subject: &ObjectReference, message: &str) -> Result<()> {
        let event = Event {
            type_: EventType::Normal,
            reason: reasons::BACKUP_SKIPPED.to_string(),
            note: Some(message.to_string()),
            action: actions::TRIGGER.to_string(),
            secondary: None,
        };
        self.recorder
            .publish(&event, subject)
            .await
            .map_err(|e| Error::EventWrite(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_and_action_constants() {
        assert_eq!(reasons::BACKUP_SKIPPED, "BackupSkipped");
        assert_eq!(actions::TRIGGER, "Trigger");
    }
}
