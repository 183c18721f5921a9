//! Core types for batch upload orchestration.
//!
//! Lifecycle of one item:
//! Pending → Analyzing → {Matched | Manual} → Uploading → {Complete | Error}.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::BatchError;
use crate::models::ExtractedFields;
use crate::pipeline::resolution::Resolution;
use crate::pipeline::segmentation::PageRange;

// ═══════════════════════════════════════════
// Upload Status
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    /// Queued raw, not yet segmented or analyzed.
    Pending,
    Analyzing,
    /// A customer was resolved automatically.
    Matched,
    /// No customer resolved; needs an operator or will be stored as an orphan.
    Manual,
    Uploading,
    Complete,
    Error,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::Matched => "matched",
            Self::Manual => "manual",
            Self::Uploading => "uploading",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "analyzing" => Some(Self::Analyzing),
            "matched" => Some(Self::Matched),
            "manual" => Some(Self::Manual),
            "uploading" => Some(Self::Uploading),
            "complete" => Some(Self::Complete),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    /// Awaiting persistence; operator overrides are accepted here.
    pub fn is_reviewable(&self) -> bool {
        matches!(self, Self::Matched | Self::Manual)
    }

    /// The transition table. Forward only; any non-terminal state may fail.
    pub fn can_transition_to(&self, next: UploadStatus) -> bool {
        use UploadStatus::*;
        match (self, next) {
            (Complete | Error, _) => false,
            (_, Error) => true,
            (Pending, Analyzing) => true,
            (Analyzing, Matched | Manual) => true,
            (Matched | Manual, Uploading) => true,
            (Uploading, Complete) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// Operator selection
// ═══════════════════════════════════════════

/// Operator override. Once set it takes precedence over the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ManualSelection {
    Assign {
        customer_id: String,
        vehicle_id: Option<String>,
    },
    StoreForLater,
}

// ═══════════════════════════════════════════
// Upload Item
// ═══════════════════════════════════════════

/// One repair-order candidate inside a batch.
#[derive(Debug, Clone, Serialize)]
pub struct UploadItem {
    pub id: Uuid,
    pub file_name: String,
    /// Page range within the source file. `None` until segmented.
    pub page_range: Option<PageRange>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub status: UploadStatus,
    pub fields: Option<ExtractedFields>,
    pub resolution: Option<Resolution>,
    pub selection: Option<ManualSelection>,
    pub file_url: Option<String>,
    pub record_id: Option<Uuid>,
    pub error: Option<String>,
}

impl UploadItem {
    pub fn pending(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            page_range: None,
            bytes,
            status: UploadStatus::Pending,
            fields: None,
            resolution: None,
            selection: None,
            file_url: None,
            record_id: None,
            error: None,
        }
    }

    pub fn transition(&mut self, next: UploadStatus) -> Result<(), BatchError> {
        if !self.status.can_transition_to(next) {
            return Err(BatchError::InvalidTransition {
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Record a failure. Terminal items are left untouched.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = UploadStatus::Error;
        self.error = Some(message.into());
    }

    /// Customer and vehicle ids to persist: the operator selection when set,
    /// else the resolver's result.
    pub fn effective_ids(&self) -> (Option<String>, Option<String>) {
        match &self.selection {
            Some(ManualSelection::Assign {
                customer_id,
                vehicle_id,
            }) => (Some(customer_id.clone()), vehicle_id.clone()),
            Some(ManualSelection::StoreForLater) => (None, None),
            None => self
                .resolution
                .as_ref()
                .map(|r| (r.customer_id.clone(), r.vehicle_id.clone()))
                .unwrap_or((None, None)),
        }
    }

    /// True if some field was extracted from the segment text.
    pub fn analyzed(&self) -> bool {
        self.fields.as_ref().is_some_and(|f| !f.is_empty())
    }
}

// ═══════════════════════════════════════════
// Batch Report
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub matched: usize,
    pub manual: usize,
    pub uploading: usize,
    pub complete: usize,
    pub error: usize,
}

/// Snapshot of a batch for callers and the API.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub shop_id: String,
    pub created_at: NaiveDateTime,
    pub total: usize,
    pub counts: StatusCounts,
    pub done: bool,
    pub items: Vec<UploadItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [UploadStatus; 7] = [
        UploadStatus::Pending,
        UploadStatus::Analyzing,
        UploadStatus::Matched,
        UploadStatus::Manual,
        UploadStatus::Uploading,
        UploadStatus::Complete,
        UploadStatus::Error,
    ];

    #[test]
    fn status_round_trip() {
        for status in ALL {
            assert_eq!(UploadStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(UploadStatus::from_str("done"), None);
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for next in ALL {
            assert!(!UploadStatus::Complete.can_transition_to(next));
            assert!(!UploadStatus::Error.can_transition_to(next));
        }
    }

    #[test]
    fn matched_and_manual_only_from_analyzing() {
        for from in ALL {
            let allowed = from == UploadStatus::Analyzing;
            assert_eq!(from.can_transition_to(UploadStatus::Matched), allowed, "{from}");
            assert_eq!(from.can_transition_to(UploadStatus::Manual), allowed, "{from}");
        }
    }

    #[test]
    fn no_backward_transitions() {
        assert!(!UploadStatus::Uploading.can_transition_to(UploadStatus::Matched));
        assert!(!UploadStatus::Manual.can_transition_to(UploadStatus::Analyzing));
        assert!(!UploadStatus::Analyzing.can_transition_to(UploadStatus::Pending));
        assert!(!UploadStatus::Matched.can_transition_to(UploadStatus::Complete));
    }

    #[test]
    fn every_non_terminal_state_can_fail() {
        for from in ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(from.can_transition_to(UploadStatus::Error));
        }
    }

    #[test]
    fn happy_path_transitions() {
        let mut item = UploadItem::pending("a.pdf", vec![]);
        item.transition(UploadStatus::Analyzing).unwrap();
        item.transition(UploadStatus::Manual).unwrap();
        item.transition(UploadStatus::Uploading).unwrap();
        item.transition(UploadStatus::Complete).unwrap();
        assert!(item.transition(UploadStatus::Error).is_err());
    }

    #[test]
    fn fail_records_message_once() {
        let mut item = UploadItem::pending("a.pdf", vec![]);
        item.fail("disk full");
        assert_eq!(item.status, UploadStatus::Error);
        item.fail("second");
        assert_eq!(item.error.as_deref(), Some("disk full"));
    }

    #[test]
    fn selection_takes_precedence() {
        let mut item = UploadItem::pending("a.pdf", vec![]);
        item.resolution = Some(Resolution {
            customer_id: Some("c1".into()),
            vehicle_id: Some("v1".into()),
            ..Default::default()
        });
        assert_eq!(item.effective_ids(), (Some("c1".into()), Some("v1".into())));

        item.selection = Some(ManualSelection::StoreForLater);
        assert_eq!(item.effective_ids(), (None, None));

        item.selection = Some(ManualSelection::Assign {
            customer_id: "c2".into(),
            vehicle_id: None,
        });
        assert_eq!(item.effective_ids(), (Some("c2".into()), None));
    }

    #[test]
    fn selection_json_shape() {
        let json = serde_json::to_value(ManualSelection::Assign {
            customer_id: "c1".into(),
            vehicle_id: None,
        })
        .unwrap();
        assert_eq!(json["kind"], "assign");
        assert_eq!(json["customer_id"], "c1");
    }
}
