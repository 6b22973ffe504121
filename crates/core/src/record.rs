use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::taxonomy::{Department, ExpenseCategory, RecordStatus};
use super::won::Won;

/// Merchant sentinel carried by records minted from a failed run.
pub const FAILED_MERCHANT: &str = "processing failed";

/// Unique record identifier, generated once at record creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn generate() -> Self {
        RecordId(format!("REC-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque correlation token supplied by the caller context (payment flow,
/// session, ...). Passed through into the record unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(String);

impl LinkId {
    pub fn new(token: impl Into<String>) -> Self {
        LinkId(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The pipeline's terminal artifact: one classified expense record per run.
/// Created exactly once, immutable thereafter; ownership transfers to the
/// caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    pub id: RecordId,
    pub merchant: String,
    pub amount: Won,
    pub date: NaiveDate,
    /// Candidate line-item strings, 0 to 5 entries, in recognition order.
    pub items: Vec<String>,
    pub link_id: LinkId,
    pub department: Department,
    pub category: ExpenseCategory,
    /// Extraction confidence in [0,100]; 0 for failed records.
    pub confidence: f32,
    pub status: RecordStatus,
}

impl ReceiptRecord {
    /// The sentinel record minted when a run fails: zero-valued fields, error
    /// taxonomy markers, confidence 0. Downstream consumers detect failure by
    /// `status`, never by inspecting field contents.
    pub fn failed(link_id: LinkId) -> Self {
        Self::failed_at(link_id, chrono::Utc::now().date_naive())
    }

    pub fn failed_at(link_id: LinkId, date: NaiveDate) -> Self {
        ReceiptRecord {
            id: RecordId::generate(),
            merchant: FAILED_MERCHANT.to_string(),
            amount: Won::zero(),
            date,
            items: vec![],
            link_id,
            department: Department::Error,
            category: ExpenseCategory::Error,
            confidence: 0.0,
            status: RecordStatus::Error,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == RecordStatus::Error
    }
}
