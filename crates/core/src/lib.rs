pub mod record;
pub mod score;
pub mod taxonomy;
pub mod won;

pub use record::{LinkId, ReceiptRecord, RecordId, FAILED_MERCHANT};
pub use score::{CoverageScore, FieldCoverage, FixedScore, ScorePolicy, SCORE_CEIL, SCORE_FLOOR};
pub use taxonomy::{Department, ExpenseCategory, RecordStatus};
pub use won::Won;
