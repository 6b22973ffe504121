//! Keyword classification of receipts into department and expense
//! category.

pub mod rules;

pub use rules::{
    Classification, ClassificationRule, ClassifierTable, MatchSubject, RuleError,
    DEFAULT_CATEGORY, DEFAULT_DEPARTMENT,
};
