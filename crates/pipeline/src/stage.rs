use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ErrorKind;

/// Processing stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Acquiring,
    Preprocessing,
    Extracting,
    Parsing,
    Classifying,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Acquiring,
        Stage::Preprocessing,
        Stage::Extracting,
        Stage::Parsing,
        Stage::Classifying,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// 1-based position for progress reporting.
    pub fn index(self) -> usize {
        match self {
            Stage::Acquiring => 1,
            Stage::Preprocessing => 2,
            Stage::Extracting => 3,
            Stage::Parsing => 4,
            Stage::Classifying => 5,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Acquiring => "acquiring",
            Stage::Preprocessing => "preprocessing",
            Stage::Extracting => "extracting",
            Stage::Parsing => "parsing",
            Stage::Classifying => "classifying",
        };
        f.write_str(name)
    }
}

/// Controller state machine. At most one receipt is in flight; terminal
/// states persist until the next run or a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Running { stage: Stage },
    Completed,
    Failed { stage: Stage, kind: ErrorKind },
}

impl PipelineState {
    pub fn is_running(&self) -> bool {
        matches!(self, PipelineState::Running { .. })
    }

    /// Completed or failed; a run settled here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered_one_based() {
        for (pos, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), pos + 1);
        }
        assert_eq!(Stage::COUNT, 5);
    }

    #[test]
    fn display_matches_the_wire_form() {
        assert_eq!(Stage::Preprocessing.to_string(), "preprocessing");
        assert_eq!(
            serde_json::to_string(&Stage::Acquiring).unwrap(),
            "\"acquiring\""
        );
    }

    #[test]
    fn state_serializes_tagged() {
        let state = PipelineState::Failed {
            stage: Stage::Extracting,
            kind: ErrorKind::ExtractionFailed,
        };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["stage"], "extracting");
        assert_eq!(json["kind"], "extraction_failed");
        let back: PipelineState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);

        assert_eq!(
            serde_json::to_value(PipelineState::Idle).unwrap()["state"],
            "idle"
        );
    }

    #[test]
    fn running_predicate_covers_only_running() {
        assert!(PipelineState::Running { stage: Stage::Parsing }.is_running());
        assert!(!PipelineState::Idle.is_running());
        assert!(!PipelineState::Completed.is_running());
        assert!(PipelineState::Completed.is_terminal());
        assert!(!PipelineState::Idle.is_terminal());
    }
}
