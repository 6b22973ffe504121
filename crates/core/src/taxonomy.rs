use serde::{Deserialize, Serialize};

/// Department an expense is billed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Sales,
    Engineering,
    Administration,
    HumanResources,
    /// Sentinel for records minted by a failed pipeline run.
    Error,
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Department::Sales => write!(f, "sales"),
            Department::Engineering => write!(f, "engineering"),
            Department::Administration => write!(f, "administration"),
            Department::HumanResources => write!(f, "human_resources"),
            Department::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Department {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales" => Ok(Department::Sales),
            "engineering" => Ok(Department::Engineering),
            "administration" => Ok(Department::Administration),
            "human_resources" => Ok(Department::HumanResources),
            "error" => Ok(Department::Error),
            other => Err(format!("Unknown department: '{other}'")),
        }
    }
}

/// Expense category assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Meals,
    OfficeSupplies,
    Benefits,
    Other,
    /// Sentinel for records minted by a failed pipeline run.
    Error,
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpenseCategory::Meals => write!(f, "meals"),
            ExpenseCategory::OfficeSupplies => write!(f, "office_supplies"),
            ExpenseCategory::Benefits => write!(f, "benefits"),
            ExpenseCategory::Other => write!(f, "other"),
            ExpenseCategory::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for ExpenseCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meals" => Ok(ExpenseCategory::Meals),
            "office_supplies" => Ok(ExpenseCategory::OfficeSupplies),
            "benefits" => Ok(ExpenseCategory::Benefits),
            "other" => Ok(ExpenseCategory::Other),
            "error" => Ok(ExpenseCategory::Error),
            other => Err(format!("Unknown expense category: '{other}'")),
        }
    }
}

/// Terminal status of a pipeline run's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Completed,
    Error,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordStatus::Completed => write!(f, "completed"),
            RecordStatus::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(RecordStatus::Completed),
            "error" => Ok(RecordStatus::Error),
            other => Err(format!("Unknown record status: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn department_roundtrip() {
        for dept in [
            Department::Sales,
            Department::Engineering,
            Department::Administration,
            Department::HumanResources,
            Department::Error,
        ] {
            assert_eq!(Department::from_str(&dept.to_string()).unwrap(), dept);
        }
    }

    #[test]
    fn category_roundtrip() {
        for cat in [
            ExpenseCategory::Meals,
            ExpenseCategory::OfficeSupplies,
            ExpenseCategory::Benefits,
            ExpenseCategory::Other,
            ExpenseCategory::Error,
        ] {
            assert_eq!(ExpenseCategory::from_str(&cat.to_string()).unwrap(), cat);
        }
    }

    #[test]
    fn status_roundtrip() {
        assert_eq!(
            RecordStatus::from_str(&RecordStatus::Completed.to_string()).unwrap(),
            RecordStatus::Completed
        );
        assert_eq!(
            RecordStatus::from_str(&RecordStatus::Error.to_string()).unwrap(),
            RecordStatus::Error
        );
    }

    #[test]
    fn unknown_values_rejected() {
        assert!(Department::from_str("finance").is_err());
        assert!(ExpenseCategory::from_str("travel").is_err());
        assert!(RecordStatus::from_str("pending").is_err());
    }

    #[test]
    fn error_sentinels_display_as_error() {
        assert_eq!(Department::Error.to_string(), "error");
        assert_eq!(ExpenseCategory::Error.to_string(), "error");
    }
}
