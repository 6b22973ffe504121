use serde::{Deserialize, Serialize};

use jeonpyo_core::{Department, ExpenseCategory};

/// Fallbacks when no rule matches.
pub const DEFAULT_DEPARTMENT: Department = Department::Administration;
pub const DEFAULT_CATEGORY: ExpenseCategory = ExpenseCategory::Other;

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Invalid rule file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Rule '{0}' has no keywords")]
    EmptyKeywords(String),
}

/// What text a rule's keywords are matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSubject {
    #[default]
    Merchant,
    Items,
    Any,
}

/// One keyword rule. Keywords match as case-insensitive substrings; any
/// single hit fires the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub subject: MatchSubject,
    pub department: Department,
    pub category: ExpenseCategory,
}

/// Outcome of classifying one record. `rule` is `None` when the fallback
/// applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub department: Department,
    pub category: ExpenseCategory,
    pub rule: Option<String>,
}

#[derive(Debug)]
struct CompiledRule {
    rule: ClassificationRule,
    keywords_lower: Vec<String>,
}

/// Ordered rule table. Rules are tried in insertion order and the first
/// hit wins, so broader rules belong after narrower ones.
#[derive(Debug)]
pub struct ClassifierTable {
    rules: Vec<CompiledRule>,
}

const BUILTIN_RULES: &[(&str, &[&str], Department, ExpenseCategory)] = &[
    (
        "cafe",
        &["스타벅스", "starbucks", "카페", "cafe", "커피", "coffee"],
        Department::Sales,
        ExpenseCategory::Meals,
    ),
    (
        "convenience",
        &["gs25", "cu", "편의점", "convenience"],
        Department::Administration,
        ExpenseCategory::OfficeSupplies,
    ),
    (
        "fast-food",
        &["맥도날드", "mcdonald", "버거", "burger", "패스트푸드", "fast food"],
        Department::Engineering,
        ExpenseCategory::Meals,
    ),
    (
        "cosmetics",
        &["올리브영", "olive young", "화장품", "cosmetic"],
        Department::HumanResources,
        ExpenseCategory::Benefits,
    ),
];

impl ClassifierTable {
    /// Build a table from rules in priority order.
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| CompiledRule {
                keywords_lower: rule.keywords.iter().map(|kw| kw.to_lowercase()).collect(),
                rule,
            })
            .collect();
        ClassifierTable { rules }
    }

    /// The stock table for Korean expense receipts.
    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(name, keywords, department, category)| ClassificationRule {
                name: (*name).to_string(),
                keywords: keywords.iter().map(|kw| (*kw).to_string()).collect(),
                subject: MatchSubject::Merchant,
                department: *department,
                category: *category,
            })
            .collect();
        Self::new(rules)
    }

    /// Load a table from a TOML rule file. Order in the file is priority
    /// order.
    pub fn from_toml(text: &str) -> Result<Self, RuleError> {
        #[derive(Deserialize)]
        struct RuleFile {
            rules: Vec<ClassificationRule>,
        }

        let file: RuleFile = toml::from_str(text)?;
        for rule in &file.rules {
            if rule.keywords.is_empty() {
                return Err(RuleError::EmptyKeywords(rule.name.clone()));
            }
        }
        Ok(Self::new(file.rules))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classify one record by its merchant name and line item text.
    pub fn classify(&self, merchant: &str, items_text: &str) -> Classification {
        let merchant_lower = merchant.to_lowercase();
        let items_lower = items_text.to_lowercase();
        for compiled in &self.rules {
            let hit = compiled.keywords_lower.iter().any(|kw| match compiled.rule.subject {
                MatchSubject::Merchant => merchant_lower.contains(kw.as_str()),
                MatchSubject::Items => items_lower.contains(kw.as_str()),
                MatchSubject::Any => {
                    merchant_lower.contains(kw.as_str()) || items_lower.contains(kw.as_str())
                }
            });
            if hit {
                return Classification {
                    department: compiled.rule.department,
                    category: compiled.rule.category,
                    rule: Some(compiled.rule.name.clone()),
                };
            }
        }
        Classification {
            department: DEFAULT_DEPARTMENT,
            category: DEFAULT_CATEGORY,
            rule: None,
        }
    }
}

impl Default for ClassifierTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_classifies_known_merchants() {
        let table = ClassifierTable::builtin();

        let cafe = table.classify("스타벅스 강남점", "");
        assert_eq!(cafe.department, Department::Sales);
        assert_eq!(cafe.category, ExpenseCategory::Meals);
        assert_eq!(cafe.rule.as_deref(), Some("cafe"));

        let store = table.classify("GS25 역삼점", "");
        assert_eq!(store.department, Department::Administration);
        assert_eq!(store.category, ExpenseCategory::OfficeSupplies);

        let burger = table.classify("맥도날드 시청점", "");
        assert_eq!(burger.department, Department::Engineering);
        assert_eq!(burger.category, ExpenseCategory::Meals);

        let beauty = table.classify("올리브영 홍대점", "");
        assert_eq!(beauty.department, Department::HumanResources);
        assert_eq!(beauty.category, ExpenseCategory::Benefits);
    }

    #[test]
    fn unknown_merchant_falls_back() {
        let got = ClassifierTable::builtin().classify("철물점", "");
        assert_eq!(got.department, DEFAULT_DEPARTMENT);
        assert_eq!(got.category, DEFAULT_CATEGORY);
        assert_eq!(got.rule, None);
    }

    #[test]
    fn earlier_rule_wins_when_several_match() {
        // 커피 belongs to the cafe rule, 편의점 to convenience; cafe is
        // listed first.
        let got = ClassifierTable::builtin().classify("편의점 커피 코너", "");
        assert_eq!(got.rule.as_deref(), Some("cafe"));
        assert_eq!(got.department, Department::Sales);
    }

    #[test]
    fn matching_ignores_case() {
        let table = ClassifierTable::builtin();
        assert_eq!(
            table.classify("STARBUCKS Gangnam", "").rule.as_deref(),
            Some("cafe")
        );
        assert_eq!(
            table.classify("gs25", "").rule.as_deref(),
            Some("convenience")
        );
    }

    #[test]
    fn builtin_rules_look_only_at_the_merchant() {
        let got = ClassifierTable::builtin().classify("동네가게", "커피 2개 3,000원");
        assert_eq!(got.rule, None);
    }

    #[test]
    fn item_scoped_rules_match_item_text() {
        let table = ClassifierTable::new(vec![ClassificationRule {
            name: "stationery".to_string(),
            keywords: vec!["문구".to_string()],
            subject: MatchSubject::Items,
            department: Department::Administration,
            category: ExpenseCategory::OfficeSupplies,
        }]);
        let got = table.classify("다이소 강남점", "문구세트 1개 3,000원");
        assert_eq!(got.rule.as_deref(), Some("stationery"));
        assert_eq!(table.classify("문구 백화점", "").rule, None);
    }

    #[test]
    fn toml_rules_load_in_file_order() {
        let table = ClassifierTable::from_toml(
            r#"
            [[rules]]
            name = "bakery"
            keywords = ["파리바게뜨", "bakery"]
            department = "sales"
            category = "meals"

            [[rules]]
            name = "broad-food"
            keywords = ["베이커리", "bakery"]
            department = "administration"
            category = "other"
            "#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        // Both rules carry "bakery"; the first in the file wins.
        let got = table.classify("Seoul Bakery", "");
        assert_eq!(got.rule.as_deref(), Some("bakery"));
        assert_eq!(got.department, Department::Sales);
    }

    #[test]
    fn toml_subject_defaults_to_merchant() {
        let table = ClassifierTable::from_toml(
            r#"
            [[rules]]
            name = "hr"
            keywords = ["복지"]
            department = "human_resources"
            category = "benefits"
            "#,
        )
        .unwrap();
        assert_eq!(table.classify("복지몰", "").rule.as_deref(), Some("hr"));
        assert_eq!(table.classify("마트", "복지 상품 1개").rule, None);
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let err = ClassifierTable::from_toml("rules = 3").unwrap_err();
        assert!(matches!(err, RuleError::Parse(_)));
    }

    #[test]
    fn keywordless_rules_are_rejected() {
        let err = ClassifierTable::from_toml(
            r#"
            [[rules]]
            name = "dead"
            keywords = []
            department = "sales"
            category = "other"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::EmptyKeywords(name) if name == "dead"));
    }

    #[test]
    fn rule_files_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(
            &path,
            "[[rules]]\nname = \"cafe\"\nkeywords = [\"커피\"]\ndepartment = \"sales\"\ncategory = \"meals\"\n",
        )
        .unwrap();
        let table = ClassifierTable::from_toml(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(table.classify("커피빈", "").rule.as_deref(), Some("cafe"));
    }
}
