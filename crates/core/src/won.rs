use serde::{Deserialize, Serialize};
use std::fmt;

/// A receipt amount in whole Korean won. Won has no minor unit, so amounts
/// are plain non-negative integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Won(u64);

impl Won {
    pub fn new(amount: u64) -> Self {
        Won(amount)
    }

    pub fn zero() -> Self {
        Won(0)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Won {
    fn from(amount: u64) -> Self {
        Won(amount)
    }
}

impl fmt::Display for Won {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "₩{grouped}")
    }
}
