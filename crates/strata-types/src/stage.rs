//! The fixed medallion stage enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One medallion stage. The order is a system-wide invariant: later stages
/// may assume earlier stages' outputs exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Raw extraction from source systems.
    Bronze,
    /// Refined, cleaned datasets.
    Silver,
    /// Aggregated, consumption-ready datasets.
    Gold,
}

/// A stage name outside the fixed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage '{0}', expected one of: bronze, silver, gold")]
pub struct UnknownStage(pub String);

impl Stage {
    /// The fixed execution order.
    pub const ORDER: [Stage; 3] = [Stage::Bronze, Stage::Silver, Stage::Gold];

    /// Wire-format name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
        }
    }

    /// The contiguous suffix of [`Stage::ORDER`] starting at `self`.
    #[must_use]
    pub fn suffix(self) -> Vec<Stage> {
        let idx = Self::ORDER.iter().position(|s| *s == self).unwrap_or(0);
        Self::ORDER[idx..].to_vec()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = UnknownStage;

    /// Case-insensitive parse of a stage name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bronze" => Ok(Self::Bronze),
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            _ => Err(UnknownStage(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_bronze_silver_gold() {
        assert_eq!(Stage::ORDER, [Stage::Bronze, Stage::Silver, Stage::Gold]);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Bronze".parse::<Stage>().unwrap(), Stage::Bronze);
        assert_eq!("SILVER".parse::<Stage>().unwrap(), Stage::Silver);
        assert_eq!(" gold ".parse::<Stage>().unwrap(), Stage::Gold);
    }

    #[test]
    fn parse_unknown_names_the_value() {
        let err = "platinum".parse::<Stage>().unwrap_err();
        assert!(err.to_string().contains("platinum"));
    }

    #[test]
    fn suffix_is_contiguous() {
        assert_eq!(Stage::Bronze.suffix(), vec![Stage::Bronze, Stage::Silver, Stage::Gold]);
        assert_eq!(Stage::Silver.suffix(), vec![Stage::Silver, Stage::Gold]);
        assert_eq!(Stage::Gold.suffix(), vec![Stage::Gold]);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Stage::Bronze).unwrap(), "\"bronze\"");
        let back: Stage = serde_json::from_str("\"gold\"").unwrap();
        assert_eq!(back, Stage::Gold);
    }
}
