use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanTier {
    #[default]
    Free,
    Normal,
    Pro,
}

impl Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tier = match self {
            PlanTier::Free => "FREE",
            PlanTier::Normal => "NORMAL",
            PlanTier::Pro => "PRO",
        };
        write!(f, "{}", tier)
    }
}

impl PlanTier {
    /// Returns `None` for anything outside the three known tiers. Callers
    /// decide whether that is a rejection (upgrade requests) or a fallback
    /// (stored rows).
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "FREE" => Some(PlanTier::Free),
            "NORMAL" => Some(PlanTier::Normal),
            "PRO" => Some(PlanTier::Pro),
            _ => None,
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, PlanTier::Free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tiers_case_insensitively() {
        assert_eq!(PlanTier::from_str("FREE"), Some(PlanTier::Free));
        assert_eq!(PlanTier::from_str("normal"), Some(PlanTier::Normal));
        assert_eq!(PlanTier::from_str("Pro"), Some(PlanTier::Pro));
    }

    #[test]
    fn rejects_unknown_tiers() {
        assert_eq!(PlanTier::from_str("PLATINUM"), None);
        assert_eq!(PlanTier::from_str(""), None);
    }
}
