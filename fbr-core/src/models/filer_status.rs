use std::fmt;

use serde::{Deserialize, Serialize};

/// Statutory taxpayer classification.
///
/// Non-filers (persons not on the Active Taxpayers List) are taxed on a
/// separate, materially higher slab schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilerStatus {
    Filer,
    NonFiler,
}

impl FilerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filer => "filer",
            Self::NonFiler => "non_filer",
        }
    }

    /// Accepts the storage codes plus the legacy `individual` slab type,
    /// which always meant the filer schedule.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filer" | "individual" | "atl" => Some(Self::Filer),
            "non_filer" | "non-filer" | "nonfiler" | "non_atl" => Some(Self::NonFiler),
            _ => None,
        }
    }

    pub fn all() -> &'static [FilerStatus] {
        &[Self::Filer, Self::NonFiler]
    }
}

impl fmt::Display for FilerStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_round_trips_storage_codes() {
        for status in FilerStatus::all() {
            assert_eq!(FilerStatus::parse(status.as_str()), Some(*status));
        }
    }

    #[test]
    fn parse_accepts_legacy_individual_slab_type() {
        assert_eq!(FilerStatus::parse("individual"), Some(FilerStatus::Filer));
        assert_eq!(FilerStatus::parse(" Non-Filer "), Some(FilerStatus::NonFiler));
    }

    #[test]
    fn parse_rejects_unknown_codes() {
        assert_eq!(FilerStatus::parse("MFJ"), None);
        assert_eq!(FilerStatus::parse(""), None);
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&FilerStatus::NonFiler).unwrap();

        assert_eq!(json, "\"non_filer\"");
    }
}
