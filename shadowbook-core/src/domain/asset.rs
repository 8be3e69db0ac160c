//! Asset domain model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::Error;

/// One of the four assets held in an encrypted user profile.
///
/// Numeric ids match the on-chain program (0=USDC, 1=TSLA, 2=SPY, 3=AAPL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Usdc,
    Tsla,
    Spy,
    Aapl,
}

impl Asset {
    /// All assets in on-chain id order
    pub const ALL: [Asset; 4] = [Asset::Usdc, Asset::Tsla, Asset::Spy, Asset::Aapl];

    /// On-chain asset id
    pub fn id(&self) -> u8 {
        match self {
            Asset::Usdc => 0,
            Asset::Tsla => 1,
            Asset::Spy => 2,
            Asset::Aapl => 3,
        }
    }

    /// Look up an asset by on-chain id
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }

    /// Lowercase symbol, used for storage and parsing
    pub fn as_str(&self) -> &'static str {
        match self {
            Asset::Usdc => "usdc",
            Asset::Tsla => "tsla",
            Asset::Spy => "spy",
            Asset::Aapl => "aapl",
        }
    }

    /// Ticker shown to users
    pub fn ticker(&self) -> &'static str {
        match self {
            Asset::Usdc => "USDC",
            Asset::Tsla => "TSLA",
            Asset::Spy => "SPY",
            Asset::Aapl => "AAPL",
        }
    }

    /// Number of decimals of the asset's mint. All devnet mints use 6.
    pub fn decimals(&self) -> u32 {
        6
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

impl FromStr for Asset {
    type Err = Error;

    /// Accepts the symbol in any case or the numeric on-chain id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(id) = trimmed.parse::<u8>() {
            return Self::from_id(id).ok_or_else(|| {
                Error::validation(format!("invalid asset id {} (must be 0-3)", id))
            });
        }
        match trimmed.to_lowercase().as_str() {
            "usdc" => Ok(Asset::Usdc),
            "tsla" => Ok(Asset::Tsla),
            "spy" => Ok(Asset::Spy),
            "aapl" => Ok(Asset::Aapl),
            _ => Err(Error::validation(format!(
                "unknown asset '{}' (expected usdc, tsla, spy or aapl)",
                trimmed
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbol_any_case() {
        assert_eq!("USDC".parse::<Asset>().unwrap(), Asset::Usdc);
        assert_eq!(" tsla ".parse::<Asset>().unwrap(), Asset::Tsla);
        assert_eq!("Aapl".parse::<Asset>().unwrap(), Asset::Aapl);
    }

    #[test]
    fn test_parse_numeric_id() {
        assert_eq!("2".parse::<Asset>().unwrap(), Asset::Spy);
        assert!("4".parse::<Asset>().is_err());
    }

    #[test]
    fn test_parse_unknown() {
        let err = "btc".parse::<Asset>().unwrap_err();
        assert!(err.to_string().contains("unknown asset"));
    }

    #[test]
    fn test_ids_are_stable() {
        for asset in Asset::ALL {
            assert_eq!(Asset::from_id(asset.id()), Some(asset));
        }
        assert_eq!(Asset::from_id(9), None);
    }

    #[test]
    fn test_serde_uses_symbol() {
        assert_eq!(serde_json::to_string(&Asset::Spy).unwrap(), "\"spy\"");
        let parsed: Asset = serde_json::from_str("\"aapl\"").unwrap();
        assert_eq!(parsed, Asset::Aapl);
    }
}
