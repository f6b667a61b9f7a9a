use super::ids::TokenId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A distributed token as the service knows it: ledger id, display symbol
/// and decimal precision. Identity is the ledger id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    symbol: String,
    token_id: TokenId,
    #[serde(default = "default_decimals")]
    decimals: u32,
}

fn default_decimals() -> u32 {
    6
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token_id.hash(state)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.token_id == other.token_id
    }
}

impl Eq for Token {}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.token_id.cmp(&other.token_id)
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Token {
    pub fn new(symbol: impl Into<String>, token_id: TokenId, decimals: u32) -> Self {
        Self { symbol: symbol.into(), token_id, decimals }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn token_id(&self) -> &TokenId {
        &self.token_id
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// One whole token in smallest units.
    pub fn one(&self) -> u64 {
        10u64.pow(self.decimals)
    }

    /// Convert a whole-token amount to smallest units.
    pub fn whole_to_units(&self, whole: u64) -> u64 {
        whole.saturating_mul(self.one())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_scaling() {
        let token = Token::new("hUSD", TokenId::new("0.0.1001"), 6);
        assert_eq!(token.one(), 1_000_000);
        assert_eq!(token.whole_to_units(20), 20_000_000);
    }

    #[test]
    fn test_identity_is_token_id() {
        let a = Token::new("hUSD", TokenId::new("0.0.1001"), 6);
        let b = Token::new("renamed", TokenId::new("0.0.1001"), 8);
        assert_eq!(a, b);
    }
}
