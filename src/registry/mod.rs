/// Pool and token registry
///
/// Static topology of the service: which tokens exist, which pools trade
/// which pair, and which ledger account custodies each pool's reserves.
/// Loaded once from a TOML file at startup; a pool's pair never changes
/// after that.
pub mod ids;
pub mod pool;
pub mod token;

pub use ids::{AccountId, PoolKey, TokenId};
pub use pool::Pool;
pub use token::Token;

use crate::error::{Result, SwapError};
use crate::utils::config_loader::{self, LoadConfigError};
use ahash::AHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct TokenEntry {
    token_id: TokenId,
    #[serde(default = "default_decimals")]
    decimals: u32,
}

fn default_decimals() -> u32 {
    6
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    network: Option<String>,
    tokens: BTreeMap<String, TokenEntry>,
    pools: Vec<Pool>,
}

/// One direction of a pool resolved against the registry.
#[derive(Clone, Debug)]
pub struct SwapLeg {
    pub pool: Pool,
    pub token_in: Arc<Token>,
    pub token_out: Arc<Token>,
    /// True when the input side is the pool's A token.
    pub a_to_b: bool,
}

#[derive(Debug, Default)]
pub struct Registry {
    network: String,
    tokens: AHashMap<String, Arc<Token>>,
    // Sorted by symbol so the faucet distribution order is stable.
    token_list: Vec<Arc<Token>>,
    pools: AHashMap<PoolKey, Pool>,
}

impl Registry {
    pub fn new(network: impl Into<String>, tokens: Vec<Token>, pools: Vec<Pool>) -> Result<Self> {
        let mut by_symbol: AHashMap<String, Arc<Token>> = AHashMap::new();
        for token in tokens {
            let token = Arc::new(token);
            if by_symbol.insert(token.symbol().to_string(), token.clone()).is_some() {
                return Err(SwapError::Integrity(format!(
                    "duplicate token symbol {}",
                    token.symbol()
                )));
            }
        }
        let mut token_list: Vec<Arc<Token>> = by_symbol.values().cloned().collect();
        token_list.sort_by(|a, b| a.symbol().cmp(b.symbol()));

        let mut by_key: AHashMap<PoolKey, Pool> = AHashMap::new();
        for pool in pools {
            if pool.token_a() == pool.token_b() {
                return Err(SwapError::Integrity(format!(
                    "pool {} pairs a token with itself",
                    pool.pool_key()
                )));
            }
            for symbol in [pool.token_a(), pool.token_b()] {
                if !by_symbol.contains_key(symbol) {
                    return Err(SwapError::UnknownToken(symbol.to_string()));
                }
            }
            if by_key.insert(pool.pool_key().clone(), pool.clone()).is_some() {
                return Err(SwapError::Integrity(format!(
                    "duplicate pool key {}",
                    pool.pool_key()
                )));
            }
        }

        Ok(Self { network: network.into(), tokens: by_symbol, token_list, pools: by_key })
    }

    /// Load the registry from a TOML file with `${VAR}` expansion.
    pub async fn load(file_name: String) -> std::result::Result<Self, LoadConfigError> {
        let file: RegistryFile = config_loader::load_from_file(file_name).await?;
        Self::from_registry_file(file)
    }

    pub fn load_sync(file_name: String) -> std::result::Result<Self, LoadConfigError> {
        let file: RegistryFile = config_loader::load_from_file_sync(file_name)?;
        Self::from_registry_file(file)
    }

    fn from_registry_file(file: RegistryFile) -> std::result::Result<Self, LoadConfigError> {
        let tokens = file
            .tokens
            .into_iter()
            .map(|(symbol, entry)| Token::new(symbol, entry.token_id, entry.decimals))
            .collect();
        Self::new(file.network.unwrap_or_else(|| "testnet".to_string()), tokens, file.pools)
            .map_err(|e| {
                LoadConfigError::IoError(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    e.to_string(),
                ))
            })
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn pool(&self, pool_key: &PoolKey) -> Result<&Pool> {
        self.pools.get(pool_key).ok_or_else(|| SwapError::UnknownPool(pool_key.to_string()))
    }

    pub fn token(&self, symbol: &str) -> Result<Arc<Token>> {
        self.tokens.get(symbol).cloned().ok_or_else(|| SwapError::UnknownToken(symbol.to_string()))
    }

    /// Both tokens of a pool's pair, in (A, B) order.
    pub fn pair(&self, pool: &Pool) -> Result<(Arc<Token>, Arc<Token>)> {
        Ok((self.token(pool.token_a())?, self.token(pool.token_b())?))
    }

    /// Resolve a from/to symbol pair against a pool into a swap leg.
    pub fn resolve_leg(&self, pool_key: &PoolKey, from: &str, to: &str) -> Result<SwapLeg> {
        let pool = self.pool(pool_key)?.clone();
        let a_to_b = pool.direction(from, to).ok_or_else(|| SwapError::UnsupportedPair {
            pool: pool_key.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        })?;
        let (token_a, token_b) = self.pair(&pool)?;
        let (token_in, token_out) = if a_to_b { (token_a, token_b) } else { (token_b, token_a) };
        Ok(SwapLeg { pool, token_in, token_out, a_to_b })
    }

    /// All distributed tokens, sorted by symbol.
    pub fn tokens(&self) -> &[Arc<Token>] {
        &self.token_list
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    pub fn pools_len(&self) -> usize {
        self.pools.len()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::registry;

    #[test]
    fn test_lookup() {
        let reg = registry();
        let pool = reg.pool(&PoolKey::new("hUSD-hEUR")).unwrap();
        assert_eq!(pool.fee_bps(), 30);
        assert_eq!(reg.token("hUSD").unwrap().decimals(), 6);
        assert!(matches!(
            reg.pool(&PoolKey::new("nope")),
            Err(SwapError::UnknownPool(_))
        ));
    }

    #[test]
    fn test_resolve_leg_both_directions() {
        let reg = registry();
        let key = PoolKey::new("hUSD-hEUR");

        let leg = reg.resolve_leg(&key, "hUSD", "hEUR").unwrap();
        assert!(leg.a_to_b);
        assert_eq!(leg.token_in.symbol(), "hUSD");

        let leg = reg.resolve_leg(&key, "hEUR", "hUSD").unwrap();
        assert!(!leg.a_to_b);
        assert_eq!(leg.token_in.symbol(), "hEUR");

        assert!(matches!(
            reg.resolve_leg(&key, "hUSD", "hGBP"),
            Err(SwapError::UnsupportedPair { .. })
        ));
    }

    #[test]
    fn test_rejects_pool_with_unknown_token() {
        let result = Registry::new(
            "testnet",
            vec![Token::new("hUSD", TokenId::new("0.0.1001"), 6)],
            vec![Pool::new(
                PoolKey::new("hUSD-hEUR"),
                AccountId::new("0.0.5005"),
                "hUSD",
                "hEUR",
                30,
            )],
        );
        assert!(matches!(result, Err(SwapError::UnknownToken(_))));
    }

    #[test]
    fn test_parse_registry_toml() {
        let raw = r#"
            network = "testnet"

            [tokens.hUSD]
            token_id = "0.0.1001"
            decimals = 6

            [tokens.hEUR]
            token_id = "0.0.1002"

            [[pools]]
            pool_key = "hUSD-hEUR"
            account = "0.0.5005"
            token_a = "hUSD"
            token_b = "hEUR"
            fee_bps = 30
        "#;
        let file: RegistryFile = toml::from_str(raw).unwrap();
        let reg = Registry::from_registry_file(file).unwrap();
        assert_eq!(reg.pools_len(), 1);
        assert_eq!(reg.tokens().len(), 2);
        // defaulted decimals
        assert_eq!(reg.token("hEUR").unwrap().decimals(), 6);
    }
}
