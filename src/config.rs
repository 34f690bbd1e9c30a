use std::collections::HashMap;

/// The configuration key holding the chain identifier.
pub const KEY_CHAIN_ID: &str = "chain_id";

/// The configuration key holding the enclave key share data.
pub const KEY_ENCLAVE: &str = "enclave";

/// The configuration key holding the downstream caller configuration blob.
pub const KEY_VAULT_CONFIG: &str = "vault_config";

/// The chain identifier used when the host provides none.
pub const DEFAULT_CHAIN_ID: &str = "mpc-testnet-1";

/// An opaque key/value configuration source supplied by the host.
///
/// The host environment owns how values are stored and delivered; the core
/// only reads them once, at service construction.
pub trait ConfigSource {
    /// Read the raw value for a key, if present.
    fn get(&self, key: &str) -> Option<Vec<u8>>;
}

/// A map backed configuration source.
#[derive(Clone, Debug, Default)]
pub struct MemoryConfig {
    values: HashMap<String, Vec<u8>>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a configuration value, consuming and returning the source.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for MemoryConfig {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_stored_values() {
        let config = MemoryConfig::new().with(KEY_CHAIN_ID, "mpc-local-1");
        assert_eq!(config.get(KEY_CHAIN_ID), Some(b"mpc-local-1".to_vec()));
        assert_eq!(config.get(KEY_ENCLAVE), None);
    }
}
