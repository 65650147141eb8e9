//! Watcher configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! addresses = ["0x742d35Cc6634C0532925a3b844Bc454e4438f44e"]
//! known_networks = true
//!
//! [aggregator]
//! evm_native_interval_secs = 15
//!
//! [[chains]]
//! slug = "base_mainnet"
//! rpc = [{ url = "https://base.example.org/$BASE_RPC_KEY", rate_limit = 25 }]
//!
//! [[chains]]
//! slug = "moonbeam"
//! substrate = { address_prefix = 1284, role = "para" }
//! evm = { chain_id = 1284 }
//!
//! [[assets]]
//! slug = "moonbeam-NATIVE-GLMR"
//! origin_chain = "moonbeam"
//! kind = "native"
//! ```
//!
//! A `[[chains]]` entry carrying only `slug` and `rpc` attaches endpoints to a
//! known network. Any other entry declares a chain.
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `chainbal.toml`)
//! - `WATCH_ADDRESSES` - Comma-separated addresses, overriding `addresses`

use std::path::Path;

use chainbal::asset::AssetDescriptor;
use chainbal::chain::{ChainDescriptor, EvmInfo, SubstrateInfo};
use chainbal::config::AggregatorConfig;
use chainbal::registry::InMemoryRegistry;
use chainbal_evm::KNOWN_NETWORKS;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Top-level watcher configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Addresses to watch, in any mix of address families.
    #[serde(default)]
    pub addresses: Vec<String>,

    /// Register the built-in EVM networks and their USDC tokens.
    #[serde(default)]
    pub known_networks: bool,

    /// Poll cadence and contract-call limits.
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Chain declarations and RPC endpoints.
    #[serde(default)]
    pub chains: Vec<ChainEntry>,

    /// Extra assets.
    #[serde(default)]
    pub assets: Vec<AssetDescriptor>,
}

/// One `[[chains]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEntry {
    /// Chain slug.
    pub slug: String,

    /// Display name; defaults to the slug.
    #[serde(default)]
    pub name: Option<String>,

    /// Account-style descriptor.
    #[serde(default)]
    pub substrate: Option<SubstrateInfo>,

    /// EVM descriptor.
    #[serde(default)]
    pub evm: Option<EvmInfo>,

    /// RPC endpoints, tried in fallback order.
    #[serde(default)]
    pub rpc: Vec<RpcEndpoint>,
}

/// One RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcEndpoint {
    /// Endpoint URL.
    pub url: Url,
    /// Maximum requests per second.
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl ChainEntry {
    /// The declared chain, or `None` when the entry only supplies endpoints.
    #[must_use]
    pub fn descriptor(&self) -> Option<ChainDescriptor> {
        if self.substrate.is_none() && self.evm.is_none() {
            return None;
        }
        Some(ChainDescriptor {
            slug: self.slug.clone(),
            name: self.name.clone().unwrap_or_else(|| self.slug.clone()),
            substrate: self.substrate.clone(),
            evm: self.evm,
        })
    }

    /// Endpoints as `(url, rate_limit)` pairs.
    #[must_use]
    pub fn endpoints(&self) -> Vec<(Url, Option<u32>)> {
        self.rpc
            .iter()
            .map(|e| (e.url.clone(), e.rate_limit))
            .collect()
    }
}

impl WatchConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `chainbal.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "chainbal.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path. A missing file yields
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };

        let mut config = Self::parse(&content)?;

        if let Ok(list) = std::env::var("WATCH_ADDRESSES") {
            config.addresses = split_addresses(&list);
        }

        Ok(config)
    }

    /// Parses a TOML document after expanding environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on invalid TOML.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(&expand_env_vars(content))?)
    }

    /// Builds the registry and the list of chains to watch.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Registry`] if a chain or asset is rejected.
    pub fn registry(&self) -> Result<(InMemoryRegistry, Vec<ChainDescriptor>), ConfigError> {
        let mut registry = InMemoryRegistry::new();
        let mut chains = Vec::new();

        if self.known_networks {
            for network in KNOWN_NETWORKS {
                let chain = network.chain();
                registry.register_chain(chain.clone())?;
                chains.push(chain);
                for asset in network.assets() {
                    registry.register_asset(asset)?;
                }
            }
        }

        for chain in self.chains.iter().filter_map(ChainEntry::descriptor) {
            registry.register_chain(chain.clone())?;
            chains.retain(|c| c.slug != chain.slug);
            chains.push(chain);
        }

        for asset in &self.assets {
            registry.register_asset(asset.clone())?;
        }

        Ok((registry, chains))
    }

    /// Endpoints configured for `slug`, across every entry naming it.
    #[must_use]
    pub fn endpoints_for(&self, slug: &str) -> Vec<(Url, Option<u32>)> {
        self.chains
            .iter()
            .filter(|c| c.slug == slug)
            .flat_map(ChainEntry::endpoints)
            .collect()
    }
}

fn split_addresses(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        while let Some(c) = chars.next_if(|&c| {
            if braced {
                c != '}'
            } else {
                c.is_ascii_alphanumeric() || c == '_'
            }
        }) {
            name.push(c);
        }
        let closed = braced && chars.next_if_eq(&'}').is_some();

        match std::env::var(&name) {
            Ok(value) if !name.is_empty() => result.push_str(&value),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}
