//! Retrieval strategy classifier.
//!
//! Pure, total functions over descriptors: [`plan`] decides which strategies
//! run for a chain, [`classify`] decides which of them retrieves one asset.

use std::fmt;

use crate::asset::{AssetDescriptor, AssetKind};
use crate::chain::{BalanceModule, ChainDescriptor};

/// A balance-retrieval strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Push subscription to the system account pallet.
    NativePallet,
    /// Push subscriptions to the generic token pallet, one per asset.
    TokensPallet {
        /// Whether the native asset is also read from this pallet.
        include_native: bool,
    },
    /// Push subscriptions to the asset-index pallet, one per asset.
    AssetsPallet,
    /// One push subscription to the custom ledger holding every asset.
    CustomLedger,
    /// Interval poll of native EVM balances.
    EvmNative,
    /// Interval poll of ERC-20 `balanceOf`.
    EvmContract,
    /// Interval poll of PSP-22 `balanceOf` dry-runs.
    WasmContract,
}

impl Strategy {
    /// Asset kinds read by this strategy.
    #[must_use]
    pub const fn asset_kinds(self) -> &'static [AssetKind] {
        match self {
            Self::NativePallet | Self::EvmNative => &[AssetKind::Native],
            Self::TokensPallet {
                include_native: true,
            }
            | Self::CustomLedger => &[AssetKind::Native, AssetKind::Local],
            Self::TokensPallet {
                include_native: false,
            }
            | Self::AssetsPallet => &[AssetKind::Local],
            Self::EvmContract => &[AssetKind::Erc20],
            Self::WasmContract => &[AssetKind::Psp22],
        }
    }

    /// Returns `true` for interval-polled strategies.
    #[must_use]
    pub const fn is_polled(self) -> bool {
        matches!(self, Self::EvmNative | Self::EvmContract | Self::WasmContract)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NativePallet => "native_pallet",
            Self::TokensPallet { .. } => "tokens_pallet",
            Self::AssetsPallet => "assets_pallet",
            Self::CustomLedger => "custom_ledger",
            Self::EvmNative => "evm_native",
            Self::EvmContract => "evm_contract",
            Self::WasmContract => "wasm_contract",
        };
        f.write_str(s)
    }
}

/// Strategies started for one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyPlan {
    /// The strategy retrieving the native asset.
    pub primary: Strategy,
    /// Token and contract strategies.
    pub secondary: Vec<Strategy>,
}

impl StrategyPlan {
    /// Every strategy of the plan, primary first.
    pub fn iter(&self) -> impl Iterator<Item = Strategy> + '_ {
        std::iter::once(self.primary).chain(self.secondary.iter().copied())
    }
}

/// Plans the strategies of a chain.
#[must_use]
pub fn plan(chain: &ChainDescriptor) -> StrategyPlan {
    let Some(module) = chain.balance_module() else {
        return StrategyPlan {
            primary: Strategy::EvmNative,
            secondary: vec![Strategy::EvmContract],
        };
    };

    let primary = match module {
        BalanceModule::CustomLedger => Strategy::CustomLedger,
        BalanceModule::TokensWithNative => Strategy::TokensPallet {
            include_native: true,
        },
        BalanceModule::System | BalanceModule::Tokens | BalanceModule::Assets => {
            Strategy::NativePallet
        }
    };

    let mut secondary = Vec::new();
    match module {
        BalanceModule::Tokens => secondary.push(Strategy::TokensPallet {
            include_native: false,
        }),
        BalanceModule::Assets => secondary.push(Strategy::AssetsPallet),
        BalanceModule::System | BalanceModule::TokensWithNative | BalanceModule::CustomLedger => {}
    }
    if chain.is_evm_compatible() {
        secondary.push(Strategy::EvmContract);
    }
    if chain.supports_contract(AssetKind::Psp22) {
        secondary.push(Strategy::WasmContract);
    }

    StrategyPlan { primary, secondary }
}

/// Picks the strategy of the chain's plan that retrieves `asset`.
///
/// Returns `None` for non-fungible assets, assets of another chain, kinds the
/// chain's plan does not read, and zk-bridged assets on asset-index chains.
#[must_use]
pub fn classify(chain: &ChainDescriptor, asset: &AssetDescriptor) -> Option<Strategy> {
    if !asset.kind.is_fungible() || asset.origin_chain != chain.slug {
        return None;
    }
    plan(chain)
        .iter()
        .find(|s| s.asset_kinds().contains(&asset.kind))
        .filter(|s| !(*s == Strategy::AssetsPallet && asset.metadata.zk_bridged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainRole, SubstrateInfo};

    fn substrate(slug: &str, module: BalanceModule) -> ChainDescriptor {
        ChainDescriptor::substrate(
            slug,
            SubstrateInfo {
                balance_module: module,
                ..SubstrateInfo::default()
            },
        )
    }

    fn representative_chains() -> Vec<ChainDescriptor> {
        let mut wasm = substrate("astar", BalanceModule::Assets).with_evm(592);
        if let Some(info) = wasm.substrate.as_mut() {
            info.contract_standards.push(AssetKind::Psp22);
        }
        vec![
            ChainDescriptor::evm("ethereum", 1),
            ChainDescriptor::substrate(
                "polkadot",
                SubstrateInfo {
                    role: ChainRole::Relay,
                    pooled_staking: true,
                    ..SubstrateInfo::default()
                },
            ),
            substrate("bifrost", BalanceModule::Tokens),
            substrate("kintsugi", BalanceModule::TokensWithNative),
            substrate("statemine", BalanceModule::Assets),
            substrate("genshiro", BalanceModule::CustomLedger),
            substrate("moonbeam", BalanceModule::System).with_evm(1284),
            wasm,
        ]
    }

    #[test]
    fn test_evm_only_plan() {
        let plan = plan(&ChainDescriptor::evm("ethereum", 1));
        assert_eq!(plan.primary, Strategy::EvmNative);
        assert_eq!(plan.secondary, vec![Strategy::EvmContract]);
    }

    #[test]
    fn test_primary_by_balance_module() {
        assert_eq!(
            plan(&substrate("genshiro", BalanceModule::CustomLedger)).primary,
            Strategy::CustomLedger
        );
        assert_eq!(
            plan(&substrate("kintsugi", BalanceModule::TokensWithNative)).primary,
            Strategy::TokensPallet {
                include_native: true
            }
        );
        let bifrost = plan(&substrate("bifrost", BalanceModule::Tokens));
        assert_eq!(bifrost.primary, Strategy::NativePallet);
        assert_eq!(
            bifrost.secondary,
            vec![Strategy::TokensPallet {
                include_native: false
            }]
        );
    }

    #[test]
    fn test_dual_stack_with_wasm_contracts() {
        let chains = representative_chains();
        let astar = chains.iter().find(|c| c.slug == "astar").unwrap();
        let plan = plan(astar);
        assert_eq!(plan.primary, Strategy::NativePallet);
        assert_eq!(
            plan.secondary,
            vec![
                Strategy::AssetsPallet,
                Strategy::EvmContract,
                Strategy::WasmContract
            ]
        );
    }

    #[test]
    fn test_local_module_strategies_are_exclusive() {
        for chain in representative_chains() {
            let local = plan(&chain)
                .iter()
                .filter(|s| {
                    matches!(
                        s,
                        Strategy::TokensPallet { .. }
                            | Strategy::AssetsPallet
                            | Strategy::CustomLedger
                    )
                })
                .count();
            assert!(local <= 1, "{} runs {local} local strategies", chain.slug);
        }
    }

    #[test]
    fn test_classify_is_total_and_deterministic() {
        let kinds = [
            AssetKind::Native,
            AssetKind::Local,
            AssetKind::Erc20,
            AssetKind::Psp22,
            AssetKind::NonFungible,
        ];
        for chain in representative_chains() {
            for kind in kinds {
                for zk in [false, true] {
                    let mut asset = AssetDescriptor::new("a", chain.slug.clone(), kind);
                    asset.metadata.zk_bridged = zk;
                    let first = classify(&chain, &asset);
                    assert_eq!(first, classify(&chain, &asset));
                    if kind == AssetKind::NonFungible {
                        assert_eq!(first, None);
                    }
                    if let Some(strategy) = first {
                        assert!(plan(&chain).iter().any(|s| s == strategy));
                    }
                }
            }
        }
    }

    #[test]
    fn test_classify_examples() {
        let statemine = substrate("statemine", BalanceModule::Assets);
        let usdt = AssetDescriptor::new("statemine-LOCAL-USDT", "statemine", AssetKind::Local);
        assert_eq!(classify(&statemine, &usdt), Some(Strategy::AssetsPallet));
        assert_eq!(classify(&statemine, &usdt.clone().zk_bridged()), None);

        let kintsugi = substrate("kintsugi", BalanceModule::TokensWithNative);
        let kint = AssetDescriptor::new("kintsugi-NATIVE-KINT", "kintsugi", AssetKind::Native);
        assert_eq!(
            classify(&kintsugi, &kint),
            Some(Strategy::TokensPallet {
                include_native: true
            })
        );

        let eth = ChainDescriptor::evm("ethereum", 1);
        let psp = AssetDescriptor::new("ethereum-PSP22-X", "ethereum", AssetKind::Psp22);
        assert_eq!(classify(&eth, &psp), None);
    }

    #[test]
    fn test_only_evm_and_contract_strategies_poll() {
        for chain in representative_chains() {
            for strategy in plan(&chain).iter() {
                let expected = matches!(
                    strategy,
                    Strategy::EvmNative | Strategy::EvmContract | Strategy::WasmContract
                );
                assert_eq!(strategy.is_polled(), expected, "{strategy}");
            }
        }
    }
}
