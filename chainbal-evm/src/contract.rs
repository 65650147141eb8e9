//! Solidity interface definitions for on-chain balance reads.

use alloy_sol_types::sol;

sol! {
    /// Minimal ERC-20 surface used for balance polling.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }
}
