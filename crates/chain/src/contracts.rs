//! Aave V2 contract interfaces.
//!
//! Only the functions and events the agents read or filter on are declared.
//! The addresses provider is the single entry point: the price oracle and
//! the lending pool are always resolved through it.

use alloy::sol;

sol! {
    /// Registry of the market's core contract addresses.
    #[sol(rpc)]
    interface ILendingPoolAddressesProvider {
        function getLendingPool() external view returns (address);
        function getPriceOracle() external view returns (address);
    }
}

sol! {
    /// Aave price oracle (prices quoted in ETH wei).
    #[sol(rpc)]
    interface IPriceOracle {
        function getAssetPrice(address asset) external view returns (uint256);
        function getAssetsPrices(address[] calldata assets) external view returns (uint256[] memory);
        function getFallbackOracle() external view returns (address);
    }
}

sol! {
    /// Secondary price source used when a primary source is missing.
    #[sol(rpc)]
    interface IFallbackOracle {
        function getAssetPrice(address asset) external view returns (uint256);
    }
}

sol! {
    /// Lending pool (subset used for flash-loan detection).
    interface ILendingPool {
        function flashLoan(
            address receiverAddress,
            address[] calldata assets,
            uint256[] calldata amounts,
            uint256[] calldata modes,
            address onBehalfOf,
            bytes calldata params,
            uint16 referralCode
        ) external;
    }
}

sol! {
    /// Aave Governance V2 (subset used for execution tracking).
    interface IAaveGovernanceV2 {
        event ProposalExecuted(uint256 id, address indexed initiatorExecution);
    }
}
