//! Price oracle access.
//!
//! [`PriceOracle`] is the capability agents are constructed with. The
//! production implementation, [`AaveOracleClient`], resolves every contract
//! through the market's `LendingPoolAddressesProvider` and pins price reads
//! to the block of the event being processed.

use alloy::eips::BlockId;
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

use crate::contracts::{IFallbackOracle, ILendingPoolAddressesProvider, IPriceOracle};
use crate::error::ChainError;

/// Read access to Aave price oracles.
#[async_trait]
pub trait PriceOracle: Send + Sync + Debug {
    /// Current price oracle address from the addresses provider.
    async fn price_oracle(&self) -> Result<Address>;

    /// Current lending pool address from the addresses provider.
    async fn lending_pool(&self) -> Result<Address>;

    /// Fallback oracle configured on `price_oracle`.
    async fn fallback_oracle(&self, price_oracle: Address) -> Result<Address>;

    /// `getAssetsPrices(assets)` on `oracle`, one price per asset, in order.
    async fn assets_prices(
        &self,
        oracle: Address,
        assets: &[Address],
        block: Option<u64>,
    ) -> Result<Vec<U256>>;

    /// `getAssetPrice(asset)` on a fallback oracle.
    async fn fallback_price(
        &self,
        fallback_oracle: Address,
        asset: Address,
        block: Option<u64>,
    ) -> Result<U256>;

    /// Single-asset price from `oracle`.
    ///
    /// Defaults to a one-element `getAssetsPrices` read.
    async fn asset_price(&self, oracle: Address, asset: Address, block: Option<u64>) -> Result<U256> {
        let prices = self.assets_prices(oracle, &[asset], block).await?;
        prices.first().copied().ok_or_else(|| {
            anyhow::Error::from(ChainError::PriceCountMismatch {
                oracle,
                expected: 1,
                got: 0,
            })
        })
    }
}

/// [`PriceOracle`] backed by on-chain calls through an alloy provider.
pub struct AaveOracleClient<P> {
    /// LendingPoolAddressesProvider of the monitored market
    addresses_provider: Address,
    /// Provider for RPC calls
    provider: Arc<P>,
}

impl<P> Debug for AaveOracleClient<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AaveOracleClient")
            .field("addresses_provider", &self.addresses_provider)
            .finish()
    }
}

impl<P: Provider + Send + Sync + 'static> AaveOracleClient<P> {
    /// Create a client for the market rooted at `addresses_provider`.
    pub fn new(addresses_provider: Address, provider: Arc<P>) -> Self {
        Self {
            addresses_provider,
            provider,
        }
    }

    pub fn addresses_provider(&self) -> Address {
        self.addresses_provider
    }
}

fn block_id(block: Option<u64>) -> BlockId {
    block.map(BlockId::number).unwrap_or_else(BlockId::latest)
}

#[async_trait]
impl<P: Provider + Send + Sync + 'static> PriceOracle for AaveOracleClient<P> {
    async fn price_oracle(&self) -> Result<Address> {
        let contract = ILendingPoolAddressesProvider::new(self.addresses_provider, &*self.provider);
        let oracle = contract.getPriceOracle().call().await?._0;
        debug!(provider = %self.addresses_provider, oracle = %oracle, "Resolved price oracle");
        Ok(oracle)
    }

    async fn lending_pool(&self) -> Result<Address> {
        let contract = ILendingPoolAddressesProvider::new(self.addresses_provider, &*self.provider);
        let pool = contract.getLendingPool().call().await?._0;
        debug!(provider = %self.addresses_provider, pool = %pool, "Resolved lending pool");
        Ok(pool)
    }

    async fn fallback_oracle(&self, price_oracle: Address) -> Result<Address> {
        let contract = IPriceOracle::new(price_oracle, &*self.provider);
        let fallback = contract.getFallbackOracle().call().await?._0;
        debug!(oracle = %price_oracle, fallback = %fallback, "Resolved fallback oracle");
        Ok(fallback)
    }

    async fn assets_prices(
        &self,
        oracle: Address,
        assets: &[Address],
        block: Option<u64>,
    ) -> Result<Vec<U256>> {
        let contract = IPriceOracle::new(oracle, &*self.provider);
        let prices = contract
            .getAssetsPrices(assets.to_vec())
            .block(block_id(block))
            .call()
            .await?
            ._0;

        if prices.len() != assets.len() {
            return Err(ChainError::PriceCountMismatch {
                oracle,
                expected: assets.len(),
                got: prices.len(),
            }
            .into());
        }

        Ok(prices)
    }

    async fn asset_price(&self, oracle: Address, asset: Address, block: Option<u64>) -> Result<U256> {
        let contract = IPriceOracle::new(oracle, &*self.provider);
        let price = contract
            .getAssetPrice(asset)
            .block(block_id(block))
            .call()
            .await?
            ._0;
        Ok(price)
    }

    async fn fallback_price(
        &self,
        fallback_oracle: Address,
        asset: Address,
        block: Option<u64>,
    ) -> Result<U256> {
        let contract = IFallbackOracle::new(fallback_oracle, &*self.provider);
        let price = contract
            .getAssetPrice(asset)
            .block(block_id(block))
            .call()
            .await?
            ._0;
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Bytes};
    use alloy::providers::{ProviderBuilder, RootProvider};
    use alloy::sol_types::SolValue;
    use alloy::transports::mock::Asserter;

    const ORACLE: Address = address!("a50ba011c48153de246e5192c8f9258a2ba79ca9");
    const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

    fn mocked_client(asserter: Asserter) -> AaveOracleClient<RootProvider> {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .on_mocked_client(asserter);
        AaveOracleClient::new(Address::repeat_byte(0x01), Arc::new(provider))
    }

    #[tokio::test]
    async fn test_asset_price_decodes_single_value() {
        let asserter = Asserter::new();
        asserter.push_success(&Bytes::from(U256::from(1_000_000_000_000_000_000u64).abi_encode()));

        let price = mocked_client(asserter)
            .asset_price(ORACLE, WETH, Some(12_000_000))
            .await
            .unwrap();
        assert_eq!(price, U256::from(1_000_000_000_000_000_000u64));
    }

    #[tokio::test]
    async fn test_assets_prices_count_mismatch() {
        let asserter = Asserter::new();
        asserter.push_success(&Bytes::from(vec![U256::from(1u64), U256::from(2u64)].abi_encode()));

        let err = mocked_client(asserter)
            .assets_prices(ORACLE, &[WETH], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChainError>(),
            Some(ChainError::PriceCountMismatch { expected: 1, got: 2, .. })
        ));
    }

    #[test]
    fn test_block_id_selection() {
        assert_eq!(block_id(Some(100)), BlockId::number(100));
        assert_eq!(block_id(None), BlockId::latest());
    }

    #[tokio::test]
    #[ignore] // Requires network
    async fn test_resolve_mainnet_oracles() {
        let url = std::env::var("RPC_URL").unwrap_or_else(|_| "https://eth.llamarpc.com".to_string());
        let provider = Arc::new(ProviderBuilder::new().on_http(url.parse().unwrap()));
        let client = AaveOracleClient::new(
            address!("b53c1a33016b2dc2ff3653530bff1848a515c8c5"),
            provider,
        );

        let oracle = client.price_oracle().await.unwrap();
        assert_ne!(oracle, Address::ZERO);

        let fallback = client.fallback_oracle(oracle).await.unwrap();
        assert_ne!(fallback, Address::ZERO);

        let single = client.asset_price(oracle, WETH, None).await.unwrap();
        assert_eq!(single, U256::from(10u64).pow(U256::from(18u64)));
    }
}
