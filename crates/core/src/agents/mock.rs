//! In-memory `PriceOracle` for agent tests.

use alloy::primitives::{address, Address, U256};
use anyhow::{bail, Result};
use async_trait::async_trait;
use sentinel_chain::PriceOracle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const PRICE_ORACLE: Address = address!("a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1");
pub const FALLBACK_ORACLE: Address = address!("a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2a2");
pub const LENDING_POOL: Address = address!("a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3a3");

#[derive(Debug, Default)]
pub struct MockOracle {
    primary: Mutex<HashMap<Address, U256>>,
    fallback: Mutex<HashMap<Address, U256>>,
    calls: AtomicUsize,
    fail: Mutex<bool>,
    blocks: Mutex<Vec<Option<u64>>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, asset: Address, price: u64) {
        self.primary.lock().unwrap().insert(asset, U256::from(price));
    }

    pub fn set_fallback_price(&self, asset: Address, price: u64) {
        self.fallback.lock().unwrap().insert(asset, U256::from(price));
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Number of RPC-equivalent calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Block argument of every price read, in call order.
    pub fn price_blocks(&self) -> Vec<Option<u64>> {
        self.blocks.lock().unwrap().clone()
    }

    fn record_block(&self, block: Option<u64>) {
        self.blocks.lock().unwrap().push(block);
    }

    fn record(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail.lock().unwrap() {
            bail!("mock oracle unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl PriceOracle for MockOracle {
    async fn price_oracle(&self) -> Result<Address> {
        self.record()?;
        Ok(PRICE_ORACLE)
    }

    async fn lending_pool(&self) -> Result<Address> {
        self.record()?;
        Ok(LENDING_POOL)
    }

    async fn fallback_oracle(&self, price_oracle: Address) -> Result<Address> {
        self.record()?;
        assert_eq!(price_oracle, PRICE_ORACLE);
        Ok(FALLBACK_ORACLE)
    }

    async fn assets_prices(
        &self,
        oracle: Address,
        assets: &[Address],
        block: Option<u64>,
    ) -> Result<Vec<U256>> {
        self.record()?;
        self.record_block(block);
        assert_eq!(oracle, PRICE_ORACLE);
        let primary = self.primary.lock().unwrap();
        Ok(assets
            .iter()
            .map(|a| primary.get(a).copied().unwrap_or_default())
            .collect())
    }

    async fn fallback_price(
        &self,
        fallback_oracle: Address,
        asset: Address,
        block: Option<u64>,
    ) -> Result<U256> {
        self.record()?;
        self.record_block(block);
        assert_eq!(fallback_oracle, FALLBACK_ORACLE);
        Ok(self
            .fallback
            .lock()
            .unwrap()
            .get(&asset)
            .copied()
            .unwrap_or_default())
    }
}
