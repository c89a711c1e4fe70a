//! Reports executed Aave governance proposals.

use alloy::primitives::Address;
use anyhow::Result;
use async_trait::async_trait;
use sentinel_chain::contracts::IAaveGovernanceV2::ProposalExecuted;
use sentinel_chain::TransactionEvent;

use super::TransactionAgent;
use crate::alert::{Alert, AlertType, Severity};

pub const ALERT_ID: &str = "AAVE-GOV-EXEC";

pub struct GovernanceAgent {
    governance: Address,
}

impl GovernanceAgent {
    pub fn new(governance: Address) -> Self {
        Self { governance }
    }
}

#[async_trait]
impl TransactionAgent for GovernanceAgent {
    fn name(&self) -> &'static str {
        "governance"
    }

    async fn handle_transaction(&mut self, tx: &TransactionEvent) -> Result<Vec<Alert>> {
        Ok(tx
            .filter_log::<ProposalExecuted>(self.governance)
            .into_iter()
            .map(|event| {
                let initiator = event.initiatorExecution.to_checksum(None);
                Alert::new(
                    ALERT_ID,
                    "Aave Governance Proposal is EXECUTED",
                    format!(
                        "Aave governance proposal with id {} is executed by {}",
                        event.id, initiator
                    ),
                    AlertType::Info,
                    Severity::Info,
                )
                .with_u256("id", event.id)
                .with("initiator_execution", initiator)
            })
            .collect())
    }
}
