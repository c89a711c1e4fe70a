//! Block and transaction events delivered to agents.
//!
//! A [`TransactionEvent`] carries the top-level call, the internal calls
//! recorded by a block trace, and the receipt logs. It exposes typed filters
//! keyed by a `sol!` call or event type and the contract address it must
//! target or originate from.

use alloy::primitives::{Address, Bytes, Log, B256};
use alloy::sol_types::{SolCall, SolEvent};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A new block observed by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEvent {
    /// Block number
    pub number: u64,
    /// Block timestamp (seconds since epoch)
    pub timestamp: u64,
}

impl BlockEvent {
    pub fn new(number: u64, timestamp: u64) -> Self {
        Self { number, timestamp }
    }
}

/// A message call made while executing a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallFrame {
    /// Caller
    pub from: Address,
    /// Callee (None for contract creation)
    pub to: Option<Address>,
    /// Call input
    pub input: Bytes,
}

/// A mined transaction with its internal calls and receipt logs.
#[derive(Debug, Clone, Default)]
pub struct TransactionEvent {
    /// Transaction hash
    pub hash: B256,
    /// Block the transaction was included in
    pub block_number: u64,
    /// Sender
    pub from: Address,
    /// Recipient (None for contract creation)
    pub to: Option<Address>,
    /// Call input
    pub input: Bytes,
    /// Internal calls in execution order, excluding the top-level call.
    /// Empty when the node serves no call traces.
    pub calls: Vec<CallFrame>,
    /// Logs emitted during execution
    pub logs: Vec<Log>,
}

fn has_selector(input: &Bytes, selector: [u8; 4]) -> bool {
    input.len() >= 4 && input[..4] == selector
}

impl TransactionEvent {
    /// Top-level call followed by every internal call, as `(to, input)`.
    fn frames(&self) -> impl Iterator<Item = (Option<Address>, &Bytes)> {
        std::iter::once((self.to, &self.input))
            .chain(self.calls.iter().map(|call| (call.to, &call.input)))
    }

    /// Whether the transaction or any of its internal calls starts with the
    /// given 4-byte selector.
    pub fn calls_selector(&self, selector: [u8; 4]) -> bool {
        self.frames().any(|(_, input)| has_selector(input, selector))
    }

    /// Decode every call to `target` as `C`, top-level call first.
    ///
    /// Inputs that carry the selector but fail ABI decoding are dropped.
    pub fn filter_function<C: SolCall>(&self, target: Address) -> Vec<C> {
        self.frames()
            .filter(|(to, input)| *to == Some(target) && has_selector(input, C::SELECTOR))
            .filter_map(|(_, input)| match C::abi_decode(input, true) {
                Ok(call) => Some(call),
                Err(e) => {
                    debug!(
                        tx = %self.hash,
                        function = C::SIGNATURE,
                        error = %e,
                        "Selector matched but input failed to decode"
                    );
                    None
                }
            })
            .collect()
    }

    /// Decode every log emitted by `emitter` whose first topic is `E`'s signature.
    pub fn filter_log<E: SolEvent>(&self, emitter: Address) -> Vec<E> {
        self.logs
            .iter()
            .filter(|log| log.address == emitter)
            .filter(|log| log.data.topics().first() == Some(&E::SIGNATURE_HASH))
            .filter_map(|log| match E::decode_log_data(&log.data, true) {
                Ok(event) => Some(event),
                Err(e) => {
                    debug!(
                        tx = %self.hash,
                        event = E::SIGNATURE,
                        error = %e,
                        "Topic matched but log failed to decode"
                    );
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{IAaveGovernanceV2, ILendingPool, IPriceOracle};
    use alloy::primitives::{LogData, U256};

    fn pool() -> Address {
        Address::repeat_byte(0x11)
    }

    fn flash_loan_input() -> Bytes {
        ILendingPool::flashLoanCall {
            receiverAddress: Address::repeat_byte(0x33),
            assets: vec![Address::repeat_byte(0x01), Address::repeat_byte(0x02)],
            amounts: vec![U256::from(2_000_000u64), U256::from(2_000_000u64)],
            modes: vec![U256::from(1u64)],
            onBehalfOf: Address::ZERO,
            params: Bytes::new(),
            referralCode: 0,
        }
        .abi_encode()
        .into()
    }

    #[test]
    fn test_filter_function_matches_target_and_selector() {
        let tx = TransactionEvent {
            to: Some(pool()),
            input: flash_loan_input(),
            ..Default::default()
        };

        let calls = tx.filter_function::<ILendingPool::flashLoanCall>(pool());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].receiverAddress, Address::repeat_byte(0x33));
        assert_eq!(calls[0].assets.len(), 2);
    }

    #[test]
    fn test_filter_function_wrong_target() {
        let tx = TransactionEvent {
            to: Some(Address::repeat_byte(0x33)),
            input: flash_loan_input(),
            ..Default::default()
        };

        assert!(tx.filter_function::<ILendingPool::flashLoanCall>(pool()).is_empty());
    }

    #[test]
    fn test_filter_function_wrong_selector() {
        let tx = TransactionEvent {
            to: Some(pool()),
            input: Bytes::from(vec![0u8; 5]),
            ..Default::default()
        };

        assert!(tx.filter_function::<ILendingPool::flashLoanCall>(pool()).is_empty());
        assert!(tx.filter_function::<IPriceOracle::getFallbackOracleCall>(pool()).is_empty());
    }

    #[test]
    fn test_filter_function_no_arguments() {
        let tx = TransactionEvent {
            to: Some(pool()),
            input: IPriceOracle::getFallbackOracleCall {}.abi_encode().into(),
            ..Default::default()
        };

        assert_eq!(
            tx.filter_function::<IPriceOracle::getFallbackOracleCall>(pool()).len(),
            1
        );
    }

    #[test]
    fn test_filter_function_internal_call() {
        // A contract calls the pool on behalf of the sender
        let bot = Address::repeat_byte(0xB0);
        let tx = TransactionEvent {
            to: Some(bot),
            input: Bytes::from(vec![0x12, 0x34, 0x56, 0x78]),
            calls: vec![
                CallFrame {
                    from: bot,
                    to: Some(Address::repeat_byte(0x55)),
                    input: Bytes::new(),
                },
                CallFrame {
                    from: bot,
                    to: Some(pool()),
                    input: flash_loan_input(),
                },
            ],
            ..Default::default()
        };

        assert!(tx.calls_selector(ILendingPool::flashLoanCall::SELECTOR));
        let calls = tx.filter_function::<ILendingPool::flashLoanCall>(pool());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].receiverAddress, Address::repeat_byte(0x33));

        // Matches are per call, so the frame addressed to the bot is not one
        assert!(tx.filter_function::<ILendingPool::flashLoanCall>(bot).is_empty());
    }

    #[test]
    fn test_filter_function_every_matching_call() {
        let tx = TransactionEvent {
            to: Some(pool()),
            input: flash_loan_input(),
            calls: vec![CallFrame {
                from: Address::repeat_byte(0x33),
                to: Some(pool()),
                input: flash_loan_input(),
            }],
            ..Default::default()
        };

        assert_eq!(tx.filter_function::<ILendingPool::flashLoanCall>(pool()).len(), 2);
    }

    #[test]
    fn test_filter_log() {
        let governance = Address::repeat_byte(0xEC);
        let executed = IAaveGovernanceV2::ProposalExecuted {
            id: U256::from(42u64),
            initiatorExecution: Address::repeat_byte(0x77),
        };

        let tx = TransactionEvent {
            logs: vec![
                Log {
                    address: governance,
                    data: executed.encode_log_data(),
                },
                // Same event from another contract
                Log {
                    address: Address::repeat_byte(0x10),
                    data: executed.encode_log_data(),
                },
                // Unrelated topic from the governance contract
                Log {
                    address: governance,
                    data: LogData::new_unchecked(vec![B256::repeat_byte(0x10)], Bytes::new()),
                },
            ],
            ..Default::default()
        };

        let events = tx.filter_log::<IAaveGovernanceV2::ProposalExecuted>(governance);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, U256::from(42u64));
        assert_eq!(events[0].initiatorExecution, Address::repeat_byte(0x77));
    }
}
