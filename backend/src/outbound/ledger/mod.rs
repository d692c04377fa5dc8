//! Live ledger adapter speaking Ethereum JSON-RPC to a `DrugContract`.
//!
//! Registration sends `registerDrug(...)` from the node's first unlocked
//! account with `eth_sendTransaction`, then polls
//! `eth_getTransactionReceipt` until the receipt appears or the
//! confirmation bound elapses. The contract's `DrugRegistered` event
//! carries the drug id (first indexed topic) and the registered fields
//! (log data). Lookups read the same event back from the receipt of the
//! registering transaction.

pub mod abi;
pub mod connection;
pub mod rpc;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

pub use self::connection::{ConnectionState, LedgerConnection};
pub use self::rpc::{HttpRpcTransport, RpcError, RpcTransport};
use self::rpc::millis;
use crate::domain::ports::{LedgerClient, LedgerDrug, LedgerError, LedgerReceipt};
use crate::domain::{DrugIdentifier, DrugSubmission};

/// Invalid live-ledger settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerConfigError {
    #[error("invalid contract address: {address}")]
    InvalidContractAddress { address: String },
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// Timing and contract settings for [`JsonRpcLedgerClient`].
#[derive(Debug, Clone)]
pub struct LedgerClientConfig {
    pub contract_address: String,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl LedgerClientConfig {
    /// Defaults: 120 s confirmation bound, polled every second.
    pub fn new(contract_address: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// `0x` followed by 40 hex digits.
fn is_contract_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|digits| digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit()))
}

struct RegistrationLog<'a> {
    drug_id: String,
    data: &'a str,
}

pub struct JsonRpcLedgerClient {
    connection: Arc<LedgerConnection>,
    contract_address: String,
    registered_topic: String,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl JsonRpcLedgerClient {
    /// # Errors
    ///
    /// Rejects malformed contract addresses and a zero poll interval.
    pub fn new(
        connection: Arc<LedgerConnection>,
        config: LedgerClientConfig,
    ) -> Result<Self, LedgerConfigError> {
        if !is_contract_address(&config.contract_address) {
            return Err(LedgerConfigError::InvalidContractAddress {
                address: config.contract_address,
            });
        }
        if config.poll_interval.is_zero() {
            return Err(LedgerConfigError::ZeroPollInterval);
        }
        Ok(Self {
            connection,
            contract_address: config.contract_address.to_ascii_lowercase(),
            registered_topic: abi::event_topic(abi::DRUG_REGISTERED_SIGNATURE),
            confirmation_timeout: config.confirmation_timeout,
            poll_interval: config.poll_interval,
        })
    }

    async fn receipt(&self, tx_hash: &str) -> Result<Value, LedgerError> {
        self.connection
            .transport()
            .call("eth_getTransactionReceipt", json!([tx_hash]))
            .await
            .map_err(LedgerError::from)
    }

    async fn await_receipt(&self, tx_hash: &str) -> Result<Value, LedgerError> {
        let started = Instant::now();
        loop {
            let receipt = self.receipt(tx_hash).await?;
            if !receipt.is_null() {
                return Ok(receipt);
            }
            let elapsed = started.elapsed();
            if elapsed >= self.confirmation_timeout {
                return Err(LedgerError::timeout(millis(elapsed)));
            }
            let remaining = self.confirmation_timeout.saturating_sub(elapsed);
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }

    fn registration_log<'a>(&self, receipt: &'a Value) -> Option<RegistrationLog<'a>> {
        receipt.get("logs")?.as_array()?.iter().find_map(|log| {
            let address = log.get("address")?.as_str()?;
            if !address.eq_ignore_ascii_case(&self.contract_address) {
                return None;
            }
            let mut topics = log.get("topics")?.as_array()?.iter().filter_map(Value::as_str);
            if !topics.next()?.eq_ignore_ascii_case(&self.registered_topic) {
                return None;
            }
            let drug_id = topics.next()?.to_ascii_lowercase();
            let data = log.get("data")?.as_str()?;
            Some(RegistrationLog { drug_id, data })
        })
    }
}

fn is_reverted(receipt: &Value) -> bool {
    receipt.get("status").and_then(Value::as_str) == Some("0x0")
}

#[async_trait]
impl LedgerClient for JsonRpcLedgerClient {
    async fn submit(&self, submission: &DrugSubmission) -> Result<LedgerReceipt, LedgerError> {
        let account = self.connection.sending_account().await?;
        let expiry = u64::try_from(submission.expiry().timestamp())
            .map_err(|_| LedgerError::rejected("expiry precedes the Unix epoch"))?;
        let calldata = abi::register_drug_calldata(
            submission.name().as_ref(),
            submission.batch().as_ref(),
            submission.manufacturer_name(),
            expiry,
        );
        let tx = json!({
            "from": account,
            "to": self.contract_address,
            "data": abi::to_hex(&calldata),
        });

        let sent = self
            .connection
            .transport()
            .call("eth_sendTransaction", json!([tx]))
            .await?;
        let tx_hash = sent
            .as_str()
            .ok_or_else(|| LedgerError::unavailable("eth_sendTransaction returned a non-string result"))?
            .to_ascii_lowercase();
        debug!(tx_hash, "ledger transaction sent; awaiting receipt");

        let receipt = self.await_receipt(&tx_hash).await?;
        if is_reverted(&receipt) {
            return Err(LedgerError::rejected(format!("transaction {tx_hash} reverted")));
        }

        let drug_id = self.registration_log(&receipt).map(|log| log.drug_id);
        info!(tx_hash, drug_id = drug_id.as_deref(), "ledger registration confirmed");
        Ok(LedgerReceipt {
            confirmation_id: tx_hash,
            drug_id,
        })
    }

    async fn fetch(&self, confirmation_id: &DrugIdentifier) -> Result<LedgerDrug, LedgerError> {
        self.connection.ensure_connected().await?;
        let receipt = self.receipt(confirmation_id.as_ref()).await?;
        if receipt.is_null() {
            return Err(LedgerError::not_found());
        }
        let log = self
            .registration_log(&receipt)
            .ok_or_else(LedgerError::not_found)?;
        let fields = abi::from_hex(log.data)
            .and_then(|bytes| abi::decode_drug_fields(&bytes))
            .map_err(|err| LedgerError::unavailable(format!("undecodable registration event: {err}")))?;

        Ok(LedgerDrug {
            name: fields.name,
            batch: fields.batch,
            manufacturer_name: fields.manufacturer,
            expiry_timestamp: i64::try_from(fields.expiry).unwrap_or(i64::MAX),
        })
    }
}

#[cfg(test)]
mod tests;
