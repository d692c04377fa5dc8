//! Explicit lifecycle for the ledger connection.
//!
//! A connection starts `Uninitialised`. `initialise` probes the node once
//! and moves it to `Connected` (with the sending account) or `Unreachable`.
//! Nothing re-probes implicitly; call `initialise` again to retry.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::rpc::RpcTransport;
use crate::domain::ports::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialised,
    Connected { account: String },
    Unreachable { reason: String },
}

pub struct LedgerConnection {
    transport: Arc<dyn RpcTransport>,
    state: Mutex<ConnectionState>,
}

impl LedgerConnection {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            state: Mutex::new(ConnectionState::Uninitialised),
        }
    }

    pub(crate) fn transport(&self) -> &dyn RpcTransport {
        self.transport.as_ref()
    }

    /// Resolve the node's first unlocked account.
    pub async fn initialise(&self) -> ConnectionState {
        let next = match self.transport.call("eth_accounts", json!([])).await {
            Ok(accounts) => first_account(&accounts).map_or_else(
                || ConnectionState::Unreachable {
                    reason: "node exposes no unlocked accounts".to_owned(),
                },
                |account| ConnectionState::Connected { account },
            ),
            Err(err) => ConnectionState::Unreachable {
                reason: err.to_string(),
            },
        };

        match &next {
            ConnectionState::Connected { account } => info!(account, "ledger connected"),
            ConnectionState::Unreachable { reason } => {
                warn!(reason, "ledger unreachable; registrations will use the fallback identifier");
            }
            ConnectionState::Uninitialised => {}
        }

        let mut state = self.state.lock().await;
        *state = next.clone();
        next
    }

    pub async fn state(&self) -> ConnectionState {
        self.state.lock().await.clone()
    }

    /// # Errors
    ///
    /// `LedgerError::Unavailable` unless the connection is `Connected`.
    pub async fn ensure_connected(&self) -> Result<(), LedgerError> {
        self.sending_account().await.map(drop)
    }

    /// Account used as `from` in submitted transactions.
    ///
    /// # Errors
    ///
    /// `LedgerError::Unavailable` unless the connection is `Connected`.
    pub async fn sending_account(&self) -> Result<String, LedgerError> {
        match &*self.state.lock().await {
            ConnectionState::Connected { account } => Ok(account.clone()),
            ConnectionState::Uninitialised => {
                Err(LedgerError::unavailable("ledger connection not initialised"))
            }
            ConnectionState::Unreachable { reason } => Err(LedgerError::unavailable(reason.clone())),
        }
    }
}

fn first_account(accounts: &Value) -> Option<String> {
    accounts
        .as_array()?
        .iter()
        .find_map(Value::as_str)
        .map(str::to_owned)
}
