//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `MEDVERIFY_*` environment variables, and an
//! optional configuration file, in that order of precedence.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080/";
const DEFAULT_CONFIRMATION_TIMEOUT_MS: u64 = 120_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// A setting that is present but unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value}: {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid URL in {field}: {message}")]
    Url { field: &'static str, message: String },
    #[error("{field} is required when the ledger is enabled")]
    MissingLedgerField { field: &'static str },
}

/// Process-wide settings for the HTTP server and the admin CLI.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MEDVERIFY")]
pub struct AppSettings {
    /// Socket address the HTTP server listens on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string. Without it the server keeps drugs in
    /// memory.
    pub database_url: Option<String>,
    /// File holding the session signing key material.
    pub session_key_file: Option<PathBuf>,
    /// Allow a generated session key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    /// Send session cookies with the `Secure` attribute. Defaults to on.
    pub cookie_secure: Option<bool>,
    /// Base of the public verification links.
    pub public_base_url: Option<String>,
    /// Submit registrations to the ledger node.
    #[ortho_config(default = false)]
    pub ledger_enabled: bool,
    pub ledger_rpc_url: Option<String>,
    pub ledger_contract_address: Option<String>,
    pub ledger_confirmation_timeout_ms: Option<u64>,
    pub ledger_poll_interval_ms: Option<u64>,
    pub ledger_request_timeout_ms: Option<u64>,
}

/// Resolved ledger block, present only when the ledger is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    pub rpc_url: Url,
    pub contract_address: String,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|err| SettingsError::Url {
        field,
        message: err.to_string(),
    })
}

impl AppSettings {
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }

    /// # Errors
    ///
    /// Returns [`SettingsError::Url`] when the base does not parse.
    pub fn public_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            "public_base_url",
            self.public_base_url
                .as_deref()
                .unwrap_or(DEFAULT_PUBLIC_BASE_URL),
        )
    }

    /// Ledger settings, or `None` when the ledger is disabled.
    ///
    /// # Errors
    ///
    /// An enabled ledger needs both an RPC URL and a contract address.
    pub fn ledger(&self) -> Result<Option<LedgerSettings>, SettingsError> {
        if !self.ledger_enabled {
            return Ok(None);
        }
        let rpc_url = self
            .ledger_rpc_url
            .as_deref()
            .ok_or(SettingsError::MissingLedgerField {
                field: "ledger_rpc_url",
            })?;
        let contract_address =
            self.ledger_contract_address
                .clone()
                .ok_or(SettingsError::MissingLedgerField {
                    field: "ledger_contract_address",
                })?;
        Ok(Some(LedgerSettings {
            rpc_url: parse_url("ledger_rpc_url", rpc_url)?,
            contract_address,
            confirmation_timeout: Duration::from_millis(
                self.ledger_confirmation_timeout_ms
                    .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT_MS),
            ),
            poll_interval: Duration::from_millis(
                self.ledger_poll_interval_ms
                    .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            request_timeout: Duration::from_millis(
                self.ledger_request_timeout_ms
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            ),
        }))
    }
}
