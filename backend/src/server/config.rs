//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::cookie::{Key, SameSite};
use medverify::domain::ports::{DisabledLedgerClient, LedgerClient};
use medverify::outbound::persistence::DbPool;
use url::Url;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) public_base: Url,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) ledger: Arc<dyn LedgerClient>,
}

impl ServerConfig {
    /// Start from the session and binding settings; the ledger is disabled
    /// and drugs stay in memory until configured otherwise.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, bind_addr: SocketAddr, public_base: Url) -> Self {
        Self {
            key,
            cookie_secure,
            same_site: SameSite::Lax,
            bind_addr,
            public_base,
            db_pool: None,
            ledger: Arc::new(DisabledLedgerClient),
        }
    }

    /// Attach a database connection pool for persistence adapters.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerClient>) -> Self {
        self.ledger = ledger;
        self
    }
}
