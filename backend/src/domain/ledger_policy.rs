//! Disposition of ledger failures at the reconciler boundary.
//!
//! Registration and lookup consult these tables instead of matching on
//! adapter errors inline, so the treatment of each failure kind is visible
//! in one place and can be changed without touching the reconcilers.

use std::fmt;

use super::ports::LedgerError;

/// Ledger failure category, independent of adapter detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerFailureKind {
    Unavailable,
    Timeout,
    Rejected,
    NotFound,
}

impl From<&LedgerError> for LedgerFailureKind {
    fn from(value: &LedgerError) -> Self {
        match value {
            LedgerError::Unavailable { .. } => Self::Unavailable,
            LedgerError::Timeout { .. } => Self::Timeout,
            LedgerError::Rejected { .. } => Self::Rejected,
            LedgerError::NotFound => Self::NotFound,
        }
    }
}

impl LedgerFailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Timeout => "timeout",
            Self::Rejected => "rejected",
            Self::NotFound => "not_found",
        }
    }
}

impl fmt::Display for LedgerFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a registration does after a failed ledger submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationDisposition {
    /// Derive the identifier locally and carry on.
    Fallback,
    /// Abort the registration with the ledger error.
    Propagate,
}

/// What a lookup does after a failed ledger fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupDisposition {
    /// Treat the ledger as having no record and consult the store.
    Miss,
    /// Abort the lookup with the ledger error.
    Propagate,
}

/// Every ledger failure falls back; the store is always written.
pub const fn registration_disposition(kind: LedgerFailureKind) -> RegistrationDisposition {
    match kind {
        LedgerFailureKind::Unavailable
        | LedgerFailureKind::Timeout
        | LedgerFailureKind::Rejected
        | LedgerFailureKind::NotFound => RegistrationDisposition::Fallback,
    }
}

/// Every ledger failure is a miss; the store decides the outcome.
pub const fn lookup_disposition(kind: LedgerFailureKind) -> LookupDisposition {
    match kind {
        LedgerFailureKind::Unavailable
        | LedgerFailureKind::Timeout
        | LedgerFailureKind::Rejected
        | LedgerFailureKind::NotFound => LookupDisposition::Miss,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LedgerError::unavailable("down"), LedgerFailureKind::Unavailable)]
    #[case(LedgerError::timeout(30_000_u64), LedgerFailureKind::Timeout)]
    #[case(LedgerError::rejected("reverted"), LedgerFailureKind::Rejected)]
    #[case(LedgerError::not_found(), LedgerFailureKind::NotFound)]
    fn classifies_errors(#[case] error: LedgerError, #[case] expected: LedgerFailureKind) {
        let kind = LedgerFailureKind::from(&error);
        assert_eq!(kind, expected);
        assert_eq!(registration_disposition(kind), RegistrationDisposition::Fallback);
        assert_eq!(lookup_disposition(kind), LookupDisposition::Miss);
    }
}
