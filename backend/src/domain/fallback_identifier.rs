//! Deterministic identifier used when the ledger cannot issue one.

use sha2::{Digest, Sha256};

use super::{DrugIdentifier, DrugSubmission};

/// Lower-case hex SHA-256 of `name ‖ batch ‖ manufacturer ‖ expiry`.
///
/// Fields are concatenated without separators and the expiry is rendered in
/// decimal, so the digest is reproducible by any client holding the same
/// fields.
///
/// # Examples
/// ```
/// use medverify::domain::derive_fallback_digest;
///
/// let digest = derive_fallback_digest("Paracetamol", "B100", "Acme", 1_735_689_600);
/// assert_eq!(digest.len(), 64);
/// ```
pub fn derive_fallback_digest(
    name: &str,
    batch: &str,
    manufacturer_name: &str,
    expiry_timestamp: i64,
) -> String {
    hex::encode(digest(name, batch, manufacturer_name, expiry_timestamp))
}

/// Canonical fallback identifier for a submission.
pub fn fallback_identifier(submission: &DrugSubmission) -> DrugIdentifier {
    DrugIdentifier::from_digest(digest(
        submission.name().as_ref(),
        submission.batch().as_ref(),
        submission.manufacturer_name(),
        submission.expiry().timestamp(),
    ))
}

fn digest(name: &str, batch: &str, manufacturer_name: &str, expiry_timestamp: i64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(batch.as_bytes());
    hasher.update(manufacturer_name.as_bytes());
    hasher.update(expiry_timestamp.to_string().as_bytes());
    hasher.finalize().into()
}
