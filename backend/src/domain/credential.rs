//! Password credential hashes in the `pbkdf2_sha256$iterations$salt$hash`
//! format, so hashes created by earlier tooling keep verifying.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::Rng as _;
use rand::distributions::Alphanumeric;
use sha2::Sha256;
use subtle::ConstantTimeEq as _;

const ALGORITHM: &str = "pbkdf2_sha256";
const SALT_LEN: usize = 22;
const DIGEST_LEN: usize = 32;
const PLACEHOLDER_SALT: &str = "medverifyplaceholder00";

/// Default work factor for newly created credentials.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Validation errors for stored credential hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialHashError {
    Malformed,
    UnsupportedAlgorithm { algorithm: String },
    InvalidIterations,
}

impl fmt::Display for CredentialHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "credential hash is malformed"),
            Self::UnsupportedAlgorithm { algorithm } => {
                write!(f, "unsupported credential algorithm: {algorithm}")
            }
            Self::InvalidIterations => write!(f, "credential iteration count is invalid"),
        }
    }
}

impl std::error::Error for CredentialHashError {}

/// Salted PBKDF2-HMAC-SHA256 password hash.
///
/// # Examples
/// ```
/// use medverify::domain::CredentialHash;
///
/// let hash = CredentialHash::derive("s3cret", 1_000);
/// assert!(hash.verify("s3cret"));
/// assert!(!hash.verify("guess"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHash {
    encoded: String,
    iterations: u32,
    salt: String,
    digest: Vec<u8>,
}

impl CredentialHash {
    /// Hash `password` with a fresh random salt.
    pub fn derive(password: &str, iterations: u32) -> Self {
        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SALT_LEN)
            .map(char::from)
            .collect();
        Self::with_salt(password, salt, iterations.max(1))
    }

    fn with_salt(password: &str, salt: String, iterations: u32) -> Self {
        let digest = pbkdf2_digest(password, &salt, iterations);
        let encoded = format!(
            "{ALGORITHM}${iterations}${salt}${}",
            STANDARD.encode(digest)
        );
        Self {
            encoded,
            iterations,
            salt,
            digest: digest.to_vec(),
        }
    }

    /// Hash that no password matches, costing `iterations` to check.
    ///
    /// Login verifies against it when no account was found, so a rejection
    /// takes as long as a wrong password.
    pub fn placeholder(iterations: u32) -> Self {
        let iterations = iterations.max(1);
        let salt = PLACEHOLDER_SALT.to_owned();
        let digest = vec![0_u8; DIGEST_LEN];
        Self {
            encoded: format!(
                "{ALGORITHM}${iterations}${salt}${}",
                STANDARD.encode(&digest)
            ),
            iterations,
            salt,
            digest,
        }
    }

    /// Parse a stored hash.
    pub fn parse(encoded: &str) -> Result<Self, CredentialHashError> {
        let mut parts = encoded.split('$');
        let (Some(algorithm), Some(iterations), Some(salt), Some(hash), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(CredentialHashError::Malformed);
        };
        if algorithm != ALGORITHM {
            return Err(CredentialHashError::UnsupportedAlgorithm {
                algorithm: algorithm.to_owned(),
            });
        }
        let iterations = iterations
            .parse::<u32>()
            .ok()
            .filter(|count| *count > 0)
            .ok_or(CredentialHashError::InvalidIterations)?;
        if salt.is_empty() {
            return Err(CredentialHashError::Malformed);
        }
        let digest = STANDARD
            .decode(hash)
            .map_err(|_| CredentialHashError::Malformed)?;
        Ok(Self {
            encoded: encoded.to_owned(),
            iterations,
            salt: salt.to_owned(),
            digest,
        })
    }

    /// Check `password` against the stored digest in constant time.
    pub fn verify(&self, password: &str) -> bool {
        let candidate = pbkdf2_digest(password, &self.salt, self.iterations);
        candidate.as_slice().ct_eq(self.digest.as_slice()).into()
    }

    pub fn as_str(&self) -> &str {
        self.encoded.as_str()
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHash")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

fn pbkdf2_digest(password: &str, salt: &str, iterations: u32) -> [u8; DIGEST_LEN] {
    let mut out = [0_u8; DIGEST_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut out);
    out
}
