//! Manufacturer login credentials.
//!
//! Handlers build these from raw form input before talking to the login
//! port, so blank fields never reach persistence.

use std::fmt;

use zeroize::Zeroizing;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
    /// Government code was missing or blank once trimmed.
    EmptyGovCode,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::EmptyGovCode => write!(f, "government code must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated manufacturer login credentials.
///
/// ## Invariants
/// - `email` and `gov_code` are trimmed and non-empty.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use medverify::domain::ManufacturerCredentials;
///
/// let creds = ManufacturerCredentials::try_from_parts(" ops@acme.test ", "pw", "MED-AB12Z")
///     .expect("valid credentials");
/// assert_eq!(creds.email(), "ops@acme.test");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerCredentials {
    email: String,
    password: Zeroizing<String>,
    gov_code: String,
}

impl ManufacturerCredentials {
    pub fn try_from_parts(
        email: &str,
        password: &str,
        gov_code: &str,
    ) -> Result<Self, LoginValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        let gov_code = gov_code.trim();
        if gov_code.is_empty() {
            return Err(LoginValidationError::EmptyGovCode);
        }

        Ok(Self {
            email: email.to_owned(),
            password: Zeroizing::new(password.to_owned()),
            gov_code: gov_code.to_owned(),
        })
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    pub fn gov_code(&self) -> &str {
        self.gov_code.as_str()
    }
}
