//! Port for producing the public verification artifact of a drug.
//!
//! The artifact is the fixed-format link back to the verification page; it
//! is what gets stored on the drug record. Rendering it into an image is left
//! to whoever prints the packaging.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::DrugIdentifier;

define_port_error! {
    pub enum ArtifactError {
        Generation { message: String } => "verification artifact generation failed: {message}",
    }
}

/// Content of a generated artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationArtifact {
    /// Verification link the artifact encodes.
    pub url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationArtifactGenerator: Send + Sync {
    /// Public verification link for `identifier`.
    fn verification_url(&self, identifier: &DrugIdentifier) -> String;

    async fn generate(
        &self,
        identifier: &DrugIdentifier,
    ) -> Result<VerificationArtifact, ArtifactError>;
}
