//! Verification links and the artifacts that carry them.
//!
//! The link format is fixed: `<base>/verify/result/?tx_hash=<identifier>`.
//! The artifact is that link; rendering it as an image happens outside this
//! service.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::domain::DrugIdentifier;
use crate::domain::ports::{ArtifactError, VerificationArtifact, VerificationArtifactGenerator};

const RESULT_PATH: &str = "verify/result/";
const QUERY_KEY: &str = "tx_hash";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactConfigError {
    #[error("public base URL cannot be a base for relative paths: {url}")]
    NotABase { url: String },
    #[error("invalid public base URL: {message}")]
    Invalid { message: String },
}

#[derive(Debug, Clone)]
pub struct LinkArtifactGenerator {
    result_page: Url,
}

impl LinkArtifactGenerator {
    /// # Errors
    ///
    /// Rejects URLs that cannot carry a path, such as `mailto:`.
    pub fn new(public_base: &Url) -> Result<Self, ArtifactConfigError> {
        if public_base.cannot_be_a_base() {
            return Err(ArtifactConfigError::NotABase {
                url: public_base.to_string(),
            });
        }
        let mut base = public_base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);
        let result_page = base.join(RESULT_PATH).map_err(|err| ArtifactConfigError::Invalid {
            message: err.to_string(),
        })?;
        Ok(Self { result_page })
    }
}

#[async_trait]
impl VerificationArtifactGenerator for LinkArtifactGenerator {
    fn verification_url(&self, identifier: &DrugIdentifier) -> String {
        let mut url = self.result_page.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair(QUERY_KEY, identifier.as_ref());
        url.into()
    }

    async fn generate(
        &self,
        identifier: &DrugIdentifier,
    ) -> Result<VerificationArtifact, ArtifactError> {
        let url = self.verification_url(identifier);
        debug!(%identifier, url, "verification artifact prepared");
        Ok(VerificationArtifact { url })
    }
}
