use thiserror::Error;

use crate::mx::MxError;

/// Faults the engine cannot classify. [`Verifier::verify`](super::Verifier::verify)
/// turns them into `unknown/verification_error` instead of returning them.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("DNS resolver unavailable: {source}")]
    Resolver {
        #[source]
        source: MxError,
    },
}

impl VerifyError {
    pub fn resolver(source: MxError) -> Self {
        Self::Resolver { source }
    }
}
