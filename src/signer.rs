use crate::enclave::Enclave;
use sha2::{Digest, Sha256};

/// The algorithm identifier for enclave produced signatures.
///
/// Deliberately distinct from the standard JOSE names so a verifier routes
/// these tokens to an enclave compatible check instead of a stock ECDSA one.
pub const ALGORITHM: &str = "MPC256";

/// A pluggable signing algorithm for compact signed tokens.
///
/// Implementations sign and verify the `header.payload` signing input of a
/// token. Injected into the issuer rather than registered globally.
pub trait SigningMethod {
    /// The identifier placed in the token header's `alg` field.
    fn algorithm(&self) -> &str;

    /// Sign the given signing input.
    fn sign(&self, signing_input: &str) -> Result<Vec<u8>, SigningError>;

    /// Check a signature over the given signing input.
    ///
    /// Returns `Ok(false)` when the signature simply does not match.
    fn verify(&self, signing_input: &str, signature: &[u8]) -> Result<bool, VerifyError>;
}

/// A signing method backed by a threshold signing enclave.
///
/// The signing input is digested with SHA-256 and the digest is what the
/// enclave signs. Failed sign calls are not retried; retry policy belongs to
/// the caller.
pub struct EnclaveSigner<'a, E> {
    enclave: &'a E,
}

impl<'a, E: Enclave> EnclaveSigner<'a, E> {
    pub fn new(enclave: &'a E) -> Self {
        Self { enclave }
    }
}

impl<E: Enclave> SigningMethod for EnclaveSigner<'_, E> {
    fn algorithm(&self) -> &str {
        ALGORITHM
    }

    fn sign(&self, signing_input: &str) -> Result<Vec<u8>, SigningError> {
        let digest = Sha256::digest(signing_input.as_bytes());
        self.enclave.sign(&digest).map_err(|e| SigningError::SigningFailed(e.to_string()))
    }

    fn verify(&self, signing_input: &str, signature: &[u8]) -> Result<bool, VerifyError> {
        let digest = Sha256::digest(signing_input.as_bytes());
        self.enclave.verify(&digest, signature).map_err(|e| VerifyError::VerificationFailed(e.to_string()))
    }
}

/// An error that can occur when signing a token.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// An error that can occur when checking a token signature.
///
/// Distinct from a signature that merely does not match, which is a normal
/// negative result.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("verification failed: {0}")]
    VerificationFailed(String),
}
