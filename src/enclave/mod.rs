mod software;

#[cfg(test)]
pub(crate) mod testing;

pub use software::SoftwareEnclave;

use serde::{Deserialize, Serialize};

/// An opaque threshold signer.
///
/// Implementations hold distributed key share material and can produce and
/// verify signatures without ever exposing a single private key. The core
/// only ever talks to an enclave through these four primitives.
pub trait Enclave {
    /// Whether this enclave holds usable key material.
    fn is_valid(&self) -> bool;

    /// The compressed public key bytes for this enclave's key.
    fn public_key(&self) -> Vec<u8>;

    /// Sign a message.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, EnclaveError>;

    /// Check a signature over a message.
    ///
    /// `Ok(false)` means the signature does not match; `Err` means the check
    /// itself could not be performed.
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, EnclaveError>;
}

/// An enclave that can be reconstructed from exported key share data.
pub trait ImportEnclave: Enclave + Sized {
    /// Reconstruct an enclave from its key share data.
    fn import(data: &EnclaveData) -> Result<Self, ImportError>;
}

/// Exported enclave key share material, handed over by the host at startup.
///
/// The core parses this only far enough to reconstruct an enclave; the share
/// contents stay opaque otherwise.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EnclaveData {
    /// The curve the shares belong to.
    pub curve: String,

    /// The compressed public key the shares reconstruct to.
    #[serde(with = "hex::serde")]
    pub public_key: Vec<u8>,

    /// Hex encoded scalar shares.
    pub shares: Vec<String>,
}

/// An error raised by an enclave primitive.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct EnclaveError(String);

impl EnclaveError {
    /// Construct an error from the underlying signer's message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An error when reconstructing an enclave from its key share data.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("unsupported curve: {0}")]
    UnsupportedCurve(String),

    #[error("no key shares provided")]
    NoShares,

    #[error("invalid share material: {0}")]
    ShareMaterial(String),

    #[error("shares do not reconstruct the declared public key")]
    PublicKeyMismatch,
}
