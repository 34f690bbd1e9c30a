use crate::enclave::{Enclave, EnclaveError};
use sha2::{Digest, Sha256};

/// The length of a derived chain code, in bytes.
pub const CHAIN_CODE_LEN: usize = 32;

/// Derive the chain code for an enclave: the SHA-256 digest of the enclave's
/// signature over its own address.
///
/// Computed on demand, never cached. The value is stable for a fixed enclave
/// because the signature over a fixed message is deterministic.
pub fn derive_chain_code(
    enclave: &impl Enclave,
    address: &str,
) -> Result<[u8; CHAIN_CODE_LEN], ChainCodeError> {
    if !enclave.is_valid() {
        return Err(ChainCodeError::EnclaveInvalid);
    }
    let signature = enclave.sign(address.as_bytes()).map_err(ChainCodeError::Signing)?;
    Ok(Sha256::digest(&signature).into())
}

/// An error when deriving a chain code.
#[derive(Debug, thiserror::Error)]
pub enum ChainCodeError {
    #[error("enclave is not valid")]
    EnclaveInvalid,

    #[error("failed to sign address for chain code: {0}")]
    Signing(EnclaveError),
}
