use super::{Enclave, EnclaveError};

/// An enclave whose key material never became usable.
pub(crate) struct InvalidEnclave;

impl Enclave for InvalidEnclave {
    fn is_valid(&self) -> bool {
        false
    }

    fn public_key(&self) -> Vec<u8> {
        vec![0x02; 33]
    }

    fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        Err(EnclaveError::new("enclave is not valid"))
    }

    fn verify(&self, _message: &[u8], _signature: &[u8]) -> Result<bool, EnclaveError> {
        Err(EnclaveError::new("enclave is not valid"))
    }
}
