/// The human readable prefix of derived addresses.
const ADDRESS_PREFIX: &str = "mpc1";

/// The DID method prefix for issuer identities.
const DID_PREFIX: &str = "did:mpc:";

/// How many leading public key bytes feed the address.
const ADDRESS_KEY_BYTES: usize = 20;

/// The identity of a token issuer, derived from its enclave's public key.
///
/// Derived once at service construction and immutable afterwards; the DID is
/// the `iss` value of every issued token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuerIdentity {
    /// The issuer DID.
    pub did: String,

    /// The issuer's address.
    pub address: String,
}

impl IssuerIdentity {
    /// Derive the identity for the given public key bytes.
    ///
    /// Deterministic: the same key always yields the same identity.
    pub fn derive(public_key: &[u8]) -> Result<Self, IdentityError> {
        if public_key.is_empty() {
            return Err(IdentityError::EmptyPublicKey);
        }
        if public_key.len() < ADDRESS_KEY_BYTES {
            return Err(IdentityError::KeyTooShort(public_key.len()));
        }
        let address = format!("{ADDRESS_PREFIX}{}", hex::encode(&public_key[..ADDRESS_KEY_BYTES]));
        let did = format!("{DID_PREFIX}{address}");
        Ok(Self { did, address })
    }
}

/// An error when deriving an issuer identity.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("empty public key bytes")]
    EmptyPublicKey,

    #[error("public key too short: {0} bytes")]
    KeyTooShort(usize),
}
