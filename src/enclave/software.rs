use super::{Enclave, EnclaveData, EnclaveError, ImportEnclave, ImportError};
use k256::{
    ecdsa::{Signature, SigningKey, VerifyingKey},
    elliptic_curve::{Field, PrimeField},
    NonZeroScalar, Scalar, SecretKey,
};
use signature::{Signer, Verifier};

/// A process local stand-in for a distributed signer.
///
/// Reconstructs a single secp256k1 key from additive scalar shares and signs
/// with plain ECDSA. This is not a threshold signer: it exists so the
/// issuance pipeline can run in development and tests without the external
/// multi-party protocol. Signatures are deterministic (RFC 6979).
#[derive(Debug)]
pub struct SoftwareEnclave {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl SoftwareEnclave {
    /// The only curve this enclave supports.
    pub const CURVE: &'static str = "secp256k1";

    /// Generate a fresh enclave split into `parties` additive shares,
    /// returning it along with its exportable key share data.
    pub fn generate(parties: usize) -> (Self, EnclaveData) {
        let parties = parties.max(1);
        let mut rng = rand::thread_rng();
        let mut shares;
        let mut secret;
        loop {
            shares = Vec::with_capacity(parties);
            secret = Scalar::ZERO;
            for _ in 0..parties {
                let share = *NonZeroScalar::random(&mut rng);
                secret += share;
                shares.push(hex::encode(share.to_repr()));
            }
            if secret != Scalar::ZERO {
                break;
            }
        }
        let secret_key = SecretKey::from_bytes(&secret.to_repr()).expect("secret is non-zero");
        let signing_key: SigningKey = secret_key.into();
        let verifying_key = *signing_key.verifying_key();
        let data = EnclaveData {
            curve: Self::CURVE.into(),
            public_key: verifying_key.to_sec1_bytes().to_vec(),
            shares,
        };
        (Self { signing_key, verifying_key }, data)
    }
}

impl ImportEnclave for SoftwareEnclave {
    fn import(data: &EnclaveData) -> Result<Self, ImportError> {
        if data.curve != Self::CURVE {
            return Err(ImportError::UnsupportedCurve(data.curve.clone()));
        }
        if data.shares.is_empty() {
            return Err(ImportError::NoShares);
        }
        let mut secret = Scalar::ZERO;
        for share in &data.shares {
            secret += decode_scalar(share)?;
        }
        let secret_key = SecretKey::from_bytes(&secret.to_repr())
            .map_err(|_| ImportError::ShareMaterial("shares sum to zero".into()))?;
        let signing_key: SigningKey = secret_key.into();
        let verifying_key = *signing_key.verifying_key();
        if verifying_key.to_sec1_bytes().as_ref() != data.public_key.as_slice() {
            return Err(ImportError::PublicKeyMismatch);
        }
        Ok(Self { signing_key, verifying_key })
    }
}

impl Enclave for SoftwareEnclave {
    fn is_valid(&self) -> bool {
        true
    }

    fn public_key(&self) -> Vec<u8> {
        self.verifying_key.to_sec1_bytes().to_vec()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        let signature: Signature =
            self.signing_key.try_sign(message).map_err(|e| EnclaveError::new(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, EnclaveError> {
        // Malformed signature bytes are a negative result, not a failure.
        let Ok(signature) = Signature::try_from(signature) else {
            return Ok(false);
        };
        Ok(self.verifying_key.verify(message, &signature).is_ok())
    }
}

fn decode_scalar(share: &str) -> Result<Scalar, ImportError> {
    let bytes = hex::decode(share).map_err(|e| ImportError::ShareMaterial(e.to_string()))?;
    let bytes: [u8; 32] =
        bytes.try_into().map_err(|_| ImportError::ShareMaterial("share must be 32 bytes".into()))?;
    Option::<Scalar>::from(Scalar::from_repr(bytes.into()))
        .ok_or_else(|| ImportError::ShareMaterial("share is not a valid scalar".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn import_reconstructs_generated_key() {
        let (enclave, data) = SoftwareEnclave::generate(3);
        assert_eq!(data.shares.len(), 3);

        let imported = SoftwareEnclave::import(&data).expect("import failed");
        assert_eq!(imported.public_key(), enclave.public_key());
        assert!(imported.is_valid());
    }

    #[test]
    fn sign_verify_round_trip() {
        let (enclave, _) = SoftwareEnclave::generate(2);
        let signature = enclave.sign(b"hello").expect("sign failed");
        assert!(enclave.verify(b"hello", &signature).expect("verify failed"));
        assert!(!enclave.verify(b"other", &signature).expect("verify failed"));
    }

    #[test]
    fn garbage_signature_is_negative_not_error() {
        let (enclave, _) = SoftwareEnclave::generate(2);
        assert!(!enclave.verify(b"hello", b"not a signature").expect("verify failed"));
    }

    #[test]
    fn signing_is_deterministic() {
        let (enclave, _) = SoftwareEnclave::generate(2);
        let first = enclave.sign(b"hello").expect("sign failed");
        let second = enclave.sign(b"hello").expect("sign failed");
        assert_eq!(first, second);
    }

    #[test]
    fn tampered_share_is_rejected() {
        let (_, mut data) = SoftwareEnclave::generate(2);
        // Replace one share with another valid scalar: the sum no longer
        // matches the declared public key.
        data.shares[0] = hex::encode([0x01; 32]);
        let err = SoftwareEnclave::import(&data).expect_err("import succeeded");
        assert!(matches!(err, ImportError::PublicKeyMismatch));
    }

    #[test]
    fn zero_sum_shares_are_rejected() {
        let (_, mut data) = SoftwareEnclave::generate(1);
        let share = decode_scalar(&data.shares[0]).unwrap();
        data.shares.push(hex::encode((-share).to_repr()));
        let err = SoftwareEnclave::import(&data).expect_err("import succeeded");
        assert!(matches!(err, ImportError::ShareMaterial(_)));
    }

    #[rstest]
    #[case::wrong_curve("ed25519", vec!["00".repeat(32)], ImportError::UnsupportedCurve(String::new()))]
    #[case::no_shares(SoftwareEnclave::CURVE, vec![], ImportError::NoShares)]
    #[case::bad_hex(SoftwareEnclave::CURVE, vec!["zz".into()], ImportError::ShareMaterial(String::new()))]
    #[case::short_share(SoftwareEnclave::CURVE, vec!["abcd".into()], ImportError::ShareMaterial(String::new()))]
    fn malformed_share_data(
        #[case] curve: &str,
        #[case] shares: Vec<String>,
        #[case] expected: ImportError,
    ) {
        let data = EnclaveData { curve: curve.into(), public_key: vec![0x02; 33], shares };
        let err = SoftwareEnclave::import(&data).expect_err("import succeeded");
        assert_eq!(std::mem::discriminant(&err), std::mem::discriminant(&expected));
    }
}
