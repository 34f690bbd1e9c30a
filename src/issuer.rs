use crate::{
    identity::IssuerIdentity,
    signer::{SigningError, SigningMethod},
    token::{to_base64, to_base64_json, Attenuation, TokenClaims, TokenHeader},
};
use chrono::{DateTime, Utc};

/// The inputs for one token issuance.
#[derive(Clone, Debug, Default)]
pub struct TokenRequest {
    /// The DID of the intended holder. Untrusted caller input.
    pub audience: String,

    /// Capability descriptors, carried verbatim.
    pub attenuations: Vec<Attenuation>,

    /// Parent tokens. Empty issues an origin token; a single entry issues a
    /// first order delegation.
    pub proofs: Vec<String>,

    /// Informational facts.
    pub facts: Vec<String>,

    /// The start of the validity window. `None` means unbounded.
    pub not_before: Option<DateTime<Utc>>,

    /// The end of the validity window. `None` means unbounded.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Builds and signs capability tokens on behalf of one issuer identity.
pub struct TokenIssuer<'a, S> {
    identity: &'a IssuerIdentity,
    method: S,
}

impl<'a, S: SigningMethod> TokenIssuer<'a, S> {
    pub fn new(identity: &'a IssuerIdentity, method: S) -> Self {
        Self { identity, method }
    }

    /// Issue a compact signed token for the given request.
    ///
    /// The issuer claim is always this issuer's own DID, never the supplied
    /// audience. Parent proofs are included verbatim and not inspected:
    /// verifying a delegation chain belongs to whoever consumes the token.
    pub fn issue(&self, request: TokenRequest) -> Result<String, IssueError> {
        let TokenRequest { audience, attenuations, proofs, facts, not_before, expires_at } = request;
        if audience.is_empty() {
            return Err(IssueError::MissingAudience);
        }

        let header = TokenHeader::new(self.method.algorithm());
        let claims = TokenClaims {
            issuer: self.identity.did.clone(),
            audience,
            attenuations,
            proofs,
            facts,
            not_before,
            expires_at,
        };

        let header_b64 = to_base64_json(&header).map_err(|e| IssueError::EncodingHeader(e.to_string()))?;
        let claims_b64 = to_base64_json(&claims).map_err(|e| IssueError::EncodingClaims(e.to_string()))?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature = self.method.sign(&signing_input)?;
        let signature_b64 = to_base64(&signature);
        Ok(format!("{signing_input}.{signature_b64}"))
    }
}

/// An error when issuing a token.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("audience DID is required")]
    MissingAudience,

    #[error("encoding header: {0}")]
    EncodingHeader(String),

    #[error("encoding claims: {0}")]
    EncodingClaims(String),

    #[error(transparent)]
    Signing(#[from] SigningError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        enclave::{Enclave, SoftwareEnclave},
        signer::EnclaveSigner,
        token::SignedToken,
    };
    use serde_json::json;

    fn issuer_fixture() -> (SoftwareEnclave, IssuerIdentity) {
        let (enclave, _) = SoftwareEnclave::generate(2);
        let identity = IssuerIdentity::derive(&enclave.public_key()).expect("derive failed");
        (enclave, identity)
    }

    fn request_for(audience: &str) -> TokenRequest {
        TokenRequest { audience: audience.into(), ..Default::default() }
    }

    #[test]
    fn origin_token_has_no_proofs() {
        let (enclave, identity) = issuer_fixture();
        let issuer = TokenIssuer::new(&identity, EnclaveSigner::new(&enclave));
        let token = issuer.issue(request_for("did:example:bob")).expect("issue failed");

        let decoded = SignedToken::decode(&token).expect("decode failed");
        assert!(decoded.claims.proofs.is_empty());
        assert_eq!(decoded.claims.audience, "did:example:bob");
    }

    #[test]
    fn delegated_token_links_its_parent() {
        let (enclave, identity) = issuer_fixture();
        let issuer = TokenIssuer::new(&identity, EnclaveSigner::new(&enclave));
        let request =
            TokenRequest { proofs: vec!["P".into()], ..request_for("did:example:bob") };
        let token = issuer.issue(request).expect("issue failed");

        let decoded = SignedToken::decode(&token).expect("decode failed");
        assert_eq!(decoded.claims.proofs, vec!["P".to_string()]);
    }

    #[test]
    fn issuer_claim_is_never_the_audience() {
        let (enclave, identity) = issuer_fixture();
        let issuer = TokenIssuer::new(&identity, EnclaveSigner::new(&enclave));
        let token = issuer.issue(request_for("did:mpc:mpc1attacker")).expect("issue failed");

        let decoded = SignedToken::decode(&token).expect("decode failed");
        assert_eq!(decoded.claims.issuer, identity.did);
    }

    #[test]
    fn empty_audience_is_rejected() {
        let (enclave, identity) = issuer_fixture();
        let issuer = TokenIssuer::new(&identity, EnclaveSigner::new(&enclave));
        let err = issuer.issue(request_for("")).expect_err("issue succeeded");
        assert!(matches!(err, IssueError::MissingAudience));
    }

    #[test]
    fn header_declares_algorithm_and_version() {
        let (enclave, identity) = issuer_fixture();
        let issuer = TokenIssuer::new(&identity, EnclaveSigner::new(&enclave));
        let token = issuer.issue(request_for("did:example:bob")).expect("issue failed");

        let decoded = SignedToken::decode(&token).expect("decode failed");
        assert_eq!(decoded.header.token_type, "JWT");
        assert_eq!(decoded.header.algorithm, "MPC256");
        assert_eq!(decoded.header.version, "0.9.0");
    }

    #[test]
    fn issued_token_signature_verifies() {
        let (enclave, identity) = issuer_fixture();
        let signer = EnclaveSigner::new(&enclave);
        let issuer = TokenIssuer::new(&identity, EnclaveSigner::new(&enclave));
        let token = issuer.issue(request_for("did:example:bob")).expect("issue failed");

        let decoded = SignedToken::decode(&token).expect("decode failed");
        assert!(decoded.verify_with(&signer).expect("verify failed"));
    }

    #[test]
    fn attenuations_and_facts_are_carried_verbatim() {
        let (enclave, identity) = issuer_fixture();
        let issuer = TokenIssuer::new(&identity, EnclaveSigner::new(&enclave));
        let attenuation = json!({ "can": "msg/send", "with": "mailto:bob@example.com" });
        let request = TokenRequest {
            attenuations: vec![attenuation.as_object().cloned().unwrap()],
            facts: vec!["ipfs://bafy".into()],
            ..request_for("did:example:bob")
        };
        let token = issuer.issue(request).expect("issue failed");

        let decoded = SignedToken::decode(&token).expect("decode failed");
        assert_eq!(decoded.claims.attenuations.len(), 1);
        assert_eq!(decoded.claims.attenuations[0]["can"], json!("msg/send"));
        assert_eq!(decoded.claims.facts, vec!["ipfs://bafy".to_string()]);
    }

    #[test]
    fn unset_bounds_stay_off_the_wire() {
        let (enclave, identity) = issuer_fixture();
        let issuer = TokenIssuer::new(&identity, EnclaveSigner::new(&enclave));
        let token = issuer.issue(request_for("did:example:bob")).expect("issue failed");

        let decoded = SignedToken::decode(&token).expect("decode failed");
        assert_eq!(decoded.claims.not_before, None);
        assert_eq!(decoded.claims.expires_at, None);
    }
}
