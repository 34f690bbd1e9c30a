use crate::signer::{SigningMethod, VerifyError};
use base64::{prelude::BASE64_URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A JSON object.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// One capability descriptor narrowing what a token's holder may do.
///
/// Attenuations are open ended key/value mappings; the issuer carries and
/// signs them untouched and never interprets their contents.
pub type Attenuation = JsonObject;

/// The version tag placed in every issued token header.
pub const VERSION: &str = "0.9.0";

/// The header of a signed capability token.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenHeader {
    /// The token type.
    #[serde(rename = "typ")]
    pub token_type: String,

    /// The signing algorithm identifier.
    #[serde(rename = "alg")]
    pub algorithm: String,

    /// The capability token version.
    #[serde(rename = "ucv")]
    pub version: String,
}

impl TokenHeader {
    /// The header for tokens signed with the given algorithm.
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self { token_type: "JWT".into(), algorithm: algorithm.into(), version: VERSION.into() }
    }
}

/// The claim set of a capability token.
///
/// A token with a non-empty `prf` is a delegated token; one with no `prf` is
/// an origin token. Empty sequences and unset bounds are left off the wire.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// The token issuer. Always the DID of the enclave that signed the token.
    #[serde(rename = "iss")]
    pub issuer: String,

    /// The intended holder of the capability.
    #[serde(rename = "aud")]
    pub audience: String,

    /// The capability attenuations carried by this token.
    #[serde(rename = "att", default, skip_serializing_if = "Vec::is_empty")]
    pub attenuations: Vec<Attenuation>,

    /// Parent tokens forming the delegation chain.
    #[serde(rename = "prf", default, skip_serializing_if = "Vec::is_empty")]
    pub proofs: Vec<String>,

    /// Informational facts. Carried verbatim, never validated.
    #[serde(rename = "fct", default, skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<String>,

    /// The first timestamp at which this token is valid.
    #[serde(
        rename = "nbf",
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub not_before: Option<DateTime<Utc>>,

    /// The timestamp at which this token becomes invalid.
    #[serde(
        rename = "exp",
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A decoded capability token.
///
/// Issued tokens travel as opaque compact strings; this wrapper gives a
/// caller access to the parts without altering the signed bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct SignedToken {
    signing_input: String,
    /// The decoded header.
    pub header: TokenHeader,
    /// The decoded claim set.
    pub claims: TokenClaims,
    /// The raw signature bytes.
    pub signature: Vec<u8>,
}

impl SignedToken {
    /// Decode a token from its compact `header.payload.signature` form.
    ///
    /// This checks shape only; the signature is not verified.
    pub fn decode(token: &str) -> Result<Self, TokenParseError> {
        let (signing_input, signature) =
            token.rsplit_once('.').ok_or(TokenParseError::MissingComponent("signature"))?;
        let (header, payload) =
            signing_input.split_once('.').ok_or(TokenParseError::MissingComponent("payload"))?;

        let header = from_base64(header).map_err(|e| TokenParseError::Base64("header", e))?;
        let payload = from_base64(payload).map_err(|e| TokenParseError::Base64("payload", e))?;
        let signature = from_base64(signature).map_err(|e| TokenParseError::Base64("signature", e))?;

        let header = serde_json::from_slice(&header).map_err(|e| TokenParseError::Json("header", e))?;
        let claims = serde_json::from_slice(&payload).map_err(|e| TokenParseError::Json("payload", e))?;
        Ok(Self { signing_input: signing_input.into(), header, claims, signature })
    }

    /// The exact `header.payload` string the signature covers.
    pub fn signing_input(&self) -> &str {
        &self.signing_input
    }

    /// Check this token's signature with the given signing method.
    pub fn verify_with(&self, method: &impl SigningMethod) -> Result<bool, VerifyError> {
        method.verify(&self.signing_input, &self.signature)
    }
}

/// An error when parsing a compact token.
#[derive(Debug, thiserror::Error)]
pub enum TokenParseError {
    #[error("no {0} component in token")]
    MissingComponent(&'static str),

    #[error("invalid base64 found on {0}: {1}")]
    Base64(&'static str, base64::DecodeError),

    #[error("invalid JSON on {0}: {1}")]
    Json(&'static str, serde_json::Error),
}

pub(crate) fn to_base64<T: AsRef<[u8]>>(input: T) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(input)
}

pub(crate) fn to_base64_json<T: Serialize>(input: &T) -> Result<String, serde_json::Error> {
    let input = serde_json::to_vec(input)?;
    Ok(to_base64(&input))
}

pub(crate) fn from_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64_URL_SAFE_NO_PAD.decode(input)
}
