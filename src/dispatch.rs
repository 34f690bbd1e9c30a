//! Per-operation entry points for the host boundary.
//!
//! Each function decodes a typed request from its JSON transport encoding,
//! invokes exactly one service operation, and encodes a response that carries
//! either the payload or a non-empty `error`, never both. The accompanying
//! [`Status`] mirrors that: zero for success, nonzero for failure. No
//! business logic lives here.

use crate::{
    enclave::Enclave,
    service::TokenService,
    token::Attenuation,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};
use tracing::debug;

/// The binary outcome reported to the host alongside each response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    /// The numeric code the host expects: zero on success.
    pub fn code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Failure => 1,
        }
    }
}

/// An encoded response together with its status signal.
#[derive(Clone, Debug)]
pub struct DispatchResult {
    /// The JSON encoded response body.
    pub body: Vec<u8>,
    /// The outcome to report to the host.
    pub status: Status,
}

/// A request for a new origin token.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewOriginTokenRequest {
    pub audience_did: String,
    #[serde(default)]
    pub attenuations: Vec<Attenuation>,
    #[serde(default)]
    pub facts: Vec<String>,
    /// Unix seconds; zero or absent means no bound.
    #[serde(default)]
    pub not_before: i64,
    /// Unix seconds; zero or absent means no bound.
    #[serde(default)]
    pub expires_at: i64,
}

/// A request for a token delegated from a parent token.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewAttenuatedTokenRequest {
    pub parent_token: String,
    pub audience_did: String,
    #[serde(default)]
    pub attenuations: Vec<Attenuation>,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub not_before: i64,
    #[serde(default)]
    pub expires_at: i64,
}

/// The response for both token issuing operations.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub issuer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[serde_as]
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SignDataRequest {
    #[serde_as(as = "Base64")]
    pub data: Vec<u8>,
}

#[serde_as]
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SignDataResponse {
    #[serde_as(as = "Base64")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature: Vec<u8>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[serde_as]
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VerifyDataRequest {
    #[serde_as(as = "Base64")]
    pub data: Vec<u8>,
    #[serde_as(as = "Base64")]
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct VerifyDataResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// The response for the issuer identity operation.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct IssuerInfoResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub issuer_did: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    /// Hex encoded chain code.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chain_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Issue an origin token.
pub fn new_origin_token<E: Enclave>(service: &TokenService<E>, input: &[u8]) -> DispatchResult {
    debug!(operation = "new_origin_token", "dispatching request");
    let request: NewOriginTokenRequest = match decode_request(input) {
        Ok(request) => request,
        Err(error) => return failure(TokenResponse { error, ..Default::default() }),
    };
    let outcome = service.issue_origin_token(
        request.audience_did,
        request.attenuations,
        request.facts,
        timestamp(request.not_before),
        timestamp(request.expires_at),
    );
    token_response(service, outcome)
}

/// Issue a token delegated from a parent token.
pub fn new_attenuated_token<E: Enclave>(service: &TokenService<E>, input: &[u8]) -> DispatchResult {
    debug!(operation = "new_attenuated_token", "dispatching request");
    let request: NewAttenuatedTokenRequest = match decode_request(input) {
        Ok(request) => request,
        Err(error) => return failure(TokenResponse { error, ..Default::default() }),
    };
    let outcome = service.issue_attenuated_token(
        request.parent_token,
        request.audience_did,
        request.attenuations,
        request.facts,
        timestamp(request.not_before),
        timestamp(request.expires_at),
    );
    token_response(service, outcome)
}

/// Sign arbitrary data with the enclave key.
pub fn sign_data<E: Enclave>(service: &TokenService<E>, input: &[u8]) -> DispatchResult {
    debug!(operation = "sign_data", "dispatching request");
    let request: SignDataRequest = match decode_request(input) {
        Ok(request) => request,
        Err(error) => return failure(SignDataResponse { error, ..Default::default() }),
    };
    match service.sign(&request.data) {
        Ok(signature) => success(SignDataResponse { signature, ..Default::default() }),
        Err(e) => failure(SignDataResponse { error: e.to_string(), ..Default::default() }),
    }
}

/// Check a signature over arbitrary data.
pub fn verify_data<E: Enclave>(service: &TokenService<E>, input: &[u8]) -> DispatchResult {
    debug!(operation = "verify_data", "dispatching request");
    let request: VerifyDataRequest = match decode_request(input) {
        Ok(request) => request,
        Err(error) => return failure(VerifyDataResponse { error, ..Default::default() }),
    };
    match service.verify(&request.data, &request.signature) {
        Ok(valid) => success(VerifyDataResponse { valid, ..Default::default() }),
        Err(e) => failure(VerifyDataResponse { error: e.to_string(), ..Default::default() }),
    }
}

/// Report the issuer identity and a fresh chain code. Takes no input.
pub fn get_issuer_did<E: Enclave>(service: &TokenService<E>) -> DispatchResult {
    debug!(operation = "get_issuer_did", "dispatching request");
    match service.issuer_info() {
        Ok(info) => success(IssuerInfoResponse {
            issuer_did: info.did,
            address: info.address,
            chain_code: hex::encode(info.chain_code),
            ..Default::default()
        }),
        Err(e) => failure(IssuerInfoResponse { error: e.to_string(), ..Default::default() }),
    }
}

fn token_response<E: Enclave>(
    service: &TokenService<E>,
    outcome: Result<String, crate::service::ServiceError>,
) -> DispatchResult {
    match outcome {
        Ok(token) => {
            let identity = service.identity();
            success(TokenResponse {
                token,
                issuer: identity.did.clone(),
                address: identity.address.clone(),
                ..Default::default()
            })
        }
        Err(e) => failure(TokenResponse { error: e.to_string(), ..Default::default() }),
    }
}

fn decode_request<T: for<'de> Deserialize<'de>>(input: &[u8]) -> Result<T, String> {
    serde_json::from_slice(input).map_err(|e| format!("failed to parse request: {e}"))
}

fn timestamp(seconds: i64) -> Option<DateTime<Utc>> {
    if seconds > 0 {
        DateTime::from_timestamp(seconds, 0)
    } else {
        None
    }
}

fn success<T: Serialize>(response: T) -> DispatchResult {
    DispatchResult { body: encode(&response), status: Status::Success }
}

fn failure<T: Serialize>(response: T) -> DispatchResult {
    DispatchResult { body: encode(&response), status: Status::Failure }
}

fn encode<T: Serialize>(response: &T) -> Vec<u8> {
    // Response shapes in this module serialize infallibly; the fallback
    // still satisfies the error-or-payload contract.
    serde_json::to_vec(response).unwrap_or_else(|_| br#"{"error":"response encoding failed"}"#.to_vec())
}
