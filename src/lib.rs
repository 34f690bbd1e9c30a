//! Capability token issuance and verification backed by a threshold signing
//! enclave.
//!
//! Tokens are compact, delegable UCAN-style credentials; their signatures
//! come from a multi-party signer rather than a held private key.

pub mod chaincode;
pub mod config;
pub mod dispatch;
pub mod enclave;
pub mod identity;
pub mod issuer;
pub mod service;
pub mod signer;
pub mod token;

pub use k256;
