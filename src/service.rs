use crate::{
    chaincode::{self, ChainCodeError, CHAIN_CODE_LEN},
    config::{ConfigSource, DEFAULT_CHAIN_ID, KEY_CHAIN_ID, KEY_ENCLAVE, KEY_VAULT_CONFIG},
    enclave::{Enclave, EnclaveData, EnclaveError, ImportEnclave, ImportError},
    identity::{IdentityError, IssuerIdentity},
    issuer::{IssueError, TokenIssuer, TokenRequest},
    signer::EnclaveSigner,
    token::{Attenuation, JsonObject},
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// The capability token service.
///
/// Owns the enclave and the identity derived from it for the lifetime of the
/// process. Constructed once; every field is immutable afterwards, so a
/// single instance can be shared by reference across all operations.
#[derive(Debug)]
pub struct TokenService<E> {
    enclave: E,
    identity: IssuerIdentity,
    chain_id: String,
    downstream_config: JsonObject,
}

impl<E: Enclave> TokenService<E> {
    /// Construct the service from host configuration.
    ///
    /// Reads the chain identifier (falling back to [`DEFAULT_CHAIN_ID`]),
    /// parses and imports the enclave key share data, and derives the issuer
    /// identity. A failure at any step means the service is never created;
    /// there is no per request retry path.
    pub fn new(config: &impl ConfigSource) -> Result<Self, InitError>
    where
        E: ImportEnclave,
    {
        let chain_id = match config.get(KEY_CHAIN_ID) {
            Some(raw) => String::from_utf8_lossy(&raw).into_owned(),
            None => DEFAULT_CHAIN_ID.into(),
        };

        let raw = config.get(KEY_ENCLAVE).ok_or(InitError::EnclaveDataMissing)?;
        let data: EnclaveData = serde_json::from_slice(&raw)?;
        let enclave = E::import(&data)?;

        let mut service = Self::from_enclave(enclave, chain_id)?;
        service.downstream_config = read_downstream_config(config);
        Ok(service)
    }

    /// Construct a service directly from an enclave obtained out of band.
    pub fn from_enclave(enclave: E, chain_id: impl Into<String>) -> Result<Self, InitError> {
        let identity = IssuerIdentity::derive(&enclave.public_key())?;
        info!(did = %identity.did, address = %identity.address, "token service initialized");
        Ok(Self {
            enclave,
            identity,
            chain_id: chain_id.into(),
            downstream_config: JsonObject::new(),
        })
    }

    /// The issuer identity derived at construction.
    pub fn identity(&self) -> &IssuerIdentity {
        &self.identity
    }

    /// The chain this service issues identities for.
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Configuration carried for downstream callers.
    ///
    /// Empty when the host provided none; the core never interprets it.
    pub fn downstream_config(&self) -> &JsonObject {
        &self.downstream_config
    }

    /// Issue an origin capability token: a token with no parent proofs.
    pub fn issue_origin_token(
        &self,
        audience: String,
        attenuations: Vec<Attenuation>,
        facts: Vec<String>,
        not_before: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<String, ServiceError> {
        self.issue(TokenRequest {
            audience,
            attenuations,
            proofs: vec![],
            facts,
            not_before,
            expires_at,
        })
    }

    /// Issue a token delegated from a parent token.
    ///
    /// The parent is linked as the single proof and carried verbatim; its
    /// signature and capability set are not checked here.
    pub fn issue_attenuated_token(
        &self,
        parent_token: String,
        audience: String,
        attenuations: Vec<Attenuation>,
        facts: Vec<String>,
        not_before: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<String, ServiceError> {
        self.issue(TokenRequest {
            audience,
            attenuations,
            proofs: vec![parent_token],
            facts,
            not_before,
            expires_at,
        })
    }

    /// Sign arbitrary data with the enclave key.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, ServiceError> {
        self.ensure_valid()?;
        Ok(self.enclave.sign(data)?)
    }

    /// Check a signature over arbitrary data.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, ServiceError> {
        self.ensure_valid()?;
        Ok(self.enclave.verify(data, signature)?)
    }

    /// The issuer identity together with a freshly derived chain code.
    pub fn issuer_info(&self) -> Result<IssuerInfo, ServiceError> {
        self.ensure_valid()?;
        let chain_code = chaincode::derive_chain_code(&self.enclave, &self.identity.address)?;
        Ok(IssuerInfo {
            did: self.identity.did.clone(),
            address: self.identity.address.clone(),
            chain_code,
        })
    }

    fn issue(&self, request: TokenRequest) -> Result<String, ServiceError> {
        self.ensure_valid()?;
        let issuer = TokenIssuer::new(&self.identity, EnclaveSigner::new(&self.enclave));
        Ok(issuer.issue(request)?)
    }

    fn ensure_valid(&self) -> Result<(), ServiceError> {
        if self.enclave.is_valid() {
            Ok(())
        } else {
            Err(ServiceError::EnclaveNotInitialized)
        }
    }
}

/// The issuer identity along with its derived chain code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuerInfo {
    pub did: String,
    pub address: String,
    pub chain_code: [u8; CHAIN_CODE_LEN],
}

/// An error during service construction.
///
/// Any of these is fatal: the service never becomes ready and no operation
/// is reachable afterwards.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("enclave data not provided in configuration")]
    EnclaveDataMissing,

    #[error("failed to parse enclave data: {0}")]
    EnclaveDataMalformed(#[from] serde_json::Error),

    #[error("failed to import enclave: {0}")]
    EnclaveImport(#[from] ImportError),

    #[error("failed to derive issuer identity: {0}")]
    IdentityDerivation(#[from] IdentityError),
}

/// An error from a service operation.
///
/// Always turned into a response level error at the dispatch boundary; never
/// a fault that escapes to the host.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("enclave not initialized")]
    EnclaveNotInitialized,

    #[error(transparent)]
    Issue(#[from] IssueError),

    #[error(transparent)]
    Enclave(#[from] EnclaveError),

    #[error(transparent)]
    ChainCode(#[from] ChainCodeError),
}

fn read_downstream_config(config: &impl ConfigSource) -> JsonObject {
    let Some(raw) = config.get(KEY_VAULT_CONFIG) else {
        return JsonObject::new();
    };
    match serde_json::from_slice(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "ignoring malformed downstream configuration");
            JsonObject::new()
        }
    }
}
