//! cryptographic key management.
//!
//! Resolves the RSA signing key published by the JWKS endpoint. The key is
//! either generated at startup or imported from a PEM document, and is frozen
//! once [`KeyConfigBuilder::build`] returns.

use std::fmt;
use std::path::PathBuf;

use rand::rngs::OsRng;
use rsa::pkcs1::{self, DecodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, PrivateKeyInfo, SecretDocument};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::{error, info};

use crate::error::{ConfigError, JwksError};
use crate::jwks::{Jwk, Jwks};

/// The only key usage this service publishes.
pub const KEY_USAGE_SIGNATURE: &str = "sig";

/// Smallest modulus accepted for generated keys.
pub const MIN_KEY_BITS: usize = 2048;
/// Largest modulus accepted for generated keys.
pub const MAX_KEY_BITS: usize = 16384;

const PKCS8_PEM_LABEL: &str = "PRIVATE KEY";
const PKCS1_PEM_LABEL: &str = "RSA PRIVATE KEY";
const PEM_BEGIN: &str = "-----BEGIN ";
const PEM_END: &str = "-----END ";
const PEM_BOUNDARY_TAIL: &str = "-----";

/// Where imported PEM material comes from.
#[derive(Clone)]
pub enum PemSource {
    /// Read from this file at build time.
    Path(PathBuf),
    /// PEM text already held in memory.
    Inline(String),
}

impl fmt::Debug for PemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Inline(_) => f.write_str("Inline(<redacted>)"),
        }
    }
}

/// The resolved choice of key origin.
#[derive(Clone, Debug)]
pub(crate) enum KeySource {
    Generated { bits: usize },
    Imported(PemSource),
}

impl KeySource {
    fn resolve(&self) -> Result<RsaPrivateKey, ConfigError> {
        match self {
            Self::Generated { bits } => generate_private_key(*bits),
            Self::Imported(pem) => import_private_key(pem),
        }
    }
}

/// Metadata published alongside the public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyMetadata {
    key_id: String,
    usage: &'static str,
}

impl KeyMetadata {
    /// Creates signature-usage metadata for `key_id`.
    ///
    /// The id ends up verbatim in the `kid` member of the JWKS and in the
    /// headers of tokens signed with this key, so it must be non-blank and
    /// free of control characters.
    pub fn new(key_id: impl Into<String>) -> Result<Self, ConfigError> {
        let key_id = key_id.into();
        if key_id.trim().is_empty() {
            return Err(ConfigError::MetadataAttachFailed(
                "key id must not be empty".to_string(),
            ));
        }
        if key_id.chars().any(char::is_control) {
            return Err(ConfigError::MetadataAttachFailed(
                "key id must not contain control characters".to_string(),
            ));
        }
        Ok(Self {
            key_id,
            usage: KEY_USAGE_SIGNATURE,
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn usage(&self) -> &'static str {
        self.usage
    }
}

/// An RSA private key together with its published metadata.
///
/// Only constructed by [`KeyConfigBuilder::build`], which has already checked
/// that the public half can be derived.
#[derive(Clone)]
pub struct ResolvedKey {
    private_key: RsaPrivateKey,
    metadata: KeyMetadata,
}

impl ResolvedKey {
    fn new(private_key: RsaPrivateKey, metadata: KeyMetadata) -> Result<Self, ConfigError> {
        private_key
            .validate()
            .map_err(|e| ConfigError::PublicDerivationFailed(e.to_string()))?;

        let key = Self {
            private_key,
            metadata,
        };
        key.public_components()
            .map_err(|e| ConfigError::PublicDerivationFailed(e.to_string()))?;
        Ok(key)
    }

    pub fn key_id(&self) -> &str {
        self.metadata.key_id()
    }

    pub fn usage(&self) -> &'static str {
        self.metadata.usage()
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.private_key.to_public_key()
    }

    /// Modulus length in bits.
    pub fn bits(&self) -> usize {
        self.private_key.size() * 8
    }

    /// Big-endian bytes of the public exponent and modulus, in that order.
    pub fn public_components(&self) -> Result<(Vec<u8>, Vec<u8>), JwksError> {
        let public_key = self.public_key();
        let e = public_key.e().to_bytes_be();
        let n = public_key.n().to_bytes_be();

        // BigUint zero serializes to a single 0x00 byte
        if e.iter().all(|b| *b == 0) {
            return Err(JwksError::PublicDerivation("public exponent is zero"));
        }
        if n.iter().all(|b| *b == 0) {
            return Err(JwksError::PublicDerivation("modulus is zero"));
        }
        Ok((e, n))
    }
}

impl fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedKey")
            .field("kid", &self.key_id())
            .field("use", &self.usage())
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// The validated key configuration handed to the HTTP layer.
#[derive(Clone, Debug)]
pub struct JwksConfig {
    key: ResolvedKey,
}

impl JwksConfig {
    pub fn builder() -> KeyConfigBuilder {
        KeyConfigBuilder::new()
    }

    pub fn key(&self) -> &ResolvedKey {
        &self.key
    }

    /// Builds the JWK describing the public half of the key.
    pub fn jwk(&self) -> Result<Jwk, JwksError> {
        Jwk::from_key(&self.key)
    }

    /// Builds the single-entry key set served by the endpoint.
    pub fn jwks(&self) -> Result<Jwks, JwksError> {
        Ok(Jwks {
            keys: vec![self.jwk()?],
        })
    }
}

/// Builder for [`JwksConfig`].
///
/// Exactly one of [`generate_key`](Self::generate_key) or an import method
/// must be called, plus [`key_id`](Self::key_id). Conflicts are reported by
/// [`build`](Self::build), not by the selectors.
///
/// ```no_run
/// use rsa_jwks::JwksConfig;
///
/// let config = JwksConfig::builder()
///     .import_key("keys/private.pem")
///     .key_id("my-id")
///     .build()?;
/// # Ok::<(), rsa_jwks::ConfigError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct KeyConfigBuilder {
    generate: Option<usize>,
    import: Option<PemSource>,
    key_id: Option<String>,
}

impl KeyConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh key with a modulus of `bits`.
    pub fn generate_key(mut self, bits: usize) -> Self {
        self.generate = Some(bits);
        self
    }

    /// Import a PEM-encoded private key from `path`.
    pub fn import_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.import = Some(PemSource::Path(path.into()));
        self
    }

    /// Import a PEM-encoded private key from memory.
    pub fn import_pem(mut self, pem: impl Into<String>) -> Self {
        self.import = Some(PemSource::Inline(pem.into()));
        self
    }

    pub fn key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Resolves and validates the key. Runs once at startup; generating a
    /// large key can take seconds.
    #[tracing::instrument(skip(self), fields(kid = ?self.key_id))]
    pub fn build(self) -> Result<JwksConfig, ConfigError> {
        match self.resolve() {
            Ok(config) => {
                info!(
                    kid = %config.key.key_id(),
                    bits = config.key.bits(),
                    "signing key ready"
                );
                Ok(config)
            }
            Err(err) => {
                error!("Failed to build key configuration: {}", err);
                Err(err)
            }
        }
    }

    fn resolve(self) -> Result<JwksConfig, ConfigError> {
        let source = match (self.generate, self.import) {
            (Some(_), Some(_)) => return Err(ConfigError::BothSourcesSelected),
            (None, None) => return Err(ConfigError::NoSourceSelected),
            (Some(bits), None) => KeySource::Generated { bits },
            (None, Some(pem)) => KeySource::Imported(pem),
        };
        let metadata = KeyMetadata::new(self.key_id.ok_or(ConfigError::MissingKeyId)?)?;

        let private_key = source.resolve()?;
        let key = ResolvedKey::new(private_key, metadata)?;
        Ok(JwksConfig { key })
    }
}

#[tracing::instrument]
fn generate_private_key(bits: usize) -> Result<RsaPrivateKey, ConfigError> {
    if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&bits) {
        return Err(ConfigError::GenerationFailed(format!(
            "key length of {bits} bits is outside {MIN_KEY_BITS}..={MAX_KEY_BITS}"
        )));
    }
    RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| ConfigError::GenerationFailed(e.to_string()))
}

fn import_private_key(source: &PemSource) -> Result<RsaPrivateKey, ConfigError> {
    match source {
        PemSource::Path(path) => {
            tracing::debug!(path = %path.display(), "reading private key");
            let data = std::fs::read(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.clone(),
                source,
            })?;
            parse_private_key_pem(&data)
        }
        PemSource::Inline(pem) => parse_private_key_pem(pem.as_bytes()),
    }
}

/// Returns the first `-----BEGIN`..`-----END ...-----` block of `pem`, or
/// `pem` unchanged when no complete block is found.
fn first_pem_block(pem: &str) -> &str {
    let Some(start) = pem.find(PEM_BEGIN) else {
        return pem;
    };
    let Some(end) = pem[start..].find(PEM_END).map(|i| start + i + PEM_END.len()) else {
        return pem;
    };
    match pem[end..].find(PEM_BOUNDARY_TAIL) {
        Some(i) => &pem[start..end + i + PEM_BOUNDARY_TAIL.len()],
        None => pem,
    }
}

/// Parses a PKCS#8 (`PRIVATE KEY`) or PKCS#1 (`RSA PRIVATE KEY`) PEM document.
///
/// Only the first PEM block is read, so key and certificate bundles work.
/// Well-formed PEM holding anything other than an RSA private key is reported
/// as [`ConfigError::UnsupportedKeyType`].
pub fn parse_private_key_pem(data: &[u8]) -> Result<RsaPrivateKey, ConfigError> {
    let pem = std::str::from_utf8(data)
        .map_err(|_| ConfigError::ParseFailed("key is not UTF-8 encoded PEM".to_string()))?;
    let pem = first_pem_block(pem);
    let (label, document) =
        SecretDocument::from_pem(pem).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;

    match label {
        PKCS8_PEM_LABEL => {
            let info = PrivateKeyInfo::try_from(document.as_bytes())
                .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
            if info.algorithm.oid != pkcs1::ALGORITHM_OID {
                return Err(ConfigError::UnsupportedKeyType(format!(
                    "PKCS#8 key with algorithm {}",
                    info.algorithm.oid
                )));
            }
            RsaPrivateKey::from_pkcs8_der(document.as_bytes())
                .map_err(|e| ConfigError::ParseFailed(e.to_string()))
        }
        PKCS1_PEM_LABEL => RsaPrivateKey::from_pkcs1_der(document.as_bytes())
            .map_err(|e| ConfigError::ParseFailed(e.to_string())),
        other => Err(ConfigError::UnsupportedKeyType(format!(
            "PEM block labelled {other:?}"
        ))),
    }
}
