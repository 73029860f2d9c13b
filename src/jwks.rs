//! Logic for the JWKS endpoint.
//!
//! Serves the JSON Web Key Set (JWKS) containing the public half of the
//! configured signing key, so relying parties can verify RS256 tokens.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::error::JwksError;
use crate::key::{JwksConfig, ResolvedKey};

pub const KEY_TYPE_RSA: &str = "RSA";
pub const ALGORITHM_RS256: &str = "RS256";

/// Conventional location of the key set.
pub const DEFAULT_JWKS_PATH: &str = "/.well-known/jwks.json";

/// A JSON Web Key Set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    /// List of keys. Always a single entry.
    pub keys: Vec<Jwk>,
}

/// A JSON Web Key, see RFC 7518 section 6.3.1.
///
/// Field order is the serialization order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type, always "RSA".
    pub kty: String,
    /// Algorithm, always "RS256".
    pub alg: String,
    /// Exponent (Base64URL encoded).
    pub e: String,
    /// Modulus (Base64URL encoded).
    pub n: String,
    /// Key use, always "sig".
    pub r#use: String,
    /// Key ID.
    pub kid: String,
}

impl Jwk {
    /// Describes the public half of `key`.
    pub fn from_key(key: &ResolvedKey) -> Result<Self, JwksError> {
        let (e, n) = key.public_components()?;

        Ok(Self {
            kty: KEY_TYPE_RSA.to_string(),
            alg: ALGORITHM_RS256.to_string(),
            e: URL_SAFE_NO_PAD.encode(e),
            n: URL_SAFE_NO_PAD.encode(n),
            r#use: key.usage().to_string(),
            kid: key.key_id().to_string(),
        })
    }
}

/// Handler for the JWKS endpoint.
///
/// Recomputes the document from the frozen key on every request.
#[tracing::instrument(skip_all)]
pub async fn jwks(State(config): State<Arc<JwksConfig>>) -> Result<Json<Jwks>, JwksError> {
    let jwks = config.jwks()?;
    tracing::debug!(kid = %config.key().key_id(), "serving jwks");
    Ok(Json(jwks))
}

/// Builds a router answering `GET path` with the key set.
pub fn router(config: JwksConfig, path: &str) -> Router {
    Router::new()
        .route(path, get(jwks))
        .with_state(Arc::new(config))
}
