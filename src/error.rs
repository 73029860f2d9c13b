//! Error types.
//!
//! [`ConfigError`] covers everything that can go wrong while resolving the
//! signing key at startup. [`JwksError`] is the request-time failure returned
//! by the `/jwks` handler.

use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failure to turn a [`KeyConfigBuilder`](crate::KeyConfigBuilder) into a
/// usable key. Every variant is fatal: the service must not start serving.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot import and generate a private key at the same time")]
    BothSourcesSelected,

    #[error("no key source selected, generate or import a private key")]
    NoSourceSelected,

    #[error("a key id is required")]
    MissingKeyId,

    #[error("cannot read private key file {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse private key: {0}")]
    ParseFailed(String),

    #[error("cannot generate new private key: {0}")]
    GenerationFailed(String),

    #[error("expected an RSA private key, got {0}")]
    UnsupportedKeyType(String),

    #[error("failed to derive public key: {0}")]
    PublicDerivationFailed(String),

    #[error("cannot attach metadata to the private key: {0}")]
    MetadataAttachFailed(String),
}

/// Request-time failure of the JWKS handler.
#[derive(Debug, Error)]
pub enum JwksError {
    #[error("public key derivation failed: {0}")]
    PublicDerivation(&'static str),
}

impl IntoResponse for JwksError {
    fn into_response(self) -> Response {
        tracing::error!("Error returned by jwks handler: {self}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal server error" })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwks_error_is_server_error() {
        let response = JwksError::PublicDerivation("empty modulus").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[test]
    fn test_file_read_failed_names_path() {
        let err = ConfigError::FileReadFailed {
            path: PathBuf::from("/nowhere/key.pem"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/nowhere/key.pem"));
    }
}
