//! Serve a JSON Web Key Set (JWKS) for an RS256 signing key.
//!
//! A [`KeyConfigBuilder`] resolves the RSA private key once at startup, either
//! by generating a new one or importing a PEM file, and [`router`] exposes its
//! public half to relying parties:
//!
//! ```no_run
//! use rsa_jwks::{DEFAULT_JWKS_PATH, JwksConfig, router};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = JwksConfig::builder()
//!     .generate_key(2048)
//!     .key_id("my-id")
//!     .build()?;
//!
//! let app = router(config, DEFAULT_JWKS_PATH);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod jwks;
pub mod key;
pub mod telemetry;

#[cfg(test)]
mod testutil;

pub use error::{ConfigError, JwksError};
pub use jwks::{ALGORITHM_RS256, DEFAULT_JWKS_PATH, Jwk, Jwks, KEY_TYPE_RSA, router};
pub use key::{
    JwksConfig, KEY_USAGE_SIGNATURE, KeyConfigBuilder, KeyMetadata, PemSource, ResolvedKey,
};
