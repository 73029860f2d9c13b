//! Shared fixtures for unit tests.
//!
//! The PEM files under `test/` were produced with OpenSSL; `private_key.pem`
//! and `private_key_pkcs1.pem` hold the same 2048-bit key.

use crate::key::JwksConfig;

pub const PRIVATE_KEY_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/test/private_key.pem");
pub const PKCS1_PRIVATE_KEY_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/test/private_key_pkcs1.pem");
pub const PUBLIC_KEY_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/test/public_key.pem");
pub const EC_PKCS8_PRIVATE_KEY_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/test/ec_private_key_pkcs8.pem");
pub const EC_SEC1_PRIVATE_KEY_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/test/ec_private_key_sec1.pem");
pub const NOT_A_KEY_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/test/not_a_key.pem");

/// base64url modulus of the fixture key.
pub const FIXTURE_MODULUS: &str = "5T0PS7DScZgoSRAZyxP1heTgmpunuwhPPFZo9lKyyQiQYUMb0qyeYGs1D6izO0PdYrZXQ3qCfa3tDTnUimCK9VGBMkG784k4PPtEVISeDaHBSj1pfNopNeSpO1C8BhiYtYf7Y0Jc2sXvr-zKjcxKBZXEh4mx_q68HV7mGMiZ3C-UVJIcc0T6vshApjSmazqEJWOPUImqoQgteCzqJz1prgWbc8NJ4J-RHWhZ6So0Z2pjo4DGCpGTLpXnpcJieeCRm1QN7XCeoQxwtGzuWW6UwoYaovCM-SFBzto6iXweKFshl01H8dqbqbblZSP_wGGPa_PGpwsczLEZPFoaE-apnw";

/// Builds a config from the fixture key.
pub fn fixture_config(kid: &str) -> JwksConfig {
    JwksConfig::builder()
        .import_key(PRIVATE_KEY_PATH)
        .key_id(kid)
        .build()
        .expect("fixture key should load")
}
