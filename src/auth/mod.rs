//! Identity resolution.
//!
//! Authentication itself (login, signup, session issuance) lives in the
//! identity provider. This module only verifies the bearer tokens it mints
//! and exposes the signing secret to the principal extractor.

mod jwt;

pub use jwt::{generate_access_token, verify_token, Claims, JwtError};

/// Holds the verification material for inbound bearer tokens.
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }
}
