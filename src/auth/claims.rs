use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload identifying one login session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: Uuid,     // user ID
    pub email: String, // user email at login time
    pub jti: Uuid,     // unique per issued token
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
    pub iss: String,   // issuer
    pub aud: String,   // audience
}
