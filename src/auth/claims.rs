use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload issued by the hosted auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // user ID
    pub exp: usize,     // expires at (unix timestamp)
    #[serde(default)]
    pub iat: usize,     // issued at (unix timestamp)
    pub iss: String,    // issuer
    pub aud: String,    // audience
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}
