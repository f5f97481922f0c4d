use serde::{Deserialize, Serialize};

/// A registered operator account, as returned by credential verification.
///
/// The secret is never part of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
}

/// Payload for registering a new account.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub secret: String,
    pub full_name: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .field("full_name", &self.full_name)
            .finish()
    }
}
