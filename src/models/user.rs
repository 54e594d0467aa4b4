use serde::{Deserialize, Serialize};

/// Signed-in user as reported by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
}
