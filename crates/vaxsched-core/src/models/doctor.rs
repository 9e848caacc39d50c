use serde::{Deserialize, Serialize};

/// The doctor account the session token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub username: String,
}
