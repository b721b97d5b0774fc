//! Account data types.

use serde::{Deserialize, Serialize};

/// The identity the platform reports for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
}
