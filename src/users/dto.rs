use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::users::repo::{User, UserDraft};

fn default_page() -> i64 {
    1
}
fn default_page_size() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size", rename = "pageSize")]
    pub page_size: i64,
    pub skillset: Option<String>,
}

/// Pagination envelope. `data` holds at most `page_size` users ordered by id
/// ascending.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub data: Vec<User>,
}

/// Create/update body. Any client-supplied id is ignored; the store assigns
/// identities. Missing fields deserialize to empty strings and are rejected
/// by `into_draft`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserPayload {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub skillsets: String,
    pub hobby: String,
}

impl UserPayload {
    pub fn into_draft(self) -> Result<UserDraft, ApiError> {
        let blank = [
            &self.username,
            &self.email,
            &self.phone,
            &self.skillsets,
            &self.hobby,
        ]
        .iter()
        .any(|field| field.trim().is_empty());
        if blank {
            return Err(ApiError::BadRequest("Invalid user data".into()));
        }
        Ok(UserDraft {
            username: self.username,
            email: self.email,
            phone: self.phone,
            skillsets: self.skillsets,
            hobby: self.hobby,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SecureData {
    pub message: String,
}
