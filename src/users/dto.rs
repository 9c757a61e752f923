use std::fmt;

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Body of `POST /users` and `PUT /users/{id}`.
///
/// Every field is optional at the wire level so that a missing field is
/// reported as a validation error for that field instead of a generic
/// deserialization failure. Create requires all three; update takes any subset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl fmt::Display for UserResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let created = self
            .created_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.created_at.to_string());
        write!(
            f,
            "User{{id={}, name='{}', email='{}', age={}, createdAt={}}}",
            self.id, self.name, self.email, self.age, created
        )
    }
}
