//! The `User` record persisted in the `users` table.

use serde::{Deserialize, Serialize};

/// Separator used by the simple-array column encoding of `groups`.
pub const GROUPS_SEPARATOR: char = ',';

/// A persisted account.
///
/// `password` holds a bcrypt hash produced by [`crate::password::encrypt_password`],
/// never plaintext. `otp_id` holds [`crate::otp::create_hash`] of the OTP device
/// identity rather than the device identity itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Generated by the storage layer on insert.
    pub id: i64,
    pub username: String,
    /// Bcrypt hash of the password.
    pub password: String,
    pub otp_id: String,
    pub serial: i64,
    /// Display name. Required.
    pub name: String,
    /// Group memberships, stored as a comma-joined string.
    pub groups: Vec<String>,
    /// Required.
    pub scenario_id: i64,
    /// Required.
    pub role_id: i64,
}

impl User {
    /// Creates a `User` with every field supplied by the caller.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        username: impl Into<String>,
        password: impl Into<String>,
        otp_id: impl Into<String>,
        serial: i64,
        name: impl Into<String>,
        groups: Vec<String>,
        scenario_id: i64,
        role_id: i64,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            password: password.into(),
            otp_id: otp_id.into(),
            serial,
            name: name.into(),
            groups,
            scenario_id,
            role_id,
        }
    }

    /// Returns `true` if the user belongs to `group`.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

/// Encodes a group list the way the `groups` simple-array column stores it.
pub fn encode_groups(groups: &[String]) -> String {
    groups.join(&GROUPS_SEPARATOR.to_string())
}

/// Decodes the `groups` column. An empty column is an empty list.
pub fn decode_groups(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(GROUPS_SEPARATOR).map(str::to_owned).collect()
}

/// Parses a comma separated list given on a command line, skipping blanks.
pub fn parse_group_list(raw: &str) -> Vec<String> {
    raw.split(GROUPS_SEPARATOR)
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_owned)
        .collect()
}
