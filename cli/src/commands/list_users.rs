//! List users command.

use anyhow::Result;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use webdesk_auth::users::{User, UserStorage};

use crate::output::Output;

/// Table row; credentials and device hashes are left out.
#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Groups")]
    groups: String,
    #[tabled(rename = "Scenario")]
    scenario_id: i64,
    #[tabled(rename = "Role")]
    role_id: i64,
    #[tabled(rename = "OTP")]
    otp: &'static str,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            groups: user.groups.join(", "),
            scenario_id: user.scenario_id,
            role_id: user.role_id,
            otp: if user.otp_id.is_empty() { "no" } else { "yes" },
        }
    }
}

fn render(users: &[User]) -> String {
    let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub async fn run_list_users<S: UserStorage>(storage: &S, out: &Output) -> Result<usize> {
    let users = storage.list_users().await?;

    if users.is_empty() {
        out.dim("No users found.");
        return Ok(0);
    }

    out.print(render(&users));
    out.info(format!("{} user(s)", users.len()));
    Ok(users.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_hides_credentials() {
        let user = User::new(
            3,
            "alice",
            "$2b$10$abcdefghijklmnopqrstuu5Q8j1cUe2PbV2sWlB3lJg7GZr8a1b2C",
            "otp-hash",
            42,
            "Alice A.",
            vec!["admins".to_owned(), "users".to_owned()],
            7,
            2,
        );
        let table = render(&[user]);

        assert!(table.contains("alice"), "username shown: {table}");
        assert!(table.contains("admins, users"), "groups shown: {table}");
        assert!(!table.contains("$2b$"), "password hash hidden: {table}");
        assert!(!table.contains("otp-hash"), "otp id hidden: {table}");
    }
}
