//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! ml-cli login --role shop -e shop@example.com -p secret
//! ml-cli register --role user --json '{"email":"a@b.c","password":"pw","name":"Ada"}'
//! ml-cli session
//! ml-cli logout --role shop
//! ml-cli logout --all
//! ```

use marketlink_core::Role;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use super::{CliError, Context, print_json, print_line};

/// Log in as `role` and print the stored principal.
pub async fn login(
    ctx: &Context,
    role: Role,
    email: String,
    password: SecretString,
) -> Result<(), CliError> {
    let credentials = json!({
        "email": email,
        "password": password.expose_secret(),
    });

    let session = ctx.client.login(role, &credentials).await?;
    print_json(&json!({
        "role": session.role(),
        "principal": session.principal(),
    }))
}

/// Register as `role` with a JSON payload and print the stored principal.
pub async fn register(ctx: &Context, role: Role, payload: &str) -> Result<(), CliError> {
    let details: Value = serde_json::from_str(payload)?;

    let session = ctx.client.register(role, &details).await?;
    print_json(&json!({
        "role": session.role(),
        "principal": session.principal(),
    }))
}

/// Clear one role's session, or every session with `all`.
pub fn logout(ctx: &Context, role: Option<Role>, all: bool) -> Result<(), CliError> {
    match (role, all) {
        (_, true) => ctx.client.logout_all()?,
        (Some(role), false) => ctx.client.logout(role)?,
        (None, false) => return Err(CliError::NoLogoutTarget),
    }
    Ok(())
}

/// Print which roles hold a session. Tokens are never shown.
pub fn show(ctx: &Context) -> Result<(), CliError> {
    let sessions = ctx.client.sessions();
    let active = sessions.active_role()?;

    for role in Role::ALL {
        let line = match sessions.get_session(role)? {
            Some(session) => {
                let marker = if role == active { " (active)" } else { "" };
                format!("{role}{marker}: signed in as {}", describe(session.principal()))
            }
            None => format!("{role}: signed out"),
        };
        print_line(&line);
    }
    Ok(())
}

fn describe(principal: &Value) -> String {
    ["email", "name", "_id", "id"]
        .iter()
        .find_map(|key| principal.get(key).and_then(Value::as_str))
        .unwrap_or("unknown")
        .to_string()
}
