//! Sign-in command handlers

use anyhow::{anyhow, Context, Result};

use bookguide_core::{Credentials, Identity, SessionStore};

use super::Backend;
use crate::editor::read_line;
use crate::output::{Output, OutputFormat};

/// How the user arrived at the sign-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignIn {
    Login,
    Register,
}

/// Signed-in identity, or an error telling the user to log in
pub fn require_identity(session: &SessionStore<Backend>) -> Result<Identity> {
    session
        .current()
        .ok_or_else(|| anyhow!("Not signed in. Run `bookguide login <email>` first."))
}

/// Log in to an existing account, or register a new one
///
/// The password is read from stdin when not given.
pub fn sign_in(
    session: &SessionStore<Backend>,
    email: String,
    password: Option<String>,
    mode: SignIn,
    output: &Output,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_line("Password")?,
    };

    let credentials = Credentials::new(email, password);
    let identity = match mode {
        SignIn::Login => session.sign_in(&credentials)?,
        SignIn::Register => session.register(&credentials)?,
    };

    let verb = match mode {
        SignIn::Login => "Signed in",
        SignIn::Register => "Registered and signed in",
    };

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({"status": "success", "email": identity.email})
            );
        }
        OutputFormat::Quiet => {}
        OutputFormat::Human => println!("✓ {} as {}", verb, identity.email),
    }

    Ok(())
}

/// Forget the signed-in identity
pub fn logout(session: &SessionStore<Backend>, output: &Output) -> Result<()> {
    let Some(identity) = session.current() else {
        output.unchanged("Not signed in");
        return Ok(());
    };

    session.logout().context("Failed to clear session")?;
    output.success(&format!("Signed out {}", identity.email));

    Ok(())
}

/// Show who is signed in
pub fn whoami(session: &SessionStore<Backend>, output: &Output) -> Result<()> {
    let current = session.current();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "signed_in": current.is_some(),
                    "email": current.as_ref().map(|i| i.email.as_str())
                })
            );
        }
        OutputFormat::Quiet => {
            if let Some(identity) = current {
                println!("{}", identity.email);
            }
        }
        OutputFormat::Human => match current {
            Some(identity) => println!("Signed in as {}", identity.email),
            None => println!("Not signed in."),
        },
    }

    Ok(())
}
