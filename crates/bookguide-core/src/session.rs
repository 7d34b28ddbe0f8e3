//! Accounts and the signed-in identity
//!
//! Registered accounts live in `bookguide:accounts` as salted SHA-256
//! password hashes. The session slot (`bookguide:session`) holds at most one
//! identity. Logging in overwrites it, logging out deletes it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::storage::{KeyValueStorage, StorageError};

/// Storage slot holding the current identity
pub const SESSION_KEY: &str = "bookguide:session";

/// Storage slot holding registered accounts
pub const ACCOUNTS_KEY: &str = "bookguide:accounts";

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Invalid email or password")]
    UnknownAccount,

    #[error("An account for '{0}' already exists")]
    AlreadyRegistered(String),

    #[error("Stored accounts are unreadable: {0}")]
    CorruptAccounts(#[source] serde_json::Error),

    #[error("Failed to encode identity: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Who is signed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub token: String,
}

impl Identity {
    pub fn new(email: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            token: token.into(),
        }
    }

    /// Issue a fresh identity for credentials that pass the form rules
    ///
    /// This does not consult the account registry; use
    /// [`SessionStore::sign_in`] or [`SessionStore::register`] to sign a
    /// user in.
    pub(crate) fn from_credentials(credentials: &Credentials) -> Result<Self, SessionError> {
        credentials.validate()?;
        Ok(Self::issue(credentials.email.trim()))
    }

    fn issue(email: &str) -> Self {
        Self {
            email: email.to_string(),
            token: Uuid::new_v4().simple().to_string(),
        }
    }
}

/// Email and password as typed by the user
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

// Keep the password out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    fn ensure_filled(&self) -> Result<(), SessionError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(SessionError::InvalidCredentials(
                "email and password are required".into(),
            ));
        }
        Ok(())
    }

    /// Check the registration rules: both filled, plausible email, long
    /// enough password
    pub fn validate(&self) -> Result<(), SessionError> {
        self.ensure_filled()?;
        let email = self.email.trim();
        if !email.contains('@') {
            return Err(SessionError::InvalidCredentials(format!(
                "'{}' is not an email address",
                email
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SessionError::InvalidCredentials(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    email: String,
    salt: String,
    password_hash: String,
}

impl Account {
    fn new(email: &str, password: &str) -> Self {
        let salt = Uuid::new_v4().simple().to_string();
        let password_hash = hash_password(&salt, password);
        Self {
            email: email.to_string(),
            salt,
            password_hash,
        }
    }

    fn matches_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }

    fn verify(&self, password: &str) -> bool {
        hash_password(&self.salt, password) == self.password_hash
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Persisted accounts and session
pub struct SessionStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Current identity; unreadable state counts as signed out
    pub fn current(&self) -> Option<Identity> {
        match self.storage.get_item(SESSION_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    warn!(error = %e, "stored session is unreadable; treating as signed out");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "failed to load session");
                None
            }
        }
    }

    fn read_accounts(&self) -> Result<Vec<Account>, SessionError> {
        match self.storage.get_item(ACCOUNTS_KEY)? {
            Some(json) => serde_json::from_str(&json).map_err(SessionError::CorruptAccounts),
            None => Ok(Vec::new()),
        }
    }

    /// Whether an account exists for `email`
    pub fn is_registered(&self, email: &str) -> Result<bool, SessionError> {
        let email = email.trim();
        Ok(self.read_accounts()?.iter().any(|a| a.matches_email(email)))
    }

    /// Create an account and sign it in
    pub fn register(&self, credentials: &Credentials) -> Result<Identity, SessionError> {
        let identity = Identity::from_credentials(credentials)?;

        let mut accounts = self.read_accounts()?;
        if accounts.iter().any(|a| a.matches_email(&identity.email)) {
            return Err(SessionError::AlreadyRegistered(identity.email));
        }
        accounts.push(Account::new(&identity.email, &credentials.password));
        self.storage
            .set_item(ACCOUNTS_KEY, &serde_json::to_string(&accounts)?)?;
        debug!(email = %identity.email, "registered account");

        self.login(&identity)?;
        Ok(identity)
    }

    /// Check credentials against the registered accounts and sign in
    pub fn sign_in(&self, credentials: &Credentials) -> Result<Identity, SessionError> {
        credentials.ensure_filled()?;
        let email = credentials.email.trim();

        let account = self
            .read_accounts()?
            .into_iter()
            .find(|a| a.matches_email(email))
            .filter(|a| a.verify(&credentials.password))
            .ok_or(SessionError::UnknownAccount)?;

        let identity = Identity::issue(&account.email);
        self.login(&identity)?;
        Ok(identity)
    }

    /// Store `identity` as the signed-in user, replacing any previous one
    pub fn login(&self, identity: &Identity) -> Result<(), SessionError> {
        let json = serde_json::to_string(identity)?;
        self.storage.set_item(SESSION_KEY, &json)?;
        debug!(email = %identity.email, "signed in");
        Ok(())
    }

    /// Forget the signed-in user
    pub fn logout(&self) -> Result<(), SessionError> {
        self.storage.remove_item(SESSION_KEY)?;
        debug!("signed out");
        Ok(())
    }
}
