use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// A signed-in identity as surfaced by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("an account already exists for {0}")]
    EmailTaken(String),
    #[error("no account found for {0}")]
    UnknownUser(String),
    #[error("incorrect password")]
    WrongPassword,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
}

const MIN_PASSWORD_LEN: usize = 6;

/// Handle for removing a session listener.
pub type ListenerId = u64;

/// Callback invoked with the session state on every change.
pub type SessionListener = Box<dyn FnMut(Option<&User>)>;

/// The identity-provider contract consumed by the application.
///
/// Listeners fire with the new state on every sign-in/out, and once
/// immediately on subscribe with the current state, so a subscriber never
/// has to poll for the initial session.
pub trait AuthProvider {
    fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, AuthError>;

    fn sign_in(&mut self, email: &str, password: &str) -> Result<User, AuthError>;

    fn sign_out(&mut self);

    fn current_user(&self) -> Option<User>;

    fn subscribe(&mut self, listener: SessionListener) -> ListenerId;

    fn unsubscribe(&mut self, id: ListenerId);
}

struct Account {
    user: User,
    password_digest: [u8; 32],
}

/// In-memory auth backend: a development and test stand-in for the hosted
/// identity provider. Accounts are keyed by normalized email and passwords
/// are stored as salted SHA-256 digests.
#[derive(Default)]
pub struct MemoryAuth {
    accounts: std::collections::HashMap<String, Account>,
    current: Option<User>,
    listeners: Vec<(ListenerId, SessionListener)>,
    next_listener: ListenerId,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify_all(&mut self) {
        let current = self.current.clone();
        for (_, listener) in &mut self.listeners {
            listener(current.as_ref());
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn digest_password(uid: &str, password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(uid.as_bytes());
    hasher.update([0]);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

fn avatar_url(email: &str) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={email}")
}

impl AuthProvider for MemoryAuth {
    fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, AuthError> {
        let email = normalize_email(email);
        if self.accounts.contains_key(&email) {
            return Err(AuthError::EmailTaken(email));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let uid = Uuid::new_v4().to_string();
        let user = User {
            uid: uid.clone(),
            email: email.clone(),
            display_name: display_name.trim().to_string(),
            photo_url: Some(avatar_url(&email)),
        };
        self.accounts.insert(
            email,
            Account {
                user: user.clone(),
                password_digest: digest_password(&uid, password),
            },
        );
        debug!("signed up {}", user.uid);

        self.current = Some(user.clone());
        self.notify_all();
        Ok(user)
    }

    fn sign_in(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);
        let account = self
            .accounts
            .get(&email)
            .ok_or_else(|| AuthError::UnknownUser(email.clone()))?;
        if digest_password(&account.user.uid, password) != account.password_digest {
            return Err(AuthError::WrongPassword);
        }
        let user = account.user.clone();
        debug!("signed in {}", user.uid);

        self.current = Some(user.clone());
        self.notify_all();
        Ok(user)
    }

    fn sign_out(&mut self) {
        if self.current.take().is_some() {
            debug!("signed out");
            self.notify_all();
        }
    }

    fn current_user(&self) -> Option<User> {
        self.current.clone()
    }

    fn subscribe(&mut self, mut listener: SessionListener) -> ListenerId {
        let id = self.next_listener;
        self.next_listener += 1;
        // Fire immediately with the current state.
        listener(self.current.as_ref());
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }
}
