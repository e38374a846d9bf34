//! Login state passed explicitly to whatever needs it.
//!
//! Credentials live in two tiers: a session tier that lasts for one visit
//! and a persistent tier for remembered logins. A login found only in the
//! persistent tier is promoted into the session tier on first check.

use std::collections::HashMap;

use tracing::debug;

const LOGGED_IN_KEY: &str = "stellarLoggedIn";
const EMAIL_KEY: &str = "stellarUserEmail";
const LAST_PAGE_KEY: &str = "stellarLastPage";

/// A string key/value store backing one credential tier.
pub trait CredentialTier {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// Tier held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTier {
    values: HashMap<String, String>,
}

impl CredentialTier for MemoryTier {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

fn flag_set(tier: &impl CredentialTier) -> bool {
    tier.get(LOGGED_IN_KEY).as_deref() == Some("true")
}

/// Session and persistent credential tiers.
#[derive(Debug, Clone, Default)]
pub struct SessionContext<S: CredentialTier = MemoryTier, P: CredentialTier = MemoryTier> {
    session: S,
    persistent: P,
}

impl<S: CredentialTier, P: CredentialTier> SessionContext<S, P> {
    pub fn new(session: S, persistent: P) -> Self {
        Self {
            session,
            persistent,
        }
    }

    /// Session tier first, then the persistent tier. A remembered login is
    /// copied into the session tier together with its e-mail.
    pub fn is_logged_in(&mut self) -> bool {
        if flag_set(&self.session) {
            return true;
        }
        if !flag_set(&self.persistent) {
            return false;
        }
        debug!("Promoting remembered login to session");
        self.session.set(LOGGED_IN_KEY, "true");
        if let Some(email) = self.persistent.get(EMAIL_KEY) {
            self.session.set(EMAIL_KEY, &email);
        }
        true
    }

    /// Log in. With `remember` the login also survives into later sessions.
    pub fn login(&mut self, email: &str, remember: bool) {
        self.session.set(LOGGED_IN_KEY, "true");
        self.session.set(EMAIL_KEY, email);
        if remember {
            self.persistent.set(LOGGED_IN_KEY, "true");
            self.persistent.set(EMAIL_KEY, email);
        }
        debug!("Logged in {} (remember: {})", email, remember);
    }

    /// Clear credentials from both tiers.
    pub fn logout(&mut self) {
        for key in [LOGGED_IN_KEY, EMAIL_KEY] {
            self.session.remove(key);
            self.persistent.remove(key);
        }
        debug!("Logged out");
    }

    /// E-mail of the current session, if any.
    pub fn user_email(&self) -> Option<String> {
        self.session.get(EMAIL_KEY)
    }

    /// Record a visit to a protected page and report whether access is
    /// allowed. The page is remembered either way so a login can return
    /// to it.
    pub fn check_access(&mut self, page: &str) -> bool {
        let page = page.rsplit('/').next().unwrap_or(page);
        self.session.set(LAST_PAGE_KEY, page);
        self.is_logged_in()
    }

    pub fn last_page(&self) -> Option<String> {
        self.session.get(LAST_PAGE_KEY)
    }

    pub fn session_tier(&self) -> &S {
        &self.session
    }

    pub fn persistent_tier(&self) -> &P {
        &self.persistent
    }

    /// Drop the session tier, keeping persistent credentials (a new visit).
    pub fn into_persistent(self) -> P {
        self.persistent
    }
}
