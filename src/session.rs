use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long an issued state token stays redeemable. Authorization codes are
/// short-lived anyway; abandoned attempts should not accumulate.
const SESSION_TTL: Duration = Duration::from_secs(600);

/// One pending authorization attempt, bound to the state token it was
/// issued under.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub code_verifier: String,
    pub redirect_uri: String,
    created_at: Instant,
}

impl PendingAuthorization {
    pub fn new(code_verifier: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            code_verifier: code_verifier.into(),
            redirect_uri: redirect_uri.into(),
            created_at: Instant::now(),
        }
    }

    fn expired(&self) -> bool {
        self.created_at.elapsed() > SESSION_TTL
    }
}

/// In-memory store of pending authorization attempts, keyed by the state
/// token itself. Each entry is single-use: `take` removes it, so a replayed
/// state finds nothing and the callback is rejected. Concurrent attempts
/// hold distinct states and never see each other's verifier.
#[derive(Debug, Default)]
pub struct SessionStore {
    pending: Mutex<HashMap<String, PendingAuthorization>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, state: impl Into<String>, pending: PendingAuthorization) {
        let mut map = self.pending.lock().expect("session store poisoned");
        map.retain(|_, entry| !entry.expired());
        map.insert(state.into(), pending);
    }

    /// Removes and returns the attempt for `state`, if one was issued and
    /// has not expired or already been redeemed.
    pub fn take(&self, state: &str) -> Option<PendingAuthorization> {
        let mut map = self.pending.lock().expect("session store poisoned");
        map.remove(state).filter(|entry| !entry.expired())
    }
}
