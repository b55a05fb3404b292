//! In-memory collaborators for exercising [`SessionManager`](super::SessionManager)
//! without Postgres or a live identity provider.
//!
//! Enabled for this crate's tests and for downstream crates through the
//! `test-support` feature. Each type offers failure injection and call
//! counters so tests can assert on ordering and compensating actions.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;
use uuid::Uuid;

use super::ports::{
    AccountMetadata, CredentialProvider, NewSessionRecord, NewUserProfile, NotifyError,
    Principal, ProviderError, SessionLedger, SessionRecord, SignupNotifier, StoreError,
    TokenGrant, UserStore,
};
use crate::types::{DbId, OwnerId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// MemorySessionLedger
// ---------------------------------------------------------------------------

struct StoredSession {
    refresh_token: String,
    record: SessionRecord,
}

/// Session ledger backed by a mutex-guarded vector.
#[derive(Default)]
pub struct MemorySessionLedger {
    rows: Mutex<Vec<StoredSession>>,
    fail_inserts: AtomicBool,
    fail_revocations: AtomicBool,
}

impl MemorySessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `insert` fail.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `mark_revoked` / `revoke_all_for_owner` fail.
    pub fn fail_revocations(&self, fail: bool) {
        self.fail_revocations.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of all records in insertion order.
    pub fn records(&self) -> Vec<SessionRecord> {
        lock(&self.rows).iter().map(|s| s.record.clone()).collect()
    }

    /// The record stored for `refresh_token`, if any.
    pub fn record_for(&self, refresh_token: &str) -> Option<SessionRecord> {
        lock(&self.rows)
            .iter()
            .find(|s| s.refresh_token == refresh_token)
            .map(|s| s.record.clone())
    }
}

#[async_trait]
impl SessionLedger for MemorySessionLedger {
    async fn insert(&self, record: NewSessionRecord) -> Result<SessionRecord, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::new("injected insert failure"));
        }
        let mut rows = lock(&self.rows);
        if rows.iter().any(|s| s.refresh_token == record.refresh_token) {
            return Err(StoreError::new("duplicate refresh token"));
        }
        let now = Utc::now();
        let stored = SessionRecord {
            id: Uuid::new_v4(),
            owner_id: record.owner_id,
            revoked: false,
            expires_at: record.expires_at,
            created_at: now,
            updated_at: now,
        };
        rows.push(StoredSession {
            refresh_token: record.refresh_token,
            record: stored.clone(),
        });
        Ok(stored)
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.record_for(refresh_token))
    }

    async fn mark_revoked(&self, id: DbId) -> Result<bool, StoreError> {
        if self.fail_revocations.load(Ordering::SeqCst) {
            return Err(StoreError::new("injected revocation failure"));
        }
        let mut rows = lock(&self.rows);
        match rows.iter_mut().find(|s| s.record.id == id) {
            Some(stored) if !stored.record.revoked => {
                stored.record.revoked = true;
                stored.record.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_owner(&self, owner_id: OwnerId) -> Result<u64, StoreError> {
        if self.fail_revocations.load(Ordering::SeqCst) {
            return Err(StoreError::new("injected revocation failure"));
        }
        let mut rows = lock(&self.rows);
        let now = Utc::now();
        let mut revoked = 0;
        for stored in rows
            .iter_mut()
            .filter(|s| s.record.owner_id == owner_id && !s.record.revoked)
        {
            stored.record.revoked = true;
            stored.record.updated_at = now;
            revoked += 1;
        }
        Ok(revoked)
    }
}

// ---------------------------------------------------------------------------
// MemoryUserStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryUserStore {
    profiles: Mutex<Vec<NewUserProfile>>,
    fail_inserts: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn profiles(&self) -> Vec<NewUserProfile> {
        lock(&self.profiles).clone()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(lock(&self.profiles).iter().any(|p| p.email == email))
    }

    async fn insert(&self, profile: &NewUserProfile) -> Result<(), StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::new("injected insert failure"));
        }
        lock(&self.profiles).push(profile.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryCredentialProvider
// ---------------------------------------------------------------------------

struct Account {
    owner_id: OwnerId,
    email: String,
    password: String,
}

#[derive(Default)]
struct ProviderState {
    accounts: Vec<Account>,
    access_tokens: HashMap<String, OwnerId>,
    refresh_tokens: HashMap<String, OwnerId>,
    scripted: VecDeque<TokenGrant>,
    deleted: Vec<OwnerId>,
    recovery_emails: Vec<String>,
    issued: u64,
}

/// A self-contained identity provider.
///
/// Issues `access-N` / `refresh-N` tokens unless grants were queued with
/// [`queue_grant`](Self::queue_grant). Refresh tokens are single use, and
/// `invalidate` ends every provider session of the owner.
pub struct MemoryCredentialProvider {
    state: Mutex<ProviderState>,
    token_ttl: chrono::Duration,
    unavailable: AtomicBool,
    refresh_calls: AtomicUsize,
    invalidate_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl Default for MemoryCredentialProvider {
    fn default() -> Self {
        Self {
            state: Mutex::default(),
            token_ttl: chrono::Duration::hours(1),
            unavailable: AtomicBool::new(false),
            refresh_calls: AtomicUsize::new(0),
            invalidate_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }
}

impl MemoryCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account and return its owner id.
    pub fn with_account(&self, email: &str, password: &str) -> OwnerId {
        let owner_id = Uuid::new_v4();
        self.add_account(owner_id, email, password);
        owner_id
    }

    /// Register an account under a fixed owner id.
    pub fn add_account(&self, owner_id: OwnerId, email: &str, password: &str) {
        lock(&self.state).accounts.push(Account {
            owner_id,
            email: email.to_string(),
            password: password.to_string(),
        });
    }

    /// Use `grant`'s tokens and expiry for the next issuance. The owner id is
    /// always taken from the authenticated account.
    pub fn queue_grant(&self, grant: TokenGrant) {
        lock(&self.state).scripted.push_back(grant);
    }

    /// Simulate an unreachable provider.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn invalidate_calls(&self) -> usize {
        self.invalidate_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn deleted_accounts(&self) -> Vec<OwnerId> {
        lock(&self.state).deleted.clone()
    }

    pub fn has_account(&self, email: &str) -> bool {
        lock(&self.state).accounts.iter().any(|a| a.email == email)
    }

    pub fn recovery_emails(&self) -> Vec<String> {
        lock(&self.state).recovery_emails.clone()
    }

    /// Whether the provider still honours `access_token`.
    pub fn is_access_token_live(&self, access_token: &str) -> bool {
        lock(&self.state).access_tokens.contains_key(access_token)
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("connection refused".into()));
        }
        Ok(())
    }

    fn issue(&self, state: &mut ProviderState, owner_id: OwnerId) -> TokenGrant {
        let grant = match state.scripted.pop_front() {
            Some(scripted) => TokenGrant {
                owner_id,
                ..scripted
            },
            None => {
                state.issued += 1;
                TokenGrant {
                    owner_id,
                    access_token: format!("access-{}", state.issued),
                    refresh_token: format!("refresh-{}", state.issued),
                    expires_at: Utc::now() + self.token_ttl,
                }
            }
        };
        state
            .access_tokens
            .insert(grant.access_token.clone(), owner_id);
        state
            .refresh_tokens
            .insert(grant.refresh_token.clone(), owner_id);
        grant
    }
}

fn rejected(status: u16, code: &str, message: &str) -> ProviderError {
    ProviderError::Rejected {
        status,
        code: Some(code.to_string()),
        message: message.to_string(),
    }
}

#[async_trait]
impl CredentialProvider for MemoryCredentialProvider {
    async fn token_by_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenGrant, ProviderError> {
        self.check_available()?;
        let mut state = lock(&self.state);
        let owner_id = state
            .accounts
            .iter()
            .find(|a| a.email == email && a.password == password)
            .map(|a| a.owner_id)
            .ok_or_else(|| rejected(400, "invalid_credentials", "Invalid login credentials"))?;
        Ok(self.issue(&mut state, owner_id))
    }

    async fn validate(&self, access_token: &str) -> Result<Principal, ProviderError> {
        self.check_available()?;
        let state = lock(&self.state);
        let owner_id = *state
            .access_tokens
            .get(access_token)
            .ok_or_else(|| rejected(401, "bad_jwt", "invalid JWT"))?;
        let email = state
            .accounts
            .iter()
            .find(|a| a.owner_id == owner_id)
            .map(|a| a.email.clone());
        Ok(Principal { owner_id, email })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut state = lock(&self.state);
        let owner_id = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| rejected(400, "refresh_token_not_found", "Invalid Refresh Token"))?;
        Ok(self.issue(&mut state, owner_id))
    }

    async fn invalidate(&self, access_token: &str) -> Result<(), ProviderError> {
        self.invalidate_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut state = lock(&self.state);
        let owner_id = *state
            .access_tokens
            .get(access_token)
            .ok_or_else(|| rejected(401, "bad_jwt", "invalid JWT"))?;
        state.access_tokens.retain(|_, owner| *owner != owner_id);
        state.refresh_tokens.retain(|_, owner| *owner != owner_id);
        Ok(())
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        _metadata: &AccountMetadata,
    ) -> Result<OwnerId, ProviderError> {
        self.check_available()?;
        if self.has_account(email) {
            return Err(ProviderError::AlreadyExists);
        }
        Ok(self.with_account(email, password))
    }

    async fn admin_delete_account(&self, owner_id: OwnerId) -> Result<(), ProviderError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let mut state = lock(&self.state);
        state.accounts.retain(|a| a.owner_id != owner_id);
        state.deleted.push(owner_id);
        Ok(())
    }

    async fn send_password_recovery(&self, email: &str) -> Result<(), ProviderError> {
        self.check_available()?;
        lock(&self.state).recovery_emails.push(email.to_string());
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        self.check_available()?;
        let mut state = lock(&self.state);
        let owner_id = *state
            .access_tokens
            .get(access_token)
            .ok_or_else(|| rejected(401, "bad_jwt", "invalid JWT"))?;
        if let Some(account) = state.accounts.iter_mut().find(|a| a.owner_id == owner_id) {
            account.password = new_password.to_string();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Records the email of every notified signup.
#[derive(Default)]
pub struct RecordingNotifier {
    notified: Mutex<Vec<String>>,
    fail: AtomicBool,
    signal: Notify,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make notifications fail (after being recorded).
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn notified(&self) -> Vec<String> {
        lock(&self.notified).clone()
    }

    /// Wait until at least `count` notifications were attempted.
    pub async fn wait_for(&self, count: usize) {
        loop {
            let signalled = self.signal.notified();
            if lock(&self.notified).len() >= count {
                return;
            }
            signalled.await;
        }
    }
}

#[async_trait]
impl SignupNotifier for RecordingNotifier {
    async fn account_created(&self, profile: &NewUserProfile) -> Result<(), NotifyError> {
        lock(&self.notified).push(profile.email.clone());
        self.signal.notify_one();
        if self.fail.load(Ordering::SeqCst) {
            return Err("injected notification failure".into());
        }
        Ok(())
    }
}
