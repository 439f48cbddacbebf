use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use super::token::{RandomTokens, TokenSource};
use crate::errors::StoreError;
use crate::portal::domain::{Account, Caller, Record};

/// Upper bound on secret-code candidates tried for a single account.
pub const MAX_TOKEN_ATTEMPTS: usize = 16;

/// Read-only counters over the store contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub accounts: usize,
    pub records: usize,
    pub resolved: usize,
}

#[derive(Debug, Clone)]
struct AccountRow {
    id: u64,
    secret_code: String,
    name: String,
    email: String,
    is_admin: bool,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<u64, AccountRow>,
    by_email: HashMap<String, u64>,
    by_token: HashMap<String, u64>,
    // Ids are allocated in increasing order, so key order is insertion order.
    records: BTreeMap<u64, Record>,
    by_owner: HashMap<u64, Vec<u64>>,
    last_account_id: u64,
    last_record_id: u64,
    resolved: usize,
}

impl Inner {
    fn view(&self, row: &AccountRow) -> Account {
        Account {
            id: row.id,
            secret_code: row.secret_code.clone(),
            name: row.name.clone(),
            email: row.email.clone(),
            complaints: self.owned_records(row.id),
            is_admin: row.is_admin,
        }
    }

    fn owned_records(&self, owner_id: u64) -> Vec<Record> {
        self.by_owner
            .get(&owner_id)
            .map(|ids| ids.iter().filter_map(|id| self.records.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    fn unique_token(&self, tokens: &dyn TokenSource) -> Result<String, StoreError> {
        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let candidate = tokens.generate();
            if !self.by_token.contains_key(&candidate) {
                return Ok(candidate);
            }
            debug!(attempt, "secret code collision, retrying");
        }
        Err(StoreError::TokenExhausted(MAX_TOKEN_ATTEMPTS))
    }

    fn insert_account(&mut self, secret_code: String, name: &str, email: &str, is_admin: bool) -> Account {
        self.last_account_id += 1;
        let row = AccountRow {
            id: self.last_account_id,
            secret_code,
            name: name.to_string(),
            email: email.to_string(),
            is_admin,
        };
        self.by_email.insert(row.email.clone(), row.id);
        self.by_token.insert(row.secret_code.clone(), row.id);
        let account = self.view(&row);
        self.accounts.insert(row.id, row);
        account
    }
}

/// Concurrent in-memory holder of all accounts and complaints.
///
/// Lookups take the shared guard and may run in parallel; every mutation takes the
/// exclusive guard for its whole duration. No method does I/O while holding the lock.
pub struct Store {
    inner: RwLock<Inner>,
    tokens: Box<dyn TokenSource>,
}

impl Default for Store {
    fn default() -> Self { Self::new() }
}

impl Store {
    pub fn new() -> Self { Self::with_token_source(RandomTokens::default()) }

    pub fn with_token_source<T: TokenSource + 'static>(tokens: T) -> Self {
        Self { inner: RwLock::new(Inner::default()), tokens: Box::new(tokens) }
    }

    /// Create the administrator account with a fixed, well-known secret code.
    pub fn bootstrap_admin(&self, name: &str, email: &str, secret_code: &str) -> Result<Account, StoreError> {
        let mut inner = self.inner.write();
        if inner.by_email.contains_key(email) || inner.by_token.contains_key(secret_code) {
            return Err(StoreError::Conflict);
        }
        let account = inner.insert_account(secret_code.to_string(), name, email, true);
        debug!(account_id = account.id, "admin account created");
        Ok(account)
    }

    /// Register a regular account. Fails with `Conflict` if the email is taken.
    pub fn create_account(&self, name: &str, email: &str) -> Result<Account, StoreError> {
        let mut inner = self.inner.write();
        if inner.by_email.contains_key(email) {
            return Err(StoreError::Conflict);
        }
        let secret_code = inner.unique_token(self.tokens.as_ref())?;
        let account = inner.insert_account(secret_code, name, email, false);
        debug!(account_id = account.id, "account created");
        Ok(account)
    }

    pub fn find_by_token(&self, secret_code: &str) -> Option<Account> {
        let inner = self.inner.read();
        let id = inner.by_token.get(secret_code)?;
        inner.accounts.get(id).map(|row| inner.view(row))
    }

    /// Identity of the token's owner without materialising its complaint list.
    pub fn caller_by_token(&self, secret_code: &str) -> Option<Caller> {
        let inner = self.inner.read();
        let id = inner.by_token.get(secret_code)?;
        inner.accounts.get(id).map(|row| Caller { id: row.id, is_admin: row.is_admin })
    }

    pub fn email_taken(&self, email: &str) -> bool {
        self.inner.read().by_email.contains_key(email)
    }

    pub fn find_by_email(&self, email: &str) -> Option<Account> {
        let inner = self.inner.read();
        let id = inner.by_email.get(email)?;
        inner.accounts.get(id).map(|row| inner.view(row))
    }

    /// Store a new open complaint for `owner_id`, snapshotting the owner's name.
    pub fn create_record(&self, owner_id: u64, title: &str, summary: &str, rating: u8) -> Result<Record, StoreError> {
        let mut inner = self.inner.write();
        let user_name = inner
            .accounts
            .get(&owner_id)
            .map(|row| row.name.clone())
            .ok_or(StoreError::OwnerNotFound(owner_id))?;

        inner.last_record_id += 1;
        let record = Record {
            id: inner.last_record_id,
            title: title.to_string(),
            summary: summary.to_string(),
            rating,
            user_id: owner_id,
            user_name,
            is_resolved: false,
            created_at: Utc::now(),
            resolved_at: None,
        };
        inner.records.insert(record.id, record.clone());
        inner.by_owner.entry(owner_id).or_default().push(record.id);
        debug!(record_id = record.id, owner_id, "complaint stored");
        Ok(record)
    }

    pub fn records_by_owner(&self, owner_id: u64) -> Vec<Record> {
        self.inner.read().owned_records(owner_id)
    }

    pub fn all_records(&self) -> Vec<Record> {
        self.inner.read().records.values().cloned().collect()
    }

    pub fn get_record(&self, id: u64) -> Option<Record> {
        self.inner.read().records.get(&id).cloned()
    }

    /// Mark a complaint resolved. The transition happens at most once per complaint.
    pub fn resolve_record(&self, id: u64) -> Result<Record, StoreError> {
        let mut inner = self.inner.write();
        let record = inner.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.is_resolved {
            return Err(StoreError::AlreadyResolved(id));
        }
        record.is_resolved = true;
        record.resolved_at = Some(Utc::now());
        let record = record.clone();
        inner.resolved += 1;
        debug!(record_id = id, "complaint resolved");
        Ok(record)
    }

    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read();
        StoreStats {
            accounts: inner.accounts.len(),
            records: inner.records.len(),
            resolved: inner.resolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ADMIN_CODE: &str = "ADMIN_SECRET_123";

    fn store_with_admin() -> Store {
        let store = Store::new();
        store
            .bootstrap_admin("System Administrator", "admin@complaintportal.com", ADMIN_CODE)
            .unwrap();
        store
    }

    /// Hands out tokens from a fixed script, repeating the last one forever.
    struct ScriptedTokens {
        script: Vec<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl TokenSource for ScriptedTokens {
        fn generate(&self) -> String {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let idx = n.min(self.script.len() - 1);
            self.script[idx].to_string()
        }
    }

    #[test]
    fn first_registered_account_gets_id_two() {
        let store = store_with_admin();
        let ann = store.create_account("Ann", "ann@x.com").unwrap();
        assert_eq!(ann.id, 2);
        assert!(!ann.is_admin);
        assert!(ann.complaints.is_empty());

        let found = store.find_by_token(&ann.secret_code).unwrap();
        assert_eq!(found, ann);
        assert_eq!(store.find_by_email("ann@x.com").unwrap().id, 2);
    }

    #[test]
    fn admin_is_found_by_well_known_code() {
        let store = store_with_admin();
        let admin = store.find_by_token(ADMIN_CODE).unwrap();
        assert_eq!(admin.id, 1);
        assert!(admin.is_admin);
    }

    #[test]
    fn bootstrap_admin_twice_conflicts() {
        let store = store_with_admin();
        let err = store.bootstrap_admin("Other", "other@x.com", ADMIN_CODE).unwrap_err();
        assert_eq!(err, StoreError::Conflict);
        assert_eq!(store.stats().accounts, 1);
    }

    #[test]
    fn duplicate_email_conflicts_without_consuming_an_id() {
        let store = store_with_admin();
        store.create_account("Bo", "dup@x.com").unwrap();
        let err = store.create_account("Cy", "dup@x.com").unwrap_err();
        assert_eq!(err, StoreError::Conflict);

        let next = store.create_account("Di", "di@x.com").unwrap();
        assert_eq!(next.id, 3);
    }

    #[test]
    fn email_match_is_case_sensitive() {
        let store = store_with_admin();
        store.create_account("Ann", "ann@x.com").unwrap();
        assert!(store.create_account("Ann", "Ann@x.com").is_ok());
        assert!(store.find_by_email("ANN@X.COM").is_none());
    }

    #[test]
    fn unknown_lookups_are_absent() {
        let store = store_with_admin();
        assert!(store.find_by_token("nope").is_none());
        assert!(store.find_by_email("nope@x.com").is_none());
        assert!(store.get_record(1).is_none());
        assert!(store.records_by_owner(99).is_empty());
    }

    #[test]
    fn colliding_tokens_are_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = Store::with_token_source(ScriptedTokens {
            script: vec!["SEC_A", "SEC_A", "SEC_A", "SEC_B"],
            calls: calls.clone(),
        });
        let a = store.create_account("A", "a@x.com").unwrap();
        let b = store.create_account("B", "b@x.com").unwrap();
        assert_eq!(a.secret_code, "SEC_A");
        assert_eq!(b.secret_code, "SEC_B");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn exhausted_token_source_fails_cleanly() {
        let store = Store::with_token_source(ScriptedTokens {
            script: vec!["SEC_SAME"],
            calls: Arc::new(AtomicUsize::new(0)),
        });
        store.create_account("A", "a@x.com").unwrap();
        let err = store.create_account("B", "b@x.com").unwrap_err();
        assert_eq!(err, StoreError::TokenExhausted(MAX_TOKEN_ATTEMPTS));
        assert!(store.find_by_email("b@x.com").is_none());

        // the failed attempt must not burn an id
        assert_eq!(store.stats().accounts, 1);
    }

    #[test]
    fn admin_code_is_never_handed_out_again() {
        let store = Store::with_token_source(ScriptedTokens {
            script: vec![ADMIN_CODE, "SEC_FRESH"],
            calls: Arc::new(AtomicUsize::new(0)),
        });
        store.bootstrap_admin("Admin", "admin@x.com", ADMIN_CODE).unwrap();
        let user = store.create_account("U", "u@x.com").unwrap();
        assert_eq!(user.secret_code, "SEC_FRESH");
    }

    #[test]
    fn record_lifecycle_keeps_owner_view_in_step() {
        let store = store_with_admin();
        let ann = store.create_account("Ann", "ann@x.com").unwrap();
        let rec = store.create_record(ann.id, "Broken", "Lamp is broken", 5).unwrap();
        assert_eq!(rec.id, 1);
        assert_eq!(rec.user_name, "Ann");
        assert!(!rec.is_resolved);
        assert!(rec.resolved_at.is_none());

        let owned = store.records_by_owner(ann.id);
        assert_eq!(owned, vec![rec.clone()]);
        assert_eq!(store.find_by_token(&ann.secret_code).unwrap().complaints, owned);

        let resolved = store.resolve_record(rec.id).unwrap();
        assert!(resolved.is_resolved);
        assert!(resolved.resolved_at.is_some());

        let fetched = store.get_record(rec.id).unwrap();
        assert_eq!(fetched, resolved);
        assert_eq!(store.records_by_owner(ann.id), vec![resolved.clone()]);
        assert_eq!(store.find_by_token(&ann.secret_code).unwrap().complaints, vec![resolved.clone()]);

        let err = store.resolve_record(rec.id).unwrap_err();
        assert_eq!(err, StoreError::AlreadyResolved(rec.id));
        assert_eq!(store.get_record(rec.id).unwrap(), resolved);
    }

    #[test]
    fn resolve_unknown_record_is_not_found() {
        let store = store_with_admin();
        assert_eq!(store.resolve_record(42).unwrap_err(), StoreError::NotFound(42));
    }

    #[test]
    fn record_for_unknown_owner_is_rejected() {
        let store = store_with_admin();
        let err = store.create_record(77, "t", "s", 3).unwrap_err();
        assert_eq!(err, StoreError::OwnerNotFound(77));
        assert!(store.all_records().is_empty());
    }

    #[test]
    fn listings_follow_insertion_order() {
        let store = store_with_admin();
        let a = store.create_account("A", "a@x.com").unwrap();
        let b = store.create_account("B", "b@x.com").unwrap();
        let r1 = store.create_record(a.id, "one", "s", 1).unwrap();
        let r2 = store.create_record(b.id, "two", "s", 10).unwrap();
        let r3 = store.create_record(a.id, "three", "s", 4).unwrap();

        let all: Vec<u64> = store.all_records().iter().map(|r| r.id).collect();
        assert_eq!(all, vec![r1.id, r2.id, r3.id]);
        let mine: Vec<u64> = store.records_by_owner(a.id).iter().map(|r| r.id).collect();
        assert_eq!(mine, vec![r1.id, r3.id]);

        store.resolve_record(r2.id).unwrap();
        assert_eq!(store.stats(), StoreStats { accounts: 3, records: 3, resolved: 1 });
    }

    #[test]
    fn parallel_registrations_get_contiguous_ids_and_unique_codes() {
        let store = store_with_admin();
        let n = 64;
        let accounts: Vec<Account> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..n)
                .map(|i| {
                    let store = &store;
                    s.spawn(move || store.create_account(&format!("user{i}"), &format!("user{i}@x.com")).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let mut ids: Vec<u64> = accounts.iter().map(|a| a.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (2..2 + n as u64).collect::<Vec<_>>());

        let codes: HashSet<&str> = accounts.iter().map(|a| a.secret_code.as_str()).collect();
        assert_eq!(codes.len(), n);
        assert!(!codes.contains(ADMIN_CODE));
    }

    #[test]
    fn racing_same_email_only_one_wins() {
        let store = store_with_admin();
        let results: Vec<Result<Account, StoreError>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let store = &store;
                    s.spawn(move || store.create_account(&format!("racer{i}"), "same@x.com"))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|e| *e == StoreError::Conflict));
    }

    #[test]
    fn concurrent_resolves_succeed_exactly_once() {
        let store = store_with_admin();
        let ann = store.create_account("Ann", "ann@x.com").unwrap();
        let rec = store.create_record(ann.id, "t", "s", 7).unwrap();

        let ok = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = &store;
                    s.spawn(move || store.resolve_record(rec.id).is_ok())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count()
        });
        assert_eq!(ok, 1);
        assert_eq!(store.stats().resolved, 1);
    }

    #[test]
    fn resolved_count_ignores_failed_resolves() {
        let store = store_with_admin();
        let ann = store.create_account("Ann", "ann@x.com").unwrap();
        let r1 = store.create_record(ann.id, "one", "s", 2).unwrap();
        let r2 = store.create_record(ann.id, "two", "s", 3).unwrap();

        store.resolve_record(r1.id).unwrap();
        assert_eq!(store.resolve_record(r1.id), Err(StoreError::AlreadyResolved(r1.id)));
        assert_eq!(store.resolve_record(99), Err(StoreError::NotFound(99)));
        assert_eq!(store.stats(), StoreStats { accounts: 2, records: 2, resolved: 1 });

        store.resolve_record(r2.id).unwrap();
        assert_eq!(store.stats().resolved, 2);
        let counted = store.all_records().iter().filter(|r| r.is_resolved).count();
        assert_eq!(store.stats().resolved, counted);
    }

    #[test]
    fn caller_lookup_matches_account() {
        let store = store_with_admin();
        let ann = store.create_account("Ann", "ann@x.com").unwrap();
        store.create_record(ann.id, "t", "s", 5).unwrap();

        assert_eq!(store.caller_by_token(&ann.secret_code), Some(Caller { id: ann.id, is_admin: false }));
        assert_eq!(store.caller_by_token(ADMIN_CODE), Some(Caller { id: 1, is_admin: true }));
        assert_eq!(store.caller_by_token("SEC_nope"), None);
        assert!(store.email_taken("ann@x.com"));
        assert!(!store.email_taken("bob@x.com"));
    }

    #[test]
    fn readers_never_see_owner_view_disagree_with_record() {
        let store = store_with_admin();
        let ann = store.create_account("Ann", "ann@x.com").unwrap();
        let ids: Vec<u64> = (0..50)
            .map(|i| store.create_record(ann.id, &format!("t{i}"), "s", 5).unwrap().id)
            .collect();

        std::thread::scope(|s| {
            let store = &store;
            s.spawn(move || {
                for id in &ids {
                    store.resolve_record(*id).unwrap();
                }
            });
            for _ in 0..4 {
                s.spawn(move || {
                    for _ in 0..200 {
                        for owned in store.records_by_owner(ann.id) {
                            let authoritative = store.get_record(owned.id).unwrap();
                            // a later read can only be "more resolved"
                            if owned.is_resolved {
                                assert_eq!(owned, authoritative);
                            }
                            assert_eq!(owned.is_resolved, owned.resolved_at.is_some());
                        }
                    }
                });
            }
        });

        assert!(store.records_by_owner(ann.id).iter().all(|r| r.is_resolved));
    }
}
