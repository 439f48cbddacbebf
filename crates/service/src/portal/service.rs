use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::domain::{Account, Caller, ComplaintRefInput, Record, RegisterInput, SecretCodeInput, SubmitComplaintInput};
use super::errors::PortalError;
use crate::store::{Store, StoreStats};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 10;

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str, PortalError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortalError::Validation(format!("{what} is required")));
    }
    Ok(trimmed)
}

fn complaint_id(raw: i64) -> Result<u64, PortalError> {
    u64::try_from(raw)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| PortalError::Validation("Valid complaint ID is required".into()))
}

fn rating(raw: i64) -> Result<u8, PortalError> {
    if !(MIN_RATING..=MAX_RATING).contains(&raw) {
        return Err(PortalError::Validation(format!("Rating must be between {MIN_RATING} and {MAX_RATING}")));
    }
    u8::try_from(raw).map_err(|e| PortalError::Validation(e.to_string()))
}

/// Complaint portal business service independent of web framework
#[derive(Clone)]
pub struct PortalService {
    store: Arc<Store>,
}

impl PortalService {
    pub fn new(store: Arc<Store>) -> Self { Self { store } }

    pub fn store(&self) -> &Store { &self.store }

    pub fn stats(&self) -> StoreStats { self.store.stats() }

    /// Register a new, non-admin account.
    ///
    /// # Examples
    /// ```
    /// use service::{PortalService, Store};
    /// use service::portal::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let svc = PortalService::new(Arc::new(Store::new()));
    /// let user = svc.register(RegisterInput { name: " Ann ".into(), email: "ann@x.com".into() }).unwrap();
    /// assert_eq!(user.name, "Ann");
    /// assert!(user.secret_code.starts_with("SEC_"));
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub fn register(&self, input: RegisterInput) -> Result<Account, PortalError> {
        let name = required(&input.name, "Name")?;
        let email = required(&input.email, "Email")?;
        if self.store.email_taken(email) {
            debug!("email already registered");
            return Err(PortalError::Conflict);
        }
        // the store re-checks the email under its write lock
        let account = self.store.create_account(name, email)?;
        info!(user_id = account.id, "account_registered");
        Ok(account)
    }

    /// Resolve a secret code to its account.
    #[instrument(skip_all)]
    pub fn login(&self, input: SecretCodeInput) -> Result<Account, PortalError> {
        let code = required(&input.secret_code, "Secret code")?;
        self.store.find_by_token(code).ok_or_else(|| {
            warn!("invalid secret code");
            PortalError::Unauthorized
        })
    }

    #[instrument(skip(self, input), fields(rating = input.rating))]
    pub fn submit_complaint(&self, input: SubmitComplaintInput) -> Result<Record, PortalError> {
        let code = required(&input.secret_code, "Secret code")?;
        let title = required(&input.title, "Title")?;
        let summary = required(&input.summary, "Summary")?;
        let rating = rating(input.rating)?;
        let user = self.lookup(code)?;

        let record = self.store.create_record(user.id, title, summary, rating)?;
        info!(complaint_id = record.id, user_id = user.id, "complaint_submitted");
        Ok(record)
    }

    #[instrument(skip_all)]
    pub fn complaints_for_user(&self, input: SecretCodeInput) -> Result<Vec<Record>, PortalError> {
        let user = self.authenticate(&input.secret_code)?;
        Ok(self.store.records_by_owner(user.id))
    }

    #[instrument(skip_all)]
    pub fn complaints_for_admin(&self, input: SecretCodeInput) -> Result<Vec<Record>, PortalError> {
        let user = self.authenticate(&input.secret_code)?;
        require_admin(&user)?;
        Ok(self.store.all_records())
    }

    /// Fetch one complaint. Non-admin callers may only see their own.
    #[instrument(skip(self, input), fields(complaint_id = input.complaint_id))]
    pub fn view_complaint(&self, input: ComplaintRefInput) -> Result<Record, PortalError> {
        let code = required(&input.secret_code, "Secret code")?;
        let id = complaint_id(input.complaint_id)?;
        let user = self.lookup(code)?;

        let record = self.store.get_record(id).ok_or(PortalError::NotFound)?;
        if !user.is_admin && record.user_id != user.id {
            warn!(user_id = user.id, complaint_id = id, "complaint access denied");
            return Err(PortalError::Forbidden("Access denied. You can only view your own complaints".into()));
        }
        Ok(record)
    }

    #[instrument(skip(self, input), fields(complaint_id = input.complaint_id))]
    pub fn resolve_complaint(&self, input: ComplaintRefInput) -> Result<Record, PortalError> {
        let code = required(&input.secret_code, "Secret code")?;
        let id = complaint_id(input.complaint_id)?;
        let user = self.lookup(code)?;
        require_admin(&user)?;

        let record = self.store.resolve_record(id)?;
        info!(complaint_id = id, admin_id = user.id, "complaint_resolved");
        Ok(record)
    }

    fn authenticate(&self, secret_code: &str) -> Result<Caller, PortalError> {
        let code = required(secret_code, "Secret code")?;
        self.lookup(code)
    }

    fn lookup(&self, code: &str) -> Result<Caller, PortalError> {
        self.store.caller_by_token(code).ok_or_else(|| {
            warn!("invalid secret code");
            PortalError::Unauthorized
        })
    }
}

fn require_admin(user: &Caller) -> Result<(), PortalError> {
    if user.is_admin {
        Ok(())
    } else {
        warn!(user_id = user.id, "admin privileges required");
        Err(PortalError::admin_required())
    }
}
