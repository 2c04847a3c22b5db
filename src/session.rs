//! Session store: who is logged in and which assignment is loaded.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store is the only owner of the credential pair, the user record and
//! the cached assignment entities. The route guard reads its authentication
//! predicate; the CLI and any UI layer call `fetch_assignment` to populate
//! the cache. It is constructed explicitly and passed by reference, so
//! startup order (restore first, then guard checks) is visible at call sites.
//!
//! DESIGN
//! ======
//! Credentials and the user record are written through to `SessionStorage`
//! on every change. Storage failures are logged and swallowed: the in-memory
//! session stays authoritative for the running process.
//!
//! `fetch_assignment` takes `&mut self`, so a fetch and any other mutation
//! cannot interleave. The cache is overwritten only after a response has
//! been received and parsed; every failure leaves it untouched.

use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::model::{Assignment, AssignmentDetails, AssignmentSubmission, PeerReviewAssignment, Role, User};
use crate::storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS, SessionStorage, StorageError, USER_KEY};

pub struct SessionStore<S: SessionStorage> {
    storage: S,
    api: ApiClient,
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<User>,
    assignment: Option<Assignment>,
    peer_review: Option<PeerReviewAssignment>,
    submissions: Vec<AssignmentSubmission>,
}

impl<S: SessionStorage> SessionStore<S> {
    /// An empty, unauthenticated store. Nothing is read from `storage`.
    #[must_use]
    pub fn new(storage: S, api: ApiClient) -> Self {
        Self {
            storage,
            api,
            access_token: None,
            refresh_token: None,
            user: None,
            assignment: None,
            peer_review: None,
            submissions: Vec::new(),
        }
    }

    /// Build a store from the session persisted in `storage`.
    ///
    /// The session is restored only when all three keys are present and
    /// non-empty. If the stored user record does not parse, or the storage
    /// cannot be read, all three keys are purged and the store starts
    /// unauthenticated, so a half-written session can never be restored.
    #[must_use]
    pub fn restore(storage: S, api: ApiClient) -> Self {
        let mut store = Self::new(storage, api);

        let persisted = match store.read_persisted() {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!(error = %e, "persisted session unreadable; purging");
                store.purge_persisted();
                return store;
            }
        };
        let Some((raw_user, access, refresh)) = persisted else {
            debug!("no persisted session");
            return store;
        };

        match serde_json::from_str::<User>(&raw_user) {
            Ok(user) => {
                info!(user_id = %user.id, "restored persisted session");
                store.set_user(user);
                store.set_tokens(access, refresh);
            }
            Err(e) => {
                warn!(error = %e, "persisted user record is corrupt; purging session");
                store.purge_persisted();
            }
        }
        store
    }

    // =========================================================================
    // CREDENTIALS
    // =========================================================================

    /// Replace the user record and persist it.
    pub fn set_user(&mut self, user: User) {
        match serde_json::to_string(&user) {
            Ok(raw) => self.persist(USER_KEY, &raw),
            Err(e) => warn!(error = %e, "user record not serializable; not persisted"),
        }
        self.user = Some(user);
    }

    /// Replace the credential pair and persist both tokens.
    ///
    /// Empty tokens are not rejected here; callers pass what the auth service
    /// issued.
    pub fn set_tokens(&mut self, access: impl Into<String>, refresh: impl Into<String>) {
        let access = access.into();
        let refresh = refresh.into();
        self.persist(ACCESS_TOKEN_KEY, &access);
        self.persist(REFRESH_TOKEN_KEY, &refresh);
        self.access_token = Some(access);
        self.refresh_token = Some(refresh);
    }

    /// Clear credentials, user and every cached entity, and remove the
    /// persisted keys. Calling it while logged out is a no-op.
    pub fn logout(&mut self) {
        if let Some(user) = &self.user {
            info!(user_id = %user.id, "logging out");
        }
        self.user = None;
        self.access_token = None;
        self.refresh_token = None;
        self.assignment = None;
        self.peer_review = None;
        self.submissions.clear();
        self.purge_persisted();
    }

    /// Authenticate against the auth service and store the issued session.
    ///
    /// # Errors
    ///
    /// Returns the API error unchanged; the store is not modified on failure.
    pub async fn login(&mut self, auth_base_url: &str, email: &str, password: &str) -> Result<User, ApiError> {
        let response = self.api.login(auth_base_url, email, password).await?;
        info!(user_id = %response.user.id, role = ?response.user.role, "logged in");
        self.set_user(response.user.clone());
        self.set_tokens(response.access_token, response.refresh_token);
        Ok(response.user)
    }

    // =========================================================================
    // PREDICATES
    // =========================================================================

    /// True iff a user record and an access token are both present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.access_token.is_some()
    }

    #[must_use]
    pub fn is_teacher(&self) -> bool {
        self.user_role() == Some(&Role::Teacher)
    }

    #[must_use]
    pub fn is_student(&self) -> bool {
        self.user_role() == Some(&Role::Student)
    }

    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.name.as_str())
    }

    #[must_use]
    pub fn user_role(&self) -> Option<&Role> {
        self.user.as_ref().and_then(|u| u.role.as_ref())
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    #[must_use]
    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    #[must_use]
    pub fn peer_review(&self) -> Option<&PeerReviewAssignment> {
        self.peer_review.as_ref()
    }

    #[must_use]
    pub fn submissions(&self) -> &[AssignmentSubmission] {
        &self.submissions
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // =========================================================================
    // DOMAIN CACHE
    // =========================================================================

    /// Load an assignment with its peer review configuration and submissions.
    ///
    /// With `force == false` and `assignment_id` already cached, the cached
    /// assignment is returned without a request. Otherwise the API is called
    /// with the current access token and, on success, all three cached
    /// entities are replaced (missing peer review or submissions become empty).
    ///
    /// # Errors
    ///
    /// Returns the API error unchanged. The cache keeps its previous contents
    /// and nothing is retried.
    pub async fn fetch_assignment(
        &mut self,
        base_url: &str,
        assignment_id: &str,
        force: bool,
    ) -> Result<Assignment, ApiError> {
        if !force {
            if let Some(cached) = self.assignment.as_ref().filter(|a| a.id == assignment_id) {
                debug!(assignment_id, "assignment cache hit");
                return Ok(cached.clone());
            }
        }

        debug!(assignment_id, force, "fetching assignment");
        let details = self
            .api
            .fetch_assignment_details(base_url, assignment_id, self.access_token.as_deref())
            .await
            .inspect_err(|e| warn!(assignment_id, error = %e, "assignment fetch failed"))?;

        let assignment = details.assignment.clone();
        self.apply_details(details);
        info!(
            assignment_id,
            has_peer_review = self.peer_review.is_some(),
            submissions = self.submissions.len(),
            "assignment loaded"
        );
        Ok(assignment)
    }

    fn apply_details(&mut self, details: AssignmentDetails) {
        self.assignment = Some(details.assignment);
        self.peer_review = details.peer_review_assignment;
        self.submissions = details.submissions.unwrap_or_default();
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    fn read_persisted(&self) -> Result<Option<(String, String, String)>, StorageError> {
        let non_empty = |key: &str| -> Result<Option<String>, StorageError> {
            Ok(self.storage.get(key)?.filter(|v| !v.is_empty()))
        };
        let user = non_empty(USER_KEY)?;
        let access = non_empty(ACCESS_TOKEN_KEY)?;
        let refresh = non_empty(REFRESH_TOKEN_KEY)?;
        Ok(match (user, access, refresh) {
            (Some(user), Some(access), Some(refresh)) => Some((user, access, refresh)),
            _ => None,
        })
    }

    fn persist(&mut self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            warn!(key, error = %e, "session persist failed");
        }
    }

    fn purge_persisted(&mut self) {
        for key in SESSION_KEYS {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "session purge failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
