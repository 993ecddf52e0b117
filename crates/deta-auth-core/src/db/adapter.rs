// Auth adapter trait — the persistence contract exposed to the auth framework.
//
// Lookups return `Ok(None)` when the target is absent; fetch-then-act
// operations become no-ops. Only store faults surface as `Err`.

use std::fmt;

use async_trait::async_trait;

use crate::db::models::{
    Account, NewAccount, NewSession, NewUser, NewVerificationToken, Session, SessionPatch, User,
    UserPatch, VerificationToken,
};
use crate::error::AdapterResult;

/// Session paired with the user that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAndUser {
    pub session: Session,
    pub user: User,
}

/// Storage operations the auth framework calls.
///
/// Multi-step operations are not atomic: another writer can act between the
/// lookup and the dependent write.
#[async_trait]
pub trait AuthAdapter: Send + Sync + fmt::Debug {
    // ─── Users ───────────────────────────────────────────────────

    async fn create_user(&self, user: NewUser) -> AdapterResult<User>;

    async fn get_user(&self, id: &str) -> AdapterResult<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> AdapterResult<Option<User>>;

    /// The user owning the account `(provider, provider_account_id)`.
    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<Option<User>>;

    /// Read-modify-write. `None` when the user does not exist.
    async fn update_user(&self, patch: UserPatch) -> AdapterResult<Option<User>>;

    /// Removes the user only; accounts and sessions are left in place.
    async fn delete_user(&self, id: &str) -> AdapterResult<()>;

    // ─── Accounts ────────────────────────────────────────────────

    async fn link_account(&self, account: NewAccount) -> AdapterResult<Account>;

    async fn unlink_account(&self, provider: &str, provider_account_id: &str)
        -> AdapterResult<()>;

    async fn get_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<Option<Account>>;

    // ─── Sessions ────────────────────────────────────────────────

    async fn create_session(&self, session: NewSession) -> AdapterResult<Session>;

    async fn get_session_and_user(
        &self,
        session_token: &str,
    ) -> AdapterResult<Option<SessionAndUser>>;

    async fn update_session(&self, patch: SessionPatch) -> AdapterResult<Option<Session>>;

    async fn delete_session(&self, session_token: &str) -> AdapterResult<()>;

    // ─── Verification Tokens ─────────────────────────────────────

    async fn create_verification_token(
        &self,
        token: NewVerificationToken,
    ) -> AdapterResult<VerificationToken>;

    /// Consume a token: returns it once, then deletes it.
    async fn use_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> AdapterResult<Option<VerificationToken>>;
}
