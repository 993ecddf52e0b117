// DetaAdapter — the auth framework's storage contract on top of four
// collections.
//
// Lookups by anything other than the key go through `Collection::fetch_first`.
// Joins (account → user, session → user) and fetch-then-delete sequences are
// issued one round-trip at a time and are not atomic.

use async_trait::async_trait;

use deta_auth_core::db::adapter::{AuthAdapter, SessionAndUser};
use deta_auth_core::db::models::{
    Account, NewAccount, NewSession, NewUser, NewVerificationToken, Session, SessionPatch, User,
    UserPatch, VerificationToken,
};
use deta_auth_core::db::store::{BaseProvider, Query};
use deta_auth_core::error::AdapterResult;

use crate::collection::Collection;
use crate::config::AdapterConfig;

/// Storage adapter over a Deta Base style document store.
///
/// # Usage
///
/// ```rust,ignore
/// use deta_auth::{AdapterConfig, DetaAdapter, DetaClient, DetaConfig};
///
/// let client = DetaClient::new(DetaConfig::from_env()?)?;
/// let adapter = DetaAdapter::new(&client, AdapterConfig::default());
/// let user = adapter.get_user_by_email("a@x.com").await?;
/// ```
#[derive(Debug, Clone)]
pub struct DetaAdapter {
    users: Collection<User>,
    accounts: Collection<Account>,
    sessions: Collection<Session>,
    verification_tokens: Collection<VerificationToken>,
}

fn open<T: deta_auth_core::Document>(
    provider: &dyn BaseProvider,
    name: &str,
    config: &AdapterConfig,
) -> Collection<T> {
    Collection::new(name, provider.base(name))
        .with_page_size(config.scan_page_size)
        .with_debug_logs(config.debug_logs)
}

fn account_query(provider: &str, provider_account_id: &str) -> Query {
    Query::new()
        .eq("provider", provider)
        .eq("providerAccountId", provider_account_id)
}

fn session_query(session_token: &str) -> Query {
    Query::new().eq("sessionToken", session_token)
}

impl DetaAdapter {
    /// Open the four collections named in `config` from `provider`.
    pub fn new(provider: &dyn BaseProvider, config: AdapterConfig) -> Self {
        let names = &config.collections;
        Self {
            users: open(provider, &names.users, &config),
            accounts: open(provider, &names.accounts, &config),
            sessions: open(provider, &names.sessions, &config),
            verification_tokens: open(provider, &names.verification_tokens, &config),
        }
    }

    pub fn users(&self) -> &Collection<User> {
        &self.users
    }

    pub fn accounts(&self) -> &Collection<Account> {
        &self.accounts
    }

    pub fn sessions(&self) -> &Collection<Session> {
        &self.sessions
    }

    pub fn verification_tokens(&self) -> &Collection<VerificationToken> {
        &self.verification_tokens
    }
}

#[async_trait]
impl AuthAdapter for DetaAdapter {
    // ─── Users ───────────────────────────────────────────────────

    async fn create_user(&self, user: NewUser) -> AdapterResult<User> {
        self.users.put(&user).await
    }

    async fn get_user(&self, id: &str) -> AdapterResult<Option<User>> {
        self.users.get(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> AdapterResult<Option<User>> {
        self.users.fetch_first(&Query::new().eq("email", email)).await
    }

    async fn get_user_by_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<Option<User>> {
        let account = match self
            .accounts
            .fetch_first(&account_query(provider, provider_account_id))
            .await?
        {
            Some(account) => account,
            None => return Ok(None),
        };
        self.users.get(&account.user_id).await
    }

    async fn update_user(&self, patch: UserPatch) -> AdapterResult<Option<User>> {
        let current = self.users.get(&patch.id).await?;
        if current.is_none() {
            tracing::debug!(user_id = %patch.id, "update_user on a missing user");
        }
        match self.users.update(current, &patch, &patch.id).await {
            Err(e) if e.is_key_not_found() => Ok(None),
            other => other,
        }
    }

    async fn delete_user(&self, id: &str) -> AdapterResult<()> {
        self.users.delete(id).await
    }

    // ─── Accounts ────────────────────────────────────────────────

    async fn link_account(&self, account: NewAccount) -> AdapterResult<Account> {
        self.accounts.put(&account).await
    }

    async fn unlink_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<()> {
        let account = self
            .accounts
            .fetch_first(&account_query(provider, provider_account_id))
            .await?;
        match account {
            Some(account) => self.accounts.delete(&account.id).await,
            None => Ok(()),
        }
    }

    async fn get_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> AdapterResult<Option<Account>> {
        self.accounts
            .fetch_first(&account_query(provider, provider_account_id))
            .await
    }

    // ─── Sessions ────────────────────────────────────────────────

    async fn create_session(&self, session: NewSession) -> AdapterResult<Session> {
        self.sessions.put(&session).await
    }

    async fn get_session_and_user(
        &self,
        session_token: &str,
    ) -> AdapterResult<Option<SessionAndUser>> {
        let session = match self.sessions.fetch_first(&session_query(session_token)).await? {
            Some(session) => session,
            None => return Ok(None),
        };
        let user = match self.users.get(&session.user_id).await? {
            Some(user) => user,
            None => return Ok(None),
        };
        Ok(Some(SessionAndUser { session, user }))
    }

    async fn update_session(&self, patch: SessionPatch) -> AdapterResult<Option<Session>> {
        let session = match self
            .sessions
            .fetch_first(&session_query(&patch.session_token))
            .await?
        {
            Some(session) => session,
            None => return Ok(None),
        };
        let id = session.id.clone();
        self.sessions.update(Some(session), &patch, &id).await
    }

    async fn delete_session(&self, session_token: &str) -> AdapterResult<()> {
        let session = self.sessions.fetch_first(&session_query(session_token)).await?;
        match session {
            Some(session) => self.sessions.delete(&session.id).await,
            None => Ok(()),
        }
    }

    // ─── Verification Tokens ─────────────────────────────────────

    async fn create_verification_token(
        &self,
        token: NewVerificationToken,
    ) -> AdapterResult<VerificationToken> {
        self.verification_tokens.put(&token).await
    }

    async fn use_verification_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> AdapterResult<Option<VerificationToken>> {
        let query = Query::new().eq("identifier", identifier).eq("token", token);
        let found = match self.verification_tokens.fetch_first(&query).await? {
            Some(found) => found,
            None => return Ok(None),
        };
        self.verification_tokens.delete(&found.id).await?;
        Ok(Some(found))
    }
}
