// Adapter conformance suite.
//
// An `AdapterSuite` is an ordered list of named checks. Each check receives the
// adapter under test, creates its own fixtures, and fails with a `SuiteError`
// on the first broken expectation. Checks never depend on one another, so one
// adapter instance can serve the whole run.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use chrono::Duration;

use deta_auth_core::db::adapter::AuthAdapter;
use deta_auth_core::db::models::{SessionPatch, UserPatch};
use deta_auth_core::error::StoreError;

use crate::fixtures;

#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("check '{check}' failed: {source}")]
    Check {
        check: &'static str,
        #[source]
        source: Box<SuiteError>,
    },
}

pub type SuiteResult = Result<(), SuiteError>;

pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = SuiteResult> + Send + 'a>>;

/// Signature of a single check.
pub type CheckFn = for<'a> fn(&'a dyn AuthAdapter) -> CheckFuture<'a>;

fn ensure(condition: bool, message: impl Into<String>) -> SuiteResult {
    if condition {
        Ok(())
    } else {
        Err(SuiteError::Assertion(message.into()))
    }
}

fn present<T>(value: Option<T>, what: &str) -> Result<T, SuiteError> {
    value.ok_or_else(|| SuiteError::Assertion(format!("expected {what}, got nothing")))
}

// ─── Logging ─────────────────────────────────────────────────────

/// Prefixes every line with the adapter's display name.
#[derive(Debug, Clone)]
pub struct SuiteLogger {
    pub adapter_name: String,
}

impl SuiteLogger {
    pub fn new(adapter_name: &str) -> Self {
        Self {
            adapter_name: adapter_name.to_string(),
        }
    }

    pub fn info(&self, msg: &str) {
        tracing::info!("[{}] {}", self.adapter_name, msg);
    }

    pub fn success(&self, msg: &str) {
        tracing::info!("[{}] ✓ {}", self.adapter_name, msg);
    }

    pub fn error(&self, msg: &str) {
        tracing::error!("[{}] ✗ {}", self.adapter_name, msg);
    }
}

// ─── Suite ───────────────────────────────────────────────────────

pub struct SuiteCheck {
    pub name: &'static str,
    pub run: CheckFn,
}

/// Statistics for a finished run.
#[derive(Debug, Clone)]
pub struct SuiteStats {
    pub suite_name: String,
    pub check_count: usize,
    pub passed: usize,
    pub duration_ms: f64,
}

pub struct AdapterSuite {
    name: String,
    checks: Vec<SuiteCheck>,
}

impl AdapterSuite {
    /// Empty suite.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            checks: Vec::new(),
        }
    }

    /// Every check an `AuthAdapter` implementation is expected to pass.
    pub fn conformance() -> Self {
        let mut suite = Self::new("conformance");
        suite.add("create_user assigns an id", create_user_assigns_id);
        suite.add("create_user keeps a supplied id", create_user_keeps_supplied_id);
        suite.add("get_user on a missing id", get_user_missing);
        suite.add("get_user_by_email", get_user_by_email);
        suite.add("update_user merges the patch", update_user_merges);
        suite.add("update_user on a missing user", update_user_missing);
        suite.add("delete_user", delete_user);
        suite.add("link_account and get_user_by_account", link_account);
        suite.add("unlink_account", unlink_account);
        suite.add("create_session and get_session_and_user", create_session);
        suite.add("get_session_and_user without its user", session_without_user);
        suite.add("update_session", update_session);
        suite.add("delete_session", delete_session);
        suite.add("use_verification_token is single-use", verification_token_single_use);
        suite
    }

    pub fn add(&mut self, name: &'static str, run: CheckFn) {
        self.checks.push(SuiteCheck { name, run });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    pub fn check_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checks.iter().map(|c| c.name)
    }

    /// Run every check in order, stopping at the first failure.
    pub async fn run(
        &self,
        adapter_name: &str,
        adapter: &dyn AuthAdapter,
    ) -> Result<SuiteStats, SuiteError> {
        let log = SuiteLogger::new(adapter_name);
        let started = Instant::now();
        log.info(&format!("Running suite: {}", self.name));

        let mut passed = 0;
        for check in &self.checks {
            match (check.run)(adapter).await {
                Ok(()) => {
                    log.success(check.name);
                    passed += 1;
                }
                Err(e) => {
                    log.error(&format!("{}: {}", check.name, e));
                    return Err(SuiteError::Check {
                        check: check.name,
                        source: Box::new(e),
                    });
                }
            }
        }

        let stats = SuiteStats {
            suite_name: self.name.clone(),
            check_count: self.checks.len(),
            passed,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        };
        log.info(&format!(
            "{}: {}/{} checks passed ({:.2}ms)",
            stats.suite_name, stats.passed, stats.check_count, stats.duration_ms
        ));
        Ok(stats)
    }
}

// ─── Users ───────────────────────────────────────────────────────

fn create_user_assigns_id(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let input = fixtures::user();
        let user = adapter.create_user(input.clone()).await?;
        ensure(!user.id.is_empty(), "created user has an empty id")?;
        ensure(user.email == input.email, "created user lost its email")?;

        let fetched = present(adapter.get_user(&user.id).await?, "the created user")?;
        ensure(fetched == user, format!("get_user returned {fetched:?}, created {user:?}"))
    })
}

fn create_user_keeps_supplied_id(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let id = format!("user-{}", fixtures::unique());
        let user = adapter.create_user(fixtures::user().with_id(id.clone())).await?;
        ensure(user.id == id, format!("expected id {id}, got {}", user.id))
    })
}

fn get_user_missing(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let missing = adapter.get_user(&fixtures::unique()).await?;
        ensure(missing.is_none(), "get_user found a user that was never created")
    })
}

fn get_user_by_email(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let user = adapter.create_user(fixtures::user()).await?;
        let found = present(adapter.get_user_by_email(&user.email).await?, "a user by email")?;
        ensure(found.id == user.id, "get_user_by_email returned another user")?;

        let missing = adapter
            .get_user_by_email(&format!("nobody-{}@example.com", fixtures::unique()))
            .await?;
        ensure(missing.is_none(), "get_user_by_email matched an unknown email")
    })
}

fn update_user_merges(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let user = adapter.create_user(fixtures::user()).await?;
        let verified = fixtures::now();
        let patch = UserPatch {
            name: Some("Renamed".to_string()),
            email_verified: Some(verified),
            ..UserPatch::new(user.id.clone())
        };

        let updated = present(adapter.update_user(patch).await?, "the updated user")?;
        ensure(updated.name.as_deref() == Some("Renamed"), "name was not updated")?;
        ensure(updated.email == user.email, "untouched email changed")?;
        ensure(updated.email_verified == Some(verified), "emailVerified was not updated")?;

        let stored = present(adapter.get_user(&user.id).await?, "the stored user")?;
        ensure(stored == updated, format!("stored {stored:?}, returned {updated:?}"))
    })
}

fn update_user_missing(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let id = fixtures::unique();
        let patch = UserPatch {
            name: Some("Ghost".to_string()),
            ..UserPatch::new(id.clone())
        };
        ensure(
            adapter.update_user(patch).await?.is_none(),
            "update_user returned a user that does not exist",
        )?;
        ensure(
            adapter.get_user(&id).await?.is_none(),
            "update_user created a missing user",
        )
    })
}

fn delete_user(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let user = adapter.create_user(fixtures::user()).await?;
        adapter.delete_user(&user.id).await?;
        ensure(adapter.get_user(&user.id).await?.is_none(), "user survived delete_user")?;
        // Deleting again is not an error.
        adapter.delete_user(&user.id).await?;
        Ok(())
    })
}

// ─── Accounts ────────────────────────────────────────────────────

fn link_account(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let user = adapter.create_user(fixtures::user()).await?;
        let account = adapter.link_account(fixtures::account(&user.id)).await?;
        ensure(!account.id.is_empty(), "linked account has an empty id")?;

        let owner = present(
            adapter
                .get_user_by_account(&account.provider, &account.provider_account_id)
                .await?,
            "the account's user",
        )?;
        ensure(owner.id == user.id, "get_user_by_account returned another user")?;

        let fetched = present(
            adapter
                .get_account(&account.provider, &account.provider_account_id)
                .await?,
            "the linked account",
        )?;
        ensure(fetched == account, format!("get_account returned {fetched:?}"))
    })
}

fn unlink_account(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let user = adapter.create_user(fixtures::user()).await?;
        let account = adapter.link_account(fixtures::account(&user.id)).await?;
        adapter
            .unlink_account(&account.provider, &account.provider_account_id)
            .await?;

        let owner = adapter
            .get_user_by_account(&account.provider, &account.provider_account_id)
            .await?;
        ensure(owner.is_none(), "account survived unlink_account")?;
        ensure(
            adapter.get_user(&user.id).await?.is_some(),
            "unlink_account removed the user",
        )?;
        adapter
            .unlink_account(&account.provider, &account.provider_account_id)
            .await?;
        Ok(())
    })
}

// ─── Sessions ────────────────────────────────────────────────────

fn create_session(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let user = adapter.create_user(fixtures::user()).await?;
        let input = fixtures::session(&user.id);
        let session = adapter.create_session(input.clone()).await?;
        ensure(session.expires == input.expires, "created session lost its expiry")?;

        let found = present(
            adapter.get_session_and_user(&session.session_token).await?,
            "the session and its user",
        )?;
        ensure(found.session == session, format!("stored {:?}", found.session))?;
        ensure(found.user.id == user.id, "session joined to another user")
    })
}

fn session_without_user(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let session = adapter
            .create_session(fixtures::session(&fixtures::unique()))
            .await?;
        let found = adapter.get_session_and_user(&session.session_token).await?;
        ensure(found.is_none(), "session without a user was returned")
    })
}

fn update_session(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let user = adapter.create_user(fixtures::user()).await?;
        let session = adapter.create_session(fixtures::session(&user.id)).await?;
        let extended = session.expires + Duration::days(30);

        let patch = SessionPatch::new(session.session_token.clone()).with_expires(extended);
        let updated = present(adapter.update_session(patch).await?, "the updated session")?;
        ensure(updated.expires == extended, "expires was not updated")?;
        ensure(updated.user_id == user.id, "untouched userId changed")?;

        let found = present(
            adapter.get_session_and_user(&session.session_token).await?,
            "the updated session",
        )?;
        ensure(found.session.expires == extended, "stored expiry was not updated")?;

        let missing = SessionPatch::new(fixtures::unique()).with_expires(extended);
        ensure(
            adapter.update_session(missing).await?.is_none(),
            "update_session matched an unknown token",
        )
    })
}

fn delete_session(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let user = adapter.create_user(fixtures::user()).await?;
        let session = adapter.create_session(fixtures::session(&user.id)).await?;
        adapter.delete_session(&session.session_token).await?;
        ensure(
            adapter
                .get_session_and_user(&session.session_token)
                .await?
                .is_none(),
            "session survived delete_session",
        )?;
        adapter.delete_session(&session.session_token).await?;
        Ok(())
    })
}

// ─── Verification Tokens ─────────────────────────────────────────

fn verification_token_single_use(adapter: &dyn AuthAdapter) -> CheckFuture<'_> {
    Box::pin(async move {
        let input = fixtures::verification_token();
        let created = adapter.create_verification_token(input.clone()).await?;

        let used = present(
            adapter
                .use_verification_token(&input.identifier, &input.token)
                .await?,
            "the verification token",
        )?;
        ensure(used == created, format!("used {used:?}, created {created:?}"))?;
        ensure(used.expires == input.expires, "token expiry changed")?;

        let again = adapter
            .use_verification_token(&input.identifier, &input.token)
            .await?;
        ensure(again.is_none(), "verification token was usable twice")
    })
}
