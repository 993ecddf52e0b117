// Entity fixtures.
//
// Every generator draws a fresh suffix so fixtures from different checks never
// collide when they share one adapter. Dates are truncated to whole seconds so
// they survive any store's date encoding unchanged.

use chrono::{DateTime, Duration, SubsecRound, Utc};

use deta_auth_core::db::models::{NewAccount, NewSession, NewUser, NewVerificationToken};

/// Short random suffix.
pub fn unique() -> String {
    nanoid::nanoid!(10, &nanoid::alphabet::SAFE[2..])
}

/// Current time at second precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// A user with a unique email and a display name, without an id.
pub fn user() -> NewUser {
    let suffix = unique();
    NewUser::new(format!("user-{suffix}@example.com")).with_name(format!("user-{suffix}"))
}

/// An OAuth account for `user_id` on the `test` provider.
pub fn account(user_id: &str) -> NewAccount {
    NewAccount {
        access_token: Some(unique()),
        refresh_token: Some(unique()),
        expires_at: Some((now() + Duration::hours(1)).timestamp()),
        token_type: Some("bearer".to_string()),
        scope: Some("openid email".to_string()),
        ..NewAccount::oauth(user_id, "test", unique())
    }
}

/// A session for `user_id` that expires in a week.
pub fn session(user_id: &str) -> NewSession {
    NewSession::new(unique(), user_id, now() + Duration::days(7))
}

/// A verification token that expires in an hour.
pub fn verification_token() -> NewVerificationToken {
    NewVerificationToken::new(
        format!("verify-{}@example.com", unique()),
        unique(),
        now() + Duration::hours(1),
    )
}
