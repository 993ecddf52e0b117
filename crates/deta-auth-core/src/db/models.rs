// Entities stored by the adapter, their creation inputs and typed patches.
//
// Attribute names at rest are camelCase, except the provider token fields on
// accounts which keep the snake_case names the OAuth token response uses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Extra attributes carried through untouched.
pub type Extra = serde_json::Map<String, serde_json::Value>;

// ─── Entity Kinds ────────────────────────────────────────────────

/// The closed set of entities the adapter persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Account,
    Session,
    VerificationToken,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Account => "account",
            Self::Session => "session",
            Self::VerificationToken => "verification token",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed document held in one collection.
///
/// `merge` applies a patch client-side with shallow semantics: every field the
/// patch carries overwrites the current value, absent fields are kept.
pub trait Document: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    /// Partial update accepted by this entity.
    type Patch: Serialize + fmt::Debug + Send + Sync;

    const KIND: EntityKind;

    /// Whether the entity has a typed `expires` date. Only these kinds get a
    /// stored `expires` string rehydrated on read.
    const HAS_EXPIRES: bool = false;

    fn id(&self) -> &str;

    fn merge(&mut self, patch: &Self::Patch);
}

/// Patch type for entities that are never updated in place.
#[derive(Debug, Clone, Serialize)]
pub enum Immutable {}

// ─── User ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Input for `create_user`. Leave `id` empty to let the store assign the key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl NewUser {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Partial user update. `id` selects the user and is never written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl UserPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

impl Document for User {
    type Patch = UserPatch;

    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &str {
        &self.id
    }

    fn merge(&mut self, patch: &UserPatch) {
        if let Some(name) = &patch.name {
            self.name = Some(name.clone());
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(verified) = patch.email_verified {
            self.email_verified = Some(verified);
        }
        if let Some(image) = &patch.image {
            self.image = Some(image.clone());
        }
    }
}

// ─── Account ─────────────────────────────────────────────────────

/// A provider account linked to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub user_id: String,
    /// "oauth", "oidc", "email" or "credentials".
    #[serde(rename = "type")]
    pub account_type: String,
    pub provider: String,
    pub provider_account_id: String,
    #[serde(rename = "refresh_token", default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(rename = "access_token", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Access token expiry, seconds since the epoch.
    #[serde(rename = "expires_at", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(rename = "token_type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(rename = "id_token", default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(rename = "session_state", default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Input for `link_account`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub provider: String,
    pub provider_account_id: String,
    #[serde(rename = "refresh_token", default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(rename = "access_token", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(rename = "expires_at", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(rename = "token_type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(rename = "id_token", default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(rename = "session_state", default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl NewAccount {
    pub fn oauth(
        user_id: impl Into<String>,
        provider: impl Into<String>,
        provider_account_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            account_type: "oauth".to_string(),
            provider: provider.into(),
            provider_account_id: provider_account_id.into(),
            ..Default::default()
        }
    }
}

impl Document for Account {
    type Patch = Immutable;

    const KIND: EntityKind = EntityKind::Account;

    fn id(&self) -> &str {
        &self.id
    }

    fn merge(&mut self, patch: &Immutable) {
        match *patch {}
    }
}

// ─── Session ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub session_token: String,
    pub user_id: String,
    pub expires: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Input for `create_session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub session_token: String,
    pub user_id: String,
    pub expires: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl NewSession {
    pub fn new(
        session_token: impl Into<String>,
        user_id: impl Into<String>,
        expires: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            session_token: session_token.into(),
            user_id: user_id.into(),
            expires,
            extra: Extra::new(),
        }
    }
}

/// Partial session update. `session_token` selects the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    pub session_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl SessionPatch {
    pub fn new(session_token: impl Into<String>) -> Self {
        Self {
            session_token: session_token.into(),
            user_id: None,
            expires: None,
        }
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }
}

impl Document for Session {
    type Patch = SessionPatch;

    const KIND: EntityKind = EntityKind::Session;

    const HAS_EXPIRES: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn merge(&mut self, patch: &SessionPatch) {
        self.session_token = patch.session_token.clone();
        if let Some(user_id) = &patch.user_id {
            self.user_id = user_id.clone();
        }
        if let Some(expires) = patch.expires {
            self.expires = expires;
        }
    }
}

// ─── Verification Token ──────────────────────────────────────────

/// One-time token, e.g. for email sign-in links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationToken {
    pub id: String,
    pub identifier: String,
    pub token: String,
    pub expires: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Input for `create_verification_token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVerificationToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub identifier: String,
    pub token: String,
    pub expires: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl NewVerificationToken {
    pub fn new(
        identifier: impl Into<String>,
        token: impl Into<String>,
        expires: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            identifier: identifier.into(),
            token: token.into(),
            expires,
            extra: Extra::new(),
        }
    }
}

impl Document for VerificationToken {
    type Patch = Immutable;

    const KIND: EntityKind = EntityKind::VerificationToken;

    const HAS_EXPIRES: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn merge(&mut self, patch: &Immutable) {
        match *patch {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_user_patch_skips_id_and_empty_fields() {
        let patch = UserPatch {
            name: Some("Alice".into()),
            ..UserPatch::new("u1")
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Alice"}));
    }

    #[test]
    fn test_user_merge_is_shallow() {
        let mut user = User {
            id: "u1".into(),
            name: Some("Alice".into()),
            email: "a@x.com".into(),
            email_verified: None,
            image: Some("a.png".into()),
            extra: Extra::new(),
        };
        let patch = UserPatch {
            email: Some("alice@x.com".into()),
            ..UserPatch::new("u1")
        };
        user.merge(&patch);
        assert_eq!(user.email, "alice@x.com");
        assert_eq!(user.name.as_deref(), Some("Alice"));
        assert_eq!(user.image.as_deref(), Some("a.png"));
    }

    #[test]
    fn test_session_merge() {
        let expires = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let mut session = Session {
            id: "s1".into(),
            session_token: "tok".into(),
            user_id: "u1".into(),
            expires,
            extra: Extra::new(),
        };
        let later = Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();
        session.merge(&SessionPatch::new("tok").with_expires(later));
        assert_eq!(session.expires, later);
        assert_eq!(session.user_id, "u1");
    }

    #[test]
    fn test_account_token_fields_keep_snake_case() {
        let mut account = NewAccount::oauth("u1", "github", "gh-1");
        account.access_token = Some("at".into());
        account.expires_at = Some(1_700_000_000);
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["providerAccountId"], "gh-1");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["type"], "oauth");
        assert_eq!(json["access_token"], "at");
        assert_eq!(json["expires_at"], 1_700_000_000);
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_user_keeps_unknown_attributes() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "email": "a@x.com",
            "role": "admin"
        }))
        .unwrap();
        assert_eq!(user.extra["role"], "admin");
        assert!(user.name.is_none());
    }

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::VerificationToken.to_string(), "verification token");
    }

    #[test]
    fn test_verification_token_keeps_unknown_attributes() {
        let mut input = NewVerificationToken::new(
            "a@x.com",
            "t1",
            Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        );
        input
            .extra
            .insert("purpose".into(), serde_json::json!("login"));
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["purpose"], "login");

        let token: VerificationToken = serde_json::from_value(serde_json::json!({
            "id": "v1",
            "identifier": "a@x.com",
            "token": "t1",
            "expires": "2030-01-01T00:00:00Z",
            "purpose": "login"
        }))
        .unwrap();
        assert_eq!(token.extra["purpose"], "login");
    }

    #[test]
    fn test_only_dated_kinds_rehydrate_expires() {
        assert!(Session::HAS_EXPIRES);
        assert!(VerificationToken::HAS_EXPIRES);
        assert!(!User::HAS_EXPIRES);
        assert!(!Account::HAS_EXPIRES);
    }
}
