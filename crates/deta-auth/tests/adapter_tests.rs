// Behavioral tests for DetaAdapter over the in-memory store.

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

use deta_auth::{AdapterConfig, AuthAdapter, DetaAdapter, StoreError};
use deta_auth_core::db::models::{NewAccount, NewSession, NewUser, NewVerificationToken, UserPatch};
use deta_auth_core::db::store::{DocumentStore, RawDocument};
use deta_auth_memory::MemoryDeta;
use deta_auth_test_utils::fixtures;

fn raw(value: serde_json::Value) -> RawDocument {
    value.as_object().cloned().unwrap()
}

fn adapter_over(deta: &MemoryDeta) -> DetaAdapter {
    DetaAdapter::new(deta, AdapterConfig::default())
}

// ─── Normalization ───────────────────────────────────────────────

#[tokio::test]
async fn test_id_equals_store_key_on_every_read_path() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);

    let created = adapter.create_user(NewUser::new("a@x.com")).await.unwrap();
    let stored = deta.collection("users").snapshot().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["key"], created.id.as_str());

    let by_id = adapter.get_user(&created.id).await.unwrap().unwrap();
    let by_email = adapter.get_user_by_email("a@x.com").await.unwrap().unwrap();
    for user in [&created, &by_id, &by_email] {
        assert_eq!(user.id, created.id);
        assert!(!user.extra.contains_key("key"));
    }
}

#[tokio::test]
async fn test_expires_strings_become_dates() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    let expires = Utc.with_ymd_and_hms(2031, 3, 4, 5, 6, 7).unwrap();

    // Written by another client with millisecond precision.
    deta.collection("sessions")
        .put(raw(json!({
            "key": "s1",
            "sessionToken": "tok",
            "userId": "u1",
            "expires": "2031-03-04T05:06:07.000Z"
        })))
        .await
        .unwrap();
    adapter
        .create_user(NewUser::new("a@x.com").with_id("u1"))
        .await
        .unwrap();

    let found = adapter.get_session_and_user("tok").await.unwrap().unwrap();
    assert_eq!(found.session.expires, expires);

    let token = adapter
        .create_verification_token(NewVerificationToken::new("a@x.com", "t1", expires))
        .await
        .unwrap();
    assert_eq!(token.expires, expires);
}

#[tokio::test]
async fn test_documents_without_expires_are_untouched() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    deta.collection("users")
        .put(raw(json!({
            "key": "u1",
            "email": "a@x.com",
            "expiresHint": "2031-03-04",
            "plan": {"tier": "pro"}
        })))
        .await
        .unwrap();

    let user = adapter.get_user("u1").await.unwrap().unwrap();
    assert_eq!(user.extra["expiresHint"], "2031-03-04");
    assert_eq!(user.extra["plan"], json!({"tier": "pro"}));
}

#[tokio::test]
async fn test_undated_entities_keep_expires_as_stored() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    deta.collection("users")
        .put(raw(json!({"key": "u1", "email": "a@x.com", "expires": "never"})))
        .await
        .unwrap();
    deta.collection("accounts")
        .put(raw(json!({
            "key": "a1",
            "userId": "u1",
            "type": "oauth",
            "provider": "github",
            "providerAccountId": "gh-1",
            "expires": "2030-01-01"
        })))
        .await
        .unwrap();

    let user = adapter.get_user("u1").await.unwrap().unwrap();
    assert_eq!(user.extra["expires"], "never");
    let account = adapter.get_account("github", "gh-1").await.unwrap().unwrap();
    assert_eq!(account.extra["expires"], "2030-01-01");
}

#[tokio::test]
async fn test_verification_token_keeps_extra_attributes() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    deta.collection("verificationTokens")
        .put(raw(json!({
            "key": "v1",
            "identifier": "a@x.com",
            "token": "t1",
            "expires": "2030-01-01T00:00:00.000Z",
            "purpose": "login"
        })))
        .await
        .unwrap();

    let used = adapter
        .use_verification_token("a@x.com", "t1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(used.id, "v1");
    assert_eq!(used.extra.get("purpose"), Some(&json!("login")));
}

#[tokio::test]
async fn test_session_extra_attributes_round_trip() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    let expires = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let mut input = NewSession::new("tok", "u1", expires);
    input.extra.insert("userAgent".into(), json!("TestAgent/1.0"));

    let session = adapter.create_session(input).await.unwrap();
    assert_eq!(session.extra["userAgent"], "TestAgent/1.0");
    let stored = deta.collection("sessions").snapshot().await;
    assert_eq!(stored[0]["userAgent"], "TestAgent/1.0");
}

#[tokio::test]
async fn test_key_in_extra_attributes_does_not_pick_the_key() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    let mut input = NewUser::new("a@x.com");
    input.extra.insert("key".into(), json!("chosen-by-caller"));

    let user = adapter.create_user(input).await.unwrap();
    assert_ne!(user.id, "chosen-by-caller");
    assert!(adapter.get_user("chosen-by-caller").await.unwrap().is_none());
}

// ─── Paginated Lookup ────────────────────────────────────────────

#[tokio::test]
async fn test_lookup_without_match_terminates() {
    let deta = MemoryDeta::with_scan_window(2);
    let adapter = adapter_over(&deta);
    for i in 0..7 {
        adapter
            .create_user(NewUser::new(format!("user{i}@x.com")))
            .await
            .unwrap();
    }

    assert!(adapter
        .get_user_by_email("missing@x.com")
        .await
        .unwrap()
        .is_none());
    // Seven documents, two examined per page.
    assert_eq!(deta.collection("users").fetch_calls(), 4);
}

#[tokio::test]
async fn test_lookup_on_empty_collection() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    assert!(adapter.get_user_by_email("a@x.com").await.unwrap().is_none());
    assert!(adapter.get_session_and_user("tok").await.unwrap().is_none());
    assert!(adapter
        .use_verification_token("a@x.com", "t1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_lookup_follows_cursor_past_first_page() {
    let deta = MemoryDeta::with_scan_window(1);
    let adapter = adapter_over(&deta);
    for i in 0..10 {
        adapter
            .create_user(NewUser::new(format!("filler{i}@x.com")).with_id(format!("a{i:02}")))
            .await
            .unwrap();
    }
    adapter
        .create_user(NewUser::new("target@x.com").with_id("z99"))
        .await
        .unwrap();

    let found = adapter.get_user_by_email("target@x.com").await.unwrap().unwrap();
    assert_eq!(found.id, "z99");
    assert_eq!(deta.collection("users").fetch_calls(), 11);
}

#[tokio::test]
async fn test_lookup_returns_first_match_in_key_order() {
    let deta = MemoryDeta::with_scan_window(1);
    let adapter = adapter_over(&deta);
    for id in ["s-b", "s-a", "s-c"] {
        adapter
            .create_session(NewSession {
                id: Some(id.to_string()),
                ..NewSession::new("shared", "u1", Utc::now())
            })
            .await
            .unwrap();
    }
    adapter
        .create_user(NewUser::new("a@x.com").with_id("u1"))
        .await
        .unwrap();

    let found = adapter.get_session_and_user("shared").await.unwrap().unwrap();
    assert_eq!(found.session.id, "s-a");
}

#[tokio::test]
async fn test_larger_scan_page_size() {
    let deta = MemoryDeta::with_scan_window(3);
    let adapter = DetaAdapter::new(&deta, AdapterConfig::default().with_scan_page_size(10));
    for i in 0..9 {
        adapter
            .create_user(NewUser::new(format!("user{i}@x.com")).with_id(format!("u{i}")))
            .await
            .unwrap();
    }

    let found = adapter.get_user_by_email("user8@x.com").await.unwrap().unwrap();
    assert_eq!(found.id, "u8");
    assert_eq!(deta.collection("users").fetch_calls(), 3);
}

// ─── Users ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_user_by_email_example() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    adapter
        .create_user(NewUser::new("a@x.com").with_id("u1"))
        .await
        .unwrap();

    assert_eq!(
        adapter.get_user_by_email("a@x.com").await.unwrap().unwrap().id,
        "u1"
    );
    assert!(adapter
        .get_user_by_email("missing@x.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_update_user_is_shallow_merge() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    let mut input = NewUser::new("a@x.com").with_id("u1").with_name("Alice");
    input.image = Some("https://img/a.png".into());
    adapter.create_user(input).await.unwrap();

    let patch = UserPatch {
        image: Some("https://img/b.png".into()),
        ..UserPatch::new("u1")
    };
    let updated = adapter.update_user(patch).await.unwrap().unwrap();
    assert_eq!(updated.name.as_deref(), Some("Alice"));
    assert_eq!(updated.image.as_deref(), Some("https://img/b.png"));

    let stored = &deta.collection("users").snapshot().await[0];
    assert_eq!(stored["name"], "Alice");
    assert_eq!(stored["image"], "https://img/b.png");
}

#[tokio::test]
async fn test_update_missing_user_creates_nothing() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    let patch = UserPatch {
        email: Some("ghost@x.com".into()),
        ..UserPatch::new("ghost")
    };
    assert!(adapter.update_user(patch).await.unwrap().is_none());
    assert!(deta.collection("users").is_empty().await);
}

#[tokio::test]
async fn test_delete_user_does_not_cascade() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    let user = adapter.create_user(fixtures::user()).await.unwrap();
    adapter.link_account(fixtures::account(&user.id)).await.unwrap();
    adapter.create_session(fixtures::session(&user.id)).await.unwrap();

    adapter.delete_user(&user.id).await.unwrap();
    assert_eq!(deta.collection("accounts").len().await, 1);
    assert_eq!(deta.collection("sessions").len().await, 1);
}

// ─── Accounts ────────────────────────────────────────────────────

#[tokio::test]
async fn test_unlink_missing_account_is_noop() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    adapter
        .link_account(NewAccount::oauth("u1", "github", "gh-1"))
        .await
        .unwrap();

    adapter.unlink_account("github", "gh-2").await.unwrap();
    adapter.unlink_account("gitlab", "gh-1").await.unwrap();
    assert_eq!(deta.collection("accounts").len().await, 1);
}

#[tokio::test]
async fn test_account_lookup_needs_both_attributes() {
    let deta = MemoryDeta::with_scan_window(1);
    let adapter = adapter_over(&deta);
    adapter
        .create_user(NewUser::new("a@x.com").with_id("u1"))
        .await
        .unwrap();
    adapter
        .create_user(NewUser::new("b@x.com").with_id("u2"))
        .await
        .unwrap();
    adapter
        .link_account(NewAccount::oauth("u1", "github", "42"))
        .await
        .unwrap();
    adapter
        .link_account(NewAccount::oauth("u2", "gitlab", "42"))
        .await
        .unwrap();

    let gitlab = adapter.get_user_by_account("gitlab", "42").await.unwrap().unwrap();
    assert_eq!(gitlab.id, "u2");
    let github = adapter.get_account("github", "42").await.unwrap().unwrap();
    assert_eq!(github.user_id, "u1");
}

#[tokio::test]
async fn test_account_token_fields_keep_snake_case() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    let account = NewAccount {
        access_token: Some("at".into()),
        expires_at: Some(1_900_000_000),
        ..NewAccount::oauth("u1", "github", "gh-1")
    };
    adapter.link_account(account).await.unwrap();

    let stored = &deta.collection("accounts").snapshot().await[0];
    assert_eq!(stored["access_token"], "at");
    assert_eq!(stored["expires_at"], 1_900_000_000);
    assert_eq!(stored["providerAccountId"], "gh-1");
    assert_eq!(stored["type"], "oauth");
}

// ─── Sessions ────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_of_deleted_user_is_not_found() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    let user = adapter.create_user(fixtures::user()).await.unwrap();
    let session = adapter.create_session(fixtures::session(&user.id)).await.unwrap();

    adapter.delete_user(&user.id).await.unwrap();
    assert!(adapter
        .get_session_and_user(&session.session_token)
        .await
        .unwrap()
        .is_none());
    // The session document itself is left in place.
    assert_eq!(deta.collection("sessions").len().await, 1);
}

#[tokio::test]
async fn test_update_session_persists_expiry() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    let start = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    adapter
        .create_session(NewSession::new("tok", "u1", start))
        .await
        .unwrap();

    let later = start + Duration::days(30);
    let patch = deta_auth_core::SessionPatch::new("tok").with_expires(later);
    let updated = adapter.update_session(patch).await.unwrap().unwrap();
    assert_eq!(updated.expires, later);

    let stored = &deta.collection("sessions").snapshot().await[0];
    assert_eq!(stored["expires"], "2030-01-31T00:00:00Z");
}

// ─── Verification Tokens ─────────────────────────────────────────

#[tokio::test]
async fn test_verification_token_is_one_shot() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    let expires = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let created = adapter
        .create_verification_token(NewVerificationToken::new("a@x.com", "t1", expires))
        .await
        .unwrap();

    let first = adapter.use_verification_token("a@x.com", "t1").await.unwrap();
    assert_eq!(first, Some(created));
    let second = adapter.use_verification_token("a@x.com", "t1").await.unwrap();
    assert!(second.is_none());
    assert!(deta.collection("verificationTokens").is_empty().await);
}

// ─── Store Faults ────────────────────────────────────────────────

#[tokio::test]
async fn test_malformed_document_is_a_fault_not_absence() {
    let deta = MemoryDeta::new();
    let adapter = adapter_over(&deta);
    deta.collection("sessions")
        .put(raw(json!({
            "key": "s1",
            "sessionToken": "tok",
            "userId": "u1",
            "expires": "not a date"
        })))
        .await
        .unwrap();

    let err = adapter.get_session_and_user("tok").await.unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}
