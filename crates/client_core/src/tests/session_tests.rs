use super::*;

use shared::domain::ApiLayout;

use crate::test_support::FakeAccountApi;

const LOGOUT_DELAY: Duration = Duration::from_secs(2);

fn controller(api: &Arc<FakeAccountApi>) -> SessionController {
    SessionController::new(api.clone(), LOGOUT_DELAY)
}

fn ada_account() -> NewAccount {
    NewAccount {
        username: "prof1".into(),
        password: "pw".into(),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: None,
    }
}

#[tokio::test]
async fn sign_in_with_matching_credentials_authenticates() {
    let api = Arc::new(FakeAccountApi::with_ada());
    let session = controller(&api);
    let mut events = session.subscribe_events();

    let profile = session.sign_in("prof1", "pw").await.expect("sign in");
    assert_eq!(profile.username, "prof1");
    assert_eq!(welcome_message(&profile), "Welcome, Ada!");
    assert!(session.session().await.is_authenticated());
    assert_eq!(
        events.recv().await.expect("event"),
        SessionEvent::SignedIn {
            username: "prof1".into()
        }
    );
    assert_eq!(api.calls(), ["login", "fetch_account"]);
}

#[tokio::test]
async fn sign_in_with_wrong_password_stays_anonymous() {
    let api = Arc::new(FakeAccountApi::with_ada());
    let session = controller(&api);

    let err = session.sign_in("prof1", "nope").await.expect_err("reject");
    assert_eq!(err, AuthError::InvalidCredentials);
    assert_eq!(session.session().await, Session::Anonymous);
    assert_eq!(api.calls(), ["login"]);
}

#[tokio::test]
async fn unknown_user_is_indistinguishable_from_wrong_password() {
    let api = Arc::new(FakeAccountApi::with_ada());
    let session = controller(&api);

    let err = session.sign_in("ghost", "pw").await.expect_err("reject");
    assert_eq!(err, AuthError::InvalidCredentials);
}

#[tokio::test]
async fn transport_failure_during_sign_in_is_a_connection_error() {
    let api = Arc::new(FakeAccountApi::with_ada());
    api.set_offline(true);
    let session = controller(&api);

    let err = session.sign_in("prof1", "pw").await.expect_err("offline");
    assert!(matches!(err, AuthError::Connection(_)));
    assert_eq!(session.session().await, Session::Anonymous);
}

#[tokio::test]
async fn sign_up_reports_first_name_without_signing_in() {
    let api = Arc::new(FakeAccountApi::new(ApiLayout::Instructors));
    let session = controller(&api);

    let record = session.sign_up(&ada_account()).await.expect("sign up");
    assert_eq!(
        account_created_message(&record),
        "Welcome Ada! Your account has been created successfully."
    );
    assert_eq!(session.session().await, Session::Anonymous);
    assert_eq!(api.password_of("prof1").as_deref(), Some("pw"));
}

#[tokio::test]
async fn duplicate_sign_up_is_an_account_conflict() {
    let api = Arc::new(FakeAccountApi::with_ada());
    let session = controller(&api);

    let err = session.sign_up(&ada_account()).await.expect_err("duplicate");
    assert_eq!(err, AuthError::AccountConflict);
}

#[tokio::test]
async fn mismatched_confirmation_makes_no_request() {
    let api = Arc::new(FakeAccountApi::with_ada());
    let session = controller(&api);
    session.sign_in("prof1", "pw").await.expect("sign in");
    let before = api.calls().len();

    let err = session
        .change_password("pw", "new-one", "new-two")
        .await
        .expect_err("mismatch");
    assert!(matches!(err, AuthError::Validation(_)));
    assert_eq!(api.calls().len(), before);
    assert!(!session.has_pending_logout().await);
}

#[tokio::test]
async fn change_password_requires_a_session() {
    let api = Arc::new(FakeAccountApi::with_ada());
    let session = controller(&api);

    let err = session
        .change_password("pw", "next", "next")
        .await
        .expect_err("anonymous");
    assert_eq!(err, AuthError::NotAuthenticated);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn rejected_old_password_keeps_the_session() {
    let api = Arc::new(FakeAccountApi::with_ada());
    let session = controller(&api);
    session.sign_in("prof1", "pw").await.expect("sign in");

    let err = session
        .change_password("wrong", "next", "next")
        .await
        .expect_err("rejected");
    assert_eq!(err, AuthError::InvalidOldPassword);
    assert!(session.session().await.is_authenticated());
    assert!(!session.has_pending_logout().await);
}

#[tokio::test(start_paused = true)]
async fn password_change_logs_out_once_after_the_delay() {
    let api = Arc::new(FakeAccountApi::with_ada());
    let session = controller(&api);
    session.sign_in("prof1", "pw").await.expect("sign in");
    let mut events = session.subscribe_events();

    session
        .change_password("pw", "next", "next")
        .await
        .expect("change");
    assert_eq!(api.password_of("prof1").as_deref(), Some("next"));
    assert!(session.has_pending_logout().await);
    assert_eq!(
        events.recv().await.expect("event"),
        SessionEvent::PasswordChanged {
            logout_in: LOGOUT_DELAY
        }
    );

    tokio::time::sleep(LOGOUT_DELAY - Duration::from_millis(100)).await;
    assert!(session.session().await.is_authenticated());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(session.session().await, Session::Anonymous);
    assert!(!session.has_pending_logout().await);
    assert_eq!(
        events.recv().await.expect("event"),
        SessionEvent::SignedOut {
            reason: SignOutReason::PasswordChanged
        }
    );

    tokio::time::sleep(LOGOUT_DELAY * 3).await;
    assert!(events.try_recv().is_err());

    let err = session
        .change_password("next", "again", "again")
        .await
        .expect_err("signed out");
    assert_eq!(err, AuthError::NotAuthenticated);
}

#[tokio::test(start_paused = true)]
async fn manual_logout_cancels_the_deferred_logout() {
    let api = Arc::new(FakeAccountApi::with_ada());
    let session = controller(&api);
    session.sign_in("prof1", "pw").await.expect("sign in");
    session
        .change_password("pw", "next", "next")
        .await
        .expect("change");

    session.logout().await;
    assert!(!session.has_pending_logout().await);

    // Sign back in before the old timer would have fired.
    session.sign_in("prof1", "next").await.expect("sign in again");
    let mut events = session.subscribe_events();

    tokio::time::sleep(LOGOUT_DELAY * 2).await;
    assert!(session.session().await.is_authenticated());
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn fresh_sign_in_replaces_a_pending_logout() {
    let api = Arc::new(FakeAccountApi::with_ada());
    api.insert("prof2", "pw2", "Alan", "Turing");
    let session = controller(&api);
    session.sign_in("prof1", "pw").await.expect("sign in");
    session
        .change_password("pw", "next", "next")
        .await
        .expect("change");

    session.sign_in("prof2", "pw2").await.expect("switch user");
    assert!(!session.has_pending_logout().await);

    tokio::time::sleep(LOGOUT_DELAY * 2).await;
    let current = session.session().await;
    assert_eq!(current.profile().map(|p| p.username.as_str()), Some("prof2"));
}

#[tokio::test]
async fn logout_is_idempotent() {
    let api = Arc::new(FakeAccountApi::with_ada());
    let session = controller(&api);
    let mut events = session.subscribe_events();

    session.logout().await;
    assert_eq!(session.session().await, Session::Anonymous);
    assert!(events.try_recv().is_err());

    session.sign_in("prof1", "pw").await.expect("sign in");
    session.logout().await;
    session.logout().await;
    assert_eq!(session.session().await, Session::Anonymous);

    let mut signed_out = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SessionEvent::SignedOut { .. }) {
            signed_out += 1;
        }
    }
    assert_eq!(signed_out, 1);
}

#[test]
fn profile_names_fall_back_to_username() {
    let profile = Profile {
        id: None,
        username: "prof9".into(),
        first_name: String::new(),
        last_name: String::new(),
        email: None,
        signed_in_at: Utc::now(),
    };
    assert_eq!(profile.greeting_name(), "prof9");
    assert_eq!(profile.display_name(), "prof9");
}

#[test]
fn profile_and_record_name_the_user_the_same_way() {
    let record = AccountRecord {
        id: Some(AccountId(1)),
        username: "prof1".into(),
        first_name: "  Ada Augusta ".into(),
        last_name: "King".into(),
        email: None,
    };
    let profile = Profile::from_record(record.clone(), Utc::now());
    assert_eq!(profile.greeting_name(), record.greeting_name());
    assert_eq!(profile.display_name(), record.display_name());
    assert_eq!(profile.display_name(), "Ada Augusta King");
}
