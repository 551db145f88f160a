//! Sign-up, sign-in and profile maintenance

mod common;

use teamboard_shared::auth::CurrentUser;
use teamboard_shared::services::accounts::{self, ProfileUpdate, SignUp};
use teamboard_shared::services::{teams, ServiceError};

fn sign_up(name: &str, email: &str, password: &str) -> SignUp {
    SignUp {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_sign_up_and_sign_in() {
    let store = common::store();

    let user = accounts::sign_up(&store, sign_up("Ada", " Ada@Example.com ", "secret1"))
        .await
        .unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_ne!(user.password_hash, "secret1");

    let signed_in = accounts::sign_in(&store, "ADA@example.com", "secret1").await.unwrap();
    assert_eq!(signed_in.id, user.id);

    let err = accounts::sign_in(&store, "ada@example.com", "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(ref m) if m == "Invalid email or password"));

    let err = accounts::sign_in(&store, "nobody@example.com", "secret1")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(ref m) if m == "Invalid email or password"));
}

#[tokio::test]
async fn test_sign_up_rejects_duplicates_and_short_passwords() {
    let store = common::store();

    let err = accounts::sign_up(&store, sign_up("Ada", "ada@example.com", "12345"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref m) if m == "Password must be at least 6 characters"));

    accounts::sign_up(&store, sign_up("Ada", "ada@example.com", "secret1"))
        .await
        .unwrap();
    let err = accounts::sign_up(&store, sign_up("Other", "ADA@example.com", "secret2"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Email is already in use");
}

#[tokio::test]
async fn test_profile_lists_memberships() {
    let store = common::store();
    let user = common::user(&store, "ada").await;
    let team_id = common::team(&store, &user, "Core").await;

    let profile = accounts::profile(&store, &user).await.unwrap();

    assert_eq!(profile.email, "ada@example.com");
    assert_eq!(profile.memberships.len(), 1);
    assert_eq!(profile.memberships[0].membership.team_id, team_id);
    assert_eq!(profile.memberships[0].team.as_ref().unwrap().name, "Core");
}

#[tokio::test]
async fn test_update_profile_password_rules() {
    let store = common::store();
    let account = accounts::sign_up(&store, sign_up("Ada", "ada@example.com", "secret1"))
        .await
        .unwrap();
    let user = CurrentUser::from(&account);
    common::user(&store, "grace").await;

    let err = accounts::update_profile(
        &store,
        &user,
        ProfileUpdate {
            email: Some("grace@example.com".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Email is already in use");

    let err = accounts::update_profile(
        &store,
        &user,
        ProfileUpdate {
            new_password: Some("another1".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Current password is required to set a new password"
    );

    let err = accounts::update_profile(
        &store,
        &user,
        ProfileUpdate {
            current_password: Some("wrong-one".to_string()),
            new_password: Some("another1".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Current password is incorrect");

    let updated = accounts::update_profile(
        &store,
        &user,
        ProfileUpdate {
            name: Some(" Ada L. ".to_string()),
            current_password: Some("secret1".to_string()),
            new_password: Some("another1".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name.as_deref(), Some("Ada L."));

    accounts::sign_in(&store, "ada@example.com", "another1").await.unwrap();
    assert!(accounts::sign_in(&store, "ada@example.com", "secret1").await.is_err());

    // team creation still works for the renamed account
    teams::create_team(&store, &user, "Core").await.unwrap();
}
