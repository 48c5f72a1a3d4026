//! Integration tests for login credential checking

mod common;
use serial_test::serial;

use common::*;
use talentflow::web::login::{login, LoginResultStatus};

#[actix_rt::test]
#[serial]
async fn test_valid_credentials_accepted() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "validuser", "ValidPass123!")
        .await
        .expect("Failed to create test user");

    let result = login("validuser", "ValidPass123!")
        .await
        .expect("Login function failed");

    assert!(matches!(result.result, LoginResultStatus::Success));
    assert_eq!(result.user_id, Some(user.id));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_wrong_password_rejected() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    create_test_user(&db, "pwuser", "CorrectPassword1")
        .await
        .expect("Failed to create test user");

    let result = login("pwuser", "WrongPassword1")
        .await
        .expect("Login function failed");

    assert!(matches!(result.result, LoginResultStatus::BadPassword));
    assert!(result.user_id.is_none());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_unknown_username_rejected() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let result = login("nobody_here", "whatever123")
        .await
        .expect("Login function failed");

    assert!(matches!(result.result, LoginResultStatus::BadName));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_username_whitespace_trimmed() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    create_test_user(&db, "trimuser", "password123")
        .await
        .expect("Failed to create test user");

    let result = login("  trimuser  ", "password123")
        .await
        .expect("Login function failed");

    assert!(matches!(result.result, LoginResultStatus::Success));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
