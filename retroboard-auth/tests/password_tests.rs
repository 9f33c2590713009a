use retroboard_auth::{AuthError, PasswordManager};

#[test]
fn a_password_verifies_against_its_own_hash() {
    let manager = PasswordManager::new();

    let hash = manager.hash_password("hunter2").unwrap();
    assert!(manager.compare_hash_and_password(&hash, "hunter2").is_ok());
}

#[test]
fn the_wrong_password_is_rejected() {
    let manager = PasswordManager::new();

    let hash = manager.hash_password("hunter2").unwrap();
    let err = manager
        .compare_hash_and_password(&hash, "wrong")
        .unwrap_err();

    assert!(matches!(err, AuthError::IncorrectPassword));
}

#[test]
fn hashes_are_salted() {
    let manager = PasswordManager::new();

    let first = manager.hash_password("hunter2").unwrap();
    let second = manager.hash_password("hunter2").unwrap();

    assert_ne!(first, second);
}
