//! End-to-end account creation: prompt, hash, OTP device, store, verify.

mod common;

use common::{TEST_OTP, fast_hasher, memory_db};
use std::io::Cursor;
use webdesk_auth::otp::{create_hash, validate_otp};
use webdesk_auth::password::{MaskedLineReader, compare_password, create_password_with};
use webdesk_auth::users::{SqlUserStorage, User, UserStorage};

#[tokio::test]
async fn test_create_account_with_otp_device() {
    let storage = SqlUserStorage::new(memory_db().await);

    let prompt = MaskedLineReader::new(Cursor::new("s3cret!\n"), std::io::sink());
    let hash = create_password_with(prompt, &fast_hasher())
        .await
        .expect("password should be created");

    let verification = validate_otp(TEST_OTP).await.expect("otp should verify");
    assert!(verification.valid, "verification is marked valid");

    let user = User::new(
        0,
        "alice",
        hash,
        create_hash(&verification.otp.identity),
        i64::try_from(verification.otp.serial).expect("serial fits"),
        "Alice A.",
        vec!["admins".to_owned()],
        7,
        2,
    );
    let stored = storage.create_user(&user).await.expect("insert");

    let loaded = storage
        .find_by_username("alice")
        .await
        .expect("select")
        .expect("alice exists");
    assert_eq!(loaded.id, stored.id, "same record");
    assert_ne!(loaded.otp_id, "ccccccbchvth", "raw identity is not stored");
    assert_eq!(loaded.otp_id, create_hash("ccccccbchvth"), "hashed identity");
    assert_eq!(loaded.serial, 0x0010_6fd6, "serial from the OTP identity");

    assert!(
        compare_password("s3cret!", &loaded.password).await,
        "stored hash verifies the password"
    );
    assert!(
        !compare_password("s3cret", &loaded.password).await,
        "other passwords do not verify"
    );
}
