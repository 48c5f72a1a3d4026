//! Password hashing and session-based authentication.
//!
//! Passwords are stored as self-describing PHC digest strings (algorithm,
//! cost parameters and salt embedded), produced by Argon2id keyed with the
//! `SALT` secret. Sessions store the user id under the `uid` key; the cookie
//! machinery itself is actix-session's.

use crate::user::Profile;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version,
};
use once_cell::sync::OnceCell;

static ARGON2: OnceCell<Argon2<'static>> = OnceCell::new();

const SESSION_USER_KEY: &str = "uid";

/// Builds the global Argon2 instance from the `SALT` environment variable.
/// Panics if `SALT` is unset or unusable as a secret.
pub fn init() {
    let secret: &'static [u8] = Box::leak(
        std::env::var("SALT")
            .expect("SALT must be set.")
            .into_bytes()
            .into_boxed_slice(),
    );
    let argon2 = Argon2::new_with_secret(
        secret,
        Algorithm::Argon2id,
        Version::V0x13,
        Params::default(),
    )
    .expect("SALT is not usable as an Argon2 secret.");
    ARGON2
        .set(argon2)
        .map_err(|_| ())
        .expect("session::init() was called more than once.");
}

pub fn get_argon2() -> &'static Argon2<'static> {
    ARGON2.get().expect("session::init() has not been called.")
}

/// Hashes a password with a freshly generated random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    Ok(get_argon2()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))?
        .to_string())
}

/// Verifies a candidate password against a stored digest. The salt and cost
/// parameters come from the digest itself; comparison is delegated to the
/// argon2 crate.
pub fn verify_password(candidate: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => get_argon2()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("verify_password: unparseable digest: {}", e);
            false
        }
    }
}

/// Resolves the session's user, if any. Failures are logged and treated as a
/// guest session rather than bubbled to the caller.
pub async fn authenticate_client_by_session(session: &actix_session::Session) -> Option<Profile> {
    let user_id = match session.get::<i32>(SESSION_USER_KEY) {
        Ok(Some(id)) => id,
        Ok(None) => return None,
        Err(e) => {
            log::error!("authenticate_client_by_session: session read: {}", e);
            return None;
        }
    };

    match crate::user::find_profile(crate::db::get_db_pool(), user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            log::error!("authenticate_client_by_session: {}", e);
            None
        }
    }
}

/// Writes the user id into the session after a successful login.
pub fn start_session(
    session: &actix_session::Session,
    user_id: i32,
) -> Result<(), actix_session::SessionInsertError> {
    session.insert(SESSION_USER_KEY, user_id)
}

/// Drops all session state, logging the user out.
pub fn end_session(session: &actix_session::Session) {
    session.purge();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    fn init_for_test() {
        INIT.call_once(|| {
            if std::env::var("SALT").is_err() {
                std::env::set_var("SALT", "testsaltfortestingonly1234567890AB");
            }
            init();
        });
    }

    #[test]
    fn hash_verify_round_trip() {
        init_for_test();

        for password in ["hunter2", "correct horse battery staple", "p@$$w0rd!~`[]{}"] {
            let digest = hash_password(password).expect("hashing failed");
            assert!(verify_password(password, &digest));
        }
    }

    #[test]
    fn verify_rejects_wrong_password() {
        init_for_test();

        let digest = hash_password("original password").expect("hashing failed");
        assert!(!verify_password("different password", &digest));
        assert!(!verify_password("", &digest));
    }

    #[test]
    fn hashes_are_salted() {
        init_for_test();

        let a = hash_password("same input").expect("hashing failed");
        let b = hash_password("same input").expect("hashing failed");
        // Random salts mean two digests of the same password differ.
        assert_ne!(a, b);
    }

    #[test]
    fn digest_is_self_describing() {
        init_for_test();

        let digest = hash_password("anything").expect("hashing failed");
        assert!(digest.starts_with("$argon2id$"));
    }

    #[test]
    fn verify_rejects_garbage_digest() {
        init_for_test();

        assert!(!verify_password("anything", "not a digest"));
    }
}
