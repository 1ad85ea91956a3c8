//! Tool call identifier generation.

use rand::{distr::Alphanumeric, Rng};

/// Number of random alphanumeric characters after the `call_` prefix.
///
/// 62^6 ids from a CSPRNG keeps the collision probability negligible
/// for per-turn identifiers that are never persisted.
const CALL_ID_LEN: usize = 6;

/// Generate a unique call id of the form `call_` + 6 alphanumerics.
///
/// `rand::rng()` is ChaCha-based and documented cryptographically
/// secure, satisfying the secure-source requirement without a separate
/// RNG dependency.
pub fn generate_call_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CALL_ID_LEN)
        .map(char::from)
        .collect();
    format!("call_{suffix}")
}
