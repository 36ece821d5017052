//! Ticket code generation.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of a ticket code.
pub const CODE_LENGTH: usize = 6;

/// Draw a random code from `[A-Za-z0-9]`.
///
/// Uniqueness is enforced where the code is stored, by redrawing on
/// collision.
pub fn generate_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_LENGTH)
        .map(char::from)
        .collect()
}
