// ============================
// crates/backend-lib/src/auth/token_generator.rs
// ============================
//! Random identifiers for issued session tokens.
//!
//! Every token carries one in its `jti` claim so individual tokens can be told
//! apart in logs even though they are never stored.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

/// 24 random bytes encode to exactly 32 URL-safe characters
const TOKEN_ID_BYTES: usize = 24;

/** Generate a 32-character token identifier
# Returns
A base64 URL-safe encoded string without padding */
pub fn generate_token_id() -> String {
    generate_secure_token_with_size(TOKEN_ID_BYTES)
}

/** Generate a random token of `bytes` bytes of entropy
The thread-local generator is a CSPRNG seeded from the OS.
# Returns
A base64 URL-safe encoded string without padding */
pub fn generate_secure_token_with_size(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}
