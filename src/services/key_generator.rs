//! API key generation
//!
//! Keys look like `shke` + 10 random base-36 characters + the current Unix
//! millisecond timestamp in base 36, padded to 9 characters. Every key is
//! exactly [`KEY_LENGTH`] characters long.

use chrono::Utc;
use rand::Rng;

/// Literal prefix of every issued key
pub const KEY_PREFIX: &str = "shke";
/// Total length of an issued key
pub const KEY_LENGTH: usize = 23;
/// Number of leading characters left visible in the masked form
pub const VISIBLE_CHARS: usize = 4;

const RANDOM_CHARS: usize = 10;
const TIMESTAMP_CHARS: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A freshly generated key and its masked display form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKey {
    pub secret: String,
    pub display_secret: String,
}

/// Generate a new key using the thread-local RNG and the current time
pub fn generate_api_key() -> GeneratedKey {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    generate_with(&mut rand::thread_rng(), millis)
}

/// Generate a key from an explicit RNG and timestamp
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, timestamp_millis: u64) -> GeneratedKey {
    let mut secret = String::with_capacity(KEY_LENGTH);
    secret.push_str(KEY_PREFIX);
    secret.extend((0..RANDOM_CHARS).map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char));
    secret.push_str(&timestamp_segment(timestamp_millis));

    let display_secret = mask_secret(&secret);
    GeneratedKey {
        secret,
        display_secret,
    }
}

/// Mask everything after the first [`VISIBLE_CHARS`] characters
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(VISIBLE_CHARS).collect();
    format!("{}{}", visible, "*".repeat(KEY_LENGTH - VISIBLE_CHARS))
}

fn timestamp_segment(millis: u64) -> String {
    let encoded = to_base36(millis);
    if encoded.len() >= TIMESTAMP_CHARS {
        encoded[encoded.len() - TIMESTAMP_CHARS..].to_string()
    } else {
        format!("{:0>width$}", encoded, width = TIMESTAMP_CHARS)
    }
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
