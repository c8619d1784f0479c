use rand::{rngs::OsRng, Rng};
use uuid::Uuid;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const CONFIRMATION_CODE_LEN: usize = 6;
pub const TEMP_CODE_PREFIX: &str = "TMP";
pub const TEMP_CODE_SUFFIX_LEN: usize = 5;
/// Random candidates tried before falling back to an id-derived code.
pub const MAX_CODE_ATTEMPTS: usize = 6;

/// Uppercase alphanumeric code drawn from the operating system's CSPRNG.
/// Codes are shown to customers, so they must not be predictable.
pub fn random_code(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

pub fn confirmation_code() -> String {
    random_code(CONFIRMATION_CODE_LEN)
}

pub fn temporary_code() -> String {
    format!("{}{}", TEMP_CODE_PREFIX, random_code(TEMP_CODE_SUFFIX_LEN))
}

/// Deterministic code used once every random candidate collided. Its
/// length keeps it out of the random code namespace.
pub fn fallback_confirmation_code(booking_id: Uuid) -> String {
    format!("PNR{}", booking_id.simple()).to_uppercase()
}

pub fn fallback_temporary_code(booking_id: Uuid) -> String {
    format!("{}{}", TEMP_CODE_PREFIX, booking_id.simple()).to_uppercase()
}
