//! Per-width integer bounds and uniform random generators used when filling
//! fields with random values.

use rand::Rng;

pub const LEFT_BYTE: i128 = 0;
pub const RIGHT_BYTE: i128 = (1 << 8) - 1;
pub const LEFT_SHORT: i128 = 0;
pub const RIGHT_SHORT: i128 = (1 << 16) - 1;
pub const LEFT_INT: i128 = 0;
pub const RIGHT_INT: i128 = (1 << 32) - 1;
pub const LEFT_LONG: i128 = 0;
pub const RIGHT_LONG: i128 = u64::MAX as i128;
pub const LEFT_SIGNED_BYTE: i128 = i8::MIN as i128;
pub const RIGHT_SIGNED_BYTE: i128 = i8::MAX as i128;
pub const LEFT_SIGNED_SHORT: i128 = i16::MIN as i128;
pub const RIGHT_SIGNED_SHORT: i128 = i16::MAX as i128;
pub const LEFT_SIGNED_INT: i128 = i32::MIN as i128;
pub const RIGHT_SIGNED_INT: i128 = i32::MAX as i128;
pub const LEFT_SIGNED_LONG: i128 = i64::MIN as i128;
pub const RIGHT_SIGNED_LONG: i128 = i64::MAX as i128;

const ASCII_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Returns an unsigned random byte value.
pub fn rand_byte() -> i128 {
    rand::thread_rng().gen_range(LEFT_BYTE..=RIGHT_BYTE)
}

/// Returns a signed random byte value.
pub fn rand_signed_byte() -> i128 {
    rand::thread_rng().gen_range(LEFT_SIGNED_BYTE..=RIGHT_SIGNED_BYTE)
}

/// Returns an unsigned random short value.
pub fn rand_short() -> i128 {
    rand::thread_rng().gen_range(LEFT_SHORT..=RIGHT_SHORT)
}

/// Returns a signed random short value.
pub fn rand_signed_short() -> i128 {
    rand::thread_rng().gen_range(LEFT_SIGNED_SHORT..=RIGHT_SIGNED_SHORT)
}

/// Returns an unsigned random int value.
pub fn rand_int() -> i128 {
    rand::thread_rng().gen_range(LEFT_INT..=RIGHT_INT)
}

/// Returns a signed random int value.
pub fn rand_signed_int() -> i128 {
    rand::thread_rng().gen_range(LEFT_SIGNED_INT..=RIGHT_SIGNED_INT)
}

/// Returns an unsigned random long value.
pub fn rand_long() -> i128 {
    rand::thread_rng().gen_range(LEFT_LONG..=RIGHT_LONG)
}

/// Returns a signed random long value.
pub fn rand_signed_long() -> i128 {
    rand::thread_rng().gen_range(LEFT_SIGNED_LONG..=RIGHT_SIGNED_LONG)
}

/// Returns a random unsigned value that fits in `bits` bits (1..=64).
pub fn rand_bits(bits: usize) -> u64 {
    if bits >= 64 {
        return rand::thread_rng().gen::<u64>();
    }
    let high = (1u64 << bits) - 1;
    rand::thread_rng().gen_range(0..=high)
}

/// Returns a random ASCII-letter string of the given length.
pub fn rand_string(length: usize) -> String {
    rand_string_from(length, ASCII_LETTERS)
}

/// Returns a random string of the given length built from `charset`.
pub fn rand_string_from(length: usize, charset: &[u8]) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let index = rng.gen_range(0..charset.len());
            charset[index] as char
        })
        .collect()
}

/// Returns `length` random bytes.
pub fn rand_bytes(length: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..length).map(|_| rng.gen::<u8>()).collect()
}
