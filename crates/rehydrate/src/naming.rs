//! Placeholder names
//!
//! The n-th object that needs a binding is named by `n` written in a
//! 63-symbol positional numeral system, most significant symbol first:
//! digits, then upper case, then lower case, then `_`.

const ALPHABET: &[u8; 63] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_";

/// Encode `n` in base 63
pub fn encode(mut n: usize) -> String {
    let base = ALPHABET.len();
    let mut digits = Vec::new();
    loop {
        digits.push(ALPHABET[n % base]);
        n /= base;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    // The alphabet is ASCII
    digits.into_iter().map(char::from).collect()
}

/// True for characters that may appear in an encoded name
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
