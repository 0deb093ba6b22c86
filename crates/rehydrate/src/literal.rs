//! Literal syntax
//!
//! Scalars, keys and byte payloads in the form the replay grammar reads
//! back. Every function appends to a caller-owned buffer.
//!
//! # Format Examples
//!
//! - Int: `42`, `-7`
//! - Float: `3.14`, `1e100`, `2.0`, `NAN`, `INF`, `-INF`
//! - Bool: `true` / `false`
//! - String: `"hello\n"` (with proper escaping)
//! - Bytes: `b"00ff10"` (lowercase hex)

use rehydrate_core::Key;

pub fn format_bool(b: bool, buf: &mut String) {
    buf.push_str(if b { "true" } else { "false" });
}

pub fn format_int(n: i64, buf: &mut String) {
    buf.push_str(&n.to_string());
}

/// Format a float so it reads back as the same bits
///
/// Debug formatting is the shortest representation that round-trips and
/// always carries a '.' or an exponent, which keeps floats apart from ints.
pub fn format_float(f: f64, buf: &mut String) {
    if f.is_nan() {
        buf.push_str("NAN");
    } else if f.is_infinite() {
        buf.push_str(if f > 0.0 { "INF" } else { "-INF" });
    } else {
        buf.push_str(&format!("{:?}", f));
    }
}

/// Format a string with proper escaping
pub fn format_string(s: &str, buf: &mut String) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            '\0' => buf.push_str("\\0"),
            c if c.is_control() => {
                buf.push_str(&format!("\\u{{{:x}}}", c as u32));
            }
            c => buf.push(c),
        }
    }
    buf.push('"');
}

pub fn format_key(key: &Key, buf: &mut String) {
    match key {
        Key::Int(n) => format_int(*n, buf),
        Key::String(s) => format_string(s, buf),
    }
}

/// Format a byte payload as a hex literal
pub fn format_bytes(bytes: &[u8], buf: &mut String) {
    buf.push_str("b\"");
    buf.push_str(&hex::encode(bytes));
    buf.push('"');
}
