//! Number to ASCII conversion
//!
//! Integer formatting in any radix from 2 to 36, and shortest round-trip
//! formatting for doubles.

const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Write the digits of `val` in `radix` (2-36) into `buf`.
///
/// Returns the number of characters written, 0 for an invalid radix.
pub fn u64_to_str_radix(buf: &mut [u8], mut val: u64, radix: u32) -> usize {
    if buf.is_empty() || !(2..=36).contains(&radix) {
        return 0;
    }

    let mut i = 0;
    while i < buf.len() {
        buf[i] = DIGITS[(val % radix as u64) as usize];
        i += 1;
        val /= radix as u64;
        if val == 0 {
            break;
        }
    }

    buf[..i].reverse();
    i
}

/// Signed integer in the given radix, with a leading `-` when negative
pub fn i64_to_string_radix(val: i64, radix: u32) -> String {
    // 64 binary digits plus the sign
    let mut buf = [0u8; 65];
    let mut i = 0;
    if val < 0 {
        buf[0] = b'-';
        i = 1;
    }
    let n = u64_to_str_radix(&mut buf[i..], val.unsigned_abs(), radix);
    String::from_utf8_lossy(&buf[..i + n]).into_owned()
}

/// Shortest decimal form of a double that reads back to the same value.
///
/// Produces `NaN`, `Infinity` and `-Infinity` for the non-finite values.
/// Both zeros print as `0`.
pub fn f64_to_string(val: f64) -> String {
    if val.is_nan() {
        return "NaN".to_owned();
    }
    if val.is_infinite() {
        return if val > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if val == 0.0 {
        return "0".to_owned();
    }
    let mut buffer = ryu_js::Buffer::new();
    buffer.format_finite(val).to_owned()
}
