use crate::error::ErrorKind;

/// Parse an unsigned numeric literal.
///
/// - `$FF` hexadecimal
/// - `%1010` binary
/// - `'A` character (its ASCII code)
/// - `255` decimal
pub fn parse(token: &str) -> Result<u32, ErrorKind> {
    let token = token.trim();
    let mut chars = token.chars();
    let (digits, radix) = match chars.next() {
        None => return Err(ErrorKind::NumericParsing),
        Some('$') => (chars.as_str(), 16),
        Some('%') => (chars.as_str(), 2),
        Some('\'') => {
            return match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u32),
                _ => Err(ErrorKind::NumericParsing),
            };
        }
        Some(_) => (token, 10),
    };
    // from_str_radix accepts a leading `+`, literals do not
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(ErrorKind::NumericParsing);
    }
    u32::from_str_radix(digits, radix).map_err(|_| ErrorKind::NumericParsing)
}
