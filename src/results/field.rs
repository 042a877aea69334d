/// A single column value as returned by the driver: text, or `NULL`.
///
/// Conversions never fail. `NULL` and unparseable text convert to the type's zero value;
/// numeric text is read from its leading numeric prefix, so `"12abc"` reads as `12`.
/// Narrower integer accessors truncate the parsed 64-bit value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    value: Option<String>,
}

impl Field {
    #[must_use]
    pub fn new(value: Option<String>) -> Self {
        Self { value }
    }

    #[must_use]
    pub fn null() -> Self {
        Self { value: None }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// The raw text, or `None` for `NULL`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The text as an owned `String`; `NULL` becomes the empty string.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        self.value.clone().unwrap_or_default()
    }

    /// `true` when the leading integer is greater than zero.
    #[must_use]
    pub fn get_bool(&self) -> bool {
        self.get_i64() > 0
    }

    #[must_use]
    pub fn get_f32(&self) -> f32 {
        self.get_f64() as f32
    }

    #[must_use]
    pub fn get_f64(&self) -> f64 {
        self.value.as_deref().map_or(0.0, leading_float)
    }

    #[must_use]
    pub fn get_i16(&self) -> i16 {
        self.get_i64() as i16
    }

    #[must_use]
    pub fn get_i32(&self) -> i32 {
        self.get_i64() as i32
    }

    #[must_use]
    pub fn get_i64(&self) -> i64 {
        self.value
            .as_deref()
            .map_or(0, |s| leading_int(s).clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
    }

    #[must_use]
    pub fn get_u8(&self) -> u8 {
        self.get_i64() as u8
    }

    #[must_use]
    pub fn get_u16(&self) -> u16 {
        self.get_i64() as u16
    }

    #[must_use]
    pub fn get_u32(&self) -> u32 {
        self.get_i64() as u32
    }

    #[must_use]
    pub fn get_u64(&self) -> u64 {
        self.value
            .as_deref()
            .map_or(0, |s| leading_int(s).clamp(i128::from(i64::MIN), i128::from(u64::MAX)) as u64)
    }
}

impl From<Option<String>> for Field {
    fn from(value: Option<String>) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::new(Some(value.to_owned()))
    }
}

/// Parse an optionally signed run of leading digits, skipping leading whitespace.
fn leading_int(text: &str) -> i128 {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let mut acc: i128 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        acc = acc.saturating_mul(10).saturating_add(i128::from(byte - b'0'));
    }
    if negative { -acc } else { acc }
}

/// Parse the longest leading prefix that forms a valid float.
fn leading_float(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;

    while end < bytes.len() {
        let b = bytes[end];
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'+' | b'-' if end == 0 || matches!(bytes[end - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => seen_exp = true,
            _ => break,
        }
        end += 1;
    }

    // Back off trailing characters that leave the prefix incomplete ("1e", "1e-", "-").
    while end > 0 {
        if let Ok(value) = trimmed[..end].parse::<f64>() {
            return value;
        }
        end -= 1;
    }
    0.0
}
