//! Field-grammar validators.
//!
//! Pure predicates on the character classes and length bounds the wire
//! protocol places on identifiers, secrets, display names and message
//! content. No parsing, no allocation — just yes/no gates applied to
//! outbound fields before they're handed to a codec.

/// `username` / `channel_id`: 1-20 chars from `[A-Za-z0-9-]`.
pub fn is_valid_id(s: &str) -> bool {
    is_len_in(s, 1, 20) && s.bytes().all(is_id_byte)
}

/// `secret`: 1-128 chars from `[A-Za-z0-9-]`.
pub fn is_valid_secret(s: &str) -> bool {
    is_len_in(s, 1, 128) && s.bytes().all(is_id_byte)
}

/// `display_name`: 1-20 printable ASCII, `0x21`-`0x7E`.
pub fn is_valid_display_name(s: &str) -> bool {
    is_len_in(s, 1, 20) && s.bytes().all(|b| (0x21..=0x7E).contains(&b))
}

/// `content`: 1-1400 bytes, `0x20`-`0x7E` (printable plus space).
pub fn is_valid_content(s: &str) -> bool {
    is_len_in(s, 1, 1400) && s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-'
}

fn is_len_in(s: &str, min: usize, max: usize) -> bool {
    let len = s.len();
    len >= min && len <= max
}
