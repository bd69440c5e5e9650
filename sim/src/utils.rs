/// Parse numeric literal, decimal or `0x` prefixed hexadecimal
pub fn parse_literal(s: &str) -> Option<u64> {
    if let Ok(r) = s.parse() {
        return Some(r);
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok();
    }
    None
}

/// Format a register value as 8 hex digits
pub fn format_word(val: u32) -> String {
    format!("{val:08x}")
}

/// Render a line trace column of fixed width, so that columns of
/// consecutive cycles line up.
pub fn trace_column(content: Option<String>, width: usize) -> String {
    match content {
        Some(s) => format!("{s:>width$}"),
        None => " ".repeat(width),
    }
}
