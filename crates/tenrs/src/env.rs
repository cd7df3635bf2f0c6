use std::env;
use std::sync::OnceLock;

static TENRS_PRINT_LIMIT: OnceLock<usize> = OnceLock::new();
static TENRS_PRINT_PRECISION: OnceLock<usize> = OnceLock::new();

fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

/// Maximum number of elements `Display` renders before eliding.
pub(crate) fn print_limit() -> usize {
    *TENRS_PRINT_LIMIT.get_or_init(|| match env::var("TENRS_PRINT_LIMIT") {
        Ok(value) => parse_usize(&value).unwrap_or(24),
        _ => 24,
    })
}

/// Digits printed after the decimal point for float elements.
pub(crate) fn print_precision() -> usize {
    *TENRS_PRINT_PRECISION.get_or_init(|| match env::var("TENRS_PRINT_PRECISION") {
        Ok(value) => parse_usize(&value).unwrap_or(4),
        _ => 4,
    })
}
