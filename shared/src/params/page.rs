//! Pagination parameters
//!
//! List requests carry `offset`/`limit` directly (query-string
//! deserialization cannot see through nested structs); these helpers keep
//! the defaults and bounds in one place.

/// Default page size when `limit` is absent
pub fn default_limit() -> i64 {
    20
}

/// `offset >= 0`, `1 <= limit <= 1000`
pub fn validate_page(offset: i64, limit: i64) -> Result<(), String> {
    if offset < 0 {
        return Err("offset must be non-negative".to_string());
    }
    if !(1..=1000).contains(&limit) {
        return Err("limit must be between 1 and 1000".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(validate_page(0, default_limit()).is_ok());
        assert!(validate_page(0, 1000).is_ok());
        assert!(validate_page(-1, 10).is_err());
        assert!(validate_page(0, 0).is_err());
        assert!(validate_page(0, 1001).is_err());
    }
}
