use super::types::SyntaxError;

pub(crate) const MAX_LOCAL_LEN: usize = 64;

/// RFC 5321 limit on the local part.
pub(crate) fn check_local_length(local: &str) -> Result<(), SyntaxError> {
    if local.len() > MAX_LOCAL_LEN {
        return Err(SyntaxError::LocalTooLong(local.len()));
    }
    Ok(())
}

/// No leading or trailing dot, no "..".
pub(crate) fn check_local_dots(local: &str) -> Result<(), SyntaxError> {
    if local.starts_with('.') || local.ends_with('.') {
        return Err(SyntaxError::LocalDotEdge);
    }
    if local.contains("..") {
        return Err(SyntaxError::LocalConsecutiveDots);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn strict_dots() {
        assert_eq!(check_local_dots(".abc"), Err(SyntaxError::LocalDotEdge));
        assert_eq!(check_local_dots("abc."), Err(SyntaxError::LocalDotEdge));
        assert_eq!(
            check_local_dots("a..b"),
            Err(SyntaxError::LocalConsecutiveDots)
        );
        assert!(check_local_dots("a.b").is_ok());
    }

    #[test]
    fn length_bound() {
        assert!(check_local_length(&"a".repeat(64)).is_ok());
        assert_eq!(
            check_local_length(&"a".repeat(65)),
            Err(SyntaxError::LocalTooLong(65))
        );
    }
}
