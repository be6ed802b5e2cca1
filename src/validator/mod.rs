mod local;
mod types;

pub use types::{Address, SyntaxError, SyntaxReport};

use std::sync::LazyLock;

use regex::Regex;

use local::{check_local_dots, check_local_length};

pub(crate) const MAX_ADDRESS_LEN: usize = 254;

// ASCII atext local part; domain labels of 1..=63 alphanumerics with inner hyphens.
static ADDRESS_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~.-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("address grammar is a valid regex")
});

/// Validates the syntax of `email` without any network access.
pub fn validate_syntax(email: &str) -> SyntaxReport {
    match check_syntax(email) {
        Ok(_) => SyntaxReport::valid(),
        Err(err) => SyntaxReport::invalid(&err),
    }
}

/// Applies the syntax rules in order and returns the first one that fails.
/// On success the trimmed address is returned split at its `@`.
pub fn check_syntax(email: &str) -> Result<Address<'_>, SyntaxError> {
    let input = email.trim();
    if input.is_empty() {
        return Err(SyntaxError::Empty);
    }

    let at_count = input.matches('@').count();
    if at_count != 1 {
        return Err(SyntaxError::AtCount(at_count));
    }

    if !ADDRESS_GRAMMAR.is_match(input) {
        return Err(SyntaxError::Grammar);
    }

    let Some((local, domain)) = input.split_once('@') else {
        return Err(SyntaxError::AtCount(at_count));
    };

    check_local_length(local)?;
    if input.len() > MAX_ADDRESS_LEN {
        return Err(SyntaxError::TooLong(input.len()));
    }

    check_local_dots(local)?;

    if !domain.contains('.') {
        return Err(SyntaxError::DomainWithoutDot);
    }

    Ok(Address { local, domain })
}
