//! Domain typo detection: Levenshtein distance against the typo table.

use std::sync::LazyLock;

use tracing::debug;

use crate::LOG_TARGET;
use crate::tables::ReferenceTables;

/// Largest edit distance still reported as a likely typo.
pub const MAX_TYPO_DISTANCE: usize = 2;

static BUILTIN_TABLES: LazyLock<ReferenceTables> = LazyLock::new(ReferenceTables::builtin);

/// A corrected address proposed for a probable typo.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub suggested_email: String,
    pub edit_distance: usize,
}

/// Levenshtein distance (insert, delete and substitute all cost 1), counted
/// in `char`s.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Suggests a corrected address using the built-in typo table.
pub fn did_you_mean(email: &str) -> Option<String> {
    suggest(email, &BUILTIN_TABLES).map(|s| s.suggested_email)
}

/// Looks the domain of `email` up in `tables`.
///
/// An exact typo-table hit wins with distance 0. Otherwise every typo key is
/// scored and the closest one within [`MAX_TYPO_DISTANCE`] whose correction
/// differs from the input is kept; ties go to the earliest table entry.
pub fn suggest(email: &str, tables: &ReferenceTables) -> Option<Suggestion> {
    let (local, domain) = email.trim().rsplit_once('@')?;
    let domain = domain.to_ascii_lowercase();
    if domain.is_empty() {
        return None;
    }

    if let Some(fix) = tables.correction_for(&domain) {
        return Some(Suggestion {
            suggested_email: format!("{local}@{fix}"),
            edit_distance: 0,
        });
    }

    let mut best: Option<(usize, &str)> = None;
    for (typo, fix) in tables.typos() {
        if fix == domain {
            continue;
        }
        let distance = edit_distance(&domain, typo);
        if distance > MAX_TYPO_DISTANCE {
            continue;
        }
        if best.is_none_or(|(best_distance, _)| distance < best_distance) {
            best = Some((distance, fix));
        }
    }

    best.map(|(distance, fix)| {
        debug!(target: LOG_TARGET, %domain, fix, distance, "domain typo suspected");
        Suggestion {
            suggested_email: format!("{local}@{fix}"),
            edit_distance: distance,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn distance_basics() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("gmial.com", "gmail.com"), 2);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("héllo", "hello"), 1);
    }

    #[test]
    fn exact_table_hit() {
        assert_eq!(
            did_you_mean("user@gmial.com").as_deref(),
            Some("user@gmail.com")
        );
        let s = suggest("user@GMIAL.com", &ReferenceTables::builtin()).expect("suggestion");
        assert_eq!(s.edit_distance, 0);
        assert_eq!(s.suggested_email, "user@gmail.com");
    }

    #[test]
    fn correct_domains_get_no_suggestion() {
        assert_eq!(did_you_mean("user@gmail.com"), None);
        assert_eq!(did_you_mean("valid.user@example.com"), None);
        assert_eq!(did_you_mean("someone@mail.com"), None);
        assert_eq!(did_you_mean("someone@yahoo.fr"), None);
        assert_eq!(did_you_mean("no-at-sign"), None);
    }

    #[test]
    fn near_miss_is_corrected_by_distance() {
        let s = suggest("jane@hotmaik.com", &ReferenceTables::builtin()).expect("suggestion");
        assert_eq!(s.suggested_email, "jane@hotmail.com");
        assert_eq!(s.edit_distance, 1);
    }

    #[test]
    fn ties_go_to_first_table_entry() {
        let tables = ReferenceTables::empty()
            .with_typos([("abcd.io", "first.io"), ("abce.io", "second.io")]);
        let s = suggest("x@abcf.io", &tables).expect("suggestion");
        assert_eq!(s.suggested_email, "x@first.io");
        assert_eq!(s.edit_distance, 1);
    }

    #[test]
    fn correction_equal_to_input_is_skipped() {
        let tables = ReferenceTables::empty().with_typos([("exampel.com", "example.com")]);
        assert_eq!(suggest("x@example.com", &tables), None);
    }

    #[test]
    fn any_key_within_two_edits_is_a_candidate() {
        let tables = ReferenceTables::empty().with_typos([("gmail.cm", "gmail.com")]);
        let s = suggest("x@mail.com", &tables).expect("suggestion");
        assert_eq!(s.suggested_email, "x@gmail.com");
        assert_eq!(s.edit_distance, 2);

        // a correction target is only skipped against its own entries
        let tables = ReferenceTables::empty()
            .with_typos([("gmial.com", "gmail.com"), ("gmaik.com", "gmaik.net")]);
        let s = suggest("x@gmail.com", &tables).expect("suggestion");
        assert_eq!(s.suggested_email, "x@gmaik.net");
        assert_eq!(s.edit_distance, 1);

        assert_eq!(suggest("x@mail.com", &ReferenceTables::builtin()), None);
    }

    proptest! {
        #[test]
        fn distance_to_self_is_zero(s in "\\PC{0,24}") {
            prop_assert_eq!(edit_distance(&s, &s), 0);
        }

        #[test]
        fn distance_is_symmetric(a in "[a-z.]{0,16}", b in "[a-z.]{0,16}") {
            prop_assert_eq!(edit_distance(&a, &b), edit_distance(&b, &a));
        }

        #[test]
        fn distance_from_empty_is_length(s in "\\PC{0,24}") {
            prop_assert_eq!(edit_distance("", &s), s.chars().count());
        }
    }
}
