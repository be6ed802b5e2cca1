//! Reference data consulted by the verification engine: known domain typos,
//! disposable mailbox providers and role-account local parts.
//!
//! The built-in tables are compiled in with `phf`; [`ReferenceTables`] copies
//! them into an owned value so an engine can be built with custom data.

use std::collections::HashSet;

use phf::{phf_ordered_map, phf_set};

/// Misspelt domain -> intended domain. Order matters: ties in the
/// edit-distance scan go to the first entry. No key sits within two edits of
/// a real provider other than its own target (`mail.com`, `ymail.com`,
/// `yahoo.fr`, `hotmail.de`...).
const KNOWN_TYPOS: phf::OrderedMap<&'static str, &'static str> = phf_ordered_map! {
    "gmial.com" => "gmail.com",
    "gmali.com" => "gmail.com",
    "googlemial.com" => "googlemail.com",
    "yahooo.com" => "yahoo.com",
    "yhoo.com" => "yahoo.com",
    "yahho.com" => "yahoo.com",
    "hotmial.com" => "hotmail.com",
    "hotmai.com" => "hotmail.com",
    "hotmil.com" => "hotmail.com",
    "hotmaill.com" => "hotmail.com",
    "hotamil.com" => "hotmail.com",
    "hotmal.com" => "hotmail.com",
    "outlok.com" => "outlook.com",
    "outloo.com" => "outlook.com",
    "outlool.com" => "outlook.com",
    "outllok.com" => "outlook.com",
    "outlook.con" => "outlook.com",
    "iclod.com" => "icloud.com",
    "icoud.com" => "icloud.com",
    "icloud.con" => "icloud.com",
    "protonmial.com" => "protonmail.com",
    "protonmai.com" => "protonmail.com",
};

const DISPOSABLE_DOMAINS: phf::Set<&'static str> = phf_set! {
    "mailinator.com",
    "guerrillamail.com",
    "guerrillamail.net",
    "sharklasers.com",
    "10minutemail.com",
    "tempmail.com",
    "temp-mail.org",
    "yopmail.com",
    "yopmail.fr",
    "throwawaymail.com",
    "trashmail.com",
    "getnada.com",
    "dispostable.com",
    "maildrop.cc",
    "fakeinbox.com",
    "mintemail.com",
    "mohmal.com",
    "emailondeck.com",
    "discard.email",
    "mailnesia.com",
    "spamgourmet.com",
    "tempr.email",
};

const ROLE_ACCOUNTS: phf::Set<&'static str> = phf_set! {
    "admin",
    "administrator",
    "abuse",
    "billing",
    "careers",
    "contact",
    "help",
    "hello",
    "hostmaster",
    "hr",
    "info",
    "jobs",
    "marketing",
    "no-reply",
    "noreply",
    "office",
    "postmaster",
    "press",
    "root",
    "sales",
    "security",
    "service",
    "support",
    "team",
    "webmaster",
};

/// Immutable lookup data handed to a [`Verifier`](crate::Verifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTables {
    typos: Vec<(String, String)>,
    disposable_domains: HashSet<String>,
    role_accounts: HashSet<String>,
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReferenceTables {
    /// The tables shipped with the crate.
    pub fn builtin() -> Self {
        Self {
            typos: KNOWN_TYPOS
                .entries()
                .map(|(typo, fix)| (typo.to_string(), fix.to_string()))
                .collect(),
            disposable_domains: DISPOSABLE_DOMAINS.iter().map(|d| d.to_string()).collect(),
            role_accounts: ROLE_ACCOUNTS.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Tables with no entries at all.
    pub fn empty() -> Self {
        Self {
            typos: Vec::new(),
            disposable_domains: HashSet::new(),
            role_accounts: HashSet::new(),
        }
    }

    /// Replaces the typo table. Iteration order is preserved.
    pub fn with_typos<I, K, V>(mut self, typos: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.typos = typos
            .into_iter()
            .map(|(typo, fix)| (lowercase(typo.into()), lowercase(fix.into())))
            .collect();
        self
    }

    pub fn with_disposable_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disposable_domains = domains.into_iter().map(|d| lowercase(d.into())).collect();
        self
    }

    pub fn with_role_accounts<I, S>(mut self, locals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.role_accounts = locals.into_iter().map(|l| lowercase(l.into())).collect();
        self
    }

    pub fn typos(&self) -> impl Iterator<Item = (&str, &str)> {
        self.typos
            .iter()
            .map(|(typo, fix)| (typo.as_str(), fix.as_str()))
    }

    /// Exact typo-table hit for an already lowercased domain.
    pub fn correction_for(&self, domain: &str) -> Option<&str> {
        self.typos
            .iter()
            .find(|(typo, _)| typo == domain)
            .map(|(_, fix)| fix.as_str())
    }

    pub fn is_disposable(&self, domain: &str) -> bool {
        self.disposable_domains
            .contains(&domain.to_ascii_lowercase())
    }

    pub fn is_role_account(&self, local: &str) -> bool {
        self.role_accounts.contains(&local.to_ascii_lowercase())
    }
}

fn lowercase(value: String) -> String {
    value.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookups_ignore_case() {
        let tables = ReferenceTables::builtin();
        assert!(tables.is_disposable("Mailinator.COM"));
        assert!(!tables.is_disposable("example.com"));
        assert!(tables.is_role_account("Support"));
        assert!(!tables.is_role_account("jane.doe"));
    }

    #[test]
    fn builtin_typo_order_is_stable() {
        let tables = ReferenceTables::builtin();
        let first = tables.typos().next().expect("non-empty table");
        assert_eq!(first, ("gmial.com", "gmail.com"));
        assert_eq!(tables.correction_for("hotmial.com"), Some("hotmail.com"));
        assert_eq!(tables.correction_for("gmail.com"), None);
    }

    #[test]
    fn builtin_typo_keys_stay_clear_of_real_providers() {
        let tables = ReferenceTables::builtin();
        let real_providers = [
            "mail.com",
            "ymail.com",
            "gmx.com",
            "aol.com",
            "yahoo.fr",
            "yahoo.ca",
            "hotmail.de",
            "hotmail.ca",
            "outlook.fr",
            "icloud.fr",
            "zoho.com",
        ];
        for real in real_providers {
            for (typo, fix) in tables.typos() {
                assert!(
                    fix == real || crate::typo::edit_distance(real, typo) > 2,
                    "{typo} is within two edits of {real}"
                );
            }
        }
    }

    #[test]
    fn custom_tables_replace_builtin_data() {
        let tables = ReferenceTables::empty()
            .with_typos([("Exmaple.com", "example.com")])
            .with_disposable_domains(["burner.test"])
            .with_role_accounts(["ops"]);
        assert_eq!(tables.correction_for("exmaple.com"), Some("example.com"));
        assert!(tables.is_disposable("BURNER.test"));
        assert!(tables.is_role_account("OPS"));
        assert!(!tables.is_role_account("admin"));
    }
}
