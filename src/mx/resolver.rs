use std::collections::HashSet;

use trust_dns_resolver::{Resolver, error::ResolveErrorKind};
use tracing::debug;

use super::{MxError, MxRecord, MxStatus};
use crate::LOG_TARGET;

/// Lookup MX records for `domain` using the system resolver.
///
/// The domain is normalized via IDNA before querying DNS. Host names come
/// back in ascending preference order; an empty list means the domain has
/// no usable MX records (none at all, or only a null MX), which is not an
/// error.
pub fn resolve_mx(domain: &str) -> Result<Vec<String>, MxError> {
    resolve_mx_with(&SystemResolver, domain)
}

/// Same as [`resolve_mx`] with a caller-provided resolver.
pub fn resolve_mx_with<R>(resolver: &R, domain: &str) -> Result<Vec<String>, MxError>
where
    R: LookupMx + ?Sized,
{
    let ascii = normalize_domain(domain)?;
    let status = resolve_with(resolver, &ascii)?;
    Ok(status.exchanges())
}

pub(crate) fn resolve_with<R>(resolver: &R, ascii_domain: &str) -> Result<MxStatus, MxError>
where
    R: LookupMx + ?Sized,
{
    let mut records = resolver.lookup_mx(ascii_domain)?;

    // RFC 7505 null MX ("0 .") declares that the domain accepts no mail
    records.retain(|record| !normalize_exchange(record.exchange.clone()).is_empty());
    records.sort();
    let mut seen = HashSet::new();
    records.retain(|record| seen.insert(record.exchange.to_ascii_lowercase()));
    debug!(target: LOG_TARGET, domain = ascii_domain, count = records.len(), "MX lookup done");

    if records.is_empty() {
        Ok(MxStatus::NoRecords)
    } else {
        Ok(MxStatus::Records(records))
    }
}

pub(crate) fn normalize_domain(domain: &str) -> Result<String, MxError> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(MxError::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(MxError::idna)
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    let trimmed = exchange.trim_end_matches('.');
    trimmed.to_ascii_lowercase()
}

/// Capability to fetch the MX records of an ASCII domain. Records may come
/// back in any order.
pub trait LookupMx {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, MxError>;
}

/// [`LookupMx`] backed by the operating system's DNS configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl LookupMx for SystemResolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, MxError> {
        let resolver = Resolver::from_system_conf().map_err(MxError::resolver_init)?;
        resolver.lookup_mx(domain)
    }
}

impl LookupMx for Resolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, MxError> {
        let lookup = match Resolver::mx_lookup(self, domain) {
            Ok(lookup) => lookup,
            Err(err) => {
                if matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. }) {
                    return Ok(Vec::new());
                }
                return Err(MxError::lookup(err));
            }
        };
        let mut records = Vec::new();
        for mx in lookup.iter() {
            let exchange = normalize_exchange(mx.exchange().to_utf8());
            records.push(MxRecord::new(mx.preference(), exchange));
        }
        Ok(records)
    }
}
