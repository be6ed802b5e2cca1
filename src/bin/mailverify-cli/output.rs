#[cfg(feature = "with-serde")]
use anyhow::Context;
use anyhow::Result;

use mailverify::{Suggestion, SyntaxReport, VerificationResult};

use crate::args::{Cli, Format};

/// Une ligne du rapport, quelle que soit la sous-commande.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[cfg_attr(feature = "with-serde", serde(untagged))]
pub enum Row {
    Verify(Box<VerificationResult>),
    Syntax {
        email: String,
        #[cfg_attr(feature = "with-serde", serde(flatten))]
        report: SyntaxReport,
    },
    Suggest {
        email: String,
        suggestion: Option<Suggestion>,
    },
    Mx {
        domain: String,
        #[cfg_attr(feature = "with-serde", serde(rename = "mxRecords"))]
        records: Vec<String>,
        #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
        error: Option<String>,
    },
}

impl Row {
    /// Drives the exit code: any row that is not ok yields 2.
    pub fn is_ok(&self) -> bool {
        match self {
            Self::Verify(result) => result.is_valid(),
            Self::Syntax { report, .. } => report.valid,
            Self::Suggest { suggestion, .. } => suggestion.is_none(),
            Self::Mx { records, error, .. } => error.is_none() && !records.is_empty(),
        }
    }

    fn human(&self) -> String {
        match self {
            Self::Verify(result) => {
                let tag = if result.is_valid() { "[OK]     " } else { "[NOT OK] " };
                format!("{tag}{result}")
            }
            Self::Syntax { email, report } => match &report.error {
                None => format!("[OK]      {email}"),
                Some(error) => format!("[INVALID] {email} :: {error}"),
            },
            Self::Suggest { email, suggestion } => match suggestion {
                None => format!("[OK]      {email}"),
                Some(s) => format!(
                    "[TYPO]    {email} -> {} (distance {})",
                    s.suggested_email, s.edit_distance
                ),
            },
            Self::Mx {
                domain,
                records,
                error,
            } => match error {
                Some(error) => format!("[DNS ERR] {domain} :: {error}"),
                None if records.is_empty() => format!("[NO MX]   {domain}"),
                None => format!("[OK]      {domain} -> {}", records.join(", ")),
            },
        }
    }
}

pub fn write_reports(rows: &[Row], cli: &Cli) -> Result<()> {
    let payload = match cli.format {
        Format::Human => {
            let mut text = String::new();
            for row in rows {
                text.push_str(&row.human());
                text.push('\n');
            }
            text
        }
        Format::Json => json(rows)?,
        Format::Ndjson => ndjson(rows)?,
    };
    match &cli.out {
        Some(path) => write_all_atomically(path, payload.as_bytes()),
        None => {
            print!("{payload}");
            Ok(())
        }
    }
}

#[cfg(feature = "with-serde")]
fn json(rows: &[Row]) -> Result<String> {
    let mut s = serde_json::to_string_pretty(rows).context("serialize report")?;
    s.push('\n');
    Ok(s)
}

#[cfg(feature = "with-serde")]
fn ndjson(rows: &[Row]) -> Result<String> {
    let mut s = String::new();
    for row in rows {
        s.push_str(&serde_json::to_string(row).context("serialize report")?);
        s.push('\n');
    }
    Ok(s)
}

#[cfg(not(feature = "with-serde"))]
fn json(_: &[Row]) -> Result<String> {
    anyhow::bail!("format=json nécessite la feature 'with-serde'")
}

#[cfg(not(feature = "with-serde"))]
fn ndjson(_: &[Row]) -> Result<String> {
    anyhow::bail!("format=ndjson nécessite la feature 'with-serde'")
}

fn write_all_atomically(path: &str, bytes: &[u8]) -> Result<()> {
    use std::io::Write;
    let tmp = format!("{path}.tmp");
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}
