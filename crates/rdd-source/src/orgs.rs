//! # Organization Directory
//!
//! A cached line-delimited JSON lookup table mapping normalized firm name
//! to firm CRD. Loaded once per process; queried by exact normalized-name
//! match only — fuzzy firm matching is deliberately out, an unresolved
//! firm name is a terminal search outcome, not a guess.

use std::collections::HashMap;
use std::io::BufRead;

use serde_json::Value;

use rdd_core::{NormalizationError, OrgCrd};
use rdd_match::normalize_name;

/// The in-memory firm-name → CRD table.
#[derive(Debug, Default)]
pub struct OrgDirectory {
    by_name: HashMap<String, OrgCrd>,
}

impl OrgDirectory {
    /// An empty directory (claims with firm names will not resolve).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the directory from NDJSON lines of
    /// `{"org_name": ..., "org_crd": ...}`.
    ///
    /// Unreadable lines are skipped with a warning; a table where nothing
    /// at all parsed is reported as malformed.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, NormalizationError> {
        let mut by_name = HashMap::new();
        let mut saw_line = false;
        for (line_no, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    return Err(NormalizationError::OrgDirectory {
                        reason: format!("read failed at line {}: {err}", line_no + 1),
                    });
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            saw_line = true;
            match parse_line(&line) {
                Some((name, crd)) => {
                    by_name.insert(name, crd);
                }
                None => {
                    tracing::warn!(line_no = line_no + 1, "skipping unreadable org directory line");
                }
            }
        }
        if saw_line && by_name.is_empty() {
            return Err(NormalizationError::OrgDirectory {
                reason: "table contained lines but none parsed".into(),
            });
        }
        Ok(Self { by_name })
    }

    /// Exact lookup by normalized firm name.
    pub fn resolve(&self, org_name: &str) -> Option<&OrgCrd> {
        let key = normalize_name(org_name);
        if key.is_empty() {
            return None;
        }
        self.by_name.get(&key)
    }

    /// Number of firms in the table.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn parse_line(line: &str) -> Option<(String, OrgCrd)> {
    let value: Value = serde_json::from_str(line).ok()?;
    let name = value.get("org_name").and_then(Value::as_str)?;
    let key = normalize_name(name);
    if key.is_empty() {
        return None;
    }
    let crd_raw = match value.get("org_crd")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let crd = OrgCrd::new(&crd_raw).ok()?;
    Some((key, crd))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{"org_name": "Example Securities, LLC", "org_crd": "282563"}
{"org_name": "Acme Advisers Inc", "org_crd": 10345}
not json at all
{"org_name": "Broken Row"}"#;

    #[test]
    fn resolves_by_normalized_exact_match() {
        let dir = OrgDirectory::from_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(
            dir.resolve("example securities llc").map(|c| c.as_str()),
            Some("282563")
        );
        assert_eq!(
            dir.resolve("EXAMPLE  SECURITIES, LLC").map(|c| c.as_str()),
            Some("282563")
        );
        assert_eq!(dir.resolve("Acme Advisers Inc").map(|c| c.as_str()), Some("10345"));
    }

    #[test]
    fn unknown_and_empty_names_do_not_resolve() {
        let dir = OrgDirectory::from_reader(TABLE.as_bytes()).unwrap();
        assert!(dir.resolve("Example Partners").is_none());
        assert!(dir.resolve("   ").is_none());
    }

    #[test]
    fn table_with_no_parseable_lines_is_malformed() {
        let err = OrgDirectory::from_reader("garbage\nmore garbage\n".as_bytes()).unwrap_err();
        assert!(matches!(err, NormalizationError::OrgDirectory { .. }));
    }

    #[test]
    fn empty_input_yields_empty_directory() {
        let dir = OrgDirectory::from_reader("".as_bytes()).unwrap();
        assert!(dir.is_empty());
    }
}
