use std::fmt;
use std::path::PathBuf;

use regex::Regex;
use thiserror::Error;

/// Location-aware description of a malformed input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub field: Option<String>,
    pub reason: String,
}

impl Diagnostic {
    /// Builds a diagnostic from a TOML deserialization failure.
    pub fn from_toml(path: PathBuf, source: &str, err: &toml::de::Error) -> Self {
        let (line, column) = match err.span() {
            Some(span) => {
                let (l, c) = line_col(source, span.start);
                (Some(l), Some(c))
            }
            None => (None, None),
        };
        let reason = err.message().trim().to_string();
        Diagnostic {
            path,
            line,
            column,
            field: field_from_message(&reason),
            reason,
        }
    }

    /// Points at the first line assigning `key`, if any.
    pub fn at_key(path: PathBuf, source: &str, key: &str, reason: String) -> Self {
        let line = source
            .lines()
            .position(|l| {
                l.trim_start()
                    .strip_prefix(key)
                    .map(|rest| rest.trim_start().starts_with('='))
                    .unwrap_or(false)
            })
            .map(|i| i + 1);
        Diagnostic {
            path,
            line,
            column: line.map(|_| 1),
            field: Some(key.to_string()),
            reason,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
            if let Some(col) = self.column {
                write!(f, ":{}", col)?;
            }
        }
        if let Some(field) = &self.field {
            write!(f, ": field `{}`", field)?;
        }
        write!(f, ": {}", self.reason)
    }
}

fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map(|i| offset - i).unwrap_or(offset + 1);
    (line, column)
}

fn field_from_message(message: &str) -> Option<String> {
    let re = Regex::new(r"(?:missing|unknown) field `([^`]+)`").ok()?;
    re.captures(message).map(|c| c[1].to_string())
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Parse(Diagnostic),
    #[error("{0}")]
    UnsupportedVersion(Diagnostic),
    #[error("{} is neither a *.settings.toml nor a *.schema.toml document", .0.display())]
    UnrecognizedDocument(PathBuf),
    #[error("expected exactly one settings document, found {found}")]
    Settings { found: usize },
    #[error("duplicate {kind} definition for {name}")]
    DuplicateDefinition { kind: &'static str, name: String },
    #[error("schema is invalid:\n{}", .0.join("\n"))]
    InvalidSchema(Vec<String>),
    #[error("field {field} of {owner} ({kind}) has no type mapping")]
    UnmappedField {
        owner: String,
        field: String,
        kind: String,
    },
    #[error("artifact {artifact} has no namespace")]
    MissingNamespace { artifact: String },
    #[error("artifact in namespace {namespace} has no name")]
    MissingName { namespace: String },
    #[error("artifact {0} was generated twice in one pass")]
    DuplicateArtifact(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_from_one() {
        assert_eq!(line_col("a = 1\nbb = 2\n", 6), (2, 1));
        assert_eq!(line_col("a = 1\nbb = 2\n", 9), (2, 4));
        assert_eq!(line_col("abc", 0), (1, 1));
    }

    #[test]
    fn field_name_is_extracted() {
        assert_eq!(
            field_from_message("missing field `name`"),
            Some("name".to_string())
        );
        assert_eq!(
            field_from_message("unknown field `colour`, expected one of `name`"),
            Some("colour".to_string())
        );
        assert_eq!(field_from_message("invalid type: string"), None);
    }
}
