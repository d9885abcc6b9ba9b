//! Row layouts and the row parser
//!
//! Three tab-separated layouts are recognised. They share the first six
//! columns and differ only in where HEAD and DEPREL sit:
//!
//! | layout            | columns | HEAD | DEPREL |
//! |-------------------|---------|------|--------|
//! | `conll`           | 10      | 6    | 7      |
//! | `conll-maltparser`| 11      | 7    | 8      |
//! | `conll-propbank`  | 11      | 7    | 8      |
//!
//! The 11-column layouts carry an extra cluster/feature column at index 6.

use crate::error::GraphError;
use crate::node::TokenId;
use atoi::FromRadix10SignedChecked;
use memchr::memchr_iter;
use std::fmt;
use std::str::FromStr;

/// Column layout of the input rows, chosen once per parsing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    /// Plain CoNLL-X: ID FORM LEMMA CPOS POS FEATS HEAD DEPREL PHEAD PDEPREL
    Generic,
    /// MaltParser output with a cluster column before HEAD
    #[default]
    MaltParser,
    /// Semantic-role variant; same positions as `MaltParser` for the fields we read
    SemanticRole,
}

/// Fields of interest extracted from one row, identical for every layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFields {
    pub id: TokenId,
    pub token: String,
    pub lemma: String,
    pub pos: String,
    pub head_id: TokenId,
    pub deprel: String,
}

impl Layout {
    /// Number of tab-separated fields a row must have
    pub fn columns(self) -> usize {
        match self {
            Layout::Generic => 10,
            Layout::MaltParser | Layout::SemanticRole => 11,
        }
    }

    /// Column indices of (HEAD, DEPREL)
    fn head_columns(self) -> (usize, usize) {
        match self {
            Layout::Generic => (6, 7),
            Layout::MaltParser | Layout::SemanticRole => (7, 8),
        }
    }

    /// Parse one row
    ///
    /// Returns `Ok(None)` when the field count does not match the layout; such
    /// rows are dropped without error. A non-numeric ID or HEAD is an error.
    pub fn parse_row(self, line: &str) -> Result<Option<RowFields>, GraphError> {
        let line = line.trim();
        let fields = split_fields(line);

        if fields.len() != self.columns() {
            tracing::trace!(
                layout = %self,
                expected = self.columns(),
                found = fields.len(),
                "skipping row"
            );
            return Ok(None);
        }

        let (head_col, deprel_col) = self.head_columns();

        let id = parse_int(fields[0]).ok_or_else(|| GraphError::InvalidId(fields[0].to_string()))?;
        let head_id = parse_int(fields[head_col])
            .ok_or_else(|| GraphError::InvalidHead(fields[head_col].to_string()))?;

        Ok(Some(RowFields {
            id,
            token: fields[1].to_string(),
            lemma: fields[2].to_string(),
            // Coarse POS; the fine-grained column 4 is not used
            pos: fields[3].to_string(),
            head_id,
            deprel: fields[deprel_col].to_string(),
        }))
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layout::Generic => "conll",
            Layout::MaltParser => "conll-maltparser",
            Layout::SemanticRole => "conll-propbank",
        };
        f.write_str(name)
    }
}

impl FromStr for Layout {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "conll" | "generic" => Ok(Layout::Generic),
            "conll-maltparser" | "maltparser" => Ok(Layout::MaltParser),
            "conll-propbank" | "propbank" | "semantic-role" => Ok(Layout::SemanticRole),
            _ => Err(GraphError::UnknownLayout(s.to_string())),
        }
    }
}

/// Split a row on tabs
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::with_capacity(11);
    let mut start = 0;
    for pos in memchr_iter(b'\t', line.as_bytes()) {
        fields.push(&line[start..pos]);
        start = pos + 1;
    }
    fields.push(&line[start..]);
    fields
}

/// Parse a signed integer column, rejecting trailing garbage
fn parse_int(field: &str) -> Option<TokenId> {
    let bytes = field.trim().as_bytes();
    if !bytes.iter().any(u8::is_ascii_digit) {
        return None;
    }
    match TokenId::from_radix_10_signed_checked(bytes) {
        (Some(n), used) if used == bytes.len() => Some(n),
        _ => None,
    }
}
