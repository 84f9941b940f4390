//! Delimiter sniffing and in-memory table loading.

use std::collections::{HashMap, HashSet};

use csv::ReaderBuilder;

use crate::error::InferenceError;

/// Delimiters tried by [`sniff_delimiter`], in preference order on ties.
pub const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b'|', b';'];

/// Lines of the sample considered when sniffing.
const SNIFF_LINES: usize = 50;

/// A parsed delimited file: header plus string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub delimiter: u8,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Values of one column, top to bottom. Short rows contribute nothing.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| row.get(index).map(String::as_str))
    }
}

/// Pick the delimiter that splits the sample most consistently.
///
/// A candidate qualifies when it yields at least two fields on the header
/// line; among those, the one whose most common field count covers the most
/// lines wins, then the one producing more fields. Falls back to `,`.
pub fn sniff_delimiter(sample: &str) -> u8 {
    let lines: Vec<&str> = sample
        .lines()
        .map(|l| l.trim_end_matches(['\r', '\n']))
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let Some(header) = lines.first() else {
        return b',';
    };

    let mut best: Option<(u8, usize, usize)> = None;
    for delim in CANDIDATE_DELIMITERS {
        let header_fields = count_fields(header, delim);
        if header_fields < 2 {
            continue;
        }

        let mut count_freq: HashMap<usize, usize> = HashMap::new();
        for line in &lines {
            *count_freq.entry(count_fields(line, delim)).or_insert(0) += 1;
        }
        let consistent = count_freq.get(&header_fields).copied().unwrap_or(0);

        let better = match best {
            None => true,
            Some((_, best_consistent, best_fields)) => {
                consistent > best_consistent
                    || (consistent == best_consistent && header_fields > best_fields)
            }
        };
        if better {
            best = Some((delim, consistent, header_fields));
        }
    }

    best.map(|(delim, _, _)| delim).unwrap_or(b',')
}

/// Count fields on one line, ignoring delimiters inside double quotes.
fn count_fields(line: &str, delim: u8) -> usize {
    if line.is_empty() {
        return 0;
    }
    let mut in_quotes = false;
    let mut count = 1;
    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delim && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Parse `bytes` as a delimited file whose first row is the header.
///
/// Rows must all have the header's width; a ragged file is reported as a
/// parse failure rather than padded.
pub fn read_table(bytes: &[u8], delimiter: Option<u8>) -> Result<Table, InferenceError> {
    let text = std::str::from_utf8(bytes).map_err(|_| InferenceError::Utf8)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err(InferenceError::Empty);
    }

    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(text));

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(InferenceError::NoColumns);
    }
    check_headers(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table {
        delimiter,
        headers,
        rows,
    })
}

/// Headers become field names, which must be non-empty and unique.
fn check_headers(headers: &[String]) -> Result<(), InferenceError> {
    let mut seen = HashSet::with_capacity(headers.len());
    for (column, name) in headers.iter().enumerate() {
        if name.is_empty() {
            return Err(InferenceError::BlankHeader { column });
        }
        if !seen.insert(name.as_str()) {
            return Err(InferenceError::DuplicateHeader { name: name.clone() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_comma() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3\n4,5,6\n"), b',');
    }

    #[test]
    fn test_sniff_semicolon_with_decimal_commas() {
        assert_eq!(sniff_delimiter("a;b\n1,5;2,5\n3,0;4,0\n"), b';');
    }

    #[test]
    fn test_sniff_tab_and_pipe() {
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a|b|c\n1|2|3\n"), b'|');
    }

    #[test]
    fn test_sniff_ignores_quoted_delimiters() {
        assert_eq!(sniff_delimiter("name;note\n\"x\";\"a, b, c\"\n"), b';');
    }

    #[test]
    fn test_sniff_single_column_defaults_to_comma() {
        assert_eq!(sniff_delimiter("only\n1\n2\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_read_table() {
        let table = read_table(b"a,b\n1,2.5\n3,4.5\n", None).unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.column(1).collect::<Vec<_>>(), vec!["2.5", "4.5"]);
    }

    #[test]
    fn test_read_table_strips_bom_and_honours_explicit_delimiter() {
        let table = read_table("\u{feff}a|b\n1|2\n".as_bytes(), Some(b'|')).unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.delimiter, b'|');
    }

    #[test]
    fn test_read_table_errors() {
        assert!(matches!(read_table(b"", None), Err(InferenceError::Empty)));
        assert!(matches!(read_table(b"  \n", None), Err(InferenceError::Empty)));
        assert!(matches!(read_table(&[0xff, 0xfe, 0x00], None), Err(InferenceError::Utf8)));
        assert!(matches!(
            read_table(b"a,b\n1,2,3\n", Some(b',')),
            Err(InferenceError::Csv(_))
        ));
    }

    #[test]
    fn test_read_table_rejects_bad_headers() {
        assert!(matches!(
            read_table(b"a,b,\n1,2,3\n", Some(b',')),
            Err(InferenceError::BlankHeader { column: 2 })
        ));
        match read_table(b"a,a\n1,2\n", Some(b',')) {
            Err(InferenceError::DuplicateHeader { name }) => assert_eq!(name, "a"),
            other => panic!("expected duplicate header, got {:?}", other.map(|t| t.headers)),
        }
        // Trimmed before comparison
        assert!(matches!(
            read_table(b"a, a \n1,2\n", Some(b',')),
            Err(InferenceError::DuplicateHeader { .. })
        ));
    }
}
