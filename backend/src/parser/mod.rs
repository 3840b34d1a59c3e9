//! Delimited-text codec with encoding and delimiter auto-detection.
//!
//! Reading turns bytes into a header plus [`RawRecord`]s; writing turns
//! [`Record`]s back into CSV bytes. No cleaning happens here.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{RawRecord, Record};

/// Candidate delimiters, in tie-break order.
const DELIMITERS: [char; 4] = [';', ',', '\t', '|'];

/// Used when the header line contains none of [`DELIMITERS`].
const DEFAULT_DELIMITER: char = ',';

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Header names as written in the source
    pub headers: Vec<String>,
    /// Data rows in source order
    pub records: Vec<RawRecord>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding.
///
/// Strict for UTF-8: invalid sequences are an error rather than replacement
/// characters, so a mis-detected file is surfaced instead of silently
/// mangled. A leading byte-order mark is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let text = match encoding.to_lowercase().as_str() {
        // WHATWG maps the latin-1 labels onto windows-1252
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "utf-8" | "utf8" | "ascii" => {
            String::from_utf8(bytes.to_vec()).map_err(|e| CsvError::Encoding {
                encoding: encoding.to_string(),
                message: e.to_string(),
            })?
        }
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.into_owned(),
            None => String::from_utf8(bytes.to_vec()).map_err(|e| CsvError::Encoding {
                encoding: other.to_string(),
                message: e.to_string(),
            })?,
        },
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Detect the delimiter by counting occurrences in the header line.
///
/// Leading blank lines are skipped, as the reader skips them too.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    let mut best_sep = DEFAULT_DELIMITER;
    let mut best_count = 0;

    for &sep in &DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV from a reader with an explicit delimiter.
///
/// The first non-blank line is the header. Rows shorter than the header get
/// `None` for the fields they do not reach; rows longer than the header are
/// rejected. Input without any non-blank line yields no headers and no rows.
pub fn parse_csv<R: Read>(reader: R, delimiter: char) -> CsvResult<(Vec<String>, Vec<RawRecord>)> {
    let delimiter = u8::try_from(delimiter).map_err(|_| CsvError::InvalidDelimiter(delimiter))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = reader.records();

    let headers: Vec<String> = match rows.next() {
        Some(header) => header?.iter().map(String::from).collect(),
        None => return Ok((Vec::new(), Vec::new())),
    };
    check_headers(&headers)?;

    let mut records = Vec::new();
    for row in rows {
        let row = row?;
        if row.len() > headers.len() {
            return Err(CsvError::RaggedRow {
                line: row.position().map(|p| p.line()).unwrap_or(0),
                expected: headers.len(),
                found: row.len(),
            });
        }

        let mut record = RawRecord::new();
        for (i, header) in headers.iter().enumerate() {
            record.push(header.clone(), row.get(i).map(String::from));
        }
        records.push(record);
    }

    Ok((headers, records))
}

/// Header names must be non-blank as a set and unique once trimmed.
fn check_headers(headers: &[String]) -> CsvResult<()> {
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut seen = HashSet::new();
    for header in headers {
        let name = header.trim();
        if !seen.insert(name) {
            return Err(CsvError::DuplicateHeader(name.to_string()));
        }
    }
    Ok(())
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
///
/// Valid UTF-8 is always read as UTF-8; detection only runs on bytes that
/// are not, since chardet mislabels short UTF-8 samples.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let (content, encoding) = match std::str::from_utf8(bytes) {
        Ok(text) => (
            text.strip_prefix('\u{feff}').unwrap_or(text).to_string(),
            "utf-8".to_string(),
        ),
        Err(_) => {
            let encoding = detect_encoding(bytes);
            (decode_content(bytes, &encoding)?, encoding)
        }
    };
    let delimiter = detect_delimiter(&content);

    let (headers, records) = parse_csv(content.as_bytes(), delimiter)?;

    Ok(ParseResult {
        headers,
        records,
        encoding,
        delimiter,
    })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Serialize records under a header row.
///
/// Comma-delimited, `\n`-terminated, quoting only where a value needs it.
/// Every record must carry exactly the header's fields in header order.
pub fn write_csv(headers: &[String], records: &[Record]) -> CsvResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let write_err = |e: csv::Error| CsvError::Write(e.to_string());

    writer.write_record(headers).map_err(write_err)?;

    for (i, record) in records.iter().enumerate() {
        if !record.field_names().eq(headers.iter().map(String::as_str)) {
            return Err(CsvError::Write(format!(
                "record {} does not match the header fields",
                i + 1
            )));
        }
        writer.write_record(record.values()).map_err(write_err)?;
    }

    writer
        .into_inner()
        .map_err(|e| CsvError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::normalize_record;

    fn parse(csv: &str, delimiter: char) -> (Vec<String>, Vec<RawRecord>) {
        parse_csv(csv.as_bytes(), delimiter).unwrap()
    }

    #[test]
    fn test_simple_csv() {
        let (headers, rows) = parse("name,age\nAlice,30\nBob,25", ',');

        assert_eq!(headers, vec!["name", "age"]);
        assert_eq!(rows.len(), 2);
        let first: Vec<_> = rows[0].iter().collect();
        assert_eq!(first, vec![("name", Some("Alice")), ("age", Some("30"))]);
    }

    #[test]
    fn test_quoted_values_keep_delimiters() {
        let (_, rows) = parse("name,note\n\"Smith, J\",\"said \"\"hi\"\"\"", ',');
        let row: Vec<_> = rows[0].iter().collect();
        assert_eq!(row[0], ("name", Some("Smith, J")));
        assert_eq!(row[1], ("note", Some("said \"hi\"")));
    }

    #[test]
    fn test_whitespace_is_preserved_for_normalizer() {
        let (headers, rows) = parse(" name ,age\n Carl , 40 ", ',');
        assert_eq!(headers[0], " name ");
        let row: Vec<_> = rows[0].iter().collect();
        assert_eq!(row[0], (" name ", Some(" Carl ")));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let (_, rows) = parse("a,b\n1,2\n\n3,4\n", ',');
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_short_row_yields_missing_values() {
        let (_, rows) = parse("a,b,c\n1,2", ',');
        let row: Vec<_> = rows[0].iter().collect();
        assert_eq!(row, vec![("a", Some("1")), ("b", Some("2")), ("c", None)]);
    }

    #[test]
    fn test_long_row_is_rejected() {
        let err = parse_csv("a,b\n1,2,3".as_bytes(), ',').unwrap_err();
        assert!(matches!(
            err,
            CsvError::RaggedRow { line: 2, expected: 2, found: 3 }
        ));
    }

    #[test]
    fn test_duplicate_trimmed_header_is_rejected() {
        let err = parse_csv("a, a\n1,2".as_bytes(), ',').unwrap_err();
        assert!(matches!(err, CsvError::DuplicateHeader(ref h) if h == "a"));
    }

    #[test]
    fn test_empty_input_has_no_headers_or_rows() {
        let (headers, rows) = parse("", ',');
        assert!(headers.is_empty());
        assert!(rows.is_empty());

        for input in [&b""[..], b"\n\n", b"\r\n"] {
            let result = parse_bytes_auto(input).unwrap();
            assert!(result.headers.is_empty());
            assert!(result.records.is_empty());
        }
    }

    #[test]
    fn test_blank_header_is_rejected() {
        assert!(matches!(parse_csv(" , \n1,2".as_bytes(), ','), Err(CsvError::NoHeaders)));
    }

    #[test]
    fn test_short_utf8_is_not_redetected() {
        let result = parse_bytes_auto("nom\nCafé\n".as_bytes()).unwrap();
        assert_eq!(result.encoding, "utf-8");
        let row: Vec<_> = result.records[0].iter().collect();
        assert_eq!(row, vec![("nom", Some("Café"))]);

        let cleaned = crate::transform::clean_bytes("nom\nCafé\n".as_bytes()).unwrap();
        assert_eq!(String::from_utf8(cleaned.to_csv().unwrap()).unwrap(), "nom\nCafé\n");
    }

    #[test]
    fn test_non_utf8_falls_back_to_detection() {
        // "Société" in ISO-8859-1
        let result = parse_bytes_auto(b"soci\xE9t\xE9,ville\nSoci\xE9t\xE9 G\xE9n\xE9rale,Paris\n").unwrap();
        assert_ne!(result.encoding, "utf-8");
        assert_eq!(result.headers.len(), 2);
        assert_eq!(result.headers[1], "ville");
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_header_only() {
        let (headers, rows) = parse("a,b\n", ',');
        assert_eq!(headers.len(), 2);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_detect_delimiter_skips_leading_blank_lines() {
        assert_eq!(detect_delimiter("\n\na;b\n1;2"), ';');
        let result = parse_bytes_auto(b"\nname;age\nAlice;30\n").unwrap();
        assert_eq!(result.delimiter, ';');
        assert_eq!(result.headers, vec!["name", "age"]);
    }

    #[test]
    fn test_detect_delimiter_single_column_defaults_to_comma() {
        assert_eq!(detect_delimiter("name\nAlice"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(b"name;age\nAlice;30\nBob;25").unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.headers, vec!["name", "age"]);
    }

    #[test]
    fn test_bom_is_stripped() {
        let result = parse_bytes_auto(b"\xEF\xBB\xBFname,age\nAlice,30").unwrap();
        assert_eq!(result.headers, vec!["name", "age"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let err = decode_content(&[0x66, 0xFF, 0xFE], "utf-8").unwrap_err();
        assert!(matches!(err, CsvError::Encoding { .. }));
    }

    #[test]
    fn test_write_csv_quotes_when_needed() {
        let raw = RawRecord::new()
            .with("name", Some("Smith, J"))
            .with("age", Some("40"));
        let record = normalize_record(&raw).unwrap();
        let headers = vec!["name".to_string(), "age".to_string()];

        let bytes = write_csv(&headers, &[record]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "name,age\n\"Smith, J\",40\n");
    }

    #[test]
    fn test_write_csv_rejects_mismatched_record() {
        let record = normalize_record(&RawRecord::new().with("x", Some("1"))).unwrap();
        let headers = vec!["y".to_string()];
        assert!(matches!(write_csv(&headers, &[record]), Err(CsvError::Write(_))));
    }
}
