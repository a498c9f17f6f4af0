use thiserror::Error;

pub const DELIMITER: char = ',';
pub const QUOTE: char = '"';
pub const RECORD_TERMINATOR: &str = "\r\n";

#[derive(Debug, Eq, PartialEq, Error)]
pub enum CsvError {
    #[error("unterminated quoted field in record starting at line {line}")]
    UnterminatedQuote { line: usize },

    #[error("missing column in header: {0}")]
    MissingHeader(&'static str),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CsvRecord {
    /// 1-based line the record starts on.
    pub line: usize,
    pub fields: Vec<String>,
}

pub fn encode_record(fields: &[&str]) -> String {
    if let [only] = fields {
        if only.is_empty() {
            return format!("{QUOTE}{QUOTE}{RECORD_TERMINATOR}");
        }
    }

    let mut out = String::new();
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            out.push(DELIMITER);
        }
        push_field(&mut out, field);
    }
    out.push_str(RECORD_TERMINATOR);
    out
}

fn push_field(out: &mut String, field: &str) {
    if !needs_quotes(field) {
        out.push_str(field);
        return;
    }

    out.push(QUOTE);
    for ch in field.chars() {
        if ch == QUOTE {
            out.push(QUOTE);
        }
        out.push(ch);
    }
    out.push(QUOTE);
}

fn needs_quotes(field: &str) -> bool {
    field
        .chars()
        .any(|ch| ch == DELIMITER || ch == QUOTE || ch == '\r' || ch == '\n')
}

pub fn parse_records(text: &str) -> Result<Vec<CsvRecord>, CsvError> {
    let mut reader = RecordReader::default();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match reader.state {
            ReadState::FieldStart | ReadState::Unquoted => match ch {
                DELIMITER => reader.end_field(),
                '\r' | '\n' => {
                    if ch == '\r' && chars.peek() == Some(&'\n') {
                        let _ = chars.next();
                    }
                    reader.end_record();
                }
                QUOTE if reader.state == ReadState::FieldStart => {
                    reader.state = ReadState::Quoted;
                }
                _ => {
                    reader.field.push(ch);
                    reader.state = ReadState::Unquoted;
                }
            },
            ReadState::Quoted => {
                if ch == QUOTE {
                    reader.state = ReadState::QuoteInQuoted;
                } else {
                    if ch == '\n' {
                        reader.line += 1;
                    }
                    reader.field.push(ch);
                }
            }
            ReadState::QuoteInQuoted => match ch {
                QUOTE => {
                    reader.field.push(QUOTE);
                    reader.state = ReadState::Quoted;
                }
                DELIMITER => reader.end_field(),
                '\r' | '\n' => {
                    if ch == '\r' && chars.peek() == Some(&'\n') {
                        let _ = chars.next();
                    }
                    reader.end_record();
                }
                _ => {
                    reader.field.push(ch);
                    reader.state = ReadState::Unquoted;
                }
            },
        }
    }

    if reader.state == ReadState::Quoted {
        return Err(CsvError::UnterminatedQuote {
            line: reader.record_line,
        });
    }
    reader.end_record();
    Ok(reader.records)
}

pub fn column_indices<const N: usize>(
    header: &[String],
    names: [&'static str; N],
) -> Result<[usize; N], CsvError> {
    let mut indices = [0usize; N];
    for (slot, name) in indices.iter_mut().zip(names) {
        *slot = header
            .iter()
            .position(|column| column == name)
            .ok_or(CsvError::MissingHeader(name))?;
    }
    Ok(indices)
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum ReadState {
    #[default]
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

struct RecordReader {
    records: Vec<CsvRecord>,
    fields: Vec<String>,
    field: String,
    state: ReadState,
    line: usize,
    record_line: usize,
}

impl Default for RecordReader {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            fields: Vec::new(),
            field: String::new(),
            state: ReadState::FieldStart,
            line: 1,
            record_line: 1,
        }
    }
}

impl RecordReader {
    fn end_field(&mut self) {
        self.fields.push(std::mem::take(&mut self.field));
        self.state = ReadState::FieldStart;
    }

    fn end_record(&mut self) {
        let blank = self.state == ReadState::FieldStart
            && self.fields.is_empty()
            && self.field.is_empty();
        if !blank {
            self.end_field();
            self.records.push(CsvRecord {
                line: self.record_line,
                fields: std::mem::take(&mut self.fields),
            });
        }
        self.state = ReadState::FieldStart;
        self.line += 1;
        self.record_line = self.line;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(records: &[CsvRecord]) -> Vec<Vec<&str>> {
        records
            .iter()
            .map(|record| record.fields.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn encodes_plain_fields_with_crlf() {
        assert_eq!(
            encode_record(&["Subject", "Date", "Duration", "Notes"]),
            "Subject,Date,Duration,Notes\r\n"
        );
        assert_eq!(encode_record(&["Math", "2024-01-10", "30", ""]), "Math,2024-01-10,30,\r\n");
    }

    #[test]
    fn quotes_fields_with_delimiters_quotes_and_newlines() {
        assert_eq!(
            encode_record(&["a,b", "say \"hi\"", "line1\nline2"]),
            "\"a,b\",\"say \"\"hi\"\"\",\"line1\nline2\"\r\n"
        );
    }

    #[test]
    fn single_empty_field_is_quoted() {
        assert_eq!(encode_record(&[""]), "\"\"\r\n");
    }

    #[test]
    fn parses_crlf_and_lf_and_skips_blank_lines() {
        let records = parse_records("a,b\r\n\r\nc,d\n\ne,\n").expect("parse");
        assert_eq!(fields(&records), vec![vec!["a", "b"], vec!["c", "d"], vec!["e", ""]]);
        assert_eq!(
            records.iter().map(|r| r.line).collect::<Vec<_>>(),
            vec![1, 3, 5]
        );
    }

    #[test]
    fn parses_quoted_fields_spanning_lines() {
        let text = "\"a,b\",\"say \"\"hi\"\"\",\"line1\r\nline2\"\r\nnext,row\r\n";
        let records = parse_records(text).expect("parse");
        assert_eq!(
            fields(&records),
            vec![vec!["a,b", "say \"hi\"", "line1\r\nline2"], vec!["next", "row"]]
        );
        assert_eq!(records[1].line, 3);
    }

    #[test]
    fn last_record_without_terminator_is_kept() {
        let records = parse_records("a,b\r\nc,d").expect("parse");
        assert_eq!(fields(&records), vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn quoted_empty_record_is_not_blank() {
        let records = parse_records("\"\"\r\n").expect("parse");
        assert_eq!(fields(&records), vec![vec![""]]);
    }

    #[test]
    fn unterminated_quote_reports_record_line() {
        let error = parse_records("a,b\r\n\"open,c\r\nmore").expect_err("unterminated");
        assert_eq!(error, CsvError::UnterminatedQuote { line: 2 });
    }

    #[test]
    fn locates_columns_by_name() {
        let header = vec!["Notes".to_string(), "Subject".to_string()];
        assert_eq!(
            column_indices(&header, ["Subject", "Notes"]).expect("columns"),
            [1, 0]
        );
        assert_eq!(
            column_indices(&header, ["Date"]),
            Err(CsvError::MissingHeader("Date"))
        );
    }
}
