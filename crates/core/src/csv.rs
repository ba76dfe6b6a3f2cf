//! Minimal CSV helpers shared by the master-data loaders and the export.
//!
//! Master files are small, single-line-per-record tables, so quoted fields
//! spanning multiple lines are not supported.

/// UTF-8 byte order mark. Excel needs it to detect the encoding.
pub const UTF8_BOM: &str = "\u{feff}";

/// Quote a field if it contains a delimiter, quote or line break.
pub fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Join already-unescaped fields into one CSV line.
pub fn csv_row<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| csv_escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Split one CSV line into fields, honouring double-quoted fields.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == ',' {
            result.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    result.push(current);
    result
}

/// Split a whole document into rows of fields.
///
/// Strips a leading BOM and the trailing `\r` of CRLF files. Blank lines are
/// dropped.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    text.strip_prefix(UTF8_BOM)
        .unwrap_or(text)
        .lines()
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.trim().is_empty())
        .map(parse_csv_line)
        .collect()
}
