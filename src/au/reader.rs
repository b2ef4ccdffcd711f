//! Line-delimited transaction input.
//!
//! Two layouts are accepted, one transaction per line:
//!
//! * pairs: `3:5 7:1 12:4` (item:utility)
//! * SPMF utility format: `3 7 12:10:5 1 4` (items:transaction utility:utilities)
//!
//! Blank lines and lines starting with `#`, `%` or `@` are skipped.

use std::io::BufRead;
use thiserror::Error;

use super::Item;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Parse one line; `Ok(None)` for lines that carry no transaction.
pub fn parse_line(line: &str) -> Result<Option<Vec<(Item, i64)>>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(&['#', '%', '@'][..]) {
        return Ok(None);
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.iter().all(|token| token.matches(':').count() == 1) {
        return tokens.iter().map(|token| parse_pair(token)).collect::<Result<_, _>>().map(Some);
    }

    parse_spmf(line).map(Some)
}

fn parse_pair(token: &str) -> Result<(Item, i64), String> {
    let (item, utility) = token
        .split_once(':')
        .ok_or_else(|| format!("expected item:utility, found {token:?}"))?;
    Ok((parse_item(item)?, parse_utility(utility)?))
}

fn parse_spmf(line: &str) -> Result<Vec<(Item, i64)>, String> {
    let sections: Vec<&str> = line.split(':').collect();
    if sections.len() != 3 {
        return Err(format!("expected items:total:utilities, found {} sections", sections.len()));
    }

    let items = sections[0]
        .split_whitespace()
        .map(parse_item)
        .collect::<Result<Vec<_>, _>>()?;
    let utilities = sections[2]
        .split_whitespace()
        .map(parse_utility)
        .collect::<Result<Vec<_>, _>>()?;

    if items.len() != utilities.len() {
        return Err(format!(
            "{} items but {} utilities",
            items.len(),
            utilities.len()
        ));
    }

    Ok(items.into_iter().zip(utilities).collect())
}

fn parse_item(text: &str) -> Result<Item, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("invalid item {text:?}"))
}

fn parse_utility(text: &str) -> Result<i64, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("invalid utility {text:?}"))
}

/// Yields transactions one at a time in file order.
#[derive(Debug)]
pub struct TransactionReader<R> {
    reader: R,
    line: usize,
    buffer: String,
}

impl<R: BufRead> TransactionReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for TransactionReader<R> {
    type Item = Result<Vec<(Item, i64)>, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(e) => return Some(Err(e.into())),
            }

            match parse_line(&self.buffer) {
                Ok(Some(transaction)) => return Some(Ok(transaction)),
                Ok(None) => continue,
                Err(message) => {
                    return Some(Err(ReaderError::Parse {
                        line: self.line,
                        message,
                    }))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_pair_lines() {
        assert_eq!(parse_line("1:3 2:1").unwrap(), Some(vec![(1, 3), (2, 1)]));
        assert_eq!(parse_line("  7:12 ").unwrap(), Some(vec![(7, 12)]));
    }

    #[test]
    fn parses_spmf_lines() {
        assert_eq!(
            parse_line("1 2 3:9:4 3 2").unwrap(),
            Some(vec![(1, 4), (2, 3), (3, 2)])
        );
        assert_eq!(parse_line("5:4:4").unwrap(), Some(vec![(5, 4)]));
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("# header").unwrap(), None);
        assert_eq!(parse_line("@CONVERTED_FROM_TEXT").unwrap(), None);
    }

    #[test]
    fn reports_malformed_lines() {
        assert!(parse_line("a:3").is_err());
        assert!(parse_line("1 2:5:3").is_err());
        assert!(parse_line("1:x").is_err());
    }

    #[test]
    fn reader_tracks_line_numbers() {
        let input = "1:3 2:1\n\n% note\n1:x\n";
        let mut reader = TransactionReader::new(Cursor::new(input));

        assert_eq!(reader.next().unwrap().unwrap(), vec![(1, 3), (2, 1)]);
        match reader.next().unwrap() {
            Err(ReaderError::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("unexpected {other:?}"),
        }
        assert!(reader.next().is_none());
    }
}
