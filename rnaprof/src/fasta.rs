//! FASTA-like sequence input.

use super::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One named sequence record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// Text after the `>` of the header line.
    pub name: String,
    /// Concatenated sequence lines, trailing whitespace trimmed.
    pub seq: String,
}

/// Reads every record of the file at `path`.
pub fn read_path(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    read(BufReader::new(File::open(path)?))
}

/// Reads every record from `reader`. Lines beginning with `>` open a new
/// record; non-empty lines below it are concatenated as its sequence.
pub fn read(reader: impl BufRead) -> Result<Vec<Record>> {
    let mut records: Vec<Record> = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(name) = line.strip_prefix('>') {
            records.push(Record {
                name: name.to_owned(),
                seq: String::new(),
            });
        } else {
            let record = records.last_mut().ok_or_else(|| {
                Error::MalformedInput("sequence data before the first '>' header".to_owned())
            })?;
            record.seq.push_str(line);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn records_are_split_on_headers() {
        let input = ">first\nGGGAAA\nCCC\n\n>second desc\nAAAA\n";
        let records = read(Cursor::new(input)).unwrap();
        assert_eq!(
            records,
            vec![
                Record {
                    name: "first".to_owned(),
                    seq: "GGGAAACCC".to_owned(),
                },
                Record {
                    name: "second desc".to_owned(),
                    seq: "AAAA".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn trailing_whitespace_is_trimmed() {
        let records = read(Cursor::new(">r\r\nGGG \r\nAAA\t\r\n")).unwrap();
        assert_eq!(records[0].seq, "GGGAAA");
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(read(Cursor::new("")).unwrap().is_empty());
        assert!(read(Cursor::new("\n\n")).unwrap().is_empty());
    }

    #[test]
    fn headerless_data_is_rejected() {
        let err = read(Cursor::new("GGGAAACCC\n")).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }
}
