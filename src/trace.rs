//! Trace input: valgrind-style access records and lazy line parsing.

use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use crate::error::Error;

/// Kind of memory operation a trace line describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    /// Instruction fetch; skipped by the replay entirely.
    Instruction,
    Load,
    Store,
    /// A read followed by a write to the same address.
    Modify,
}

impl AccessKind {
    /// Number of memory references this operation implies.
    pub fn references(self) -> usize {
        match self {
            AccessKind::Instruction => 0,
            AccessKind::Load | AccessKind::Store => 1,
            AccessKind::Modify => 2,
        }
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Instruction => write!(f, "I"),
            AccessKind::Load => write!(f, "L"),
            AccessKind::Store => write!(f, "S"),
            AccessKind::Modify => write!(f, "M"),
        }
    }
}

/// One parsed trace entry of the form `<op> <hex-address>,<size>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessRecord {
    pub kind: AccessKind,
    pub address: u64,
    pub size: u64,
}

impl FromStr for AccessRecord {
    type Err = String;

    /// Parses one trace line. Leading whitespace before the operation is
    /// insignificant (valgrind indents data references but not instruction
    /// fetches). Anything else that deviates from the expected shape is
    /// rejected rather than skipped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start();
        let (op, rest) = s
            .split_once(' ')
            .ok_or_else(|| format!("expected `<op> <hex-address>,<size>`, got {:?}", s))?;
        let kind = match op {
            "I" => AccessKind::Instruction,
            "L" => AccessKind::Load,
            "S" => AccessKind::Store,
            "M" => AccessKind::Modify,
            other => return Err(format!("unknown operation {:?}", other)),
        };
        let (address, size) = rest
            .trim_start()
            .split_once(',')
            .ok_or_else(|| format!("missing `,` between address and size in {:?}", rest))?;
        let address = u64::from_str_radix(address, 16)
            .map_err(|err| format!("bad hex address {:?}: {}", address, err))?;
        let size = size
            .trim()
            .parse::<u64>()
            .map_err(|err| format!("bad access size {:?}: {}", size, err))?;
        Ok(Self { kind, address, size })
    }
}

/// Lazily parses trace records from any buffered line source.
///
/// Yields one record per line, tagging parse failures with their 1-based
/// line number. The source is consumed exactly once and is not restartable.
pub struct TraceReader<R> {
    source: R,
    buf: String,
    line_no: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            buf: String::new(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<AccessRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.source.read_line(&mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_no += 1;
                let record = self.buf.trim_end().parse().map_err(|reason| Error::Parse {
                    line: self.line_no,
                    reason,
                });
                Some(record)
            }
            Err(err) => Some(Err(Error::Io(err))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(line: &str) -> AccessRecord {
        line.parse().unwrap()
    }

    #[test]
    fn record_parses_each_kind() {
        assert_eq!(
            parse("I 0400d7d4,8"),
            AccessRecord { kind: AccessKind::Instruction, address: 0x0400d7d4, size: 8 }
        );
        assert_eq!(
            parse(" L 10,1"),
            AccessRecord { kind: AccessKind::Load, address: 0x10, size: 1 }
        );
        assert_eq!(
            parse(" S 7ff0005c8,4"),
            AccessRecord { kind: AccessKind::Store, address: 0x7ff0005c8, size: 4 }
        );
        assert_eq!(
            parse(" M 21c0,2"),
            AccessRecord { kind: AccessKind::Modify, address: 0x21c0, size: 2 }
        );
    }

    #[test]
    fn record_parses_lowercase_hex_address() {
        assert_eq!(parse(" L deadbeef,4").address, 0xdeadbeef);
    }

    #[test]
    fn record_rejects_unknown_operation() {
        let err = " X 10,1".parse::<AccessRecord>().unwrap_err();
        assert!(err.contains("unknown operation"));
    }

    #[test]
    fn record_rejects_missing_size() {
        let err = " L 10".parse::<AccessRecord>().unwrap_err();
        assert!(err.contains("missing `,`"));
    }

    #[test]
    fn record_rejects_bad_hex() {
        let err = " L zz,1".parse::<AccessRecord>().unwrap_err();
        assert!(err.contains("bad hex address"));
    }

    #[test]
    fn record_rejects_bad_size() {
        let err = " L 10,x".parse::<AccessRecord>().unwrap_err();
        assert!(err.contains("bad access size"));
    }

    #[test]
    fn record_rejects_empty_line() {
        assert!("".parse::<AccessRecord>().is_err());
        assert!("   ".parse::<AccessRecord>().is_err());
    }

    #[test]
    fn kind_reference_counts() {
        assert_eq!(AccessKind::Instruction.references(), 0);
        assert_eq!(AccessKind::Load.references(), 1);
        assert_eq!(AccessKind::Store.references(), 1);
        assert_eq!(AccessKind::Modify.references(), 2);
    }

    #[test]
    fn reader_yields_records_in_order() {
        let input = "I 100,2\n L 10,1\n M 20,4\n";
        let records: Vec<AccessRecord> = TraceReader::new(Cursor::new(input))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].kind, AccessKind::Instruction);
        assert_eq!(records[1].kind, AccessKind::Load);
        assert_eq!(records[2].kind, AccessKind::Modify);
    }

    #[test]
    fn reader_handles_missing_final_newline() {
        let records: Vec<AccessRecord> = TraceReader::new(Cursor::new(" L 10,1"))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn reader_reports_line_number_of_malformed_record() {
        let input = " L 10,1\nbogus line\n";
        let mut reader = TraceReader::new(Cursor::new(input));
        assert!(reader.next().unwrap().is_ok());
        match reader.next().unwrap() {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
