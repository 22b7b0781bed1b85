use crate::config::READ_BUFFER_SIZE;
use crate::error::{LineResult, SkipReason};
use anyhow::{Context, Result};
use bzip2::read::MultiBzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// One raw line of a dump, without its line terminator.
#[derive(Debug, Clone)]
pub struct DumpLine {
    pub number: u64,
    pub bytes: Vec<u8>,
}

impl DumpLine {
    /// The JSON document embedded in this line: everything from the first `{` on.
    pub fn payload(&self) -> LineResult<&str> {
        json_payload(&self.bytes)
    }
}

/// Finds the first `{` and returns the rest of the line as text.
pub fn json_payload(line: &[u8]) -> LineResult<&str> {
    let start = memchr::memchr(b'{', line).ok_or(SkipReason::NoJsonPayload)?;
    std::str::from_utf8(&line[start..]).map_err(|_| SkipReason::InvalidUtf8)
}

/// Lazy, single-pass reader over a line-delimited dump. `.bz2` files are
/// decompressed on the fly.
pub struct DumpReader {
    reader: Box<dyn BufRead>,
    path: PathBuf,
    line_number: u64,
    done: bool,
}

impl DumpReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open dump file: {}", path.display()))?;

        let reader: Box<dyn BufRead> = if is_bz2(path) {
            Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                MultiBzDecoder::new(file),
            ))
        } else {
            Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file))
        };

        Ok(Self {
            reader,
            path: path.to_path_buf(),
            line_number: 0,
            done: false,
        })
    }
}

fn is_bz2(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("bz2"))
}

impl Iterator for DumpReader {
    type Item = Result<DumpLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut bytes = Vec::new();
        match self.reader.read_until(b'\n', &mut bytes) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                if bytes.last() == Some(&b'\n') {
                    bytes.pop();
                    if bytes.last() == Some(&b'\r') {
                        bytes.pop();
                    }
                }
                self.line_number += 1;
                Some(Ok(DumpLine {
                    number: self.line_number,
                    bytes,
                }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e).with_context(|| {
                    format!(
                        "Failed to read line {} of {}",
                        self.line_number + 1,
                        self.path.display()
                    )
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dump_file(contents: &str) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(contents.as_bytes()).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn payload_starts_at_first_brace() {
        let line = b"/type/author\t/authors/OL1A\t3\t2008-04-01\t{\"key\": \"/authors/OL1A\"}";
        assert_eq!(json_payload(line).unwrap(), "{\"key\": \"/authors/OL1A\"}");
    }

    #[test]
    fn payload_without_prefix() {
        assert_eq!(json_payload(b"{}").unwrap(), "{}");
    }

    #[test]
    fn payload_missing_brace() {
        assert_eq!(
            json_payload(b"no json here"),
            Err(SkipReason::NoJsonPayload)
        );
        assert_eq!(json_payload(b""), Err(SkipReason::NoJsonPayload));
    }

    #[test]
    fn payload_invalid_utf8() {
        assert_eq!(json_payload(b"x\t{\xff}"), Err(SkipReason::InvalidUtf8));
    }

    #[test]
    fn payload_ignores_invalid_prefix_bytes() {
        assert_eq!(json_payload(b"\xff\xfe\t{}").unwrap(), "{}");
    }

    #[test]
    fn reads_lines_with_numbers() {
        let tmp = dump_file("a\t{}\r\nb\n\nc\t{\"x\":1}");
        let lines: Vec<_> = DumpReader::open(tmp.path())
            .unwrap()
            .map(|l| l.unwrap())
            .collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[0].bytes, b"a\t{}");
        assert_eq!(lines[1].bytes, b"b");
        assert!(lines[2].bytes.is_empty());
        assert_eq!(lines[3].number, 4);
        assert_eq!(lines[3].payload().unwrap(), "{\"x\":1}");
    }

    #[test]
    fn empty_file_yields_nothing() {
        let tmp = dump_file("");
        assert_eq!(DumpReader::open(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn open_missing_file_fails() {
        let result = DumpReader::open("/definitely/not/here.txt");
        assert!(result.is_err());
        assert!(result
            .err()
            .unwrap()
            .to_string()
            .contains("Failed to open dump file"));
    }

    #[test]
    fn detects_bz2_extension() {
        assert!(is_bz2(Path::new("ol_dump_authors.txt.bz2")));
        assert!(is_bz2(Path::new("DUMP.BZ2")));
        assert!(!is_bz2(Path::new("ol_dump_authors.txt")));
        assert!(!is_bz2(Path::new("bz2")));
    }
}
