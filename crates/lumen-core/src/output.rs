//! Output formatting for decision lists.
//!
//! Decisions go to stdout (or a file) as TSV, a JSON array or JSON Lines.
//! The per-folder summary is plain `folder=count` text.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::config::OutputFormat;
use crate::types::Decision;

/// Serializes decisions in one of the [`OutputFormat`]s.
pub struct DecisionWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
}

impl<W: Write> DecisionWriter<W> {
    /// `pretty` only affects the JSON array format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
        }
    }

    /// Write a complete decision list.
    ///
    /// TSV always starts with the `keep\tdelete\tssim` header, even for an
    /// empty list; JSON always writes an array.
    pub fn write_all(&mut self, decisions: &[Decision]) -> io::Result<()> {
        match self.format {
            OutputFormat::Tsv => {
                writeln!(self.writer, "keep\tdelete\tssim")?;
                for decision in decisions {
                    writeln!(
                        self.writer,
                        "{}\t{}\t{:.6}",
                        decision.keep.display(),
                        decision.delete.display(),
                        decision.ssim
                    )?;
                }
            }
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, decisions)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, decisions).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
            }
            OutputFormat::Jsonl => {
                // One object per line, never pretty
                for decision in decisions {
                    serde_json::to_writer(&mut self.writer, decision).map_err(io::Error::other)?;
                    writeln!(self.writer)?;
                }
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// `folder=count` lines, one per folder, in path order.
pub fn folder_summary(keeps_per_folder: &BTreeMap<PathBuf, usize>) -> String {
    let mut out = String::new();
    for (folder, count) in keeps_per_folder {
        out.push_str(&format!("{}={}\n", folder.display(), count));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decisions() -> Vec<Decision> {
        vec![
            Decision {
                keep: PathBuf::from("/p/a.jpg"),
                delete: PathBuf::from("/c/a.jpg"),
                ssim: 0.987654321,
            },
            Decision {
                keep: PathBuf::from("/c/b.jpg"),
                delete: PathBuf::from("/c/b2.jpg"),
                ssim: 0.95,
            },
        ]
    }

    fn render(format: OutputFormat, pretty: bool, items: &[Decision]) -> String {
        let mut writer = DecisionWriter::new(Vec::new(), format, pretty);
        writer.write_all(items).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_tsv() {
        let out = render(OutputFormat::Tsv, false, &decisions());
        assert_eq!(
            out,
            "keep\tdelete\tssim\n/p/a.jpg\t/c/a.jpg\t0.987654\n/c/b.jpg\t/c/b2.jpg\t0.950000\n"
        );
    }

    #[test]
    fn test_tsv_empty_has_header() {
        assert_eq!(render(OutputFormat::Tsv, false, &[]), "keep\tdelete\tssim\n");
    }

    #[test]
    fn test_json_array() {
        let out = render(OutputFormat::Json, false, &decisions());
        assert_eq!(out.lines().count(), 1);
        let parsed: Vec<Decision> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, decisions());
    }

    #[test]
    fn test_json_pretty() {
        let out = render(OutputFormat::Json, true, &decisions());
        assert!(out.lines().count() > 2);
        assert!(out.contains("  \"keep\""));
    }

    #[test]
    fn test_jsonl() {
        let out = render(OutputFormat::Jsonl, true, &decisions());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Decision = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.delete, PathBuf::from("/c/a.jpg"));
    }

    #[test]
    fn test_folder_summary() {
        let mut keeps = BTreeMap::new();
        keeps.insert(PathBuf::from("/p"), 3);
        keeps.insert(PathBuf::from("/c"), 1);
        assert_eq!(folder_summary(&keeps), "/c=1\n/p=3\n");
        assert_eq!(folder_summary(&BTreeMap::new()), "");
    }
}
