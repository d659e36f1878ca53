//! Result output: JSONL streams and pretty-printed single results.
//!
//! Batch runs write one JSON object per line to stdout or a file. Broken
//! pipes on stdout are swallowed so `hopcheck ... | head` exits cleanly.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::Path;

use crate::resolve::types::ChainResult;

/// Destination for resolved chains.
pub struct ResultWriter {
    writer: Box<dyn Write + Send>,
}

impl ResultWriter {
    /// Writes JSONL to stdout, tolerating a closed pipe.
    pub fn to_stdout() -> Self {
        ResultWriter {
            writer: Box::new(IgnoreBrokenPipe::new(io::stdout())),
        }
    }

    /// Writes JSONL to a file, truncating any existing content.
    pub async fn to_file(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(ResultWriter {
            writer: Box::new(file.into_std().await),
        })
    }

    /// Appends one result as a single JSON line.
    pub fn write_result(&mut self, result: &ChainResult) -> Result<()> {
        serde_json::to_writer(&mut self.writer, result)
            .with_context(|| format!("Failed to serialize result for {}", result.original_url))?;
        writeln!(self.writer).context("Failed to write result line")?;
        Ok(())
    }

    /// Flushes buffered output.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush output")
    }
}

/// Pretty-prints one result to stdout, for single-URL invocations.
pub fn print_pretty(result: &ChainResult) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    let mut stdout = IgnoreBrokenPipe::new(io::stdout());
    writeln!(stdout, "{rendered}").context("Failed to write result")?;
    Ok(())
}

/// Writer wrapper that treats a broken pipe as success. Downstream tools
/// closing stdout early is normal, not an error.
struct IgnoreBrokenPipe<W: Write> {
    inner: W,
}

impl<W: Write> IgnoreBrokenPipe<W> {
    fn new(inner: W) -> Self {
        IgnoreBrokenPipe { inner }
    }
}

impl<W: Write> Write for IgnoreBrokenPipe<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).or_else(|e| {
            if e.kind() == io::ErrorKind::BrokenPipe {
                Ok(buf.len())
            } else {
                Err(e)
            }
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().or_else(|e| {
            if e.kind() == io::ErrorKind::BrokenPipe {
                Ok(())
            } else {
                Err(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::types::{Hop, HopKind, StrategyTag};

    fn sample_result() -> ChainResult {
        ChainResult {
            original_url: "http://a.example/".to_string(),
            final_url: "https://b.example/".to_string(),
            final_status_code: 200,
            hops: vec![
                Hop {
                    source_url: "http://a.example/".to_string(),
                    kind: HopKind::HttpRedirect,
                    target_url: Some("https://b.example/".to_string()),
                    status_code: Some(301),
                    delay_seconds: None,
                    sequence: 1,
                },
                Hop {
                    source_url: "https://b.example/".to_string(),
                    kind: HopKind::Final,
                    target_url: None,
                    status_code: Some(200),
                    delay_seconds: None,
                    sequence: 2,
                },
            ],
            redirect_count: 1,
            has_loop: false,
            has_mixed_types: false,
            domain_changes: true,
            https_upgrade: true,
            strategy: StrategyTag::Static,
            blocked: None,
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    #[test]
    fn test_broken_pipe_is_swallowed() {
        let mut writer = IgnoreBrokenPipe::new(BrokenWriter);
        assert_eq!(writer.write(b"hello").unwrap(), 5);
        assert!(writer.flush().is_ok());
    }

    #[test]
    fn test_other_io_errors_pass_through() {
        struct FullDisk;
        impl Write for FullDisk {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let mut writer = IgnoreBrokenPipe::new(FullDisk);
        assert!(writer.write(b"hello").is_err());
    }

    #[tokio::test]
    async fn test_file_output_is_one_parseable_line_per_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");

        let mut writer = ResultWriter::to_file(&path).await.unwrap();
        writer.write_result(&sample_result()).unwrap();
        writer.write_result(&sample_result()).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["final_status_code"], 200);
            assert_eq!(parsed["hops"].as_array().unwrap().len(), 2);
            assert_eq!(parsed["strategy"], "static");
        }
    }

    #[test]
    fn test_pretty_print_does_not_fail() {
        assert!(print_pretty(&sample_result()).is_ok());
    }
}
