use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use anyhow::Context;
use rusqlite::Connection;
use tracing::error;

/// Substituted for a value whose bytes cannot be recovered from the dump.
pub const DECODE_SENTINEL: &str = "[Error processing]";

#[derive(Debug, Default, Clone, Copy)]
pub struct ScanStats {
    pub pairs: usize,
    pub decode_failures: usize,
}

/// Reader for the portable text dump of one legacy key/value table
/// (`db_dump` bytevalue format): a handful of `name=value` header lines up
/// to `HEADER=END`, then alternating key/value lines of hex-encoded bytes,
/// each prefixed with a single space, terminated by `DATA=END`.
///
/// The stream is finite and not restartable; call `open` again to rescan.
pub struct DumpFile {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    decode_failures: usize,
    done: bool,
}

impl DumpFile {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening dump file {}", path.display()))?;
        let mut lines = BufReader::new(file).lines();
        loop {
            match lines.next() {
                Some(line) => {
                    if line?.trim() == "HEADER=END" {
                        break;
                    }
                }
                None => anyhow::bail!("missing HEADER=END in {}", path.display()),
            }
        }
        Ok(DumpFile {
            path: path.to_path_buf(),
            lines,
            decode_failures: 0,
            done: false,
        })
    }

    pub fn decode_failures(&self) -> usize {
        self.decode_failures
    }

    /// Next decoded (key, value) pair, or `None` once `DATA=END` is reached.
    ///
    /// A pair whose value bytes are unrecoverable yields the sentinel value
    /// instead; a pair whose key is unrecoverable is skipped outright (a
    /// sentinel key would collide across records). Neither aborts the scan.
    pub fn next_pair(&mut self) -> anyhow::Result<Option<(String, String)>> {
        loop {
            let Some(key_bytes) = self.next_data_line()? else {
                return Ok(None);
            };
            let value_bytes = self
                .next_data_line()?
                .ok_or_else(|| anyhow::anyhow!("dangling key in {}", self.path.display()))?;

            let key = match key_bytes {
                Some(bytes) => {
                    let (key, had_errors) = decode_windows_1252(&bytes);
                    if had_errors {
                        self.decode_failures += 1;
                        error!(
                            "undecodable key bytes in {}; using lossy key {:?}",
                            self.path.display(),
                            key
                        );
                    }
                    key
                }
                None => {
                    self.decode_failures += 1;
                    error!("unreadable key line in {}; skipping record", self.path.display());
                    continue;
                }
            };

            let value = match value_bytes {
                Some(bytes) => {
                    let (value, had_errors) = decode_windows_1252(&bytes);
                    if had_errors {
                        self.decode_failures += 1;
                        error!(
                            "undecodable value for key {:?} in {}; substituting sentinel",
                            key,
                            self.path.display()
                        );
                        DECODE_SENTINEL.to_string()
                    } else {
                        value
                    }
                }
                None => {
                    self.decode_failures += 1;
                    error!(
                        "unreadable value line for key {:?} in {}; substituting sentinel",
                        key,
                        self.path.display()
                    );
                    DECODE_SENTINEL.to_string()
                }
            };

            return Ok(Some((key, value)));
        }
    }

    /// Next raw data line: `Ok(Some(Some(bytes)))` for a well-formed hex
    /// line, `Ok(Some(None))` for a malformed one, `Ok(None)` at DATA=END.
    fn next_data_line(&mut self) -> anyhow::Result<Option<Option<Vec<u8>>>> {
        if self.done {
            return Ok(None);
        }
        match self.lines.next() {
            Some(line) => {
                let line = line?;
                if line.trim() == "DATA=END" {
                    self.done = true;
                    return Ok(None);
                }
                Ok(Some(parse_hex_line(&line)))
            }
            None => anyhow::bail!("missing DATA=END in {}", self.path.display()),
        }
    }
}

fn parse_hex_line(line: &str) -> Option<Vec<u8>> {
    let hex = line.strip_prefix(' ').unwrap_or(line).trim();
    if !hex.is_ascii() || hex.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        bytes.push(u8::from_str_radix(&hex[i..i + 2], 16).ok()?);
    }
    Some(bytes)
}

fn decode_windows_1252(bytes: &[u8]) -> (String, bool) {
    let (text, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
    (text.into_owned(), had_errors)
}

/// Scan every pair of `dir/<table><ext>` into the destination through
/// `handler`, inside a single transaction committed only once the source is
/// exhausted. Handler errors abort the scan and roll the transaction back.
pub fn scan_into<F>(
    conn: &Connection,
    dir: &Path,
    table: &str,
    ext: &str,
    mut handler: F,
) -> anyhow::Result<ScanStats>
where
    F: FnMut(&str, &str) -> anyhow::Result<()>,
{
    let path = dir.join(format!("{}{}", table, ext));
    let mut dump = DumpFile::open(&path)?;
    let tx = conn.unchecked_transaction()?;

    let mut pairs = 0usize;
    while let Some((key, value)) = dump.next_pair()? {
        handler(&key, &value)?;
        pairs += 1;
    }

    tx.commit()?;
    Ok(ScanStats {
        pairs,
        decode_failures: dump.decode_failures(),
    })
}
