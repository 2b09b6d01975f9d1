use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::spectrum::SpectrumBars;

/// How bar blocks are laid out on the output stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BarFormat {
    /// Bar bytes back to back, `width` bytes per block
    Raw,
    /// One JSON object per block
    Jsonl,
    /// One line of space-separated heights per block
    Text,
}

impl BarFormat {
    pub fn extension(self) -> &'static str {
        match self {
            BarFormat::Raw => "bin",
            BarFormat::Jsonl => "jsonl",
            BarFormat::Text => "txt",
        }
    }
}

#[derive(Serialize)]
struct BarRecord<'a> {
    block: usize,
    bars: &'a [u8],
}

pub struct BarWriter<W: Write> {
    out: W,
    format: BarFormat,
    blocks: usize,
}

impl BarWriter<BufWriter<File>> {
    pub fn create(path: &Path, format: BarFormat) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file), format))
    }
}

impl<W: Write> BarWriter<W> {
    pub fn new(out: W, format: BarFormat) -> Self {
        Self {
            out,
            format,
            blocks: 0,
        }
    }

    pub fn write_bars(&mut self, bars: &SpectrumBars) -> Result<()> {
        match self.format {
            BarFormat::Raw => {
                self.out.write_all(bars.as_bytes())?;
            }
            BarFormat::Jsonl => {
                let record = BarRecord {
                    block: self.blocks,
                    bars: bars.as_bytes(),
                };
                serde_json::to_writer(&mut self.out, &record)?;
                self.out.write_all(b"\n")?;
            }
            BarFormat::Text => {
                let line = bars
                    .as_bytes()
                    .iter()
                    .map(|b| b.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(self.out, "{}", line)?;
            }
        }
        self.blocks += 1;
        Ok(())
    }

    /// Flushes the stream and hands it back with the number of blocks written.
    pub fn finish(mut self) -> Result<(W, usize)> {
        self.out.flush().context("Failed to flush bar output")?;
        log::debug!("Wrote {} bar blocks", self.blocks);
        Ok((self.out, self.blocks))
    }
}
