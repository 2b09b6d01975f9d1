use clap::Parser;
use std::path::PathBuf;

use crate::audio::block::DEFAULT_BLOCK_FRAMES;
use crate::output::sink::BarFormat;
use crate::spectrum::analyzer::DEFAULT_WIDTH;

#[derive(Parser, Debug)]
#[command(name = "barscope", about = "Fixed-point spectrum bars from 16-bit PCM audio")]
pub struct Cli {
    /// Input audio files (WAV, MP3, FLAC, OGG, or headerless s16 PCM with --raw)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file (single input only). Defaults to stdout for one input and
    /// to `<input stem>.bars.<ext>` next to each input otherwise.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of bars per block (1-1024)
    #[arg(short, long, default_value_t = DEFAULT_WIDTH)]
    pub width: usize,

    /// Frames delivered to the analyzer per block
    #[arg(long, default_value_t = DEFAULT_BLOCK_FRAMES)]
    pub block_frames: usize,

    /// Output layout
    #[arg(short, long, value_enum, default_value_t = BarFormat::Jsonl)]
    pub format: BarFormat,

    /// Treat inputs as headerless native-endian s16 PCM
    #[arg(long)]
    pub raw: bool,

    /// Channel count of raw input
    #[arg(long, default_value_t = 2)]
    pub channels: u32,

    /// Sample rate of raw input
    #[arg(long, default_value_t = 44100)]
    pub rate: u32,

    /// Config file (defaults to ./barscope.toml or the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
