mod audio;
mod cli;
mod config;
mod error;
mod output;
mod spectrum;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};

use audio::block::{block_count, split_blocks, DEFAULT_BLOCK_FRAMES};
use audio::decode::{self, PcmStream};
use cli::Cli;
use config::Config;
use output::sink::{BarFormat, BarWriter};
use spectrum::analyzer::{check_width, DEFAULT_LOG2_LEN, DEFAULT_WIDTH};
use spectrum::Analyzer;

/// Where one input's bars go.
enum Destination {
    Stdout,
    File(PathBuf),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    let config_path = cli.config.clone().or_else(config::find_config);
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            merge_config(&mut cli, cfg);
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }
    cli.width = checked_width(cli.width, "--width");

    if cli.block_frames == 0 {
        anyhow::bail!("--block-frames must be at least 1");
    }
    if cli.output.is_some() && cli.inputs.len() > 1 {
        anyhow::bail!("--output can only be used with a single input");
    }

    log::info!("barscope - fixed-point spectrum bars");
    log::info!("Width: {} bars, {} frames per block, format {:?}", cli.width, cli.block_frames, cli.format);

    let jobs: Vec<(PathBuf, Destination)> = cli
        .inputs
        .iter()
        .map(|input| {
            let dest = match (&cli.output, cli.inputs.len()) {
                (Some(path), _) => Destination::File(path.clone()),
                (None, 1) => Destination::Stdout,
                (None, _) => Destination::File(default_output(input, &cli)),
            };
            (input.clone(), dest)
        })
        .collect();

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks ({eta} remaining)")
            .unwrap()
            .progress_chars("=>-"),
    );

    // Each input gets its own analyzer, so files are independent
    let totals: Vec<usize> = jobs
        .par_iter()
        .map(|(input, dest)| run_job(&cli, input, dest, &pb))
        .collect::<Result<_>>()?;

    pb.finish_and_clear();
    log::info!(
        "Done: {} block(s) from {} input(s)",
        totals.iter().sum::<usize>(),
        totals.len()
    );
    Ok(())
}

/// Config values apply only where the CLI is still at its default.
fn merge_config(cli: &mut Cli, cfg: Config) {
    if cli.width == DEFAULT_WIDTH {
        cli.width = checked_width(cfg.spectrum.width, "config width");
    }
    if cli.block_frames == DEFAULT_BLOCK_FRAMES {
        cli.block_frames = cfg.spectrum.block_frames;
    }
    if cli.format == BarFormat::Jsonl {
        cli.format = cfg.output.format;
    }
}

/// Falls back to `DEFAULT_WIDTH` when `width` is out of range.
fn checked_width(width: usize, source: &str) -> usize {
    match check_width(width, 1 << DEFAULT_LOG2_LEN) {
        Ok(()) => width,
        Err(err) => {
            log::warn!("Ignoring {}: {}; using {}", source, err, DEFAULT_WIDTH);
            DEFAULT_WIDTH
        }
    }
}

fn default_output(input: &Path, cli: &Cli) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}.bars.{}", stem, cli.format.extension()))
}

fn run_job(cli: &Cli, input: &Path, dest: &Destination, pb: &ProgressBar) -> Result<usize> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let stream = if cli.raw {
        decode::read_raw(input, cli.channels, cli.rate)?
    } else {
        decode::decode_audio(input)?
    };

    let blocks = match dest {
        Destination::Stdout => {
            let writer = BarWriter::new(std::io::stdout().lock(), cli.format);
            analyze_stream(cli, input, &stream, writer, pb)?
        }
        Destination::File(path) => {
            let writer = BarWriter::create(path, cli.format)?;
            let blocks = analyze_stream(cli, input, &stream, writer, pb)?;
            log::info!("{} -> {}", input.display(), path.display());
            blocks
        }
    };
    Ok(blocks)
}

fn analyze_stream<W: Write>(
    cli: &Cli,
    input: &Path,
    stream: &PcmStream,
    mut writer: BarWriter<W>,
    pb: &ProgressBar,
) -> Result<usize> {
    let mut analyzer = Analyzer::new()?;
    analyzer.set_width(cli.width)?;
    let channels = analyzer
        .negotiate(stream.caps())
        .with_context(|| format!("Cannot link {}", input.display()))?;

    pb.inc_length(block_count(stream.samples.len(), channels, cli.block_frames) as u64);

    for block in split_blocks(&stream.samples, channels, cli.block_frames) {
        let bars = analyzer.process(block)?;
        writer
            .write_bars(&bars)
            .with_context(|| format!("Failed to write bars for {}", input.display()))?;
        pb.inc(1);
    }

    let (_, blocks) = writer.finish()?;
    log::info!(
        "{}: {} block(s), {:.1}s of audio",
        input.display(),
        blocks,
        stream.duration()
    );
    Ok(blocks)
}
