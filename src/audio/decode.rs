use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::spectrum::StreamCaps;

/// Interleaved 16-bit PCM with the format it was decoded at.
pub struct PcmStream {
    pub samples: Vec<i16>,
    pub channels: u32,
    pub sample_rate: u32,
}

impl PcmStream {
    pub fn caps(&self) -> StreamCaps {
        StreamCaps {
            channels: self.channels,
            rate: self.sample_rate,
        }
    }

    pub fn duration(&self) -> f32 {
        let frames = self.samples.len() / self.channels.max(1) as usize;
        frames as f32 / self.sample_rate.max(1) as f32
    }
}

pub fn decode_audio(path: &Path) -> Result<PcmStream> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .context("No audio tracks found")?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count()) as u32;
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut samples: Vec<i16> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(err)) => {
                log::warn!("Skipping undecodable packet: {}", err);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        // Channels stay interleaved; folding them is the analyzer's job.
        let mut sample_buf = SampleBuffer::<i16>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    let stream = PcmStream {
        samples,
        channels,
        sample_rate,
    };
    log::info!(
        "Decoded {}: {} channel(s), {}Hz, {:.1}s",
        path.display(),
        channels,
        sample_rate,
        stream.duration()
    );
    Ok(stream)
}

/// Reads headerless native-endian signed 16-bit PCM.
pub fn read_raw(path: &Path, channels: u32, sample_rate: u32) -> Result<PcmStream> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read raw PCM file: {}", path.display()))?;

    let whole = bytes.len() & !1;
    if whole != bytes.len() {
        log::warn!("{}: dropping trailing odd byte", path.display());
    }
    let samples: Vec<i16> = bytemuck::pod_collect_to_vec(&bytes[..whole]);

    let stream = PcmStream {
        samples,
        channels,
        sample_rate,
    };
    log::info!(
        "Read raw PCM {}: {} samples, {:.1}s",
        path.display(),
        stream.samples.len(),
        stream.duration()
    );
    Ok(stream)
}
