use crate::audio::block::AudioFrameBlock;
use crate::error::SpectrumError;

use super::downmix::{downmix, MonoFrame};
use super::fft::FixedFft;
use super::loudness::LoudnessTable;
use super::quantize::{quantize, SpectrumBars};
use super::{Channels, StreamCaps, SUPPORTED_RATES};

/// `log2` of the transform length every analyzer uses unless told otherwise.
pub const DEFAULT_LOG2_LEN: u32 = 10;
pub const DEFAULT_WIDTH: usize = 75;
/// Upper bound on `width`, tied to the default transform length.
pub const MAX_WIDTH: usize = 1 << DEFAULT_LOG2_LEN;

/// Loudness shift used for every block.
const SCALE_SHIFT: i16 = 0;

/// Checks `width` against `[1, MAX_WIDTH]` and the transform length.
pub fn check_width(width: usize, transform_len: usize) -> Result<(), SpectrumError> {
    let max = MAX_WIDTH.min(transform_len);
    if width == 0 || width > max {
        return Err(SpectrumError::WidthOutOfRange { width, max });
    }
    Ok(())
}

/// Settings read once when a block arrives and held for its whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BlockSettings {
    channels: Channels,
    width: usize,
}

/// Turns PCM blocks into spectrum bars, one output per input block.
///
/// The transform length is fixed at construction. `width` and the
/// negotiated channel layout can change between blocks; each block works
/// from a snapshot taken before any stage runs.
#[derive(Clone, Debug)]
pub struct Analyzer {
    fft: FixedFft,
    loudness: LoudnessTable,
    width: usize,
    channels: Option<Channels>,
    rate: Option<u32>,
}

impl Analyzer {
    pub fn new() -> Result<Self, SpectrumError> {
        Self::with_log2_len(DEFAULT_LOG2_LEN)
    }

    pub fn with_log2_len(log2_len: u32) -> Result<Self, SpectrumError> {
        let fft = FixedFft::new(log2_len)?;
        let width = DEFAULT_WIDTH.min(fft.len());
        Ok(Self {
            fft,
            loudness: LoudnessTable::new(),
            width,
            channels: None,
            rate: None,
        })
    }

    /// Transform length `N`.
    pub fn transform_len(&self) -> usize {
        self.fft.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    #[allow(dead_code)]
    pub fn channels(&self) -> Option<Channels> {
        self.channels
    }

    #[allow(dead_code)]
    pub fn rate(&self) -> Option<u32> {
        self.rate
    }

    /// Sets the number of output columns for blocks processed from now on.
    ///
    /// A rejected value leaves the current width in place.
    pub fn set_width(&mut self, width: usize) -> Result<(), SpectrumError> {
        if let Err(err) = check_width(width, self.transform_len()) {
            log::warn!("Rejecting width: {}", err);
            return Err(err);
        }
        log::debug!("Width set to {}", width);
        self.width = width;
        Ok(())
    }

    /// Accepts or refuses a stream format. A refusal keeps whatever was
    /// negotiated before.
    pub fn negotiate(&mut self, caps: StreamCaps) -> Result<Channels, SpectrumError> {
        let channels = Channels::try_from(caps.channels)?;
        if !SUPPORTED_RATES.contains(&caps.rate) {
            return Err(SpectrumError::UnsupportedRate(caps.rate));
        }

        log::debug!("Linked stream: {} channel(s) @ {}Hz", channels.count(), caps.rate);
        self.channels = Some(channels);
        self.rate = Some(caps.rate);
        Ok(channels)
    }

    /// Runs one block through downmix, window, FFT, loudness and bucketing.
    ///
    /// The block is consumed; its samples are released as soon as they have
    /// been folded into the transform buffer.
    pub fn process(&self, block: AudioFrameBlock) -> Result<SpectrumBars, SpectrumError> {
        let settings = self.snapshot()?;
        let mono = downmix(block.samples(), settings.channels, self.transform_len());
        log::trace!(
            "Block: {} frames, {} used, width {}",
            block.frame_count(settings.channels),
            mono.filled,
            settings.width
        );
        drop(block);
        self.run(settings, mono)
    }

    fn snapshot(&self) -> Result<BlockSettings, SpectrumError> {
        let channels = self.channels.ok_or(SpectrumError::NotNegotiated)?;
        Ok(BlockSettings {
            channels,
            width: self.width,
        })
    }

    fn run(&self, settings: BlockSettings, mono: MonoFrame) -> Result<SpectrumBars, SpectrumError> {
        let n = self.transform_len();
        let MonoFrame { mut real, filled } = mono;
        let mut imag = vec![0i16; n];

        super::window::apply(&mut real, filled, self.fft.table());
        self.fft.forward(&mut real, &mut imag)?;

        let mut loud = vec![0i16; n];
        self.loudness.compute(&mut loud, &real, &imag, SCALE_SHIFT);
        quantize(&loud, settings.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn stereo_caps() -> StreamCaps {
        StreamCaps { channels: 2, rate: 44100 }
    }

    fn mono_caps() -> StreamCaps {
        StreamCaps { channels: 1, rate: 44100 }
    }

    fn sine(bin: usize, amplitude: f64, frames: usize) -> Vec<i16> {
        (0..frames)
            .map(|i| (amplitude * (2.0 * PI * bin as f64 * i as f64 / 1024.0).sin()) as i16)
            .collect()
    }

    fn argmax(values: &[u8]) -> usize {
        values
            .iter()
            .enumerate()
            .max_by_key(|&(i, &v)| (v, std::cmp::Reverse(i)))
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn negotiation_accepts_mono_and_stereo_only() {
        let mut analyzer = Analyzer::new().unwrap();
        assert_eq!(analyzer.negotiate(mono_caps()).unwrap(), Channels::Mono);
        assert_eq!(analyzer.negotiate(stereo_caps()).unwrap(), Channels::Stereo);
        assert_eq!(
            analyzer.negotiate(StreamCaps { channels: 3, rate: 44100 }),
            Err(SpectrumError::UnsupportedChannels(3))
        );
        assert_eq!(analyzer.channels(), Some(Channels::Stereo));
    }

    #[test]
    fn negotiation_rejects_unlisted_rates() {
        let mut analyzer = Analyzer::new().unwrap();
        assert_eq!(
            analyzer.negotiate(StreamCaps { channels: 2, rate: 96000 }),
            Err(SpectrumError::UnsupportedRate(96000))
        );
        assert_eq!(analyzer.channels(), None);
        assert_eq!(analyzer.rate(), None);
    }

    #[test]
    fn processing_requires_negotiation() {
        let analyzer = Analyzer::new().unwrap();
        let block = AudioFrameBlock::new(vec![0; 64]);
        assert_eq!(analyzer.process(block), Err(SpectrumError::NotNegotiated));
    }

    #[test]
    fn width_is_range_checked() {
        let mut analyzer = Analyzer::new().unwrap();
        assert_eq!(analyzer.width(), DEFAULT_WIDTH);
        assert!(analyzer.set_width(0).is_err());
        assert!(analyzer.set_width(1025).is_err());
        assert_eq!(analyzer.width(), DEFAULT_WIDTH);
        assert!(analyzer.set_width(1).is_ok());
        assert!(analyzer.set_width(1024).is_ok());
        assert_eq!(analyzer.width(), 1024);
    }

    #[test]
    fn check_width_bounds() {
        assert!(check_width(1, 1024).is_ok());
        assert!(check_width(1024, 1024).is_ok());
        assert!(check_width(0, 1024).is_err());
        assert_eq!(
            check_width(1025, 16384),
            Err(SpectrumError::WidthOutOfRange { width: 1025, max: 1024 })
        );
    }

    #[test]
    fn width_cannot_exceed_a_smaller_transform() {
        let mut analyzer = Analyzer::with_log2_len(6).unwrap();
        assert_eq!(analyzer.width(), 64);
        assert_eq!(
            analyzer.set_width(65),
            Err(SpectrumError::WidthOutOfRange { width: 65, max: 64 })
        );
    }

    #[test]
    fn oversized_transform_is_fatal() {
        assert!(matches!(
            Analyzer::with_log2_len(15),
            Err(SpectrumError::TransformConfig { .. })
        ));
    }

    #[test]
    fn one_bar_per_column_for_every_layout() {
        let mut analyzer = Analyzer::new().unwrap();
        let samples = sine(40, 8000.0, 2048);
        for caps in [mono_caps(), stereo_caps()] {
            analyzer.negotiate(caps).unwrap();
            for width in [1, 7, 75, 333, 1024] {
                analyzer.set_width(width).unwrap();
                let bars = analyzer.process(AudioFrameBlock::new(samples.clone())).unwrap();
                assert_eq!(bars.len(), width);
            }
        }
    }

    #[test]
    fn silence_yields_empty_bars() {
        let mut analyzer = Analyzer::new().unwrap();
        analyzer.negotiate(stereo_caps()).unwrap();
        for width in [1, 75, 1024] {
            analyzer.set_width(width).unwrap();
            for frames in [0, 1, 500, 1024, 3000] {
                let bars = analyzer.process(AudioFrameBlock::new(vec![0; frames * 2])).unwrap();
                assert!(bars.as_bytes().iter().all(|&b| b == 0), "width {width}, frames {frames}");
            }
        }
    }

    #[test]
    fn cancelling_stereo_channels_are_silent() {
        let mut analyzer = Analyzer::new().unwrap();
        analyzer.negotiate(stereo_caps()).unwrap();
        let samples: Vec<i16> = sine(64, 12000.0, 1024)
            .into_iter()
            .flat_map(|s| [s, -s])
            .collect();
        let bars = analyzer.process(AudioFrameBlock::new(samples)).unwrap();
        assert!(bars.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn sinusoid_peaks_at_its_bin() {
        let mut analyzer = Analyzer::new().unwrap();
        analyzer.negotiate(mono_caps()).unwrap();
        let samples = sine(64, 16000.0, 1024);

        analyzer.set_width(1024).unwrap();
        let bars = analyzer.process(AudioFrameBlock::new(samples.clone())).unwrap();
        let first_half = &bars.as_bytes()[..512];
        assert_eq!(argmax(first_half), 64);
        assert!(first_half[64] > 10);
        for (i, &b) in first_half.iter().enumerate() {
            if i.abs_diff(64) > 8 {
                assert!(b <= 2, "bin {i} = {b}");
            }
        }

        analyzer.set_width(128).unwrap();
        let bars = analyzer.process(AudioFrameBlock::new(samples)).unwrap();
        assert_eq!(argmax(&bars.as_bytes()[..64]), 8);
    }

    #[test]
    fn frames_past_the_transform_length_are_ignored() {
        let mut analyzer = Analyzer::new().unwrap();
        analyzer.negotiate(mono_caps()).unwrap();
        let head = sine(100, 9000.0, 1024);
        let mut long = head.clone();
        long.extend(sine(300, 20000.0, 2000));

        let expected = analyzer.process(AudioFrameBlock::new(head)).unwrap();
        let actual = analyzer.process(AudioFrameBlock::new(long)).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn short_blocks_use_only_their_own_frames() {
        let mut analyzer = Analyzer::new().unwrap();
        analyzer.negotiate(mono_caps()).unwrap();
        analyzer.set_width(1024).unwrap();
        let short = sine(32, 16000.0, 256);

        let bars = analyzer.process(AudioFrameBlock::new(short)).unwrap();
        assert_eq!(bars.len(), 1024);

        // 256 frames give a main lobe four bins wide on each side
        let first_half = &bars.as_bytes()[..512];
        let peak = first_half[32];
        assert!(peak > 10);
        assert_eq!(first_half.iter().max(), Some(&peak));
        for (i, &b) in first_half.iter().enumerate() {
            if i.abs_diff(32) > 16 {
                assert!(b + 6 <= peak, "bin {i} = {b}, peak {peak}");
            }
        }
    }

    #[test]
    fn width_change_applies_to_the_next_block() {
        let mut analyzer = Analyzer::new().unwrap();
        analyzer.negotiate(mono_caps()).unwrap();
        let block = || AudioFrameBlock::new(sine(10, 5000.0, 1024));

        assert_eq!(analyzer.process(block()).unwrap().len(), DEFAULT_WIDTH);
        analyzer.set_width(32).unwrap();
        assert_eq!(analyzer.process(block()).unwrap().len(), 32);
        assert!(analyzer.set_width(4096).is_err());
        assert_eq!(analyzer.process(block()).unwrap().len(), 32);
    }
}
