pub mod analyzer;
pub mod downmix;
pub mod fft;
pub mod loudness;
pub mod quantize;
pub mod window;

use crate::error::SpectrumError;

pub use analyzer::Analyzer;
pub use quantize::SpectrumBars;

/// Sample rates a stream may be linked at.
pub const SUPPORTED_RATES: [u32; 9] = [
    8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    pub fn count(self) -> usize {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

impl TryFrom<u32> for Channels {
    type Error = SpectrumError;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        match count {
            1 => Ok(Channels::Mono),
            2 => Ok(Channels::Stereo),
            other => Err(SpectrumError::UnsupportedChannels(other)),
        }
    }
}

/// Format of an incoming stream, as offered when it is linked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamCaps {
    pub channels: u32,
    pub rate: u32,
}
