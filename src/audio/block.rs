use crate::spectrum::Channels;

/// Frames per delivered block unless configured otherwise.
pub const DEFAULT_BLOCK_FRAMES: usize = 1024;

/// One delivery of interleaved signed 16-bit PCM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioFrameBlock {
    samples: Vec<i16>,
}

impl AudioFrameBlock {
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Complete frames in the block; a trailing partial frame does not count.
    pub fn frame_count(&self, channels: Channels) -> usize {
        self.samples.len() / channels.count()
    }
}

/// Cuts an interleaved stream into blocks of `block_frames` frames.
/// The last block may be shorter.
pub fn split_blocks(
    samples: &[i16],
    channels: Channels,
    block_frames: usize,
) -> impl Iterator<Item = AudioFrameBlock> + '_ {
    let chunk = (block_frames * channels.count()).max(1);
    samples
        .chunks(chunk)
        .map(|chunk| AudioFrameBlock::new(chunk.to_vec()))
}

/// Number of blocks `split_blocks` yields for `samples_len` samples.
pub fn block_count(samples_len: usize, channels: Channels, block_frames: usize) -> usize {
    let chunk = (block_frames * channels.count()).max(1);
    samples_len.div_ceil(chunk)
}
