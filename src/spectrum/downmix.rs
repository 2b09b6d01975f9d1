use super::Channels;

/// A mono sequence of exactly the transform length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonoFrame {
    pub real: Vec<i16>,
    /// Samples taken from the input; everything after is zero padding.
    pub filled: usize,
}

/// Folds interleaved samples down to `len` mono samples.
///
/// Stereo frames are averaged as `(left + right) >> 1`, which rounds odd sums
/// toward negative infinity. Frames past `len` are dropped, a short block is
/// padded with silence, and a trailing partial frame is ignored.
pub fn downmix(samples: &[i16], channels: Channels, len: usize) -> MonoFrame {
    let mut real = vec![0i16; len];
    let filled = match channels {
        Channels::Mono => {
            let filled = samples.len().min(len);
            real[..filled].copy_from_slice(&samples[..filled]);
            filled
        }
        Channels::Stereo => {
            let mut filled = 0;
            for (out, frame) in real.iter_mut().zip(samples.chunks_exact(2)) {
                *out = ((frame[0] as i32 + frame[1] as i32) >> 1) as i16;
                filled += 1;
            }
            filled
        }
    };
    MonoFrame { real, filled }
}
