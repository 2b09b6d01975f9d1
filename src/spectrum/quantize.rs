use crate::error::SpectrumError;

/// Bins at or below this loudness (dB) render as an empty bar.
pub const NOISE_FLOOR_DB: i16 = -60;

/// Quantized bar heights for one analysed block, one byte per display column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpectrumBars(Vec<u8>);

impl SpectrumBars {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[allow(dead_code)]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

/// Bin index sampled by each of `width` columns over `len` bins.
///
/// The stride is `len / width`, truncated; bins past `stride * width` are
/// never sampled.
pub fn bucket_positions(len: usize, width: usize) -> impl Iterator<Item = usize> {
    let step = len / width.max(1);
    (0..width).map(move |i| i * step)
}

/// Samples `loud` at `width` evenly strided bins and turns each into a bar.
///
/// A bin above the noise floor becomes `(loud + 60) / 2`; anything else is 0.
/// No display ceiling is applied.
pub fn quantize(loud: &[i16], width: usize) -> Result<SpectrumBars, SpectrumError> {
    if width == 0 || width > loud.len() {
        return Err(SpectrumError::WidthOutOfRange {
            width,
            max: loud.len(),
        });
    }

    let bars = bucket_positions(loud.len(), width)
        .map(|pos| bar_height(loud[pos]))
        .collect();
    Ok(SpectrumBars(bars))
}

fn bar_height(db: i16) -> u8 {
    if db > NOISE_FLOOR_DB {
        let height = (db as i32 - NOISE_FLOOR_DB as i32) / 2;
        u8::try_from(height).unwrap_or(u8::MAX)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_length_matches_width() {
        let loud = vec![-20i16; 1024];
        for width in [1, 2, 3, 75, 100, 512, 1000, 1023, 1024] {
            assert_eq!(quantize(&loud, width).unwrap().len(), width);
        }
    }

    #[test]
    fn stride_is_truncated() {
        let positions: Vec<usize> = bucket_positions(1024, 75).collect();
        assert_eq!(positions.len(), 75);
        assert_eq!(&positions[..4], &[0, 13, 26, 39]);
        assert_eq!(*positions.last().unwrap(), 74 * 13);
    }

    #[test]
    fn samples_strided_bins_only() {
        let loud: Vec<i16> = (0..1024)
            .map(|i| if i % 13 == 0 { 0 } else { -100 })
            .collect();
        let bars = quantize(&loud, 75).unwrap();
        assert!(bars.as_bytes().iter().all(|&b| b == 30));
    }

    #[test]
    fn applies_floor_and_halves() {
        let loud = [-100, -61, -60, -59, -58, -31, 0, 10];
        let bars = quantize(&loud, 8).unwrap();
        assert_eq!(bars.into_inner(), vec![0, 0, 0, 0, 1, 14, 30, 35]);
    }

    #[test]
    fn tall_bins_are_not_clipped_to_display_range() {
        let bars = quantize(&[0, 0], 2).unwrap();
        assert!(bars.as_bytes().iter().all(|&b| b > 15));
    }

    #[test]
    fn rejects_invalid_width() {
        let loud = vec![0i16; 16];
        assert!(matches!(
            quantize(&loud, 0),
            Err(SpectrumError::WidthOutOfRange { width: 0, max: 16 })
        ));
        assert!(quantize(&loud, 17).is_err());
        assert!(quantize(&loud, 16).is_ok());
    }
}
