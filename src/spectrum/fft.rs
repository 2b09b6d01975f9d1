//! In-place fixed-point radix-2 FFT over Q15 real/imaginary arrays.
//!
//! Samples and twiddles are `i16` with an implied scale of 2^-15. Products are
//! widened to `i32` and shifted back down by 15 bits, so a single multiply
//! never overflows. Butterfly sums can still grow by one bit per stage; the
//! forward transform removes that bit by halving both the data and the
//! twiddles on every stage (an overall `1/N` factor after `m` stages). The
//! inverse transform only halves a stage when some value already exceeds
//! `INVERSE_HEADROOM` and reports how many stages it halved.
//!
//! Precision is traded for headroom: each halving drops the least significant
//! bit of every value, so small signals lose resolution on large transforms.

use std::f64::consts::PI;

use crate::error::SpectrumError;

/// Largest supported `log2` transform length.
pub const MAX_LOG2_LEN: u32 = 14;

/// An inverse stage halves its data when any component exceeds this magnitude.
const INVERSE_HEADROOM: u16 = 16383;

/// Full-scale Q15 amplitude.
pub const Q15_ONE: i16 = i16::MAX;

/// Q15 multiply: widen, multiply, drop the 15 fraction bits.
#[inline]
pub fn fix_mpy(a: i16, b: i16) -> i16 {
    ((a as i32 * b as i32) >> 15) as i16
}

/// One full period of `Q15_ONE * sin(2*pi*i / len)`.
///
/// Cosines are read a quarter period ahead. The table is never shorter than
/// four entries so that quarter offset stays exact for tiny transforms.
#[derive(Clone, Debug)]
pub struct SineTable {
    values: Vec<i16>,
}

impl SineTable {
    pub fn new(log2_len: u32) -> Self {
        let log2_len = log2_len.max(2);
        let len = 1usize << log2_len;
        let values = (0..len)
            .map(|i| {
                let phase = 2.0 * PI * i as f64 / len as f64;
                (Q15_ONE as f64 * phase.sin()).round() as i16
            })
            .collect();
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn quarter(&self) -> usize {
        self.values.len() / 4
    }

    #[inline]
    pub fn sin(&self, index: usize) -> i16 {
        self.values[index]
    }
}

/// Iterative decimation-in-time FFT of a fixed length `2^log2_len`.
#[derive(Clone, Debug)]
pub struct FixedFft {
    log2_len: u32,
    table: SineTable,
}

impl FixedFft {
    pub fn new(log2_len: u32) -> Result<Self, SpectrumError> {
        if log2_len > MAX_LOG2_LEN {
            return Err(SpectrumError::TransformConfig {
                log2_len,
                max: MAX_LOG2_LEN,
            });
        }
        Ok(Self {
            log2_len,
            table: SineTable::new(log2_len),
        })
    }

    pub fn len(&self) -> usize {
        1 << self.log2_len
    }

    pub fn table(&self) -> &SineTable {
        &self.table
    }

    pub fn forward(&self, real: &mut [i16], imag: &mut [i16]) -> Result<u32, SpectrumError> {
        self.transform(real, imag, false)
    }

    #[allow(dead_code)]
    pub fn inverse(&self, real: &mut [i16], imag: &mut [i16]) -> Result<u32, SpectrumError> {
        self.transform(real, imag, true)
    }

    /// Transforms `real`/`imag` in place.
    ///
    /// Returns the number of stages that were halved beyond the fixed
    /// forward normalization: always `0` forward, the block exponent inverse.
    pub fn transform(
        &self,
        real: &mut [i16],
        imag: &mut [i16],
        inverse: bool,
    ) -> Result<u32, SpectrumError> {
        let n = self.len();
        if real.len() != n || imag.len() != n {
            return Err(SpectrumError::BufferLength {
                expected: n,
                real: real.len(),
                imag: imag.len(),
            });
        }

        bit_reverse(real, imag);

        let quarter = self.table.quarter();
        let mut scale = 0;
        let mut half = 1;
        while half < n {
            let shift = if inverse {
                needs_headroom(real, imag)
            } else {
                true
            };
            if inverse && shift {
                scale += 1;
            }

            let span = half << 1;
            let stride = self.table.len() / span;
            for m in 0..half {
                let j = m * stride;
                let mut wr = self.table.sin(j + quarter);
                let mut wi = -self.table.sin(j);
                if inverse {
                    wi = -wi;
                }
                if shift {
                    wr >>= 1;
                    wi >>= 1;
                }

                let mut i = m;
                while i < n {
                    let k = i + half;
                    let tr = fix_mpy(wr, real[k]).wrapping_sub(fix_mpy(wi, imag[k]));
                    let ti = fix_mpy(wr, imag[k]).wrapping_add(fix_mpy(wi, real[k]));
                    let mut qr = real[i];
                    let mut qi = imag[i];
                    if shift {
                        qr >>= 1;
                        qi >>= 1;
                    }
                    real[k] = qr.wrapping_sub(tr);
                    imag[k] = qi.wrapping_sub(ti);
                    real[i] = qr.wrapping_add(tr);
                    imag[i] = qi.wrapping_add(ti);
                    i += span;
                }
            }
            half = span;
        }

        Ok(scale)
    }
}

/// Reorders both arrays into bit-reversed index order.
fn bit_reverse(real: &mut [i16], imag: &mut [i16]) {
    let n = real.len();
    if n < 2 {
        return;
    }
    let last = n - 1;
    let mut mr = 0usize;
    for m in 1..n {
        let mut l = n;
        loop {
            l >>= 1;
            if mr + l <= last {
                break;
            }
        }
        mr = (mr & (l - 1)) + l;
        if mr > m {
            real.swap(m, mr);
            imag.swap(m, mr);
        }
    }
}

fn needs_headroom(real: &[i16], imag: &[i16]) -> bool {
    real.iter()
        .zip(imag)
        .any(|(r, i)| r.unsigned_abs() > INVERSE_HEADROOM || i.unsigned_abs() > INVERSE_HEADROOM)
}
