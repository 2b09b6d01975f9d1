use thiserror::Error;

/// Errors raised by the spectrum core. None of them depend on sample values:
/// they come from negotiation, configuration, or a misconfigured transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpectrumError {
    #[error("unsupported channel count {0} (expected 1 or 2)")]
    UnsupportedChannels(u32),

    #[error("unsupported sample rate {0} Hz")]
    UnsupportedRate(u32),

    #[error("stream has not been negotiated yet")]
    NotNegotiated,

    #[error("width {width} outside the supported range [1, {max}]")]
    WidthOutOfRange { width: usize, max: usize },

    #[error("transform size 2^{log2_len} is not supported (max 2^{max})")]
    TransformConfig { log2_len: u32, max: u32 },

    #[error("transform buffers must hold {expected} values (got {real} real, {imag} imaginary)")]
    BufferLength {
        expected: usize,
        real: usize,
        imag: usize,
    },
}
