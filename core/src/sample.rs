//! The sample container width model.
//!
//! A *container* is the number of bytes physically holding one sample
//! value, independently of how many bits of it are significant.
//! Compression backends operate on tightly packed samples, whose
//! container is implied by *bits stored*; native buffers use the
//! container implied by *bits allocated*.

/// Number of bytes used to hold a single sample value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SampleWidth {
    /// 1-byte container, for bit depths in `1..=8`
    One = 1,
    /// 2-byte container, for bit depths in `9..=16`
    Two = 2,
    /// 4-byte container, for bit depths in `17..=32`
    Four = 4,
    /// 8-byte container, for bit depths in `33..=64`
    Eight = 8,
}

impl SampleWidth {
    /// The smallest container which can hold `bits` significant bits,
    /// or `None` when `bits` is 0 or above 64.
    pub fn for_bits(bits: u16) -> Option<SampleWidth> {
        match bits {
            1..=8 => Some(SampleWidth::One),
            9..=16 => Some(SampleWidth::Two),
            17..=32 => Some(SampleWidth::Four),
            33..=64 => Some(SampleWidth::Eight),
            _ => None,
        }
    }

    /// The container size in bytes.
    pub fn bytes(self) -> usize {
        self as usize
    }
}
