//! Native codec for the RLE Lossless transfer syntax
//! (UID `1.2.840.10008.1.2.5`).
//!
//! The encoding is a PackBits-style byte run-length scheme with a fixed
//! framing structure: each compressed frame starts with a 64-byte header
//! of sixteen 4-byte little-endian unsigned integers, where entry 0 holds
//! the segment count and entries `1..=count` hold the byte offset of each
//! segment relative to the end of the header. A *segment* is one
//! compressed byte plane of one sample: a frame is split into
//! `samples_per_pixel * bytes_per_sample` segments, most significant byte
//! first within each sample, and a frame may carry at most 15 segments.
//!
//! This crate is self-contained and deals in plain byte slices;
//! the codec runtime is responsible for descriptor validation and for
//! any endianness correction of the decoded output
//! (segment order is always most-significant-byte-first,
//! regardless of the byte order of the surrounding file).
//!
//! See <https://dicom.nema.org/medical/dicom/2023e/output/chtml/part05/chapter_G.html>

mod decode;
mod encode;

pub use decode::{decode_frame, decode_segment};
pub use encode::{encode_frame, encode_row, encode_segment};

use snafu::{ensure, Snafu};

/// The maximum number of segments per frame allowed by the framing rules.
pub const MAX_SEGMENTS: usize = 15;

/// The length in bytes of the fixed offset header preceding each frame.
pub const HEADER_LEN: usize = 64;

/// The possible error conditions of the RLE codec.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum RleError {
    #[snafu(display(
        "Frame requires {} RLE segments, at most {} are allowed",
        count,
        MAX_SEGMENTS
    ))]
    TooManySegments { count: usize },

    #[snafu(display(
        "Unsupported BitsAllocated {} for RLE, must be 1 or a multiple of 8 up to 64",
        value
    ))]
    UnsupportedBitsAllocated { value: u16 },

    #[snafu(display("1-bit RLE data must have a single sample per pixel, got {}", value))]
    UnsupportedSamplesPerPixel { value: u16 },

    #[snafu(display("Frame length mismatch: got {} bytes, expected {}", actual, expected))]
    FrameLengthMismatch { actual: usize, expected: usize },

    #[snafu(display(
        "Segment of {} bytes cannot be split into rows of {} bytes",
        len,
        row_length
    ))]
    UnalignedRows { len: usize, row_length: usize },

    #[snafu(display(
        "RLE offset header is truncated: got {} bytes, expected at least {}",
        actual,
        HEADER_LEN
    ))]
    TruncatedHeader { actual: usize },

    #[snafu(display(
        "RLE segment count mismatch: header declares {}, layout requires {}",
        actual,
        expected
    ))]
    SegmentCountMismatch { actual: u32, expected: usize },

    #[snafu(display(
        "RLE segment {} offset {} is out of bounds ({} data bytes follow the header)",
        index,
        offset,
        len
    ))]
    SegmentOutOfBounds {
        index: usize,
        offset: u32,
        len: usize,
    },

    #[snafu(display(
        "RLE segment is truncated: run at byte {} needs {} more byte(s)",
        pos,
        missing
    ))]
    TruncatedSegment { pos: usize, missing: usize },

    #[snafu(display(
        "Decoded RLE segment {} length mismatch: got {} bytes, expected {}",
        index,
        actual,
        expected
    ))]
    SegmentLengthMismatch {
        index: usize,
        actual: usize,
        expected: usize,
    },
}

type Result<T, E = RleError> = std::result::Result<T, E>;

/// The frame geometry required to split and reassemble RLE segments.
///
/// Constructing a layout checks the framing invariants up front,
/// so that encoding can never emit partial output for a frame
/// which would exceed the segment budget.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RleLayout {
    rows: u16,
    columns: u16,
    samples_per_pixel: u16,
    bits_allocated: u16,
}

impl RleLayout {
    /// Create a layout, checking the segment budget and bit depth rules.
    pub fn new(
        rows: u16,
        columns: u16,
        samples_per_pixel: u16,
        bits_allocated: u16,
    ) -> Result<Self> {
        ensure!(
            bits_allocated == 1 || (bits_allocated % 8 == 0 && bits_allocated <= 64),
            UnsupportedBitsAllocatedSnafu {
                value: bits_allocated
            }
        );
        if bits_allocated == 1 {
            ensure!(
                samples_per_pixel == 1,
                UnsupportedSamplesPerPixelSnafu {
                    value: samples_per_pixel
                }
            );
        }
        let layout = RleLayout {
            rows,
            columns,
            samples_per_pixel,
            bits_allocated,
        };
        let count = layout.segment_count();
        ensure!(count <= MAX_SEGMENTS, TooManySegmentsSnafu { count });
        Ok(layout)
    }

    /// Number of bytes holding one sample value in the uncompressed frame.
    pub fn bytes_per_sample(&self) -> usize {
        if self.bits_allocated == 1 {
            1
        } else {
            self.bits_allocated as usize / 8
        }
    }

    /// Number of segments a frame splits into.
    pub fn segment_count(&self) -> usize {
        self.samples_per_pixel as usize * self.bytes_per_sample()
    }

    /// Uncompressed length of one segment in bytes.
    ///
    /// For 1-bit data the frame is a single segment of packed bits.
    pub fn segment_length(&self) -> usize {
        let pixels = self.rows as usize * self.columns as usize;
        if self.bits_allocated == 1 {
            (pixels + 7) / 8
        } else {
            pixels
        }
    }

    /// Uncompressed length of the whole frame in bytes.
    pub fn frame_length(&self) -> usize {
        self.segment_length() * self.segment_count()
    }

    /// Length in bytes of one uncompressed row within a segment.
    ///
    /// Runs never cross this boundary. Packed 1-bit segments are
    /// treated as a single row, since their rows are not byte aligned.
    pub fn row_length(&self) -> usize {
        if self.bits_allocated == 1 {
            self.segment_length()
        } else {
            self.columns as usize
        }
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn samples_per_pixel(&self) -> u16 {
        self.samples_per_pixel
    }

    pub fn bits_allocated(&self) -> u16 {
        self.bits_allocated
    }
}
