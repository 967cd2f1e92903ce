//! RLE decoding: reverse PackBits and segment reassembly.

use crate::{
    Result, RleLayout, SegmentCountMismatchSnafu, SegmentLengthMismatchSnafu,
    SegmentOutOfBoundsSnafu, TruncatedHeaderSnafu, TruncatedSegmentSnafu, HEADER_LEN,
};
use byteorder::{ByteOrder, LittleEndian};
use snafu::ensure;

/// Decode a single RLE segment into raw plane bytes.
///
/// Control byte semantics: `0..=127` copies that many + 1 literal bytes;
/// `-1..=-127` (two's complement) replicates the next byte `1 - control`
/// times; `-128` is a no-op with no data byte following it.
pub fn decode_segment(src: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(src.len() * 2);
    let mut pos = 0;
    while pos < src.len() {
        let control = src[pos] as i8;
        pos += 1;
        if control >= 0 {
            let len = control as usize + 1;
            ensure!(
                pos + len <= src.len(),
                TruncatedSegmentSnafu {
                    pos: pos - 1,
                    missing: pos + len - src.len(),
                }
            );
            out.extend_from_slice(&src[pos..pos + len]);
            pos += len;
        } else if control != -128 {
            let len = (1 - i32::from(control)) as usize;
            ensure!(
                pos < src.len(),
                TruncatedSegmentSnafu {
                    pos: pos - 1,
                    missing: 1usize,
                }
            );
            let new_len = out.len() + len;
            out.resize(new_len, src[pos]);
            pos += 1;
        }
        // control == -128 is a no-op
    }
    Ok(out)
}

/// Decode a framed RLE byte stream back into an uncompressed frame.
///
/// Segments are located through the offset header, decoded, and the
/// per-sample byte planes are interleaved back into packed pixel order
/// in little endian. Callers are responsible for any further endianness
/// correction: segment order is most-significant-byte-first regardless
/// of the byte order of the surrounding file.
pub fn decode_frame(fragment: &[u8], layout: &RleLayout) -> Result<Vec<u8>> {
    ensure!(
        fragment.len() >= HEADER_LEN,
        TruncatedHeaderSnafu {
            actual: fragment.len()
        }
    );
    let declared = LittleEndian::read_u32(&fragment[0..4]);
    let expected = layout.segment_count();
    ensure!(
        declared as usize == expected,
        SegmentCountMismatchSnafu {
            actual: declared,
            expected,
        }
    );

    let data = &fragment[HEADER_LEN..];
    let mut offsets = Vec::with_capacity(expected + 1);
    for i in 0..expected {
        offsets.push(LittleEndian::read_u32(&fragment[4 * (i + 1)..4 * (i + 2)]));
    }
    offsets.push(data.len() as u32);
    for i in 0..expected {
        ensure!(
            offsets[i] <= offsets[i + 1] && offsets[i] as usize <= data.len(),
            SegmentOutOfBoundsSnafu {
                index: i,
                offset: offsets[i],
                len: data.len(),
            }
        );
    }

    let samples = layout.samples_per_pixel() as usize;
    let bytes_per_sample = layout.bytes_per_sample();
    let unit = samples * bytes_per_sample;
    let segment_length = layout.segment_length();

    let mut dst = vec![0u8; layout.frame_length()];
    for sample in 0..samples {
        for segment_number in 0..bytes_per_sample {
            let index = sample * bytes_per_sample + segment_number;
            let segment = &data[offsets[index] as usize..offsets[index + 1] as usize];
            let decoded = decode_segment(segment)?;
            ensure!(
                decoded.len() == segment_length,
                SegmentLengthMismatchSnafu {
                    index,
                    actual: decoded.len(),
                    expected: segment_length,
                }
            );
            // segment 0 carried the most significant byte
            let byte_pos = sample * bytes_per_sample + (bytes_per_sample - 1 - segment_number);
            for (pixel, value) in decoded.iter().enumerate() {
                dst[pixel * unit + byte_pos] = *value;
            }
        }
    }
    Ok(dst)
}
