//! RLE encoding: PackBits rows, byte-plane segments, framed output.

use crate::{
    FrameLengthMismatchSnafu, Result, RleLayout, UnalignedRowsSnafu, HEADER_LEN,
};
use byteorder::{ByteOrder, LittleEndian};
use snafu::ensure;

// the longest run a single control byte can describe
const MAX_RUN: usize = 128;

/// Encode one row of samples with the PackBits scheme.
///
/// The output alternates literal runs (control byte `0..=127`, followed
/// by that many + 1 literal bytes) and replicate runs (control byte
/// `-1..=-127` in two's complement, followed by the repeated byte).
/// A replicate run is preferred as soon as two identical bytes are seen,
/// and runs longer than 128 bytes are split into consecutive maximal
/// runs. Empty input encodes to an empty output.
pub fn encode_row(row: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(row.len() + row.len() / MAX_RUN + 1);
    let mut i = 0;
    while i < row.len() {
        let byte = row[i];
        // measure the replicate run starting here
        let mut run = 1;
        while run < MAX_RUN && i + run < row.len() && row[i + run] == byte {
            run += 1;
        }
        if run >= 2 {
            out.push((257 - run) as u8); // -(run - 1) in two's complement
            out.push(byte);
            i += run;
        } else {
            // literal run: stop as soon as a replicate run begins
            let start = i;
            i += 1;
            while i < row.len() && i - start < MAX_RUN {
                if i + 1 < row.len() && row[i] == row[i + 1] {
                    break;
                }
                i += 1;
            }
            out.push((i - start - 1) as u8);
            out.extend_from_slice(&row[start..i]);
        }
    }
    out
}

/// Encode one byte plane as a single RLE segment.
///
/// `row_length` is the number of bytes per row within the plane.
/// Each row is encoded independently: a run never crosses a row seam,
/// even when the adjacent byte values match.
pub fn encode_segment(plane: &[u8], row_length: usize) -> Result<Vec<u8>> {
    ensure!(
        row_length > 0 && plane.len() % row_length == 0,
        UnalignedRowsSnafu {
            len: plane.len(),
            row_length,
        }
    );
    let mut out = Vec::with_capacity(plane.len() / 2 + 2);
    for row in plane.chunks_exact(row_length) {
        out.extend_from_slice(&encode_row(row));
    }
    Ok(out)
}

/// Encode one uncompressed frame into a framed RLE byte stream.
///
/// The frame is split into `samples_per_pixel * bytes_per_sample`
/// byte planes, most significant byte first within each sample
/// (the input is expected in little endian, interleaved order),
/// each plane is encoded with [`encode_segment`], and the segments
/// are assembled behind the 64-byte offset header.
pub fn encode_frame(frame: &[u8], layout: &RleLayout) -> Result<Vec<u8>> {
    ensure!(
        frame.len() == layout.frame_length(),
        FrameLengthMismatchSnafu {
            actual: frame.len(),
            expected: layout.frame_length(),
        }
    );

    let samples = layout.samples_per_pixel() as usize;
    let bytes_per_sample = layout.bytes_per_sample();
    let unit = samples * bytes_per_sample;
    let row_length = layout.row_length();

    let mut segments = Vec::with_capacity(layout.segment_count());
    let mut plane = vec![0u8; layout.segment_length()];
    for sample in 0..samples {
        for segment_number in 0..bytes_per_sample {
            // segment 0 carries the most significant byte
            let byte_pos = sample * bytes_per_sample + (bytes_per_sample - 1 - segment_number);
            for (pixel, value) in plane.iter_mut().enumerate() {
                *value = frame[pixel * unit + byte_pos];
            }
            segments.push(encode_segment(&plane, row_length)?);
        }
    }

    let total: usize = segments.iter().map(Vec::len).sum();
    let mut out = vec![0u8; HEADER_LEN];
    LittleEndian::write_u32(&mut out[0..4], segments.len() as u32);
    let mut offset = 0u32;
    for (i, segment) in segments.iter().enumerate() {
        // offsets are relative to the end of the header
        LittleEndian::write_u32(&mut out[4 * (i + 1)..4 * (i + 2)], offset);
        offset += segment.len() as u32;
    }
    out.reserve(total);
    for segment in &segments {
        out.extend_from_slice(segment);
    }
    Ok(out)
}
