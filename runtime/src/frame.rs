//! Frame slicing and sample layout normalization.
//!
//! Codec plugins and the native decoding path both deal in whole frames
//! of interleaved little-endian samples. The helpers here carve single
//! frames out of a flat pixel data buffer and undo the on-disk layout
//! variations a native frame may carry: big-endian sample values,
//! 1-bit packing, horizontal chroma subsampling and plane-major
//! sample order.

use crate::error::{decode_error, encode_error, DecodeResult, EncodeResult};
use crate::runner::Runner;
use pixelcodec_core::byteordered::Endianness;
use pixelcodec_core::{LengthUnit, PhotometricInterpretation, PlanarConfiguration};
use snafu::ensure;
use std::borrow::Cow;

/// Borrow one frame out of a flat, byte-aligned pixel data buffer,
/// at the container width implied by _Bits Stored_.
///
/// The buffer must hold a whole number of frames; a trailing remainder
/// is a framing error. Extra whole frames beyond the declared count are
/// accepted with a warning. When the source container is wider than the
/// stored container, the low-order bytes of every sample are copied out
/// and the view is downgraded to an owned buffer.
pub(crate) fn get_frame<'a>(
    src: &'a [u8],
    frame: usize,
    runner: &Runner,
) -> EncodeResult<Cow<'a, [u8]>> {
    let frame_length = runner.descriptor().frame_length(LengthUnit::Bytes)?;
    ensure!(
        frame_length > 0 && src.len() % frame_length == 0,
        encode_error::FrameLengthMismatchSnafu {
            actual: src.len(),
            expected: frame_length,
        }
    );
    let available = src.len() / frame_length;
    let declared = runner.descriptor().number_of_frames() as usize;
    if available > declared {
        tracing::warn!(
            "pixel data holds {} frames, {} declared",
            available,
            declared
        );
    }
    ensure!(
        frame < available,
        encode_error::FrameRangeOutOfBoundsSnafu { frame, available }
    );
    let data = &src[frame * frame_length..(frame + 1) * frame_length];

    let allocated = runner.allocated_width()?.bytes();
    let stored = runner.stored_width()?.bytes();
    if stored >= allocated || runner.descriptor().bits_allocated()? == 1 {
        return Ok(Cow::Borrowed(data));
    }
    tracing::warn!(
        "copying frame {} to narrow samples from {} to {} byte(s)",
        frame,
        allocated,
        stored
    );
    Ok(Cow::Owned(narrow_container(data, allocated, stored)))
}

/// Keep the low-order `to_width` bytes of every `from_width`-byte
/// sample, little endian.
pub(crate) fn narrow_container(frame: &[u8], from_width: usize, to_width: usize) -> Vec<u8> {
    debug_assert!(to_width < from_width);
    let mut out = Vec::with_capacity(frame.len() / from_width * to_width);
    for sample in frame.chunks_exact(from_width) {
        out.extend_from_slice(&sample[..to_width]);
    }
    out
}

/// Swap the byte order of every sample value in place.
pub(crate) fn swap_endianness(buf: &mut [u8], bytes_per_sample: usize) {
    if bytes_per_sample < 2 {
        return;
    }
    for chunk in buf.chunks_exact_mut(bytes_per_sample) {
        chunk.reverse();
    }
}

/// Unpack 1-bit samples into one byte per pixel (0 or 1).
///
/// `bit_offset` addresses the first sample within `packed`,
/// counting from the least significant bit of each byte.
pub(crate) fn unpack_bits(packed: &[u8], bit_offset: usize, pixels: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels);
    for i in 0..pixels {
        let bit = bit_offset + i;
        out.push((packed[bit / 8] >> (bit % 8)) & 1);
    }
    out
}

/// Expand YBR_FULL_422 groups back to one full YCbCr triplet per pixel.
///
/// On disk every two horizontally adjacent pixels share their chroma
/// pair: `Y1 Y2 Cb Cr` becomes `Y1 Cb Cr Y2 Cb Cr`.
pub(crate) fn upsample_ybr422(frame: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len() / 2 * 3);
    for group in frame.chunks_exact(4) {
        out.extend_from_slice(&[group[0], group[2], group[3]]);
        out.extend_from_slice(&[group[1], group[2], group[3]]);
    }
    out
}

/// Reorder a plane-major frame into interleaved sample order.
pub(crate) fn interleave_planes(
    frame: &[u8],
    samples: usize,
    bytes_per_sample: usize,
) -> Vec<u8> {
    let plane_len = frame.len() / samples;
    let pixels = plane_len / bytes_per_sample;
    let mut out = vec![0u8; frame.len()];
    for sample in 0..samples {
        let plane = &frame[sample * plane_len..(sample + 1) * plane_len];
        for pixel in 0..pixels {
            let src = &plane[pixel * bytes_per_sample..(pixel + 1) * bytes_per_sample];
            let at = (pixel * samples + sample) * bytes_per_sample;
            out[at..at + bytes_per_sample].copy_from_slice(src);
        }
    }
    out
}

/// Reorder an interleaved frame into plane-major sample order.
pub(crate) fn planarize(frame: &[u8], samples: usize, bytes_per_sample: usize) -> Vec<u8> {
    let plane_len = frame.len() / samples;
    let pixels = plane_len / bytes_per_sample;
    let mut out = vec![0u8; frame.len()];
    for sample in 0..samples {
        let plane = &mut out[sample * plane_len..(sample + 1) * plane_len];
        for pixel in 0..pixels {
            let at = (pixel * samples + sample) * bytes_per_sample;
            plane[pixel * bytes_per_sample..(pixel + 1) * bytes_per_sample]
                .copy_from_slice(&frame[at..at + bytes_per_sample]);
        }
    }
    out
}

/// Widen samples from one container width to another, little endian.
///
/// Signed values are sign extended; unsigned values are zero extended.
pub(crate) fn expand_container(
    frame: &[u8],
    from_width: usize,
    to_width: usize,
    signed: bool,
) -> Vec<u8> {
    debug_assert!(to_width > from_width);
    let mut out = Vec::with_capacity(frame.len() / from_width * to_width);
    for sample in frame.chunks_exact(from_width) {
        out.extend_from_slice(sample);
        let fill = if signed && sample[from_width - 1] & 0x80 != 0 {
            0xFF
        } else {
            0x00
        };
        out.resize(out.len() + (to_width - from_width), fill);
    }
    out
}

/// Extract one native frame and normalize it to interleaved,
/// little-endian samples at the allocated container width
/// (1-bit data is unpacked to one byte per pixel).
pub(crate) fn normalize_native_frame(
    src: &[u8],
    frame: usize,
    available: usize,
    runner: &Runner,
) -> DecodeResult<Vec<u8>> {
    let descriptor = runner.descriptor();
    ensure!(
        frame < available,
        decode_error::FrameRangeOutOfBoundsSnafu { frame, available }
    );

    let bits_allocated = descriptor.bits_allocated()? as usize;
    if bits_allocated == 1 {
        // native 1-bit frames are packed across byte boundaries
        let bits = descriptor.frame_length_bits()?;
        return Ok(unpack_bits(src, frame * bits, bits));
    }

    let frame_length = descriptor.frame_length(LengthUnit::Bytes)?;
    let mut out = src[frame * frame_length..(frame + 1) * frame_length].to_vec();

    let bytes_per_sample = bits_allocated / 8;
    if descriptor.transfer_syntax().endianness() == Endianness::Big {
        swap_endianness(&mut out, bytes_per_sample);
    }

    if descriptor.photometric_interpretation()? == PhotometricInterpretation::YbrFull422 {
        out = upsample_ybr422(&out);
    } else if descriptor.planar_configuration()? == PlanarConfiguration::Planar {
        let samples = descriptor.samples_per_pixel()? as usize;
        out = interleave_planes(&out, samples, bytes_per_sample);
    }

    // chroma upsampling works in whole 4-byte groups, so a frame with
    // an odd sample count comes up short here instead of shrinking
    let expected = descriptor.frame_length(LengthUnit::Pixels)? * bytes_per_sample;
    ensure!(
        out.len() == expected,
        decode_error::FrameLengthMismatchSnafu {
            actual: out.len(),
            expected,
        }
    );
    Ok(out)
}

/// Check and normalize a plugin-decoded frame to the allocated width.
///
/// Codecs may legitimately emit samples at the stored container width;
/// such frames are widened back to the allocated width. Anything else
/// is a length mismatch.
pub(crate) fn normalize_encapsulated_frame(
    decoded: Vec<u8>,
    runner: &Runner,
) -> DecodeResult<Vec<u8>> {
    let descriptor = runner.descriptor();
    let pixels = descriptor.frame_length(LengthUnit::Pixels)?;
    let allocated = runner.allocated_width()?.bytes();
    if decoded.len() == pixels * allocated {
        return Ok(decoded);
    }
    let stored = runner.stored_width()?.bytes();
    if stored != allocated && decoded.len() == pixels * stored {
        let signed = descriptor.pixel_keyword().is_integer()
            && descriptor.pixel_representation()?
                == pixelcodec_core::PixelRepresentation::Signed;
        return Ok(expand_container(&decoded, stored, allocated, signed));
    }
    decode_error::FrameLengthMismatchSnafu {
        actual: decoded.len(),
        expected: pixels * allocated,
    }
    .fail()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_reverses_sample_chunks() {
        let mut buf = [1u8, 2, 3, 4];
        swap_endianness(&mut buf, 2);
        assert_eq!(buf, [2, 1, 4, 3]);

        let mut buf = [1u8, 2, 3, 4];
        swap_endianness(&mut buf, 1);
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn unpack_bits_lsb_first() {
        // 0b0000_0101: pixels 1, 0, 1, 0, ...
        assert_eq!(unpack_bits(&[0b0000_0101], 0, 4), vec![1, 0, 1, 0]);
        // offset into the second byte
        assert_eq!(unpack_bits(&[0x00, 0b0000_0011], 8, 3), vec![1, 1, 0]);
        // offset crossing a byte boundary
        assert_eq!(unpack_bits(&[0b1000_0000, 0b0000_0001], 7, 2), vec![1, 1]);
    }

    #[test]
    fn ybr_422_upsampling() {
        let frame = [10, 20, 128, 130, 30, 40, 131, 132];
        assert_eq!(
            upsample_ybr422(&frame),
            vec![10, 128, 130, 20, 128, 130, 30, 131, 132, 40, 131, 132]
        );
    }

    #[test]
    fn plane_order_round_trip() {
        // 3 pixels of RGB, 8-bit
        let interleaved = [1u8, 2, 3, 4, 5, 6, 7, 8, 9];
        let planar = planarize(&interleaved, 3, 1);
        assert_eq!(planar, vec![1, 4, 7, 2, 5, 8, 3, 6, 9]);
        assert_eq!(interleave_planes(&planar, 3, 1), interleaved);

        // 2 pixels of RGB, 16-bit
        let interleaved: Vec<u8> = (1..=12).collect();
        let planar = planarize(&interleaved, 3, 2);
        assert_eq!(planar, vec![1, 2, 7, 8, 3, 4, 9, 10, 5, 6, 11, 12]);
        assert_eq!(interleave_planes(&planar, 3, 2), interleaved);
    }

    #[test]
    fn frames_already_at_the_stored_width_are_borrowed() {
        use crate::runner::{CodecOptions, Runner};
        use pixelcodec_core::{
            transfer_syntax, ImageDescriptor, PixelKeyword, PixelRepresentation,
        };

        let mono = |bits_allocated: u16, bits_stored: u16| {
            ImageDescriptor::new(&transfer_syntax::RLE_LOSSLESS, PixelKeyword::PixelData)
                .with_rows(2)
                .with_columns(2)
                .with_bits_allocated(bits_allocated)
                .with_bits_stored(bits_stored)
                .with_samples_per_pixel(1)
                .with_pixel_representation(PixelRepresentation::Unsigned)
                .with_photometric_interpretation(PhotometricInterpretation::Monochrome2)
        };

        // stored and allocated widths agree: the frame is a plain view
        let descriptor = mono(16, 16);
        let runner = Runner::for_encoding(&descriptor, CodecOptions::new()).unwrap();
        let src = [1u8, 0, 2, 0, 3, 0, 4, 0];
        let frame = get_frame(&src, 0, &runner).unwrap();
        assert!(matches!(frame, Cow::Borrowed(_)));
        assert_eq!(frame.as_ref(), &src);

        // fewer stored bits within the same container are also a view
        let descriptor = mono(16, 12);
        let runner = Runner::for_encoding(&descriptor, CodecOptions::new()).unwrap();
        let frame = get_frame(&src, 0, &runner).unwrap();
        assert!(matches!(frame, Cow::Borrowed(_)));
        assert_eq!(frame.as_ref(), &src);

        // a wider container is copied down to the stored width
        let descriptor = mono(32, 16);
        let runner = Runner::for_encoding(&descriptor, CodecOptions::new()).unwrap();
        let src = [1u8, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0];
        let frame = get_frame(&src, 0, &runner).unwrap();
        assert!(matches!(frame, Cow::Owned(_)));
        assert_eq!(frame.as_ref(), &[1, 0, 2, 0, 3, 0, 4, 0]);
    }

    #[test]
    fn narrowing_keeps_the_low_order_bytes() {
        assert_eq!(
            narrow_container(&[1, 2, 3, 4, 5, 6, 7, 8], 4, 2),
            vec![1, 2, 5, 6]
        );
    }

    #[test]
    fn container_expansion_extends_the_sign() {
        // unsigned: zero extension
        assert_eq!(
            expand_container(&[0x01, 0xFF], 1, 2, false),
            vec![0x01, 0x00, 0xFF, 0x00]
        );
        // signed: 0xFF is -1 and keeps its value
        assert_eq!(
            expand_container(&[0x01, 0xFF], 1, 2, true),
            vec![0x01, 0x00, 0xFF, 0xFF]
        );
    }
}
