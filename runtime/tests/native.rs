//! Decoding of native (non-encapsulated) pixel data.

use ndarray::ArrayD;
use pixelcodec_core::{
    transfer_syntax, ImageDescriptor, PhotometricInterpretation, PixelKeyword,
    PixelRepresentation, PlanarConfiguration, TransferSyntax,
};
use pixelcodec_runtime::{get_decoder, CodecOptions, DecodeError, PixelSource};

fn mono(ts: &'static TransferSyntax, bits: u16) -> ImageDescriptor {
    ImageDescriptor::new(ts, PixelKeyword::PixelData)
        .with_rows(2)
        .with_columns(2)
        .with_bits_allocated(bits)
        .with_bits_stored(bits)
        .with_samples_per_pixel(1)
        .with_pixel_representation(PixelRepresentation::Unsigned)
        .with_photometric_interpretation(PhotometricInterpretation::Monochrome2)
}

#[test]
fn little_endian_frames_pass_through() {
    let descriptor = mono(&transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN, 16);
    let src = [1u8, 0, 2, 0, 3, 0, 4, 0];
    let decoder = get_decoder("1.2.840.10008.1.2.1").unwrap();
    let decoded = decoder
        .decode(&descriptor, &PixelSource::Native(&src), CodecOptions::new())
        .unwrap();
    assert_eq!(decoded, src);
}

#[test]
fn big_endian_samples_are_swapped() {
    let descriptor = mono(&transfer_syntax::EXPLICIT_VR_BIG_ENDIAN, 16);
    // 0x0102, 0x0304, 0x0506, 0x0708 in big endian
    let src = [1u8, 2, 3, 4, 5, 6, 7, 8];
    let decoder = get_decoder("1.2.840.10008.1.2.2").unwrap();
    let decoded = decoder
        .decode(&descriptor, &PixelSource::Native(&src), CodecOptions::new())
        .unwrap();
    assert_eq!(decoded, [2, 1, 4, 3, 6, 5, 8, 7]);
}

#[test]
fn one_bit_frames_unpack_across_byte_boundaries() {
    // 3 frames of 2x2 at 1 bit: 12 bits in 2 bytes
    let descriptor = mono(&transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN, 1)
        .with_number_of_frames(3);
    // bits, LSB first: frame 0 = 1,0,1,1  frame 1 = 0,0,1,0  frame 2 = 1,1,0,1
    let src = [0b0100_1101u8, 0b0000_1011];
    let decoder = get_decoder("1.2.840.10008.1.2.1").unwrap();

    let frame0 = decoder
        .decode_frame(
            &descriptor,
            &PixelSource::Native(&src),
            0,
            CodecOptions::new(),
        )
        .unwrap();
    assert_eq!(frame0, [1, 0, 1, 1]);
    let frame1 = decoder
        .decode_frame(
            &descriptor,
            &PixelSource::Native(&src),
            1,
            CodecOptions::new(),
        )
        .unwrap();
    assert_eq!(frame1, [0, 0, 1, 0]);
    let frame2 = decoder
        .decode_frame(
            &descriptor,
            &PixelSource::Native(&src),
            2,
            CodecOptions::new(),
        )
        .unwrap();
    assert_eq!(frame2, [1, 1, 0, 1]);
}

#[test]
fn planar_color_is_interleaved() {
    let descriptor = ImageDescriptor::new(
        &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
        PixelKeyword::PixelData,
    )
    .with_rows(1)
    .with_columns(3)
    .with_bits_allocated(8)
    .with_bits_stored(8)
    .with_samples_per_pixel(3)
    .with_pixel_representation(PixelRepresentation::Unsigned)
    .with_photometric_interpretation(PhotometricInterpretation::Rgb)
    .with_planar_configuration(PlanarConfiguration::Planar);

    // R plane, G plane, B plane
    let src = [1u8, 4, 7, 2, 5, 8, 3, 6, 9];
    let decoder = get_decoder("1.2.840.10008.1.2.1").unwrap();
    let decoded = decoder
        .decode(&descriptor, &PixelSource::Native(&src), CodecOptions::new())
        .unwrap();
    assert_eq!(decoded, [1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn ybr_422_chroma_is_upsampled() {
    let descriptor = ImageDescriptor::new(
        &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
        PixelKeyword::PixelData,
    )
    .with_rows(1)
    .with_columns(4)
    .with_bits_allocated(8)
    .with_bits_stored(8)
    .with_samples_per_pixel(3)
    .with_pixel_representation(PixelRepresentation::Unsigned)
    .with_photometric_interpretation(PhotometricInterpretation::YbrFull422)
    .with_planar_configuration(PlanarConfiguration::Interleaved);

    // two groups of Y1 Y2 Cb Cr covering 4 pixels
    let src = [10u8, 20, 128, 130, 30, 40, 131, 132];
    let decoder = get_decoder("1.2.840.10008.1.2.1").unwrap();
    let decoded = decoder
        .decode(&descriptor, &PixelSource::Native(&src), CodecOptions::new())
        .unwrap();
    assert_eq!(
        decoded,
        [10, 128, 130, 20, 128, 130, 30, 131, 132, 40, 131, 132]
    );
}

#[test]
fn excess_native_frames_follow_the_options() {
    let descriptor = mono(&transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN, 8)
        .with_number_of_frames(1);
    // two whole frames, one declared
    let src = [1u8, 2, 3, 4, 5, 6, 7, 8];
    let decoder = get_decoder("1.2.840.10008.1.2.1").unwrap();

    let decoded = decoder
        .decode(&descriptor, &PixelSource::Native(&src), CodecOptions::new())
        .unwrap();
    assert_eq!(decoded, src);

    let decoded = decoder
        .decode(
            &descriptor,
            &PixelSource::Native(&src),
            CodecOptions::new().reject_excess_frames(),
        )
        .unwrap();
    assert_eq!(decoded, [1, 2, 3, 4]);

    // a frame index past the clamped range is out of bounds
    assert!(matches!(
        decoder.decode_frame(
            &descriptor,
            &PixelSource::Native(&src),
            1,
            CodecOptions::new().reject_excess_frames(),
        ),
        Err(DecodeError::FrameRangeOutOfBounds {
            frame: 1,
            available: 1
        })
    ));
}

#[test]
fn truncated_native_buffers_are_rejected() {
    let descriptor = mono(&transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN, 16);
    let decoder = get_decoder("1.2.840.10008.1.2.1").unwrap();

    // 6 bytes cannot hold an 8-byte frame
    let err = decoder
        .decode(
            &descriptor,
            &PixelSource::Native(&[0u8; 6]),
            CodecOptions::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::FrameLengthMismatch {
            actual: 6,
            expected: 8
        }
    ));

    // an empty buffer is not a zero-frame source
    let err = decoder
        .decode(&descriptor, &PixelSource::Native(&[]), CodecOptions::new())
        .unwrap_err();
    assert!(matches!(err, DecodeError::FrameLengthMismatch { .. }));
}

#[test]
fn misaligned_native_buffers_are_rejected() {
    let descriptor =
        mono(&transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN, 16).with_number_of_frames(2);
    // one and a half 8-byte frames: the tail must not be dropped
    let src = [0u8; 12];
    let decoder = get_decoder("1.2.840.10008.1.2.1").unwrap();
    let err = decoder
        .decode(&descriptor, &PixelSource::Native(&src), CodecOptions::new())
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::FrameLengthMismatch {
            actual: 12,
            expected: 8
        }
    ));

    // the same goes for single-frame access past the whole frames
    let err = decoder
        .decode_frame(
            &descriptor,
            &PixelSource::Native(&src),
            0,
            CodecOptions::new(),
        )
        .unwrap_err();
    assert!(matches!(err, DecodeError::FrameLengthMismatch { .. }));
}

#[test]
fn ybr_422_with_odd_columns_is_a_length_error() {
    let descriptor = ImageDescriptor::new(
        &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
        PixelKeyword::PixelData,
    )
    .with_rows(1)
    .with_columns(3)
    .with_bits_allocated(8)
    .with_bits_stored(8)
    .with_samples_per_pixel(3)
    .with_pixel_representation(PixelRepresentation::Unsigned)
    .with_photometric_interpretation(PhotometricInterpretation::YbrFull422)
    .with_planar_configuration(PlanarConfiguration::Interleaved);

    // 3 subsampled pixels take 6 bytes, which is not a whole number
    // of Y1 Y2 Cb Cr groups; upsampling must not shorten the frame
    let src = [10u8, 20, 128, 130, 30, 40];
    let decoder = get_decoder("1.2.840.10008.1.2.1").unwrap();
    let err = decoder
        .decode(&descriptor, &PixelSource::Native(&src), CodecOptions::new())
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::FrameLengthMismatch {
            actual: 6,
            expected: 9
        }
    ));
}

#[test]
fn iter_frames_keeps_going_after_a_failure() {
    let descriptor = mono(&transfer_syntax::RLE_LOSSLESS, 8).with_number_of_frames(2);
    let layout = pixelcodec_rle::RleLayout::new(2, 2, 1, 8).unwrap();
    let good = pixelcodec_rle::encode_frame(&[1, 1, 2, 3], &layout).unwrap();
    // second fragment is garbage, third is valid again
    let fragments = vec![good.clone(), vec![0u8; 3], good];

    let decoder = get_decoder("1.2.840.10008.1.2.5").unwrap();
    let results: Vec<_> = decoder
        .iter_frames(
            &descriptor,
            PixelSource::Fragments(&fragments),
            CodecOptions::new(),
        )
        .unwrap()
        .collect();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap(), &vec![1, 1, 2, 3]);
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap(), &vec![1, 1, 2, 3]);
}

#[test]
fn decode_to_a_volume() {
    let descriptor = mono(&transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN, 16)
        .with_number_of_frames(2)
        .with_pixel_representation(PixelRepresentation::Signed);
    // -1 and small positives, two frames
    let src = [
        0xFFu8, 0xFF, 2, 0, 3, 0, 4, 0, // frame 0
        5, 0, 6, 0, 7, 0, 0xFE, 0xFF, // frame 1
    ];
    let decoder = get_decoder("1.2.840.10008.1.2.1").unwrap();
    let volume: ArrayD<i32> = decoder
        .decode_ndarray(&descriptor, &PixelSource::Native(&src), CodecOptions::new())
        .unwrap();
    // the singleton sample axis is dropped
    assert_eq!(volume.shape(), &[2, 2, 2]);
    assert_eq!(volume[[0, 0, 0]], -1);
    assert_eq!(volume[[1, 1, 1]], -2);
}

#[test]
fn iter_ndarray_yields_one_array_per_frame() {
    let descriptor = mono(&transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN, 16)
        .with_number_of_frames(2)
        .with_pixel_representation(PixelRepresentation::Signed);
    let src = [
        0xFFu8, 0xFF, 2, 0, 3, 0, 4, 0, // frame 0
        5, 0, 6, 0, 7, 0, 0xFE, 0xFF, // frame 1
    ];
    let decoder = get_decoder("1.2.840.10008.1.2.1").unwrap();
    let iter = decoder
        .iter_ndarray::<i32>(&descriptor, PixelSource::Native(&src), CodecOptions::new())
        .unwrap();
    assert_eq!(iter.frame_count(), 2);
    let frames: Vec<ArrayD<i32>> = iter.map(|f| f.unwrap()).collect();
    assert_eq!(frames.len(), 2);
    // per-frame arrays drop the frame axis too
    assert_eq!(frames[0].shape(), &[2, 2]);
    assert_eq!(frames[0][[0, 0]], -1);
    assert_eq!(frames[1][[1, 1]], -2);
}

#[test]
fn validation_runs_before_decoding() {
    let descriptor = mono(&transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN, 12);
    let decoder = get_decoder("1.2.840.10008.1.2.1").unwrap();
    let err = decoder
        .decode(
            &descriptor,
            &PixelSource::Native(&[0u8; 6]),
            CodecOptions::new(),
        )
        .unwrap_err();
    assert!(matches!(err, DecodeError::Descriptor { .. }));
}
