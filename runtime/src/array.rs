//! Conversion between raw sample bytes and `ndarray` volumes.
//!
//! Arrays are exchanged in `[frames, rows, columns, samples]` order.
//! On the way in, 2-dimensional (`[rows, columns]`) and 3-dimensional
//! (`[frames, rows, columns]` or `[rows, columns, samples]`) arrays are
//! accepted as well, as long as every axis agrees with the descriptor.

use crate::error::{decode_error, encode_error, DecodeResult, EncodeResult};
use crate::runner::Runner;
use byteorder::{ByteOrder, LittleEndian};
use ndarray::{ArrayD, IxDyn};
use num_traits::NumCast;
use pixelcodec_core::{PixelKeyword, PixelRepresentation};
use snafu::{ensure, ResultExt};

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for i8 {}
    impl Sealed for u16 {}
    impl Sealed for i16 {}
    impl Sealed for u32 {}
    impl Sealed for i32 {}
    impl Sealed for u64 {}
    impl Sealed for i64 {}
}

/// An integer element type that can be serialized as pixel samples.
///
/// This trait is sealed; it is implemented for the fixed-width integer
/// primitives up to 64 bits and cannot be implemented elsewhere.
pub trait Sample: sealed::Sealed + Copy {
    /// The width of this type in bytes.
    const WIDTH: usize;
    /// Whether this type is signed.
    const SIGNED: bool;

    fn write_le(self, out: &mut Vec<u8>);
    fn as_i128(self) -> i128;
}

macro_rules! impl_sample {
    ($t:ty, $w:expr, $signed:expr) => {
        impl Sample for $t {
            const WIDTH: usize = $w;
            const SIGNED: bool = $signed;

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes()[..]);
            }

            fn as_i128(self) -> i128 {
                self as i128
            }
        }
    };
}

impl_sample!(u8, 1, false);
impl_sample!(i8, 1, true);
impl_sample!(u16, 2, false);
impl_sample!(i16, 2, true);
impl_sample!(u32, 4, false);
impl_sample!(i32, 4, true);
impl_sample!(u64, 8, false);
impl_sample!(i64, 8, true);

fn expected_shape(runner: &Runner) -> EncodeResult<(usize, usize, usize, usize)> {
    let descriptor = runner.descriptor();
    Ok((
        descriptor.number_of_frames() as usize,
        descriptor.rows()? as usize,
        descriptor.columns()? as usize,
        descriptor.samples_per_pixel()? as usize,
    ))
}

fn shape_matches(shape: &[usize], frames: usize, rows: usize, columns: usize, samples: usize) -> bool {
    match *shape {
        [r, c] => frames == 1 && samples == 1 && r == rows && c == columns,
        [f, r, c] if samples == 1 => f == frames && r == rows && c == columns,
        [r, c, s] if frames == 1 => r == rows && c == columns && s == samples,
        [f, r, c, s] => f == frames && r == rows && c == columns && s == samples,
        _ => false,
    }
}

/// Serialize an array of samples into the flat little-endian byte
/// layout the encoding pipeline consumes.
///
/// The element signedness must match the descriptor's
/// _Pixel Representation_ and every value must fit the allocated
/// container width; an array element wider than the container is
/// accepted as long as no value overflows.
pub(crate) fn frame_bytes_from_array<T: Sample>(
    array: &ArrayD<T>,
    runner: &Runner,
) -> EncodeResult<Vec<u8>> {
    let descriptor = runner.descriptor();
    let (frames, rows, columns, samples) = expected_shape(runner)?;
    ensure!(
        shape_matches(array.shape(), frames, rows, columns, samples),
        encode_error::ShapeMismatchSnafu {
            shape: array.shape().to_vec(),
        }
    );

    if descriptor.pixel_keyword().is_integer() {
        let signed = descriptor.pixel_representation()? == PixelRepresentation::Signed;
        ensure!(T::SIGNED == signed, encode_error::SampleTypeMismatchSnafu);
    }

    let width = runner.allocated_width()?.bytes();
    let (min, max) = if T::SIGNED {
        let half = 1i128 << (width * 8 - 1);
        (-half, half - 1)
    } else {
        (0, (1i128 << (width * 8)) - 1)
    };

    let mut out = Vec::with_capacity(array.len() * width);
    if T::WIDTH == width {
        for &value in array.iter() {
            value.write_le(&mut out);
        }
    } else {
        // narrow or widen each sample to the container width
        let mut scratch = [0u8; 16];
        for &value in array.iter() {
            let v = value.as_i128();
            ensure!(
                v >= min && v <= max,
                encode_error::SampleOverflowSnafu { value: v, width }
            );
            LittleEndian::write_i128(&mut scratch, v);
            out.extend_from_slice(&scratch[..width]);
        }
    }

    // codecs taking plane-major input get the planes up front
    if descriptor.transfer_syntax().is_jpeg_ls()
        && descriptor.raw_planar_configuration()
            == Some(pixelcodec_core::PlanarConfiguration::Planar)
        && samples > 1
    {
        let frame_len = rows * columns * samples * width;
        let mut planar = Vec::with_capacity(out.len());
        for frame in out.chunks_exact(frame_len) {
            planar.extend_from_slice(&crate::frame::planarize(frame, samples, width));
        }
        out = planar;
    }

    Ok(out)
}

/// Assemble decoded frames into an `ndarray` volume of shape
/// `[frames, rows, columns, samples]`, with singleton frame and
/// sample axes dropped.
///
/// `decoded` holds whole frames of interleaved little-endian samples
/// at the allocated container width.
pub(crate) fn to_ndarray<T>(
    decoded: &[u8],
    frames: usize,
    runner: &Runner,
) -> DecodeResult<ArrayD<T>>
where
    T: NumCast + Copy,
{
    let descriptor = runner.descriptor();
    let rows = descriptor.rows()? as usize;
    let columns = descriptor.columns()? as usize;
    let samples = descriptor.samples_per_pixel()? as usize;
    let width = runner.allocated_width()?.bytes();
    let signed = descriptor.pixel_keyword().is_integer()
        && descriptor.pixel_representation()? == PixelRepresentation::Signed;

    let mut data = Vec::with_capacity(decoded.len() / width);
    for raw in decoded.chunks_exact(width) {
        let value: Option<T> = match descriptor.pixel_keyword() {
            PixelKeyword::FloatPixelData if width == 4 => {
                NumCast::from(LittleEndian::read_f32(raw))
            }
            PixelKeyword::DoubleFloatPixelData if width == 8 => {
                NumCast::from(LittleEndian::read_f64(raw))
            }
            PixelKeyword::FloatPixelData | PixelKeyword::DoubleFloatPixelData => None,
            PixelKeyword::PixelData if signed => {
                NumCast::from(LittleEndian::read_int(raw, width))
            }
            PixelKeyword::PixelData => NumCast::from(LittleEndian::read_uint(raw, width)),
        };
        data.push(value.ok_or(crate::error::DecodeError::InvalidDataType)?);
    }

    let mut shape = Vec::with_capacity(4);
    if frames > 1 {
        shape.push(frames);
    }
    shape.push(rows);
    shape.push(columns);
    if samples > 1 {
        shape.push(samples);
    }
    ArrayD::from_shape_vec(IxDyn(&shape), data).context(decode_error::ShapeSnafu)
}
