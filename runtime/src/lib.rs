//! Plugin-dispatched pixel data codec runtime.
//!
//! This crate turns the descriptor model of [`pixelcodec_core`] and the
//! native codec of [`pixelcodec_rle`] into a complete encoding and
//! decoding pipeline: per-transfer-syntax [`Encoder`] and [`Decoder`]
//! facades, a [`PluginRegistry`] of codec plugins tried in order until
//! one succeeds, frame extraction and layout normalization for native
//! pixel data, and conversions to and from [`ndarray`] volumes.
//!
//! # Example
//!
//! Compress a frame into RLE Lossless and decode it back:
//!
//! ```
//! use pixelcodec_core::{
//!     transfer_syntax, ImageDescriptor, PhotometricInterpretation, PixelKeyword,
//!     PixelRepresentation,
//! };
//! use pixelcodec_runtime::{get_decoder, get_encoder, CodecOptions, PixelSource};
//!
//! let descriptor = ImageDescriptor::new(
//!     &transfer_syntax::RLE_LOSSLESS,
//!     PixelKeyword::PixelData,
//! )
//! .with_rows(2)
//! .with_columns(2)
//! .with_bits_allocated(8)
//! .with_bits_stored(8)
//! .with_samples_per_pixel(1)
//! .with_pixel_representation(PixelRepresentation::Unsigned)
//! .with_photometric_interpretation(PhotometricInterpretation::Monochrome2);
//!
//! let frame = [10, 10, 20, 30];
//! let encoder = get_encoder(descriptor.transfer_syntax().uid())?;
//! let fragment = encoder.encode(&descriptor, &frame, None, CodecOptions::new())?;
//!
//! let decoder = get_decoder(descriptor.transfer_syntax().uid())?;
//! let fragments = vec![fragment];
//! let decoded = decoder.decode(
//!     &descriptor,
//!     &PixelSource::Fragments(&fragments),
//!     CodecOptions::new(),
//! )?;
//! assert_eq!(decoded, frame);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

mod array;
mod decoder;
mod encapsulation;
mod encoder;
mod error;
mod frame;
mod plugin;
mod runner;

pub use array::Sample;
pub use decoder::{DecodeArrayIter, DecodeIter, Decoder, PixelSource};
pub use encapsulation::{encapsulate, EncapsulatedPixels};
pub use encoder::{EncodeIter, Encoder};
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult, PluginFailure};
pub use plugin::{
    CodecPlugin, PassthroughPlugin, PluginEntry, PluginRegistry, RegistryError, RleCodecPlugin,
};
pub use runner::{CodecOptions, Runner};

use pixelcodec_core::transfer_syntax;

/// Obtain an encoder for the transfer syntax with the given UID.
///
/// Only encapsulated transfer syntaxes have encoders; native syntaxes
/// need no compression step and are reported as not implemented here.
/// A single trailing null character in `uid` is tolerated.
pub fn get_encoder(uid: &str) -> EncodeResult<Encoder> {
    match transfer_syntax::from_uid(uid) {
        Some(ts) if ts.is_encapsulated() => Ok(Encoder::new(ts)),
        _ => error::encode_error::NotImplementedSnafu { uid }.fail(),
    }
}

/// Obtain a decoder for the transfer syntax with the given UID.
///
/// Native transfer syntaxes decode without any codec plugin.
/// A single trailing null character in `uid` is tolerated.
pub fn get_decoder(uid: &str) -> DecodeResult<Decoder> {
    match transfer_syntax::from_uid(uid) {
        Some(ts) => Ok(Decoder::new(ts)),
        None => error::decode_error::NotImplementedSnafu { uid }.fail(),
    }
}
