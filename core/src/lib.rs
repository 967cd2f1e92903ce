//! This crate contains the core data model for pixel data codec operations:
//! the image descriptor with its validation rules,
//! the transfer syntax table,
//! and the sample container width model.
//!
//! The types in this crate are consumed by the codec runtime
//! (see the `pixelcodec-runtime` crate),
//! which resolves a transfer syntax UID into an encoder or decoder
//! and dispatches the actual byte work to codec plugins.
//!
//! An [`ImageDescriptor`] is the single source of truth
//! for one pixel data operation.
//! It is typically built from attributes of a surrounding data set
//! and validated once before any codec runs:
//!
//! ```
//! use pixelcodec_core::{
//!     ImageDescriptor, PhotometricInterpretation, PixelKeyword,
//!     PixelRepresentation, transfer_syntax,
//! };
//!
//! # fn main() -> Result<(), pixelcodec_core::DescriptorError> {
//! let desc = ImageDescriptor::new(&transfer_syntax::RLE_LOSSLESS, PixelKeyword::PixelData)
//!     .with_rows(64)
//!     .with_columns(64)
//!     .with_bits_allocated(16)
//!     .with_bits_stored(12)
//!     .with_samples_per_pixel(1)
//!     .with_pixel_representation(PixelRepresentation::Unsigned)
//!     .with_photometric_interpretation(PhotometricInterpretation::Monochrome2);
//! desc.validate()?;
//! # Ok(())
//! # }
//! ```

pub mod descriptor;
pub mod sample;
pub mod transfer_syntax;

pub use descriptor::{
    DescriptorError, ImageDescriptor, LengthUnit, PhotometricInterpretation, PixelKeyword,
    PixelRepresentation, PlanarConfiguration,
};
pub use sample::SampleWidth;
pub use transfer_syntax::{TransferSyntax, TsKind};

// re-export crates that are part of the public API
pub use byteordered;
pub use snafu;
