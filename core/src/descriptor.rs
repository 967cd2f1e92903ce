//! The image descriptor and its validation rules.
//!
//! An [`ImageDescriptor`] is the single source of truth for one pixel data
//! operation. All fields other than the transfer syntax and the pixel
//! keyword are optional at construction time; typed accessors report a
//! [`MissingAttribute`](DescriptorError::MissingAttribute) error when an
//! operation needs a field that was never set, which is distinct from a
//! validation failure and signals a setup bug in the caller.
//!
//! Validation is performed once per operation, before any codec plugin
//! runs, and either passes completely or fails on the first offending
//! field. It is never partially applied.

use crate::transfer_syntax::TransferSyntax;
use snafu::{ensure, Snafu};

/// Error type for descriptor accessors and validation.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum DescriptorError {
    /// A required descriptor field was never set.
    /// This is a usage error, not a validation failure.
    #[snafu(display("Missing required attribute `{}`", name))]
    MissingAttribute { name: &'static str },

    #[snafu(display(
        "Invalid BitsAllocated {}, must be 1 or a multiple of 8 up to 64",
        value
    ))]
    InvalidBitsAllocated { value: u16 },

    #[snafu(display(
        "Invalid BitsStored {}, must be between 1 and BitsAllocated ({})",
        value,
        bits_allocated
    ))]
    InvalidBitsStored { value: u16, bits_allocated: u16 },

    #[snafu(display("Invalid Rows {}, must be between 1 and 65535", value))]
    InvalidRows { value: u16 },

    #[snafu(display("Invalid Columns {}, must be between 1 and 65535", value))]
    InvalidColumns { value: u16 },

    #[snafu(display("Invalid NumberOfFrames {}, must be at least 1", value))]
    InvalidNumberOfFrames { value: u32 },

    #[snafu(display("Unsupported PhotometricInterpretation `{}`", value))]
    UnsupportedPhotometricInterpretation { value: String },

    #[snafu(display("Invalid SamplesPerPixel {}, must be 1 or 3", value))]
    InvalidSamplesPerPixel { value: u16 },

    #[snafu(display("Invalid PixelRepresentation {}, must be 0 or 1", value))]
    InvalidPixelRepresentation { value: u16 },

    #[snafu(display("Invalid PlanarConfiguration {}, must be 0 or 1", value))]
    InvalidPlanarConfiguration { value: u16 },

    /// The frame does not end on a whole byte.
    /// Native 1-bit frames may be packed across byte boundaries;
    /// callers needing exact lengths should use
    /// [`frame_length_bits`](ImageDescriptor::frame_length_bits).
    #[snafu(display(
        "Frame length of {} bits does not end on a byte boundary",
        bits
    ))]
    FractionalFrameLength { bits: usize },
}

type Result<T, E = DescriptorError> = std::result::Result<T, E>;

/// Which of the mutually exclusive pixel data element families is in use.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PixelKeyword {
    /// Integer samples (_Pixel Data_)
    PixelData,
    /// 32-bit floating point samples (_Float Pixel Data_)
    FloatPixelData,
    /// 64-bit floating point samples (_Double Float Pixel Data_)
    DoubleFloatPixelData,
}

impl PixelKeyword {
    /// Whether the samples of this family are integers.
    pub fn is_integer(self) -> bool {
        matches!(self, PixelKeyword::PixelData)
    }
}

/// The color space interpretation of the sample values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PhotometricInterpretation {
    Monochrome1,
    Monochrome2,
    PaletteColor,
    Rgb,
    YbrFull,
    YbrFull422,
    YbrIct,
    YbrRct,
}

impl PhotometricInterpretation {
    /// Parse the attribute value as kept in a data set.
    ///
    /// Out-of-vocabulary values are rejected here,
    /// so a descriptor can only ever hold a supported interpretation.
    pub fn from_keyword(value: &str) -> Result<Self> {
        match value.trim_end() {
            "MONOCHROME1" => Ok(PhotometricInterpretation::Monochrome1),
            "MONOCHROME2" => Ok(PhotometricInterpretation::Monochrome2),
            "PALETTE COLOR" => Ok(PhotometricInterpretation::PaletteColor),
            "RGB" => Ok(PhotometricInterpretation::Rgb),
            "YBR_FULL" => Ok(PhotometricInterpretation::YbrFull),
            "YBR_FULL_422" => Ok(PhotometricInterpretation::YbrFull422),
            "YBR_ICT" => Ok(PhotometricInterpretation::YbrIct),
            "YBR_RCT" => Ok(PhotometricInterpretation::YbrRct),
            _ => UnsupportedPhotometricInterpretationSnafu { value }.fail(),
        }
    }

    /// The attribute value as kept in a data set.
    pub fn as_keyword(self) -> &'static str {
        match self {
            PhotometricInterpretation::Monochrome1 => "MONOCHROME1",
            PhotometricInterpretation::Monochrome2 => "MONOCHROME2",
            PhotometricInterpretation::PaletteColor => "PALETTE COLOR",
            PhotometricInterpretation::Rgb => "RGB",
            PhotometricInterpretation::YbrFull => "YBR_FULL",
            PhotometricInterpretation::YbrFull422 => "YBR_FULL_422",
            PhotometricInterpretation::YbrIct => "YBR_ICT",
            PhotometricInterpretation::YbrRct => "YBR_RCT",
        }
    }
}

/// Whether integer samples are unsigned (0) or signed two's complement (1).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PixelRepresentation {
    Unsigned = 0,
    Signed = 1,
}

impl PixelRepresentation {
    /// Interpret the numeric attribute value.
    pub fn from_value(value: u16) -> Result<Self> {
        match value {
            0 => Ok(PixelRepresentation::Unsigned),
            1 => Ok(PixelRepresentation::Signed),
            _ => InvalidPixelRepresentationSnafu { value }.fail(),
        }
    }
}

/// Whether multi-sample pixels are interleaved per pixel (0)
/// or stored as separate whole-frame planes (1).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PlanarConfiguration {
    Interleaved = 0,
    Planar = 1,
}

impl PlanarConfiguration {
    /// Interpret the numeric attribute value.
    pub fn from_value(value: u16) -> Result<Self> {
        match value {
            0 => Ok(PlanarConfiguration::Interleaved),
            1 => Ok(PlanarConfiguration::Planar),
            _ => InvalidPlanarConfigurationSnafu { value }.fail(),
        }
    }
}

/// The unit in which a frame length is expressed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    /// Whole bytes. See [`ImageDescriptor::frame_length`]
    /// for the rounding contract.
    Bytes,
    /// Sample values. Always integral.
    Pixels,
}

/// The canonical pixel data parameters of one image.
///
/// The transfer syntax and the pixel keyword are fixed at construction
/// and cannot be cleared or replaced afterwards. All other fields are
/// set through `with_*` builders (or their `set_*` equivalents) and the
/// optional ones can be unset again through `clear_*`.
#[derive(Debug, Clone)]
pub struct ImageDescriptor {
    transfer_syntax: &'static TransferSyntax,
    pixel_keyword: PixelKeyword,
    rows: Option<u16>,
    columns: Option<u16>,
    bits_allocated: Option<u16>,
    bits_stored: Option<u16>,
    samples_per_pixel: Option<u16>,
    pixel_representation: Option<PixelRepresentation>,
    photometric_interpretation: Option<PhotometricInterpretation>,
    planar_configuration: Option<PlanarConfiguration>,
    number_of_frames: Option<u32>,
}

impl ImageDescriptor {
    /// Create a descriptor bound to a transfer syntax and pixel keyword.
    pub fn new(transfer_syntax: &'static TransferSyntax, pixel_keyword: PixelKeyword) -> Self {
        ImageDescriptor {
            transfer_syntax,
            pixel_keyword,
            rows: None,
            columns: None,
            bits_allocated: None,
            bits_stored: None,
            samples_per_pixel: None,
            pixel_representation: None,
            photometric_interpretation: None,
            planar_configuration: None,
            number_of_frames: None,
        }
    }

    pub fn with_rows(mut self, rows: u16) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn with_columns(mut self, columns: u16) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_bits_allocated(mut self, bits_allocated: u16) -> Self {
        self.bits_allocated = Some(bits_allocated);
        self
    }

    pub fn with_bits_stored(mut self, bits_stored: u16) -> Self {
        self.bits_stored = Some(bits_stored);
        self
    }

    pub fn with_samples_per_pixel(mut self, samples_per_pixel: u16) -> Self {
        self.samples_per_pixel = Some(samples_per_pixel);
        self
    }

    pub fn with_pixel_representation(mut self, value: PixelRepresentation) -> Self {
        self.pixel_representation = Some(value);
        self
    }

    pub fn with_photometric_interpretation(mut self, value: PhotometricInterpretation) -> Self {
        self.photometric_interpretation = Some(value);
        self
    }

    pub fn with_planar_configuration(mut self, value: PlanarConfiguration) -> Self {
        self.planar_configuration = Some(value);
        self
    }

    /// Set the declared number of frames.
    ///
    /// A value of 0 is normalized to 1 with a warning,
    /// matching how a missing _Number Of Frames_ is treated.
    pub fn with_number_of_frames(mut self, value: u32) -> Self {
        if value == 0 {
            tracing::warn!("NumberOfFrames of 0 normalized to 1");
            self.number_of_frames = Some(1);
        } else {
            self.number_of_frames = Some(value);
        }
        self
    }

    pub fn clear_bits_stored(&mut self) {
        self.bits_stored = None;
    }

    pub fn clear_pixel_representation(&mut self) {
        self.pixel_representation = None;
    }

    pub fn clear_planar_configuration(&mut self) {
        self.planar_configuration = None;
    }

    pub fn clear_number_of_frames(&mut self) {
        self.number_of_frames = None;
    }

    /// The transfer syntax this descriptor is bound to.
    pub fn transfer_syntax(&self) -> &'static TransferSyntax {
        self.transfer_syntax
    }

    /// The pixel data element family in use.
    pub fn pixel_keyword(&self) -> PixelKeyword {
        self.pixel_keyword
    }

    pub fn rows(&self) -> Result<u16> {
        self.rows.ok_or(DescriptorError::MissingAttribute { name: "Rows" })
    }

    pub fn columns(&self) -> Result<u16> {
        self.columns
            .ok_or(DescriptorError::MissingAttribute { name: "Columns" })
    }

    pub fn bits_allocated(&self) -> Result<u16> {
        self.bits_allocated
            .ok_or(DescriptorError::MissingAttribute {
                name: "BitsAllocated",
            })
    }

    pub fn bits_stored(&self) -> Result<u16> {
        self.bits_stored.ok_or(DescriptorError::MissingAttribute {
            name: "BitsStored",
        })
    }

    pub fn samples_per_pixel(&self) -> Result<u16> {
        self.samples_per_pixel
            .ok_or(DescriptorError::MissingAttribute {
                name: "SamplesPerPixel",
            })
    }

    pub fn pixel_representation(&self) -> Result<PixelRepresentation> {
        self.pixel_representation
            .ok_or(DescriptorError::MissingAttribute {
                name: "PixelRepresentation",
            })
    }

    pub fn photometric_interpretation(&self) -> Result<PhotometricInterpretation> {
        self.photometric_interpretation
            .ok_or(DescriptorError::MissingAttribute {
                name: "PhotometricInterpretation",
            })
    }

    /// The planar configuration in effect for this operation.
    ///
    /// For encapsulated transfer syntaxes the attribute is meaningless
    /// and treated as interleaved. For single-sample native data it
    /// defaults to interleaved as well. It is only required to be set
    /// for native 3-sample data.
    pub fn planar_configuration(&self) -> Result<PlanarConfiguration> {
        if self.transfer_syntax.is_encapsulated() {
            return Ok(PlanarConfiguration::Interleaved);
        }
        if self.samples_per_pixel.unwrap_or(1) != 3 {
            return Ok(self
                .planar_configuration
                .unwrap_or(PlanarConfiguration::Interleaved));
        }
        self.planar_configuration
            .ok_or(DescriptorError::MissingAttribute {
                name: "PlanarConfiguration",
            })
    }

    /// The planar configuration attribute exactly as set, if at all.
    ///
    /// Unlike [`planar_configuration`](Self::planar_configuration),
    /// this does not apply the interleaved default. Encoders targeting
    /// codecs which consume plane-major input read this to honor a
    /// planar request on otherwise interleaved-only syntaxes.
    pub fn raw_planar_configuration(&self) -> Option<PlanarConfiguration> {
        self.planar_configuration
    }

    /// The declared number of frames, defaulting to 1 when absent.
    pub fn number_of_frames(&self) -> u32 {
        match self.number_of_frames {
            Some(n) => n,
            None => {
                tracing::warn!("NumberOfFrames not set, assuming 1");
                1
            }
        }
    }

    /// Check every structural invariant of this descriptor.
    ///
    /// Performed once per operation before any codec plugin is invoked.
    /// The first offending field aborts the check; validation is never
    /// partially applied.
    pub fn validate(&self) -> Result<()> {
        let bits_allocated = self.bits_allocated()?;
        ensure!(
            bits_allocated == 1 || (bits_allocated % 8 == 0 && bits_allocated <= 64),
            InvalidBitsAllocatedSnafu {
                value: bits_allocated
            }
        );

        // floating point families have no BitsStored
        if self.pixel_keyword.is_integer() {
            let bits_stored = self.bits_stored()?;
            ensure!(
                bits_stored >= 1 && bits_stored <= bits_allocated,
                InvalidBitsStoredSnafu {
                    value: bits_stored,
                    bits_allocated,
                }
            );
        }

        let rows = self.rows()?;
        ensure!(rows >= 1, InvalidRowsSnafu { value: rows });
        let columns = self.columns()?;
        ensure!(columns >= 1, InvalidColumnsSnafu { value: columns });

        if let Some(frames) = self.number_of_frames {
            ensure!(frames >= 1, InvalidNumberOfFramesSnafu { value: frames });
        }

        self.photometric_interpretation()?;

        if self.pixel_keyword.is_integer() {
            self.pixel_representation()?;
        }

        let samples_per_pixel = self.samples_per_pixel()?;
        ensure!(
            samples_per_pixel == 1 || samples_per_pixel == 3,
            InvalidSamplesPerPixelSnafu {
                value: samples_per_pixel
            }
        );

        if samples_per_pixel == 3 && !self.transfer_syntax.is_encapsulated() {
            self.planar_configuration()?;
        }

        Ok(())
    }

    /// The exact length of a single frame in bits.
    ///
    /// Accounts for 1-bit packing and, on native syntaxes,
    /// for YBR_FULL_422 horizontal chroma subsampling.
    pub fn frame_length_bits(&self) -> Result<usize> {
        let pixels = self.frame_length(LengthUnit::Pixels)?;
        let bits_allocated = self.bits_allocated()? as usize;
        let mut bits = pixels * bits_allocated;
        if self.is_subsampled_on_disk()? {
            bits = bits / 3 * 2;
        }
        Ok(bits)
    }

    /// The length of a single frame in the given unit.
    ///
    /// In pixels, the length is `rows * columns * samples_per_pixel`,
    /// always integral. In bytes, 1-bit data is rounded up to a whole
    /// byte on encapsulated syntaxes; on native syntaxes a 1-bit frame
    /// that does not end on a byte boundary is an error, since frames
    /// are then packed across byte boundaries and callers must use
    /// [`frame_length_bits`](Self::frame_length_bits) instead.
    pub fn frame_length(&self, unit: LengthUnit) -> Result<usize> {
        let rows = self.rows()? as usize;
        let columns = self.columns()? as usize;
        let samples = self.samples_per_pixel()? as usize;
        let pixels = rows * columns * samples;
        match unit {
            LengthUnit::Pixels => Ok(pixels),
            LengthUnit::Bytes => {
                let bits_allocated = self.bits_allocated()? as usize;
                if bits_allocated == 1 {
                    if self.transfer_syntax.is_encapsulated() {
                        return Ok((pixels + 7) / 8);
                    }
                    ensure!(
                        pixels % 8 == 0,
                        FractionalFrameLengthSnafu { bits: pixels }
                    );
                    return Ok(pixels / 8);
                }
                let mut len = pixels * (bits_allocated / 8);
                if self.is_subsampled_on_disk()? {
                    len = len / 3 * 2;
                }
                Ok(len)
            }
        }
    }

    // YBR_FULL_422 chroma subsampling shrinks native frames only;
    // on encapsulated syntaxes it lives inside the entropy codec.
    fn is_subsampled_on_disk(&self) -> Result<bool> {
        if self.transfer_syntax.is_encapsulated() {
            return Ok(false);
        }
        Ok(self.photometric_interpretation.map_or(false, |pi| {
            pi == PhotometricInterpretation::YbrFull422
        }))
    }
}
