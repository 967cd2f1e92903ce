//! Per-operation state: a validated descriptor plus codec options.

use crate::error::{DecodeResult, EncodeResult};
use pixelcodec_core::{ImageDescriptor, SampleWidth};

/// Options shared by every encoding and decoding operation.
///
/// The defaults are the right choice for almost all callers:
/// validation on, excess frames tolerated, no pinned plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct CodecOptions {
    /// Whether to validate the image descriptor before running any codec.
    ///
    /// Turning this off lets malformed descriptors through to the codec
    /// plugins; only do so when the descriptor is known to be valid.
    pub validate: bool,
    /// Whether a source carrying more frames than the descriptor
    /// declares is accepted (with a warning) or clamped to the
    /// declared count.
    pub allow_excess_frames: bool,
    /// Pin the operation to the named codec plugin,
    /// instead of trying every available one in registration order.
    pub plugin: Option<String>,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            validate: true,
            allow_excess_frames: true,
            plugin: None,
        }
    }
}

impl CodecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip descriptor validation for this operation.
    pub fn skip_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    /// Clamp sources with more frames than declared
    /// instead of decoding the extra frames.
    pub fn reject_excess_frames(mut self) -> Self {
        self.allow_excess_frames = false;
        self
    }

    /// Pin the operation to a single codec plugin by name.
    pub fn with_plugin(mut self, name: impl Into<String>) -> Self {
        self.plugin = Some(name.into());
        self
    }
}

/// A validated descriptor and the options of one codec operation.
///
/// Construction runs descriptor validation (unless disabled),
/// so the codec plugins behind a runner never see an invalid
/// descriptor.
#[derive(Debug)]
pub struct Runner<'a> {
    descriptor: &'a ImageDescriptor,
    options: CodecOptions,
}

impl<'a> Runner<'a> {
    pub(crate) fn for_encoding(
        descriptor: &'a ImageDescriptor,
        options: CodecOptions,
    ) -> EncodeResult<Self> {
        if options.validate {
            descriptor.validate()?;
        }
        Ok(Runner {
            descriptor,
            options,
        })
    }

    pub(crate) fn for_decoding(
        descriptor: &'a ImageDescriptor,
        options: CodecOptions,
    ) -> DecodeResult<Self> {
        if options.validate {
            descriptor.validate()?;
        }
        Ok(Runner {
            descriptor,
            options,
        })
    }

    pub fn descriptor(&self) -> &'a ImageDescriptor {
        self.descriptor
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// The container width holding the meaningful sample bits.
    ///
    /// For integer pixel data this is derived from _Bits Stored_;
    /// floating point families always fill their allocated width.
    pub fn stored_width(&self) -> Result<SampleWidth, pixelcodec_core::DescriptorError> {
        let bits = if self.descriptor.pixel_keyword().is_integer() {
            self.descriptor.bits_stored()?
        } else {
            self.descriptor.bits_allocated()?
        };
        // validation already bounded the bit count
        Ok(SampleWidth::for_bits(bits).unwrap_or(SampleWidth::Eight))
    }

    /// The container width of the allocated sample cells.
    pub fn allocated_width(&self) -> Result<SampleWidth, pixelcodec_core::DescriptorError> {
        let bits = self.descriptor.bits_allocated()?;
        Ok(SampleWidth::for_bits(bits).unwrap_or(SampleWidth::Eight))
    }
}
