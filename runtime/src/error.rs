//! The error types of the codec runtime.
//!
//! Users of these types are free to handle errors based on their variant,
//! but should not make decisions based on the display message,
//! since that is not considered part of the API
//! and may change on any new release.
//!
//! Validation and framing errors abort the whole operation immediately.
//! Individual codec failures are captured and retried with the next
//! plugin; they only become visible to the caller as an
//! [`AllPluginsFailed`](DecodeError::AllPluginsFailed) aggregate
//! once every plugin in scope has been exhausted.

use snafu::Snafu;
use std::fmt;

/// The captured failure of a single codec plugin,
/// kept for the aggregate error report.
#[derive(Debug, Clone)]
pub struct PluginFailure {
    /// The name of the plugin that failed.
    pub name: String,
    /// The plugin's failure message.
    pub message: String,
}

impl fmt::Display for PluginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

fn list_failures(failures: &[PluginFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The possible error conditions when encoding pixel data.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)), module(encode_error))]
pub enum EncodeError {
    /// A custom error when encoding fails.
    /// Read the `message` and the underlying `source`
    /// for more details.
    #[snafu(whatever, display("{}", message))]
    Custom {
        /// The error message.
        message: String,
        /// The underlying error cause, if any.
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync + 'static>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// The transfer syntax is unknown or has no encoding support.
    #[snafu(display("Encoding into transfer syntax `{}` is not implemented", uid))]
    NotImplemented { uid: String },

    /// The image descriptor failed validation
    /// or is missing a required attribute.
    #[snafu(display("{}", source), context(false))]
    Descriptor {
        source: pixelcodec_core::DescriptorError,
    },

    /// The native run-length codec reported a framing error.
    #[snafu(display("{}", source), context(false))]
    Rle { source: pixelcodec_rle::RleError },

    /// The requested frame is outside the source's frame range.
    #[snafu(display(
        "Frame {} is out of range for a source of {} frame(s)",
        frame,
        available
    ))]
    FrameRangeOutOfBounds { frame: usize, available: usize },

    /// A multi-frame source was given without a frame index.
    #[snafu(display("An explicit frame index is required to encode a multi-frame source"))]
    MissingFrameIndex,

    /// The plugin provides no encoder.
    #[snafu(display("Codec plugin `{}` does not support encoding", name))]
    NotSupported { name: String },

    /// The explicitly named plugin is registered
    /// but its runtime dependencies are unmet.
    #[snafu(display(
        "Codec plugin `{}` is registered but unavailable; missing dependencies: {}",
        name,
        missing.join(", ")
    ))]
    PluginUnavailable { name: String, missing: Vec<String> },

    /// No plugin with the given name is registered.
    #[snafu(display("Unknown codec plugin `{}`", name))]
    UnknownPlugin { name: String },

    /// No plugin registered for the transfer syntax is available.
    #[snafu(display(
        "No codec plugins are available for transfer syntax `{}`",
        uid
    ))]
    NoPluginsAvailable { uid: String },

    /// Every plugin in scope ran and failed.
    #[snafu(display("All codec plugins failed: {}", list_failures(failures)))]
    AllPluginsFailed { failures: Vec<PluginFailure> },

    /// The source byte length disagrees with the descriptor.
    #[snafu(display(
        "Frame length mismatch: got {} bytes, expected {}",
        actual,
        expected
    ))]
    FrameLengthMismatch { actual: usize, expected: usize },

    /// A sample value cannot be represented in the target container
    /// without loss.
    #[snafu(display(
        "Sample value {} does not fit in a {}-byte container",
        value,
        width
    ))]
    SampleOverflow { value: i128, width: usize },

    /// The array's element signedness disagrees
    /// with the descriptor's pixel representation.
    #[snafu(display(
        "Array element signedness does not match the descriptor's PixelRepresentation"
    ))]
    SampleTypeMismatch,

    /// The array's shape disagrees with the descriptor.
    #[snafu(display("Array shape {:?} does not match the image descriptor", shape))]
    ShapeMismatch { shape: Vec<usize> },
}

/// The possible error conditions when decoding pixel data.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)), module(decode_error))]
pub enum DecodeError {
    /// A custom error occurred when decoding,
    /// reported as a dynamic error value with a message.
    #[snafu(whatever, display("{}", message))]
    Custom {
        /// The error message.
        message: String,
        /// The underlying error cause, if any.
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync + 'static>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// The transfer syntax is unknown to this library.
    #[snafu(display("Decoding of transfer syntax `{}` is not implemented", uid))]
    NotImplemented { uid: String },

    /// The input pixel data is not encapsulated,
    /// but the transfer syntax requires fragments.
    #[snafu(display("Input pixel data is not encapsulated"))]
    NotEncapsulated,

    /// The image descriptor failed validation
    /// or is missing a required attribute.
    #[snafu(display("{}", source), context(false))]
    Descriptor {
        source: pixelcodec_core::DescriptorError,
    },

    /// The native run-length codec reported a framing error.
    #[snafu(display("{}", source), context(false))]
    Rle { source: pixelcodec_rle::RleError },

    /// The requested frame is outside the source's frame range.
    #[snafu(display(
        "Frame {} is out of range for a source of {} frame(s)",
        frame,
        available
    ))]
    FrameRangeOutOfBounds { frame: usize, available: usize },

    /// The plugin provides no decoder.
    #[snafu(display("Codec plugin `{}` does not support decoding", name))]
    NotSupported { name: String },

    /// The explicitly named plugin is registered
    /// but its runtime dependencies are unmet.
    #[snafu(display(
        "Codec plugin `{}` is registered but unavailable; missing dependencies: {}",
        name,
        missing.join(", ")
    ))]
    PluginUnavailable { name: String, missing: Vec<String> },

    /// No plugin with the given name is registered.
    #[snafu(display("Unknown codec plugin `{}`", name))]
    UnknownPlugin { name: String },

    /// No plugin registered for the transfer syntax is available.
    #[snafu(display(
        "No codec plugins are available for transfer syntax `{}`",
        uid
    ))]
    NoPluginsAvailable { uid: String },

    /// Every plugin in scope ran and failed.
    #[snafu(display("All codec plugins failed: {}", list_failures(failures)))]
    AllPluginsFailed { failures: Vec<PluginFailure> },

    /// The decoded frame length disagrees with the descriptor.
    #[snafu(display(
        "Decoded frame length mismatch: got {} bytes, expected {}",
        actual,
        expected
    ))]
    FrameLengthMismatch { actual: usize, expected: usize },

    /// A decoded sample value cannot be represented
    /// in the requested element type.
    #[snafu(display("Decoded sample value cannot be represented in the requested type"))]
    InvalidDataType,

    /// The computed output shape is invalid for the decoded buffer.
    #[snafu(display("Invalid shape for the decoded array"))]
    Shape { source: ndarray::ShapeError },
}

/// The result of encoding pixel data.
pub type EncodeResult<T, E = EncodeError> = Result<T, E>;

/// The result of decoding pixel data.
pub type DecodeResult<T, E = DecodeError> = Result<T, E>;
