//! The codec plugin abstraction and the per-syntax plugin registry.
//!
//! A [`CodecPlugin`] converts between uncompressed frames and the
//! compressed fragments of one or more encapsulated transfer syntaxes.
//! Plugins are registered in a [`PluginRegistry`] bound to a single
//! transfer syntax; the encoder and decoder facades walk the registry
//! in registration order and use the first plugin that succeeds.
//!
//! A plugin may be *registered* yet *unavailable* when its runtime
//! dependencies (an external library, a licensed component) are not
//! met. Unavailable plugins are skipped during dispatch, but remain
//! visible so that pinning one by name can report what is missing.

use crate::error::{decode_error, encode_error, DecodeResult, EncodeResult};
use crate::runner::Runner;
use pixelcodec_core::{transfer_syntax, LengthUnit, TransferSyntax};
use pixelcodec_rle::{RleError, RleLayout};
use snafu::{ensure, Snafu};
use std::sync::Arc;

/// A pixel data codec for one or more encapsulated transfer syntaxes.
///
/// Both conversion directions default to a _not supported_ error,
/// so encode-only and decode-only plugins implement just one of them.
pub trait CodecPlugin: Send + Sync {
    /// The unique name this plugin is registered and pinned by.
    fn name(&self) -> &str;

    /// Whether this plugin can run for the given transfer syntax
    /// in the current environment.
    fn is_available(&self, ts: &TransferSyntax) -> bool;

    /// The names of the runtime dependencies this plugin needs,
    /// reported when the plugin is pinned but unavailable.
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    /// Compress one uncompressed frame into a single fragment.
    fn encode_frame(&self, _frame: &[u8], _runner: &Runner) -> EncodeResult<Vec<u8>> {
        encode_error::NotSupportedSnafu { name: self.name() }.fail()
    }

    /// Decompress one fragment into an uncompressed frame.
    fn decode_frame(&self, _fragment: &[u8], _runner: &Runner) -> DecodeResult<Vec<u8>> {
        decode_error::NotSupportedSnafu { name: self.name() }.fail()
    }
}

/// Error type for registry manipulation.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum RegistryError {
    #[snafu(display("A codec plugin named `{}` is already registered", name))]
    DuplicatePlugin { name: String },

    #[snafu(display("No codec plugin named `{}` is registered", name))]
    UnknownPlugin { name: String },
}

/// One registered plugin and its probed availability.
#[derive(Clone)]
pub struct PluginEntry {
    name: String,
    plugin: Arc<dyn CodecPlugin>,
    available: bool,
}

impl PluginEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugin(&self) -> &Arc<dyn CodecPlugin> {
        &self.plugin
    }

    /// Whether the plugin reported itself available
    /// for the registry's transfer syntax at registration time.
    pub fn is_available(&self) -> bool {
        self.available
    }
}

impl std::fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginEntry")
            .field("name", &self.name)
            .field("available", &self.available)
            .finish()
    }
}

/// An ordered collection of codec plugins for one transfer syntax.
///
/// Dispatch order is registration order. Availability is probed once,
/// when the plugin is added.
#[derive(Debug, Clone)]
pub struct PluginRegistry {
    ts: &'static TransferSyntax,
    entries: Vec<PluginEntry>,
}

impl PluginRegistry {
    /// Create an empty registry for the given transfer syntax.
    pub fn new(ts: &'static TransferSyntax) -> Self {
        PluginRegistry {
            ts,
            entries: Vec::new(),
        }
    }

    /// Create a registry preloaded with the built-in plugins.
    pub fn with_defaults(ts: &'static TransferSyntax) -> Self {
        let mut registry = PluginRegistry::new(ts);
        // registration cannot fail on an empty registry
        let _ = registry.add_plugin(Arc::new(RleCodecPlugin));
        let _ = registry.add_plugin(Arc::new(PassthroughPlugin));
        registry
    }

    /// The transfer syntax this registry dispatches for.
    pub fn transfer_syntax(&self) -> &'static TransferSyntax {
        self.ts
    }

    /// Register a plugin at the end of the dispatch order.
    ///
    /// The plugin's availability for this registry's transfer syntax
    /// is probed here and cached in the entry.
    pub fn add_plugin(
        &mut self,
        plugin: Arc<dyn CodecPlugin>,
    ) -> Result<(), RegistryError> {
        let name = plugin.name().to_owned();
        ensure!(
            self.entries.iter().all(|e| e.name != name),
            DuplicatePluginSnafu { name }
        );
        let available = plugin.is_available(self.ts);
        self.entries.push(PluginEntry {
            name,
            plugin,
            available,
        });
        Ok(())
    }

    /// Unregister a plugin by name.
    pub fn remove_plugin(&mut self, name: &str) -> Result<(), RegistryError> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| RegistryError::UnknownPlugin {
                name: name.to_owned(),
            })?;
        self.entries.remove(pos);
        Ok(())
    }

    /// Look up a registered plugin by name, available or not.
    pub fn get(&self, name: &str) -> Option<&PluginEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// The available plugins, in dispatch order.
    pub fn available_plugins(&self) -> impl Iterator<Item = &PluginEntry> {
        self.entries.iter().filter(|e| e.available)
    }

    /// Whether at least one available plugin is registered.
    pub fn has_available(&self) -> bool {
        self.entries.iter().any(|e| e.available)
    }
}

/// The built-in codec for the RLE Lossless transfer syntax.
///
/// Implemented natively, so it is always available.
#[derive(Debug, Default)]
pub struct RleCodecPlugin;

fn rle_geometry(runner: &Runner) -> Result<(u16, u16, u16), pixelcodec_core::DescriptorError> {
    let descriptor = runner.descriptor();
    Ok((
        descriptor.rows()?,
        descriptor.columns()?,
        descriptor.samples_per_pixel()?,
    ))
}

impl CodecPlugin for RleCodecPlugin {
    fn name(&self) -> &str {
        "rle"
    }

    fn is_available(&self, ts: &TransferSyntax) -> bool {
        *ts == transfer_syntax::RLE_LOSSLESS
    }

    fn encode_frame(&self, frame: &[u8], runner: &Runner) -> EncodeResult<Vec<u8>> {
        let bits_allocated = runner.descriptor().bits_allocated()?;
        let (rows, columns, samples) = rle_geometry(runner)?;
        let layout = RleLayout::new(rows, columns, samples, bits_allocated)?;
        if frame.len() == layout.frame_length() {
            return Ok(pixelcodec_rle::encode_frame(frame, &layout)?);
        }
        // the source may carry samples in their stored container width
        let stored_bits = runner.stored_width()?.bytes() as u16 * 8;
        if stored_bits != bits_allocated {
            let narrow = RleLayout::new(rows, columns, samples, stored_bits)?;
            if frame.len() == narrow.frame_length() {
                return Ok(pixelcodec_rle::encode_frame(frame, &narrow)?);
            }
        }
        encode_error::FrameLengthMismatchSnafu {
            actual: frame.len(),
            expected: layout.frame_length(),
        }
        .fail()
    }

    fn decode_frame(&self, fragment: &[u8], runner: &Runner) -> DecodeResult<Vec<u8>> {
        let bits_allocated = runner.descriptor().bits_allocated()?;
        let (rows, columns, samples) = rle_geometry(runner)?;
        let layout = RleLayout::new(rows, columns, samples, bits_allocated)?;
        match pixelcodec_rle::decode_frame(fragment, &layout) {
            Ok(frame) => Ok(frame),
            // the stream may have been written at the stored width
            Err(RleError::SegmentCountMismatch { .. }) => {
                let stored_bits = runner.stored_width()?.bytes() as u16 * 8;
                let narrow = RleLayout::new(rows, columns, samples, stored_bits)?;
                Ok(pixelcodec_rle::decode_frame(fragment, &narrow)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// The built-in plugin for the Encapsulated Uncompressed syntax,
/// where each fragment carries one frame verbatim.
#[derive(Debug, Default)]
pub struct PassthroughPlugin;

impl CodecPlugin for PassthroughPlugin {
    fn name(&self) -> &str {
        "uncompressed"
    }

    fn is_available(&self, ts: &TransferSyntax) -> bool {
        *ts == transfer_syntax::ENCAPSULATED_UNCOMPRESSED
    }

    fn encode_frame(&self, frame: &[u8], runner: &Runner) -> EncodeResult<Vec<u8>> {
        let expected = runner.descriptor().frame_length(LengthUnit::Bytes)?;
        if frame.len() == expected {
            return Ok(frame.to_vec());
        }
        // a narrowed source is widened back to the allocated container
        let allocated = runner.allocated_width()?.bytes();
        let stored = runner.stored_width()?.bytes();
        if stored < allocated && frame.len() == expected / allocated * stored {
            let descriptor = runner.descriptor();
            let signed = descriptor.pixel_keyword().is_integer()
                && descriptor.pixel_representation()?
                    == pixelcodec_core::PixelRepresentation::Signed;
            return Ok(crate::frame::expand_container(
                frame, stored, allocated, signed,
            ));
        }
        encode_error::FrameLengthMismatchSnafu {
            actual: frame.len(),
            expected,
        }
        .fail()
    }

    fn decode_frame(&self, fragment: &[u8], runner: &Runner) -> DecodeResult<Vec<u8>> {
        let expected = runner.descriptor().frame_length(LengthUnit::Bytes)?;
        // tolerate the single even-length padding byte
        ensure!(
            fragment.len() == expected || fragment.len() == expected + 1,
            decode_error::FrameLengthMismatchSnafu {
                actual: fragment.len(),
                expected,
            }
        );
        Ok(fragment[..expected].to_vec())
    }
}
