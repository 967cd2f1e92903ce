//! The encoding facade: frame extraction, plugin dispatch, encapsulation.

use crate::array::{frame_bytes_from_array, Sample};
use crate::encapsulation::{encapsulate, EncapsulatedPixels};
use crate::error::{encode_error, EncodeResult, PluginFailure};
use crate::frame::get_frame;
use crate::plugin::PluginRegistry;
use crate::runner::{CodecOptions, Runner};
use ndarray::ArrayD;
use pixelcodec_core::{ImageDescriptor, LengthUnit, TransferSyntax};
use snafu::ensure;

/// An encoder for one encapsulated transfer syntax.
///
/// Obtained through [`get_encoder`](crate::get_encoder). The encoder
/// holds a plugin registry preloaded with the built-in codecs; callers
/// may register additional plugins before encoding.
#[derive(Debug)]
pub struct Encoder {
    ts: &'static TransferSyntax,
    registry: PluginRegistry,
}

impl Encoder {
    pub(crate) fn new(ts: &'static TransferSyntax) -> Self {
        Encoder {
            ts,
            registry: PluginRegistry::with_defaults(ts),
        }
    }

    /// The transfer syntax this encoder compresses into.
    pub fn transfer_syntax(&self) -> &'static TransferSyntax {
        self.ts
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    /// Compress a single frame out of a flat native pixel data buffer.
    ///
    /// `frame` selects the frame to compress; it may only be omitted
    /// when the source holds exactly one frame.
    pub fn encode(
        &self,
        descriptor: &ImageDescriptor,
        src: &[u8],
        frame: Option<usize>,
        options: CodecOptions,
    ) -> EncodeResult<Vec<u8>> {
        let runner = Runner::for_encoding(descriptor, options)?;
        let index = match frame {
            Some(index) => index,
            None => {
                let frame_length = descriptor.frame_length(LengthUnit::Bytes)?;
                ensure!(
                    frame_length > 0 && src.len() % frame_length == 0,
                    encode_error::FrameLengthMismatchSnafu {
                        actual: src.len(),
                        expected: frame_length,
                    }
                );
                ensure!(
                    src.len() / frame_length == 1,
                    encode_error::MissingFrameIndexSnafu
                );
                0
            }
        };
        let frame = get_frame(src, index, &runner)?;
        self.dispatch(&frame, &runner)
    }

    /// Compress every frame of the source lazily, in order.
    ///
    /// Frames are pulled from the source one at a time; a failure on
    /// one frame does not prevent pulling the next. The number of
    /// frames is taken from the source length, with excess frames
    /// beyond the declared count handled per the options.
    pub fn iter_encode<'a>(
        &'a self,
        descriptor: &'a ImageDescriptor,
        src: &'a [u8],
        options: CodecOptions,
    ) -> EncodeResult<EncodeIter<'a>> {
        let runner = Runner::for_encoding(descriptor, options)?;
        let frame_length = descriptor.frame_length(LengthUnit::Bytes)?;
        ensure!(
            frame_length > 0 && src.len() % frame_length == 0,
            encode_error::FrameLengthMismatchSnafu {
                actual: src.len(),
                expected: frame_length,
            }
        );
        let available = src.len() / frame_length;
        let declared = descriptor.number_of_frames() as usize;
        let total = if available > declared {
            if runner.options().allow_excess_frames {
                tracing::warn!(
                    "pixel data holds {} frames, {} declared; encoding all of them",
                    available,
                    declared
                );
                available
            } else {
                tracing::warn!(
                    "pixel data holds {} frames, {} declared; excess frames dropped",
                    available,
                    declared
                );
                declared
            }
        } else {
            available
        };
        Ok(EncodeIter {
            encoder: self,
            runner,
            src,
            total,
            next: 0,
        })
    }

    /// Compress every frame and assemble the fragment sequence.
    pub fn encode_all(
        &self,
        descriptor: &ImageDescriptor,
        src: &[u8],
        options: CodecOptions,
    ) -> EncodeResult<EncapsulatedPixels> {
        let frames = self
            .iter_encode(descriptor, src, options)?
            .collect::<EncodeResult<Vec<_>>>()?;
        Ok(encapsulate(frames))
    }

    /// Compress a single frame out of an array of samples.
    ///
    /// See [`encode`](Self::encode) for the frame selection rules
    /// and [`Sample`] for the accepted element types.
    pub fn encode_ndarray<T: Sample>(
        &self,
        descriptor: &ImageDescriptor,
        array: &ArrayD<T>,
        frame: Option<usize>,
        options: CodecOptions,
    ) -> EncodeResult<Vec<u8>> {
        let runner = Runner::for_encoding(descriptor, options.clone())?;
        let bytes = frame_bytes_from_array(array, &runner)?;
        self.encode(descriptor, &bytes, frame, options)
    }

    fn dispatch(&self, frame: &[u8], runner: &Runner) -> EncodeResult<Vec<u8>> {
        if let Some(name) = &runner.options().plugin {
            let entry = self.registry.get(name).ok_or_else(|| {
                encode_error::UnknownPluginSnafu { name: name.clone() }.build()
            })?;
            ensure!(
                entry.is_available(),
                encode_error::PluginUnavailableSnafu {
                    name: name.clone(),
                    missing: entry
                        .plugin()
                        .dependencies()
                        .iter()
                        .map(|d| (*d).to_owned())
                        .collect::<Vec<_>>(),
                }
            );
            return entry.plugin().encode_frame(frame, runner);
        }

        ensure!(
            self.registry.has_available(),
            encode_error::NoPluginsAvailableSnafu { uid: self.ts.uid() }
        );
        let mut failures = Vec::new();
        for entry in self.registry.available_plugins() {
            tracing::debug!("encoding with codec plugin `{}`", entry.name());
            match entry.plugin().encode_frame(frame, runner) {
                Ok(out) => return Ok(out),
                Err(e) => {
                    tracing::warn!("codec plugin `{}` failed: {}", entry.name(), e);
                    failures.push(PluginFailure {
                        name: entry.name().to_owned(),
                        message: e.to_string(),
                    });
                }
            }
        }
        encode_error::AllPluginsFailedSnafu { failures }.fail()
    }
}

/// A lazy iterator over the compressed frames of one source.
///
/// Created by [`Encoder::iter_encode`]. Yields one result per frame;
/// an error on one frame does not stop the iteration.
#[derive(Debug)]
pub struct EncodeIter<'a> {
    encoder: &'a Encoder,
    runner: Runner<'a>,
    src: &'a [u8],
    total: usize,
    next: usize,
}

impl EncodeIter<'_> {
    /// The number of frames this iterator will yield.
    pub fn frame_count(&self) -> usize {
        self.total
    }
}

impl Iterator for EncodeIter<'_> {
    type Item = EncodeResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let index = self.next;
        self.next += 1;
        let item = get_frame(self.src, index, &self.runner)
            .and_then(|frame| self.encoder.dispatch(&frame, &self.runner));
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}
