//! The decoding facade: fragment dispatch and native normalization.

use crate::array::to_ndarray;
use crate::error::{decode_error, DecodeResult, PluginFailure};
use crate::frame::{normalize_encapsulated_frame, normalize_native_frame};
use crate::plugin::PluginRegistry;
use crate::runner::{CodecOptions, Runner};
use ndarray::ArrayD;
use num_traits::NumCast;
use pixelcodec_core::{ImageDescriptor, TransferSyntax};
use snafu::ensure;
use std::marker::PhantomData;

/// The pixel data payload handed to a decoder.
///
/// Native transfer syntaxes carry a single flat buffer of frames;
/// encapsulated syntaxes carry a sequence of fragments,
/// one per frame.
#[derive(Debug, Copy, Clone)]
pub enum PixelSource<'a> {
    /// Flat pixel data, all frames back to back.
    Native(&'a [u8]),
    /// Encapsulated pixel data fragments.
    Fragments(&'a [Vec<u8>]),
}

/// A decoder for one transfer syntax.
///
/// Obtained through [`get_decoder`](crate::get_decoder). Native
/// transfer syntaxes decode without any plugin; encapsulated ones
/// dispatch to the decoder's plugin registry.
#[derive(Debug)]
pub struct Decoder {
    ts: &'static TransferSyntax,
    registry: PluginRegistry,
}

impl Decoder {
    pub(crate) fn new(ts: &'static TransferSyntax) -> Self {
        Decoder {
            ts,
            registry: PluginRegistry::with_defaults(ts),
        }
    }

    /// The transfer syntax this decoder reads.
    pub fn transfer_syntax(&self) -> &'static TransferSyntax {
        self.ts
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    /// Whether this decoder can run in the current environment.
    ///
    /// Native transfer syntaxes need no plugin and are always
    /// decodable; encapsulated ones need at least one available
    /// plugin in the registry.
    pub fn is_available(&self) -> bool {
        !self.ts.is_encapsulated() || self.registry.has_available()
    }

    /// The number of frames the source actually holds,
    /// reconciled against the declared frame count.
    ///
    /// A source holding more frames than declared is either accepted
    /// in full or clamped to the declared count, per the options;
    /// both cases log a warning.
    pub fn available_frames(
        &self,
        descriptor: &ImageDescriptor,
        src: &PixelSource<'_>,
        options: &CodecOptions,
    ) -> DecodeResult<usize> {
        let available = match *src {
            PixelSource::Native(data) => {
                let bits = descriptor.frame_length_bits()?;
                let available = data.len() * 8 / bits;
                // trailing bits under one byte are 1-bit packing
                // padding; anything more is a framing error, as is
                // a buffer too short to hold a single frame
                ensure!(
                    available >= 1 && data.len() * 8 % bits < 8,
                    decode_error::FrameLengthMismatchSnafu {
                        actual: data.len(),
                        expected: (bits + 7) / 8,
                    }
                );
                available
            }
            PixelSource::Fragments(fragments) => fragments.len(),
        };
        let declared = descriptor.number_of_frames() as usize;
        if available > declared {
            if options.allow_excess_frames {
                tracing::warn!(
                    "pixel data holds {} frames, {} declared; decoding all of them",
                    available,
                    declared
                );
                Ok(available)
            } else {
                tracing::warn!(
                    "pixel data holds {} frames, {} declared; excess frames ignored",
                    available,
                    declared
                );
                Ok(declared)
            }
        } else {
            Ok(available)
        }
    }

    /// Decode one frame into interleaved little-endian samples
    /// at the allocated container width.
    pub fn decode_frame(
        &self,
        descriptor: &ImageDescriptor,
        src: &PixelSource<'_>,
        frame: usize,
        options: CodecOptions,
    ) -> DecodeResult<Vec<u8>> {
        let runner = Runner::for_decoding(descriptor, options)?;
        let available = self.available_frames(descriptor, src, runner.options())?;
        self.decode_one(src, frame, available, &runner, &mut None)
    }

    /// Decode every frame into one contiguous buffer.
    ///
    /// The plugin that decoded the previous frame is tried first on
    /// the next one, so a multi-frame decode normally settles on a
    /// single plugin after the first frame.
    pub fn decode(
        &self,
        descriptor: &ImageDescriptor,
        src: &PixelSource<'_>,
        options: CodecOptions,
    ) -> DecodeResult<Vec<u8>> {
        let runner = Runner::for_decoding(descriptor, options)?;
        let available = self.available_frames(descriptor, src, runner.options())?;
        let mut preferred = None;
        let mut out = Vec::new();
        for frame in 0..available {
            out.extend_from_slice(&self.decode_one(
                src,
                frame,
                available,
                &runner,
                &mut preferred,
            )?);
        }
        Ok(out)
    }

    /// Decode every frame lazily, in order.
    ///
    /// Yields one result per frame; a failure on one frame does not
    /// prevent decoding the next.
    pub fn iter_frames<'a>(
        &'a self,
        descriptor: &'a ImageDescriptor,
        src: PixelSource<'a>,
        options: CodecOptions,
    ) -> DecodeResult<DecodeIter<'a>> {
        let runner = Runner::for_decoding(descriptor, options)?;
        let available = self.available_frames(descriptor, &src, runner.options())?;
        Ok(DecodeIter {
            decoder: self,
            runner,
            src,
            available,
            next: 0,
            preferred: None,
        })
    }

    /// Decode every frame into an `ndarray` volume of shape
    /// `[frames, rows, columns, samples]`,
    /// with singleton frame and sample axes dropped.
    pub fn decode_ndarray<T>(
        &self,
        descriptor: &ImageDescriptor,
        src: &PixelSource<'_>,
        options: CodecOptions,
    ) -> DecodeResult<ArrayD<T>>
    where
        T: NumCast + Copy,
    {
        let runner = Runner::for_decoding(descriptor, options)?;
        let available = self.available_frames(descriptor, src, runner.options())?;
        let mut preferred = None;
        let mut out = Vec::new();
        for frame in 0..available {
            out.extend_from_slice(&self.decode_one(
                src,
                frame,
                available,
                &runner,
                &mut preferred,
            )?);
        }
        to_ndarray(&out, available, &runner)
    }

    /// Decode every frame lazily, converting each into its own
    /// `ndarray` of shape `[rows, columns, samples]`
    /// with the singleton sample axis dropped.
    ///
    /// Yields one result per frame; a failure on one frame does not
    /// prevent decoding the next.
    pub fn iter_ndarray<'a, T>(
        &'a self,
        descriptor: &'a ImageDescriptor,
        src: PixelSource<'a>,
        options: CodecOptions,
    ) -> DecodeResult<DecodeArrayIter<'a, T>>
    where
        T: NumCast + Copy,
    {
        Ok(DecodeArrayIter {
            inner: self.iter_frames(descriptor, src, options)?,
            marker: PhantomData,
        })
    }

    fn decode_one(
        &self,
        src: &PixelSource<'_>,
        frame: usize,
        available: usize,
        runner: &Runner,
        preferred: &mut Option<String>,
    ) -> DecodeResult<Vec<u8>> {
        match *src {
            PixelSource::Native(data) => {
                ensure!(
                    !self.ts.is_encapsulated(),
                    decode_error::NotEncapsulatedSnafu
                );
                normalize_native_frame(data, frame, available, runner)
            }
            PixelSource::Fragments(fragments) => {
                if !self.ts.is_encapsulated() {
                    // a native syntax has no business carrying fragments
                    return decode_error::NotEncapsulatedSnafu.fail();
                }
                ensure!(
                    frame < available,
                    decode_error::FrameRangeOutOfBoundsSnafu { frame, available }
                );
                let decoded = self.dispatch(&fragments[frame], runner, preferred)?;
                normalize_encapsulated_frame(decoded, runner)
            }
        }
    }

    fn dispatch(
        &self,
        fragment: &[u8],
        runner: &Runner,
        preferred: &mut Option<String>,
    ) -> DecodeResult<Vec<u8>> {
        if let Some(name) = &runner.options().plugin {
            let entry = self.registry.get(name).ok_or_else(|| {
                decode_error::UnknownPluginSnafu { name: name.clone() }.build()
            })?;
            ensure!(
                entry.is_available(),
                decode_error::PluginUnavailableSnafu {
                    name: name.clone(),
                    missing: entry
                        .plugin()
                        .dependencies()
                        .iter()
                        .map(|d| (*d).to_owned())
                        .collect::<Vec<_>>(),
                }
            );
            return entry.plugin().decode_frame(fragment, runner);
        }

        ensure!(
            self.registry.has_available(),
            decode_error::NoPluginsAvailableSnafu { uid: self.ts.uid() }
        );

        // try the plugin that worked last time first
        if let Some(name) = preferred.as_deref() {
            if let Some(entry) = self.registry.get(name) {
                match entry.plugin().decode_frame(fragment, runner) {
                    Ok(out) => return Ok(out),
                    Err(e) => {
                        tracing::warn!(
                            "codec plugin `{}` no longer decodes this data: {}",
                            name,
                            e
                        );
                        *preferred = None;
                    }
                }
            }
        }

        let mut failures = Vec::new();
        for entry in self.registry.available_plugins() {
            tracing::debug!("decoding with codec plugin `{}`", entry.name());
            match entry.plugin().decode_frame(fragment, runner) {
                Ok(out) => {
                    *preferred = Some(entry.name().to_owned());
                    return Ok(out);
                }
                Err(e) => {
                    tracing::warn!("codec plugin `{}` failed: {}", entry.name(), e);
                    failures.push(PluginFailure {
                        name: entry.name().to_owned(),
                        message: e.to_string(),
                    });
                }
            }
        }
        decode_error::AllPluginsFailedSnafu { failures }.fail()
    }
}

/// A lazy iterator over the decoded frames of one source.
///
/// Created by [`Decoder::iter_frames`].
#[derive(Debug)]
pub struct DecodeIter<'a> {
    decoder: &'a Decoder,
    runner: Runner<'a>,
    src: PixelSource<'a>,
    available: usize,
    next: usize,
    preferred: Option<String>,
}

impl DecodeIter<'_> {
    /// The number of frames this iterator will yield.
    pub fn frame_count(&self) -> usize {
        self.available
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = DecodeResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.available {
            return None;
        }
        let frame = self.next;
        self.next += 1;
        Some(self.decoder.decode_one(
            &self.src,
            frame,
            self.available,
            &self.runner,
            &mut self.preferred,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.available - self.next;
        (remaining, Some(remaining))
    }
}

/// A lazy iterator over the decoded frames of one source,
/// converting each frame into its own `ndarray` value.
///
/// Created by [`Decoder::iter_ndarray`].
#[derive(Debug)]
pub struct DecodeArrayIter<'a, T> {
    inner: DecodeIter<'a>,
    marker: PhantomData<T>,
}

impl<T> DecodeArrayIter<'_, T> {
    /// The number of frames this iterator will yield.
    pub fn frame_count(&self) -> usize {
        self.inner.frame_count()
    }
}

impl<T> Iterator for DecodeArrayIter<'_, T>
where
    T: NumCast + Copy,
{
    type Item = DecodeResult<ArrayD<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.inner.next()?;
        Some(frame.and_then(|bytes| to_ndarray(&bytes, 1, &self.inner.runner)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
