//! Plugin registry and dispatch behavior of the facades.

use pixelcodec_core::{
    transfer_syntax, ImageDescriptor, PhotometricInterpretation, PixelKeyword,
    PixelRepresentation, TransferSyntax,
};
use pixelcodec_runtime::{
    get_decoder, get_encoder, CodecOptions, CodecPlugin, DecodeError, DecodeResult, EncodeError,
    EncodeResult, PixelSource, RegistryError, Runner,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const RLE_UID: &str = "1.2.840.10008.1.2.5";
const JPEG_2000_UID: &str = "1.2.840.10008.1.2.4.91";

fn descriptor() -> ImageDescriptor {
    ImageDescriptor::new(&transfer_syntax::RLE_LOSSLESS, PixelKeyword::PixelData)
        .with_rows(2)
        .with_columns(2)
        .with_bits_allocated(8)
        .with_bits_stored(8)
        .with_samples_per_pixel(1)
        .with_pixel_representation(PixelRepresentation::Unsigned)
        .with_photometric_interpretation(PhotometricInterpretation::Monochrome2)
}

/// A plugin that claims every syntax and always fails.
#[derive(Debug)]
struct BrokenPlugin {
    calls: Arc<AtomicUsize>,
}

impl CodecPlugin for BrokenPlugin {
    fn name(&self) -> &str {
        "broken"
    }

    fn is_available(&self, _ts: &TransferSyntax) -> bool {
        true
    }

    fn encode_frame(&self, _frame: &[u8], _runner: &Runner) -> EncodeResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        snafu::whatever!("synthetic encoder failure")
    }

    fn decode_frame(&self, _fragment: &[u8], _runner: &Runner) -> DecodeResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        snafu::whatever!("synthetic decoder failure")
    }
}

/// A plugin that is registered but cannot run here.
#[derive(Debug)]
struct GatedPlugin;

impl CodecPlugin for GatedPlugin {
    fn name(&self) -> &str {
        "gated"
    }

    fn is_available(&self, _ts: &TransferSyntax) -> bool {
        false
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["libgated", "gated-runtime"]
    }
}

#[test]
fn dispatch_falls_through_to_the_next_plugin() {
    let descriptor = descriptor();
    let frame = [1u8, 1, 2, 3];
    let calls = Arc::new(AtomicUsize::new(0));

    let mut encoder = get_encoder(RLE_UID).unwrap();
    // put the failing plugin ahead of the built-ins
    let mut registry = pixelcodec_runtime::PluginRegistry::new(&transfer_syntax::RLE_LOSSLESS);
    registry
        .add_plugin(Arc::new(BrokenPlugin {
            calls: Arc::clone(&calls),
        }))
        .unwrap();
    registry
        .add_plugin(Arc::new(pixelcodec_runtime::RleCodecPlugin))
        .unwrap();
    *encoder.registry_mut() = registry;

    let fragment = encoder
        .encode(&descriptor, &frame, None, CodecOptions::new())
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1, "broken plugin was tried");

    let decoder = get_decoder(RLE_UID).unwrap();
    let fragments = vec![fragment];
    let decoded = decoder
        .decode(
            &descriptor,
            &PixelSource::Fragments(&fragments),
            CodecOptions::new(),
        )
        .unwrap();
    assert_eq!(decoded, frame);
}

#[test]
fn all_failures_are_aggregated() {
    let descriptor = descriptor();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut decoder = get_decoder(RLE_UID).unwrap();
    let mut registry = pixelcodec_runtime::PluginRegistry::new(&transfer_syntax::RLE_LOSSLESS);
    registry
        .add_plugin(Arc::new(BrokenPlugin {
            calls: Arc::clone(&calls),
        }))
        .unwrap();
    *decoder.registry_mut() = registry;

    // garbage fragment: only the broken plugin is registered
    let fragments = vec![vec![0u8; 70]];
    let err = decoder
        .decode_frame(
            &descriptor,
            &PixelSource::Fragments(&fragments),
            0,
            CodecOptions::new(),
        )
        .unwrap_err();
    match err {
        DecodeError::AllPluginsFailed { failures } => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].name, "broken");
            assert!(failures[0].message.contains("synthetic decoder failure"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn pinning_an_unknown_plugin_is_an_error() {
    let descriptor = descriptor();
    let encoder = get_encoder(RLE_UID).unwrap();
    let err = encoder
        .encode(
            &descriptor,
            &[1u8, 1, 2, 3],
            None,
            CodecOptions::new().with_plugin("nope"),
        )
        .unwrap_err();
    assert!(matches!(err, EncodeError::UnknownPlugin { name } if name == "nope"));
}

#[test]
fn pinning_an_unavailable_plugin_reports_its_dependencies() {
    let descriptor = descriptor();
    let mut encoder = get_encoder(RLE_UID).unwrap();
    encoder
        .registry_mut()
        .add_plugin(Arc::new(GatedPlugin))
        .unwrap();

    let err = encoder
        .encode(
            &descriptor,
            &[1u8, 1, 2, 3],
            None,
            CodecOptions::new().with_plugin("gated"),
        )
        .unwrap_err();
    match err {
        EncodeError::PluginUnavailable { name, missing } => {
            assert_eq!(name, "gated");
            assert_eq!(missing, vec!["libgated", "gated-runtime"]);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn pinning_the_builtin_codec_works() {
    let descriptor = descriptor();
    let encoder = get_encoder(RLE_UID).unwrap();
    let fragment = encoder
        .encode(
            &descriptor,
            &[1u8, 1, 2, 3],
            None,
            CodecOptions::new().with_plugin("rle"),
        )
        .unwrap();
    assert!(!fragment.is_empty());
}

#[test]
fn syntaxes_without_plugins_report_no_plugins_available() {
    let descriptor = ImageDescriptor::new(&transfer_syntax::JPEG_2000, PixelKeyword::PixelData)
        .with_rows(2)
        .with_columns(2)
        .with_bits_allocated(8)
        .with_bits_stored(8)
        .with_samples_per_pixel(1)
        .with_pixel_representation(PixelRepresentation::Unsigned)
        .with_photometric_interpretation(PhotometricInterpretation::Monochrome2);

    let encoder = get_encoder(JPEG_2000_UID).unwrap();
    assert!(matches!(
        encoder.encode(&descriptor, &[0u8; 4], None, CodecOptions::new()),
        Err(EncodeError::NoPluginsAvailable { .. })
    ));

    let decoder = get_decoder(JPEG_2000_UID).unwrap();
    assert!(!decoder.is_available());
    let fragments = vec![vec![0u8; 4]];
    assert!(matches!(
        decoder.decode_frame(
            &descriptor,
            &PixelSource::Fragments(&fragments),
            0,
            CodecOptions::new(),
        ),
        Err(DecodeError::NoPluginsAvailable { .. })
    ));
}

#[test]
fn registry_rejects_duplicates_and_unknown_removals() {
    let mut registry = pixelcodec_runtime::PluginRegistry::with_defaults(
        &transfer_syntax::RLE_LOSSLESS,
    );
    assert!(matches!(
        registry.add_plugin(Arc::new(pixelcodec_runtime::RleCodecPlugin)),
        Err(RegistryError::DuplicatePlugin { .. })
    ));
    registry.remove_plugin("rle").unwrap();
    assert!(matches!(
        registry.remove_plugin("rle"),
        Err(RegistryError::UnknownPlugin { .. })
    ));
}

#[test]
fn fragments_for_a_native_syntax_are_rejected() {
    let descriptor = ImageDescriptor::new(
        &transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
        PixelKeyword::PixelData,
    )
    .with_rows(2)
    .with_columns(2)
    .with_bits_allocated(8)
    .with_bits_stored(8)
    .with_samples_per_pixel(1)
    .with_pixel_representation(PixelRepresentation::Unsigned)
    .with_photometric_interpretation(PhotometricInterpretation::Monochrome2);

    let decoder = get_decoder("1.2.840.10008.1.2.1").unwrap();
    let fragments = vec![vec![0u8; 4]];
    assert!(matches!(
        decoder.decode_frame(
            &descriptor,
            &PixelSource::Fragments(&fragments),
            0,
            CodecOptions::new(),
        ),
        Err(DecodeError::NotEncapsulated)
    ));
}
