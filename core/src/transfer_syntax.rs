//! Module containing the transfer syntax descriptor table.
//!
//! A [`TransferSyntax`] identifies both the wire encoding of a pixel data
//! stream and, for native (non-encapsulated) syntaxes, the byte order of
//! the sample values. The constants exported here cover the syntaxes known
//! to this library; [`from_uid`] resolves a UID string into one of them.

use byteordered::Endianness;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// How the pixel data of a transfer syntax is laid out on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TsKind {
    /// Flat pixel data, written directly in the syntax's byte order.
    Native,
    /// Pixel data encapsulated in fragments, one or more per frame,
    /// produced and consumed by a codec.
    Encapsulated,
}

/// A transfer syntax specifier.
///
/// Only the properties which affect pixel data handling are kept here:
/// the byte order of native sample values and whether the pixel data
/// is encapsulated.
#[derive(Debug)]
pub struct TransferSyntax {
    /// The unique identifier of the transfer syntax.
    uid: &'static str,
    /// The name of the transfer syntax.
    name: &'static str,
    /// The byte order of native sample values.
    byte_order: Endianness,
    /// The pixel data layout of this transfer syntax.
    kind: TsKind,
}

impl TransferSyntax {
    pub(crate) const fn new(
        uid: &'static str,
        name: &'static str,
        byte_order: Endianness,
        kind: TsKind,
    ) -> Self {
        TransferSyntax {
            uid,
            name,
            byte_order,
            kind,
        }
    }

    /// Obtain this transfer syntax' unique identifier.
    pub const fn uid(&self) -> &'static str {
        self.uid
    }

    /// Obtain the name of this transfer syntax.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Obtain this transfer syntax' expected endianness
    /// for native sample values.
    pub const fn endianness(&self) -> Endianness {
        self.byte_order
    }

    /// Obtain the pixel data layout of this transfer syntax.
    pub const fn kind(&self) -> TsKind {
        self.kind
    }

    /// Whether pixel data in this transfer syntax is encapsulated.
    pub fn is_encapsulated(&self) -> bool {
        matches!(self.kind, TsKind::Encapsulated)
    }

    /// Whether this transfer syntax belongs to the JPEG-LS family,
    /// which consumes multi-sample input in plane-major order.
    pub fn is_jpeg_ls(&self) -> bool {
        matches!(self.uid, "1.2.840.10008.1.2.4.80" | "1.2.840.10008.1.2.4.81")
    }
}

impl PartialEq for TransferSyntax {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for TransferSyntax {}

/// Implicit VR Little Endian: Default Transfer Syntax
pub static IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2",
    "Implicit VR Little Endian",
    Endianness::Little,
    TsKind::Native,
);

/// Explicit VR Little Endian
pub static EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.1",
    "Explicit VR Little Endian",
    Endianness::Little,
    TsKind::Native,
);

/// Deflated Explicit VR Little Endian
pub static DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.1.99",
    "Deflated Explicit VR Little Endian",
    Endianness::Little,
    TsKind::Native,
);

/// Encapsulated Uncompressed Explicit VR Little Endian
pub static ENCAPSULATED_UNCOMPRESSED: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.1.98",
    "Encapsulated Uncompressed Explicit VR Little Endian",
    Endianness::Little,
    TsKind::Encapsulated,
);

/// Explicit VR Big Endian
pub static EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.2",
    "Explicit VR Big Endian",
    Endianness::Big,
    TsKind::Native,
);

/// JPEG Baseline (Process 1)
pub static JPEG_BASELINE: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.50",
    "JPEG Baseline (Process 1)",
    Endianness::Little,
    TsKind::Encapsulated,
);

/// JPEG Extended (Process 2 & 4)
pub static JPEG_EXTENDED: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.51",
    "JPEG Extended (Process 2 & 4)",
    Endianness::Little,
    TsKind::Encapsulated,
);

/// JPEG Lossless, Non-Hierarchical, First-Order Prediction
pub static JPEG_LOSSLESS_SV1: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.70",
    "JPEG Lossless, Non-Hierarchical, First-Order Prediction",
    Endianness::Little,
    TsKind::Encapsulated,
);

/// JPEG-LS Lossless Image Compression
pub static JPEG_LS_LOSSLESS: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.80",
    "JPEG-LS Lossless Image Compression",
    Endianness::Little,
    TsKind::Encapsulated,
);

/// JPEG-LS Lossy (Near-Lossless) Image Compression
pub static JPEG_LS_NEAR_LOSSLESS: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.81",
    "JPEG-LS Lossy (Near-Lossless) Image Compression",
    Endianness::Little,
    TsKind::Encapsulated,
);

/// JPEG 2000 Image Compression (Lossless Only)
pub static JPEG_2000_LOSSLESS: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.90",
    "JPEG 2000 Image Compression (Lossless Only)",
    Endianness::Little,
    TsKind::Encapsulated,
);

/// JPEG 2000 Image Compression
pub static JPEG_2000: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.91",
    "JPEG 2000 Image Compression",
    Endianness::Little,
    TsKind::Encapsulated,
);

/// RLE Lossless
pub static RLE_LOSSLESS: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.5",
    "RLE Lossless",
    Endianness::Little,
    TsKind::Encapsulated,
);

lazy_static! {
    static ref REGISTRY: HashMap<&'static str, &'static TransferSyntax> = {
        let mut m = HashMap::<&'static str, &'static TransferSyntax>::new();
        for ts in [
            &IMPLICIT_VR_LITTLE_ENDIAN,
            &EXPLICIT_VR_LITTLE_ENDIAN,
            &DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
            &ENCAPSULATED_UNCOMPRESSED,
            &EXPLICIT_VR_BIG_ENDIAN,
            &JPEG_BASELINE,
            &JPEG_EXTENDED,
            &JPEG_LOSSLESS_SV1,
            &JPEG_LS_LOSSLESS,
            &JPEG_LS_NEAR_LOSSLESS,
            &JPEG_2000_LOSSLESS,
            &JPEG_2000,
            &RLE_LOSSLESS,
        ] {
            m.insert(ts.uid(), ts);
        }
        m
    };
}

/// Obtain a transfer syntax descriptor by its UID.
///
/// This function is robust to the presence of a single trailing
/// null character (`\0`) in `uid`, which is common in UIDs read
/// straight out of a data set with even-length padding.
pub fn from_uid(uid: &str) -> Option<&'static TransferSyntax> {
    let uid = uid.strip_suffix('\0').unwrap_or(uid);
    REGISTRY.get(uid).copied()
}
