//! Assembly of compressed frames into an encapsulated fragment sequence.

/// The fragments and basic offset table of encapsulated pixel data,
/// ready to be written as a pixel data element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncapsulatedPixels {
    /// One fragment per frame, each padded to an even length.
    pub fragments: Vec<Vec<u8>>,
    /// The byte offset of each fragment's item header,
    /// relative to the first item after the offset table.
    pub basic_offset_table: Vec<u32>,
}

/// Assemble compressed frames into fragments and a basic offset table.
///
/// Each frame becomes exactly one fragment, padded with a single zero
/// byte when its length is odd. Offsets account for the 8-byte item
/// header preceding every fragment.
pub fn encapsulate(frames: Vec<Vec<u8>>) -> EncapsulatedPixels {
    let mut fragments = Vec::with_capacity(frames.len());
    let mut basic_offset_table = Vec::with_capacity(frames.len());
    let mut offset = 0u32;
    for mut frame in frames {
        if frame.len() % 2 != 0 {
            frame.push(0);
        }
        basic_offset_table.push(offset);
        offset += 8 + frame.len() as u32;
        fragments.push(frame);
    }
    EncapsulatedPixels {
        fragments,
        basic_offset_table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_are_even_padded() {
        let out = encapsulate(vec![vec![1, 2, 3], vec![4, 5]]);
        assert_eq!(out.fragments, vec![vec![1, 2, 3, 0], vec![4, 5]]);
    }

    #[test]
    fn offsets_account_for_item_headers() {
        let out = encapsulate(vec![vec![0; 10], vec![0; 7], vec![0; 4]]);
        // 10 + 8 = 18, then 7 padded to 8 plus 8 = 16 more
        assert_eq!(out.basic_offset_table, vec![0, 18, 34]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let out = encapsulate(Vec::new());
        assert!(out.fragments.is_empty());
        assert!(out.basic_offset_table.is_empty());
    }
}
