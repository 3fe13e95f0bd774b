//! Byte geometry of the binary record.
//!
//! This is the only place that knows where a field lives. The encoder and
//! the decoder both walk [`Layout::fields`], so a field can never be written
//! at one offset and read back from another.
//!
//! ```text
//! offset  size  field
//!      0     4  crc_32
//!      4     4  version
//!      8     4  active_index
//!     12     4  previous_active_index
//!     16     4  nb_fw_img
//!     20     4  nb_fw_banks
//!     24     8  bank (0, 0): accepted u32, reserved u32
//!     32     8  bank (0, 1)
//!    ...        images outer, banks inner
//! ```
//!
//! All words are little-endian `u32`.

use crate::error::{FwumdError, Result};
use crate::model::Dims;
use std::fmt;
use std::ops::Range;

pub const WORD_SIZE: usize = 4;
pub const HEADER_SIZE: usize = 6 * WORD_SIZE;
pub const BANK_ENTRY_SIZE: usize = 2 * WORD_SIZE;
/// Largest record a 32-bit size can describe.
pub const MAX_RECORD_SIZE: usize = u32::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Checksum,
    Version,
    ActiveIndex,
    PreviousActiveIndex,
    NbFwImg,
    NbFwBanks,
    Accepted { image: usize, bank: usize },
    Reserved { image: usize, bank: usize },
}

impl Field {
    pub const HEADER: [Field; 6] = [
        Field::Checksum,
        Field::Version,
        Field::ActiveIndex,
        Field::PreviousActiveIndex,
        Field::NbFwImg,
        Field::NbFwBanks,
    ];

    /// Offset of a header field; header offsets do not depend on dimensions.
    pub fn header_offset(self) -> Option<usize> {
        let slot = match self {
            Field::Checksum => 0,
            Field::Version => 1,
            Field::ActiveIndex => 2,
            Field::PreviousActiveIndex => 3,
            Field::NbFwImg => 4,
            Field::NbFwBanks => 5,
            Field::Accepted { .. } | Field::Reserved { .. } => return None,
        };
        Some(slot * WORD_SIZE)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Checksum => write!(f, "crc_32"),
            Field::Version => write!(f, "version"),
            Field::ActiveIndex => write!(f, "active_index"),
            Field::PreviousActiveIndex => write!(f, "previous_active_index"),
            Field::NbFwImg => write!(f, "nb_fw_img"),
            Field::NbFwBanks => write!(f, "nb_fw_banks"),
            Field::Accepted { image, bank } => write!(f, "img[{}].bank[{}].accepted", image, bank),
            Field::Reserved { image, bank } => write!(f, "img[{}].bank[{}].reserved", image, bank),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpan {
    pub field: Field,
    pub offset: usize,
}

impl FieldSpan {
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + WORD_SIZE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    dims: Dims,
    total_size: usize,
}

impl Layout {
    /// Derives the geometry for `dims`, failing if the size overflows or
    /// exceeds [`MAX_RECORD_SIZE`].
    pub fn for_dims(dims: Dims) -> Result<Self> {
        let total_size = dims
            .nb_fw_img
            .checked_mul(dims.nb_fw_banks)
            .and_then(|banks| banks.checked_mul(BANK_ENTRY_SIZE))
            .and_then(|body| body.checked_add(HEADER_SIZE))
            .filter(|size| *size <= MAX_RECORD_SIZE)
            .ok_or_else(|| {
                FwumdError::LayoutMismatch(format!("{} does not fit a 32-bit record", dims))
            })?;
        Ok(Self { dims, total_size })
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Offset of `field`, or `None` for a bank outside these dimensions.
    pub fn offset(&self, field: Field) -> Option<usize> {
        if let Some(offset) = field.header_offset() {
            return Some(offset);
        }
        let (image, bank, word) = match field {
            Field::Accepted { image, bank } => (image, bank, 0),
            Field::Reserved { image, bank } => (image, bank, WORD_SIZE),
            _ => return None,
        };
        if image >= self.dims.nb_fw_img || bank >= self.dims.nb_fw_banks {
            return None;
        }
        let entry = image * self.dims.nb_fw_banks + bank;
        Some(HEADER_SIZE + entry * BANK_ENTRY_SIZE + word)
    }

    /// Every field in file order.
    pub fn fields(&self) -> impl Iterator<Item = FieldSpan> + '_ {
        let header = Field::HEADER.into_iter();
        let banks = (0..self.dims.nb_fw_img).flat_map(move |image| {
            (0..self.dims.nb_fw_banks).flat_map(move |bank| {
                [
                    Field::Accepted { image, bank },
                    Field::Reserved { image, bank },
                ]
            })
        });
        header.chain(banks).filter_map(move |field| {
            self.offset(field).map(|offset| FieldSpan { field, offset })
        })
    }

    /// Bytes covered by the checksum: everything after the checksum word.
    pub fn checksummed(&self) -> Range<usize> {
        WORD_SIZE..self.total_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_offsets_are_fixed() {
        for dims in [Dims::new(1, 1), Dims::new(4, 3), Dims::new(16, 2)] {
            let layout = Layout::for_dims(dims).unwrap();
            assert_eq!(layout.offset(Field::Checksum), Some(0));
            assert_eq!(layout.offset(Field::Version), Some(4));
            assert_eq!(layout.offset(Field::ActiveIndex), Some(8));
            assert_eq!(layout.offset(Field::PreviousActiveIndex), Some(12));
            assert_eq!(layout.offset(Field::NbFwImg), Some(16));
            assert_eq!(layout.offset(Field::NbFwBanks), Some(20));
        }
    }

    #[test]
    fn size_scales_with_images_times_banks() {
        assert_eq!(Layout::for_dims(Dims::new(1, 2)).unwrap().total_size(), 40);
        assert_eq!(Layout::for_dims(Dims::new(2, 2)).unwrap().total_size(), 56);
        assert_eq!(Layout::for_dims(Dims::new(3, 4)).unwrap().total_size(), 120);
        assert_eq!(
            Layout::for_dims(Dims::new(0, 7)).unwrap().total_size(),
            HEADER_SIZE
        );
    }

    #[test]
    fn bank_fields_follow_image_major_order() {
        let layout = Layout::for_dims(Dims::new(2, 3)).unwrap();
        assert_eq!(
            layout.offset(Field::Accepted { image: 0, bank: 0 }),
            Some(24)
        );
        assert_eq!(
            layout.offset(Field::Reserved { image: 0, bank: 0 }),
            Some(28)
        );
        assert_eq!(
            layout.offset(Field::Accepted { image: 1, bank: 0 }),
            Some(24 + 3 * 8)
        );
        assert_eq!(layout.offset(Field::Accepted { image: 2, bank: 0 }), None);
        assert_eq!(layout.offset(Field::Reserved { image: 0, bank: 3 }), None);
    }

    #[test]
    fn fields_tile_the_buffer_exactly() {
        let layout = Layout::for_dims(Dims::new(3, 2)).unwrap();
        let mut expected = 0;
        let mut count = 0;
        for span in layout.fields() {
            assert_eq!(span.offset, expected, "gap or overlap at {:?}", span.field);
            expected = span.range().end;
            count += 1;
        }
        assert_eq!(expected, layout.total_size());
        assert_eq!(count, 6 + 3 * 2 * 2);
    }

    #[test]
    fn overflowing_dims_are_rejected() {
        let err = Layout::for_dims(Dims::new(usize::MAX, 2)).unwrap_err();
        assert!(matches!(err, FwumdError::LayoutMismatch(_)));
    }

    #[test]
    fn record_size_is_capped_at_u32() {
        let largest = Layout::for_dims(Dims::new(1, 536_870_908)).unwrap();
        assert!(largest.total_size() <= MAX_RECORD_SIZE);
        assert!(Layout::for_dims(Dims::new(1, 536_870_909)).is_err());
        assert!(Layout::for_dims(Dims::new(u32::MAX as usize + 1, 1)).is_err());
    }

    #[test]
    fn field_names_are_stable() {
        assert_eq!(Field::Checksum.to_string(), "crc_32");
        assert_eq!(
            Field::Reserved { image: 1, bank: 0 }.to_string(),
            "img[1].bank[0].reserved"
        );
    }

    #[test]
    fn checksum_covers_everything_but_itself() {
        let layout = Layout::for_dims(Dims::new(1, 2)).unwrap();
        assert_eq!(layout.checksummed(), 4..40);
    }
}
