//! Integrity value stored in the first word of the binary record.
//!
//! The algorithm is pluggable. The default, [`Placeholder`], is a wrapping
//! byte sum. It is NOT CRC32 and only catches gross corruption; it stays the
//! default until the on-target algorithm is settled.

pub trait Checksum: std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn compute(&self, data: &[u8]) -> u32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Placeholder;

impl Checksum for Placeholder {
    fn name(&self) -> &'static str {
        "placeholder-sum32"
    }

    fn compute(&self, data: &[u8]) -> u32 {
        data.iter()
            .fold(0u32, |acc, byte| acc.wrapping_add(u32::from(*byte)))
    }
}
