use derive_more::{Display, From, Into};

/// Linear sector address within a disk image.
#[derive(Copy, Clone, Debug, Default, Display, From, Into, Eq, Ord, PartialOrd, PartialEq)]
pub struct SectorId(u32);

impl SectorId {
    /// Sector 0, where the disk label lives.
    pub(crate) const LABEL: Self = Self(0);

    /// Byte offset of this sector for the given block size.
    pub fn byte_offset(self, block_size: usize) -> u64 {
        u64::from(self.0) * block_size as u64
    }
}

impl<I: Into<u32>> core::ops::Add<I> for SectorId {
    type Output = Self;

    fn add(self, rhs: I) -> Self {
        Self(self.0 + rhs.into())
    }
}

impl<I: Into<u32>> core::ops::AddAssign<I> for SectorId {
    fn add_assign(&mut self, rhs: I) {
        self.0 += rhs.into()
    }
}
