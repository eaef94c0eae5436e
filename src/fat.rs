//! FAT12 boot-sector derivation.
//!
//! An MS-DOS volume on a Victor disk stores no BPB of its own; the boot
//! sector of an extracted image is computed from the volume label. Two
//! different rounding rules are in play and they are deliberately not the
//! same helper: FAT sizing always adds a sector even when the division is
//! exact (that is what hdsetup-era MS-DOS allocates), while directory
//! sizing is a true ceiling.

use crate::bytes::Writer;
use crate::error::{Error, Result};
use crate::volume::VolumeLabel;

/// x86 jump over the BPB, as DOS 3.x writes it.
pub const JUMP_CODE: [u8; 3] = hex!("EB 3C 90");
pub const OEM_NAME: [u8; 8] = *b"MSDOS3.1";
/// Media descriptor for a fixed disk.
pub const MEDIA_FIXED_DISK: u8 = 0xF8;
const BOOT_SIGNATURE: [u8; 2] = hex!("55 AA");

/// Fixed CHS values for the generated boot sector; the volume label does
/// not carry geometry.
const DEFAULT_HEADS: u16 = 8;
const DEFAULT_SECTORS_PER_TRACK: u16 = 17;

/// FAT size in sectors for a volume: floor of the FAT byte count over the
/// sector size, plus one sector unconditionally — even when the division is
/// exact. Not a ceiling; do not fold into [`directory_sectors`].
pub fn fat_size_sectors(capacity: u32, allocation_unit: u16, bytes_per_sector: u16) -> u32 {
    let cluster_count = capacity / u32::from(allocation_unit);
    fat_table_bytes(cluster_count) / u32::from(bytes_per_sector) + 1
}

/// FAT12 table bytes: 1.5 bytes per cluster, the exact half rounding to
/// even.
fn fat_table_bytes(cluster_count: u32) -> u32 {
    let halves = cluster_count * 3;
    let whole = halves / 2;
    if halves % 2 != 0 && whole % 2 != 0 {
        whole + 1
    } else {
        whole
    }
}

/// Root directory size in sectors: true ceiling of 32 bytes per entry over
/// the sector size.
pub fn directory_sectors(directory_entries: u16, bytes_per_sector: u16) -> u32 {
    let bytes = u32::from(directory_entries) * 32;
    let quotient = bytes / u32::from(bytes_per_sector);
    if bytes % u32::from(bytes_per_sector) != 0 {
        quotient + 1
    } else {
        quotient
    }
}

/// Boot-sector parameters derived from a volume label. Never stored back
/// into the disk image; only an extracted standalone image carries them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FatBootSector {
    pub jump: [u8; 3],
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_dir_entries: u16,
    pub total_sectors_16: u16,
    pub media_descriptor: u8,
    pub fat_size_sectors: u16,
    pub sectors_per_track: u16,
    pub heads: u16,
    pub hidden_sectors: u32,
    /// Zero while capacity fits in `total_sectors_16`, which the ROM limit
    /// guarantees. Not part of the written record.
    pub total_sectors_32: u32,
}

impl FatBootSector {
    /// Derives boot-sector parameters from a volume label.
    pub fn derive(volume: &VolumeLabel) -> Self {
        let bytes_per_sector = volume.host_block_size;
        Self {
            jump: JUMP_CODE,
            oem_name: OEM_NAME,
            bytes_per_sector,
            sectors_per_cluster: volume.allocation_unit as u8,
            reserved_sectors: 1,
            num_fats: 2,
            root_dir_entries: volume.directory_entries,
            total_sectors_16: volume.capacity as u16,
            media_descriptor: MEDIA_FIXED_DISK,
            fat_size_sectors: fat_size_sectors(
                volume.capacity,
                volume.allocation_unit,
                bytes_per_sector,
            ) as u16,
            sectors_per_track: DEFAULT_SECTORS_PER_TRACK,
            heads: DEFAULT_HEADS,
            hidden_sectors: 0,
            total_sectors_32: 0,
        }
    }

    /// Serializes the boot sector: the fixed record through the hidden
    /// sector count, zero padding, and the 0x55 0xAA signature in the last
    /// two bytes. The result is exactly `block_size` bytes.
    pub fn serialize(&self, block_size: usize) -> Result<Vec<u8>> {
        let mut w = Writer::default();
        w.bytes(&self.jump);
        w.bytes(&self.oem_name);
        w.u16_le(self.bytes_per_sector);
        w.u8(self.sectors_per_cluster);
        w.u16_le(self.reserved_sectors);
        w.u8(self.num_fats);
        w.u16_le(self.root_dir_entries);
        w.u16_le(self.total_sectors_16);
        w.u8(self.media_descriptor);
        w.u16_le(self.fat_size_sectors);
        w.u16_le(self.sectors_per_track);
        w.u16_le(self.heads);
        w.u32_le(self.hidden_sectors);

        if w.len() + BOOT_SIGNATURE.len() > block_size {
            return Err(Error::Format("boot-sector record exceeds block size"));
        }
        let mut sector = w.into_vec();
        sector.resize(block_size - BOOT_SIGNATURE.len(), 0);
        sector.extend_from_slice(&BOOT_SIGNATURE);
        Ok(sector)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::label::IplVector;
    use crate::volume::{VolumeLabel, TYPE_MSDOS};

    fn volume(capacity: u32, allocation_unit: u16, directory_entries: u16) -> VolumeLabel {
        VolumeLabel {
            index: 0,
            address: 2.into(),
            partition_type: TYPE_MSDOS,
            name: VolumeLabel::pad_name("SYS"),
            ipl: IplVector::default(),
            capacity,
            data_start: 1,
            host_block_size: 512,
            allocation_unit,
            directory_entries,
            reserved: [0; 16],
            assignments: Vec::new(),
        }
    }

    #[test]
    fn fat_sizing_example() {
        // 7650 clusters, 11475 FAT bytes, 22 full sectors plus the extra one.
        assert_eq!(fat_size_sectors(61200, 8, 512), 23);
    }

    #[test]
    fn fat_sizing_adds_a_sector_even_on_exact_division() {
        // 1024 clusters * 1.5 = 1536 bytes = exactly 3 sectors, sized as 4.
        assert_eq!(fat_size_sectors(8192, 8, 512), 4);
    }

    #[test]
    fn directory_sizing_is_a_true_ceiling() {
        assert_eq!(directory_sectors(512, 512), 32);
        assert_eq!(directory_sectors(513, 512), 33);
        assert_eq!(directory_sectors(1, 512), 1);
        assert_eq!(directory_sectors(0, 512), 0);
    }

    #[test]
    fn serialized_layout() {
        let boot = FatBootSector::derive(&volume(61200, 8, 512));
        let sector = boot.serialize(512).unwrap();
        assert_eq!(sector.len(), 512);
        assert_eq!(&sector[0..3], &hex!("EB 3C 90"));
        assert_eq!(&sector[3..11], b"MSDOS3.1");
        assert_eq!(u16::from_le_bytes([sector[11], sector[12]]), 512);
        assert_eq!(sector[13], 8); // sectors per cluster
        assert_eq!(u16::from_le_bytes([sector[14], sector[15]]), 1); // reserved
        assert_eq!(sector[16], 2); // FATs
        assert_eq!(u16::from_le_bytes([sector[17], sector[18]]), 512); // root entries
        assert_eq!(u16::from_le_bytes([sector[19], sector[20]]), 61200); // total sectors
        assert_eq!(sector[21], 0xF8);
        assert_eq!(u16::from_le_bytes([sector[22], sector[23]]), 23); // FAT size
        assert_eq!(u16::from_le_bytes([sector[24], sector[25]]), 17);
        assert_eq!(u16::from_le_bytes([sector[26], sector[27]]), 8);
        assert_eq!(&sector[28..32], &[0; 4]); // hidden sectors
        assert_eq!(&sector[510..512], &hex!("55 AA"));
        // Everything between the record and the signature is zero padding.
        assert!(sector[32..510].iter().all(|&b| b == 0));
    }

    #[test]
    fn record_must_fit_the_block() {
        let boot = FatBootSector::derive(&volume(61200, 8, 512));
        assert!(boot.serialize(16).is_err());
        assert!(boot.serialize(34).is_ok());
    }
}
