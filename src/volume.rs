//! Per-volume labels.
//!
//! Every virtual volume carries its own label in the first sector of its
//! extent. The record is little endian throughout, followed by a
//! count-prefixed device-assignment list, and is stored independently of
//! the sector-0 disk label, which only lists the start addresses.

use crate::bytes::{Reader, Writer};
use crate::error::{Error, Result};
use crate::label::{IplVector, SECTOR_SIZE};
use crate::types::SectorId;

/// Partition type code of an MS-DOS volume.
pub const TYPE_MSDOS: u16 = 1;

const TYPE_TEXT: [&str; 9] = [
    "Undefined", "MSDOS", "CP/M", "UNIX", "Custom4", "Custom5", "Custom6", "Custom7", "Custom8",
];

/// Textual name for a partition type code. Total: codes past the table
/// format as their decimal numeral.
pub fn type_text(code: u16) -> String {
    match TYPE_TEXT.get(code as usize) {
        Some(text) => (*text).to_string(),
        None => code.to_string(),
    }
}

/// Maps a device unit to the volume it mounts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeviceAssignment {
    pub device_unit: u16,
    pub volume_index: u16,
}

/// The label embedded at a volume's start sector.
///
/// `index` and `address` come from the disk label's volume-address list and
/// are not part of the on-disk volume record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeLabel {
    pub index: usize,
    pub address: SectorId,
    pub partition_type: u16,
    /// Volume name, zero padded to 16 bytes.
    pub name: [u8; 16],
    pub ipl: IplVector,
    /// Extent in sectors, label sector included. At most 0xFFFF.
    pub capacity: u32,
    /// First data sector, relative to the volume start.
    pub data_start: u32,
    pub host_block_size: u16,
    /// Sectors per FAT cluster.
    pub allocation_unit: u16,
    pub directory_entries: u16,
    pub reserved: [u8; 16],
    pub assignments: Vec<DeviceAssignment>,
}

impl VolumeLabel {
    /// Decodes the volume label stored at `address`, from its boot sector.
    pub fn decode(index: usize, address: SectorId, sector: &[u8]) -> Result<Self> {
        let mut r = Reader::new(sector);
        let partition_type = r.u16_le("volume label truncated")?;
        let name = r.array("volume label truncated")?;
        let ipl = IplVector::decode(&mut r, "volume label truncated")?;
        let capacity = r.u32_le("volume label truncated")?;
        let data_start = r.u32_le("volume label truncated")?;
        let host_block_size = r.u16_le("volume label truncated")?;
        let allocation_unit = r.u16_le("volume label truncated")?;
        let directory_entries = r.u16_le("volume label truncated")?;
        let reserved = r.array("volume label truncated")?;

        let mut assignments = Vec::new();
        for _ in 0..r.u8("assignment count missing")? {
            assignments.push(DeviceAssignment {
                device_unit: r.u16_le("device assignment truncated")?,
                volume_index: r.u16_le("device assignment truncated")?,
            });
        }

        Ok(Self {
            index,
            address,
            partition_type,
            name,
            ipl,
            capacity,
            data_start,
            host_block_size,
            allocation_unit,
            directory_entries,
            reserved,
            assignments,
        })
    }

    /// Encodes the label, zero padded to exactly one sector.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut w = Writer::default();
        w.u16_le(self.partition_type);
        w.bytes(&self.name);
        self.ipl.encode(&mut w);
        w.u32_le(self.capacity);
        w.u32_le(self.data_start);
        w.u16_le(self.host_block_size);
        w.u16_le(self.allocation_unit);
        w.u16_le(self.directory_entries);
        w.bytes(&self.reserved);
        w.u8(self.assignments.len() as u8);
        for assignment in &self.assignments {
            w.u16_le(assignment.device_unit);
            w.u16_le(assignment.volume_index);
        }
        if w.len() > SECTOR_SIZE {
            return Err(Error::Format("volume label exceeds one sector"));
        }
        let mut sector = w.into_vec();
        sector.resize(SECTOR_SIZE, 0);
        Ok(sector)
    }

    /// Builds the 16-byte name field from text, truncating and zero padding.
    pub fn pad_name(name: &str) -> [u8; 16] {
        let mut field = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(16);
        field[..len].copy_from_slice(&bytes[..len]);
        field
    }

    /// Volume name as printable text, trailing NULs stripped.
    pub fn name_text(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(16);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    /// Textual partition type.
    pub fn type_text(&self) -> String {
        type_text(self.partition_type)
    }

    pub fn is_msdos(&self) -> bool {
        self.partition_type == TYPE_MSDOS
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> VolumeLabel {
        VolumeLabel {
            index: 0,
            address: 2.into(),
            partition_type: TYPE_MSDOS,
            name: VolumeLabel::pad_name("SYS"),
            ipl: IplVector::default(),
            capacity: 61440,
            data_start: 1,
            host_block_size: 512,
            allocation_unit: 8,
            directory_entries: 512,
            reserved: [0; 16],
            assignments: vec![
                DeviceAssignment { device_unit: 0, volume_index: 0 },
                DeviceAssignment { device_unit: 1, volume_index: 1 },
            ],
        }
    }

    #[test]
    fn round_trip() {
        let label = sample();
        let sector = label.encode().unwrap();
        assert_eq!(sector.len(), SECTOR_SIZE);
        assert_eq!(VolumeLabel::decode(0, 2.into(), &sector).unwrap(), label);
    }

    #[test]
    fn name_is_zero_padded() {
        let sector = sample().encode().unwrap();
        assert_eq!(&sector[2..5], b"SYS");
        assert_eq!(&sector[5..18], &[0u8; 13]);
    }

    #[test]
    fn oversized_assignment_list_is_an_error() {
        let mut label = sample();
        label.assignments =
            vec![DeviceAssignment { device_unit: 0, volume_index: 0 }; 150];
        assert!(matches!(label.encode(), Err(Error::Format(_))));
    }

    #[test]
    fn assignment_count_beyond_buffer_is_an_error() {
        let mut sector = sample().encode().unwrap();
        // Claim more assignments than the sector holds. The count byte sits
        // right after the 60-byte fixed record.
        sector[60] = 255;
        assert!(VolumeLabel::decode(0, 2.into(), &sector).is_err());
    }

    #[test]
    fn type_text_is_total() {
        assert_eq!(type_text(0), "Undefined");
        assert_eq!(type_text(1), "MSDOS");
        assert_eq!(type_text(2), "CP/M");
        assert_eq!(type_text(3), "UNIX");
        assert_eq!(type_text(8), "Custom8");
        assert_eq!(type_text(9), "9");
        assert_eq!(type_text(4660), "4660");
    }
}
