//! Sector-0 disk label.
//!
//! The label is two fixed records back to back — a little-endian header
//! (written by the operating system) followed by the big-endian parameter
//! block the disk controller consumes — then three count-prefixed lists:
//! available media regions, working media regions and volume start
//! addresses. Each volume's own label lives at its start sector and is
//! handled by [`crate::volume`].

use crate::bytes::{Reader, Writer};
use crate::error::Result;
use crate::types::SectorId;

pub const SECTOR_SIZE: usize = 512;

/// Boot-ROM ceiling on a single media region, in sectors.
pub const MAX_REGION_SECTORS: u32 = 0xFFFF;
/// Total addressable sectors must stay strictly below this.
pub const MAX_TOTAL_SECTORS: u32 = 0x8_0000;
/// Victor hard disks always run 17 sectors per track; the label does not
/// store the value.
pub const SECTORS_PER_TRACK: u32 = 17;

/// Initial-program-load descriptor: where the boot code sits on disk and
/// where it gets loaded and entered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IplVector {
    pub disk_address: u32,
    pub load_address: u16,
    pub load_length: u16,
    pub code_entry: u32,
}

impl IplVector {
    pub(crate) fn decode(r: &mut Reader, what: &'static str) -> Result<Self> {
        Ok(Self {
            disk_address: r.u32_le(what)?,
            load_address: r.u16_le(what)?,
            load_length: r.u16_le(what)?,
            code_entry: r.u32_le(what)?,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.u32_le(self.disk_address);
        w.u16_le(self.load_address);
        w.u16_le(self.load_length);
        w.u32_le(self.code_entry);
    }
}

/// A contiguous run of sectors, used for both the available-media and the
/// working-media lists. The region's index is its position in the list and
/// is not stored on disk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MediaRegion {
    pub address: SectorId,
    pub length: u32,
}

impl MediaRegion {
    fn decode(r: &mut Reader) -> Result<Self> {
        let address = SectorId::from(r.u32_le("media region truncated")?);
        let length = r.u32_le("media region truncated")?;
        Ok(Self { address, length })
    }

    fn encode(&self, w: &mut Writer) {
        w.u32_le(self.address.into());
        w.u32_le(self.length);
    }
}

/// The hard-disk label in sector 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiskLabel {
    /// Label format revision: 1 original, 2 as revised for MS-DOS hdsetup.
    pub revision: u16,
    pub device_id: u16,
    /// ASCII drive serial, zero padded.
    pub serial: [u8; 16],
    /// Must be 512 on a conforming image.
    pub sector_size: u16,
    pub ipl: IplVector,
    /// Index into the volume-address list.
    pub boot_volume: u16,
    // Controller parameter block, big endian on disk.
    pub cylinders: u16,
    pub heads: u8,
    pub reduced_current: u16,
    pub write_precomp: u16,
    pub ecc_burst: u8,
    pub fast_step: u8,
    pub interleave: u8,
    pub spare: [u8; 6],
    pub available: Vec<MediaRegion>,
    pub working: Vec<MediaRegion>,
    pub volume_addresses: Vec<SectorId>,
}

impl DiskLabel {
    /// Decodes a label from the start of `bytes` (normally sector 0).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);

        let revision = r.u16_le("label header truncated")?;
        let device_id = r.u16_le("label header truncated")?;
        let serial = r.array("label header truncated")?;
        let sector_size = r.u16_le("label header truncated")?;
        let ipl = IplVector::decode(&mut r, "label header truncated")?;
        let boot_volume = r.u16_le("label header truncated")?;

        // Controller block switches to big endian mid-sector.
        let cylinders = r.u16_be("control parameters truncated")?;
        let heads = r.u8("control parameters truncated")?;
        let reduced_current = r.u16_be("control parameters truncated")?;
        let write_precomp = r.u16_be("control parameters truncated")?;
        let ecc_burst = r.u8("control parameters truncated")?;
        let fast_step = r.u8("control parameters truncated")?;
        let interleave = r.u8("control parameters truncated")?;
        let spare = r.array("control parameters truncated")?;

        if sector_size != SECTOR_SIZE as u16 {
            warn!("nonstandard sector size {} in disk label", sector_size);
        }

        let mut available = Vec::new();
        for _ in 0..r.u8("available region count missing")? {
            available.push(MediaRegion::decode(&mut r)?);
        }
        let mut working = Vec::new();
        for _ in 0..r.u8("working region count missing")? {
            working.push(MediaRegion::decode(&mut r)?);
        }
        let mut volume_addresses = Vec::new();
        for _ in 0..r.u8("volume count missing")? {
            volume_addresses.push(SectorId::from(r.u32_le("volume address truncated")?));
        }
        debug!(
            "disk label rev {}: {} cylinders, {} heads, {} regions, {} volumes",
            revision,
            cylinders,
            heads,
            available.len(),
            volume_addresses.len()
        );

        Ok(Self {
            revision,
            device_id,
            serial,
            sector_size,
            ipl,
            boot_volume,
            cylinders,
            heads,
            reduced_current,
            write_precomp,
            ecc_burst,
            fast_step,
            interleave,
            spare,
            available,
            working,
            volume_addresses,
        })
    }

    /// Encodes the label. The result is the raw payload; the caller pads it
    /// to one sector when writing an image.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::default();
        w.u16_le(self.revision);
        w.u16_le(self.device_id);
        w.bytes(&self.serial);
        w.u16_le(self.sector_size);
        self.ipl.encode(&mut w);
        w.u16_le(self.boot_volume);

        w.u16_be(self.cylinders);
        w.u8(self.heads);
        w.u16_be(self.reduced_current);
        w.u16_be(self.write_precomp);
        w.u8(self.ecc_burst);
        w.u8(self.fast_step);
        w.u8(self.interleave);
        w.bytes(&self.spare);

        w.u8(self.available.len() as u8);
        for region in &self.available {
            region.encode(&mut w);
        }
        w.u8(self.working.len() as u8);
        for region in &self.working {
            region.encode(&mut w);
        }
        w.u8(self.volume_addresses.len() as u8);
        for address in &self.volume_addresses {
            w.u32_le((*address).into());
        }
        w.into_vec()
    }

    /// Nominal sector count from the label geometry (17 sectors per track).
    pub fn total_sectors(&self) -> u32 {
        u32::from(self.cylinders) * u32::from(self.heads) * SECTORS_PER_TRACK
    }

    /// Serial as printable text, trailing NULs stripped.
    pub fn serial_text(&self) -> String {
        let end = self.serial.iter().position(|&b| b == 0).unwrap_or(16);
        String::from_utf8_lossy(&self.serial[..end]).into_owned()
    }
}
