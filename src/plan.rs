//! Image planning: ROM limit enforcement, media-region chunking, sequential
//! volume placement, and writing a fresh image.
//!
//! The boot ROM caps every media region at 0xFFFF sectors and the whole
//! disk strictly below 0x80000 sectors; both are checked before a single
//! byte is written.

use std::io::{Seek, SeekFrom, Write};

use crate::error::{Error, Result};
use crate::label::{
    DiskLabel, IplVector, MediaRegion, MAX_REGION_SECTORS, MAX_TOTAL_SECTORS, SECTOR_SIZE,
};
use crate::types::SectorId;
use crate::volume::{VolumeLabel, TYPE_MSDOS};

// Controller defaults for the drives Victor shipped.
const DEFAULT_DEVICE_ID: u16 = 1;
const DEFAULT_REDUCED_CURRENT: u16 = 128;
const DEFAULT_WRITE_PRECOMP: u16 = 128;
const DEFAULT_ECC_BURST: u8 = 11;
const DEFAULT_FAST_STEP: u8 = 7;
const DEFAULT_INTERLEAVE: u8 = 5;

/// Volumes start at sector 2, leaving room for the label sector(s).
const FIRST_VOLUME_SECTOR: u32 = 2;

/// Drive geometry for a new image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub cylinders: u16,
    pub heads: u8,
    pub sectors_per_track: u8,
}

impl Geometry {
    pub fn sectors_per_cylinder(&self) -> u32 {
        u32::from(self.heads) * u32::from(self.sectors_per_track)
    }

    pub fn total_sectors(&self) -> u32 {
        u32::from(self.cylinders) * self.sectors_per_cylinder()
    }

    /// Rejects geometry the boot ROM cannot address.
    pub fn enforce_rom_limits(&self) -> Result<()> {
        let max_cylinders = (MAX_TOTAL_SECTORS - 1) / self.sectors_per_cylinder();
        if u32::from(self.cylinders) > max_cylinders {
            return Err(Error::CapacityExceeded(format!(
                "{} cylinders exceed the ROM limit, at most {} for {} heads x {} sectors/track",
                self.cylinders, max_cylinders, self.heads, self.sectors_per_track
            )));
        }
        Ok(())
    }
}

/// Splits the disk into consecutive media regions of at most
/// [`MAX_REGION_SECTORS`] sectors each, whole cylinders except for the
/// final remainder.
pub fn chunk_regions(total_sectors: u32, heads: u8, sectors_per_track: u8) -> Vec<MediaRegion> {
    let sectors_per_cylinder = u32::from(heads) * u32::from(sectors_per_track);
    let max_cylinder_chunk = (MAX_REGION_SECTORS / sectors_per_cylinder).max(1);
    let max_chunk = (max_cylinder_chunk * sectors_per_cylinder).min(MAX_REGION_SECTORS);

    let mut regions = Vec::new();
    let mut cursor = 0u32;
    let mut remaining = total_sectors;
    while remaining > 0 {
        let chunk = remaining.min(max_chunk);
        regions.push(MediaRegion { address: SectorId::from(cursor), length: chunk });
        cursor += chunk;
        remaining -= chunk;
    }
    regions
}

fn align_to_cylinder(sector: u32, sectors_per_cylinder: u32) -> u32 {
    match sector % sectors_per_cylinder {
        0 => sector,
        remainder => sector + (sectors_per_cylinder - remainder),
    }
}

/// One requested volume, from the `NAME:SIZE_MiB[:AU][:ROOT]` grammar.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeSpec {
    pub name: String,
    pub size_mib: f64,
    /// Sectors per cluster, default 8.
    pub allocation_unit: u16,
    /// Root directory entries, default 512.
    pub root_entries: u16,
}

impl VolumeSpec {
    pub fn size_sectors(&self) -> u32 {
        (self.size_mib * (1024.0 * 1024.0 / SECTOR_SIZE as f64)).round() as u32
    }
}

impl std::str::FromStr for VolumeSpec {
    type Err = String;

    fn from_str(spec: &str) -> core::result::Result<Self, String> {
        let mut parts = spec.split(':');
        let name = match parts.next() {
            Some(name) if !name.is_empty() => name.chars().take(16).collect(),
            _ => return Err(format!("invalid volume spec '{spec}', expected NAME:SIZE[:AU][:ROOT]")),
        };
        let size_mib: f64 = match parts.next() {
            Some(size) => size
                .parse()
                .map_err(|_| format!("invalid volume size in '{spec}'"))?,
            None => return Err(format!("invalid volume spec '{spec}', expected NAME:SIZE[:AU][:ROOT]")),
        };
        let allocation_unit = match parts.next() {
            Some(au) => au.parse().map_err(|_| format!("invalid allocation unit in '{spec}'"))?,
            None => 8,
        };
        let root_entries = match parts.next() {
            Some(root) => root.parse().map_err(|_| format!("invalid root entry count in '{spec}'"))?,
            None => 512,
        };
        if parts.next().is_some() {
            return Err(format!("trailing fields in volume spec '{spec}'"));
        }
        let parsed = Self { name, size_mib, allocation_unit, root_entries };
        if parsed.size_sectors() == 0 {
            return Err(format!("volume '{}' size must be > 0", parsed.name));
        }
        if parsed.allocation_unit == 0 {
            return Err("allocation unit must be positive".to_string());
        }
        if parsed.root_entries == 0 {
            return Err("root directory entries must be positive".to_string());
        }
        Ok(parsed)
    }
}

/// Places volumes sequentially, in input order, starting at `start_sector`.
/// With `align_to_cyl` every volume after the first begins on a cylinder
/// boundary.
pub fn place_volumes(
    specs: &[VolumeSpec],
    total_sectors: u32,
    sectors_per_cylinder: u32,
    start_sector: u32,
    align_to_cyl: bool,
) -> Result<Vec<VolumeLabel>> {
    let mut volumes = Vec::with_capacity(specs.len());
    let mut cursor = start_sector;

    for (index, spec) in specs.iter().enumerate() {
        let size_in_sectors = spec.size_sectors();
        if size_in_sectors > MAX_REGION_SECTORS {
            return Err(Error::CapacityExceeded(format!(
                "volume '{}' is {} sectors, the ROM allows at most {}",
                spec.name, size_in_sectors, MAX_REGION_SECTORS
            )));
        }
        if align_to_cyl && cursor > start_sector {
            cursor = align_to_cylinder(cursor, sectors_per_cylinder);
        }
        let end_sector = cursor + size_in_sectors;
        if end_sector > total_sectors {
            return Err(Error::CapacityExceeded(format!(
                "volumes exceed disk capacity at '{}'",
                spec.name
            )));
        }
        volumes.push(VolumeLabel {
            index,
            address: SectorId::from(cursor),
            partition_type: TYPE_MSDOS,
            name: VolumeLabel::pad_name(&spec.name),
            ipl: IplVector::default(),
            capacity: size_in_sectors,
            // First sector past the Victor volume label.
            data_start: 1,
            host_block_size: SECTOR_SIZE as u16,
            allocation_unit: spec.allocation_unit,
            directory_entries: spec.root_entries,
            reserved: [0; 16],
            assignments: Vec::new(),
        });
        cursor = end_sector;
    }
    Ok(volumes)
}

/// A fully planned image: the disk label and the placed volume labels.
#[derive(Clone, Debug, PartialEq)]
pub struct DiskPlan {
    pub geometry: Geometry,
    pub label: DiskLabel,
    pub volumes: Vec<VolumeLabel>,
}

impl DiskPlan {
    /// Plans a fresh image. All capacity checks happen here; nothing is
    /// written until [`DiskPlan::write`].
    pub fn new(
        geometry: Geometry,
        serial: &str,
        specs: &[VolumeSpec],
        boot_volume: u16,
        align_volumes: bool,
        revision: u16,
    ) -> Result<Self> {
        geometry.enforce_rom_limits()?;
        let total_sectors = geometry.total_sectors();
        let regions = chunk_regions(total_sectors, geometry.heads, geometry.sectors_per_track);
        let volumes = place_volumes(
            specs,
            total_sectors,
            geometry.sectors_per_cylinder(),
            FIRST_VOLUME_SECTOR,
            align_volumes,
        )?;
        if usize::from(boot_volume) >= volumes.len() {
            return Err(Error::VolumeIndexOutOfRange {
                index: usize::from(boot_volume),
                count: volumes.len(),
            });
        }

        let mut serial_bytes = [0u8; 16];
        let raw = serial.as_bytes();
        let len = raw.len().min(16);
        serial_bytes[..len].copy_from_slice(&raw[..len]);

        let label = DiskLabel {
            revision,
            device_id: DEFAULT_DEVICE_ID,
            serial: serial_bytes,
            sector_size: SECTOR_SIZE as u16,
            ipl: IplVector::default(),
            boot_volume,
            cylinders: geometry.cylinders,
            heads: geometry.heads,
            reduced_current: DEFAULT_REDUCED_CURRENT,
            write_precomp: DEFAULT_WRITE_PRECOMP,
            ecc_burst: DEFAULT_ECC_BURST,
            fast_step: DEFAULT_FAST_STEP,
            interleave: DEFAULT_INTERLEAVE,
            spare: [0; 6],
            available: regions.clone(),
            working: regions,
            volume_addresses: volumes.iter().map(|v| v.address).collect(),
        };
        Ok(Self { geometry, label, volumes })
    }

    pub fn total_sectors(&self) -> u32 {
        self.geometry.total_sectors()
    }

    /// Writes the image: full-size zero body, label in sector 0 padded to
    /// one sector, each volume label at its start sector.
    pub fn write<W: Write + Seek>(&self, out: &mut W) -> Result<()> {
        let image_len = u64::from(self.total_sectors()) * SECTOR_SIZE as u64;
        let mut label_sector = self.label.encode();
        if label_sector.len() > SECTOR_SIZE {
            return Err(Error::Format("disk label exceeds one sector"));
        }
        label_sector.resize(SECTOR_SIZE, 0);

        // Pin the file length first; volume labels land inside it.
        out.seek(SeekFrom::Start(image_len - 1))?;
        out.write_all(&[0])?;

        out.seek(SeekFrom::Start(0))?;
        out.write_all(&label_sector)?;
        for volume in &self.volumes {
            out.seek(SeekFrom::Start(volume.address.byte_offset(SECTOR_SIZE)))?;
            out.write_all(&volume.encode()?)?;
        }
        out.flush()?;
        info!(
            "planned image: {} sectors, {} regions, {} volumes",
            self.total_sectors(),
            self.label.available.len(),
            self.volumes.len()
        );
        Ok(())
    }
}
