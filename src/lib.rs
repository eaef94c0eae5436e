#![doc = include_str!("../README.md")]

#[macro_use]
extern crate hex_literal;
#[macro_use]
extern crate log;

mod bytes;
pub mod editor;
pub mod error;
pub mod fat;
pub mod label;
pub mod plan;
pub mod types;
pub mod volume;

pub use editor::{
    extract_volume, insert_volume, read_disk_label, read_volume, read_volumes,
    sanitize_bad_regions,
};
pub use error::{Error, Result};
pub use fat::FatBootSector;
pub use label::{DiskLabel, IplVector, MediaRegion, SECTOR_SIZE};
pub use plan::{DiskPlan, Geometry, VolumeSpec};
pub use types::SectorId;
pub use volume::{DeviceAssignment, VolumeLabel};
