use std::fs::File;

use v9klabel::{DiskPlan, Geometry, Result, VolumeSpec, SECTOR_SIZE};

pub fn create(
    output: &str,
    geometry: Geometry,
    serial: &str,
    specs: &[VolumeSpec],
    boot_volume: u16,
    align_volumes: bool,
    label_revision: u16,
) -> Result<()> {
    let plan = DiskPlan::new(geometry, serial, specs, boot_volume, align_volumes, label_revision)?;
    let mut file = File::create(output)?;
    plan.write(&mut file)?;

    let image_bytes = u64::from(plan.total_sectors()) * SECTOR_SIZE as u64;
    println!("Created {} ({} MiB)", output, image_bytes / (1024 * 1024));
    println!(
        "  Geometry: {} cylinders, {} heads, {} sectors/track",
        geometry.cylinders, geometry.heads, geometry.sectors_per_track
    );
    println!("  Total sectors: {}", plan.total_sectors());
    for (index, region) in plan.label.available.iter().enumerate() {
        println!("  Media region {}: start={} length={}", index, region.address, region.length);
    }
    for volume in &plan.volumes {
        println!(
            "  Volume {:02} '{}': start={} sectors={}",
            volume.index,
            volume.name_text(),
            volume.address,
            volume.capacity
        );
    }
    Ok(())
}
