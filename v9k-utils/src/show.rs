use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use pretty_hex::PrettyHex;
use v9klabel::fat::{directory_sectors, fat_size_sectors};
use v9klabel::{read_disk_label, read_volumes, Result, SECTOR_SIZE};

pub fn show(image_path: &str, hex: bool) -> Result<()> {
    let mut image = File::open(image_path)?;
    let label = read_disk_label(&mut image)?;

    println!("Disk label of {}", image_path);
    println!("  Revision: {}  Device id: {}", label.revision, label.device_id);
    println!("  Serial: '{}'", label.serial_text());
    println!("  Sector size: {}", label.sector_size);
    println!(
        "  Geometry: {} cylinders, {} heads ({} nominal sectors)",
        label.cylinders,
        label.heads,
        label.total_sectors()
    );
    println!(
        "  Tuning: reduced-current={} write-precomp={} ecc-burst={} fast-step={} interleave={}",
        label.reduced_current,
        label.write_precomp,
        label.ecc_burst,
        label.fast_step,
        label.interleave
    );
    println!("  Primary boot volume: {}", label.boot_volume);

    for (index, region) in label.available.iter().enumerate() {
        println!("  Available region {}: start={} length={}", index, region.address, region.length);
    }
    for (index, region) in label.working.iter().enumerate() {
        println!("  Working region {}: start={} length={}", index, region.address, region.length);
    }

    let volumes = read_volumes(&mut image, &label)?;
    for volume in &volumes {
        println!(
            "  Volume {:02} '{}' ({}): start={} sectors={} data-start={} au={} root-entries={}",
            volume.index,
            volume.name_text(),
            volume.type_text(),
            volume.address,
            volume.capacity,
            volume.data_start,
            volume.allocation_unit,
            volume.directory_entries
        );
        for assignment in &volume.assignments {
            println!(
                "    Assignment: unit {} -> volume {}",
                assignment.device_unit, assignment.volume_index
            );
        }
        if volume.is_msdos() {
            let clusters = volume.capacity / u32::from(volume.allocation_unit);
            println!(
                "    FAT12: {} clusters, {} sectors/FAT, {} directory sectors",
                clusters,
                fat_size_sectors(volume.capacity, volume.allocation_unit, volume.host_block_size),
                directory_sectors(volume.directory_entries, volume.host_block_size)
            );
        }
    }

    if hex {
        let mut sector = [0u8; SECTOR_SIZE];
        image.seek(SeekFrom::Start(0))?;
        image.read_exact(&mut sector)?;
        println!("{:?}", sector.hex_dump());
    }
    Ok(())
}
