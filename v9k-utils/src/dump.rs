use std::fs::File;

use v9klabel::{extract_volume, read_disk_label, read_volumes, Result};

pub fn dump(image_path: &str, prefix: &str) -> Result<()> {
    let mut image = File::open(image_path)?;
    let label = read_disk_label(&mut image)?;
    let volumes = read_volumes(&mut image, &label)?;
    for volume in &volumes {
        if !volume.is_msdos() {
            println!(
                "Skipping volume {:02} '{}': type {}",
                volume.index,
                volume.name_text(),
                volume.type_text()
            );
            continue;
        }
        let output = format!("{}{:02}.img", prefix, volume.index);
        let mut out = File::create(&output)?;
        extract_volume(&mut image, volume, &mut out)?;
        println!(
            "Extracted volume {:02} '{}' ({} sectors) to {}",
            volume.index,
            volume.name_text(),
            volume.capacity,
            output
        );
    }
    Ok(())
}
