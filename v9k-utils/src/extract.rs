use std::fs::File;

use v9klabel::{extract_volume, read_disk_label, read_volume, Result};

pub fn extract(image_path: &str, index: usize, output: &str) -> Result<()> {
    let mut image = File::open(image_path)?;
    let label = read_disk_label(&mut image)?;
    let volume = read_volume(&mut image, &label, index)?;
    let mut out = File::create(output)?;
    extract_volume(&mut image, &volume, &mut out)?;
    println!(
        "Extracted volume {:02} '{}' ({} sectors) to {}",
        volume.index,
        volume.name_text(),
        volume.capacity,
        output
    );
    Ok(())
}
