use std::fs::{self, File};

use v9klabel::{insert_volume, read_disk_label, read_volume, Result};

pub fn insert(image_path: &str, index: usize, replacement_path: &str, output: &str) -> Result<()> {
    let mut image = File::open(image_path)?;
    let label = read_disk_label(&mut image)?;
    let volume = read_volume(&mut image, &label, index)?;
    let replacement = fs::read(replacement_path)?;
    let mut out = File::create(output)?;
    insert_volume(&mut image, &replacement, &volume, &mut out)?;
    println!(
        "Spliced {} into volume {:02} '{}' of {}, wrote {}",
        replacement_path,
        volume.index,
        volume.name_text(),
        image_path,
        output
    );
    Ok(())
}
