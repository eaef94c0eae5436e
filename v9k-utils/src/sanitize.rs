use std::fs::File;

use v9klabel::{read_disk_label, sanitize_bad_regions, Result};

pub fn sanitize(image_path: &str, output: &str) -> Result<()> {
    let mut image = File::open(image_path)?;
    let label = read_disk_label(&mut image)?;
    if label.available.len() <= 1 {
        println!("{} already reports a single available region, nothing to strip", image_path);
        return Ok(());
    }
    let mut out = File::create(output)?;
    let cleaned = sanitize_bad_regions(&label, &mut image, &mut out)?;
    println!(
        "Stripped {} media regions of {} into one ({} sectors), wrote {}",
        label.available.len(),
        image_path,
        cleaned.available[0].length,
        output
    );
    Ok(())
}
