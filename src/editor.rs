//! Sector-level volume editing.
//!
//! Every operation reads a seekable source image and produces a fresh
//! output stream; the source is never mutated in place, so a failed
//! operation cannot leave a half-written image behind.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{Error, Result};
use crate::fat::{directory_sectors, FatBootSector};
use crate::label::{DiskLabel, MediaRegion, SECTOR_SIZE};
use crate::types::SectorId;
use crate::volume::VolumeLabel;

/// Reads and decodes the disk label from sector 0.
pub fn read_disk_label<R: Read + Seek>(image: &mut R) -> Result<DiskLabel> {
    let mut sector = [0u8; SECTOR_SIZE];
    image.seek(SeekFrom::Start(SectorId::LABEL.byte_offset(SECTOR_SIZE)))?;
    image.read_exact(&mut sector)?;
    DiskLabel::decode(&sector)
}

/// Reads the volume label for `index` from its start sector.
pub fn read_volume<R: Read + Seek>(
    image: &mut R,
    label: &DiskLabel,
    index: usize,
) -> Result<VolumeLabel> {
    let address = *label
        .volume_addresses
        .get(index)
        .ok_or(Error::VolumeIndexOutOfRange { index, count: label.volume_addresses.len() })?;
    let mut sector = [0u8; SECTOR_SIZE];
    image.seek(SeekFrom::Start(address.byte_offset(SECTOR_SIZE)))?;
    image.read_exact(&mut sector)?;
    VolumeLabel::decode(index, address, &sector)
}

/// Reads every volume label the disk label lists.
pub fn read_volumes<R: Read + Seek>(image: &mut R, label: &DiskLabel) -> Result<Vec<VolumeLabel>> {
    (0..label.volume_addresses.len()).map(|index| read_volume(image, label, index)).collect()
}

/// Extracts an MS-DOS volume to a standalone FAT12 image: a generated boot
/// sector followed by the volume's data sectors.
pub fn extract_volume<R: Read + Seek, W: Write>(
    image: &mut R,
    volume: &VolumeLabel,
    out: &mut W,
) -> Result<()> {
    if !volume.is_msdos() {
        return Err(Error::UnsupportedVolumeType {
            type_code: volume.partition_type,
            type_text: volume.type_text(),
        });
    }
    let block = usize::from(volume.host_block_size);

    let mut boot = FatBootSector::derive(volume);
    // PC-DOS sizes the root directory in whole sectors; regenerate the
    // entry count from the rounded size rather than trusting the label.
    let dir_sectors = directory_sectors(volume.directory_entries, volume.host_block_size);
    boot.root_dir_entries = (dir_sectors * u32::from(volume.host_block_size) / 32) as u16;
    out.write_all(&boot.serialize(block)?)?;

    image.seek(SeekFrom::Start((volume.address + 1u32).byte_offset(block)))?;
    let mut buf = vec![0u8; block];
    for _ in 1..volume.capacity {
        image.read_exact(&mut buf)?;
        out.write_all(&buf)?;
    }
    out.flush()?;
    Ok(())
}

/// Splices `replacement` into the volume's sector range, copying everything
/// else from the source unchanged. The volume's own label block is never
/// overwritten; once the replacement runs out, the remaining blocks in the
/// range keep the original data.
pub fn insert_volume<R: Read + Seek, W: Write>(
    image: &mut R,
    replacement: &[u8],
    volume: &VolumeLabel,
    out: &mut W,
) -> Result<()> {
    let block = usize::from(volume.host_block_size);
    let expected = u64::from(volume.capacity) * block as u64;
    if replacement.len() as u64 != expected {
        warn!(
            "replacement is {} bytes but volume '{}' holds {}; unmatched blocks keep the original data",
            replacement.len(),
            volume.name_text(),
            expected
        );
    }
    let first = u64::from(u32::from(volume.address)) + 1;
    let last = u64::from(u32::from(volume.address)) + u64::from(volume.capacity);

    image.seek(SeekFrom::Start(0))?;
    let mut buf = vec![0u8; block];
    let mut offset = 0usize;
    let mut index = 0u64;
    loop {
        let n = read_block(image, &mut buf)?;
        if n == 0 {
            break;
        }
        if (first..=last).contains(&index) && offset < replacement.len() {
            let take = (replacement.len() - offset).min(n);
            buf[..take].copy_from_slice(&replacement[offset..offset + take]);
            offset += take;
        }
        out.write_all(&buf[..n])?;
        index += 1;
    }
    out.flush()?;
    Ok(())
}

/// Collapses the available-media list into one synthetic region spanning
/// the nominal geometry and packs the data of every original region
/// contiguously behind the rewritten label, dropping the bad gaps. The
/// output keeps the source's byte length, zero padded.
pub fn sanitize_bad_regions<R: Read + Seek, W: Write>(
    label: &DiskLabel,
    image: &mut R,
    out: &mut W,
) -> Result<DiskLabel> {
    let input_len = image.seek(SeekFrom::End(0))?;
    let full = MediaRegion { address: SectorId::LABEL, length: label.total_sectors() };
    let mut cleaned = label.clone();
    cleaned.available = vec![full];
    cleaned.working = vec![full];

    let mut label_sector = cleaned.encode();
    if label_sector.len() > SECTOR_SIZE {
        return Err(Error::Format("disk label exceeds one sector"));
    }
    label_sector.resize(SECTOR_SIZE, 0);
    out.write_all(&label_sector)?;
    let mut written = SECTOR_SIZE as u64;

    let mut buf = [0u8; SECTOR_SIZE];
    for (index, region) in label.available.iter().enumerate() {
        // The first region contains the label sector; skip it, the cleaned
        // label was already written.
        let (start, length) = match index {
            0 => (region.address + 1u32, region.length.saturating_sub(1)),
            _ => (region.address, region.length),
        };
        image.seek(SeekFrom::Start(start.byte_offset(SECTOR_SIZE)))?;
        for _ in 0..length {
            image.read_exact(&mut buf)?;
            out.write_all(&buf)?;
            written += SECTOR_SIZE as u64;
        }
    }

    let zeros = [0u8; SECTOR_SIZE];
    while written < input_len {
        let n = ((input_len - written) as usize).min(SECTOR_SIZE);
        out.write_all(&zeros[..n])?;
        written += n as u64;
    }
    out.flush()?;
    Ok(cleaned)
}

fn read_block<R: Read>(image: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = image.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::plan::{DiskPlan, Geometry, VolumeSpec};

    /// 136-sector disk with one 64-sector MS-DOS volume at sector 2; each
    /// data sector is filled with its own sector number.
    fn test_image() -> (Vec<u8>, DiskPlan) {
        let geometry = Geometry { cylinders: 4, heads: 2, sectors_per_track: 17 };
        let spec = VolumeSpec {
            name: "SYS".to_string(),
            size_mib: 64.0 * 512.0 / (1024.0 * 1024.0),
            allocation_unit: 8,
            root_entries: 512,
        };
        let plan = DiskPlan::new(geometry, "test", &[spec], 0, false, 2).unwrap();
        let mut cursor = Cursor::new(Vec::new());
        plan.write(&mut cursor).unwrap();
        let mut image = cursor.into_inner();
        for sector in 3..136 {
            image[sector * SECTOR_SIZE..(sector + 1) * SECTOR_SIZE].fill(sector as u8);
        }
        (image, plan)
    }

    #[test]
    fn labels_read_back() {
        let (image, plan) = test_image();
        let mut source = Cursor::new(image);
        let label = read_disk_label(&mut source).unwrap();
        assert_eq!(label, plan.label);
        let volumes = read_volumes(&mut source, &label).unwrap();
        assert_eq!(volumes, plan.volumes);
        assert!(matches!(
            read_volume(&mut source, &label, 1),
            Err(Error::VolumeIndexOutOfRange { index: 1, count: 1 })
        ));
    }

    #[test]
    fn extract_writes_boot_sector_then_data() {
        let (image, plan) = test_image();
        let mut source = Cursor::new(image);
        let mut out = Vec::new();
        extract_volume(&mut source, &plan.volumes[0], &mut out).unwrap();

        // One boot sector plus capacity - 1 data sectors.
        assert_eq!(out.len(), 64 * SECTOR_SIZE);
        assert_eq!(&out[0..3], &hex!("EB 3C 90"));
        assert_eq!(&out[510..512], &hex!("55 AA"));
        // Data starts one block past the volume's own label sector.
        assert!(out[SECTOR_SIZE..2 * SECTOR_SIZE].iter().all(|&b| b == 3));
        assert!(out[63 * SECTOR_SIZE..].iter().all(|&b| b == 65));
    }

    #[test]
    fn extract_rounds_root_entries_to_whole_sectors() {
        let (image, plan) = test_image();
        let mut volume = plan.volumes[0].clone();
        volume.directory_entries = 100;
        let mut out = Vec::new();
        extract_volume(&mut Cursor::new(image), &volume, &mut out).unwrap();
        // 100 entries round up to 7 sectors = 112 entries.
        assert_eq!(u16::from_le_bytes([out[17], out[18]]), 112);
    }

    #[test]
    fn extract_refuses_non_msdos_volumes() {
        let (image, plan) = test_image();
        let mut volume = plan.volumes[0].clone();
        volume.partition_type = 3;
        let mut out = Vec::new();
        let err = extract_volume(&mut Cursor::new(image), &volume, &mut out);
        assert!(matches!(err, Err(Error::UnsupportedVolumeType { type_code: 3, .. })));
        assert!(out.is_empty());
    }

    #[test]
    fn insert_replaces_the_addressed_range_only() {
        let (image, plan) = test_image();
        let volume = &plan.volumes[0];
        let replacement = vec![0xAA; 64 * SECTOR_SIZE];
        let mut out = Vec::new();
        insert_volume(&mut Cursor::new(image.clone()), &replacement, volume, &mut out).unwrap();

        assert_eq!(out.len(), image.len());
        // The volume's own label block is preserved from the source.
        assert_eq!(&out[2 * SECTOR_SIZE..3 * SECTOR_SIZE], &image[2 * SECTOR_SIZE..3 * SECTOR_SIZE]);
        // Blocks 3..=66 carry the replacement.
        assert!(out[3 * SECTOR_SIZE..67 * SECTOR_SIZE].iter().all(|&b| b == 0xAA));
        // Everything outside the range is untouched.
        assert_eq!(&out[..2 * SECTOR_SIZE], &image[..2 * SECTOR_SIZE]);
        assert_eq!(&out[67 * SECTOR_SIZE..], &image[67 * SECTOR_SIZE..]);
    }

    #[test]
    fn short_replacement_keeps_trailing_blocks() {
        let (image, plan) = test_image();
        let volume = &plan.volumes[0];
        let replacement = vec![0xBB; 2 * SECTOR_SIZE];
        let mut out = Vec::new();
        insert_volume(&mut Cursor::new(image.clone()), &replacement, volume, &mut out).unwrap();

        assert_eq!(out.len(), image.len());
        assert!(out[3 * SECTOR_SIZE..5 * SECTOR_SIZE].iter().all(|&b| b == 0xBB));
        // Past the replacement, the original blocks remain.
        assert_eq!(&out[5 * SECTOR_SIZE..], &image[5 * SECTOR_SIZE..]);
    }

    #[test]
    fn sanitize_collapses_regions_and_keeps_file_length() {
        // Hand-built label: two available regions with a bad gap between.
        let geometry = Geometry { cylinders: 2, heads: 1, sectors_per_track: 17 };
        let spec = VolumeSpec {
            name: "SYS".to_string(),
            size_mib: 4.0 * 512.0 / (1024.0 * 1024.0),
            allocation_unit: 8,
            root_entries: 64,
        };
        let plan = DiskPlan::new(geometry, "bad", &[spec], 0, false, 2).unwrap();
        let mut label = plan.label.clone();
        label.available = vec![
            MediaRegion { address: 0.into(), length: 10 },
            MediaRegion { address: 20.into(), length: 8 },
        ];
        label.working = label.available.clone();

        // 40-sector file: label sector, then each sector holds its number.
        let mut image = vec![0u8; 40 * SECTOR_SIZE];
        let mut label_sector = label.encode();
        label_sector.resize(SECTOR_SIZE, 0);
        image[..SECTOR_SIZE].copy_from_slice(&label_sector);
        for sector in 1..40 {
            image[sector * SECTOR_SIZE..(sector + 1) * SECTOR_SIZE].fill(sector as u8);
        }

        let mut out = Vec::new();
        let cleaned = sanitize_bad_regions(&label, &mut Cursor::new(image.clone()), &mut out).unwrap();

        assert_eq!(cleaned.available.len(), 1);
        assert_eq!(cleaned.working.len(), 1);
        assert_eq!(cleaned.available[0], MediaRegion { address: 0.into(), length: 2 * 17 });
        assert_eq!(out.len(), image.len());

        let reread = DiskLabel::decode(&out[..SECTOR_SIZE]).unwrap();
        assert_eq!(reread, cleaned);
        // Region 0 minus its label sector: original sectors 1..10.
        for sector in 1..10 {
            assert!(out[sector * SECTOR_SIZE..(sector + 1) * SECTOR_SIZE]
                .iter()
                .all(|&b| b == sector as u8));
        }
        // Region 1 packed right behind: original sectors 20..28.
        for (slot, original) in (10..18).zip(20..28) {
            assert!(out[slot * SECTOR_SIZE..(slot + 1) * SECTOR_SIZE]
                .iter()
                .all(|&b| b == original as u8));
        }
        // Zero padding to the original length.
        assert!(out[18 * SECTOR_SIZE..].iter().all(|&b| b == 0));
    }
}
