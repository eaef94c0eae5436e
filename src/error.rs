use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A label record is truncated or a variable-length payload does not fit
    /// its sector. Always fatal to the current encode/decode call.
    #[error("label format error: {0}")]
    Format(&'static str),
    /// Geometry or placement violates a boot-ROM limit. Checked before any
    /// byte of an image is written.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),
    /// Extraction attempted on a volume that is not MS-DOS (type 1).
    #[error("volume type {type_code} ({type_text}) cannot be extracted, only MS-DOS volumes")]
    UnsupportedVolumeType { type_code: u16, type_text: String },
    /// Requested volume index is not present in the disk label.
    #[error("volume index {index} out of range, label lists {count} volumes")]
    VolumeIndexOutOfRange { index: usize, count: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
