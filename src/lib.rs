pub mod bitstream;
pub mod byte;
pub mod carrier;
pub mod container;
pub mod filter;
pub mod zlib;

pub use carrier::{extract, implant, Carrier};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid PNG: {0}")]
    Format(#[from] FormatError),
    #[error("Payload is too large: {required} bits are required, but the image only has {available}.")]
    Capacity { required: usize, available: usize },
    #[error("Payload is {length} bytes, but the length prefix can describe at most {max}.")]
    PayloadTooLarge { length: usize, max: usize },
    #[error("Hidden payload is truncated: {declared} bytes are declared, but the image only holds {available}.")]
    Truncated { declared: usize, available: usize },
    #[error("Corrupt image data: {0}")]
    Codec(#[from] CodecError),
}

#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("missing PNG signature")]
    Signature,
    #[error("file is {actual} bytes, but at least {required} bytes are required")]
    TooShort { actual: usize, required: usize },
    #[error("IHDR chunk not found at its fixed offset")]
    MissingHeader,
    #[error("image dimensions must be non-zero, found {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    #[error("only 8-bit RGBA is supported, found bit depth {bit_depth} with color type {color_type}")]
    Unsupported { bit_depth: u8, color_type: u8 },
    #[error("interlaced images are not supported")]
    Interlaced,
    #[error("IDAT chunk at offset {offset} declares {length} bytes past the end of the file")]
    TruncatedChunk { offset: usize, length: usize },
    #[error("no IDAT chunk found")]
    MissingImageData,
}

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("invalid zlib header")]
    Header,
    #[error("inflate failed: {0}")]
    Inflate(#[source] std::io::Error),
    #[error("deflate failed: {0}")]
    Deflate(#[source] std::io::Error),
    #[error("image data is {actual} bytes, but {required} bytes are required")]
    ShortData { actual: usize, required: usize },
    #[error("unknown filter type {tag} on row {row}")]
    Filter { row: usize, tag: u8 },
}
