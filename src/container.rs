//! Reading and writing the PNG chunk container.
//!
//! Parsing is deliberately shallow: the header is read at its fixed offset and
//! the pixel data is found by scanning for `IDAT` tags. Assembly always emits a
//! minimal `IHDR`, `IDAT`, `IEND` file.
use crate::{Error, FormatError};
use log::debug;

/// The 8-byte magic every PNG file starts with.
pub const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const IHDR: &[u8; 4] = b"IHDR";
const IDAT: &[u8; 4] = b"IDAT";
const IEND: &[u8; 4] = b"IEND";

/// CRC32 of the bare `IEND` tag, the same for every file.
pub const IEND_CRC: u32 = 0xAE42_6082;

const BIT_DEPTH: u8 = 8;
const COLOR_TYPE_RGBA: u8 = 6;

// signature + length + tag + 13 byte IHDR body
const HEADER_END: usize = 8 + 4 + 4 + 13;

/// A source file that passed signature and header validation.
#[derive(Debug, Clone, Copy)]
pub struct RawImage<'a> {
    bytes: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> RawImage<'a> {
    /// Validate the signature and the `IHDR` fields.
    ///
    /// Stops at the first problem so nothing downstream ever sees garbage dimensions.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, Error> {
        if !verify_signature(bytes) {
            return Err(FormatError::Signature.into());
        }
        let (width, height) = read_dimensions(bytes)?;
        if bytes.len() < HEADER_END {
            return Err(FormatError::TooShort {
                actual: bytes.len(),
                required: HEADER_END,
            }
            .into());
        }
        let (bit_depth, color_type) = (bytes[24], bytes[25]);
        if bit_depth != BIT_DEPTH || color_type != COLOR_TYPE_RGBA {
            return Err(FormatError::Unsupported {
                bit_depth,
                color_type,
            }
            .into());
        }
        if bytes[28] != 0 {
            return Err(FormatError::Interlaced.into());
        }
        debug!("PNG header: {width}x{height} RGBA8");
        Ok(Self {
            bytes,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The concatenated payload of every `IDAT` chunk.
    pub fn image_data(&self) -> Result<Vec<u8>, Error> {
        collect_data_chunks(self.bytes)
    }
}

/// Returns `true` if `bytes` starts with the PNG signature.
/// ```rust
/// # use pngsteg::container::{verify_signature, SIGNATURE};
/// assert!(verify_signature(&SIGNATURE));
/// assert!(!verify_signature(b"GIF89a.."));
/// ```
pub fn verify_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(&SIGNATURE)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Read width and height from the `IHDR` chunk, which must directly follow the signature.
pub fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32), Error> {
    if bytes.len() < 24 {
        return Err(FormatError::TooShort {
            actual: bytes.len(),
            required: 24,
        }
        .into());
    }
    if &bytes[12..16] != IHDR {
        return Err(FormatError::MissingHeader.into());
    }
    let (width, height) = (read_u32(bytes, 16), read_u32(bytes, 20));
    if width == 0 || height == 0 {
        return Err(FormatError::ZeroDimension { width, height }.into());
    }
    Ok((width, height))
}

/// Concatenate the payloads of all `IDAT` chunks in file order.
///
/// Each tag is located by searching forward from a cursor; the 4 bytes before
/// it hold the chunk length and the cursor then skips past the trailing CRC.
pub fn collect_data_chunks(bytes: &[u8]) -> Result<Vec<u8>, Error> {
    let mut data = Vec::new();
    let mut cursor = SIGNATURE.len();
    let mut chunks = 0;
    while let Some(found) = bytes.get(cursor..).and_then(|rest| find_tag(rest, IDAT)) {
        // the cursor never drops below the signature, so a length field always precedes the tag
        let tag = cursor + found;
        let length = read_u32(bytes, tag - 4) as usize;
        let start = tag + IDAT.len();
        let end = start + length;
        if end > bytes.len() {
            return Err(FormatError::TruncatedChunk {
                offset: tag - 4,
                length,
            }
            .into());
        }
        data.extend_from_slice(&bytes[start..end]);
        chunks += 1;
        cursor = (end + 4).min(bytes.len());
    }
    if chunks == 0 {
        return Err(FormatError::MissingImageData.into());
    }
    debug!("Collected {} bytes from {chunks} IDAT chunk(s)", data.len());
    Ok(data)
}

fn find_tag(haystack: &[u8], tag: &[u8; 4]) -> Option<usize> {
    haystack.windows(tag.len()).position(|window| window == tag)
}

/// Append one `length | tag | data | crc` record to `out`.
pub fn write_chunk(out: &mut Vec<u8>, tag: &[u8; 4], data: &[u8]) {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(tag);
    hasher.update(data);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Build a complete single-`IDAT` RGBA8 PNG around an already compressed stream.
pub fn assemble(width: u32, height: u32, compressed: &[u8]) -> Vec<u8> {
    let mut header = Vec::with_capacity(13);
    header.extend_from_slice(&width.to_be_bytes());
    header.extend_from_slice(&height.to_be_bytes());
    // bit depth, color type, compression, filter method, interlace
    header.extend_from_slice(&[BIT_DEPTH, COLOR_TYPE_RGBA, 0, 0, 0]);

    let mut out = Vec::with_capacity(HEADER_END + compressed.len() + 24);
    out.extend_from_slice(&SIGNATURE);
    write_chunk(&mut out, IHDR, &header);
    write_chunk(&mut out, IDAT, compressed);
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(IEND);
    out.extend_from_slice(&IEND_CRC.to_be_bytes());
    out
}

#[cfg(test)]
mod test {
    use super::*;

    fn split_image(width: u32, height: u32, pieces: &[&[u8]]) -> Vec<u8> {
        let mut out = assemble(width, height, &[]);
        out.truncate(HEADER_END + 4);
        for piece in pieces {
            write_chunk(&mut out, IDAT, piece);
        }
        write_chunk(&mut out, IEND, &[]);
        out
    }

    #[test]
    fn iend_crc() {
        assert_eq!(crc32fast::hash(IEND), IEND_CRC);
        let mut out = Vec::new();
        write_chunk(&mut out, IEND, &[]);
        assert_eq!(&out[8..], &IEND_CRC.to_be_bytes());
    }

    #[test]
    fn assemble_layout() {
        let png = assemble(3, 2, &[1, 2, 3]);
        assert!(verify_signature(&png));
        assert_eq!(read_dimensions(&png).unwrap(), (3, 2));
        assert_eq!(&png[24..29], &[8, 6, 0, 0, 0]);
        assert_eq!(&png[33..41], &[0, 0, 0, 3, b'I', b'D', b'A', b'T']);
        assert_eq!(png.len(), HEADER_END + 4 + (12 + 3) + 12);
        assert!(png.ends_with(&[0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]));
    }

    #[test]
    fn collect_multiple_chunks() {
        let png = split_image(1, 1, &[&[1, 2], &[], &[3, 4, 5]]);
        assert_eq!(collect_data_chunks(&png).unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn collect_missing() {
        let png = split_image(1, 1, &[]);
        assert!(matches!(
            collect_data_chunks(&png),
            Err(Error::Format(FormatError::MissingImageData))
        ));
    }

    #[test]
    fn collect_truncated() {
        let mut png = split_image(1, 1, &[&[1, 2, 3, 4, 5, 6]]);
        png.truncate(HEADER_END + 4 + 8 + 2);
        assert!(matches!(
            collect_data_chunks(&png),
            Err(Error::Format(FormatError::TruncatedChunk { length: 6, .. }))
        ));
    }

    #[test]
    fn parse_rejects_signature() {
        let mut png = assemble(1, 1, &[0]);
        png[0] = 0;
        assert!(matches!(
            RawImage::parse(&png),
            Err(Error::Format(FormatError::Signature))
        ));
    }

    #[test]
    fn parse_rejects_header() {
        let mut png = assemble(0, 4, &[0]);
        assert!(matches!(
            RawImage::parse(&png),
            Err(Error::Format(FormatError::ZeroDimension { width: 0, height: 4 }))
        ));

        png = assemble(1, 1, &[0]);
        png[25] = 2;
        assert!(matches!(
            RawImage::parse(&png),
            Err(Error::Format(FormatError::Unsupported { bit_depth: 8, color_type: 2 }))
        ));

        png = assemble(1, 1, &[0]);
        png[28] = 1;
        assert!(matches!(
            RawImage::parse(&png),
            Err(Error::Format(FormatError::Interlaced))
        ));

        png = assemble(1, 1, &[0]);
        png[12..16].copy_from_slice(b"tEXt");
        assert!(matches!(
            RawImage::parse(&png),
            Err(Error::Format(FormatError::MissingHeader))
        ));

        assert!(matches!(
            RawImage::parse(&SIGNATURE),
            Err(Error::Format(FormatError::TooShort { actual: 8, .. }))
        ));
    }
}
