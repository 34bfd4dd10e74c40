//! zlib framing around the raw DEFLATE stream held in `IDAT`.
use crate::{CodecError, Error};
use flate2::{read::DeflateDecoder, write::ZlibEncoder, Compression};
use log::debug;
use std::io::{Read, Write};

/// The header produced at [`Compression::best`].
pub const HEADER: [u8; 2] = [0x78, 0xDA];

fn check_header(cmf: u8, flg: u8) -> bool {
    let method = cmf & 0x0F;
    let preset_dictionary = flg & 0x20 != 0;
    method == 8 && !preset_dictionary && ((u16::from(cmf) << 8) | u16::from(flg)) % 31 == 0
}

/// Strip the 2-byte zlib header and inflate what follows.
///
/// The trailing Adler-32 checksum is ignored.
pub fn inflate(compressed: &[u8]) -> Result<Vec<u8>, Error> {
    let (header, stream) = match compressed {
        [cmf, flg, stream @ ..] => ((*cmf, *flg), stream),
        _ => return Err(CodecError::Header.into()),
    };
    if !check_header(header.0, header.1) {
        return Err(CodecError::Header.into());
    }
    let mut out = Vec::new();
    DeflateDecoder::new(stream)
        .read_to_end(&mut out)
        .map_err(CodecError::Inflate)?;
    debug!("Inflated {} bytes into {}", compressed.len(), out.len());
    Ok(out)
}

/// Compress `scanlines` at the best level, producing a `78 DA` zlib stream.
pub fn deflate(scanlines: &[u8]) -> Result<Vec<u8>, Error> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(scanlines).map_err(CodecError::Deflate)?;
    let out = encoder.finish().map_err(CodecError::Deflate)?;
    debug!("Deflated {} bytes into {}", scanlines.len(), out.len());
    Ok(out)
}
