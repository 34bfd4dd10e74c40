//! The decode, implant/extract, encode pipeline.
use crate::{bitstream::Bitstream, byte, container, filter, zlib, Error, FormatError};
use log::debug;

/// A decoded cover image, reduced to the bits that can carry a payload.
#[derive(Debug, Clone)]
pub struct Carrier {
    width: u32,
    height: u32,
    bits: Bitstream,
}

impl Carrier {
    /// Parse, inflate and unfilter a PNG file.
    pub fn decode(png: &[u8]) -> Result<Self, Error> {
        let image = container::RawImage::parse(png)?;
        let (width, height) = (image.width(), image.height());
        let filtered = zlib::inflate(&image.image_data()?)?;
        let raw = filter::unfilter(&filtered, width, height)?;
        Ok(Self {
            width,
            height,
            bits: Bitstream::from_rows(&raw, width),
        })
    }

    /// An opaque black cover of the given size.
    pub fn blank(width: u32, height: u32) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(FormatError::ZeroDimension { width, height }.into());
        }
        let raw = [0u8, 0, 0, 0xFF].repeat(width as usize * height as usize);
        Ok(Self {
            width,
            height,
            bits: Bitstream::from_rows(&raw, width),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bits(&self) -> &Bitstream {
        &self.bits
    }

    /// Largest payload in bytes this image can hold.
    pub fn capacity(&self) -> usize {
        byte::capacity(&self.bits)
    }

    pub fn implant(&mut self, payload: &[u8]) -> Result<(), Error> {
        byte::encode(&mut self.bits, payload)
    }

    pub fn extract(&self) -> Result<Vec<u8>, Error> {
        byte::decode(&self.bits)
    }

    /// Assemble a fresh single-`IDAT` PNG from the current bits.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let compressed = zlib::deflate(&self.bits.to_scanlines())?;
        let png = container::assemble(self.width, self.height, &compressed);
        debug!("Assembled a {} byte PNG", png.len());
        Ok(png)
    }
}

/// Hide `payload` in the PNG `image`, returning the new PNG.
/// ```rust
/// # fn main() -> Result<(), pngsteg::Error> {
/// # let cover = pngsteg::Carrier::blank(8, 8)?.encode()?;
/// let stego = pngsteg::implant(&cover, b"Hello")?;
/// assert_eq!(pngsteg::extract(&stego)?, b"Hello");
/// # Ok(())
/// # }
/// ```
pub fn implant(image: &[u8], payload: &[u8]) -> Result<Vec<u8>, Error> {
    let mut carrier = Carrier::decode(image)?;
    carrier.implant(payload)?;
    carrier.encode()
}

/// Recover the payload hidden in the PNG `image`.
pub fn extract(image: &[u8]) -> Result<Vec<u8>, Error> {
    Carrier::decode(image)?.extract()
}
