//! A flat bit view over the color samples of an RGBA image.
//!
//! Bits run row-major, then R, G, B within a pixel, then most significant
//! first within a sample. Alpha never takes part.
use crate::filter::{FilterType, BYTES_PER_PIXEL};
use log::debug;

const CHANNELS: usize = 3;
const ALPHA: u8 = 0xFF;

/// Where a single bit of the stream lives in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitPosition {
    pub row: usize,
    pub pixel: usize,
    pub channel: usize,
    /// 0 is the most significant bit of the sample.
    pub bit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitstream {
    width: usize,
    samples: Vec<u8>,
}

impl Bitstream {
    /// Project unfiltered RGBA rows onto the bitstream, dropping alpha.
    pub fn from_rows(raw: &[u8], width: u32) -> Self {
        let samples: Vec<u8> = raw
            .chunks_exact(BYTES_PER_PIXEL)
            .flat_map(|pixel| &pixel[..CHANNELS])
            .copied()
            .collect();
        debug!("Projected {} color samples", samples.len());
        Self {
            width: width as usize,
            samples,
        }
    }

    /// Number of bits in the stream.
    pub fn len(&self) -> usize {
        self.samples.len() * u8::BITS as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<u8> {
        (position < self.len()).then(|| self.bit(position))
    }

    fn bit(&self, position: usize) -> u8 {
        (self.samples[position / 8] >> (7 - position % 8)) & 1
    }

    /// Overwrite the bit at `position` with the low bit of `bit`.
    ///
    /// # Panics
    /// If `position` is outside the stream.
    pub fn set(&mut self, position: usize, bit: u8) {
        let mask = 1 << (7 - position % 8);
        let sample = &mut self.samples[position / 8];
        *sample = if bit & 1 == 1 {
            *sample | mask
        } else {
            *sample & !mask
        };
    }

    /// # Panics
    /// If the stream was built with a width of 0.
    pub fn locate(&self, position: usize) -> BitPosition {
        let sample = position / 8;
        let row_samples = self.width * CHANNELS;
        BitPosition {
            row: sample / row_samples,
            pixel: (sample % row_samples) / CHANNELS,
            channel: sample % CHANNELS,
            bit: position % 8,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.len()).map(|position| self.bit(position))
    }

    /// Rebuild the pre-compression `IDAT` stream.
    ///
    /// Every row is written with filter type None and every pixel gets an opaque alpha.
    pub fn to_scanlines(&self) -> Vec<u8> {
        let row_samples = self.width * CHANNELS;
        if row_samples == 0 {
            return Vec::new();
        }
        let rows = self.samples.len() / row_samples;
        let mut out = Vec::with_capacity(rows * (1 + self.width * BYTES_PER_PIXEL));
        for row in self.samples.chunks_exact(row_samples) {
            out.push(FilterType::None.tag());
            for pixel in row.chunks_exact(CHANNELS) {
                out.extend_from_slice(pixel);
                out.push(ALPHA);
            }
        }
        out
    }
}
