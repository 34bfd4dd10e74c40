//! Reversing the per-scanline predictive filters.
//!
//! Only the decode direction needs all five filter types. Re-encoding always
//! writes [`FilterType::None`], see [`Bitstream::to_scanlines`](crate::bitstream::Bitstream::to_scanlines).
use crate::{CodecError, Error};
use log::{debug, trace};

/// RGBA8: four samples per pixel, and the distance to the "left" neighbour.
pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    None,
    Sub,
    Up,
    Average,
    Paeth,
}

impl FilterType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            1 => Some(Self::Sub),
            2 => Some(Self::Up),
            3 => Some(Self::Average),
            4 => Some(Self::Paeth),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// The PNG Paeth predictor, ties prefer `a`, then `b`, then `c`.
pub fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (a16, b16, c16) = (i16::from(a), i16::from(b), i16::from(c));
    let p = a16 + b16 - c16;
    let (pa, pb, pc) = ((p - a16).abs(), (p - b16).abs(), (p - c16).abs());
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Reconstruct one row in place against the already reconstructed `previous` row.
///
/// Samples are processed left to right since Sub, Average and Paeth read the
/// reconstructed pixel to the left. Bytes of the first pixel have no left
/// neighbour and use 0 in its place.
pub fn unfilter_row(filter: FilterType, row: &mut [u8], previous: &[u8]) {
    debug_assert_eq!(row.len(), previous.len());
    let bpp = BYTES_PER_PIXEL;
    match filter {
        FilterType::None => {}
        FilterType::Sub => {
            for i in bpp..row.len() {
                row[i] = row[i].wrapping_add(row[i - bpp]);
            }
        }
        FilterType::Up => {
            for (sample, above) in row.iter_mut().zip(previous) {
                *sample = sample.wrapping_add(*above);
            }
        }
        FilterType::Average => {
            for i in 0..row.len() {
                let left = if i >= bpp { row[i - bpp] } else { 0 };
                let average = (u16::from(left) + u16::from(previous[i])) / 2;
                row[i] = row[i].wrapping_add(average as u8);
            }
        }
        FilterType::Paeth => {
            for i in 0..row.len() {
                let (left, upper_left) = if i >= bpp {
                    (row[i - bpp], previous[i - bpp])
                } else {
                    (0, 0)
                };
                row[i] = row[i].wrapping_add(paeth(left, previous[i], upper_left));
            }
        }
    }
}

/// Undo the filters of an inflated `IDAT` stream.
///
/// Returns `height` rows of `width * 4` raw samples with the filter tags removed.
/// Rows are folded strictly in order, each one becoming the `previous` of the next.
pub fn unfilter(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, Error> {
    let stride = width as usize * BYTES_PER_PIXEL;
    let rows = height as usize;
    let required = rows * (stride + 1);
    if data.len() < required {
        return Err(CodecError::ShortData {
            actual: data.len(),
            required,
        }
        .into());
    }

    let mut raw = Vec::with_capacity(rows * stride);
    let mut counts = [0usize; 5];
    data.chunks_exact(stride + 1)
        .take(rows)
        .enumerate()
        .try_fold(vec![0u8; stride], |previous, (index, scanline)| {
            let filter = FilterType::from_tag(scanline[0]).ok_or(CodecError::Filter {
                row: index,
                tag: scanline[0],
            })?;
            let mut row = scanline[1..].to_vec();
            unfilter_row(filter, &mut row, &previous);
            trace!("Row {index}: {filter:?}");
            counts[filter.tag() as usize] += 1;
            raw.extend_from_slice(&row);
            Ok::<_, Error>(row)
        })?;
    debug!("Unfiltered {rows} rows, filter usage {counts:?}");
    Ok(raw)
}
