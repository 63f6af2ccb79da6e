//! Column sampling along the rolling-shutter time axis
//!
//! A rolling shutter exposes rows one after another, so walking a single
//! column top to bottom yields brightness over time.

use crate::validator::ValidFrame;

/// Brightness samples of one column, in row order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleColumn {
    samples: Vec<u8>,
    skipped_rows: usize,
}

impl SampleColumn {
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Rows whose offset fell outside the buffer
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

/// Column sampled for a frame of the given width
pub fn center_column(width: u32) -> usize {
    (width / 2) as usize
}

/// Walk `column` from the top row to the bottom row.
///
/// Rows whose offset lands outside the buffer are dropped, so inconsistent
/// stride/height metadata yields a shorter column instead of a fault.
pub fn sample(frame: &ValidFrame<'_>, column: usize) -> SampleColumn {
    let data = frame.luma();
    let stride = frame.row_stride() as usize;
    let height = frame.height() as usize;

    let mut samples = Vec::with_capacity(height.min(data.len()));
    let mut skipped_rows = 0;

    for y in 0..height {
        let value = y
            .checked_mul(stride)
            .and_then(|row_start| row_start.checked_add(column))
            .and_then(|offset| data.get(offset));

        match value {
            Some(&luma) => samples.push(luma),
            None => skipped_rows += 1,
        }
    }

    SampleColumn {
        samples,
        skipped_rows,
    }
}
