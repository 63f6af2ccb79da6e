//! Frame format gate

use camera_capture::Frame;

use crate::error::DecoderError;

/// A frame whose buffer starts with an 8-bit luminance plane
#[derive(Debug, Clone, Copy)]
pub struct ValidFrame<'a> {
    frame: Frame<'a>,
}

impl<'a> ValidFrame<'a> {
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }

    pub fn row_stride(&self) -> u32 {
        self.frame.row_stride
    }

    /// Luminance plane bytes (plus whatever follows it in the buffer)
    pub fn luma(&self) -> &'a [u8] {
        self.frame.data
    }

    pub fn sequence(&self) -> u32 {
        self.frame.sequence
    }
}

/// Accept only frames declaring the planar luminance layout.
///
/// Other formats show up briefly while the camera is being reconfigured,
/// so rejection is routine and carries no side effects.
pub fn validate<'a>(frame: &Frame<'a>) -> Result<ValidFrame<'a>, DecoderError> {
    if !frame.pixel_format.has_luma_plane() {
        return Err(DecoderError::UnsupportedFormat(frame.pixel_format));
    }
    Ok(ValidFrame { frame: *frame })
}
