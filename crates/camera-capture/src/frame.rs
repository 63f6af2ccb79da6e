//! Video frame types and processing

use serde::{Deserialize, Serialize};

/// Neutral chroma value for synthesized YUV planes
const NEUTRAL_CHROMA: u8 = 128;

/// Pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, luminance plane first at offset 0
    Yuv,
    Rgb24,
    Yuyv,
    Mjpeg,
    H264,
}

impl PixelFormat {
    /// Whether frames in this format start with a plain 8-bit luminance plane
    pub fn has_luma_plane(&self) -> bool {
        matches!(self, PixelFormat::Yuv)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PixelFormat::Yuv => "yuv",
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Yuyv => "yuyv",
            PixelFormat::Mjpeg => "mjpeg",
            PixelFormat::H264 => "h264",
        };
        f.write_str(name)
    }
}

/// Borrowed view of one delivered camera frame.
///
/// The bytes belong to the capture side and are only valid while the view is
/// alive, so anything holding a `Frame` cannot outlive the delivery call.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Raw frame bytes (luminance plane at offset 0 for `Yuv`)
    pub data: &'a [u8],
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Bytes per row, including any padding
    pub row_stride: u32,
    /// Declared pixel format
    pub pixel_format: PixelFormat,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

/// Owned video frame as produced by a frame source
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Pixel data, layout given by `pixel_format`
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Bytes per row of the first plane
    pub row_stride: u32,
    /// Pixel format
    pub pixel_format: PixelFormat,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a YUV 4:2:0 frame from a tightly packed luminance image.
    ///
    /// Each row is padded out to `row_stride` bytes and neutral chroma planes
    /// are appended after the Y plane, like a real sensor buffer.
    pub fn from_luma(width: u32, height: u32, row_stride: u32, luma: &[u8]) -> Self {
        let stride = row_stride.max(width) as usize;
        let w = width as usize;
        let h = height as usize;

        let chroma_len = 2 * (w.div_ceil(2) * h.div_ceil(2));
        let mut data = vec![0u8; stride * h + chroma_len];
        if w > 0 {
            for (y, row) in luma.chunks(w).take(h).enumerate() {
                let start = y * stride;
                data[start..start + row.len()].copy_from_slice(row);
            }
        }
        data[stride * h..].fill(NEUTRAL_CHROMA);

        Self {
            data,
            width,
            height,
            row_stride: stride as u32,
            pixel_format: PixelFormat::Yuv,
            timestamp_ns: 0,
            sequence: 0,
        }
    }

    /// Wrap raw bytes with explicit geometry and format
    pub fn with_format(
        data: Vec<u8>,
        width: u32,
        height: u32,
        row_stride: u32,
        pixel_format: PixelFormat,
    ) -> Self {
        Self {
            data,
            width,
            height,
            row_stride,
            pixel_format,
            timestamp_ns: 0,
            sequence: 0,
        }
    }

    /// Set capture metadata
    pub fn stamped(mut self, timestamp_ns: u64, sequence: u32) -> Self {
        self.timestamp_ns = timestamp_ns;
        self.sequence = sequence;
        self
    }

    /// Borrow this frame for one delivery
    pub fn as_frame(&self) -> Frame<'_> {
        Frame {
            data: &self.data,
            width: self.width,
            height: self.height,
            row_stride: self.row_stride,
            pixel_format: self.pixel_format,
            timestamp_ns: self.timestamp_ns,
            sequence: self.sequence,
        }
    }

    /// Luminance at (x, y), `None` outside the frame or for non-YUV formats
    pub fn luma_at(&self, x: u32, y: u32) -> Option<u8> {
        if !self.pixel_format.has_luma_plane() || x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.row_stride as usize + x as usize;
        self.data.get(idx).copied()
    }
}
