use std::time::Duration;

use image::{GrayImage, RgbImage};
use ndarray::{ArrayView3, Axis};
use thiserror::Error;

pub const FRAME_CHANNELS: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame data has {actual} bytes, expected {expected} for {width}x{height}x3")]
    SizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },
    #[error("frame dimensions must be non-zero (got {width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Byte order of the three colour channels in a [`Frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// A single camera frame: contiguous 3-channel bytes in row-major order.
///
/// Frames are immutable for the duration of one pipeline pass. The
/// timestamp is monotonic time since capture start and drives every
/// time-gated decision in the pipeline.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    order: ChannelOrder,
    index: usize,
    timestamp: Duration,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        order: ChannelOrder,
        index: usize,
        timestamp: Duration,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }
        let expected = (width as usize) * (height as usize) * FRAME_CHANNELS;
        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                actual: data.len(),
                expected,
                width,
                height,
            });
        }
        Ok(Self {
            data,
            width,
            height,
            order,
            index,
            timestamp,
        })
    }

    pub fn from_rgb_image(
        image: RgbImage,
        index: usize,
        timestamp: Duration,
    ) -> Result<Self, FrameError> {
        let (width, height) = image.dimensions();
        Self::new(
            image.into_raw(),
            width,
            height,
            ChannelOrder::Rgb,
            index,
            timestamp,
        )
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, FRAME_CHANNELS),
            &self.data,
        )
        .expect("Frame data length is validated at construction")
    }

    /// Iterates pixels in row-major order as `(r, g, b)` regardless of
    /// the stored channel order.
    pub fn rgb_pixels(&self) -> impl Iterator<Item = (u8, u8, u8)> + '_ {
        let order = self.order;
        self.data.chunks_exact(FRAME_CHANNELS).map(move |px| match order {
            ChannelOrder::Rgb => (px[0], px[1], px[2]),
            ChannelOrder::Bgr => (px[2], px[1], px[0]),
        })
    }

    /// Luma conversion with the ITU-R BT.601 weights.
    pub fn to_gray(&self) -> GrayImage {
        let (r_idx, b_idx) = match self.order {
            ChannelOrder::Rgb => (0, 2),
            ChannelOrder::Bgr => (2, 0),
        };
        let view = self.as_ndarray();
        let luma: Vec<u8> = view
            .lanes(Axis(2))
            .into_iter()
            .map(|px| {
                let y = 0.299 * px[r_idx] as f32 + 0.587 * px[1] as f32 + 0.114 * px[b_idx] as f32;
                y.round().clamp(0.0, 255.0) as u8
            })
            .collect();
        GrayImage::from_raw(self.width, self.height, luma)
            .expect("luma buffer matches frame dimensions")
    }

    /// Horizontally flipped copy, as produced by a mirrored webcam preview.
    pub fn mirrored(&self) -> Frame {
        let w = self.width as usize;
        let row_len = w * FRAME_CHANNELS;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(row_len) {
            for px in row.chunks_exact(FRAME_CHANNELS).rev() {
                data.extend_from_slice(px);
            }
        }
        Frame {
            data,
            width: self.width,
            height: self.height,
            order: self.order,
            index: self.index,
            timestamp: self.timestamp,
        }
    }
}
