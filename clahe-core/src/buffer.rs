use crate::error::{ClaheError, ClaheResult};

/// Raw 8-bit pixel samples in row-major, channel-interleaved order.
///
/// The buffer only checks that the sample count matches its shape. Whether
/// the shape can be equalized (non-empty, 1..=3 channels) is decided by the
/// transform, which rejects bad input before writing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap existing samples. Fails if `data.len() != width * height * channels`.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> ClaheResult<Self> {
        let expected = sample_count(width, height, channels);
        if data.len() != expected {
            return Err(ClaheError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A buffer with every sample set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![value; sample_count(width, height, channels)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Samples of the pixel at `(x, y)`, one per channel.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * c;
        &self.data[start..start + c]
    }
}

pub(crate) fn sample_count(width: u32, height: u32, channels: u8) -> usize {
    width as usize * height as usize * channels as usize
}
