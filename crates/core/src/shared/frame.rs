use ndarray::ArrayView3;

/// Bytes per pixel; frames are always packed RGB.
pub const CHANNELS: usize = 3;

/// A single preview frame: contiguous RGB bytes in row-major order.
///
/// Decoding to and from file formats happens at I/O boundaries; overlays
/// and detectors only see this type.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// A frame filled with a single colour.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], index: usize) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self::new(data, width, height, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = self.offset(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&rgb);
    }

    /// Mirrors the frame left to right, as a front camera preview shows it.
    pub fn flip_horizontal(&mut self) {
        let row_len = self.width as usize * CHANNELS;
        if row_len == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(row_len) {
            let w = self.width as usize;
            for x in 0..w / 2 {
                let (a, b) = (x * CHANNELS, (w - 1 - x) * CHANNELS);
                for c in 0..CHANNELS {
                    row.swap(a + c, b + c);
                }
            }
        }
    }

    /// `(height, width, channel)` view used by detector preprocessing.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 0);
    }

    #[test]
    fn test_flip_horizontal_mirrors_rows() {
        let mut frame = Frame::filled(3, 2, [0, 0, 0], 0);
        frame.set_pixel(0, 1, [9, 8, 7]);
        frame.flip_horizontal();
        assert_eq!(frame.pixel(2, 1), [9, 8, 7]);
        assert_eq!(frame.pixel(0, 1), [0, 0, 0]);
        assert_eq!(frame.pixel(1, 0), [0, 0, 0]);
    }

    #[test]
    fn test_filled_repeats_colour() {
        let frame = Frame::filled(3, 2, [10, 20, 30], 0);
        assert_eq!(frame.data().len(), 18);
        assert_eq!(frame.pixel(2, 1), [10, 20, 30]);
    }

    #[test]
    fn test_set_pixel_only_touches_target() {
        let mut frame = Frame::filled(4, 4, [0, 0, 0], 0);
        frame.set_pixel(1, 2, [255, 128, 64]);
        assert_eq!(frame.pixel(1, 2), [255, 128, 64]);
        assert_eq!(frame.pixel(2, 1), [0, 0, 0]);
    }

    #[test]
    fn test_as_ndarray_shape_and_indexing() {
        let mut frame = Frame::filled(4, 2, [0, 0, 0], 0);
        frame.set_pixel(0, 1, [255, 0, 0]);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_clone_is_independent() {
        let frame = Frame::filled(2, 2, [100, 100, 100], 0);
        let mut cloned = frame.clone();
        cloned.data_mut()[0] = 0;
        assert_eq!(frame.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }
}
