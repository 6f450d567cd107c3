/// Number of bytes needed to hold one bit per cell.
pub fn packed_len(width: u32, height: u32) -> usize {
    (width as usize * height as usize).div_ceil(8)
}

/// Whether bit `index` of a packed, LSB-first buffer is set.
///
/// The caller guarantees `index < width * height`.
pub fn is_alive(index: usize, bytes: &[u8]) -> bool {
    let mask = 1u8 << (index % 8);
    bytes[index / 8] & mask == mask
}

/// Read-only view over an engine's packed cell buffer.
///
/// Tagged with the generation of the universe it was borrowed from so a
/// consumer can refuse to decode a view that belongs to a replaced
/// universe.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    bytes: &'a [u8],
    width: u32,
    height: u32,
    generation: u64,
}

impl<'a> GridView<'a> {
    pub fn new(
        bytes: &'a [u8],
        width: u32,
        height: u32,
        generation: u64,
    ) -> Self {
        assert!(
            bytes.len() >= packed_len(width, height),
            "grid view of {} bytes is too short for {}x{} cells",
            bytes.len(),
            width,
            height
        );

        Self {
            bytes,
            width,
            height,
            generation,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn is_alive(&self, row: u32, col: u32) -> bool {
        debug_assert!(row < self.height && col < self.width);
        is_alive(row as usize * self.width as usize + col as usize, self.bytes)
    }

    /// Live cells in row-major order.
    pub fn alive_cells(&self) -> impl Iterator<Item = (u32, u32)> + 'a {
        let bytes = self.bytes;
        let width = self.width as usize;
        (0..width * self.height as usize)
            .filter(move |&index| is_alive(index, bytes))
            .map(move |index| ((index / width) as u32, (index % width) as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_only_the_addressed_bit() {
        for index in 0..24 {
            let mut bytes = [0u8; 3];
            bytes[index / 8] = 1 << (index % 8);

            for other in 0..24 {
                assert_eq!(is_alive(other, &bytes), other == index);
            }
        }
    }

    #[test]
    fn view_maps_row_and_column_to_row_major_bits() {
        // 5x3 grid, cell (2, 1) is bit 11: byte 1, bit 3.
        let bytes = [0u8, 0b0000_1000];
        let view = GridView::new(&bytes, 5, 3, 1);

        assert!(view.is_alive(2, 1));
        assert_eq!(view.alive_cells().collect::<Vec<_>>(), vec![(2, 1)]);
    }

    #[test]
    fn packed_len_rounds_up() {
        assert_eq!(packed_len(8, 1), 1);
        assert_eq!(packed_len(3, 3), 2);
        assert_eq!(packed_len(192, 96), 2304);
    }

    #[test]
    #[should_panic(expected = "too short")]
    fn short_buffers_are_rejected() {
        let bytes = [0u8; 1];
        let _ = GridView::new(&bytes, 4, 4, 1);
    }
}
