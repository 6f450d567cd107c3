use crate::render::raster::canvas_extent;

/// Where the canvas sits inside the window, in window (physical) pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Largest rect with the canvas aspect ratio, centered in the surface.
    pub fn letterbox(canvas: [u32; 2], surface: [u32; 2]) -> Self {
        let [canvas_w, canvas_h] = canvas.map(|v| f64::from(v.max(1)));
        let [surface_w, surface_h] = surface.map(f64::from);

        let scale = (surface_w / canvas_w).min(surface_h / canvas_h);
        let width = canvas_w * scale;
        let height = canvas_h * scale;

        Self {
            left: ((surface_w - width) / 2.0).floor(),
            top: ((surface_h - height) / 2.0).floor(),
            width,
            height,
        }
    }

    /// Inclusive of the right and bottom edges.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left
            && y >= self.top
            && x <= self.left + self.width
            && y <= self.top + self.height
    }
}

/// Converts pointer positions into grid cells for one grid geometry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CellMapper {
    width: u32,
    height: u32,
    cell_size: u32,
}

impl CellMapper {
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        assert!(width > 0 && height > 0 && cell_size > 0);
        assert!(
            canvas_extent(cell_size, width.max(height)).is_some(),
            "{}x{} grid of size {} cells overflows the canvas",
            width,
            height,
            cell_size
        );
        Self {
            width,
            height,
            cell_size,
        }
    }

    /// Internal canvas resolution, 1px grid lines included.
    pub fn canvas_size(&self) -> [u32; 2] {
        [self.width, self.height].map(|cells| {
            canvas_extent(self.cell_size, cells).unwrap_or_default()
        })
    }

    /// Maps a pointer position to `(row, col)`.
    ///
    /// The pointer is scaled from displayed pixels to canvas pixels, so a
    /// canvas shown at a different density than its internal resolution
    /// still addresses the right cell. The result is clamped to the grid.
    pub fn to_cell(&self, pointer: [f64; 2], rect: CanvasRect) -> (u32, u32) {
        let [canvas_w, canvas_h] = self.canvas_size().map(f64::from);
        let scale_x = canvas_w / rect.width;
        let scale_y = canvas_h / rect.height;

        let canvas_x = (pointer[0] - rect.left) * scale_x;
        let canvas_y = (pointer[1] - rect.top) * scale_y;

        let pitch = f64::from(self.cell_size + 1);
        let row = clamp_cell((canvas_y / pitch).floor(), self.height);
        let col = clamp_cell((canvas_x / pitch).floor(), self.width);

        (row, col)
    }
}

fn clamp_cell(value: f64, len: u32) -> u32 {
    // NaN (degenerate rect) saturates to 0.
    (value as i64).clamp(0, i64::from(len) - 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(mapper: &CellMapper) -> CanvasRect {
        let [w, h] = mapper.canvas_size();
        CanvasRect::new(0.0, 0.0, f64::from(w), f64::from(h))
    }

    #[test]
    #[should_panic(expected = "overflows the canvas")]
    fn refuses_grids_whose_canvas_overflows() {
        CellMapper::new(900_000_000, 1, 4);
    }

    #[test]
    fn identity_scaling_divides_by_the_pitch() {
        let mapper = CellMapper::new(192, 96, 4);
        let rect = identity(&mapper);

        assert_eq!(mapper.to_cell([0.0, 0.0], rect), (0, 0));
        assert_eq!(mapper.to_cell([4.9, 4.9], rect), (0, 0));
        assert_eq!(mapper.to_cell([5.0, 10.0], rect), (2, 1));
        assert_eq!(mapper.to_cell([27.0, 13.0], rect), (2, 5));
    }

    #[test]
    fn bottom_right_corner_maps_to_the_last_cell() {
        let mapper = CellMapper::new(192, 96, 4);
        let rect = identity(&mapper);
        let corner = [rect.width, rect.height];

        assert_eq!(mapper.to_cell(corner, rect), (95, 191));
    }

    #[test]
    fn positions_outside_the_grid_are_clamped() {
        let mapper = CellMapper::new(10, 8, 3);
        let rect = identity(&mapper);

        assert_eq!(mapper.to_cell([-20.0, -1.0], rect), (0, 0));
        assert_eq!(mapper.to_cell([1000.0, 1000.0], rect), (7, 9));
    }

    #[test]
    fn pointer_density_is_scaled_to_the_canvas() {
        // Canvas shown at twice its internal resolution, offset in the window.
        let mapper = CellMapper::new(10, 10, 4);
        let [w, h] = mapper.canvas_size();
        let [w, h] = [f64::from(w) * 2.0, f64::from(h) * 2.0];
        let rect = CanvasRect::new(100.0, 50.0, w, h);

        // Canvas pixel (12, 22) -> col 2, row 4.
        assert_eq!(mapper.to_cell([124.0, 94.0], rect), (4, 2));
    }

    #[test]
    fn degenerate_rect_does_not_panic() {
        let mapper = CellMapper::new(4, 4, 1);
        let rect = CanvasRect::new(0.0, 0.0, 0.0, 0.0);
        let (row, col) = mapper.to_cell([0.0, 0.0], rect);
        assert!(row < 4 && col < 4);
    }

    #[test]
    fn letterbox_preserves_aspect_ratio() {
        let rect = CanvasRect::letterbox([200, 100], [400, 400]);
        assert_eq!(rect, CanvasRect::new(0.0, 100.0, 400.0, 200.0));
        assert!(rect.contains(400.0, 300.0));
        assert!(!rect.contains(10.0, 50.0));
    }
}
