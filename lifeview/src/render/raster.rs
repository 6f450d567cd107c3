use super::canvas::{Canvas, Palette};
use super::decoder::GridView;
use crate::engine::UniverseHandle;

/// Largest canvas edge a config may ask for. Matches wgpu's default
/// `max_texture_dimension_2d`.
pub const MAX_CANVAS_DIMENSION: u32 = 8192;

/// Canvas pixels along one axis of `cells` cells, grid lines included.
/// `None` when the result does not fit in a `u32`.
pub fn canvas_extent(cell_size: u32, cells: u32) -> Option<u32> {
    cell_size.checked_add(1)?.checked_mul(cells)?.checked_add(1)
}

/// Paints the whole grid every call: background, grid lines, live cells.
#[derive(Clone, Debug)]
pub struct CellRasterizer {
    cell_size: u32,
    palette: Palette,
}

impl CellRasterizer {
    pub fn new(cell_size: u32, palette: Palette) -> Self {
        assert!(cell_size > 0, "cell size must be positive");
        Self { cell_size, palette }
    }

    /// Cell pitch including the 1px grid line.
    pub fn pitch(&self) -> u32 {
        self.cell_size + 1
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    /// Canvas size for a `width` x `height` grid, border included.
    pub fn canvas_size(&self, width: u32, height: u32) -> [u32; 2] {
        [width, height].map(|cells| {
            canvas_extent(self.cell_size, cells).unwrap_or_else(|| {
                panic!(
                    "{} cells of size {} overflow the canvas",
                    cells, self.cell_size
                )
            })
        })
    }

    pub fn new_canvas(&self, width: u32, height: u32) -> Canvas {
        let [w, h] = self.canvas_size(width, height);
        Canvas::new(w, h)
    }

    pub fn draw(
        &self,
        handle: UniverseHandle,
        view: &GridView<'_>,
        canvas: &mut Canvas,
    ) {
        assert_eq!(
            view.generation(),
            handle.generation(),
            "grid view belongs to a replaced universe"
        );
        assert_eq!(
            canvas.size(),
            self.canvas_size(view.width(), view.height()),
            "canvas does not match the {}x{} grid",
            view.width(),
            view.height()
        );

        let pitch = self.pitch();

        canvas.fill(self.palette.dead);

        for col in 0..=view.width() {
            canvas.vline(col * pitch, self.palette.grid);
        }
        for row in 0..=view.height() {
            canvas.hline(row * pitch, self.palette.grid);
        }

        for (row, col) in view.alive_cells() {
            canvas.fill_rect(
                col * pitch + 1,
                row * pitch + 1,
                self.cell_size,
                self.cell_size,
                self.palette.alive,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, LifeEngine};
    use crate::render::canvas::Color;

    #[test]
    fn canvas_size_includes_grid_lines() {
        let raster = CellRasterizer::new(4, Palette::default());
        assert_eq!(raster.canvas_size(192, 96), [961, 481]);
    }

    #[test]
    fn canvas_extent_reports_overflow() {
        assert_eq!(canvas_extent(4, 192), Some(961));
        assert_eq!(canvas_extent(4, 900_000_000), None);
        assert_eq!(canvas_extent(u32::MAX, 1), None);
    }

    #[test]
    #[should_panic(expected = "overflow the canvas")]
    fn oversized_grids_fail_fast() {
        CellRasterizer::new(4, Palette::default()).canvas_size(900_000_000, 1);
    }

    #[test]
    fn draws_background_grid_and_cells_in_order() {
        let palette = Palette::default();
        let raster = CellRasterizer::new(2, palette);
        let mut engine = LifeEngine::with_seed(3);
        let handle = engine.create_empty(3, 2);
        engine.set_alive(handle, 1, 2);

        let mut canvas = raster.new_canvas(3, 2);
        raster.draw(handle, &engine.grid_view(handle), &mut canvas);

        assert_eq!(canvas.size(), [10, 7]);
        // Grid lines on every pitch boundary, including the far border.
        for x in [0, 3, 6, 9] {
            assert_eq!(canvas.pixel(x, 1), palette.grid.rgba());
        }
        for y in [0, 3, 6] {
            assert_eq!(canvas.pixel(1, y), palette.grid.rgba());
        }
        // Dead interior.
        assert_eq!(canvas.pixel(1, 1), palette.dead.rgba());
        // Live cell (1, 2) covers x 7..=8, y 4..=5.
        for (x, y) in [(7, 4), (8, 4), (7, 5), (8, 5)] {
            assert_eq!(canvas.pixel(x, y), palette.alive.rgba());
        }
        assert_eq!(canvas.pixel(9, 4), palette.grid.rgba());
    }

    #[test]
    fn redraw_reflects_cleared_cells() {
        let palette = Palette {
            alive: Color::rgb(255, 0, 0),
            ..Palette::default()
        };
        let raster = CellRasterizer::new(1, palette);
        let mut engine = LifeEngine::with_seed(3);
        let handle = engine.create_empty(2, 2);
        let mut canvas = raster.new_canvas(2, 2);

        engine.toggle(handle, 0, 0);
        raster.draw(handle, &engine.grid_view(handle), &mut canvas);
        assert_eq!(canvas.pixel(1, 1), palette.alive.rgba());

        engine.toggle(handle, 0, 0);
        raster.draw(handle, &engine.grid_view(handle), &mut canvas);
        assert_eq!(canvas.pixel(1, 1), palette.dead.rgba());
    }

    #[test]
    #[should_panic(expected = "replaced universe")]
    fn refuses_views_from_another_generation() {
        let raster = CellRasterizer::new(1, Palette::default());
        let mut engine = LifeEngine::with_seed(3);
        let old = engine.create_empty(2, 2);
        let current = engine.create_empty(2, 2);
        let mut canvas = raster.new_canvas(2, 2);

        raster.draw(old, &engine.grid_view(current), &mut canvas);
    }
}
