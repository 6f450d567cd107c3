//! The simulation side of the viewer.
//!
//! The viewer never evaluates the automaton itself. Everything it needs is
//! behind [`Engine`]: create a universe, advance it, edit single cells,
//! stamp presets and borrow the packed bit buffer for drawing.
//! [`LifeEngine`] is the bundled Conway implementation.

mod life;
mod patterns;

pub use life::{DEFAULT_DENSITY, LifeEngine};
pub use patterns::Pattern;

use crate::render::decoder::GridView;

/// Identifies one universe instance owned by an [`Engine`].
///
/// Handles are never mutated. Replacing a universe yields a new handle with
/// a higher generation and every older handle becomes stale.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct UniverseHandle {
    generation: u64,
    width: u32,
    height: u32,
}

impl UniverseHandle {
    pub fn new(generation: u64, width: u32, height: u32) -> Self {
        assert!(
            width > 0 && height > 0,
            "universe dimensions must be positive, got {}x{}",
            width,
            height
        );

        Self {
            generation,
            width,
            height,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

pub trait Engine {
    /// New universe with pseudo-random live cells. Replaces the current one.
    fn create_random(&mut self, width: u32, height: u32) -> UniverseHandle;

    /// New universe with every cell dead. Replaces the current one.
    fn create_empty(&mut self, width: u32, height: u32) -> UniverseHandle;

    /// Advances the universe by one generation in place.
    fn tick(&mut self, handle: UniverseHandle);

    /// Sets one cell alive; no-op when it already is.
    fn set_alive(&mut self, handle: UniverseHandle, row: u32, col: u32);

    fn toggle(&mut self, handle: UniverseHandle, row: u32, col: u32);

    /// Writes a preset anchored at `(row, col)`, clipped at the grid edges.
    fn stamp(
        &mut self,
        handle: UniverseHandle,
        pattern: Pattern,
        row: u32,
        col: u32,
    );

    /// Borrows the packed cell bits. The view is tagged with the handle's
    /// generation and must not outlive the universe it was taken from.
    fn grid_view(&self, handle: UniverseHandle) -> GridView<'_>;
}
