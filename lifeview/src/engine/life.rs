use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Engine, Pattern, UniverseHandle};
use crate::config::ViewerConfig;
use crate::render::decoder::{GridView, packed_len};

pub const DEFAULT_DENSITY: f64 = 0.33;

/// Conway's Game of Life (B3/S23) on a toroidal grid.
///
/// Holds a single universe at a time; every `create_*` call replaces it and
/// bumps the generation so older handles fail fast instead of reading
/// memory that belongs to a different universe.
pub struct LifeEngine {
    rng: StdRng,
    density: f64,
    generation: u64,
    universe: Option<Universe>,
}

struct Universe {
    width: u32,
    height: u32,
    cells: Vec<u8>,
    scratch: Vec<u8>,
}

impl LifeEngine {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Reproducible random universes.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Seeded when the config names a seed, entropy-seeded otherwise.
    pub fn from_config(config: &ViewerConfig) -> Self {
        let engine = match config.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };
        engine.with_density(config.density)
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            density: DEFAULT_DENSITY,
            generation: 0,
            universe: None,
        }
    }

    /// Probability that a cell starts alive in `create_random`.
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density.clamp(0.0, 1.0);
        self
    }

    /// Applies to universes created from now on.
    pub fn set_density(&mut self, density: f64) {
        self.density = density.clamp(0.0, 1.0);
    }

    fn replace(&mut self, universe: Universe) -> UniverseHandle {
        self.generation += 1;
        let (width, height) = (universe.width, universe.height);
        let handle = UniverseHandle::new(self.generation, width, height);
        self.universe = Some(universe);
        debug!(
            "universe replaced: generation {} ({}x{})",
            handle.generation(),
            handle.width(),
            handle.height()
        );
        handle
    }

    fn universe(&self, handle: UniverseHandle) -> &Universe {
        match self.universe.as_ref() {
            Some(universe) if handle.generation() == self.generation => {
                universe
            }
            _ => panic!(
                "stale universe handle: generation {} (current {})",
                handle.generation(),
                self.generation
            ),
        }
    }

    fn universe_mut(&mut self, handle: UniverseHandle) -> &mut Universe {
        let current = self.generation;
        match self.universe.as_mut() {
            Some(universe) if handle.generation() == current => universe,
            _ => panic!(
                "stale universe handle: generation {} (current {})",
                handle.generation(),
                current
            ),
        }
    }
}

impl Default for LifeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for LifeEngine {
    fn create_random(&mut self, width: u32, height: u32) -> UniverseHandle {
        let mut universe = Universe::empty(width, height);
        for index in 0..universe.cell_count() {
            if self.rng.random_bool(self.density) {
                universe.set(index, true);
            }
        }
        self.replace(universe)
    }

    fn create_empty(&mut self, width: u32, height: u32) -> UniverseHandle {
        self.replace(Universe::empty(width, height))
    }

    fn tick(&mut self, handle: UniverseHandle) {
        self.universe_mut(handle).tick();
    }

    fn set_alive(&mut self, handle: UniverseHandle, row: u32, col: u32) {
        let universe = self.universe_mut(handle);
        let index = universe.checked_index(row, col);
        universe.set(index, true);
    }

    fn toggle(&mut self, handle: UniverseHandle, row: u32, col: u32) {
        let universe = self.universe_mut(handle);
        let index = universe.checked_index(row, col);
        let alive = universe.get(index);
        universe.set(index, !alive);
    }

    fn stamp(
        &mut self,
        handle: UniverseHandle,
        pattern: Pattern,
        row: u32,
        col: u32,
    ) {
        let universe = self.universe_mut(handle);
        for (r, c) in pattern.cells(row, col, universe.width, universe.height)
        {
            let index = universe.checked_index(r, c);
            universe.set(index, true);
        }
    }

    fn grid_view(&self, handle: UniverseHandle) -> GridView<'_> {
        let universe = self.universe(handle);
        GridView::new(
            &universe.cells,
            universe.width,
            universe.height,
            handle.generation(),
        )
    }
}

impl Universe {
    fn empty(width: u32, height: u32) -> Self {
        assert!(
            width > 0 && height > 0,
            "universe dimensions must be positive, got {}x{}",
            width,
            height
        );
        let len = packed_len(width, height);
        Self {
            width,
            height,
            cells: vec![0; len],
            scratch: vec![0; len],
        }
    }

    fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn checked_index(&self, row: u32, col: u32) -> usize {
        assert!(
            row < self.height && col < self.width,
            "cell ({}, {}) is outside the {}x{} universe",
            row,
            col,
            self.width,
            self.height
        );
        row as usize * self.width as usize + col as usize
    }

    fn get(&self, index: usize) -> bool {
        self.cells[index / 8] & (1 << (index % 8)) != 0
    }

    fn set(&mut self, index: usize, alive: bool) {
        write_bit(&mut self.cells, index, alive);
    }

    fn live_neighbor_count(&self, row: u32, col: u32) -> u8 {
        let north = if row == 0 { self.height - 1 } else { row - 1 };
        let south = if row == self.height - 1 { 0 } else { row + 1 };
        let west = if col == 0 { self.width - 1 } else { col - 1 };
        let east = if col == self.width - 1 { 0 } else { col + 1 };

        [
            (north, west),
            (north, col),
            (north, east),
            (row, west),
            (row, east),
            (south, west),
            (south, col),
            (south, east),
        ]
        .iter()
        .map(|&(r, c)| {
            self.get(r as usize * self.width as usize + c as usize) as u8
        })
        .sum()
    }

    fn tick(&mut self) {
        let mut next = std::mem::take(&mut self.scratch);
        next.fill(0);

        for row in 0..self.height {
            for col in 0..self.width {
                let index = row as usize * self.width as usize + col as usize;
                let neighbors = self.live_neighbor_count(row, col);
                let alive = match (self.get(index), neighbors) {
                    (true, 2) | (true, 3) => true,
                    (false, 3) => true,
                    _ => false,
                };
                if alive {
                    write_bit(&mut next, index, true);
                }
            }
        }

        self.scratch = std::mem::replace(&mut self.cells, next);
    }
}

fn write_bit(bytes: &mut [u8], index: usize, alive: bool) {
    let mask = 1 << (index % 8);
    if alive {
        bytes[index / 8] |= mask;
    } else {
        bytes[index / 8] &= !mask;
    }
}
