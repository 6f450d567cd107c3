#![allow(dead_code)]

use std::time::{Duration, Instant};

use lifeview::config::ViewerConfig;
use lifeview::engine::{Engine, LifeEngine};
use lifeview::runtime::frame_clock::RefreshClock;
use lifeview::runtime::playback::PlaybackController;
use lifeview::runtime::scheduler::{FrameQueue, FrameScheduler};

pub fn gpu_tests_enabled() -> bool {
    std::env::var("LIFEVIEW_RUN_GPU_TESTS")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn small_config(width: u32, height: u32) -> ViewerConfig {
    ViewerConfig {
        width,
        height,
        cell_size: 4,
        seed: Some(7),
        ..ViewerConfig::default()
    }
}

/// A playback controller over an empty universe, paused.
pub fn empty_playback(
    width: u32,
    height: u32,
) -> PlaybackController<LifeEngine> {
    let config = small_config(width, height);
    let mut playback = PlaybackController::new(
        LifeEngine::from_config(&config),
        FrameQueue::new(),
        &config,
    );
    playback.clear();
    playback
}

pub fn alive_cells<S>(
    playback: &PlaybackController<LifeEngine, S>,
) -> Vec<(u32, u32)>
where
    S: FrameScheduler,
{
    playback
        .engine()
        .grid_view(playback.universe())
        .alive_cells()
        .collect()
}

/// Drives the host loop without a window: advances a fake clock by one
/// refresh interval per iteration and fires due frames.
pub struct HeadlessHost {
    pub clock: RefreshClock,
    pub now: Instant,
}

impl HeadlessHost {
    pub fn new(hz: f32) -> Self {
        let now = Instant::now();
        Self {
            clock: RefreshClock::with_start(hz, now),
            now,
        }
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Runs `refreshes` display refreshes. Returns how many frame callbacks
    /// fired.
    pub fn run(
        &mut self,
        playback: &mut PlaybackController<LifeEngine>,
        refreshes: usize,
    ) -> usize {
        let mut fired = 0;
        for _ in 0..refreshes {
            self.now += self.clock.interval();
            if !self.clock.tick(self.now) {
                continue;
            }
            for handle in playback.scheduler_mut().take_due() {
                playback.on_frame(handle, self.now);
                fired += 1;
            }
        }
        fired
    }
}
