use std::time::Instant;

use log::{debug, info, warn};

use super::events::{RuntimeEvent, RuntimeEventSender};
use super::frame_timer::{FrameReport, FrameTimer};
use super::scheduler::{FrameHandle, FrameQueue, FrameScheduler};
use crate::config::ViewerConfig;
use crate::engine::{Engine, UniverseHandle};
use crate::input::interaction::{Edit, EditTarget};
use crate::render::canvas::{Canvas, Palette};
use crate::render::raster::CellRasterizer;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlaybackState {
    Paused,
    Playing,
}

impl PlaybackState {
    /// Glyph of the play/pause control: the action a press would take.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Paused => "▶",
            Self::Playing => "⏸",
        }
    }
}

/// Owns the current universe and the animation loop that advances it.
///
/// `Playing` holds exactly one outstanding frame request; `Paused` holds
/// none. Every frame callback records timing, runs `step_rate` ticks,
/// redraws and requests the next frame. Only [`pause`](Self::pause) and the
/// operations that force a pause stop the loop.
pub struct PlaybackController<E, S = FrameQueue> {
    engine: E,
    scheduler: S,
    universe: UniverseHandle,
    animation: Option<FrameHandle>,
    step_rate: u32,
    rasterizer: CellRasterizer,
    canvas: Canvas,
    canvas_dirty: bool,
    frame_timer: FrameTimer,
    last_report: Option<FrameReport>,
    event_tx: Option<RuntimeEventSender>,
}

impl<E, S> PlaybackController<E, S>
where
    E: Engine,
    S: FrameScheduler,
{
    /// Creates a random universe, draws it and starts playing.
    pub fn new(engine: E, scheduler: S, config: &ViewerConfig) -> Self {
        Self::with_event_sender(engine, scheduler, config, None)
    }

    pub fn with_event_sender(
        mut engine: E,
        scheduler: S,
        config: &ViewerConfig,
        event_tx: Option<RuntimeEventSender>,
    ) -> Self {
        let universe = engine.create_random(config.width, config.height);
        let rasterizer = CellRasterizer::new(config.cell_size, config.palette);
        let canvas = rasterizer.new_canvas(config.width, config.height);

        let mut controller = Self {
            engine,
            scheduler,
            universe,
            animation: None,
            step_rate: config.step_rate.max(1),
            rasterizer,
            canvas,
            canvas_dirty: false,
            frame_timer: FrameTimer::new(),
            last_report: None,
            event_tx,
        };

        controller.redraw();
        controller.play();
        controller
    }

    pub fn state(&self) -> PlaybackState {
        if self.animation.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }

    pub fn is_paused(&self) -> bool {
        self.animation.is_none()
    }

    pub fn animation(&self) -> Option<FrameHandle> {
        self.animation
    }

    pub fn universe(&self) -> UniverseHandle {
        self.universe
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn rasterizer(&self) -> &CellRasterizer {
        &self.rasterizer
    }

    pub fn last_report(&self) -> Option<FrameReport> {
        self.last_report
    }

    pub fn step_rate(&self) -> u32 {
        self.step_rate
    }

    /// Ticks per displayed frame. Clamped to at least one.
    pub fn set_step_rate(&mut self, rate: u32) -> u32 {
        let rate = rate.max(1);
        if rate != self.step_rate {
            self.step_rate = rate;
            debug!("step rate set to {}", rate);
            self.emit(RuntimeEvent::StepRateChanged(rate));
        }
        self.step_rate
    }

    pub fn set_palette(&mut self, palette: Palette) {
        if palette != self.rasterizer.palette() {
            self.rasterizer.set_palette(palette);
            self.redraw();
        }
    }

    pub fn play(&mut self) {
        if self.animation.is_some() {
            return;
        }

        self.animation = Some(self.scheduler.request_frame());
        self.emit(RuntimeEvent::PlaybackChanged(PlaybackState::Playing));
        info!("playing");
    }

    pub fn pause(&mut self) {
        let Some(handle) = self.animation.take() else {
            return;
        };

        self.scheduler.cancel_frame(handle);
        self.emit(RuntimeEvent::PlaybackChanged(PlaybackState::Paused));
        info!("paused");
    }

    pub fn toggle(&mut self) {
        match self.state() {
            PlaybackState::Paused => self.play(),
            PlaybackState::Playing => self.pause(),
        }
    }

    /// One tick and a redraw, then paused.
    pub fn step(&mut self) {
        self.engine.tick(self.universe);
        self.redraw();
        self.pause();
    }

    /// Fresh random universe of the same size, paused.
    pub fn reset(&mut self) {
        let handle = self
            .engine
            .create_random(self.universe.width(), self.universe.height());
        self.replace_universe(handle);
        self.pause();
    }

    /// Fresh empty universe of the same size, paused.
    pub fn clear(&mut self) {
        let handle = self
            .engine
            .create_empty(self.universe.width(), self.universe.height());
        self.replace_universe(handle);
        self.pause();
    }

    /// The per-frame callback. `handle` must be the frame this controller
    /// requested last.
    pub fn on_frame(&mut self, handle: FrameHandle, now: Instant) {
        if self.animation != Some(handle) {
            warn!("ignoring stale frame callback {}", handle.id());
            return;
        }

        let report = self.frame_timer.record_frame(now);
        self.last_report = Some(report);
        self.emit(RuntimeEvent::FrameStats(report));

        for _ in 0..self.step_rate {
            self.engine.tick(self.universe);
        }
        self.redraw();

        self.animation = Some(self.scheduler.request_frame());
    }

    /// Repaints the canvas from a freshly borrowed grid view.
    pub fn redraw(&mut self) {
        let view = self.engine.grid_view(self.universe);
        self.rasterizer.draw(self.universe, &view, &mut self.canvas);
        self.canvas_dirty = true;
    }

    /// Whether the canvas changed since the last call.
    pub fn take_canvas_dirty(&mut self) -> bool {
        std::mem::take(&mut self.canvas_dirty)
    }

    fn replace_universe(&mut self, handle: UniverseHandle) {
        assert_eq!(
            (handle.width(), handle.height()),
            (self.universe.width(), self.universe.height()),
            "replacement universe changed dimensions"
        );
        self.universe = handle;
        self.redraw();
        self.emit(RuntimeEvent::UniverseReplaced(handle.generation()));
    }

    fn emit(&self, event: RuntimeEvent) {
        let Some(event_tx) = self.event_tx.as_ref() else {
            return;
        };

        if let Err(err) = event_tx.send(event) {
            debug!("runtime event dropped: {}", err);
        }
    }
}

impl<E, S> EditTarget for PlaybackController<E, S>
where
    E: Engine,
    S: FrameScheduler,
{
    fn apply_edit(&mut self, edit: Edit) {
        match edit {
            Edit::Toggle { row, col } => {
                self.engine.toggle(self.universe, row, col);
            }
            Edit::Paint { row, col } => {
                self.engine.set_alive(self.universe, row, col);
            }
            Edit::Stamp { pattern, row, col } => {
                debug!("stamping {} at ({}, {})", pattern.name(), row, col);
                self.engine.stamp(self.universe, pattern, row, col);
            }
        }
        self.redraw();
    }
}
