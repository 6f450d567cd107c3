use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use super::events::{
    RuntimeCommand, RuntimeCommandReceiver, RuntimeEvent, RuntimeEventSender,
    command_channel,
};
use super::frame_clock::RefreshClock;
use super::playback::PlaybackController;
use super::scheduler::FrameQueue;
use crate::config::{ConfigWatcher, ViewerConfig, resolve_config_path};
use crate::engine::LifeEngine;
use crate::framework::logging;
use crate::input::{CanvasRect, CellMapper, InteractionController, Modifiers};
use crate::render::capture::{capture_path, queue_png_capture};
use crate::render::gpu::{CanvasPresenter, choose_surface_format};

const TITLE: &str = "Life";
const TITLE_INTERVAL: Duration = Duration::from_millis(250);
// Commands and config edits arrive without waking the loop, so a paused
// viewer still polls for them, just far below the refresh rate.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

struct Gpu {
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
    presenter: CanvasPresenter,
}

struct LifeRuntime {
    config: ViewerConfig,
    config_watcher: Option<ConfigWatcher>,
    playback: PlaybackController<LifeEngine>,
    interaction: InteractionController,
    clock: RefreshClock,
    command_rx: RuntimeCommandReceiver,
    event_tx: Option<RuntimeEventSender>,
    window: Option<Arc<Window>>,
    window_id: Option<WindowId>,
    gpu: Option<Gpu>,
    canvas_uploaded: bool,
    cursor: [f64; 2],
    modifiers: ModifiersState,
    last_title_update: Instant,
    shutdown_signaled: bool,
}

impl LifeRuntime {
    fn new(
        config: ViewerConfig,
        config_watcher: Option<ConfigWatcher>,
        command_rx: RuntimeCommandReceiver,
        event_tx: Option<RuntimeEventSender>,
    ) -> Self {
        let playback = PlaybackController::with_event_sender(
            LifeEngine::from_config(&config),
            FrameQueue::new(),
            &config,
            event_tx.clone(),
        );
        let interaction = InteractionController::new(CellMapper::new(
            config.width,
            config.height,
            config.cell_size,
        ));
        let clock = RefreshClock::new(config.refresh_rate);

        Self {
            config,
            config_watcher,
            playback,
            interaction,
            clock,
            command_rx,
            event_tx,
            window: None,
            window_id: None,
            gpu: None,
            canvas_uploaded: false,
            cursor: [0.0, 0.0],
            modifiers: ModifiersState::default(),
            last_title_update: Instant::now(),
            shutdown_signaled: false,
        }
    }

    // Returns true when the command ends the event loop.
    fn on_command(
        &mut self,
        event_loop: &ActiveEventLoop,
        command: RuntimeCommand,
    ) -> bool {
        debug!("runtime command: {:?}", command);

        match command {
            RuntimeCommand::TogglePlayback => self.playback.toggle(),
            RuntimeCommand::Play => self.playback.play(),
            RuntimeCommand::Pause => self.playback.pause(),
            RuntimeCommand::Step => self.playback.step(),
            RuntimeCommand::Reset => self.playback.reset(),
            RuntimeCommand::Clear => self.playback.clear(),
            RuntimeCommand::SetStepRate(rate) => {
                self.playback.set_step_rate(rate);
            }
            RuntimeCommand::CaptureFrame => self.capture_frame(),
            RuntimeCommand::Quit => {
                self.shutdown(event_loop);
                return true;
            }
        }

        self.update_title();
        false
    }

    fn process_commands(&mut self, event_loop: &ActiveEventLoop) -> bool {
        while let Ok(command) = self.command_rx.try_recv() {
            if self.on_command(event_loop, command) {
                return true;
            }
        }
        false
    }

    fn capture_frame(&self) {
        let path = capture_path(
            &self.config.images_dir,
            self.playback.universe().generation(),
        );
        info!("capturing frame to {:?}", path);
        queue_png_capture(
            self.playback.canvas().clone(),
            path,
            self.event_tx.clone(),
        );
    }

    fn reload_config_if_changed(&mut self) {
        let Some(watcher) = self.config_watcher.as_ref() else {
            return;
        };

        if !watcher.take_changed() {
            return;
        }

        let next = match ViewerConfig::load(watcher.path()) {
            Ok(next) => next,
            Err(err) => {
                warn!("keeping previous config: {}", err);
                return;
            }
        };

        if self.config.requires_restart(&next) {
            warn!(
                "universe size changed to {}x{} (cell {}); requires restart",
                next.width, next.height, next.cell_size
            );
        }

        // Keys may have changed the step rate since the last load; only
        // values edited in the file are applied.
        let update = self.config.live_update(&next);
        if let Some(palette) = update.palette {
            self.playback.set_palette(palette);
        }
        if let Some(step_rate) = update.step_rate {
            self.playback.set_step_rate(step_rate);
        }
        if let Some(density) = update.density {
            self.playback.engine_mut().set_density(density);
        }
        if let Some(refresh_rate) = update.refresh_rate {
            self.clock.set_hz(refresh_rate);
        }

        self.config = ViewerConfig {
            width: self.config.width,
            height: self.config.height,
            cell_size: self.config.cell_size,
            ..next
        };

        info!("config reloaded");
        self.update_title();
    }

    fn handle_shortcut(
        &mut self,
        event_loop: &ActiveEventLoop,
        key_event: &KeyEvent,
    ) -> bool {
        if key_event.state != ElementState::Pressed {
            return false;
        }

        let PhysicalKey::Code(code) = key_event.physical_key else {
            return false;
        };

        // Held step keys advance one generation per key repeat.
        if key_event.repeat
            && !matches!(code, KeyCode::KeyA | KeyCode::ArrowRight)
        {
            return false;
        }

        let platform_mod_pressed =
            Modifiers::from_state(self.modifiers).platform;
        let step_rate = self.playback.step_rate();

        let command = match code {
            KeyCode::KeyQ if platform_mod_pressed => RuntimeCommand::Quit,
            _ if platform_mod_pressed => return false,
            KeyCode::Space | KeyCode::KeyP => RuntimeCommand::TogglePlayback,
            KeyCode::KeyA | KeyCode::ArrowRight => RuntimeCommand::Step,
            KeyCode::KeyR => RuntimeCommand::Reset,
            KeyCode::KeyC => RuntimeCommand::Clear,
            KeyCode::KeyI => RuntimeCommand::CaptureFrame,
            KeyCode::Equal | KeyCode::NumpadAdd => {
                RuntimeCommand::SetStepRate(step_rate.saturating_add(1))
            }
            KeyCode::Minus | KeyCode::NumpadSubtract => {
                RuntimeCommand::SetStepRate(step_rate.saturating_sub(1))
            }
            _ => match digit_from_key_code(code) {
                Some(digit) if digit > 0 => RuntimeCommand::SetStepRate(digit),
                _ => return false,
            },
        };

        self.on_command(event_loop, command);
        true
    }

    fn canvas_rect(&self) -> CanvasRect {
        let canvas = self.interaction.mapper().canvas_size();
        let surface = self.gpu.as_ref().map_or_else(
            || {
                self.window
                    .as_ref()
                    .map(|w| [w.inner_size().width, w.inner_size().height])
                    .unwrap_or(canvas)
            },
            |gpu| [gpu.surface_config.width, gpu.surface_config.height],
        );

        CanvasRect::letterbox(canvas, surface)
    }

    fn on_cursor_moved(&mut self, pointer: [f64; 2]) {
        self.cursor = pointer;
        let rect = self.canvas_rect();
        self.interaction.pointer_move(pointer, rect, &mut self.playback);
    }

    fn on_mouse_input(&mut self, state: ElementState, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }

        let rect = self.canvas_rect();
        match state {
            ElementState::Pressed => {
                self.interaction.pointer_down(self.cursor, rect);
            }
            ElementState::Released => {
                let modifiers = Modifiers::from_state(self.modifiers);
                if let Some(edit) = self.interaction.pointer_up(
                    self.cursor,
                    rect,
                    modifiers,
                    &mut self.playback,
                ) {
                    debug!("click: {:?}", edit);
                }
            }
        }
    }

    fn update_title(&mut self) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        let mut title = format!(
            "{} {} ×{}",
            TITLE,
            self.playback.state().glyph(),
            self.playback.step_rate()
        );
        if let Some(report) = self.playback.last_report() {
            title.push_str(" · ");
            title.push_str(&report.summary());
        }

        window.set_title(&title);
        self.last_title_update = Instant::now();
    }

    fn init_runtime(
        &mut self,
        event_loop: &ActiveEventLoop,
    ) -> Result<(), String> {
        let [canvas_w, canvas_h] = self.playback.canvas().size();
        let attrs = WindowAttributes::default()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(canvas_w, canvas_h));

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|err| format!("failed to create window: {}", err))?,
        );

        let instance =
            wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let surface = instance
            .create_surface(window.clone())
            .map_err(|err| format!("failed to create surface: {}", err))?;

        let adapter = pollster::block_on(instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            },
        ))
        .map_err(|err| format!("no suitable GPU adapter: {}", err))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lifeview-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::default(),
            },
        ))
        .map_err(|err| format!("failed to open GPU device: {}", err))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps.formats)
            .ok_or_else(|| "surface has no supported formats".to_string())?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let max_dimension = device.limits().max_texture_dimension_2d;
        if canvas_w > max_dimension || canvas_h > max_dimension {
            return Err(format!(
                "canvas {}x{} exceeds the GPU texture limit of {}",
                canvas_w, canvas_h, max_dimension
            ));
        }

        surface.configure(&device, &surface_config);

        let presenter =
            CanvasPresenter::new(&device, format, [canvas_w, canvas_h])?;

        self.window_id = Some(window.id());
        self.window = Some(window);
        self.gpu = Some(Gpu {
            surface,
            surface_config,
            device,
            queue,
            presenter,
        });
        self.canvas_uploaded = false;

        Ok(())
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        gpu.surface_config.width = new_size.width;
        gpu.surface_config.height = new_size.height;
        gpu.surface.configure(&gpu.device, &gpu.surface_config);

        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn render(&mut self, event_loop: &ActiveEventLoop) {
        let rect = self.canvas_rect();
        let backdrop = self.playback.rasterizer().palette().grid;

        let acquired = match self.gpu.as_ref() {
            Some(gpu) => gpu.surface.get_current_texture(),
            None => return,
        };

        let output = match acquired {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(gpu) = self.gpu.as_ref() {
                    gpu.surface
                        .configure(&gpu.device, &gpu.surface_config);
                }
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout while acquiring frame");
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory; exiting");
                self.shutdown(event_loop);
                return;
            }
            Err(wgpu::SurfaceError::Other) => {
                warn!("surface error while acquiring frame");
                return;
            }
        };

        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };

        if !self.canvas_uploaded {
            gpu.presenter.upload(&gpu.queue, self.playback.canvas());
            self.canvas_uploaded = true;
        }

        gpu.presenter.present(
            &gpu.device,
            &gpu.queue,
            output,
            rect,
            backdrop,
        );
    }

    fn emit_event(&self, event: RuntimeEvent) {
        let Some(event_tx) = self.event_tx.as_ref() else {
            return;
        };

        if let Err(err) = event_tx.send(event) {
            warn!("failed to emit runtime event: {}", err);
        }
    }

    fn signal_shutdown(&mut self) {
        if self.shutdown_signaled {
            return;
        }

        self.shutdown_signaled = true;
        self.emit_event(RuntimeEvent::Stopped);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.signal_shutdown();
        event_loop.exit();
    }
}

impl ApplicationHandler for LifeRuntime {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.init_runtime(event_loop) {
            error!("failed to initialize lifeview runtime: {}", err);
            self.shutdown(event_loop);
            return;
        }

        self.update_title();
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.window_id != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.shutdown(event_loop);
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_shortcut(event_loop, &event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor_moved([position.x, position.y]);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.on_mouse_input(state, button);
            }
            WindowEvent::Focused(false) => {
                self.interaction.cancel();
                self.modifiers = ModifiersState::default();
            }
            WindowEvent::Resized(new_size) => self.resize(new_size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = self.window.as_ref() {
                    self.resize(window.inner_size());
                }
            }
            WindowEvent::RedrawRequested => {
                self.render(event_loop);
            }
            _ => {}
        }
    }

    // Each emulated refresh fires the frame callbacks requested since the
    // previous one.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.process_commands(event_loop) {
            return;
        }
        self.reload_config_if_changed();

        let now = Instant::now();
        if self.clock.tick(now) {
            for handle in self.playback.scheduler_mut().take_due() {
                self.playback.on_frame(handle, now);
            }

            if now.duration_since(self.last_title_update) >= TITLE_INTERVAL {
                self.update_title();
            }
        }

        if self.playback.take_canvas_dirty() {
            self.canvas_uploaded = false;
            if let Some(window) = self.window.as_ref() {
                window.request_redraw();
            }
        }

        event_loop.set_control_flow(ControlFlow::WaitUntil(next_wake(
            self.playback.is_paused(),
            &self.clock,
            now,
        )));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.signal_shutdown();
    }
}

/// Opens the viewer window and blocks until it is closed.
pub fn run(config: ViewerConfig) -> Result<(), String> {
    let (_command_tx, command_rx) = command_channel();
    run_with_channels(config, None, command_rx, None)
}

/// Loads `path`, then runs the viewer with the file watched for edits.
pub fn run_config_file(path: impl Into<PathBuf>) -> Result<(), String> {
    let path = resolve_config_path(path)?;
    let config = ViewerConfig::load(&path)?;
    let (_command_tx, command_rx) = command_channel();
    run_with_channels(config, Some(path), command_rx, None)
}

/// Runs the viewer driven by an external command channel. Lifecycle and
/// timing events go to `event_tx` when given.
pub fn run_with_channels(
    config: ViewerConfig,
    config_path: Option<PathBuf>,
    command_rx: RuntimeCommandReceiver,
    event_tx: Option<RuntimeEventSender>,
) -> Result<(), String> {
    logging::init_logger();
    config.validate()?;

    let config_watcher = match config_path {
        Some(path) => match ConfigWatcher::start(path.clone()) {
            Ok(watcher) => {
                info!("watching config {:?}", path);
                Some(watcher)
            }
            Err(err) => {
                warn!("config hot reload disabled for {:?}: {}", path, err);
                None
            }
        },
        None => None,
    };

    let event_loop = EventLoop::new()
        .map_err(|err| format!("failed to create event loop: {}", err))?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut runner =
        LifeRuntime::new(config, config_watcher, command_rx, event_tx);

    event_loop
        .run_app(&mut runner)
        .map_err(|err| format!("event loop error: {}", err))
}

/// When the loop next needs to run: the next refresh while playing, the
/// idle poll while paused.
fn next_wake(paused: bool, clock: &RefreshClock, now: Instant) -> Instant {
    if paused {
        now + IDLE_POLL_INTERVAL
    } else {
        clock.next_deadline()
    }
}

fn digit_from_key_code(code: KeyCode) -> Option<u32> {
    match code {
        KeyCode::Digit0 | KeyCode::Numpad0 => Some(0),
        KeyCode::Digit1 | KeyCode::Numpad1 => Some(1),
        KeyCode::Digit2 | KeyCode::Numpad2 => Some(2),
        KeyCode::Digit3 | KeyCode::Numpad3 => Some(3),
        KeyCode::Digit4 | KeyCode::Numpad4 => Some(4),
        KeyCode::Digit5 | KeyCode::Numpad5 => Some(5),
        KeyCode::Digit6 | KeyCode::Numpad6 => Some(6),
        KeyCode::Digit7 | KeyCode::Numpad7 => Some(7),
        KeyCode::Digit8 | KeyCode::Numpad8 => Some(8),
        KeyCode::Digit9 | KeyCode::Numpad9 => Some(9),
        _ => None,
    }
}
