pub use crate::config::{ConfigWatcher, ViewerConfig, resolve_config_path};
pub use crate::engine::{Engine, LifeEngine, Pattern, UniverseHandle};
pub use crate::framework::logging::init_logger;
pub use crate::framework::logging::{debug, error, info, trace, warn};
pub use crate::input::{
    CanvasRect, CellMapper, Edit, EditTarget, InteractionController, Modifiers,
};
pub use crate::render::{Canvas, CellRasterizer, Color, GridView, Palette};
pub use crate::runtime::events::{
    RuntimeCommand, RuntimeCommandReceiver, RuntimeCommandSender, RuntimeEvent,
    RuntimeEventReceiver, RuntimeEventSender, command_channel, event_channel,
};
pub use crate::runtime::frame_clock::RefreshClock;
pub use crate::runtime::frame_timer::{FrameReport, FrameTimer};
pub use crate::runtime::playback::{PlaybackController, PlaybackState};
pub use crate::runtime::scheduler::{FrameHandle, FrameQueue, FrameScheduler};
pub use crate::{run, run_config_file, run_with_channels};
