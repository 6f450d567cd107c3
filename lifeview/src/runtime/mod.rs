pub mod app;
pub mod events;
pub mod frame_clock;
pub mod frame_timer;
pub mod playback;
pub mod scheduler;
