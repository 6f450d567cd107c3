use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::mpsc::{Receiver, Sender};

use super::frame_timer::FrameReport;
use super::playback::PlaybackState;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RuntimeCommand {
    CaptureFrame,
    Clear,
    Pause,
    Play,
    Quit,
    Reset,
    SetStepRate(u32),
    Step,
    TogglePlayback,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RuntimeEvent {
    CaptureSaved(PathBuf),
    FrameStats(FrameReport),
    PlaybackChanged(PlaybackState),
    StepRateChanged(u32),
    Stopped,
    UniverseReplaced(u64),
}

pub type RuntimeCommandSender = Sender<RuntimeCommand>;
pub type RuntimeCommandReceiver = Receiver<RuntimeCommand>;
pub type RuntimeEventSender = Sender<RuntimeEvent>;
pub type RuntimeEventReceiver = Receiver<RuntimeEvent>;

pub fn command_channel() -> (RuntimeCommandSender, RuntimeCommandReceiver) {
    mpsc::channel()
}

pub fn event_channel() -> (RuntimeEventSender, RuntimeEventReceiver) {
    mpsc::channel()
}
