use std::io::Write;

use env_logger::{Builder, Env};
use log::{Level, LevelFilter};
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

pub use log::{debug, error, info, trace, warn};

const DEFAULT_FILTER: &str = "lifeview=info";

/// Colored `[LEVEL][module] message` lines on stderr. `RUST_LOG` overrides
/// the default filter. Safe to call more than once.
pub fn init_logger() {
    let mut builder =
        Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    builder.filter_module("naga", LevelFilter::Warn);
    builder.filter_module("wgpu", LevelFilter::Warn);
    builder.filter_module("wgpu_core", LevelFilter::Warn);
    builder.filter_module("wgpu_hal", LevelFilter::Warn);

    builder.format(|_buf, record| {
        let writer = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = writer.buffer();

        buffer.set_color(ColorSpec::new().set_fg(Some(level_color(
            record.level(),
        ))))?;
        let module_path = record.module_path().unwrap_or("<unknown>");
        write!(buffer, "[{}][{}]", record.level(), module_path)?;
        buffer.reset()?;
        writeln!(buffer, " {}", record.args())?;
        writer.print(&buffer)
    });

    let _ = builder.try_init();
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Trace => Color::Cyan,
        Level::Debug => Color::Blue,
        Level::Info => Color::Green,
        Level::Warn => Color::Yellow,
        Level::Error => Color::Red,
    }
}
