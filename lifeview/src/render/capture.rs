use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{error, info};

use super::canvas::Canvas;
use crate::runtime::events::{RuntimeEvent, RuntimeEventSender};

/// `<dir>/lifeview-g<generation>-<unix millis>.png`
pub fn capture_path(images_dir: &Path, generation: u64) -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    images_dir.join(format!("lifeview-g{}-{}.png", generation, millis))
}

pub fn save_png(canvas: &Canvas, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "failed to create images directory '{}': {}",
                    parent.display(),
                    err
                )
            })?;
        }
    }

    let file = fs::File::create(path).map_err(|err| {
        format!("failed to create '{}': {}", path.display(), err)
    })?;
    let mut writer = std::io::BufWriter::new(file);
    let mut encoder =
        png::Encoder::new(&mut writer, canvas.width(), canvas.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Fast);
    let mut png_writer = encoder
        .write_header()
        .map_err(|err| format!("png header failed: {}", err))?;
    png_writer
        .write_image_data(canvas.as_bytes())
        .map_err(|err| format!("png write failed: {}", err))?;
    drop(png_writer);
    writer
        .flush()
        .map_err(|err| format!("png flush failed: {}", err))?;

    Ok(())
}

/// Encodes a snapshot of the canvas off the event-loop thread.
pub fn queue_png_capture(
    canvas: Canvas,
    path: PathBuf,
    event_tx: Option<RuntimeEventSender>,
) {
    thread::spawn(move || match save_png(&canvas, &path) {
        Ok(()) => {
            info!("image saved to {:?}", path);
            if let Some(tx) = event_tx.as_ref() {
                let _ = tx.send(RuntimeEvent::CaptureSaved(path));
            }
        }
        Err(err) => {
            error!("failed to save image capture: {}", err);
        }
    });
}
