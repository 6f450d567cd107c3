use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use serde_yml::Value;
use yaml_merge_keys::merge_keys_serde_yml;

use crate::engine::DEFAULT_DENSITY;
use crate::render::canvas::Palette;
use crate::render::raster::{MAX_CANVAS_DIMENSION, canvas_extent};

/// Top-level keys with this prefix hold anchors for merge keys and are
/// dropped before decoding.
const TEMPLATE_PREFIX: &str = "x-";

/// Viewer settings, loaded from YAML. Every field is optional.
///
/// ```yaml
/// width: 128
/// height: 64
/// cell_size: 5
/// palette:
///   alive: "#1E1E1E"
/// ```
///
/// Top-level `x-` keys are templates for YAML merge keys:
///
/// ```yaml
/// x-dark: &dark
///   grid: "#333333"
///   dead: "#000000"
/// palette:
///   <<: *dark
///   alive: "#FFFFFF"
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Universe width in cells.
    pub width: u32,
    /// Universe height in cells.
    pub height: u32,
    /// Cell edge in canvas pixels, not counting the grid line.
    pub cell_size: u32,
    /// Emulated display refresh in Hz.
    pub refresh_rate: f32,
    /// Generations advanced per displayed frame.
    pub step_rate: u32,
    pub density: f64,
    pub seed: Option<u64>,
    pub palette: Palette,
    pub images_dir: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 192,
            height: 96,
            cell_size: 4,
            refresh_rate: 60.0,
            step_rate: 1,
            density: DEFAULT_DENSITY,
            seed: None,
            palette: Palette::default(),
            images_dir: PathBuf::from("captures"),
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let source = fs::read_to_string(path).map_err(|err| {
            format!("failed to read config '{}': {}", path.display(), err)
        })?;

        Self::from_yaml(&source).map_err(|err| {
            format!("invalid config '{}': {}", path.display(), err)
        })
    }

    pub fn from_yaml(source: &str) -> Result<Self, String> {
        let raw: Value = serde_yml::from_str(source)
            .map_err(|err| format!("failed to parse YAML: {}", err))?;

        // An empty document is a config with every default.
        if raw.is_null() {
            return Ok(Self::default());
        }

        let mut merged = merge_keys_serde_yml(raw).map_err(|err| {
            format!("failed to process YAML merge keys: {}", err)
        })?;
        strip_templates(&mut merged);

        let config: Self = serde_yml::from_value(merged)
            .map_err(|err| format!("failed to decode config: {}", err))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "universe must be at least 1x1, got {}x{}",
                self.width, self.height
            ));
        }

        if self.cell_size == 0 {
            return Err("cell_size must be at least 1".to_string());
        }

        let [canvas_w, canvas_h] = self.canvas_size().ok_or_else(|| {
            format!(
                "{}x{} grid with cell_size {} overflows the canvas",
                self.width, self.height, self.cell_size
            )
        })?;
        if canvas_w > MAX_CANVAS_DIMENSION || canvas_h > MAX_CANVAS_DIMENSION {
            return Err(format!(
                "canvas {}x{} exceeds {} pixels; shrink the grid or cell_size",
                canvas_w, canvas_h, MAX_CANVAS_DIMENSION
            ));
        }

        if !(0.0..=1.0).contains(&self.density) {
            return Err(format!(
                "density must be within [0, 1], got {}",
                self.density
            ));
        }

        if !self.refresh_rate.is_finite() || self.refresh_rate <= 0.0 {
            return Err(format!(
                "refresh_rate must be positive, got {}",
                self.refresh_rate
            ));
        }

        Ok(())
    }

    /// Canvas pixels including grid lines, `None` on overflow.
    pub fn canvas_size(&self) -> Option<[u32; 2]> {
        Some([
            canvas_extent(self.cell_size, self.width)?,
            canvas_extent(self.cell_size, self.height)?,
        ])
    }

    /// Settings that can change on a running viewer and differ between
    /// `self` and `next`.
    pub fn live_update(&self, next: &Self) -> LiveUpdate {
        LiveUpdate {
            palette: (next.palette != self.palette).then_some(next.palette),
            step_rate: (next.step_rate != self.step_rate)
                .then_some(next.step_rate),
            refresh_rate: (next.refresh_rate != self.refresh_rate)
                .then_some(next.refresh_rate),
            density: (next.density != self.density).then_some(next.density),
        }
    }

    /// Whether moving from `self` to `next` needs a new universe and window.
    pub fn requires_restart(&self, next: &Self) -> bool {
        self.width != next.width
            || self.height != next.height
            || self.cell_size != next.cell_size
    }
}

/// Live settings edited in a reloaded config file.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LiveUpdate {
    pub palette: Option<Palette>,
    pub step_rate: Option<u32>,
    pub refresh_rate: Option<f32>,
    pub density: Option<f64>,
}

/// Flags changes to the config file for the runtime to pick up on its next
/// pass through the event loop.
pub struct ConfigWatcher {
    path: PathBuf,
    changed: Arc<AtomicBool>,
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    pub fn start(path: PathBuf) -> Result<Self, notify::Error> {
        let changed = Arc::new(AtomicBool::new(false));
        let changed_flag = changed.clone();
        let watched_path = path.clone();

        let mut watcher = notify::recommended_watcher(move |result| {
            let Ok(event) = result else {
                return;
            };

            if config_changed(&event, &watched_path) {
                changed_flag.store(true, Ordering::SeqCst);
            }
        })?;

        // Watch the parent so editors that save via rename are still seen.
        let target = path.parent().filter(|p| !p.as_os_str().is_empty());
        match target {
            Some(parent) => {
                watcher.watch(parent, RecursiveMode::NonRecursive)?
            }
            None => watcher.watch(&path, RecursiveMode::NonRecursive)?,
        }

        Ok(Self {
            path,
            changed,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::SeqCst)
    }
}

pub fn resolve_config_path(
    path: impl Into<PathBuf>,
) -> Result<PathBuf, String> {
    let path = path.into();

    if path.is_absolute() {
        return Ok(path);
    }

    let cwd = std::env::current_dir()
        .map_err(|err| format!("failed to get current directory: {}", err))?;

    Ok(cwd.join(path))
}

fn strip_templates(value: &mut Value) {
    let Some(mapping) = value.as_mapping_mut() else {
        return;
    };

    let templates: Vec<String> = mapping
        .iter()
        .filter_map(|(key, _)| key.as_str())
        .filter(|key| key.starts_with(TEMPLATE_PREFIX))
        .map(str::to_owned)
        .collect();

    for key in templates {
        mapping.remove(key.as_str());
    }
}

fn config_changed(event: &Event, watched_path: &Path) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }

    if event.paths.is_empty() {
        return true;
    }

    event
        .paths
        .iter()
        .any(|path| path_matches_target(path, watched_path))
}

fn path_matches_target(path: &Path, target: &Path) -> bool {
    if path == target || path.file_name() == target.file_name() {
        return true;
    }

    match (path.canonicalize(), target.canonicalize()) {
        (Ok(path_canon), Ok(target_canon)) => path_canon == target_canon,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    use super::*;
    use crate::render::canvas::Color;

    #[test]
    fn empty_document_is_all_defaults() {
        assert_eq!(
            ViewerConfig::from_yaml("").unwrap(),
            ViewerConfig::default()
        );
        assert_eq!(
            ViewerConfig::from_yaml("{}").unwrap(),
            ViewerConfig::default()
        );
    }

    #[test]
    fn partial_documents_keep_other_defaults() {
        let config = ViewerConfig::from_yaml(
            "width: 64\nstep_rate: 3\nseed: 42\n\
             palette:\n  alive: \"#102030\"\n",
        )
        .unwrap();

        assert_eq!(config.width, 64);
        assert_eq!(config.height, 96);
        assert_eq!(config.step_rate, 3);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.palette.alive, Color::rgb(0x10, 0x20, 0x30));
        assert_eq!(config.palette.dead, Palette::default().dead);
    }

    #[test]
    fn merge_keys_resolve_from_templates() {
        let yaml = "\
x-dark: &dark
  grid: \"#000000\"
  dead: \"#111111\"
  alive: \"#222222\"
palette:
  <<: *dark
  alive: \"#FFFFFF\"
";
        let config = ViewerConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.palette.grid, Color::rgb(0, 0, 0));
        assert_eq!(config.palette.dead, Color::rgb(0x11, 0x11, 0x11));
        assert_eq!(config.palette.alive, Color::rgb(0xff, 0xff, 0xff));
        assert_eq!(config.width, ViewerConfig::default().width);
    }

    #[test]
    fn only_prefixed_keys_are_templates() {
        let yaml = "dark: &dark\n  grid: \"#000000\"\npalette:\n  <<: *dark\n";
        assert!(ViewerConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn rejects_invalid_values() {
        for yaml in [
            "width: 0",
            "height: 0",
            "cell_size: 0",
            "density: 1.5",
            "density: -0.1",
            "refresh_rate: 0",
            "palette:\n  alive: \"#12\"",
            "colour: red",
            // (4 + 1) * 900000000 + 1 overflows u32.
            "width: 900000000\nheight: 1",
            "cell_size: 4294967295",
            // 10001 pixels wide, over the texture limit.
            "width: 2000",
            "height: 1639",
        ] {
            assert!(ViewerConfig::from_yaml(yaml).is_err(), "{}", yaml);
        }
    }

    #[test]
    fn largest_canvas_within_the_texture_limit_is_accepted() {
        // (4 + 1) * 1638 + 1 = 8191.
        let config = ViewerConfig::from_yaml("width: 1638").unwrap();
        assert_eq!(config.canvas_size(), Some([8191, 481]));
    }

    #[test]
    fn live_update_only_carries_edited_values() {
        let config = ViewerConfig::default();

        let mut palette_only = config.clone();
        palette_only.palette.alive = Color::rgb(1, 2, 3);
        let update = config.live_update(&palette_only);
        assert_eq!(update.palette, Some(palette_only.palette));
        assert_eq!(update.step_rate, None);
        assert_eq!(update.refresh_rate, None);
        assert_eq!(update.density, None);

        let mut faster = config.clone();
        faster.step_rate = 5;
        faster.refresh_rate = 30.0;
        let update = config.live_update(&faster);
        assert_eq!(update.step_rate, Some(5));
        assert_eq!(update.refresh_rate, Some(30.0));
        assert_eq!(update.palette, None);

        assert_eq!(config.live_update(&config), LiveUpdate::default());
    }

    #[test]
    fn dimension_changes_require_restart() {
        let config = ViewerConfig::default();
        let mut next = config.clone();
        next.step_rate = 4;
        next.palette.alive = Color::rgb(1, 2, 3);
        assert!(!config.requires_restart(&next));

        next.cell_size = 8;
        assert!(config.requires_restart(&next));
    }

    #[test]
    fn change_detection_filters_event_kinds_and_paths() {
        let target = PathBuf::from("/tmp/lifeview/life.yaml");

        let modify = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(target.clone());
        assert!(config_changed(&modify, &target));

        let create = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/tmp/lifeview/other.yaml"));
        assert!(!config_changed(&create, &target));

        let access = Event::new(EventKind::Access(AccessKind::Any))
            .add_path(target.clone());
        assert!(!config_changed(&access, &target));
    }

    #[test]
    fn relative_paths_resolve_against_cwd() {
        let resolved = resolve_config_path("life.yaml").unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("life.yaml"));
    }
}
