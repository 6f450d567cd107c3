use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

/// Number of most recent samples the statistics cover.
pub const SAMPLE_WINDOW: usize = 100;

/// Frame deltas shorter than this are treated as this long, which caps the
/// instantaneous rate at 1000 fps instead of dividing by zero.
pub const MIN_FRAME_DELTA_MS: f64 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub latest: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl FrameReport {
    /// Single-line form used in the window title.
    pub fn summary(&self) -> String {
        format!(
            "{} fps (avg {}, min {}, max {})",
            self.latest.round(),
            self.mean.round(),
            self.min.round(),
            self.max.round()
        )
    }
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frames per Second:")?;
        writeln!(f, "latest          = {}", self.latest.round())?;
        writeln!(f, "avg of last {} = {}", SAMPLE_WINDOW, self.mean.round())?;
        writeln!(f, "min of last {} = {}", SAMPLE_WINDOW, self.min.round())?;
        write!(f, "max of last {} = {}", SAMPLE_WINDOW, self.max.round())
    }
}

/// Rolling frame-rate statistics, fed once per displayed frame.
#[derive(Debug)]
pub struct FrameTimer {
    last_frame: Instant,
    samples: VecDeque<f64>,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::with_start(Instant::now())
    }

    /// `now` stands in for the previous frame on the first call.
    pub fn with_start(now: Instant) -> Self {
        Self {
            last_frame: now,
            samples: VecDeque::with_capacity(SAMPLE_WINDOW + 1),
        }
    }

    pub fn samples(&self) -> &VecDeque<f64> {
        &self.samples
    }

    pub fn record_frame(&mut self, now: Instant) -> FrameReport {
        let delta = now.saturating_duration_since(self.last_frame);
        let delta_ms = delta.as_secs_f64() * 1000.0;
        self.last_frame = now;

        let latest = 1000.0 / delta_ms.max(MIN_FRAME_DELTA_MS);

        self.samples.push_back(latest);
        if self.samples.len() > SAMPLE_WINDOW {
            self.samples.pop_front();
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &sample in &self.samples {
            sum += sample;
            min = min.min(sample);
            max = max.max(sample);
        }

        FrameReport {
            latest,
            mean: sum / self.samples.len() as f64,
            min,
            max,
        }
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn first_frame_measures_from_construction() {
        let start = Instant::now();
        let mut timer = FrameTimer::with_start(start);

        let report = timer.record_frame(start + Duration::from_millis(20));
        assert!((report.latest - 50.0).abs() < 1e-9);
        assert_eq!(report.mean, report.latest);
        assert_eq!(report.min, report.latest);
        assert_eq!(report.max, report.latest);
    }

    #[test]
    fn zero_delta_is_floored() {
        let start = Instant::now();
        let mut timer = FrameTimer::with_start(start);

        let report = timer.record_frame(start);
        assert!(report.latest.is_finite());
        assert_eq!(report.latest, 1000.0 / MIN_FRAME_DELTA_MS);
    }

    #[test]
    fn window_keeps_the_latest_100_samples() {
        let start = Instant::now();
        let mut timer = FrameTimer::with_start(start);
        let mut now = start;

        // Frame i lasts (i + 1) ms, so sample i is 1000 / (i + 1).
        for i in 0..150u64 {
            now += Duration::from_millis(i + 1);
            timer.record_frame(now);
            assert!(timer.samples().len() <= SAMPLE_WINDOW);
        }

        let samples = timer.samples();
        assert_eq!(samples.len(), SAMPLE_WINDOW);
        assert!((samples[0] - 1000.0 / 51.0).abs() < 1e-9);
        assert!((samples[99] - 1000.0 / 150.0).abs() < 1e-9);
    }

    #[test]
    fn report_covers_min_mean_and_max() {
        let start = Instant::now();
        let mut timer = FrameTimer::with_start(start);

        timer.record_frame(start + Duration::from_millis(10)); // 100 fps
        // 50 fps
        let report = timer.record_frame(start + Duration::from_millis(30));

        assert!((report.latest - 50.0).abs() < 1e-9);
        assert!((report.mean - 75.0).abs() < 1e-9);
        assert!((report.min - 50.0).abs() < 1e-9);
        assert!((report.max - 100.0).abs() < 1e-9);
    }

    #[test]
    fn display_matches_the_readout_layout() {
        let report = FrameReport {
            latest: 59.6,
            mean: 58.2,
            min: 30.4,
            max: 61.0,
        };

        assert_eq!(
            report.to_string(),
            "Frames per Second:\n\
             latest          = 60\n\
             avg of last 100 = 58\n\
             min of last 100 = 30\n\
             max of last 100 = 61"
        );
        assert_eq!(report.summary(), "60 fps (avg 58, min 30, max 61)");
    }
}
