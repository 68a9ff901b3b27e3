use std::collections::BTreeMap;
use std::time::Instant;

/// Milliseconds since `start`, as reported to [`PipelineLogger::timing`].
pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Observer for pipeline events.
///
/// Use cases report progress, per-stage timings and metrics here instead of
/// printing, so the CLI, tests and any other caller choose where the
/// output goes.
pub trait PipelineLogger: Send {
    /// Report frame-level progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. faces per frame).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-pipeline summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Debug, Default)]
struct Series {
    values: Vec<f64>,
}

impl Series {
    fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    fn mean(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.total() / self.values.len() as f64
        }
    }
}

/// Collects timings and metrics, logs throttled progress through `log`,
/// and prints a summary table at the end of a run.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, Series>,
    metrics: BTreeMap<String, Series>,
    start_time: Instant,
    total_frames: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            total_frames: 0,
            messages: Vec::new(),
        }
    }

    /// The summary text, or `None` when nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.total_frames;
        let mut lines = vec![format!(
            "Pipeline summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        for (stage, series) in &self.timings {
            let total_ms = series.total();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)",
                series.mean()
            ));
        }

        for (name, series) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}", series.mean()));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|s| s.values.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|s| s.values.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_frames = total;
        if total > 0 && (current % self.throttle_frames == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Rendering: {current}/{total} frames ({pct:.1}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .values
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .values
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("detect", 5.0);
        logger.metric("faces", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values_per_stage() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("render", 5.0);

        assert_eq!(logger.timings_for("detect").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("render").unwrap(), &[5.0]);
        assert!(logger.timings_for("write").is_none());
    }

    #[test]
    fn test_series_mean() {
        let series = Series {
            values: vec![10.0, 20.0, 30.0],
        };
        assert_relative_eq!(series.mean(), 20.0);
        assert_relative_eq!(Series::default().mean(), 0.0);
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.total_frames = 10;
        logger.timing("detect", 20.0);
        logger.timing("render", 5.0);
        logger.metric("faces", 3.0);
        logger.metric("faces", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Pipeline summary"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("render"));
        assert!(summary.contains("faces: avg 3.5"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_summary_stages_sorted() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("write", 1.0);
        logger.timing("detect", 1.0);
        let summary = logger.summary_string().unwrap();
        assert!(summary.find("detect").unwrap() < summary.find("write").unwrap());
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_total() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=20 {
            logger.progress(i, 20);
        }
        assert_eq!(logger.total_frames, 20);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.info("hello world");
        assert_eq!(logger.messages, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_throttle_at_least_one() {
        assert_eq!(StdoutPipelineLogger::new(0).throttle_frames, 1);
        assert_eq!(StdoutPipelineLogger::default().throttle_frames, 10);
    }
}
