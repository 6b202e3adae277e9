use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for per-frame detection timings and counts.
///
/// Keeps the orchestrator free of any particular output mechanism; the CLI
/// aggregates into a summary, tests and embedders can stay silent.
pub trait PipelineLogger: Send {
    /// Called once after every processed frame.
    fn frame_done(&mut self, frame_index: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a per-frame count or measurement (e.g. hands found).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn frame_done(&mut self, _frame_index: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Aggregates stage timings and metrics and reports them through `log`.
///
/// A progress line is logged every `throttle_frames` frames.
pub struct LogPipelineLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, Vec<f64>>,
    metrics: BTreeMap<String, Vec<f64>>,
    start_time: Instant,
    frames: usize,
}

impl LogPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Detection summary ({} frames, {:.1}s total):",
            self.frames,
            elapsed_ms / 1000.0
        )];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            lines.push(format!(
                "  {stage:12}: avg {:6.1}ms  max {:6.1}ms  total {total_ms:7.0}ms",
                mean(durations),
                durations.iter().copied().fold(0.0, f64::max),
            ));
        }
        for (name, values) in &self.metrics {
            lines.push(format!(
                "  {name}: avg {:.2}  total {:.0}",
                mean(values),
                values.iter().sum::<f64>()
            ));
        }

        if self.frames > 0 && elapsed_ms > 0.0 {
            let fps = self.frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn frame_done(&mut self, frame_index: usize) {
        self.frames += 1;
        if self.frames % self.throttle_frames == 0 {
            log::info!("Processed {} frames (last index {frame_index})", self.frames);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
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
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.frame_done(0);
        logger.timing("hands", 5.0);
        logger.metric("hands", 1.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = LogPipelineLogger::new(10);
        logger.timing("faces", 20.0);
        logger.timing("faces", 30.0);
        logger.timing("hands", 5.0);

        assert_eq!(logger.timings_for("faces").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("hands").unwrap(), &[5.0]);
        assert!(logger.timings_for("humans").is_none());
    }

    #[test]
    fn test_metric_records_values() {
        let mut logger = LogPipelineLogger::new(10);
        logger.metric("hands", 1.0);
        logger.metric("hands", 2.0);
        assert_relative_eq!(mean(logger.metrics_for("hands").unwrap()), 1.5);
    }

    #[test]
    fn test_frame_done_counts_frames() {
        let mut logger = LogPipelineLogger::new(10);
        for i in 0..25 {
            logger.frame_done(i);
        }
        assert_eq!(logger.frames(), 25);
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = LogPipelineLogger::new(10);
        logger.frame_done(0);
        logger.timing("hands", 12.0);
        logger.timing("faces", 3.0);
        logger.metric("humans", 2.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Detection summary (1 frames"));
        assert!(summary.contains("hands"));
        assert!(summary.contains("faces"));
        assert!(summary.contains("humans: avg 2.00"));
        // BTreeMap keeps stage lines sorted.
        assert!(summary.find("faces").unwrap() < summary.find("hands").unwrap());
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(LogPipelineLogger::default().summary_string().is_none());
    }
}
