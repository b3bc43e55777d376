use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for sequence-level events of a tracking run.
///
/// The driver reports progress, per-stage timings (`preprocess`, `detect`,
/// `track`, `overlay`) and per-frame metrics (`detections`, `alive_tracks`)
/// without knowing where they end up.
pub trait PipelineLogger: Send {
    fn progress(&mut self, current: usize, total: usize);

    /// Milliseconds one stage spent on one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Per-frame sample of a named quantity.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-run report. Default: no-op.
    fn summary(&self) {}
}

/// Discards every event.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running aggregate of one timing stage or metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStat {
    pub count: usize,
    pub total: f64,
    pub max: f64,
}

impl RunningStat {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.max = if self.count == 1 { value } else { self.max.max(value) };
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Logs progress through `log::info!` every `throttle_frames` frames and
/// aggregates timings and metrics into an end-of-run summary.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    log_progress: bool,
    timings: BTreeMap<String, RunningStat>,
    metrics: BTreeMap<String, RunningStat>,
    start_time: Instant,
    total_frames: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            log_progress: true,
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            total_frames: 0,
            messages: Vec::new(),
        }
    }

    /// Leaves progress reporting to the caller; totals are still recorded.
    pub fn without_progress(mut self) -> Self {
        self.log_progress = false;
        self
    }

    /// `None` until at least one timing or metric was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let frames = self.total_frames;
        let mut lines = vec![format!(
            "Tracking summary ({frames} frames, {elapsed_s:.1}s):"
        )];

        for (stage, stat) in &self.timings {
            lines.push(format!(
                "  {stage:10}: avg {:6.2}ms  max {:7.2}ms  total {:8.0}ms",
                stat.mean(),
                stat.max,
                stat.total
            ));
        }
        for (name, stat) in &self.metrics {
            lines.push(format!("  {name}: avg {:.1}, max {:.0}", stat.mean(), stat.max));
        }

        if frames > 0 && elapsed_s > 0.0 {
            lines.push(format!("  Throughput: {:.1} fps", frames as f64 / elapsed_s));
        }

        Some(lines.join("\n"))
    }

    pub fn timing_stat(&self, stage: &str) -> Option<&RunningStat> {
        self.timings.get(stage)
    }

    pub fn metric_stat(&self, name: &str) -> Option<&RunningStat> {
        self.metrics.get(name)
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_frames = total;
        if self.log_progress
            && total > 0
            && (current % self.throttle_frames == 0 || current == total)
        {
            log::info!("Tracked {current}/{total} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings.entry(stage.to_string()).or_default().push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
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
        logger.metric("detections", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timings_aggregate_per_stage() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("track", 5.0);

        let detect = logger.timing_stat("detect").unwrap();
        assert_eq!(detect.count, 2);
        assert_relative_eq!(detect.mean(), 25.0);
        assert_relative_eq!(detect.max, 30.0);
        assert_eq!(logger.timing_stat("track").unwrap().count, 1);
        assert!(logger.timing_stat("overlay").is_none());
    }

    #[test]
    fn test_max_tracks_negative_samples() {
        let mut stat = RunningStat::default();
        stat.push(-3.0);
        stat.push(-1.0);
        assert_relative_eq!(stat.max, -1.0);
    }

    #[test]
    fn test_metrics_aggregate() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.metric("alive_tracks", 3.0);
        logger.metric("alive_tracks", 4.0);
        let stat = logger.metric_stat("alive_tracks").unwrap();
        assert_relative_eq!(stat.mean(), 3.5);
        assert_relative_eq!(stat.max, 4.0);
    }

    #[test]
    fn test_summary_lists_stages_metrics_and_fps() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.total_frames = 100;
        logger.timing("preprocess", 2.0);
        logger.timing("detect", 10.0);
        logger.metric("detections", 3.0);
        logger.metric("detections", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.starts_with("Tracking summary (100 frames"));
        assert!(summary.contains("preprocess"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("detections: avg 3.5, max 4"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_progress_records_total() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=20 {
            logger.progress(i, 20);
        }
        assert_eq!(logger.total_frames, 20);
    }

    #[test]
    fn test_progress_can_be_left_to_caller() {
        let mut logger = StdoutPipelineLogger::new(1).without_progress();
        assert!(!logger.log_progress);
        logger.progress(5, 5);
        assert_eq!(logger.total_frames, 5);
        assert!(StdoutPipelineLogger::default().log_progress);
    }

    #[test]
    fn test_info_keeps_messages() {
        let mut logger = StdoutPipelineLogger::default();
        logger.info("3 objects counted");
        assert_eq!(logger.messages(), ["3 objects counted".to_string()]);
        assert_eq!(logger.throttle_frames, 100);
    }
}
