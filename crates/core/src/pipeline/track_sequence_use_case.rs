use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::blob_detector::BlobDetector;
use crate::detection::domain::detection::Detection;
use crate::overlay::domain::overlay_sink::{OverlayError, OverlaySink};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::sequence_result::{DetectionRecord, SequenceResult};
use crate::preprocessing::domain::background_model::PreprocessError;
use crate::preprocessing::domain::frame_preprocessor::FramePreprocessor;
use crate::shared::constants::DEFAULT_BATCH_SIZE;
use crate::tracking::domain::registry_config::RegistryConfig;
use crate::tracking::domain::track_registry::TrackRegistry;
use crate::tracking::domain::tracked_object::TrackedObject;
use crate::video::domain::frame_source::{FrameDecodeError, FrameSource};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    FrameDecode(#[from] FrameDecodeError),
    #[error("frame {frame}: preprocessing failed")]
    Preprocess {
        frame: usize,
        #[source]
        source: PreprocessError,
    },
    #[error("frame {frame}: overlay rendering failed")]
    Overlay {
        frame: usize,
        #[source]
        source: OverlayError,
    },
    #[error("cancelled at frame {frame}")]
    Cancelled { frame: usize },
    #[error("sequence already executed")]
    AlreadyExecuted,
}

/// Where a run currently stands.
///
/// A failed or cancelled run stays in `Processing` at the frame it stopped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    Init,
    Processing { frame: usize },
    Flush,
    Done,
}

/// Run options of a [`TrackSequenceUseCase`].
pub struct SequenceConfig {
    pub registry: RegistryConfig,
    /// Frames per batch. Batches only scope logging and buffer lifetime.
    pub batch_size: usize,
    pub record_history: bool,
    /// Called after every frame with `(frames_done, total)`; `false` cancels.
    pub on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            record_history: false,
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

struct Stages {
    source: Box<dyn FrameSource>,
    preprocessor: FramePreprocessor,
    detector: Box<dyn BlobDetector>,
    overlay: Option<Box<dyn OverlaySink>>,
}

/// Drives one frame sequence through preprocess, detect, expire and
/// associate, then flushes the surviving tracks.
///
/// Single use: the stages are consumed by `execute`, so a second call
/// fails with [`PipelineError::AlreadyExecuted`].
pub struct TrackSequenceUseCase {
    stages: Option<Stages>,
    logger: Box<dyn PipelineLogger>,
    config: SequenceConfig,
    state: SequenceState,
}

impl TrackSequenceUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        preprocessor: FramePreprocessor,
        detector: Box<dyn BlobDetector>,
        overlay: Option<Box<dyn OverlaySink>>,
        logger: Box<dyn PipelineLogger>,
        config: SequenceConfig,
    ) -> Self {
        Self {
            stages: Some(Stages {
                source,
                preprocessor,
                detector,
                overlay,
            }),
            logger,
            config,
            state: SequenceState::Init,
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn execute(&mut self) -> Result<SequenceResult, PipelineError> {
        let mut stages = self.stages.take().ok_or(PipelineError::AlreadyExecuted)?;
        let metadata = stages.source.metadata();
        let total = metadata.total_frames;
        let frame_height = metadata.height;
        let batch_size = self.config.batch_size.max(1);
        let on_progress = self.config.on_progress.take();

        let mut registry = TrackRegistry::new(self.config.registry, frame_height);
        let mut result = SequenceResult {
            frame_height,
            ..SequenceResult::default()
        };

        self.logger.info(&format!("Tracking {metadata}"));

        for batch_start in (0..total).step_by(batch_size) {
            let batch_end = (batch_start + batch_size).min(total);
            log::debug!(
                "Batch {batch_start}..{batch_end}: {} alive tracks, {} recorded",
                registry.alive_count(),
                result.objects.len()
            );

            for index in batch_start..batch_end {
                self.state = SequenceState::Processing { frame: index };
                if self.config.cancelled.load(Ordering::Relaxed) {
                    return Err(self.cancel(index, &registry));
                }

                self.track_frame(&mut stages, &mut registry, &mut result, index)?;
                result.frames_processed += 1;

                self.logger.progress(index + 1, total);
                if let Some(ref callback) = on_progress {
                    if !callback(index + 1, total) {
                        self.config.cancelled.store(true, Ordering::Relaxed);
                        return Err(self.cancel(index, &registry));
                    }
                }
            }
        }

        self.state = SequenceState::Flush;
        let flushed = registry.flush();
        log::debug!("Flushed {} tracks at end of sequence", flushed.len());
        result.objects.extend(flushed);

        self.state = SequenceState::Done;
        self.logger.summary();
        Ok(result)
    }

    fn track_frame(
        &mut self,
        stages: &mut Stages,
        registry: &mut TrackRegistry,
        result: &mut SequenceResult,
        index: usize,
    ) -> Result<(), PipelineError> {
        let t0 = Instant::now();
        let frame = stages.source.frame(index)?;
        let mut preprocessed = stages
            .preprocessor
            .process(&frame)
            .map_err(|source| PipelineError::Preprocess {
                frame: index,
                source,
            })?;
        // The sequence position is the frame index everything downstream sees.
        preprocessed.index = index;
        drop(frame);
        self.logger.timing("preprocess", elapsed_ms(t0));

        let t1 = Instant::now();
        let blobs = stages.detector.detect(&preprocessed);
        let detections: Vec<Detection> = blobs.iter().map(|b| b.detection).collect();
        self.logger.timing("detect", elapsed_ms(t1));

        let t2 = Instant::now();
        let update = registry.process_frame(index, &detections);
        result.objects.extend(update.expired.recorded);
        if self.config.record_history {
            result.history.extend(detections.iter().zip(&update.assigned_ids).map(
                |(detection, &object_id)| DetectionRecord {
                    frame: index,
                    object_id,
                    bbox: detection.bbox,
                },
            ));
        }
        self.logger.timing("track", elapsed_ms(t2));

        if let Some(overlay) = stages.overlay.as_mut() {
            let t3 = Instant::now();
            let alive: Vec<&TrackedObject> = registry.alive().collect();
            overlay
                .render(&preprocessed, &blobs, &alive)
                .map_err(|source| PipelineError::Overlay {
                    frame: index,
                    source,
                })?;
            self.logger.timing("overlay", elapsed_ms(t3));
        }

        self.logger.metric("detections", detections.len() as f64);
        self.logger
            .metric("alive_tracks", registry.alive_count() as f64);
        Ok(())
    }

    fn cancel(&mut self, frame: usize, registry: &TrackRegistry) -> PipelineError {
        self.logger.info(&format!(
            "Cancelled at frame {frame}, discarding {} alive tracks",
            registry.alive_count()
        ));
        PipelineError::Cancelled { frame }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
