/// Game loop
///
/// One iteration per frame: capture, locate the ball in each half, tick the
/// scorekeeper, publish events, refresh the display. The loop runs on the
/// calling thread and stops when the frame source is exhausted, the frame
/// limit is reached, or the stop flag is raised.
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::capture::FrameSource;
use crate::clock::{Clock, ManualClock};
use crate::config::Config;
use crate::detection::{split_frame, ObjectLocator};
use crate::display::{StatusDisplay, StatusPresenter};
use crate::game::{MatchStatus, Observations, Scorekeeper, Side, SideMap};
use crate::messaging::{EventBus, GameEvent};
use crate::overlay;
use crate::trace::{TraceRecord, TraceWriter};
use crate::utils::{micros_since, IterationTiming, LatencyStats};

/// Capture failures in a row before the loop gives up on the source
pub const MAX_CONSECUTIVE_CAPTURE_FAILURES: u32 = 30;

/// Optional behavior of a live run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after this many capture attempts, failed ones included
    pub max_frames: Option<u64>,

    /// Write annotated frames here
    pub annotate_dir: Option<PathBuf>,

    /// Record per-tick detections to this trace file
    pub record_trace: Option<PathBuf>,

    /// Skip frame pacing and process frames as fast as they arrive
    pub unpaced: bool,
}

/// Outcome of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub points: u64,
    pub matches_won: u64,
    pub scores: (u32, u32),
    pub status: MatchStatus,
}

/// Scorekeeping core shared by live runs and trace replay
pub struct Referee<D: StatusDisplay> {
    keeper: Scorekeeper,
    presenter: StatusPresenter<D>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    points: u64,
    matches_won: u64,
}

impl<D: StatusDisplay> Referee<D> {
    pub fn new(config: &Config, display: D, bus: EventBus, clock: Arc<dyn Clock>) -> Self {
        Self {
            keeper: Scorekeeper::new(config.rules.clone(), config.tracking.min_area),
            presenter: StatusPresenter::new(
                display,
                config.display.width,
                config.display.update_interval_ms,
            ),
            bus,
            clock,
            points: 0,
            matches_won: 0,
        }
    }

    pub fn keeper(&self) -> &Scorekeeper {
        &self.keeper
    }

    pub fn presenter(&self) -> &StatusPresenter<D> {
        &self.presenter
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Score one tick of observations and push the result out
    pub fn step(&mut self, observations: &Observations) -> Vec<GameEvent> {
        let now = self.clock.now();
        let events = self.keeper.tick(now, observations);

        for event in &events {
            match event {
                GameEvent::PointScored { .. } => self.points += 1,
                GameEvent::MatchWon { .. } => self.matches_won += 1,
                _ => {}
            }
            if event.is_transition() {
                tracing::debug!("Event: {}", event.description());
            }
        }

        self.bus.publish_all(events.iter().cloned());
        self.presenter.render(self.keeper.state(), now);

        events
    }

    /// Publish shutdown and show the final score
    pub fn finish(&mut self, hold: Duration) {
        self.bus.publish(GameEvent::Shutdown);
        self.presenter.farewell(self.keeper.state(), hold);
    }

    pub fn summary(&self, frames: u64) -> RunSummary {
        let state = self.keeper.state();
        RunSummary {
            frames,
            points: self.points,
            matches_won: self.matches_won,
            scores: state.scores(),
            status: state.status(),
        }
    }
}

/// Locate the ball in both halves of `frame`, halves in parallel
pub fn locate_both(locator: &dyn ObjectLocator, frame: &RgbaImage) -> Observations {
    let halves = split_frame(frame);
    let (left, right) = rayon::join(
        || locator.locate(&halves[Side::Left]),
        || locator.locate(&halves[Side::Right]),
    );
    SideMap::new(left, right)
}

/// Live game over a frame source
pub struct GameLoop<D: StatusDisplay> {
    referee: Referee<D>,
    source: Box<dyn FrameSource>,
    locator: Box<dyn ObjectLocator>,
    stop: Arc<AtomicBool>,
    frame_time: Duration,
    stats_interval: u64,
    farewell_hold: Duration,
}

impl<D: StatusDisplay> GameLoop<D> {
    pub fn new(
        config: &Config,
        source: Box<dyn FrameSource>,
        locator: Box<dyn ObjectLocator>,
        display: D,
        bus: EventBus,
        clock: Arc<dyn Clock>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            referee: Referee::new(config, display, bus, clock),
            source,
            locator,
            stop,
            frame_time: Duration::from_secs_f64(1.0 / config.capture.fps.max(1) as f64),
            stats_interval: config.stats_interval_frames.max(1),
            farewell_hold: Duration::from_millis(config.display.farewell_hold_ms),
        }
    }

    pub fn referee(&self) -> &Referee<D> {
        &self.referee
    }

    /// Run until the source runs dry, the frame limit is hit, or stop is raised
    pub fn run(&mut self, options: &RunOptions) -> RunSummary {
        tracing::info!(
            "Game loop started: source={}, locator={}",
            self.source.name(),
            self.locator.name()
        );

        let mut recorder =
            options.record_trace.as_ref().and_then(|path| match TraceWriter::create(path) {
                Ok(writer) => Some(writer),
                Err(e) => {
                    tracing::warn!(
                        "Trace recording disabled, cannot create {}: {}",
                        path.display(),
                        e
                    );
                    None
                }
            });

        let started = self.referee.now();
        let mut stats = LatencyStats::with_capacity(1024);
        let mut frame_count = 0u64;
        let mut failed_captures = 0u64;
        let mut consecutive_failures = 0u32;

        while !self.stop.load(Ordering::SeqCst) {
            if options.max_frames.is_some_and(|max| frame_count + failed_captures >= max) {
                tracing::info!("Frame limit reached");
                break;
            }

            let loop_start = Instant::now();
            let mut timing = IterationTiming::new();

            let capture_start = Instant::now();
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("Frame source exhausted");
                    break;
                }
                Err(e) => {
                    failed_captures += 1;
                    consecutive_failures += 1;
                    if consecutive_failures == 1 {
                        tracing::warn!("Capture failed, skipping tick: {}", e);
                    } else {
                        tracing::debug!(
                            "Capture failed again ({} in a row): {}",
                            consecutive_failures,
                            e
                        );
                    }

                    if consecutive_failures >= MAX_CONSECUTIVE_CAPTURE_FAILURES {
                        tracing::error!(
                            "Giving up on {} after {} consecutive capture failures",
                            self.source.name(),
                            consecutive_failures
                        );
                        break;
                    }

                    self.pace(loop_start, options);
                    continue;
                }
            };
            timing.capture_us = micros_since(capture_start);
            frame_count += 1;
            consecutive_failures = 0;

            let locate_start = Instant::now();
            let observations = locate_both(self.locator.as_ref(), &frame);
            timing.locate_us = micros_since(locate_start);

            let score_start = Instant::now();
            self.referee.step(&observations);
            timing.score_us = micros_since(score_start);

            let render_start = Instant::now();
            if let Some(dir) = &options.annotate_dir {
                self.write_annotated(&frame, &observations, dir, frame_count);
            }
            timing.render_us = micros_since(render_start);

            if let Some(writer) = recorder.as_mut() {
                let record = TraceRecord {
                    t_ms: self.referee.now().saturating_duration_since(started).as_millis() as u64,
                    left: observations[Side::Left],
                    right: observations[Side::Right],
                };
                if let Err(e) = writer.write(&record) {
                    tracing::warn!("Trace write failed, recording stopped: {}", e);
                    recorder = None;
                }
            }

            timing.total_us = micros_since(loop_start);
            stats.add(timing);

            if frame_count % self.stats_interval == 0 {
                let (left, right) = self.referee.keeper().state().scores();
                tracing::info!(
                    "Frame {}: {:.1}ms total | Capture: {:.1}ms | Locate: {:.1}ms | Score: {}-{}",
                    frame_count,
                    timing.total_ms(),
                    timing.capture_us / 1000.0,
                    timing.locate_us / 1000.0,
                    left,
                    right
                );
            }

            self.pace(loop_start, options);
        }

        if let Some(writer) = recorder.as_mut() {
            if let Err(e) = writer.flush() {
                tracing::warn!("Failed to flush trace: {}", e);
            }
        }

        stats.report();
        self.referee.finish(self.farewell_hold);

        let summary = self.referee.summary(frame_count);
        tracing::info!(
            "Game loop stopped after {} frames ({} failed captures), {} points, {} matches won",
            summary.frames,
            failed_captures,
            summary.points,
            summary.matches_won
        );
        summary
    }

    /// Sleep out the rest of the frame time that began at `loop_start`
    fn pace(&self, loop_start: Instant, options: &RunOptions) {
        let elapsed = loop_start.elapsed();
        if !options.unpaced && elapsed < self.frame_time {
            thread::sleep(self.frame_time - elapsed);
        }
    }

    fn write_annotated(
        &self,
        frame: &RgbaImage,
        observations: &Observations,
        dir: &Path,
        index: u64,
    ) {
        let annotated =
            overlay::annotate(frame, self.referee.keeper(), observations, self.referee.now());
        if let Err(e) = overlay::save_frame(&annotated, dir, index) {
            tracing::warn!("Failed to save annotated frame {}: {}", index, e);
        }
    }
}

/// Replay a recorded detection trace on a manual clock.
///
/// Each record's `t_ms` is applied as the clock position before its tick,
/// so the outcome is independent of wall time.
pub fn replay<D: StatusDisplay>(
    records: &[TraceRecord],
    config: &Config,
    display: D,
    bus: EventBus,
) -> RunSummary {
    let clock = Arc::new(ManualClock::new());
    let mut referee = Referee::new(config, display, bus, clock.clone());

    for record in records {
        clock.set_elapsed(record.offset());
        referee.step(&record.observations());
    }

    referee.finish(Duration::ZERO);
    referee.summary(records.len() as u64)
}

/// Replay a trace file with the log-backed display
pub fn replay_file(
    path: &Path,
    config: &Config,
    bus: EventBus,
) -> Result<RunSummary, crate::error::TraceError> {
    let records = crate::trace::read_trace(path)?;
    Ok(replay(&records, config, crate::display::ConsoleDisplay::new(), bus))
}

/// Stop flag shared with a signal handler
pub fn stop_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}
