//! # Monitor orchestrator
//!
//! One dedicated worker thread owns every piece of pipeline state and runs
//! the capture-and-detect-and-alert loop. Collaborators drive it through an
//! enqueued command channel (applied at the top of the next cycle, never
//! mid-cycle) and consume an event channel plus a latest-frame display slot.
//!
//! Spawned burst tasks are the only concurrent readers of the frame source;
//! they never touch pipeline state and report back through the event channel.

use crate::burst;
use crate::config::MonitorConfig;
use crate::debounce::Debouncer;
use crate::detector::MotionDetector;
use crate::events::{AlertEvent, MonitorEvent, StatsSnapshot};
use crate::frame::Frame;
use crate::gate::AlertGate;
use crate::region::{self, Rect};
use crate::source::{open_source, FrameSource, SharedSource, SourceError};
use crate::storage::{ScreenshotStore, SnapshotKind};
use anyhow::{anyhow, Result};
use chrono::Local;
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Reopen attempts after the failure threshold is crossed.
pub const RECONNECT_ATTEMPTS: u32 = 3;
const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);
const READ_RETRY_PAUSE: Duration = Duration::from_millis(100);
const STATS_PERIOD: Duration = Duration::from_secs(1);

/// Lifecycle of the pipeline worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
    /// Frames keep being read to keep the pipe warm, but detection,
    /// debouncing and alerting are skipped.
    Paused,
}

/// Factory turning a source specification into a live source.
///
/// The default is [`open_source`]; embedders with hardware backends can
/// inject their own.
pub type SourceOpener = Box<dyn Fn(&str) -> Result<Box<dyn FrameSource>, SourceError> + Send>;

enum Command {
    Start,
    Stop,
    Pause,
    Resume,
    SetRegion(Option<Rect>),
    SetParam(String, f64),
    UpdateConfig(MonitorConfig),
    ManualCapture,
    Cleanup(Duration),
    Shutdown,
}

/// Handle to the pipeline worker.
///
/// Dropping the monitor cancels any in-flight burst, shuts the worker down
/// and joins it.
pub struct Monitor {
    commands: Sender<Command>,
    shared_state: Arc<RwLock<MonitorState>>,
    display: Arc<RwLock<Option<Frame>>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Spawn the worker with the default source opener.
    pub fn spawn(config: MonitorConfig) -> Result<(Self, Receiver<MonitorEvent>)> {
        Self::spawn_with_opener(config, Box::new(|spec| open_source(spec)))
    }

    /// Spawn the worker with a custom source opener.
    pub fn spawn_with_opener(
        config: MonitorConfig,
        opener: SourceOpener,
    ) -> Result<(Self, Receiver<MonitorEvent>)> {
        let store = Arc::new(ScreenshotStore::new(&config.screenshot_dir)?);
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let shared_state = Arc::new(RwLock::new(MonitorState::Stopped));
        let display = Arc::new(RwLock::new(None));
        let running = Arc::new(AtomicBool::new(true));

        let worker = Worker::new(
            config,
            store,
            opener,
            event_tx,
            shared_state.clone(),
            display.clone(),
            running.clone(),
        );
        let handle = std::thread::spawn(move || worker.run(command_rx));

        Ok((
            Self {
                commands: command_tx,
                shared_state,
                display,
                running,
                handle: Some(handle),
            },
            event_rx,
        ))
    }

    pub fn state(&self) -> MonitorState {
        self.shared_state
            .read()
            .map(|s| *s)
            .unwrap_or(MonitorState::Stopped)
    }

    /// Most recent frame, for display. Overwritten every cycle, so a slow
    /// consumer only ever sees the latest one.
    pub fn latest_frame(&self) -> Option<Frame> {
        self.display.read().ok().and_then(|slot| slot.clone())
    }

    pub fn start(&self) -> Result<()> {
        self.send(Command::Start)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(Command::Resume)
    }

    /// Replace the detection region; the detector baseline and debounce
    /// count reset on the next cycle.
    pub fn set_region(&self, region: Option<Rect>) -> Result<()> {
        self.send(Command::SetRegion(region))
    }

    /// Update a single tunable. Validation happens here, at the command
    /// boundary; an out-of-range value never reaches the worker.
    pub fn set_param(&self, key: &str, value: f64) -> Result<()> {
        crate::config::validate_param(key, value)?;
        self.send(Command::SetParam(key.to_string(), value))
    }

    /// Swap in a full configuration snapshot, applied atomically at the top
    /// of the next cycle.
    pub fn update_config(&self, config: MonitorConfig) -> Result<()> {
        config.validate()?;
        self.send(Command::UpdateConfig(config))
    }

    /// Capture one frame immediately, bypassing the alert pipeline.
    pub fn manual_capture(&self) -> Result<()> {
        self.send(Command::ManualCapture)
    }

    /// Delete screenshots older than the given age.
    pub fn cleanup_screenshots(&self, older_than: Duration) -> Result<()> {
        self.send(Command::Cleanup(older_than))
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.commands
            .send(cmd)
            .map_err(|_| anyhow!("monitor worker is gone"))
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct Worker {
    config: MonitorConfig,
    store: Arc<ScreenshotStore>,
    opener: SourceOpener,
    source: Option<SharedSource>,
    state: MonitorState,
    shared_state: Arc<RwLock<MonitorState>>,
    display: Arc<RwLock<Option<Frame>>>,
    events: Sender<MonitorEvent>,
    running: Arc<AtomicBool>,

    detector: MotionDetector,
    debounce: Debouncer,
    gate: AlertGate,
    last_region: Option<Rect>,
    consecutive_failures: u32,
    alerts: u32,
    frames_total: u64,
    fps: f32,
    fps_frames: u32,
    fps_since: Instant,
    stats_since: Instant,
    backoff: Duration,
    retry_pause: Duration,
}

impl Worker {
    fn new(
        config: MonitorConfig,
        store: Arc<ScreenshotStore>,
        opener: SourceOpener,
        events: Sender<MonitorEvent>,
        shared_state: Arc<RwLock<MonitorState>>,
        display: Arc<RwLock<Option<Frame>>>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            store,
            opener,
            source: None,
            state: MonitorState::Stopped,
            shared_state,
            display,
            events,
            running,
            detector: MotionDetector::new(),
            debounce: Debouncer::new(),
            gate: AlertGate::new(),
            last_region: None,
            consecutive_failures: 0,
            alerts: 0,
            frames_total: 0,
            fps: 0.0,
            fps_frames: 0,
            fps_since: Instant::now(),
            stats_since: Instant::now(),
            backoff: RECONNECT_BACKOFF,
            retry_pause: READ_RETRY_PAUSE,
        }
    }

    fn run(mut self, commands: Receiver<Command>) {
        loop {
            if !self.running.load(Ordering::Relaxed) {
                break;
            }

            if self.state == MonitorState::Stopped {
                // Nothing to do until someone tells us otherwise.
                match commands.recv() {
                    Ok(cmd) => {
                        if self.handle_command(cmd) {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            } else {
                let mut shutdown = false;
                loop {
                    match commands.try_recv() {
                        Ok(cmd) => {
                            if self.handle_command(cmd) {
                                shutdown = true;
                                break;
                            }
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            shutdown = true;
                            break;
                        }
                    }
                }
                if shutdown {
                    break;
                }
                if self.state != MonitorState::Stopped {
                    self.cycle();
                }
            }
        }

        self.source = None;
        self.set_state(MonitorState::Stopped);
    }

    /// Apply one command; returns true on shutdown.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Start => self.start(),
            Command::Stop => {
                self.source = None;
                self.set_state(MonitorState::Stopped);
                info!("monitoring stopped");
            }
            Command::Pause => {
                if self.state == MonitorState::Running {
                    self.set_state(MonitorState::Paused);
                    info!("monitoring paused");
                }
            }
            Command::Resume => {
                if self.state == MonitorState::Paused {
                    // Stale partial counts must not survive a pause.
                    self.debounce.reset();
                    self.set_state(MonitorState::Running);
                    info!("monitoring resumed");
                }
            }
            Command::SetRegion(region) => {
                self.config.region = region;
                // Next cycle reseeds the baseline and debounce.
                self.last_region = None;
            }
            Command::SetParam(key, value) => {
                if let Err(e) = self.config.set_param(&key, value) {
                    warn!("parameter update rejected: {e}");
                }
            }
            Command::UpdateConfig(config) => match config.validate() {
                Ok(()) => {
                    if config.screenshot_dir != self.config.screenshot_dir {
                        // In-flight bursts keep writing through their old
                        // store handle; new captures use the new directory.
                        match ScreenshotStore::new(&config.screenshot_dir) {
                            Ok(store) => self.store = Arc::new(store),
                            Err(e) => {
                                warn!("configuration update rejected: {e}");
                                return false;
                            }
                        }
                    }
                    self.config = config;
                }
                Err(e) => warn!("configuration update rejected: {e}"),
            },
            Command::ManualCapture => self.manual_capture(),
            Command::Cleanup(older_than) => {
                // The store logs its own summary.
                if let Err(e) = self.store.cleanup_older_than(older_than) {
                    warn!("screenshot cleanup failed: {e}");
                }
            }
            Command::Shutdown => return true,
        }
        false
    }

    fn start(&mut self) {
        if self.state != MonitorState::Stopped {
            return;
        }
        match (self.opener)(&self.config.camera_id) {
            Ok(source) => {
                self.source = Some(Arc::new(Mutex::new(source)));
                self.detector.reset();
                self.debounce.reset();
                self.last_region = None;
                self.consecutive_failures = 0;
                self.set_state(MonitorState::Running);
                info!("monitoring started on {}", self.config.camera_id);
            }
            Err(e) => error!("cannot open {}: {e}", self.config.camera_id),
        }
    }

    /// One pipeline cycle: read, resolve region, detect, debounce, gate,
    /// then pace to the configured cycle delay.
    fn cycle(&mut self) {
        let started = Instant::now();
        let cfg = self.config.clone();
        let Some(source) = self.source.clone() else {
            self.set_state(MonitorState::Stopped);
            return;
        };

        let read = match source.lock() {
            Ok(mut src) => src.read(),
            Err(_) => Err(SourceError::ReadFailed),
        };
        let frame = match read {
            Ok(frame) => {
                self.consecutive_failures = 0;
                frame
            }
            Err(_) => {
                self.read_failed(&cfg);
                return;
            }
        };

        self.frames_total += 1;
        self.update_fps();

        let active = region::resolve(cfg.region, frame.width(), frame.height());
        if self.last_region != Some(active) {
            self.detector.reset();
            self.debounce.reset();
            self.last_region = Some(active);
        }

        if self.state == MonitorState::Running {
            let verdict = self.detector.detect(&frame, active, &cfg);
            let confirmed = self.debounce.update(verdict.detected, cfg.continuous_frames);

            if self
                .gate
                .try_fire(Instant::now(), confirmed, cfg.cooldown_duration())
            {
                self.alerts += 1;
                warn!(
                    "motion alert #{} ({} consecutive frames, max area {})",
                    self.alerts,
                    self.debounce.count(),
                    verdict.contour_area_max
                );
                self.spawn_burst(&cfg);
            }
        }

        if let Ok(mut slot) = self.display.write() {
            // Latest-value slot: overwriting is the drop-oldest policy for
            // the high-frequency display feed.
            *slot = Some(frame);
        }

        if self.stats_since.elapsed() >= STATS_PERIOD {
            self.stats_since = Instant::now();
            let _ = self.events.send(MonitorEvent::Stats(StatsSnapshot {
                fps: self.fps,
                frames: self.frames_total,
                alerts: self.alerts,
                debounce: (self.debounce.count(), cfg.continuous_frames),
            }));
        }

        if let Some(rest) = cfg.cycle_duration().checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    fn read_failed(&mut self, cfg: &MonitorConfig) {
        self.consecutive_failures += 1;
        if self.consecutive_failures <= cfg.max_consecutive_failures {
            // Transient: quietly retry next cycle.
            std::thread::sleep(self.retry_pause);
            return;
        }

        warn!(
            "camera read failed {} times, reconnecting",
            self.consecutive_failures
        );
        if !self.reconnect(cfg) {
            error!("source lost after {RECONNECT_ATTEMPTS} reconnect attempts, stopping");
            let _ = self.events.send(MonitorEvent::SourceLost);
            self.source = None;
            self.set_state(MonitorState::Stopped);
        }
    }

    /// Bounded reconnect sequence: drop the handle, back off, reopen.
    /// Success resets both failure counters.
    fn reconnect(&mut self, cfg: &MonitorConfig) -> bool {
        self.source = None;

        for attempt in 1..=RECONNECT_ATTEMPTS {
            if !self.running.load(Ordering::Relaxed) {
                return false;
            }
            info!(
                "reconnecting to {} (attempt {attempt}/{RECONNECT_ATTEMPTS})",
                cfg.camera_id
            );
            std::thread::sleep(self.backoff);

            match (self.opener)(&cfg.camera_id) {
                Ok(source) => {
                    self.source = Some(Arc::new(Mutex::new(source)));
                    self.consecutive_failures = 0;
                    info!("source reconnected");
                    return true;
                }
                Err(e) => warn!("reconnect attempt {attempt} failed: {e}"),
            }
        }
        false
    }

    fn spawn_burst(&self, cfg: &MonitorConfig) {
        let Some(source) = self.source.clone() else {
            return;
        };
        let store = self.store.clone();
        let events = self.events.clone();
        let running = self.running.clone();
        let interval = cfg.burst_interval_duration();
        let count = cfg.burst_count;
        let confirmed_frames = self.debounce.count();

        // The alert event carries the evidence paths, so it is assembled and
        // emitted once the burst finishes. The task reads frames through the
        // shared source lock and touches no other pipeline state.
        std::thread::spawn(move || {
            let screenshot_paths = burst::capture_burst(&source, &store, count, interval, &running);
            let _ = events.send(MonitorEvent::Alert(AlertEvent {
                time: Local::now(),
                confirmed_frames,
                screenshot_paths,
            }));
        });
    }

    fn manual_capture(&mut self) {
        let Some(source) = self.source.clone() else {
            warn!("manual capture ignored: monitoring is stopped");
            return;
        };
        let frame = match source.lock() {
            Ok(mut src) => src.read(),
            Err(_) => Err(SourceError::ReadFailed),
        };
        match frame {
            Ok(frame) => {
                if let Err(e) = self.store.save(&frame, SnapshotKind::Manual, None) {
                    warn!("manual capture failed: {e}");
                }
            }
            Err(e) => warn!("manual capture failed: {e}"),
        }
    }

    fn update_fps(&mut self) {
        self.fps_frames += 1;
        let elapsed = self.fps_since.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.fps_frames as f32 / elapsed.as_secs_f32();
            self.fps_frames = 0;
            self.fps_since = Instant::now();
        }
    }

    fn set_state(&mut self, state: MonitorState) {
        self.state = state;
        if let Ok(mut shared) = self.shared_state.write() {
            *shared = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Rgba;
    use crate::mock::ScriptedSource;
    use std::sync::atomic::AtomicUsize;

    fn test_config(dir: &std::path::Path) -> MonitorConfig {
        MonitorConfig {
            min_area: 10,
            threshold: 25,
            blur_kernel: 1,
            dilate_iterations: 0,
            continuous_frames: 2,
            alert_cooldown: 0.0,
            cycle_delay: 0.0,
            max_consecutive_failures: 2,
            burst_count: 1,
            burst_interval: 0.0,
            screenshot_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    fn test_worker(
        cfg: MonitorConfig,
        opener: SourceOpener,
    ) -> (Worker, Receiver<MonitorEvent>) {
        let store = Arc::new(ScreenshotStore::new(&cfg.screenshot_dir).unwrap());
        let (event_tx, event_rx) = mpsc::channel();
        let mut worker = Worker::new(
            cfg,
            store,
            opener,
            event_tx,
            Arc::new(RwLock::new(MonitorState::Stopped)),
            Arc::new(RwLock::new(None)),
            Arc::new(AtomicBool::new(true)),
        );
        worker.backoff = Duration::ZERO;
        worker.retry_pause = Duration::ZERO;
        (worker, event_rx)
    }

    fn dark() -> Frame {
        Frame::filled(64, 64, 0)
    }

    fn blob_at(x: usize) -> Frame {
        let mut frame = dark();
        for dy in 0..5 {
            for dx in 0..5 {
                frame.pixels_mut()[(20 + dy) * 64 + x + dx] = Rgba::grey(255);
            }
        }
        frame
    }

    fn drain_alerts(events: &Receiver<MonitorEvent>) -> Vec<AlertEvent> {
        let mut alerts = vec![];
        while let Ok(event) = events.recv_timeout(Duration::from_secs(2)) {
            if let MonitorEvent::Alert(alert) = event {
                alerts.push(alert);
            }
        }
        alerts
    }

    #[test]
    fn reconnect_exhaustion_emits_one_source_lost() {
        let dir = tempfile::tempdir().unwrap();
        let opens = Arc::new(AtomicUsize::new(0));
        let opens_seen = opens.clone();

        let opener: SourceOpener = Box::new(move |_| {
            let n = opens.fetch_add(1, Ordering::Relaxed);
            if n == 0 {
                // Initial open succeeds, then every read fails.
                Ok(Box::new(ScriptedSource::new([])) as _)
            } else {
                Err(SourceError::Unavailable("gone".into()))
            }
        });

        let (mut worker, events) = test_worker(test_config(dir.path()), opener);
        worker.start();
        assert_eq!(worker.state, MonitorState::Running);

        // max_consecutive_failures = 2: two tolerated failures, the third
        // crosses the threshold and triggers the reconnect sequence.
        for _ in 0..3 {
            worker.cycle();
        }

        assert_eq!(worker.state, MonitorState::Stopped);
        assert_eq!(opens_seen.load(Ordering::Relaxed), 1 + RECONNECT_ATTEMPTS as usize);

        let lost: Vec<_> = events
            .try_iter()
            .filter(|e| matches!(e, MonitorEvent::SourceLost))
            .collect();
        assert_eq!(lost.len(), 1);
    }

    #[test]
    fn reconnect_success_resumes_with_clean_counters() {
        let dir = tempfile::tempdir().unwrap();
        let opens = Arc::new(AtomicUsize::new(0));

        let opener: SourceOpener = {
            let opens = opens.clone();
            Box::new(move |_| match opens.fetch_add(1, Ordering::Relaxed) {
                // Initial source only ever fails reads; first reopen attempt
                // fails; the second one delivers a healthy source.
                0 => Ok(Box::new(ScriptedSource::new([])) as _),
                1 => Err(SourceError::Unavailable("still gone".into())),
                _ => Ok(Box::new(ScriptedSource::new([Ok(dark())])) as _),
            })
        };

        let (mut worker, _events) = test_worker(test_config(dir.path()), opener);
        worker.start();

        for _ in 0..3 {
            worker.cycle();
        }

        assert_eq!(worker.state, MonitorState::Running);
        assert_eq!(worker.consecutive_failures, 0);

        // And the pipeline actually reads frames again.
        worker.cycle();
        assert_eq!(worker.frames_total, 1);
    }

    #[test]
    fn debounced_motion_raises_alert_with_burst_evidence() {
        let dir = tempfile::tempdir().unwrap();
        let opener: SourceOpener = Box::new(|_| {
            Ok(Box::new(ScriptedSource::new([
                Ok(dark()),
                Ok(dark()),
                Ok(blob_at(10)),
                Ok(blob_at(30)),
            ])) as _)
        });

        let (mut worker, events) = test_worker(test_config(dir.path()), opener);
        worker.start();

        // Seed, quiet, motion, motion-confirmed-and-fired.
        for _ in 0..4 {
            worker.cycle();
        }

        let alerts = drain_alerts(&events);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].confirmed_frames, 2);
        assert_eq!(alerts[0].screenshot_paths.len(), 1);
        assert!(alerts[0].screenshot_paths[0]
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("alert_"));
    }

    #[test]
    fn single_motion_frame_is_debounced_away() {
        let dir = tempfile::tempdir().unwrap();
        let opener: SourceOpener = Box::new(|_| {
            Ok(Box::new(ScriptedSource::new([
                Ok(dark()),
                Ok(blob_at(10)),
                Ok(blob_at(10)),
            ])) as _)
        });

        let (mut worker, events) = test_worker(test_config(dir.path()), opener);
        worker.start();

        // Blob appears once, then the scene freezes: one positive verdict,
        // then negatives. Never confirmed.
        for _ in 0..4 {
            worker.cycle();
        }

        drop(worker);
        assert!(events
            .try_iter()
            .all(|e| !matches!(e, MonitorEvent::Alert(_))));
    }

    #[test]
    fn paused_reads_frames_but_never_detects() {
        let dir = tempfile::tempdir().unwrap();
        let opener: SourceOpener = Box::new(|_| {
            Ok(Box::new(ScriptedSource::new([
                Ok(dark()),
                Ok(blob_at(10)),
                Ok(blob_at(30)),
                Ok(blob_at(50)),
            ])) as _)
        });

        let (mut worker, events) = test_worker(test_config(dir.path()), opener);
        worker.start();
        worker.handle_command(Command::Pause);
        assert_eq!(worker.state, MonitorState::Paused);

        for _ in 0..4 {
            worker.cycle();
        }

        // The pipe stayed warm but nothing was detected.
        assert_eq!(worker.frames_total, 4);
        assert_eq!(worker.debounce.count(), 0);
        drop(worker);
        assert!(events
            .try_iter()
            .all(|e| !matches!(e, MonitorEvent::Alert(_))));
    }

    #[test]
    fn region_change_resets_detection_state() {
        let dir = tempfile::tempdir().unwrap();
        let opener: SourceOpener = Box::new(|_| {
            Ok(Box::new(ScriptedSource::new([
                Ok(dark()),
                Ok(blob_at(10)),
                Ok(blob_at(30)),
            ])) as _)
        });

        let mut cfg = test_config(dir.path());
        cfg.continuous_frames = 5;
        let (mut worker, _events) = test_worker(cfg, opener);
        worker.start();

        worker.cycle();
        worker.cycle();
        assert_eq!(worker.debounce.count(), 1);

        worker.handle_command(Command::SetRegion(Some(Rect::new(0, 0, 32, 32))));
        worker.cycle();
        // Baseline reseeded for the new region: no verdict, count cleared.
        assert_eq!(worker.debounce.count(), 0);
    }

    #[test]
    fn manual_capture_writes_manual_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let opener: SourceOpener =
            Box::new(|_| Ok(Box::new(ScriptedSource::new([Ok(dark())])) as _));

        let (mut worker, _events) = test_worker(test_config(dir.path()), opener);
        worker.start();
        worker.handle_command(Command::ManualCapture);

        let manual: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(|n| n.starts_with("manual_"))
                    .unwrap_or(false)
            })
            .collect();
        assert_eq!(manual.len(), 1);
    }

    #[test]
    fn screenshot_dir_update_redirects_captures() {
        let dir = tempfile::tempdir().unwrap();
        let new_dir = tempfile::tempdir().unwrap();
        let opener: SourceOpener = Box::new(|_| {
            Ok(Box::new(ScriptedSource::new([Ok(dark()), Ok(dark())])) as _)
        });

        let (mut worker, _events) = test_worker(test_config(dir.path()), opener);
        worker.start();

        let mut cfg = worker.config.clone();
        cfg.screenshot_dir = new_dir.path().to_path_buf();
        worker.handle_command(Command::UpdateConfig(cfg));
        worker.handle_command(Command::ManualCapture);

        let count = |d: &std::path::Path| std::fs::read_dir(d).unwrap().count();
        assert_eq!(count(dir.path()), 0);
        assert_eq!(count(new_dir.path()), 1);
    }

    #[test]
    fn rejected_updates_leave_config_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let opener: SourceOpener =
            Box::new(|_| Ok(Box::new(ScriptedSource::new([Ok(dark())])) as _));

        let (mut worker, _events) = test_worker(test_config(dir.path()), opener);
        worker.handle_command(Command::SetParam("threshold".into(), 999.0));
        assert_eq!(worker.config.threshold, 25);

        let mut broken = worker.config.clone();
        broken.continuous_frames = 0;
        worker.handle_command(Command::UpdateConfig(broken));
        assert_eq!(worker.config.continuous_frames, 2);
    }

    #[test]
    fn monitor_spawn_smoke() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = MonitorConfig::default();
        cfg.camera_id = "synthetic:64x48".into();
        cfg.cycle_delay = 0.01;
        cfg.screenshot_dir = dir.path().to_path_buf();

        let (monitor, _events) = Monitor::spawn(cfg).unwrap();
        assert_eq!(monitor.state(), MonitorState::Stopped);

        monitor.start().unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while monitor.latest_frame().is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(monitor.latest_frame().is_some());
        assert_eq!(monitor.state(), MonitorState::Running);

        monitor.stop().unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while monitor.state() != MonitorState::Stopped && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(monitor.state(), MonitorState::Stopped);
    }
}
