//! Headless motion monitor.
//!
//! Loads a configuration file, starts the pipeline and logs alerts until the
//! source is lost or the process is interrupted.

use vigil::prelude::v1::*;

fn main() -> Result<()> {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".into());
    let mut config = MonitorConfig::load(&config_path)?;

    // Optional second argument overrides the configured source.
    if let Some(source) = std::env::args().nth(2) {
        config.camera_id = source;
    }

    log::info!(
        "watching {} (min area {}, {} consecutive frames, {:.1}s cooldown)",
        config.camera_id,
        config.min_area,
        config.continuous_frames,
        config.alert_cooldown
    );

    let cleanup_after = std::time::Duration::from_secs(u64::from(config.cleanup_days) * 86_400);

    let (monitor, events) = Monitor::spawn(config)?;
    monitor.cleanup_screenshots(cleanup_after)?;
    monitor.start()?;

    let mut history = AlertHistory::default();

    for event in events {
        match event {
            MonitorEvent::Alert(alert) => {
                log::warn!(
                    "ALERT at {} after {} consecutive frames, {} screenshot(s)",
                    alert.time.format("%H:%M:%S"),
                    alert.confirmed_frames,
                    alert.screenshot_paths.len()
                );
                history.push(alert);
            }
            MonitorEvent::Stats(stats) => {
                log::info!(
                    "{:.1} fps, {} frames, {} alerts, debounce {}/{}",
                    stats.fps,
                    stats.frames,
                    stats.alerts,
                    stats.debounce.0,
                    stats.debounce.1
                );
            }
            MonitorEvent::SourceLost => {
                log::error!("video source lost, exiting");
                break;
            }
        }
    }

    log::info!("{} alert(s) recorded this session", history.len());

    Ok(())
}
