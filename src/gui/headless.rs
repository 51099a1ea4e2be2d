//! Session sans fenêtre, cadencée par une horloge simulée

use anyhow::Result;
use log::info;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::FrontendConfig;
use crate::display::{headless::save_png, DisplayManager, DisplayMode, HeadlessFactory};
use crate::machine::VirtualMachine;
use crate::pacing::SpeedReport;
use crate::scheduler::Scheduler;

/// Bilan d'une session sans fenêtre
#[derive(Debug, Clone, Default)]
pub struct HeadlessSummary {
    pub ticks: u32,
    pub executed_cycles: u64,
    pub frames_presented: u32,
    pub speed_reports: Vec<SpeedReport>,
}

/// Exécute `ticks` ticks espacés de `frame_interval_ms`, sans attendre.
///
/// L'image éventuelle est chargée puis lancée. La dernière trame peut être
/// enregistrée en PNG.
pub fn run_headless<M: VirtualMachine>(
    machine: M,
    config: &FrontendConfig,
    image: Option<&[u8]>,
    ticks: u32,
    snapshot: Option<&Path>,
) -> Result<HeadlessSummary> {
    config.validate()?;
    let factory = HeadlessFactory {
        width: config.video.screen_width,
        height: config.video.screen_height,
    };
    let display = DisplayManager::new(Box::new(factory), DisplayMode::Software);
    let mut scheduler = Scheduler::new(machine, display, config);

    if let Some(image) = image {
        scheduler.load_image(image)?;
        scheduler.run()?;
    }

    let interval = Duration::from_millis(config.pacing.frame_interval_ms);
    let start = Instant::now();
    let mut summary = HeadlessSummary::default();
    for i in 0..ticks {
        let report = scheduler.tick(start + interval * i);
        summary.ticks += 1;
        summary.executed_cycles += u64::from(report.executed);
        if report.frame_presented {
            summary.frames_presented += 1;
        }
        if let Some(speed) = report.speed {
            summary.speed_reports.push(speed);
        }
    }

    if let Some(path) = snapshot {
        save_png(scheduler.display().backend().frame_buffer(), path)?;
        info!("Dernière trame enregistrée dans {}", path.display());
    }

    info!(
        "Session terminée: {} ticks, {} cycles, {} trames",
        summary.ticks, summary.executed_cycles, summary.frames_presented
    );
    Ok(summary)
}
