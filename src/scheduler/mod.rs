//! Planificateur temps réel
//!
//! Un seul appel hôte récurrent (`tick`) fait avancer toute la session:
//! budget de cycles, exécution selon l'état Run/Step, envoi des événements
//! clavier en attente, rafraîchissement de l'écran et mesure de vitesse.
//! Les événements d'entrée arrivent entre deux ticks et ne font que
//! modifier l'état du traducteur et la file d'attente.

use log::{debug, info, warn};
use std::collections::VecDeque;
use std::time::Instant;

use crate::config::FrontendConfig;
use crate::display::{DisplayManager, DisplayMode};
use crate::error::{FrontendError, FrontendResult};
use crate::input::{DeviceKeyEvent, HostKey, KeyTranslator, ModifierMask};
use crate::machine::VirtualMachine;
use crate::pacing::{PacingController, SpeedReport};
use crate::rom::{format_image_size, image_checksum};

/// Capacité de la file d'événements clavier (taille du tampon du périphérique)
pub const PENDING_KEY_CAPACITY: usize = 64;

/// État d'exécution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Halted,
    Running,
    /// Une seule instruction au prochain tick, puis retour à `Halted`
    SingleStep,
}

/// Commandes utilisables dans l'état courant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    pub run: bool,
    pub stop: bool,
    pub step: bool,
    pub reset: bool,
}

/// Bilan d'un tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub elapsed_ms: f64,
    pub cycle_budget: u32,
    pub executed: u32,
    pub frame_presented: bool,
    pub speed: Option<SpeedReport>,
}

/// Planificateur d'une session d'émulation
pub struct Scheduler<M: VirtualMachine> {
    machine: M,
    display: DisplayManager,
    pacing: PacingController,
    translator: KeyTranslator,
    pending_keys: VecDeque<DeviceKeyEvent>,
    run_state: RunState,
    image_loaded: bool,
    max_image_bytes: usize,
}

impl<M: VirtualMachine> Scheduler<M> {
    pub fn new(machine: M, display: DisplayManager, config: &FrontendConfig) -> Self {
        Self {
            machine,
            display,
            pacing: PacingController::new(&config.pacing),
            translator: KeyTranslator::new(),
            pending_keys: VecDeque::with_capacity(PENDING_KEY_CAPACITY),
            run_state: RunState::Halted,
            image_loaded: false,
            max_image_bytes: config.emulation.max_image_bytes,
        }
    }

    /// Avance la session d'un tick hôte
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let elapsed_ms = self.pacing.on_frame(now);
        let baseline = self.pacing.baseline_cycles_per_second();
        let cycle_budget = self.pacing.next_cycle_budget(elapsed_ms, baseline);

        if self.run_state != RunState::Halted {
            self.flush_key_events();
        }

        let executed = match self.run_state {
            RunState::Running => self.machine.tick(cycle_budget, elapsed_ms),
            RunState::SingleStep => {
                let executed = self.machine.step(elapsed_ms);
                self.run_state = RunState::Halted;
                debug!("Pas-à-pas: {} cycle(s)", executed);
                executed
            }
            RunState::Halted => 0,
        };
        self.pacing.record_executed(executed, elapsed_ms);

        let frame_presented = self.pacing.should_refresh_frame(elapsed_ms) && self.refresh_frame();

        let speed = if self.pacing.should_report_speed(elapsed_ms) {
            let report = self.pacing.speed_report();
            if self.run_state == RunState::Running {
                info!("Vitesse CPU: {} ({} cycles en {:.0} ms)", report.label(), report.executed_cycles, report.window_ms);
            }
            Some(report)
        } else {
            None
        };

        TickReport {
            elapsed_ms,
            cycle_budget,
            executed,
            frame_presented,
            speed,
        }
    }

    fn flush_key_events(&mut self) {
        for event in self.pending_keys.drain(..) {
            self.machine.push_key_event(event);
        }
    }

    fn refresh_frame(&mut self) -> bool {
        let backend = self.display.backend_mut();
        self.machine.render_frame(backend.frame_buffer_mut().as_bytes_mut());
        match backend.present() {
            Ok(()) => {
                self.machine.vsync();
                true
            }
            Err(e) => {
                warn!("Trame ignorée: {:#}", e);
                false
            }
        }
    }

    pub fn run(&mut self) -> FrontendResult<()> {
        match self.run_state {
            RunState::Running => Ok(()),
            _ if !self.image_loaded => Err(FrontendError::NoImageLoaded),
            _ => {
                self.run_state = RunState::Running;
                info!("Exécution");
                Ok(())
            }
        }
    }

    pub fn stop(&mut self) {
        if self.run_state != RunState::Halted {
            info!("Arrêt");
        }
        self.run_state = RunState::Halted;
    }

    pub fn step(&mut self) -> FrontendResult<()> {
        match self.run_state {
            RunState::Running => Err(FrontendError::StepWhileRunning),
            _ if !self.image_loaded => Err(FrontendError::NoImageLoaded),
            _ => {
                self.run_state = RunState::SingleStep;
                Ok(())
            }
        }
    }

    /// Réinitialise la machine et tout l'état de session
    pub fn reset(&mut self) {
        self.machine.reset();
        self.run_state = RunState::Halted;
        self.pacing.reset();
        self.translator.reset();
        self.pending_keys.clear();
        if let Err(e) = self.display.backend_mut().clear() {
            warn!("Effacement de l'écran impossible: {:#}", e);
        }
        info!("Machine réinitialisée");
    }

    /// Charge une image programme. Renvoie la taille transmise au cœur.
    pub fn load_image(&mut self, bytes: &[u8]) -> FrontendResult<usize> {
        if bytes.is_empty() {
            return Err(FrontendError::EmptyImage);
        }
        self.stop();

        let image = if bytes.len() > self.max_image_bytes {
            warn!("{}", FrontendError::ImageTooLarge { len: bytes.len(), max: self.max_image_bytes });
            &bytes[..self.max_image_bytes]
        } else {
            bytes
        };

        self.machine.load_image(image);
        self.image_loaded = true;
        info!(
            "Image chargée: {} (CRC32 {:08X})",
            format_image_size(image.len()),
            image_checksum(image)
        );
        Ok(image.len())
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) -> DisplayMode {
        self.display.set_mode(mode)
    }

    pub fn resize_display(&mut self, width: u32, height: u32) {
        self.display.resize(width, height);
    }

    /// Touche enfoncée. À l'arrêt, seul le masque des modificateurs est
    /// mis à jour: aucun événement n'est mis en file.
    pub fn key_down(&mut self, host: HostKey) {
        let event = self.translator.key_down(host);
        if self.run_state == RunState::Halted {
            return;
        }
        if let Some(event) = event {
            self.enqueue_key(event);
        }
    }

    pub fn key_up(&mut self, host: HostKey) {
        self.translator.key_up(host);
    }

    /// Caractère produit par l'hôte (ignoré à l'arrêt)
    pub fn key_press(&mut self, ch: char) {
        if self.run_state == RunState::Halted {
            return;
        }
        let event = self.translator.key_press(ch);
        self.enqueue_key(event);
    }

    /// Touche de contrôle sans texte (flèches...), ignorée à l'arrêt
    pub fn control_press(&mut self) {
        if self.run_state == RunState::Halted {
            return;
        }
        if let Some(event) = self.translator.control_press() {
            self.enqueue_key(event);
        }
    }

    fn enqueue_key(&mut self, event: DeviceKeyEvent) {
        if self.pending_keys.len() >= PENDING_KEY_CAPACITY {
            debug!("File clavier pleine, événement {:#010x} ignoré", event.encode());
            return;
        }
        self.pending_keys.push_back(event);
    }

    pub fn affordances(&self) -> Affordances {
        let running = self.run_state == RunState::Running;
        Affordances {
            run: self.image_loaded && !running,
            stop: running,
            step: self.image_loaded && !running,
            reset: !running,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn image_loaded(&self) -> bool {
        self.image_loaded
    }

    pub fn modifiers(&self) -> ModifierMask {
        self.translator.modifiers()
    }

    pub fn pending_key_events(&self) -> usize {
        self.pending_keys.len()
    }

    pub fn pacing(&self) -> &PacingController {
        &self.pacing
    }

    pub fn display(&self) -> &DisplayManager {
        &self.display
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut M {
        &mut self.machine
    }
}
