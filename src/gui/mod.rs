//! Interface de l'émulateur
//!
//! Fenêtre winit dont la boucle d'événements sert d'horloge au
//! planificateur, et mode sans fenêtre piloté par une horloge simulée.

pub mod headless;

pub use headless::{run_headless, HeadlessSummary};

use anyhow::Result;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowBuilder},
};

use crate::config::FrontendConfig;
use crate::display::{DisplayManager, WindowDisplayFactory};
use crate::input::host::host_key;
use crate::machine::{IdleMachine, VirtualMachine};
use crate::pacing::SpeedReport;
use crate::rom;
use crate::scheduler::{RunState, Scheduler};

const WINDOW_TITLE: &str = "Pixel VComputer";

/// Commandes utilisateur associées aux touches de fonction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleRun,
    Step,
    Reset,
    ToggleDisplayMode,
    ToggleCapture,
}

impl Command {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::F3 => Some(Command::ToggleCapture),
            KeyCode::F5 => Some(Command::ToggleRun),
            KeyCode::F6 => Some(Command::Step),
            KeyCode::F7 => Some(Command::Reset),
            KeyCode::F8 => Some(Command::ToggleDisplayMode),
            _ => None,
        }
    }
}

/// État de l'application pendant la boucle d'événements
pub struct AppState<M: VirtualMachine> {
    pub scheduler: Scheduler<M>,
    pub capture_keyboard: bool,
    pub last_speed: Option<SpeedReport>,
    pub exit_requested: bool,
}

impl<M: VirtualMachine> AppState<M> {
    pub fn new(scheduler: Scheduler<M>, capture_keyboard: bool) -> Self {
        Self {
            scheduler,
            capture_keyboard,
            last_speed: None,
            exit_requested: false,
        }
    }

    pub fn execute(&mut self, command: Command) {
        match command {
            Command::ToggleRun => {
                if self.scheduler.run_state() == RunState::Running {
                    self.scheduler.stop();
                } else if let Err(e) = self.scheduler.run() {
                    debug!("Run ignoré: {}", e);
                }
            }
            Command::Step => {
                if let Err(e) = self.scheduler.step() {
                    debug!("Step ignoré: {}", e);
                }
            }
            Command::Reset => {
                if self.scheduler.affordances().reset {
                    self.scheduler.reset();
                    self.last_speed = None;
                } else {
                    debug!("Reset indisponible pendant l'exécution");
                }
            }
            Command::ToggleDisplayMode => {
                let requested = self.scheduler.display().mode().toggled();
                let obtained = self.scheduler.set_display_mode(requested);
                info!("Mode d'affichage: {}", obtained);
            }
            Command::ToggleCapture => {
                self.capture_keyboard = !self.capture_keyboard;
                info!("Capture clavier {}", if self.capture_keyboard { "activée" } else { "désactivée" });
            }
        }
    }

    /// Charge une image depuis le disque
    pub fn load_file(&mut self, path: &Path) {
        info!("Chargement de l'image: {}", path.display());
        match rom::read_image(path) {
            Ok(bytes) => {
                if let Err(e) = self.scheduler.load_image(&bytes) {
                    warn!("Image refusée: {}", e);
                }
            }
            Err(e) => error!("Impossible de charger {}: {:#}", path.display(), e),
        }
    }

    pub fn handle_key(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };

        if let Some(command) = Command::from_key(code) {
            if event.state == ElementState::Pressed && !event.repeat {
                self.execute(command);
            }
            return;
        }

        if !self.capture_keyboard {
            return;
        }
        let Some(host) = host_key(code) else {
            return;
        };

        match event.state {
            ElementState::Pressed => {
                if !event.repeat {
                    self.scheduler.key_down(host);
                }
                match &event.text {
                    Some(text) => {
                        for ch in text.as_str().chars() {
                            self.scheduler.key_press(ch);
                        }
                    }
                    None => self.scheduler.control_press(),
                }
            }
            ElementState::Released => self.scheduler.key_up(host),
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.exit_requested = true;
            }
            WindowEvent::Resized(size) => {
                self.scheduler.resize_display(size.width, size.height);
            }
            WindowEvent::DroppedFile(path) => {
                self.load_file(path);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event);
            }
            _ => {}
        }
    }

    /// Titre de fenêtre: état, mode d'affichage et dernière vitesse mesurée
    pub fn title(&self) -> String {
        let state = match self.scheduler.run_state() {
            RunState::Running => "exécution",
            RunState::Halted | RunState::SingleStep => "arrêt",
        };
        let mut title = format!("{} | {} | {}", WINDOW_TITLE, state, self.scheduler.display().mode());
        if let (RunState::Running, Some(speed)) = (self.scheduler.run_state(), self.last_speed) {
            title.push_str(&format!(" | {}", speed.label()));
        }
        if !self.capture_keyboard {
            title.push_str(" | clavier libre (F3)");
        }
        title
    }
}

/// Application fenêtrée
pub struct EmulatorApp {
    pub config: FrontendConfig,
    pub rom_path: Option<PathBuf>,
}

impl EmulatorApp {
    pub fn new(config: FrontendConfig, rom_path: Option<PathBuf>) -> Self {
        Self { config, rom_path }
    }

    pub fn run(self) -> Result<()> {
        let config = self.config;
        let (width, height) = (config.video.screen_width, config.video.screen_height);
        let scale = config.video.window_scale.max(1);

        let event_loop = EventLoop::new()?;
        let window: Arc<Window> = Arc::new(
            WindowBuilder::new()
                .with_title(WINDOW_TITLE)
                .with_inner_size(LogicalSize::new(width * scale, height * scale))
                .build(&event_loop)?,
        );

        let factory = WindowDisplayFactory::new(window.clone(), width, height, config.video.vsync);
        let display = DisplayManager::new(Box::new(factory), config.video.display_mode);
        let scheduler = Scheduler::new(IdleMachine::new(), display, &config);

        let mut app_state = AppState::new(scheduler, config.input.capture_keyboard);
        if let Some(path) = &self.rom_path {
            app_state.load_file(path);
        }
        window.set_title(&app_state.title());

        let frame_interval = Duration::from_millis(config.pacing.frame_interval_ms.max(1));
        info!("Boucle principale: un tick toutes les {:?}", frame_interval);

        event_loop.run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => {
                app_state.handle_window_event(&event);
                if app_state.exit_requested {
                    elwt.exit();
                    return;
                }
                if matches!(event, WindowEvent::KeyboardInput { .. } | WindowEvent::DroppedFile(_)) {
                    window.set_title(&app_state.title());
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                let report = app_state.scheduler.tick(now);
                if let Some(speed) = report.speed {
                    app_state.last_speed = Some(speed);
                    window.set_title(&app_state.title());
                }
                elwt.set_control_flow(ControlFlow::WaitUntil(now + frame_interval));
            }
            _ => {}
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayMode, HeadlessFactory};

    fn app_state() -> AppState<IdleMachine> {
        let config = FrontendConfig::default();
        let display = DisplayManager::new(
            Box::new(HeadlessFactory { width: 320, height: 240 }),
            DisplayMode::Software,
        );
        AppState::new(Scheduler::new(IdleMachine::new(), display, &config), true)
    }

    #[test]
    fn test_command_keys() {
        assert_eq!(Command::from_key(KeyCode::F5), Some(Command::ToggleRun));
        assert_eq!(Command::from_key(KeyCode::F3), Some(Command::ToggleCapture));
        assert_eq!(Command::from_key(KeyCode::KeyA), None);
    }

    #[test]
    fn test_toggle_run() {
        let mut state = app_state();
        state.execute(Command::ToggleRun);
        assert_eq!(state.scheduler.run_state(), RunState::Halted);

        state.scheduler.load_image(&[1, 2, 3]).unwrap();
        state.execute(Command::ToggleRun);
        assert_eq!(state.scheduler.run_state(), RunState::Running);
        state.execute(Command::ToggleRun);
        assert_eq!(state.scheduler.run_state(), RunState::Halted);
    }

    #[test]
    fn test_reset_refused_while_running() {
        let mut state = app_state();
        state.scheduler.load_image(&[1]).unwrap();
        state.execute(Command::ToggleRun);
        state.execute(Command::Reset);
        assert_eq!(state.scheduler.run_state(), RunState::Running);
        assert_eq!(state.scheduler.machine().resets(), 0);
    }

    #[test]
    fn test_title() {
        let mut state = app_state();
        assert_eq!(state.title(), "Pixel VComputer | arrêt | logiciel");
        state.execute(Command::ToggleCapture);
        assert!(state.title().ends_with("clavier libre (F3)"));
    }

    #[test]
    fn test_load_missing_file_keeps_state() {
        let mut state = app_state();
        let dir = tempfile::tempdir().unwrap();
        state.load_file(&dir.path().join("absent.bin"));
        assert!(!state.scheduler.image_loaded());
    }
}
