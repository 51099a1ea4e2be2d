//! Pixel VComputer Rust - Front-end temps réel pour ordinateur virtuel
//!
//! Cette bibliothèque fait tourner un cœur d'émulation en temps réel dans
//! une fenêtre hôte: cadencement des cycles sur l'horloge murale, machine
//! d'états Run/Step, traduction clavier et rafraîchissement de l'écran,
//! le tout sur un seul fil d'exécution.

pub mod config;
pub mod display;
pub mod error;
pub mod gui;
pub mod input;
pub mod machine;
pub mod pacing;
pub mod rom;
pub mod scheduler;

pub use config::FrontendConfig;
pub use display::{DisplayBackend, DisplayFactory, DisplayManager, DisplayMode, FrameBuffer};
pub use error::{FrontendError, FrontendResult};
pub use input::{DeviceKeyEvent, HostKey, KeyTranslator, ModifierMask};
pub use machine::{IdleMachine, VirtualMachine};
pub use pacing::{PacingController, PeriodicTrigger, SpeedReport};
pub use scheduler::{Affordances, RunState, Scheduler, TickReport};

/// Version du front-end
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Horloge par défaut du CPU émulé en Hz
pub const DEFAULT_CPU_CLOCK: u32 = 100_000; // 100 kHz

/// Largeur de l'écran émulé
pub const SCREEN_WIDTH: u32 = 320;

/// Hauteur de l'écran émulé
pub const SCREEN_HEIGHT: u32 = 240;

/// Taille maximale d'une image programme
pub const MAX_IMAGE_SIZE: usize = 64 * 1024; // 64 Kio
