//! Contrat du cœur d'émulation
//!
//! Le front-end ne connaît de l'ordinateur virtuel que ces quelques
//! opérations. Le jeu d'instructions, la mémoire et les registres des
//! périphériques restent du ressort du cœur.

pub mod idle;

pub use idle::IdleMachine;

use crate::input::DeviceKeyEvent;

/// Trait implémenté par un cœur d'émulation
pub trait VirtualMachine {
    /// Remet la machine dans son état de mise sous tension
    fn reset(&mut self);

    /// Copie une image programme (déjà tronquée par l'appelant)
    fn load_image(&mut self, image: &[u8]);

    /// Exécute environ `cycles` cycles, renvoie le nombre réellement exécuté
    fn tick(&mut self, cycles: u32, elapsed_ms: f64) -> u32;

    /// Exécute une seule instruction
    fn step(&mut self, elapsed_ms: f64) -> u32;

    /// Rend l'écran courant en RGBA dans `rgba`
    fn render_frame(&mut self, rgba: &mut [u8]);

    /// Dépose un événement dans la file du clavier
    fn push_key_event(&mut self, event: DeviceKeyEvent);

    /// Signale que la trame vient d'être affichée
    fn vsync(&mut self) {}
}
