//! Cœur minimal sans jeu d'instructions
//!
//! Compte les cycles, conserve l'image et la file clavier, et affiche
//! l'image chargée comme une vue mémoire en niveaux de gris. Suffit pour
//! faire tourner le front-end de bout en bout.

use std::collections::VecDeque;

use log::debug;

use super::VirtualMachine;
use crate::input::DeviceKeyEvent;

/// Taille de la file du clavier du périphérique
pub const KEY_BUFFER_SIZE: usize = 64;

/// Machine "au repos": chaque cycle demandé est exécuté
#[derive(Debug, Default)]
pub struct IdleMachine {
    image: Vec<u8>,
    key_buffer: VecDeque<u32>,
    total_cycles: u64,
    steps: u64,
    frames: u64,
    resets: u64,
}

impl IdleMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Retire l'événement clavier le plus ancien (mot encodé)
    pub fn pop_key_event(&mut self) -> Option<u32> {
        self.key_buffer.pop_front()
    }

    pub fn pending_key_events(&self) -> usize {
        self.key_buffer.len()
    }
}

impl VirtualMachine for IdleMachine {
    fn reset(&mut self) {
        self.key_buffer.clear();
        self.total_cycles = 0;
        self.steps = 0;
        self.resets += 1;
    }

    fn load_image(&mut self, image: &[u8]) {
        self.image.clear();
        self.image.extend_from_slice(image);
    }

    fn tick(&mut self, cycles: u32, _elapsed_ms: f64) -> u32 {
        self.total_cycles += u64::from(cycles);
        cycles
    }

    fn step(&mut self, _elapsed_ms: f64) -> u32 {
        self.steps += 1;
        self.total_cycles += 1;
        1
    }

    fn render_frame(&mut self, rgba: &mut [u8]) {
        for (i, pixel) in rgba.chunks_exact_mut(4).enumerate() {
            let level = self.image.get(i).copied().unwrap_or(0);
            pixel.copy_from_slice(&[level, level, level, 0xFF]);
        }
    }

    fn push_key_event(&mut self, event: DeviceKeyEvent) {
        if self.key_buffer.len() < KEY_BUFFER_SIZE {
            self.key_buffer.push_back(event.encode());
        } else {
            debug!("File clavier pleine, événement {:#010x} ignoré", event.encode());
        }
    }

    fn vsync(&mut self) {
        self.frames += 1;
    }
}
