//! Affichage sans fenêtre
//!
//! Garde la dernière trame en mémoire. Sert au mode `--headless` et de
//! dernier repli quand aucune surface graphique n'est disponible.

use anyhow::{anyhow, Result};
use std::path::Path;

use super::{DisplayBackend, DisplayFactory, DisplayMode, FrameBuffer};
use crate::error::FrontendError;

/// Affichage en mémoire
#[derive(Debug)]
pub struct HeadlessDisplay {
    frame: FrameBuffer,
    presented: u64,
}

impl HeadlessDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: FrameBuffer::new(width, height),
            presented: 0,
        }
    }

    /// Nombre de trames présentées
    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Enregistre la trame courante en PNG
    pub fn save_png(&self, path: &Path) -> Result<()> {
        save_png(&self.frame, path)
    }
}

/// Enregistre un framebuffer en PNG
pub fn save_png(frame: &FrameBuffer, path: &Path) -> Result<()> {
    let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.as_bytes().to_vec())
        .ok_or_else(|| anyhow!("Framebuffer de taille incohérente"))?;
    image.save(path)?;
    Ok(())
}

impl DisplayBackend for HeadlessDisplay {
    fn frame_buffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frame
    }

    fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame
    }

    fn present(&mut self) -> Result<()> {
        self.presented += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.frame.clear();
        Ok(())
    }

    fn mode(&self) -> DisplayMode {
        DisplayMode::Software
    }

    fn name(&self) -> &'static str {
        "headless"
    }
}

/// Fabrique d'affichages en mémoire, quel que soit le mode demandé
#[derive(Debug, Clone, Copy)]
pub struct HeadlessFactory {
    pub width: u32,
    pub height: u32,
}

impl DisplayFactory for HeadlessFactory {
    fn create(&mut self, _mode: DisplayMode) -> Result<Box<dyn DisplayBackend>, FrontendError> {
        Ok(Box::new(HeadlessDisplay::new(self.width, self.height)))
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_and_clear() {
        let mut display = HeadlessDisplay::new(8, 8);
        display.frame_buffer_mut().as_bytes_mut()[0] = 0xFF;
        display.present().unwrap();
        assert_eq!(display.presented(), 1);
        display.clear().unwrap();
        assert!(display.frame().is_blank());
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut display = HeadlessDisplay::new(4, 4);
        display.frame_buffer_mut().as_bytes_mut()[0] = 0xC0;
        display.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (4, 4));
        assert_eq!(loaded.get_pixel(0, 0).0, [0xC0, 0, 0, 0xFF]);
    }
}
