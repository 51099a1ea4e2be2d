//! Framebuffer RGBA de l'écran émulé

/// Grille de pixels RGBA de taille fixe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Crée un framebuffer noir opaque
    pub fn new(width: u32, height: u32) -> Self {
        let mut framebuffer = Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        };
        framebuffer.clear();
        framebuffer
    }

    pub fn clear(&mut self) {
        for pixel in self.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&[0, 0, 0, 0xFF]);
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.data[offset..offset + 4]);
        Some(rgba)
    }

    /// Octets par ligne
    pub fn stride(&self) -> u32 {
        self.width * 4
    }

    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|p| p == [0, 0, 0, 0xFF])
    }
}
