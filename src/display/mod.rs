//! Affichage de l'écran émulé
//!
//! Deux chemins: accéléré (wgpu sur un adaptateur matériel, mise à
//! l'échelle par le GPU) et logiciel (adaptateur de repli rasterisé par le
//! CPU). Si le chemin accéléré échoue à l'initialisation, la session bascule
//! définitivement sur le chemin logiciel.

pub mod framebuffer;
pub mod headless;
pub mod renderer;

pub use framebuffer::FrameBuffer;
pub use headless::{HeadlessDisplay, HeadlessFactory};
pub use renderer::{WgpuDisplay, WindowDisplayFactory};

use anyhow::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FrontendError;

/// Mode d'affichage demandé par l'utilisateur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Accelerated,
    Software,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Accelerated => DisplayMode::Software,
            DisplayMode::Software => DisplayMode::Accelerated,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Accelerated => write!(f, "accéléré"),
            DisplayMode::Software => write!(f, "logiciel"),
        }
    }
}

/// Backend d'affichage: possède le framebuffer que le cœur remplit
pub trait DisplayBackend {
    fn frame_buffer_mut(&mut self) -> &mut FrameBuffer;

    fn frame_buffer(&self) -> &FrameBuffer;

    /// Affiche le contenu courant du framebuffer
    fn present(&mut self) -> Result<()>;

    /// Efface l'écran (noir)
    fn clear(&mut self) -> Result<()>;

    fn mode(&self) -> DisplayMode;

    fn name(&self) -> &'static str;

    /// La surface hôte a changé de taille
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Crée les backends à la demande
pub trait DisplayFactory {
    fn create(&mut self, mode: DisplayMode) -> Result<Box<dyn DisplayBackend>, FrontendError>;

    /// Dimensions du framebuffer émulé
    fn dimensions(&self) -> (u32, u32);
}

/// Backend courant et verrou de repli
pub struct DisplayManager {
    backend: Box<dyn DisplayBackend>,
    factory: Box<dyn DisplayFactory>,
    accelerated_unavailable: bool,
}

impl DisplayManager {
    pub fn new(mut factory: Box<dyn DisplayFactory>, requested: DisplayMode) -> Self {
        let mut accelerated_unavailable = false;
        let backend = open_backend(factory.as_mut(), requested, &mut accelerated_unavailable);
        Self {
            backend,
            factory,
            accelerated_unavailable,
        }
    }

    /// Change de mode. Renvoie le mode effectivement obtenu.
    pub fn set_mode(&mut self, mode: DisplayMode) -> DisplayMode {
        if self.accelerated_unavailable && mode == DisplayMode::Accelerated {
            info!("Affichage accéléré indisponible pour cette session, mode logiciel conservé");
        }
        if mode == self.backend.mode() || (self.accelerated_unavailable && self.backend.mode() == DisplayMode::Software) {
            return self.backend.mode();
        }
        // L'ancienne surface doit être libérée avant d'en créer une autre sur la même fenêtre
        let (width, height) = self.factory.dimensions();
        drop(std::mem::replace(&mut self.backend, Box::new(HeadlessDisplay::new(width, height))));
        self.backend = open_backend(self.factory.as_mut(), mode, &mut self.accelerated_unavailable);
        self.backend.mode()
    }

    pub fn backend(&self) -> &dyn DisplayBackend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn DisplayBackend {
        self.backend.as_mut()
    }

    pub fn mode(&self) -> DisplayMode {
        self.backend.mode()
    }

    pub fn accelerated_unavailable(&self) -> bool {
        self.accelerated_unavailable
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
    }
}

fn open_backend(
    factory: &mut dyn DisplayFactory,
    requested: DisplayMode,
    accelerated_unavailable: &mut bool,
) -> Box<dyn DisplayBackend> {
    let mode = if *accelerated_unavailable {
        DisplayMode::Software
    } else {
        requested
    };

    match factory.create(mode) {
        Ok(backend) => {
            info!("Affichage {} initialisé ({})", backend.mode(), backend.name());
            return backend;
        }
        Err(e) => warn!("Affichage {} indisponible: {}", mode, e),
    }

    if mode == DisplayMode::Accelerated {
        *accelerated_unavailable = true;
        warn!("Repli définitif sur l'affichage logiciel");
        match factory.create(DisplayMode::Software) {
            Ok(backend) => return backend,
            Err(e) => warn!("Affichage logiciel indisponible: {}", e),
        }
    }

    let (width, height) = factory.dimensions();
    warn!("Aucune surface graphique, affichage en mémoire seulement");
    Box::new(HeadlessDisplay::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct FlakyFactory {
        accelerated_ok: bool,
        software_ok: bool,
        attempts: Rc<RefCell<Vec<DisplayMode>>>,
    }

    struct TaggedDisplay {
        inner: HeadlessDisplay,
        mode: DisplayMode,
    }

    impl DisplayBackend for TaggedDisplay {
        fn frame_buffer_mut(&mut self) -> &mut FrameBuffer {
            self.inner.frame_buffer_mut()
        }
        fn frame_buffer(&self) -> &FrameBuffer {
            self.inner.frame_buffer()
        }
        fn present(&mut self) -> Result<()> {
            self.inner.present()
        }
        fn clear(&mut self) -> Result<()> {
            self.inner.clear()
        }
        fn mode(&self) -> DisplayMode {
            self.mode
        }
        fn name(&self) -> &'static str {
            "tagged"
        }
    }

    impl DisplayFactory for FlakyFactory {
        fn create(&mut self, mode: DisplayMode) -> Result<Box<dyn DisplayBackend>, FrontendError> {
            self.attempts.borrow_mut().push(mode);
            let ok = match mode {
                DisplayMode::Accelerated => self.accelerated_ok,
                DisplayMode::Software => self.software_ok,
            };
            if ok {
                Ok(Box::new(TaggedDisplay { inner: HeadlessDisplay::new(4, 4), mode }))
            } else {
                Err(FrontendError::DisplayBackendUnavailable("pas d'adaptateur".into()))
            }
        }

        fn dimensions(&self) -> (u32, u32) {
            (4, 4)
        }
    }

    fn factory(accelerated_ok: bool, software_ok: bool) -> (Box<FlakyFactory>, Rc<RefCell<Vec<DisplayMode>>>) {
        let attempts = Rc::new(RefCell::new(Vec::new()));
        let factory = FlakyFactory { accelerated_ok, software_ok, attempts: attempts.clone() };
        (Box::new(factory), attempts)
    }

    #[test]
    fn test_accelerated_when_available() {
        let (factory, _) = factory(true, true);
        let manager = DisplayManager::new(factory, DisplayMode::Accelerated);
        assert_eq!(manager.mode(), DisplayMode::Accelerated);
        assert!(!manager.accelerated_unavailable());
    }

    #[test]
    fn test_fallback_is_permanent() {
        let (factory, attempts) = factory(false, true);
        let mut manager = DisplayManager::new(factory, DisplayMode::Accelerated);
        assert_eq!(manager.mode(), DisplayMode::Software);
        assert!(manager.accelerated_unavailable());

        // Une nouvelle demande ne retente pas le chemin accéléré
        assert_eq!(manager.set_mode(DisplayMode::Accelerated), DisplayMode::Software);
        assert_eq!(*attempts.borrow(), vec![DisplayMode::Accelerated, DisplayMode::Software]);
    }

    #[test]
    fn test_headless_when_nothing_works() {
        let (factory, _) = factory(false, false);
        let mut manager = DisplayManager::new(factory, DisplayMode::Accelerated);
        assert_eq!(manager.backend().name(), "headless");
        assert!(manager.backend_mut().present().is_ok());
    }

    #[test]
    fn test_switch_modes() {
        let (factory, attempts) = factory(true, true);
        let mut manager = DisplayManager::new(factory, DisplayMode::Accelerated);
        assert_eq!(manager.set_mode(DisplayMode::Software), DisplayMode::Software);
        assert_eq!(manager.set_mode(DisplayMode::Software), DisplayMode::Software);
        assert_eq!(manager.set_mode(DisplayMode::Accelerated), DisplayMode::Accelerated);
        assert_eq!(attempts.borrow().len(), 3);
    }

    /// Fabrique qui refuse une seconde surface tant que la première vit
    struct ExclusiveFactory {
        live: Rc<Cell<u32>>,
    }

    struct ExclusiveDisplay {
        inner: HeadlessDisplay,
        mode: DisplayMode,
        live: Rc<Cell<u32>>,
    }

    impl Drop for ExclusiveDisplay {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    impl DisplayBackend for ExclusiveDisplay {
        fn frame_buffer_mut(&mut self) -> &mut FrameBuffer {
            self.inner.frame_buffer_mut()
        }
        fn frame_buffer(&self) -> &FrameBuffer {
            self.inner.frame_buffer()
        }
        fn present(&mut self) -> Result<()> {
            self.inner.present()
        }
        fn clear(&mut self) -> Result<()> {
            self.inner.clear()
        }
        fn mode(&self) -> DisplayMode {
            self.mode
        }
        fn name(&self) -> &'static str {
            "exclusive"
        }
    }

    impl DisplayFactory for ExclusiveFactory {
        fn create(&mut self, mode: DisplayMode) -> Result<Box<dyn DisplayBackend>, FrontendError> {
            if self.live.get() > 0 {
                return Err(FrontendError::DisplayBackendUnavailable("fenêtre déjà utilisée".into()));
            }
            self.live.set(self.live.get() + 1);
            Ok(Box::new(ExclusiveDisplay { inner: HeadlessDisplay::new(4, 4), mode, live: self.live.clone() }))
        }

        fn dimensions(&self) -> (u32, u32) {
            (4, 4)
        }
    }

    #[test]
    fn test_switch_releases_previous_surface() {
        let live = Rc::new(Cell::new(0));
        let factory = ExclusiveFactory { live: live.clone() };
        let mut manager = DisplayManager::new(Box::new(factory), DisplayMode::Accelerated);

        assert_eq!(manager.set_mode(DisplayMode::Software), DisplayMode::Software);
        assert_eq!(manager.backend().name(), "exclusive");
        assert_eq!(manager.set_mode(DisplayMode::Accelerated), DisplayMode::Accelerated);
        assert!(!manager.accelerated_unavailable());
        assert_eq!(live.get(), 1);
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(DisplayMode::Accelerated.toggled(), DisplayMode::Software);
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            mode: DisplayMode,
        }
        let text = toml::to_string(&Wrapper { mode: DisplayMode::Software }).unwrap();
        assert_eq!(text.trim(), "mode = \"software\"");
    }
}
