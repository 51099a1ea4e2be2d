//! Traduction des entrées clavier de l'hôte en événements du périphérique

pub mod host;
pub mod scancodes;

use bitflags::bitflags;

use scancodes::*;
pub use scancodes::ScanCodeTable;

/// Code de touche de l'hôte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostKey(pub u32);

bitflags! {
    /// Modificateurs maintenus, disposition des bits du périphérique
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierMask: u8 {
        const SHIFT = 0x1;
        const CTRL = 0x2;
        const ALT = 0x4;
    }
}

/// Événement clavier tel que le périphérique le reçoit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceKeyEvent {
    pub scan_code: u16,
    pub key_code: u8,
    pub modifiers: ModifierMask,
}

impl DeviceKeyEvent {
    /// Mot du tampon clavier: `mods << 24 | key_code << 16 | scan_code`
    pub fn encode(&self) -> u32 {
        (u32::from(self.modifiers.bits() & 0x7) << 24)
            | (u32::from(self.key_code) << 16)
            | u32::from(self.scan_code)
    }
}

/// Modificateur associé à un scan code, avec son code de touche
fn modifier_for(scan_code: u16) -> Option<(ModifierMask, u8)> {
    match scan_code {
        SCAN_LEFT_SHIFT | SCAN_RIGHT_SHIFT => Some((ModifierMask::SHIFT, KEY_SHIFT)),
        SCAN_LEFT_CONTROL | SCAN_RIGHT_CONTROL => Some((ModifierMask::CTRL, KEY_CONTROL)),
        SCAN_LEFT_ALT | SCAN_RIGHT_ALT => Some((ModifierMask::ALT, KEY_ALT)),
        _ => None,
    }
}

/// Traducteur clavier: état des modificateurs et dernier scan code
#[derive(Debug, Clone, Default)]
pub struct KeyTranslator {
    table: ScanCodeTable,
    modifiers: ModifierMask,
    last_scan_code: Option<u16>,
}

impl KeyTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Touche enfoncée. Renvoie un événement immédiat pour un modificateur.
    pub fn key_down(&mut self, host: HostKey) -> Option<DeviceKeyEvent> {
        let scan_code = self.table.resolve(host);
        self.last_scan_code = Some(scan_code);

        let (flag, key_code) = modifier_for(scan_code)?;
        self.modifiers.insert(flag);
        Some(DeviceKeyEvent {
            scan_code,
            key_code,
            modifiers: self.modifiers,
        })
    }

    /// Touche relâchée: seul le masque change
    pub fn key_up(&mut self, host: HostKey) {
        let scan_code = self.table.resolve(host);
        if let Some((flag, _)) = modifier_for(scan_code) {
            self.modifiers.remove(flag);
        }
    }

    /// Caractère produit par la dernière touche enfoncée
    pub fn key_press(&mut self, ch: char) -> DeviceKeyEvent {
        let scan_code = self.last_scan_code.unwrap_or(SCAN_UNKNOWN);
        let key_code = control_override(scan_code).unwrap_or_else(|| {
            u8::try_from(u32::from(ch)).unwrap_or(KEY_UNKNOWN)
        });
        DeviceKeyEvent {
            scan_code,
            key_code,
            modifiers: self.modifiers,
        }
    }

    /// Frappe synthétique pour une touche de contrôle sans texte (flèches...)
    pub fn control_press(&mut self) -> Option<DeviceKeyEvent> {
        let scan_code = self.last_scan_code?;
        control_override(scan_code)?;
        Some(self.key_press('\0'))
    }

    pub fn modifiers(&self) -> ModifierMask {
        self.modifiers
    }

    pub fn last_scan_code(&self) -> Option<u16> {
        self.last_scan_code
    }

    pub fn reset(&mut self) {
        self.modifiers = ModifierMask::empty();
        self.last_scan_code = None;
    }
}
