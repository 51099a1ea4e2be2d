//! Codes clavier du périphérique et table de traduction hôte → scan code

use std::collections::HashMap;

use super::HostKey;

// Scan codes du périphérique clavier
pub const SCAN_SPACE: u16 = 32;
pub const SCAN_APOSTROPHE: u16 = 39;
pub const SCAN_COMMA: u16 = 44;
pub const SCAN_MINUS: u16 = 45;
pub const SCAN_PERIOD: u16 = 46;
pub const SCAN_SLASH: u16 = 47;
pub const SCAN_SEMICOLON: u16 = 59;
pub const SCAN_EQUAL: u16 = 61;
pub const SCAN_LEFT_BRACKET: u16 = 91;
pub const SCAN_BACKSLASH: u16 = 92;
pub const SCAN_RIGHT_BRACKET: u16 = 93;
pub const SCAN_GRAVE_ACCENT: u16 = 96;
pub const SCAN_ESCAPE: u16 = 256;
pub const SCAN_ENTER: u16 = 257;
pub const SCAN_TAB: u16 = 258;
pub const SCAN_BACKSPACE: u16 = 259;
pub const SCAN_INSERT: u16 = 260;
pub const SCAN_DELETE: u16 = 261;
pub const SCAN_RIGHT: u16 = 262;
pub const SCAN_LEFT: u16 = 263;
pub const SCAN_DOWN: u16 = 264;
pub const SCAN_UP: u16 = 265;
pub const SCAN_KP_ENTER: u16 = 335;
pub const SCAN_LEFT_SHIFT: u16 = 340;
pub const SCAN_LEFT_CONTROL: u16 = 341;
pub const SCAN_LEFT_ALT: u16 = 342;
pub const SCAN_RIGHT_SHIFT: u16 = 344;
pub const SCAN_RIGHT_CONTROL: u16 = 345;
pub const SCAN_RIGHT_ALT: u16 = 346;
pub const SCAN_UNKNOWN: u16 = 0xFFFF;

// Codes de touche (caractères de contrôle) du périphérique
pub const KEY_UNKNOWN: u8 = 0x01;
pub const KEY_DELETE: u8 = 0x05;
pub const KEY_ALT: u8 = 0x06;
pub const KEY_BACKSPACE: u8 = 0x08;
pub const KEY_TAB: u8 = 0x09;
pub const KEY_RETURN: u8 = 0x0D;
pub const KEY_SHIFT: u8 = 0x0E;
pub const KEY_CONTROL: u8 = 0x0F;
pub const KEY_INSERT: u8 = 0x10;
pub const KEY_ARROW_UP: u8 = 0x12;
pub const KEY_ARROW_DOWN: u8 = 0x13;
pub const KEY_ARROW_LEFT: u8 = 0x14;
pub const KEY_ARROW_RIGHT: u8 = 0x15;
pub const KEY_ESC: u8 = 0x1B;

/// Touches non imprimables remappées sur un code de contrôle fixe
pub fn control_override(scan_code: u16) -> Option<u8> {
    match scan_code {
        SCAN_ENTER | SCAN_KP_ENTER => Some(KEY_RETURN),
        SCAN_UP => Some(KEY_ARROW_UP),
        SCAN_DOWN => Some(KEY_ARROW_DOWN),
        SCAN_LEFT => Some(KEY_ARROW_LEFT),
        SCAN_RIGHT => Some(KEY_ARROW_RIGHT),
        SCAN_BACKSPACE => Some(KEY_BACKSPACE),
        SCAN_TAB => Some(KEY_TAB),
        SCAN_ESCAPE => Some(KEY_ESC),
        SCAN_DELETE => Some(KEY_DELETE),
        SCAN_INSERT => Some(KEY_INSERT),
        _ => None,
    }
}

/// Table partielle code hôte → scan code.
///
/// Les codes absents de la table sont transmis tels quels: lettres et
/// chiffres partagent déjà la même numérotation des deux côtés. C'est une
/// approximation, pas une correspondance complète.
#[derive(Debug, Clone)]
pub struct ScanCodeTable {
    map: HashMap<u32, u16>,
}

impl ScanCodeTable {
    pub fn new() -> Self {
        let map = [
            (8, SCAN_BACKSPACE),
            (9, SCAN_TAB),
            (13, SCAN_ENTER),
            (16, SCAN_LEFT_SHIFT),
            (17, SCAN_LEFT_CONTROL),
            (18, SCAN_LEFT_ALT),
            (27, SCAN_ESCAPE),
            (32, SCAN_SPACE),
            (37, SCAN_LEFT),
            (38, SCAN_UP),
            (39, SCAN_RIGHT),
            (40, SCAN_DOWN),
            (45, SCAN_INSERT),
            (46, SCAN_DELETE),
            (186, SCAN_SEMICOLON),
            (187, SCAN_EQUAL),
            (188, SCAN_COMMA),
            (189, SCAN_MINUS),
            (190, SCAN_PERIOD),
            (191, SCAN_SLASH),
            (192, SCAN_GRAVE_ACCENT),
            (219, SCAN_LEFT_BRACKET),
            (220, SCAN_BACKSLASH),
            (221, SCAN_RIGHT_BRACKET),
            (222, SCAN_APOSTROPHE),
        ]
        .into_iter()
        .collect();
        Self { map }
    }

    /// Ajoute ou remplace une entrée
    pub fn insert(&mut self, host: HostKey, scan_code: u16) {
        self.map.insert(host.0, scan_code);
    }

    pub fn resolve(&self, host: HostKey) -> u16 {
        match self.map.get(&host.0) {
            Some(&scan) => scan,
            None => u16::try_from(host.0).unwrap_or(SCAN_UNKNOWN),
        }
    }
}

impl Default for ScanCodeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_codes() {
        let table = ScanCodeTable::new();
        assert_eq!(table.resolve(HostKey(13)), SCAN_ENTER);
        assert_eq!(table.resolve(HostKey(38)), SCAN_UP);
        assert_eq!(table.resolve(HostKey(16)), SCAN_LEFT_SHIFT);
        assert_eq!(table.resolve(HostKey(222)), SCAN_APOSTROPHE);
    }

    #[test]
    fn test_unmapped_codes_pass_through() {
        let table = ScanCodeTable::new();
        // 'A' et '7' ont la même valeur côté hôte et côté périphérique
        assert_eq!(table.resolve(HostKey(65)), 65);
        assert_eq!(table.resolve(HostKey(55)), 55);
        assert_eq!(table.resolve(HostKey(112)), 112);
        assert_eq!(table.resolve(HostKey(0x1_0000)), SCAN_UNKNOWN);
    }

    #[test]
    fn test_table_is_extensible() {
        let mut table = ScanCodeTable::new();
        table.insert(HostKey(112), 290);
        assert_eq!(table.resolve(HostKey(112)), 290);
    }

    #[test]
    fn test_control_overrides() {
        assert_eq!(control_override(SCAN_ENTER), Some(KEY_RETURN));
        assert_eq!(control_override(SCAN_UP), Some(0x12));
        assert_eq!(control_override(SCAN_DOWN), Some(0x13));
        assert_eq!(control_override(SCAN_LEFT), Some(0x14));
        assert_eq!(control_override(SCAN_RIGHT), Some(0x15));
        assert_eq!(control_override(65), None);
    }
}
