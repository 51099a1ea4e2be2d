//! Chargement des images programme (ROM)
//!
//! Les fichiers peuvent être bruts, compressés en gzip ou placés dans une
//! archive zip (le premier fichier de l'archive est retenu). La troncature
//! à la taille maximale est faite par le planificateur, pas ici.

use anyhow::{anyhow, Context, Result};
use crc32fast::Hasher;
use flate2::read::GzDecoder;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

use crate::pacing::speed::format_significant;

/// Limite de décompression, bien au-delà de toute ROM utile
pub const MAX_DECOMPRESSED_SIZE: u64 = 16 * 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];

/// Format détecté d'un fichier image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Raw,
    Gzip,
    Zip,
}

impl ImageFormat {
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(&GZIP_MAGIC) {
            ImageFormat::Gzip
        } else if bytes.starts_with(&ZIP_MAGIC) {
            ImageFormat::Zip
        } else {
            ImageFormat::Raw
        }
    }
}

/// Lit une image depuis le disque et la décompresse si besoin
pub fn read_image(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Lecture de l'image {}", path.display()))?;
    decode_image(bytes)
}

/// Décompresse une image selon son format détecté
pub fn decode_image(bytes: Vec<u8>) -> Result<Vec<u8>> {
    match ImageFormat::detect(&bytes) {
        ImageFormat::Raw => Ok(bytes),
        ImageFormat::Gzip => {
            let mut contents = Vec::new();
            GzDecoder::new(bytes.as_slice())
                .take(MAX_DECOMPRESSED_SIZE)
                .read_to_end(&mut contents)
                .context("Décompression gzip")?;
            Ok(contents)
        }
        ImageFormat::Zip => {
            let mut archive = ZipArchive::new(Cursor::new(bytes)).context("Archive zip")?;
            for i in 0..archive.len() {
                let entry = archive.by_index(i)?;
                if entry.is_dir() {
                    continue;
                }
                let mut contents = Vec::new();
                entry.take(MAX_DECOMPRESSED_SIZE).read_to_end(&mut contents)?;
                return Ok(contents);
            }
            Err(anyhow!("Archive zip sans fichier"))
        }
    }
}

/// CRC32 de l'image, pour les journaux
pub fn image_checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Libellé de taille: octets sous 1 Kio, sinon Kio à 4 chiffres significatifs
pub fn format_image_size(len: usize) -> String {
    if len < 1024 {
        format!("{} octets", len)
    } else {
        format!("{} Kio", format_significant(len as f64 / 1024.0, 4))
    }
}
