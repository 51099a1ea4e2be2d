//! Erreurs du front-end
//!
//! Aucune de ces erreurs n'est fatale pour l'émulation: les commandes
//! rejetées sont des no-op, les échecs d'affichage déclenchent un repli.

use thiserror::Error;

/// Erreurs du domaine front-end
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontendError {
    /// Run ou Step demandé sans image chargée
    #[error("aucune image chargée")]
    NoImageLoaded,

    /// Step demandé pendant l'exécution continue
    #[error("pas-à-pas impossible pendant l'exécution")]
    StepWhileRunning,

    /// Image plus grande que la taille maximale (tronquée, jamais renvoyée)
    #[error("image trop grande: {len} octets (max {max}), tronquée")]
    ImageTooLarge { len: usize, max: usize },

    /// Image de taille nulle
    #[error("image vide")]
    EmptyImage,

    /// Backend d'affichage indisponible
    #[error("backend d'affichage indisponible: {0}")]
    DisplayBackendUnavailable(String),

    /// Configuration incohérente
    #[error("configuration invalide: {0}")]
    InvalidConfig(String),
}

/// Résultat spécialisé du front-end
pub type FrontendResult<T> = std::result::Result<T, FrontendError>;
