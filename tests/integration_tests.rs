//! Tests d'intégration du front-end

use pixel_vcomputer_rust::*;
use std::io::Write;

/// Test de sérialisation de configuration
#[test]
fn test_config_serialization() {
    let config = config::FrontendConfig::default();

    let toml_string = toml::to_string(&config).unwrap();
    assert!(toml_string.contains("cycle_floor"));
    assert!(toml_string.contains("display_mode = \"accelerated\""));

    let deserialized: config::FrontendConfig = toml::from_str(&toml_string).unwrap();
    assert_eq!(deserialized, config);
}

/// Une configuration incohérente est refusée au chargement
#[test]
fn test_invalid_config_file_rejected() {
    let mut config = config::FrontendConfig::default();
    config.pacing.cycle_floor = 1_000_000;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

    let result = config::FrontendConfig::load_from_file(path.to_str().unwrap());
    assert!(result.is_err());
    println!("✅ Configuration invalide refusée: {:#}", result.unwrap_err());
}

/// Session sans fenêtre complète: image gzip, exécution, capture PNG
#[test]
fn test_headless_session_with_gzip_image() {
    let dir = tempfile::tempdir().unwrap();
    let rom_path = dir.path().join("demo.ffi.gz");
    let payload = vec![0xFFu8; 4096];
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&payload).unwrap();
    std::fs::write(&rom_path, encoder.finish().unwrap()).unwrap();

    let image = rom::read_image(&rom_path).unwrap();
    assert_eq!(image, payload);

    let snapshot = dir.path().join("last.png");
    let mut config = config::FrontendConfig::default();
    config.pacing.frame_interval_ms = 10;

    let summary = gui::run_headless(
        machine::IdleMachine::new(),
        &config,
        Some(image.as_slice()),
        301,
        Some(snapshot.as_path()),
    )
    .unwrap();

    assert_eq!(summary.ticks, 301);
    assert_eq!(summary.frames_presented, 75);
    assert_eq!(summary.speed_reports.len(), 1);
    // Plancher au premier tick puis 1000 cycles par tick de 10 ms
    assert_eq!(summary.executed_cycles, 100 + 300 * 1000);

    let png = image::open(&snapshot).unwrap().to_rgba8();
    assert_eq!(png.dimensions(), (320, 240));
    assert_eq!(png.get_pixel(0, 0).0, [0xFF, 0xFF, 0xFF, 0xFF]);
    println!("✅ Session sans fenêtre: {} cycles", summary.executed_cycles);
}

/// Sans image, la session reste à l'arrêt mais l'écran est rafraîchi
#[test]
fn test_headless_session_without_image() {
    let config = config::FrontendConfig::default();
    let summary = gui::run_headless(machine::IdleMachine::new(), &config, None, 10, None).unwrap();
    assert_eq!(summary.executed_cycles, 0);
    // 9 intervalles de 16 ms = 144 ms, période de 40 ms
    assert_eq!(summary.frames_presented, 3);
}

/// Une image vide est refusée par la session
#[test]
fn test_headless_session_rejects_empty_image() {
    let config = config::FrontendConfig::default();
    let result = gui::run_headless(machine::IdleMachine::new(), &config, Some(&[0u8; 0][..]), 10, None);
    assert!(result.is_err());
}

/// Un intervalle de tick nul est refusé avant de démarrer la session
#[test]
fn test_headless_session_rejects_zero_interval() {
    let mut config = config::FrontendConfig::default();
    config.pacing.frame_interval_ms = 0;
    let result = gui::run_headless(machine::IdleMachine::new(), &config, Some(&[1u8, 2, 3][..]), 10, None);
    assert!(result.is_err());
}
