use anyhow::{bail, Context, Result};
use log::info;
use std::env;
use std::path::PathBuf;

use pixel_vcomputer_rust::{
    config::FrontendConfig,
    display::DisplayMode,
    gui::{run_headless, EmulatorApp},
    machine::IdleMachine,
    rom,
};

/// Options de ligne de commande
#[derive(Debug, Default)]
struct Options {
    rom_path: Option<PathBuf>,
    config_path: Option<String>,
    software: bool,
    headless_ticks: Option<u32>,
    snapshot: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--rom" => options.rom_path = Some(PathBuf::from(value(&mut iter, arg)?)),
            "--config" => options.config_path = Some(value(&mut iter, arg)?.to_string()),
            "--software" => options.software = true,
            "--headless" => {
                let ticks = value(&mut iter, arg)?;
                options.headless_ticks = Some(
                    ticks
                        .parse()
                        .with_context(|| format!("--headless attend un nombre de ticks, reçu {}", ticks))?,
                );
            }
            "--snapshot" => options.snapshot = Some(PathBuf::from(value(&mut iter, arg)?)),
            other => bail!("Option inconnue: {}", other),
        }
    }
    Ok(options)
}

fn value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<&'a str> {
    iter.next()
        .map(String::as_str)
        .with_context(|| format!("{} attend une valeur", flag))
}

fn main() -> Result<()> {
    // Initialiser le logging
    env_logger::init();
    info!("Démarrage de Pixel VComputer {}", pixel_vcomputer_rust::VERSION);

    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args)?;

    let mut config = match &options.config_path {
        Some(path) => FrontendConfig::load_from_file(path)?,
        None => FrontendConfig::load_or_default("config.toml"),
    };
    if options.software {
        config.video.display_mode = DisplayMode::Software;
    }

    if let Some(ticks) = options.headless_ticks {
        let image = match &options.rom_path {
            Some(path) => Some(rom::read_image(path)?),
            None => None,
        };
        let summary = run_headless(
            IdleMachine::new(),
            &config,
            image.as_deref(),
            ticks,
            options.snapshot.as_deref(),
        )?;
        for report in &summary.speed_reports {
            info!("Vitesse mesurée: {}", report.label());
        }
        return Ok(());
    }

    // Créer et lancer l'application
    EmulatorApp::new(config, options.rom_path).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("pixel-vcomputer")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let options = parse_args(&args(&["--rom", "demo.ffi", "--headless", "120", "--software"])).unwrap();
        assert_eq!(options.rom_path, Some(PathBuf::from("demo.ffi")));
        assert_eq!(options.headless_ticks, Some(120));
        assert!(options.software);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--rom"])).is_err());
        assert!(parse_args(&args(&["--headless", "beaucoup"])).is_err());
        assert!(parse_args(&args(&["--inconnu"])).is_err());
    }
}
