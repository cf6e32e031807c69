//! handy_codes: interactive entry point.

use std::path::PathBuf;

use anyhow::Context;
use handy_codes::app::run;
use handy_codes::logging;
use handy_codes::settings::{Backend, Settings, DEFAULT_SETTINGS_FILE};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          HandyCodes — Gesture-Driven Code Editor             ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let settings = match load_settings(std::env::args().skip(1)) {
        Ok(s)  => s,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    };

    logging::init(settings.debug_logging);

    match settings.backend {
        Backend::Sim     => println!("  Mode: Keyboard simulation  (F1–F7 pose the hand, --sidecar for a real camera)"),
        Backend::Sidecar => println!("  Mode: Landmark sidecar  ({})", settings.sidecar_script.display()),
    }
    println!("  Hold {:.1}s to fire, {:.1}s cooldown", settings.hold_secs, settings.cooldown_secs);
    println!();
    println!("  Opening editor window…");
    println!();

    if let Err(e) = run(&settings) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Settings file (unless `--quick`), then command-line overrides.
fn load_settings(args: impl Iterator<Item = String>) -> anyhow::Result<Settings> {
    let args: Vec<String> = args.collect();

    let mut path = PathBuf::from(DEFAULT_SETTINGS_FILE);
    let mut quick = false;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--settings" => {
                path = it.next().map(PathBuf::from).context("--settings needs a path")?;
            }
            "--quick" => quick = true,
            _ => {}
        }
    }

    let mut settings = if quick {
        println!("  Quick-start: default settings, settings file ignored\n");
        Settings::default()
    } else {
        Settings::load(&path)?
    };

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--sidecar" => settings.backend = Backend::Sidecar,
            "--debug"   => settings.debug_logging = true,
            "--camera"  => {
                let n = it.next().context("--camera needs an index")?;
                settings.camera = n.parse().with_context(|| format!("bad camera index {:?}", n))?;
            }
            "--settings" => { it.next(); }
            "--quick"    => {}
            other => anyhow::bail!("unknown argument {:?}", other),
        }
    }
    Ok(settings)
}
