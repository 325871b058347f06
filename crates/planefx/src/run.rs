use anyhow::{Context, Result};
use demoset::{AntialiasSetting, DemoSet, ResolvedDemo};
use tracing_subscriber::EnvFilter;
use viewer::{Antialiasing, Viewer, ViewerConfig};

use crate::cli::Cli;

const DEFAULT_SURFACE_SIZE: (u32, u32) = (1280, 720);

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let catalog = load_catalog(&cli)?;

    if cli.list {
        return list_demos(&catalog);
    }

    let name = cli
        .demo
        .clone()
        .or_else(|| catalog.default_demo().map(str::to_string))
        .context("no demo requested and the catalog defines no default")?;
    let demo = catalog.resolve(&name)?;

    tracing::info!(demo = %demo.name, effect = %demo.effect, "launching viewer");
    Viewer::new(viewer_config(&cli, demo)).run()
}

fn load_catalog(cli: &Cli) -> Result<DemoSet> {
    match &cli.config {
        Some(path) => DemoSet::from_path(path)
            .with_context(|| format!("failed to load catalog {}", path.display())),
        None => Ok(DemoSet::builtin()),
    }
}

fn list_demos(catalog: &DemoSet) -> Result<()> {
    println!("Available demos:");
    for name in catalog.names() {
        let demo = catalog.resolve(name)?;
        let marker = if catalog.default_demo() == Some(name) {
            "*"
        } else {
            " "
        };
        let texture = demo
            .texture
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{marker} {name:<16} effect={:<12} texture={texture}",
            demo.effect.name()
        );
    }
    Ok(())
}

fn viewer_config(cli: &Cli, demo: ResolvedDemo) -> ViewerConfig {
    let antialiasing = cli.antialias.unwrap_or_else(|| {
        demo.antialias
            .map(antialias_from_setting)
            .unwrap_or_default()
    });

    ViewerConfig {
        title: format!("planefx - {}", demo.name),
        surface_size: cli.size.unwrap_or(DEFAULT_SURFACE_SIZE),
        effect: demo.effect,
        texture: cli.texture.clone().or(demo.texture),
        palette: demo.palette,
        target_fps: cli.fps.or(demo.fps).filter(|fps| *fps > 0.0),
        antialiasing,
        seed: cli.seed,
    }
}

fn antialias_from_setting(setting: AntialiasSetting) -> Antialiasing {
    match setting.samples() {
        None => Antialiasing::Auto,
        Some(0) | Some(1) => Antialiasing::Off,
        Some(samples) => Antialiasing::Samples(samples),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli_from(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("planefx").chain(args.iter().copied()))
    }

    #[test]
    fn antialias_settings_map_to_viewer_policy() {
        assert_eq!(
            antialias_from_setting(AntialiasSetting::Auto),
            Antialiasing::Auto
        );
        assert_eq!(
            antialias_from_setting(AntialiasSetting::Off),
            Antialiasing::Off
        );
        assert_eq!(
            antialias_from_setting(AntialiasSetting::Samples8),
            Antialiasing::Samples(8)
        );
    }

    #[test]
    fn cli_overrides_take_precedence_over_the_catalog() {
        let catalog = DemoSet::builtin();
        let demo = catalog.resolve("aberration").unwrap();

        let cli = cli_from(&[
            "aberration",
            "--size",
            "640x480",
            "--fps",
            "30",
            "--antialias",
            "off",
            "--texture",
            "override.png",
        ]);
        let config = viewer_config(&cli, demo);

        assert_eq!(config.surface_size, (640, 480));
        assert_eq!(config.target_fps, Some(30.0));
        assert_eq!(config.antialiasing, Antialiasing::Off);
        assert_eq!(
            config.texture.as_deref(),
            Some(std::path::Path::new("override.png"))
        );
    }

    #[test]
    fn catalog_values_fill_unset_flags() {
        let catalog = DemoSet::builtin();
        let demo = catalog.resolve("lava-lamp").unwrap();
        let expected_fps = demo.fps;

        let cli = cli_from(&["lava-lamp"]);
        let config = viewer_config(&cli, demo);

        assert_eq!(config.surface_size, DEFAULT_SURFACE_SIZE);
        assert_eq!(config.target_fps, expected_fps);
        assert!(config.palette.is_some());
    }

    #[test]
    fn zero_fps_disables_the_cap() {
        let catalog = DemoSet::builtin();
        let demo = catalog.resolve("wavy").unwrap();

        let cli = cli_from(&["wavy", "--fps", "0"]);
        let config = viewer_config(&cli, demo);
        assert_eq!(config.target_fps, None);
    }
}
