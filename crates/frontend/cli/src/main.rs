use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use emu_core::logging::{LogConfig, LogLevel};
use emu_core::settings::{
    native_values, HostOverrides, PropertyHandle, PropertySurface, RawSettingsInfo, SettingValue,
    Settings, SettingsCatalog, SettingsProfile, SyncSettings,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(about = "Inspect and edit core settings profiles")]
struct Args {
    /// Catalog dump reported by the native core (JSON)
    #[arg(long)]
    catalog: PathBuf,

    /// Settings profile to read and update
    #[arg(long, default_value = "settings.json")]
    profile: PathBuf,

    /// System whose host overrides apply: "pce", or "none"
    #[arg(long, default_value = "pce")]
    system: String,

    /// Core log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "off")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every property with its current value
    List,
    /// Print one property
    Get { name: String },
    /// Change one property and save the profile
    Set { name: String, value: String },
    /// Reset one property to its default and save the profile
    Reset { name: String },
    /// Print the key/value map the native core would receive
    Flatten,
}

/// Both surfaces for one catalog
struct Surfaces {
    sync: PropertySurface<SyncSettings>,
    layers: PropertySurface<Settings>,
}

fn host_overrides(system: &str) -> Result<HostOverrides> {
    match system {
        "pce" => Ok(emu_pce::host_overrides()),
        "none" => Ok(HostOverrides::new()),
        other => bail!("Unsupported system: {}", other),
    }
}

fn load_catalog(path: &Path, host: &HostOverrides) -> Result<SettingsCatalog> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let raw = RawSettingsInfo::from_json(&json)?;
    Ok(host.catalog(raw)?)
}

fn format_value<T>(handle: &PropertyHandle<T>, instance: &T) -> String {
    match handle.get(instance) {
        Ok(value) => {
            let marker = if handle.is_overridden(instance) { "*" } else { " " };
            format!("{} {}", marker, value)
        }
        Err(e) => format!("! {}", e),
    }
}

fn parse_value<T>(handle: &PropertyHandle<T>, text: &str) -> Result<SettingValue> {
    SettingValue::parse_as(handle.value_type(), text).ok_or_else(|| {
        anyhow!(
            "`{}` is not a valid {:?} value for {}",
            text,
            handle.value_type(),
            handle.name()
        )
    })
}

fn list(out: &mut impl Write, surfaces: &Surfaces, profile: &SettingsProfile) -> Result<()> {
    let mut category = "";
    for handle in surfaces.sync.iter() {
        if handle.category().as_str() != category {
            category = handle.category().as_str();
            writeln!(out, "[{}]", category)?;
        }
        writeln!(
            out,
            "  {:<28} {}",
            handle.name(),
            format_value(handle, &profile.sync_settings)
        )?;
    }
    if !surfaces.layers.is_empty() {
        writeln!(out, "[Layers]")?;
    }
    for handle in surfaces.layers.iter() {
        writeln!(
            out,
            "  {:<28} {}",
            handle.name(),
            format_value(handle, &profile.settings)
        )?;
    }
    Ok(())
}

fn run(args: Args, out: &mut impl Write) -> Result<()> {
    let host = host_overrides(&args.system)?;
    let catalog = load_catalog(&args.catalog, &host)?;
    let surfaces = Surfaces {
        sync: PropertySurface::for_sync_settings(&catalog)?,
        layers: PropertySurface::for_settings(&catalog),
    };
    let mut profile = SettingsProfile::load_or_new(&args.profile, &args.system)?;
    log::debug!(
        "Loaded {} ({} sync properties, {} layers)",
        args.profile.display(),
        surfaces.sync.len(),
        surfaces.layers.len()
    );

    match args.command {
        Command::List => list(out, &surfaces, &profile)?,
        Command::Get { name } => {
            if let Some(handle) = surfaces.sync.find(&name) {
                writeln!(out, "{}", handle.get(&profile.sync_settings)?)?;
            } else if let Some(handle) = surfaces.layers.find(&name) {
                writeln!(out, "{}", handle.get(&profile.settings)?)?;
            } else {
                bail!("Unknown property: {}", name);
            }
        }
        Command::Set { name, value } => {
            if let Some(handle) = surfaces.sync.find(&name) {
                handle.set(&mut profile.sync_settings, parse_value(handle, &value)?)?;
            } else if let Some(handle) = surfaces.layers.find(&name) {
                handle.set(&mut profile.settings, parse_value(handle, &value)?)?;
            } else {
                bail!("Unknown property: {}", name);
            }
            profile.save(&args.profile)?;
            log::info!("Saved {}", args.profile.display());
        }
        Command::Reset { name } => {
            if let Some(handle) = surfaces.sync.find(&name) {
                handle.reset(&mut profile.sync_settings);
            } else if let Some(handle) = surfaces.layers.find(&name) {
                handle.reset(&mut profile.settings);
            } else {
                bail!("Unknown property: {}", name);
            }
            profile.save(&args.profile)?;
            log::info!("Saved {}", args.profile.display());
        }
        Command::Flatten => {
            let values = native_values(&catalog, &profile.sync_settings, &host);
            writeln!(out, "{}", serde_json::to_string_pretty(&values)?)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let level = LogLevel::from_str(&args.log_level)
        .ok_or_else(|| anyhow!("Invalid log level: {}", args.log_level))?;
    LogConfig::global().set_global_level(level);

    run(args, &mut io::stdout().lock())
}
