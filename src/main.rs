//! AlienFX Lighting Control CLI
//!
//! Command-line interface for compiling themes and driving AlienFX lighting
//! controllers.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alienfx_rust::catalog::{Catalog, ComputerModel};
use alienfx_rust::config::{BackendKind, EngineConfig};
use alienfx_rust::device::{DeviceSession, UsbBus, bus_for};
use alienfx_rust::diagnostics::{BlockTester, ProbeOutcome, TestPlan};
use alienfx_rust::model::{Mode, Rgb};
use alienfx_rust::storage;
use alienfx_rust::utils::parsing::{parse_device_pair, parse_sub_id};

// =============================================================================
// CLI Arguments
// =============================================================================

/// AlienFX Lighting Control Tool
#[derive(Parser, Debug)]
#[command(name = "alienfx-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend: usb or simulated (overrides the config file)
    #[arg(short, long, global = true)]
    backend: Option<BackendKind>,

    /// Hardware catalog JSON (default: built-in models)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Computer model name (default: first model found on the bus)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Engine config JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List catalog models and their regions
    Models,

    /// Check which catalog models are connected
    Probe {
        /// Probe a single device instead, as VENDOR:PRODUCT (e.g. 187c:0512)
        #[arg(long, value_parser = parse_device_pair)]
        device: Option<(u16, u16)>,
    },

    /// Compile a theme and print the commands without sending them
    Compile {
        /// Path to the theme JSON
        theme: PathBuf,

        /// Effect tempo (1-1000)
        #[arg(short, long)]
        speed: Option<u16>,
    },

    /// Compile a theme and send it to the device
    Apply {
        /// Path to the theme JSON
        theme: PathBuf,

        /// Effect tempo (1-1000)
        #[arg(short, long)]
        speed: Option<u16>,
    },

    /// Turn every region off
    Off,

    /// Light a single zone
    TestZone {
        /// Region name (e.g. keyboard)
        region: String,

        /// Zone sub-id, hex (0x11) or decimal
        #[arg(value_parser = parse_sub_id)]
        zone: u8,

        /// Mode: fixed, blink or morph
        #[arg(long, default_value = "fixed")]
        mode: Mode,

        /// Effect tempo (1-1000)
        #[arg(short, long)]
        speed: Option<u16>,

        /// First color
        #[arg(long, default_value = "#FF0000")]
        color1: Rgb,

        /// Second color (morph target)
        #[arg(long, default_value = "#0000FF")]
        color2: Rgb,
    },

    /// Test every zone of the model, one at a time (Ctrl+C to stop)
    TestBlocks {
        /// Effect tempo (1-1000)
        #[arg(short, long)]
        speed: Option<u16>,

        /// First color
        #[arg(long, default_value = "#FF0000")]
        color1: Rgb,

        /// Second color (morph target)
        #[arg(long, default_value = "#0000FF")]
        color2: Rgb,

        /// Stop at the first failing zone
        #[arg(long)]
        stop_on_failure: bool,
    },
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let engine = Engine::load(&args)?;

    match args.command {
        Command::Models => cmd_models(&engine),
        Command::Probe { device } => cmd_probe(&engine, device),
        Command::Compile { theme, speed } => cmd_compile(&engine, &theme, speed),
        Command::Apply { theme, speed } => cmd_apply(&engine, &theme, speed),
        Command::Off => cmd_off(&engine),
        Command::TestZone {
            region,
            zone,
            mode,
            speed,
            color1,
            color2,
        } => cmd_test_zone(&engine, &region, zone, mode, speed, color1, color2),
        Command::TestBlocks {
            speed,
            color1,
            color2,
            stop_on_failure,
        } => cmd_test_blocks(&engine, speed, color1, color2, stop_on_failure),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "alienfx_rust=debug"
    } else {
        "alienfx_rust=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

// =============================================================================
// Engine
// =============================================================================

/// Everything a command needs, resolved from flags and the config file.
struct Engine {
    config: EngineConfig,
    catalog: Catalog,
    bus: Box<dyn UsbBus>,
    model_name: Option<String>,
}

impl Engine {
    fn load(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(backend) = args.backend {
            config.backend = backend;
        }

        let catalog = match &args.catalog {
            Some(path) => Catalog::load(path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?,
            None => Catalog::builtin(),
        };

        Ok(Self {
            bus: bus_for(config.backend),
            config,
            catalog,
            model_name: args.model.clone(),
        })
    }

    /// The selected model, or the first catalog model present on the bus.
    fn model(&self) -> Result<&ComputerModel> {
        if let Some(name) = &self.model_name {
            return Ok(self.catalog.find(name)?);
        }

        for model in self.catalog.models() {
            let mut tester = BlockTester::new(self.bus.as_ref(), model, self.config.session);
            if tester.probe(model.vendor_id, model.product_id)? == ProbeOutcome::Found {
                return Ok(model);
            }
        }
        bail!(
            "No catalog model found on the {} backend. Use --model or --backend simulated",
            self.config.backend
        )
    }

    fn open(&self, model: &ComputerModel) -> Result<DeviceSession> {
        DeviceSession::open(
            self.bus.as_ref(),
            model.vendor_id,
            model.product_id,
            &model.encoding,
            self.config.session,
        )
        .with_context(|| format!("Failed to open {}", model.name))
    }

    fn speed(&self, speed: Option<u16>) -> u16 {
        speed.unwrap_or(self.config.speed)
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

fn cmd_models(engine: &Engine) -> Result<()> {
    for model in engine.catalog.models() {
        println!("{}", model);
        for region in &model.regions {
            let modes: Vec<&str> = region.supported_modes().iter().map(|m| m.name()).collect();
            println!(
                "   {:<12} {:#04x}  {} slots  [{}]  {}",
                region.name,
                region.hex_id,
                region.max_commands,
                modes.join(", "),
                region.description
            );
        }
    }
    Ok(())
}

fn cmd_probe(engine: &Engine, device: Option<(u16, u16)>) -> Result<()> {
    let Some(first) = engine.catalog.models().first() else {
        bail!("Catalog is empty");
    };
    let mut tester = BlockTester::new(engine.bus.as_ref(), first, engine.config.session);

    if let Some((vendor_id, product_id)) = device {
        let outcome = tester
            .probe(vendor_id, product_id)
            .with_context(|| format!("Failed to probe {:04x}:{:04x}", vendor_id, product_id))?;
        match outcome {
            ProbeOutcome::Found => println!("✅ {:04x}:{:04x} {}", vendor_id, product_id, outcome),
            ProbeOutcome::NotFound => bail!(
                "{:04x}:{:04x} {} on the {} backend",
                vendor_id,
                product_id,
                outcome,
                engine.config.backend
            ),
        }
        return Ok(());
    }

    let table = tester
        .probe_catalog(&engine.catalog)
        .context("Failed to probe devices")?;

    println!("Probing {} backend:", engine.config.backend);
    for (name, outcome) in table {
        let mark = match outcome {
            ProbeOutcome::Found => "✅",
            ProbeOutcome::NotFound => "❌",
        };
        println!("{} {:<12} {}", mark, name, outcome);
    }
    Ok(())
}

fn load_program(
    engine: &Engine,
    model: &ComputerModel,
    path: &Path,
    speed: Option<u16>,
) -> Result<Vec<alienfx_rust::protocol::Command>> {
    let stored = storage::load_theme(path)
        .with_context(|| format!("Failed to read theme {}", path.display()))?;
    if !stored.model.eq_ignore_ascii_case(&model.name) {
        println!(
            "⚠️ Theme was written for {}, applying to {}",
            stored.model, model.name
        );
    }

    let theme = stored
        .into_theme(model)
        .context("Theme does not fit this model")?;
    let program = model
        .compiler()
        .program(&theme, engine.speed(speed))
        .context("Failed to compile theme")?;
    Ok(program)
}

fn cmd_compile(engine: &Engine, path: &Path, speed: Option<u16>) -> Result<()> {
    let model = engine.model()?;
    let program = load_program(engine, model, path, speed)?;

    for command in &program {
        println!("{}", command);
    }
    println!("✅ {} commands for {}", program.len(), model.name);
    Ok(())
}

fn cmd_apply(engine: &Engine, path: &Path, speed: Option<u16>) -> Result<()> {
    let model = engine.model()?;
    let program = load_program(engine, model, path, speed)?;

    let mut session = engine.open(model)?;
    session.send(&program).context("Failed to send theme")?;
    session.close();

    println!("✅ Theme applied to {} ({} commands)", model.name, program.len());
    Ok(())
}

fn cmd_off(engine: &Engine) -> Result<()> {
    let model = engine.model()?;
    let program = model.compiler().lights_off_program(&model.regions);

    let mut session = engine.open(model)?;
    session.send(&program).context("Failed to turn lights off")?;
    session.close();

    println!("✅ Lights off on {}", model.name);
    Ok(())
}

fn cmd_test_zone(
    engine: &Engine,
    region: &str,
    zone: u8,
    mode: Mode,
    speed: Option<u16>,
    color1: Rgb,
    color2: Rgb,
) -> Result<()> {
    let model = engine.model()?;
    let mut tester = BlockTester::new(engine.bus.as_ref(), model, engine.config.session);

    match tester.run_zone_test(region, zone, mode, engine.speed(speed), color1, color2) {
        Ok(()) => {
            println!("✅ {}[{:#04x}] {} {}/{}", region, zone, mode, color1, color2);
            Ok(())
        }
        Err(e) => {
            println!("❌ {}[{:#04x}] {}: {}", region, zone, mode, e);
            bail!("Zone test failed")
        }
    }
}

fn cmd_test_blocks(
    engine: &Engine,
    speed: Option<u16>,
    color1: Rgb,
    color2: Rgb,
    stop_on_failure: bool,
) -> Result<()> {
    let model = engine.model()?;
    let mut tester = BlockTester::new(engine.bus.as_ref(), model, engine.config.session);

    let cancel = Arc::new(AtomicBool::new(false));
    let c = cancel.clone();
    ctrlc::set_handler(move || {
        c.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    println!("🧪 Testing every zone of {} (Ctrl+C to stop)...", model.name);
    let plan = TestPlan {
        speed: engine.speed(speed),
        color1,
        color2,
        stop_on_failure,
    };
    let report = tester
        .run_catalog(&plan, &cancel)
        .context("Block test aborted")?;

    for outcome in &report.outcomes {
        match &outcome.error {
            None => println!("✅ {}[{:#04x}] {}", outcome.region, outcome.sub_id, outcome.mode),
            Some(e) => println!(
                "❌ {}[{:#04x}] {}: {}",
                outcome.region, outcome.sub_id, outcome.mode, e
            ),
        }
    }

    println!(
        "\n{} of {} zone tests passed{}",
        report.passed(),
        report.outcomes.len(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
    if let Some(e) = &report.turn_off_error {
        println!("❌ Failed to turn lights off: {}", e);
    }
    if report.failures().next().is_some() || report.turn_off_error.is_some() {
        bail!("Block test finished with failures");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_device_flag() {
        let args = Args::try_parse_from(["alienfx-cli", "probe", "--device", "187c:0512"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Probe {
                device: Some((0x187C, 0x0512))
            }
        ));

        let args = Args::try_parse_from(["alienfx-cli", "probe"]).unwrap();
        assert!(matches!(args.command, Command::Probe { device: None }));

        assert!(Args::try_parse_from(["alienfx-cli", "probe", "--device", "187c"]).is_err());
    }

    #[test]
    fn test_failed_zone_test_is_an_error() {
        let args = Args::try_parse_from(["alienfx-cli", "-b", "simulated", "-m", "simulated", "models"])
            .unwrap();
        let engine = Engine::load(&args).unwrap();

        assert!(cmd_test_zone(&engine, "keyboard", 0x10, Mode::Fixed, None, Rgb::WHITE, Rgb::WHITE).is_ok());
        assert!(cmd_test_zone(&engine, "keyboard", 0x0F, Mode::Fixed, None, Rgb::WHITE, Rgb::WHITE).is_err());
    }
}
