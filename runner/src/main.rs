use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bhav::vm::{self, code::Disassembly};

#[derive(Parser)]
#[command(name = "runner")]
#[command(about = "Run a behavior tree project for a number of ticks", long_about = None)]
struct Cli {
    /// Project file (.json)
    project: PathBuf,

    /// Number of ticks to run
    #[arg(short = 't', long = "ticks", default_value_t = 1)]
    ticks: u64,

    /// Interpreter configuration (.json)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Random seed, overriding the configuration
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Print each tree's listing before running
    #[arg(short = 'd', long = "disassemble")]
    disassemble: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runner=info,bhav=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let read = fs::read(&cli.project)?;
    let project = project::read_json(&read[..])?;
    let instances = project.instances.clone();

    let mut config = match cli.config {
        Some(ref path) => serde_json::from_slice(&fs::read(path)?)?,
        None => vm::Config::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let registry = vm::Registry::with_builtins();
    let resources = bhav::build(project, &registry)?;
    if cli.disassemble {
        let mut trees: Vec<_> = resources.trees.values().collect();
        trees.sort_by_key(|tree| tree.id);
        for tree in trees {
            print!("{}", Disassembly(tree));
        }
    }

    let mut vm = vm::Vm::new(resources, registry, config);
    for object in instances {
        let id = vm.add_entity(object)?;
        info!(%id, object, "placed instance");
    }

    // Diagnostics are logged as they happen; only count them here.
    let mut errors = 0;
    for _ in 0..cli.ticks {
        vm.tick();
        errors += vm.take_diagnostics().len();
    }

    info!(ticks = vm.tick_count(), entities = vm.world().len(), errors, "finished");
    for id in vm.world().ids() {
        if let Some(entity) = vm.get_entity_by_id(id) {
            info!(%id, object = entity.object(), fields = ?entity.fields, "entity");
        }
    }
    Ok(())
}
