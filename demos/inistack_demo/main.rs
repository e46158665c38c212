//! # inistack demo application
//!
//! A sample CLI that drives [inistack](https://docs.rs/inistack) against a
//! real config directory. It exists to demonstrate and manually verify the
//! library, not as a finished tool.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example inistack_demo -- --config-dir MyGame/Config ini duplicates
//! RUST_LOG=inistack=debug cargo run --example inistack_demo -- --config-dir MyGame/Config ini resolve-all --save
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature              | How to exercise it                                              |
//! |----------------------|-----------------------------------------------------------------|
//! | Merged view          | `-- --config-dir DIR ini list`                                  |
//! | Layer list           | `-- --config-dir DIR ini files`                                 |
//! | Duplicate report     | `-- --config-dir DIR ini duplicates`                            |
//! | Resolve one key      | `-- --config-dir DIR ini resolve SECTION KEY -a delete --save`  |
//! | Disable a layer      | `-- --config-dir DIR ini --disable GameUserSettings.ini list`   |
//! | Insert a setting     | `-- --config-dir DIR ini insert SECTION KEY VALUE --save`       |
//! | Settings file        | `-- --settings inistack.toml --config-dir DIR ini files`        |
//! | Catalog search       | `-- search shadow --catalog cvar_cache.json`                    |
//! | Preset library       | `-- presets`                                                    |

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use inistack::{Catalog, IniArgs, Inistack, InistackBuilder, PresetLibrary};

/// inistack demo: inspect and clean up a layered INI config directory.
#[derive(Parser, Debug)]
#[command(name = "inistack-demo")]
struct Cli {
    /// Directory holding the layer files.
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    /// Engine settings file (TOML). Defaults apply when absent.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Accept unknown keys in the settings file.
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Work with the layered INI files.
    Ini(IniArgs),
    /// Search the settings catalog by name or description.
    Search {
        query: String,
        /// Indexer cache file.
        #[arg(long, default_value = "cvar_cache.json")]
        catalog: PathBuf,
    },
    /// List presets in the platform preset library.
    Presets,
}

fn make_builder(cli: &Cli) -> InistackBuilder {
    let mut builder = Inistack::builder().strict(!cli.lenient);
    if let Some(path) = &cli.settings {
        builder = builder.settings_file(path);
    }
    builder
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("{context}:\n{e}");
    std::process::exit(1);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let builder = make_builder(&cli);

    match cli.command {
        Commands::Ini(args) => {
            let actions = args.into_actions();
            builder
                .handle_and_print(&cli.config_dir, &actions)
                .unwrap_or_else(|e| fail("INI error", e));
        }
        Commands::Search { query, catalog } => {
            let catalog = Catalog::load(&catalog).unwrap_or_else(|e| fail("Catalog error", e));
            for entry in catalog.search(&query) {
                println!("{}  {}", entry.name, entry.description);
                if !entry.default.is_empty() {
                    println!("    default: {}", entry.default);
                }
            }
        }
        Commands::Presets => {
            let Some(library) = PresetLibrary::platform_default() else {
                fail("Preset error", "no platform config directory");
            };
            let presets = library.list().unwrap_or_else(|e| fail("Preset error", e));
            println!("{}", library.dir().display());
            for path in presets {
                println!("  {}", path.display());
            }
        }
    }
}
