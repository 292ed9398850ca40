use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use spawn_editor::seeder::Seeder;
use spawn_editor::store::SpawnFileStore;
use spawn_editor::{gui, tui};

#[derive(Parser, Debug)]
#[command(name = "spawn_editor")]
#[command(about = "View and edit per-species spawn configuration files")]
struct Args {
    /// Directory holding the spawn files
    #[arg(long, default_value = ".default/spawn_pool_world")]
    data_dir: PathBuf,

    /// Run the terminal editor instead of the desktop window
    #[arg(long)]
    tui: bool,

    /// Seed missing files from the upstream repository and exit
    #[arg(long)]
    seed: bool,

    /// Wipe the data directory, re-seed everything and exit
    #[arg(long)]
    reset: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let store = SpawnFileStore::new(&args.data_dir);

    if args.seed || args.reset {
        let seeder = Seeder::new(store.dir());
        let mut progress = |p: spawn_editor::seeder::SeedProgress| println!("{}", p);
        let result = if args.reset {
            seeder.reset_all(&mut progress)
        } else {
            seeder.ensure_seeded(&mut progress)
        };
        match result {
            Ok(report) => {
                println!(
                    "Done! {} downloaded, {} blank(s) created, {} file(s) in {}",
                    report.spawn_files_written,
                    report.blanks_created,
                    report.total_files,
                    store.dir().display(),
                );
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                eprintln!("Seeding failed: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    if args.tui {
        if let Err(e) = tui::run_tui(store) {
            eprintln!("Editor error: {}", e);
            return ExitCode::FAILURE;
        }
    } else if let Err(e) = gui::run(store) {
        eprintln!("Editor error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
