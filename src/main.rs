// src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rpmprobe::extract::Options;
use rpmprobe::metadata::{Dependency, FileTable};
use rpmprobe::Package;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// RPM lead magic (first 4 bytes of every package)
const RPM_MAGIC: [u8; 4] = [0xED, 0xAB, 0xEE, 0xDB];

#[derive(Parser)]
#[command(name = "rpmprobe")]
#[command(author, version, about = "Inspect RPM package metadata and contents", long_about = None)]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Base directory for extracted trees (default: system temp dir)
    #[arg(short, long, global = true)]
    workdir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show requires, prereq, conflicts and provides
    Deps {
        /// Package files
        #[arg(required = true)]
        packages: Vec<PathBuf>,
    },
    /// List packaged files by category
    Files {
        /// Package file
        package: PathBuf,
    },
    /// Extract a package and report the type of each file
    Identify {
        /// Package file
        package: PathBuf,
        /// Seconds allowed for each external tool run
        #[arg(short, long, default_value_t = 120)]
        timeout: u64,
    },
    /// Search extracted files for a regular expression
    Grep {
        /// Regular expression
        pattern: String,
        /// Package file
        package: PathBuf,
    },
}

#[derive(Serialize)]
struct DepsReport<'a> {
    name: &'a str,
    requires: &'a [Dependency],
    prereq: &'a [Dependency],
    conflicts: &'a [Dependency],
    provides: &'a [Dependency],
}

/// Check for the RPM lead magic before handing the file to the parser
fn is_rpm_file(path: &Path) -> Result<bool> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() {
        return Ok(false);
    }
    Ok(magic == RPM_MAGIC)
}

fn open_package(path: &Path, workdir: &Path, options: Options) -> Result<Package> {
    if !is_rpm_file(path)? {
        return Err(anyhow::anyhow!("Not an RPM package: {}", path.display()));
    }
    Ok(Package::open_with(path, workdir, options)?)
}

fn print_relations(label: &str, deps: &[Dependency]) {
    println!("  {} ({}):", label, deps.len());
    for dep in deps {
        println!("    {}", dep);
    }
}

fn print_list(label: &str, paths: &[String]) {
    println!("  {} ({}):", label, paths.len());
    for path in paths {
        println!("    {}", path);
    }
}

fn file_categories(table: &FileTable) -> [(&'static str, &[String]); 4] {
    [
        ("Config", table.config.as_slice()),
        ("Doc", table.doc.as_slice()),
        ("Ghost", table.ghost.as_slice()),
        ("Plain", table.plain.as_slice()),
    ]
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let workdir = cli.workdir.unwrap_or_else(std::env::temp_dir);

    match cli.command {
        Some(Commands::Deps { packages }) => {
            for package_path in &packages {
                let pkg = open_package(package_path, &workdir, Options::default())?;
                let deps = pkg.dependencies()?;

                if cli.json {
                    let report = DepsReport {
                        name: pkg.name(),
                        requires: &deps.requires,
                        prereq: &deps.prereq,
                        conflicts: &deps.conflicts,
                        provides: &deps.provides,
                    };
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    println!("{}:", pkg.name());
                    print_relations("Requires", &deps.requires);
                    print_relations("Prereq", &deps.prereq);
                    print_relations("Conflicts", &deps.conflicts);
                    print_relations("Provides", &deps.provides);
                }
            }
            Ok(())
        }
        Some(Commands::Files { package }) => {
            let pkg = open_package(&package, &workdir, Options::default())?;
            let table = pkg.file_table()?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(table)?);
            } else {
                println!("{}: {} file(s)", pkg.name(), table.len());
                for record in table.files.values() {
                    print!(
                        "  {:06o} {:>8} {:>8} {}",
                        record.mode, record.owner, record.group, record.path
                    );
                    if !record.link_target.is_empty() {
                        print!(" -> {}", record.link_target);
                    }
                    println!();
                }
                for (label, paths) in file_categories(table) {
                    print_list(label, paths);
                }
            }
            Ok(())
        }
        Some(Commands::Identify { package, timeout }) => {
            let options = Options {
                extract_timeout: Duration::from_secs(timeout),
                identify_timeout: Duration::from_secs(timeout),
                ..Options::default()
            };
            let mut pkg = open_package(&package, &workdir, options)?;
            info!("Identifying files of {}", pkg.name());

            // Copy out before cleanup so the tree is removed on every path
            let result = pkg.files_info().map(<[_]>::to_vec);
            for warning in pkg.extraction_warnings() {
                eprintln!("warning: {}", warning);
            }
            pkg.cleanup();
            let files = result?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                for file in &files {
                    println!("{}: {}", file.path, file.description);
                }
            }
            Ok(())
        }
        Some(Commands::Grep { pattern, package }) => {
            let mut pkg = open_package(&package, &workdir, Options::default())?;

            let result = pkg.grep(&pattern);
            pkg.cleanup();
            let matches = result?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else {
                for path in &matches {
                    println!("{}", path);
                }
            }
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("rpmprobe v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'rpmprobe --help' for usage information");
            Ok(())
        }
    }
}
