// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("rpmprobe")
        .version(env!("CARGO_PKG_VERSION"))
        .author("rpmprobe Contributors")
        .about("Inspect RPM package metadata and contents")
        .subcommand_required(false)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print JSON instead of text"),
        )
        .arg(
            Arg::new("workdir")
                .short('w')
                .long("workdir")
                .global(true)
                .value_name("DIR")
                .help("Base directory for extracted trees (default: system temp dir)"),
        )
        .subcommand(
            Command::new("deps")
                .about("Show requires, prereq, conflicts and provides")
                .arg(
                    Arg::new("packages")
                        .required(true)
                        .num_args(1..)
                        .help("Package files"),
                ),
        )
        .subcommand(
            Command::new("files")
                .about("List packaged files by category")
                .arg(Arg::new("package").required(true).help("Package file")),
        )
        .subcommand(
            Command::new("identify")
                .about("Extract a package and report the type of each file")
                .arg(Arg::new("package").required(true).help("Package file"))
                .arg(
                    Arg::new("timeout")
                        .short('t')
                        .long("timeout")
                        .default_value("120")
                        .help("Seconds allowed for each external tool run"),
                ),
        )
        .subcommand(
            Command::new("grep")
                .about("Search extracted files for a regular expression")
                .arg(Arg::new("pattern").required(true).help("Regular expression"))
                .arg(Arg::new("package").required(true).help("Package file")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("rpmprobe.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
