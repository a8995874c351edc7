use std::fs;
use std::path::PathBuf;

use clap::CommandFactory;

// cli.rs only depends on clap, so it can be compiled here on its own.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir: PathBuf = std::env::var_os("OUT_DIR")
        .expect("OUT_DIR not set by Cargo")
        .into();
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("failed to create man output directory");

    let mut buf = Vec::new();
    clap_mangen::Man::new(cli::Cli::command())
        .render(&mut buf)
        .unwrap_or_else(|e| panic!("failed to render man page: {e}"));
    let path = man_dir.join("pylo.1");
    fs::write(&path, buf).unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
}
