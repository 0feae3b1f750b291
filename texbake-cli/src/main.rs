//! Texbake CLI - Command-line interface
//!
//! Bakes source images into block-compressed DDS/KTX textures.
//! Exits with code 1 if any input failed.

mod commands;
mod error;

use clap::Parser;
use std::process;

use commands::bake::{self, BakeArgs};

#[derive(Parser)]
#[command(name = "texbake")]
#[command(version, about = "Bake images into mipmapped, block-compressed GPU textures", long_about = None)]
struct Cli {
    #[command(flatten)]
    bake: BakeArgs,
}

fn main() {
    let cli = Cli::parse();

    match bake::run(cli.bake) {
        Ok(false) => {}
        Ok(true) => process::exit(1),
        Err(e) => e.exit(),
    }
}
