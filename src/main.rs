mod core;
mod interp;
mod store;
#[cfg(test)]
mod test_support;
mod tui;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

use crate::core::config;
use crate::core::versions::VERSIONS;

#[derive(Parser)]
#[command(name = "zorkbridge", about = "Terminal bridge for the classic MDL Zork versions")]
struct Args {
    /// Game version to preselect (see --list)
    #[arg(short, long)]
    version: Option<String>,

    /// Directory holding one subdirectory per game version
    #[arg(short, long)]
    games_dir: Option<String>,

    /// List the known game versions and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    // Initialize file logger - writes to zorkbridge.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("zorkbridge.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    if args.list {
        for version in VERSIONS {
            println!("{:<16} {}", version.id, version.label);
        }
        return Ok(());
    }

    let file_config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()));
        }
    };
    let resolved = config::resolve(&file_config, args.version.as_deref(), args.games_dir.as_deref());
    log::info!("zorkbridge starting up, default version {}", resolved.default_version);

    tui::run(resolved).await
}
