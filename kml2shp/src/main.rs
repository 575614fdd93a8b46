//! Point d'entrée CLI pour kml2shp

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;

/// Convertir un document KML/KMZ en Shapefile ESRI (.shp/.shx/.dbf/.prj)
#[derive(Parser)]
#[command(name = "kml2shp")]
#[command(author, version)]
#[command(about = "Convertir des polygones KML/KMZ en Shapefile ESRI")]
#[command(
    long_about = "Extrait les placemarks polygones d'un document KML ou d'une archive KMZ et les encode en Shapefile (géométrie, index spatial, attributs, projection WGS84).\n\nSans argument, le chemin d'entrée est demandé interactivement."
)]
struct Cli {
    /// Chemin du fichier .kml ou .kmz (demandé interactivement si absent)
    input: Option<PathBuf>,

    /// Nom de base des fichiers de sortie (défaut: <entrée>_converted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    cli::cmd_convert(cli.input, cli.output)
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
