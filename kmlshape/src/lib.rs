//! # kmlshape
//!
//! Conversion de géométries vectorielles KML/KMZ vers le quartet
//! Shapefile ESRI (.shp, .shx, .dbf, .prj).
//!
//! ## Features
//!
//! - Extraction tolérante des anneaux de polygones depuis du XML aux
//!   namespaces incohérents (comparaison par nom local de balise)
//! - Lecture des archives KMZ (zip) entièrement en mémoire
//! - Encodage binaire octet-exact à endianness mixte, longueurs
//!   déclarées dérivées du schéma de layout
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kmlshape::convert;
//! use std::path::Path;
//!
//! let result = convert(Path::new("parcels.kmz"), Path::new("out/parcels_converted"))?;
//! println!("{} polygons -> {}", result.shape_count, result.files.shp.display());
//! ```

pub mod archive;
pub mod error;
pub mod parser;
pub mod repair;
pub mod shapefile;
pub mod types;

pub use error::KmlShapeError;
pub use types::{Conversion, Dataset, FileSet, Record, Ring};

use std::path::Path;
use tracing::info;

/// Convertit un document KML ou KMZ en Shapefile.
///
/// Pipeline strictement séquentiel, sans état partagé entre appels:
/// chargement → extraction → encodage.
///
/// # Arguments
///
/// * `input` - Chemin vers le fichier .kml ou .kmz source
/// * `output_base` - Nom de base des quatre fichiers de sortie
///   (l'extension éventuelle est remplacée)
///
/// # Errors
///
/// Retourne `KmlShapeError` si la source est illisible, le XML
/// malformé, aucun polygone valide extrait, ou la sortie
/// inscriptible. Les tokens et placemarks invalides sont absorbés
/// pendant l'extraction et ne remontent jamais.
pub fn convert(input: &Path, output_base: &Path) -> Result<Conversion, KmlShapeError> {
    let document = archive::load(input)?;

    let dataset = parser::extract(&document)?;
    info!(
        input = %input.display(),
        shapes = dataset.len(),
        "Extracted polygon placemarks"
    );

    let files = shapefile::encode(&dataset, output_base)?;

    Ok(Conversion {
        shape_count: dataset.len(),
        files,
    })
}
