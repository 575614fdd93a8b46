//! Types d'erreurs pour le crate kmlshape

use std::path::PathBuf;
use thiserror::Error;

/// Erreurs pouvant survenir lors d'une conversion KML/KMZ → Shapefile
#[derive(Debug, Error)]
pub enum KmlShapeError {
    /// Erreur d'I/O lors de la lecture du fichier source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive KMZ corrompue ou format zip invalide
    #[error("Invalid KMZ archive: {0}")]
    InvalidArchive(String),

    /// Aucune entrée .kml dans l'archive KMZ
    #[error("No .kml document found in archive: {0}")]
    NoDocumentInArchive(String),

    /// Texte indécodable sous les encodages tentés
    #[error("Text decoding failed: {0}")]
    Encoding(String),

    /// Document XML malformé
    #[error("XML parse error: {reason}")]
    XmlParse { reason: String },

    /// L'extraction n'a produit aucun polygone valide
    #[error("No polygon shapes found in document")]
    NoShapes,

    /// Fichier de sortie inscriptible
    #[error("Cannot write output {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl KmlShapeError {
    /// Crée une erreur de parsing XML avec contexte
    pub fn xml_parse(reason: impl Into<String>) -> Self {
        Self::XmlParse {
            reason: reason.into(),
        }
    }

    /// Crée une erreur de sortie avec le chemin concerné
    pub fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}
