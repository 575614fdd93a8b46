//! Schéma de layout binaire du couple .shp/.shx
//!
//! Toutes les longueurs déclarées (en-tête de fichier, longueur de
//! contenu par enregistrement, offsets d'index) dérivent des mêmes
//! constantes que l'écriture elle-même: déclaré == réel par
//! construction.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use geo::Coord;
use std::io::Write;

use crate::types::Ring;

/// File code magique des fichiers .shp/.shx
pub const FILE_CODE: u32 = 9994;

/// Version du format
pub const VERSION: u32 = 1000;

/// Type de forme: polygone
pub const SHAPE_TYPE_POLYGON: u32 = 5;

/// En-tête de fichier: 100 octets = 50 mots de 16 bits
pub const HEADER_WORDS: u32 = 50;

/// En-tête d'enregistrement .shp (numéro + longueur): 8 octets
pub const RECORD_HEADER_WORDS: u32 = 4;

/// Entrée d'index .shx (offset + longueur): 8 octets = 4 mots
pub const INDEX_ENTRY_WORDS: u32 = 4;

// Contenu d'un enregistrement polygone, en octets:
// type (4) + bbox (32) + nb parties (4) + nb points (4)
const RECORD_FIXED_BYTES: u32 = 4 + 32 + 4 + 4;
// index de départ d'une partie (4) -- toujours une seule partie ici
const PART_INDEX_BYTES: u32 = 4;
// un point: deux doubles (x, y)
const POINT_BYTES: u32 = 16;

/// Longueur de contenu d'un enregistrement, en mots de 16 bits
pub fn record_content_words(point_count: usize) -> u32 {
    (RECORD_FIXED_BYTES + PART_INDEX_BYTES + POINT_BYTES * point_count as u32) / 2
}

/// Longueur totale déclarée du .shp, en mots
pub fn shp_file_words(shapes: &[Ring]) -> u32 {
    HEADER_WORDS
        + shapes
            .iter()
            .map(|s| RECORD_HEADER_WORDS + record_content_words(s.len()))
            .sum::<u32>()
}

/// Longueur totale déclarée du .shx, en mots
pub fn shx_file_words(shape_count: usize) -> u32 {
    HEADER_WORDS + INDEX_ENTRY_WORDS * shape_count as u32
}

/// Rectangle englobant minimal d'un ensemble de sommets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Min/max exacts sur les sommets; zéros si l'itérateur est vide
    pub fn of<'a>(coords: impl Iterator<Item = &'a Coord>) -> Self {
        let mut bbox: Option<BoundingBox> = None;

        for c in coords {
            match &mut bbox {
                None => {
                    bbox = Some(BoundingBox {
                        min_x: c.x,
                        min_y: c.y,
                        max_x: c.x,
                        max_y: c.y,
                    });
                }
                Some(b) => {
                    b.min_x = b.min_x.min(c.x);
                    b.min_y = b.min_y.min(c.y);
                    b.max_x = b.max_x.max(c.x);
                    b.max_y = b.max_y.max(c.y);
                }
            }
        }

        bbox.unwrap_or(BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        })
    }

    /// Écrit les quatre bornes en doubles little-endian
    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_f64::<LittleEndian>(self.min_x)?;
        w.write_f64::<LittleEndian>(self.min_y)?;
        w.write_f64::<LittleEndian>(self.max_x)?;
        w.write_f64::<LittleEndian>(self.max_y)?;
        Ok(())
    }
}

/// Écrit l'en-tête de 100 octets commun aux .shp et .shx
pub fn write_main_header<W: Write>(
    w: &mut W,
    file_words: u32,
    bbox: &BoundingBox,
) -> std::io::Result<()> {
    w.write_u32::<BigEndian>(FILE_CODE)?;
    w.write_all(&[0u8; 20])?;
    w.write_u32::<BigEndian>(file_words)?;
    w.write_u32::<LittleEndian>(VERSION)?;
    w.write_u32::<LittleEndian>(SHAPE_TYPE_POLYGON)?;
    bbox.write(w)?;
    // Plages Z et M: figées à zéro (polygones 2D)
    for _ in 0..4 {
        w.write_f64::<LittleEndian>(0.0)?;
    }
    Ok(())
}
