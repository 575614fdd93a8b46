//! Types de données pour le crate kmlshape

use geo::Coord;
use std::path::PathBuf;

/// Longueur maximale du nom d'un placemark (champ NAME du .dbf)
pub const NAME_MAX: usize = 50;

/// Longueur maximale de la description (champ DESC du .dbf)
pub const DESC_MAX: usize = 100;

/// Anneau fermé de sommets (lon, lat) formant un contour de polygone.
///
/// Invariants garantis par [`crate::repair::close_ring`]:
/// - au moins 4 sommets
/// - premier sommet == dernier sommet
#[derive(Debug, Clone, PartialEq)]
pub struct Ring(pub Vec<Coord>);

impl Ring {
    /// Nombre de sommets, fermeture incluse
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Vrai si premier == dernier (égalité exacte)
    pub fn is_closed(&self) -> bool {
        match (self.0.first(), self.0.last()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Ligne d'attributs associée à une forme (même position dans le Dataset)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Nom du placemark, tronqué à [`NAME_MAX`] caractères
    pub name: String,

    /// Description du placemark, tronquée à [`DESC_MAX`] caractères
    pub description: String,
}

/// Résultat de l'extraction: formes et attributs appariés par position.
///
/// L'appariement par indice est un invariant dur consommé par
/// l'encodeur .dbf: `shapes[i]` et `records[i]` décrivent le même
/// placemark, dans l'ordre de parcours du document.
#[derive(Debug, Default)]
pub struct Dataset {
    pub shapes: Vec<Ring>,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Nombre de paires (forme, attributs)
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.shapes.len(), self.records.len());
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Ajoute une paire en maintenant la correspondance par indice
    pub fn push(&mut self, shape: Ring, record: Record) {
        self.shapes.push(shape);
        self.records.push(record);
    }
}

/// Les quatre fichiers de sortie partageant un même nom de base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    pub shp: PathBuf,
    pub shx: PathBuf,
    pub dbf: PathBuf,
    pub prj: PathBuf,
}

impl FileSet {
    /// Dérive les quatre chemins depuis un nom de base sans extension
    pub fn from_base(base: &std::path::Path) -> Self {
        Self {
            shp: base.with_extension("shp"),
            shx: base.with_extension("shx"),
            dbf: base.with_extension("dbf"),
            prj: base.with_extension("prj"),
        }
    }
}

/// Résultat d'une conversion complète
#[derive(Debug)]
pub struct Conversion {
    /// Chemins des fichiers écrits
    pub files: FileSet,

    /// Nombre de polygones encodés
    pub shape_count: usize,
}
