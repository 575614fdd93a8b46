//! Fermeture et validation des anneaux de polygones

use geo::Coord;
use crate::types::Ring;

/// Valide et ferme un anneau candidat.
///
/// Règles:
/// - moins de 3 sommets: géométrie abandonnée (None)
/// - anneau ouvert: le premier sommet est rajouté en fin (égalité
///   exacte premier/dernier)
/// - moins de 4 sommets après fermeture: abandonné
///
/// L'abandon n'est pas une erreur: le placemark ne contribue
/// simplement aucune forme.
pub fn close_ring(mut coords: Vec<Coord>) -> Option<Ring> {
    if coords.len() < 3 {
        return None;
    }

    let first = coords[0];
    let last = coords[coords.len() - 1];

    if first != last {
        let gap = ((first.x - last.x).powi(2) + (first.y - last.y).powi(2)).sqrt();
        tracing::warn!(
            points = coords.len(),
            gap_degrees = gap,
            "Auto-closing unclosed ring"
        );
        coords.push(first);
    }

    if coords.len() < 4 {
        return None;
    }

    Some(Ring(coords))
}
