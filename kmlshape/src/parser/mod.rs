//! Extraction des polygones depuis un document KML
//!
//! Le parcours est tolérant: balises comparées par nom local (les
//! producteurs KML sont incohérents sur les namespaces), placemark
//! sans géométrie valide ignoré sans erreur. Seul un XML malformé
//! est fatal.

pub mod coords;
pub mod tree;

use crate::repair::close_ring;
use crate::types::{Dataset, Record, DESC_MAX, NAME_MAX};
use crate::KmlShapeError;

use tree::Tree;

/// Seuil de tokens au-delà duquel un bloc de coordonnées orphelin est
/// traité comme un contour de polygone
const HEURISTIC_TOKEN_MIN: usize = 10;

/// Extrait les paires (forme, attributs) d'un document KML.
///
/// L'ordre de sortie est l'ordre de parcours du document; il porte la
/// correspondance par indice entre formes et attributs consommée par
/// l'encodeur.
pub fn extract(document: &str) -> Result<Dataset, KmlShapeError> {
    let tree = tree::parse(document)?;
    let mut dataset = Dataset::default();

    for placemark in placemarks(&tree) {
        let Some(coord_text) = polygon_coordinates(&tree, placemark) else {
            continue;
        };

        let Some(ring) = close_ring(coords::parse_coordinates(coord_text)) else {
            continue;
        };

        let name = find_text(&tree, placemark, "name")
            .map(|t| truncate_chars(t, NAME_MAX))
            .filter(|t| !t.is_empty())
            // Nom par défaut: position 1-based parmi les formes retenues
            .unwrap_or_else(|| format!("Polygon_{}", dataset.len() + 1));

        let description = find_text(&tree, placemark, "description")
            .map(|t| truncate_chars(t, DESC_MAX))
            .unwrap_or_default();

        dataset.push(ring, Record { name, description });
    }

    Ok(dataset)
}

/// Noeuds placemark en ordre de document
fn placemarks(tree: &Tree) -> Vec<usize> {
    tree.nodes()
        .iter()
        .enumerate()
        .filter(|(_, n)| n.tag == "Placemark")
        .map(|(i, _)| i)
        .collect()
}

/// Premier descendant de `idx` portant la balise `tag` avec du texte
fn find_text<'a>(tree: &'a Tree, idx: usize, tag: &str) -> Option<&'a str> {
    tree.descendants(idx)
        .into_iter()
        .map(|i| tree.node(i))
        .find(|n| n.tag == tag && n.text.as_deref().is_some_and(|t| !t.is_empty()))
        .and_then(|n| n.text.as_deref())
}

/// Texte du premier bloc `<coordinates>` du placemark classé polygone.
///
/// Classification exacte d'abord: un ancêtre `Polygon` (borné au
/// placemark lui-même). À défaut, heuristique de compatibilité sur la
/// forme du texte: elle accepte sciemment les LineString longues,
/// comportement historique conservé.
fn polygon_coordinates(tree: &Tree, placemark: usize) -> Option<&str> {
    for idx in tree.descendants(placemark) {
        let node = tree.node(idx);
        if node.tag != "coordinates" {
            continue;
        }
        let Some(text) = node.text.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };

        if has_polygon_ancestor(tree, idx, placemark) {
            return Some(text);
        }

        if looks_like_polygon(text) {
            tracing::debug!(
                tokens = coords::token_count(text),
                "Coordinates block without Polygon ancestor accepted by shape heuristic"
            );
            return Some(text);
        }
    }

    None
}

/// Vrai si un ancêtre de `idx`, jusqu'au placemark exclu, est `Polygon`
fn has_polygon_ancestor(tree: &Tree, idx: usize, placemark: usize) -> bool {
    tree.ancestors(idx)
        .take_while(|&a| a != placemark)
        .any(|a| tree.node(a).tag == "Polygon")
}

/// Heuristique de repli: un contour de polygone s'étale sur plusieurs
/// lignes ou dépasse [`HEURISTIC_TOKEN_MIN`] tokens
fn looks_like_polygon(text: &str) -> bool {
    text.trim().lines().count() > 1 || coords::token_count(text) > HEURISTIC_TOKEN_MIN
}

/// Tronque à `max` caractères en respectant les frontières UTF-8
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
