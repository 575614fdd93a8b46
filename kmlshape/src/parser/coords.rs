//! Tokenization des blocs `<coordinates>` KML
//!
//! Format Google Earth: tuples `lon,lat[,alt]` séparés par des
//! espaces, tabulations ou retours à la ligne. L'altitude est
//! ignorée. Un token invalide est abandonné silencieusement, jamais
//! fatal: il réduit simplement le nombre de sommets.

use geo::Coord;

/// Parse un bloc de coordonnées en sommets (lon, lat) valides.
///
/// Un token est retenu seulement s'il possède au moins deux champs
/// séparés par des virgules, que les deux sont numériques, et que
/// lon ∈ [-180, 180] et lat ∈ [-90, 90].
pub fn parse_coordinates(text: &str) -> Vec<Coord> {
    let mut coords = Vec::new();

    for line in text.lines() {
        for token in line.split_whitespace() {
            if let Some(coord) = parse_token(token) {
                coords.push(coord);
            }
        }
    }

    coords
}

fn parse_token(token: &str) -> Option<Coord> {
    let mut fields = token.split(',');
    let lon: f64 = fast_float::parse(fields.next()?).ok()?;
    let lat: f64 = fast_float::parse(fields.next()?).ok()?;

    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return None;
    }

    Some(Coord { x: lon, y: lat })
}

/// Nombre de tokens séparés par des blancs, pour l'heuristique de
/// classification polygone du module parent
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_space_separated() {
        let coords = parse_coordinates("85.0,27.0,0 85.1,27.0,0 85.1,27.1,0");
        assert_eq!(coords.len(), 3);
        assert_eq!(coords[0], Coord { x: 85.0, y: 27.0 });
        assert_eq!(coords[2], Coord { x: 85.1, y: 27.1 });
    }

    #[test]
    fn test_parse_multiline_with_tabs() {
        let coords = parse_coordinates("\n  85.0,27.0\t85.1,27.0\r\n  85.1,27.1\n");
        assert_eq!(coords.len(), 3);
    }

    #[test]
    fn test_altitude_ignored() {
        let coords = parse_coordinates("85.0,27.0,1234.5");
        assert_eq!(coords, vec![Coord { x: 85.0, y: 27.0 }]);
    }

    #[test]
    fn test_invalid_tokens_dropped_silently() {
        // un seul champ, champ non numérique, token vide entre espaces
        let coords = parse_coordinates("85.0 abc,27.0 85.0,def  85.1,27.1");
        assert_eq!(coords, vec![Coord { x: 85.1, y: 27.1 }]);
    }

    #[test]
    fn test_out_of_range_dropped() {
        let coords = parse_coordinates("181.0,27.0 85.0,-90.5 -180.0,90.0");
        assert_eq!(coords, vec![Coord { x: -180.0, y: 90.0 }]);
    }

    #[test]
    fn test_trailing_garbage_in_field_rejected() {
        // fast-float exige la consommation complète du champ
        let coords = parse_coordinates("85.0x,27.0 85.0,27.0");
        assert_eq!(coords.len(), 1);
    }

    #[test]
    fn test_token_count() {
        assert_eq!(token_count("a b\tc\nd"), 4);
        assert_eq!(token_count("   "), 0);
    }
}
