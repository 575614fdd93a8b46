//! Tests d'intégration: conversions complètes KML/KMZ → Shapefile
//! avec relecture des fichiers émis

use std::io::{Cursor, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use kmlshape::{convert, KmlShapeError};

/// Répertoire de travail jetable, nettoyé en fin de test
struct Scratch(PathBuf);

impl Scratch {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("kmlshape_it_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.0).ok();
    }
}

/// Relit un .shp émis et retourne les anneaux de sommets (x, y)
fn read_shp_rings(path: &Path) -> Vec<Vec<(f64, f64)>> {
    let bytes = std::fs::read(path).unwrap();
    let declared_words = u32::from_be_bytes(bytes[24..28].try_into().unwrap());
    assert_eq!(bytes.len(), declared_words as usize * 2, "declared length");

    let mut cursor = Cursor::new(&bytes);
    cursor.set_position(100);

    let mut rings = Vec::new();
    let mut expected_number = 1u32;

    while (cursor.position() as usize) < bytes.len() {
        let number = cursor.read_u32::<BigEndian>().unwrap();
        assert_eq!(number, expected_number);
        expected_number += 1;

        let content_words = cursor.read_u32::<BigEndian>().unwrap();
        let content_start = cursor.position();

        let shape_type = cursor.read_u32::<LittleEndian>().unwrap();
        assert_eq!(shape_type, 5, "polygon shape type");

        cursor.seek(SeekFrom::Current(32)).unwrap(); // bbox de l'enregistrement
        let num_parts = cursor.read_u32::<LittleEndian>().unwrap();
        assert_eq!(num_parts, 1);
        let num_points = cursor.read_u32::<LittleEndian>().unwrap();
        let part_start = cursor.read_u32::<LittleEndian>().unwrap();
        assert_eq!(part_start, 0);

        let mut ring = Vec::with_capacity(num_points as usize);
        for _ in 0..num_points {
            let x = cursor.read_f64::<LittleEndian>().unwrap();
            let y = cursor.read_f64::<LittleEndian>().unwrap();
            ring.push((x, y));
        }
        rings.push(ring);

        assert_eq!(
            cursor.position() - content_start,
            content_words as u64 * 2,
            "record content length"
        );
    }

    rings
}

/// Relit les entrées (offset, longueur) du .shx, en mots
fn read_shx_entries(path: &Path) -> Vec<(u32, u32)> {
    let bytes = std::fs::read(path).unwrap();
    let declared_words = u32::from_be_bytes(bytes[24..28].try_into().unwrap());
    assert_eq!(bytes.len(), declared_words as usize * 2);

    bytes[100..]
        .chunks_exact(8)
        .map(|chunk| {
            (
                u32::from_be_bytes(chunk[0..4].try_into().unwrap()),
                u32::from_be_bytes(chunk[4..8].try_into().unwrap()),
            )
        })
        .collect()
}

fn write_kml(scratch: &Scratch, name: &str, body: &str) -> PathBuf {
    let path = scratch.path(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// Archive zip minimale à une entrée stockée (non compressée)
fn build_kmz(entry_name: &str, content: &[u8]) -> Vec<u8> {
    let name = entry_name.as_bytes();
    let mut zip = Vec::new();

    zip.extend_from_slice(b"PK\x03\x04");
    zip.extend_from_slice(&20u16.to_le_bytes());
    zip.extend_from_slice(&[0u8; 2]); // flags
    zip.extend_from_slice(&0u16.to_le_bytes()); // stored
    zip.extend_from_slice(&[0u8; 8]); // date + crc
    zip.extend_from_slice(&(content.len() as u32).to_le_bytes());
    zip.extend_from_slice(&(content.len() as u32).to_le_bytes());
    zip.extend_from_slice(&(name.len() as u16).to_le_bytes());
    zip.extend_from_slice(&0u16.to_le_bytes());
    zip.extend_from_slice(name);
    zip.extend_from_slice(content);

    let cd_offset = zip.len() as u32;
    zip.extend_from_slice(b"PK\x01\x02");
    zip.extend_from_slice(&20u16.to_le_bytes());
    zip.extend_from_slice(&20u16.to_le_bytes());
    zip.extend_from_slice(&[0u8; 2]);
    zip.extend_from_slice(&0u16.to_le_bytes());
    zip.extend_from_slice(&[0u8; 8]);
    zip.extend_from_slice(&(content.len() as u32).to_le_bytes());
    zip.extend_from_slice(&(content.len() as u32).to_le_bytes());
    zip.extend_from_slice(&(name.len() as u16).to_le_bytes());
    zip.extend_from_slice(&[0u8; 8]); // extra, comment, disk, attrs internes
    zip.extend_from_slice(&0u32.to_le_bytes()); // external attrs
    zip.extend_from_slice(&0u32.to_le_bytes()); // lfh offset
    zip.extend_from_slice(name);
    let cd_size = zip.len() as u32 - cd_offset;

    zip.extend_from_slice(b"PK\x05\x06");
    zip.extend_from_slice(&[0u8; 4]);
    zip.extend_from_slice(&1u16.to_le_bytes());
    zip.extend_from_slice(&1u16.to_le_bytes());
    zip.extend_from_slice(&cd_size.to_le_bytes());
    zip.extend_from_slice(&cd_offset.to_le_bytes());
    zip.extend_from_slice(&0u16.to_le_bytes());

    zip
}

const FIELD1_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <name>Field1</name>
      <Polygon>
        <outerBoundaryIs>
          <LinearRing>
            <coordinates>85.0,27.0,0 85.1,27.0,0 85.1,27.1,0 85.0,27.0,0</coordinates>
          </LinearRing>
        </outerBoundaryIs>
      </Polygon>
    </Placemark>
  </Document>
</kml>"#;

#[test]
fn test_scenario_closed_polygon_single_shape() {
    let scratch = Scratch::new("field1");
    let input = write_kml(&scratch, "field1.kml", FIELD1_KML);

    let result = convert(&input, &scratch.path("field1_converted")).unwrap();
    assert_eq!(result.shape_count, 1);

    let rings = read_shp_rings(&result.files.shp);
    assert_eq!(rings.len(), 1);
    assert_eq!(
        rings[0],
        vec![(85.0, 27.0), (85.1, 27.0), (85.1, 27.1), (85.0, 27.0)]
    );

    // l'entrée d'index correspond exactement à l'enregistrement
    let entries = read_shx_entries(&result.files.shx);
    assert_eq!(entries, vec![(50, 24 + 8 * 4)]);

    // champ NAME complété aux espaces sur 50 octets
    let dbf = std::fs::read(&result.files.dbf).unwrap();
    let name_field = &dbf[98..148];
    assert_eq!(&name_field[..6], b"Field1");
    assert!(name_field[6..].iter().all(|&b| b == b' '));
}

#[test]
fn test_scenario_unclosed_ring_closed_by_encoder() {
    let scratch = Scratch::new("unclosed");
    let input = write_kml(
        &scratch,
        "open.kml",
        r#"<kml><Placemark><Polygon><outerBoundaryIs><LinearRing>
<coordinates>85.0,27.0 85.1,27.0 85.1,27.1</coordinates>
</LinearRing></outerBoundaryIs></Polygon></Placemark></kml>"#,
    );

    let result = convert(&input, &scratch.path("open_converted")).unwrap();
    let rings = read_shp_rings(&result.files.shp);

    assert_eq!(rings[0].len(), 4);
    assert_eq!(rings[0][0], rings[0][3]);
}

#[test]
fn test_scenario_invalid_placemark_does_not_fail_conversion() {
    let scratch = Scratch::new("partial");
    let input = write_kml(
        &scratch,
        "mixed.kml",
        r#"<kml>
<Placemark><name>Bad</name><Polygon><coordinates>85.0,27.0 bogus</coordinates></Polygon></Placemark>
<Placemark><name>Good</name><Polygon><coordinates>0.0,0.0 1.0,0.0 1.0,1.0 0.0,0.0</coordinates></Polygon></Placemark>
</kml>"#,
    );

    let result = convert(&input, &scratch.path("mixed_converted")).unwrap();
    assert_eq!(result.shape_count, 1);
}

#[test]
fn test_scenario_kmz_without_kml_entry() {
    let scratch = Scratch::new("nokml");
    let kmz_path = scratch.path("empty.kmz");
    std::fs::write(&kmz_path, build_kmz("images/icon.png", b"notkml")).unwrap();

    let base = scratch.path("empty_converted");
    let result = convert(&kmz_path, &base);

    assert!(matches!(result, Err(KmlShapeError::NoDocumentInArchive(_))));
    assert!(!base.with_extension("shp").exists());
}

#[test]
fn test_scenario_default_name_for_second_polygon() {
    let scratch = Scratch::new("ordinal");
    let input = write_kml(
        &scratch,
        "two.kml",
        r#"<kml>
<Placemark><name>Named</name><Polygon><coordinates>0.0,0.0 1.0,0.0 1.0,1.0 0.0,0.0</coordinates></Polygon></Placemark>
<Placemark><Polygon><coordinates>2.0,2.0 3.0,2.0 3.0,3.0 2.0,2.0</coordinates></Polygon></Placemark>
</kml>"#,
    );

    let result = convert(&input, &scratch.path("two_converted")).unwrap();
    assert_eq!(result.shape_count, 2);

    let dbf = std::fs::read(&result.files.dbf).unwrap();
    let second = &dbf[97 + 151..];
    assert_eq!(&second[1..10], b"Polygon_2");
}

#[test]
fn test_kmz_end_to_end() {
    let scratch = Scratch::new("kmz");
    let kmz_path = scratch.path("field1.kmz");
    std::fs::write(&kmz_path, build_kmz("doc.kml", FIELD1_KML.as_bytes())).unwrap();

    let result = convert(&kmz_path, &scratch.path("field1_converted")).unwrap();
    assert_eq!(result.shape_count, 1);

    let rings = read_shp_rings(&result.files.shp);
    assert_eq!(rings[0].len(), 4);
}

#[test]
fn test_round_trip_preserves_rings() {
    let scratch = Scratch::new("roundtrip");
    let input = write_kml(
        &scratch,
        "three.kml",
        r#"<kml>
<Placemark><Polygon><coordinates>85.0,27.0 85.1,27.0 85.1,27.1 85.0,27.0</coordinates></Polygon></Placemark>
<Placemark><Polygon><coordinates>-10.5,3.25 -10.0,3.25 -10.0,3.75 -10.5,3.75</coordinates></Polygon></Placemark>
<Placemark><Polygon><coordinates>
  0.0,0.0 0.5,0.0 0.5,0.5
  0.25,0.75 0.0,0.5 0.0,0.0
</coordinates></Polygon></Placemark>
</kml>"#,
    );

    let result = convert(&input, &scratch.path("three_converted")).unwrap();
    assert_eq!(result.shape_count, 3);

    let rings = read_shp_rings(&result.files.shp);
    assert_eq!(
        rings[0],
        vec![(85.0, 27.0), (85.1, 27.0), (85.1, 27.1), (85.0, 27.0)]
    );
    // anneau 2: fermé automatiquement, 5 sommets
    assert_eq!(rings[1].len(), 5);
    assert_eq!(rings[1][0], (-10.5, 3.25));
    assert_eq!(rings[1][4], (-10.5, 3.25));
    assert_eq!(rings[2].len(), 6);

    // chaque entrée .shx pointe la position réelle de l'enregistrement
    let entries = read_shx_entries(&result.files.shx);
    assert_eq!(entries.len(), 3);
    let mut offset = 50u32;
    for (i, ring) in rings.iter().enumerate() {
        let content = 24 + 8 * ring.len() as u32;
        assert_eq!(entries[i], (offset, content));
        offset += 4 + content;
    }

    // le nombre d'enregistrements .dbf suit le nombre de formes
    let dbf = std::fs::read(&result.files.dbf).unwrap();
    assert_eq!(u32::from_le_bytes(dbf[4..8].try_into().unwrap()), 3);
    assert_eq!(dbf.len(), 97 + 3 * 151);
}

#[test]
fn test_no_polygons_is_fatal_and_writes_nothing() {
    let scratch = Scratch::new("empty");
    let input = write_kml(
        &scratch,
        "points.kml",
        r#"<kml><Placemark><name>P</name><Point><coordinates>1.0,2.0</coordinates></Point></Placemark></kml>"#,
    );

    let base = scratch.path("points_converted");
    let result = convert(&input, &base);

    assert!(matches!(result, Err(KmlShapeError::NoShapes)));
    assert!(!base.with_extension("shp").exists());
    assert!(!base.with_extension("dbf").exists());
}
