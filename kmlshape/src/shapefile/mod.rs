//! Encodage du quartet Shapefile: .shp, .shx, .dbf, .prj
//!
//! Format ESRI à endianness mixte: en-têtes d'enregistrement et
//! longueurs de fichier en big-endian, géométrie en little-endian.

pub mod dbf;
pub mod layout;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::path::Path;

use crate::types::{Dataset, FileSet, Ring};
use crate::KmlShapeError;

use layout::{BoundingBox, HEADER_WORDS, RECORD_HEADER_WORDS, SHAPE_TYPE_POLYGON};

/// Descripteur WGS84 géographique, identique pour toute conversion
/// (les coordonnées source sont déjà des degrés décimaux WGS84)
const WGS84_WKT: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["Degree",0.017453292519943295]]"#;

/// Encode le dataset en quatre fichiers `<base>.{shp,shx,dbf,prj}`.
///
/// Les répertoires parents sont créés si besoin. Un dataset vide est
/// une erreur ([`KmlShapeError::NoShapes`]) et rien n'est écrit.
pub fn encode(dataset: &Dataset, base: &Path) -> Result<FileSet, KmlShapeError> {
    if dataset.is_empty() {
        return Err(KmlShapeError::NoShapes);
    }

    let files = FileSet::from_base(base);

    if let Some(parent) = base.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| KmlShapeError::output(parent, e))?;
        }
    }

    write_file(&files.shp, shp_bytes(&dataset.shapes)?)?;
    write_file(&files.shx, shx_bytes(&dataset.shapes)?)?;
    write_file(&files.dbf, dbf::dbf_bytes(&dataset.records)?)?;
    write_file(&files.prj, WGS84_WKT.as_bytes().to_vec())?;

    Ok(files)
}

fn write_file(path: &Path, bytes: Vec<u8>) -> Result<(), KmlShapeError> {
    std::fs::write(path, bytes).map_err(|e| KmlShapeError::output(path, e))
}

/// Sérialise le fichier géométrie .shp
fn shp_bytes(shapes: &[Ring]) -> std::io::Result<Vec<u8>> {
    let file_words = layout::shp_file_words(shapes);
    let mut buf = Vec::with_capacity(file_words as usize * 2);

    let global_bbox = BoundingBox::of(shapes.iter().flat_map(|s| s.0.iter()));
    layout::write_main_header(&mut buf, file_words, &global_bbox)?;

    for (i, shape) in shapes.iter().enumerate() {
        buf.write_u32::<BigEndian>(i as u32 + 1)?; // numéro 1-based
        buf.write_u32::<BigEndian>(layout::record_content_words(shape.len()))?;

        buf.write_u32::<LittleEndian>(SHAPE_TYPE_POLYGON)?;
        BoundingBox::of(shape.0.iter()).write(&mut buf)?;
        buf.write_u32::<LittleEndian>(1)?; // nombre de parties
        buf.write_u32::<LittleEndian>(shape.len() as u32)?;
        buf.write_u32::<LittleEndian>(0)?; // indice de départ de l'unique partie

        for c in &shape.0 {
            buf.write_f64::<LittleEndian>(c.x)?;
            buf.write_f64::<LittleEndian>(c.y)?;
        }
    }

    Ok(buf)
}

/// Sérialise l'index spatial .shx.
///
/// Chaque entrée reproduit exactement la position et la longueur
/// déclarée de l'enregistrement correspondant du .shp: c'est ce
/// couplage qu'un lecteur exploite pour l'accès direct.
fn shx_bytes(shapes: &[Ring]) -> std::io::Result<Vec<u8>> {
    let file_words = layout::shx_file_words(shapes.len());
    let mut buf = Vec::with_capacity(file_words as usize * 2);

    let global_bbox = BoundingBox::of(shapes.iter().flat_map(|s| s.0.iter()));
    layout::write_main_header(&mut buf, file_words, &global_bbox)?;

    let mut offset_words = HEADER_WORDS;
    for shape in shapes {
        let content_words = layout::record_content_words(shape.len());
        buf.write_u32::<BigEndian>(offset_words)?;
        buf.write_u32::<BigEndian>(content_words)?;
        offset_words += RECORD_HEADER_WORDS + content_words;
    }

    Ok(buf)
}
