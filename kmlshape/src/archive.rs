//! Chargement des documents KML, directs ou contenus dans une archive KMZ (zip)
//!
//! Le zip est parsé entièrement en mémoire, depuis la fin du fichier:
//! End of Central Directory → Central Directory → Local File Header →
//! données de l'entrée. Aucun répertoire temporaire n'est créé.

use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memchr::memmem;

use crate::KmlShapeError;

/// End of Central Directory (EOCD) - 22 octets minimum
struct EndOfCentralDirectory {
    total_entries: u16,
    cd_size: u32,
    cd_offset: u32,
}

impl EndOfCentralDirectory {
    const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    const SIZE: usize = 22;

    fn from_bytes(data: &[u8]) -> Result<Self, KmlShapeError> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(KmlShapeError::InvalidArchive(
                "invalid End of Central Directory".into(),
            ));
        }

        let mut cursor = Cursor::new(&data[4..]);
        let _disk_number = cursor.read_u16::<LittleEndian>()?;
        let _disk_with_cd = cursor.read_u16::<LittleEndian>()?;
        let _disk_entries = cursor.read_u16::<LittleEndian>()?;
        let total_entries = cursor.read_u16::<LittleEndian>()?;
        let cd_size = cursor.read_u32::<LittleEndian>()?;
        let cd_offset = cursor.read_u32::<LittleEndian>()?;

        Ok(Self {
            total_entries,
            cd_size,
            cd_offset,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 octets minimum
const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";

/// Local File Header (LFH) - 30 octets
const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
const LFH_SIZE: usize = 30;

/// Entrée du Central Directory
struct ZipEntry {
    file_name: String,
    compression_method: u16,
    compressed_size: u32,
    lfh_offset: u32,
}

impl ZipEntry {
    fn is_directory(&self) -> bool {
        self.file_name.ends_with('/')
    }
}

/// Charge le texte du document KML désigné par `path`.
///
/// - `.kmz` (extension insensible à la casse): première entrée `.kml`
///   de l'archive, décodée en UTF-8 strict.
/// - Tout autre chemin: lecture directe, UTF-8 d'abord puis repli
///   Latin-1 octet par octet (best-effort, jamais fatal).
pub fn load(path: &Path) -> Result<String, KmlShapeError> {
    let is_kmz = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("kmz"));

    if is_kmz {
        load_kmz(path)
    } else {
        let bytes = std::fs::read(path)?;
        Ok(decode_best_effort(&bytes))
    }
}

/// Extrait et décode la première entrée `.kml` d'une archive KMZ
fn load_kmz(path: &Path) -> Result<String, KmlShapeError> {
    let data = std::fs::read(path)?;
    let entries = list_entries(&data)?;

    let entry = entries
        .iter()
        .find(|e| !e.is_directory() && has_kml_extension(&e.file_name))
        .ok_or_else(|| KmlShapeError::NoDocumentInArchive(path.display().to_string()))?;

    let bytes = read_entry(&data, entry)?;

    // Dans une archive KMZ, le document est UTF-8 par définition
    match simdutf8::basic::from_utf8(&bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => Err(KmlShapeError::Encoding(format!(
            "entry {} is not valid UTF-8",
            entry.file_name
        ))),
    }
}

fn has_kml_extension(name: &str) -> bool {
    // comparaison sur les octets: la fin du nom peut tomber au milieu
    // d'un caractère multi-octets (noms d'entrée non ASCII)
    name.len() >= 4 && name.as_bytes()[name.len() - 4..].eq_ignore_ascii_case(b".kml")
}

/// Décode des octets en texte: UTF-8 d'abord, puis Latin-1.
///
/// Le repli Latin-1 mappe chaque octet sur le point de code Unicode
/// de même valeur et ne peut pas échouer.
pub fn decode_best_effort(bytes: &[u8]) -> String {
    match simdutf8::basic::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => encoding_rs::mem::decode_latin1(bytes).into_owned(),
    }
}

/// Localise l'EOCD en partant de la fin (les archives zip se lisent à l'envers)
fn find_eocd(data: &[u8]) -> Result<(EndOfCentralDirectory, usize), KmlShapeError> {
    let mut search_end = data.len();

    // L'EOCD peut être suivi d'un commentaire: on remonte les
    // occurrences de la signature jusqu'à trouver un enregistrement
    // dont la longueur de commentaire est cohérente.
    while let Some(pos) = memmem::rfind(&data[..search_end], EndOfCentralDirectory::SIGNATURE) {
        if pos + EndOfCentralDirectory::SIZE <= data.len() {
            let comment_len =
                u16::from_le_bytes([data[pos + 20], data[pos + 21]]) as usize;
            if pos + EndOfCentralDirectory::SIZE + comment_len == data.len() {
                let eocd = EndOfCentralDirectory::from_bytes(&data[pos..])?;
                return Ok((eocd, pos));
            }
        }
        search_end = pos;
    }

    Err(KmlShapeError::InvalidArchive("not a valid zip file".into()))
}

/// Liste les entrées du Central Directory
fn list_entries(data: &[u8]) -> Result<Vec<ZipEntry>, KmlShapeError> {
    let (eocd, _) = find_eocd(data)?;

    let cd_start = eocd.cd_offset as usize;
    let cd_end = cd_start
        .checked_add(eocd.cd_size as usize)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            KmlShapeError::InvalidArchive("central directory out of bounds".into())
        })?;

    let mut cursor = Cursor::new(&data[cd_start..cd_end]);
    let mut entries = Vec::with_capacity(eocd.total_entries as usize);

    for _ in 0..eocd.total_entries {
        entries.push(parse_cdfh(&mut cursor).map_err(|e| match e {
            KmlShapeError::Io(err) => {
                KmlShapeError::InvalidArchive(format!("truncated central directory: {}", err))
            }
            other => other,
        })?);
    }

    Ok(entries)
}

/// Parse un Central Directory File Header
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipEntry, KmlShapeError> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(KmlShapeError::InvalidArchive(
            "invalid Central Directory File Header".into(),
        ));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let _crc32 = cursor.read_u32::<LittleEndian>()?;
    let compressed_size = cursor.read_u32::<LittleEndian>()?;
    let uncompressed_size = cursor.read_u32::<LittleEndian>()?;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let lfh_offset = cursor.read_u32::<LittleEndian>()?;

    // Les marqueurs 0xFFFFFFFF indiquent du zip64, hors périmètre
    if compressed_size == u32::MAX || uncompressed_size == u32::MAX || lfh_offset == u32::MAX {
        return Err(KmlShapeError::InvalidArchive(
            "zip64 archives are not supported".into(),
        ));
    }

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();

    let skip = extra_field_length as u64 + file_comment_length as u64;
    cursor.set_position(cursor.position() + skip);

    Ok(ZipEntry {
        file_name,
        compression_method,
        compressed_size,
        lfh_offset,
    })
}

/// Lit et décompresse les données d'une entrée
fn read_entry(data: &[u8], entry: &ZipEntry) -> Result<Vec<u8>, KmlShapeError> {
    let lfh_start = entry.lfh_offset as usize;
    if lfh_start + LFH_SIZE > data.len() || &data[lfh_start..lfh_start + 4] != LFH_SIGNATURE {
        return Err(KmlShapeError::InvalidArchive(
            "invalid Local File Header".into(),
        ));
    }

    // Les champs variables du LFH peuvent différer du Central Directory
    let file_name_length =
        u16::from_le_bytes([data[lfh_start + 26], data[lfh_start + 27]]) as usize;
    let extra_field_length =
        u16::from_le_bytes([data[lfh_start + 28], data[lfh_start + 29]]) as usize;

    let data_start = lfh_start + LFH_SIZE + file_name_length + extra_field_length;
    let data_end = data_start
        .checked_add(entry.compressed_size as usize)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| KmlShapeError::InvalidArchive("entry data out of bounds".into()))?;

    let compressed = &data[data_start..data_end];

    match entry.compression_method {
        0 => Ok(compressed.to_vec()),
        8 => {
            let mut decoder = flate2::read::DeflateDecoder::new(compressed);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out).map_err(|e| {
                KmlShapeError::InvalidArchive(format!(
                    "deflate failed for {}: {}",
                    entry.file_name, e
                ))
            })?;
            Ok(out)
        }
        other => Err(KmlShapeError::InvalidArchive(format!(
            "unsupported compression method {} for {}",
            other, entry.file_name
        ))),
    }
}
