//! Table d'attributs .dbf à schéma fixe: NAME (C/50), DESC (C/100)

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

use crate::types::{Record, DESC_MAX, NAME_MAX};

/// Marqueur de version dBASE III
const VERSION: u8 = 3;

/// Longueur d'en-tête déclarée, valeur historique conservée telle
/// quelle (l'en-tête réellement écrit fait 97 octets)
const DECLARED_HEADER_LEN: u16 = 193;

/// Longueur d'un enregistrement: drapeau + NAME + DESC
const RECORD_LEN: u16 = 1 + NAME_MAX as u16 + DESC_MAX as u16;

/// Horodatage figé de l'en-tête (AA, MM, JJ depuis 1900)
const DATE_STAMP: [u8; 3] = [24, 1, 1];

/// Sérialise la table d'attributs complète
pub fn dbf_bytes(records: &[Record]) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(97 + records.len() * RECORD_LEN as usize);

    buf.write_u8(VERSION)?;
    buf.write_all(&DATE_STAMP)?;
    buf.write_u32::<LittleEndian>(records.len() as u32)?;
    buf.write_u16::<LittleEndian>(DECLARED_HEADER_LEN)?;
    buf.write_u16::<LittleEndian>(RECORD_LEN)?;
    buf.write_all(&[0u8; 20])?;

    write_field_descriptor(&mut buf, b"NAME", NAME_MAX as u8)?;
    write_field_descriptor(&mut buf, b"DESC", DESC_MAX as u8)?;
    buf.write_u8(0x0D)?; // terminateur d'en-tête

    for record in records {
        buf.write_u8(b' ')?; // drapeau non-supprimé
        write_padded(&mut buf, &record.name, NAME_MAX)?;
        write_padded(&mut buf, &record.description, DESC_MAX)?;
    }

    Ok(buf)
}

/// Descripteur de champ caractère de 32 octets
fn write_field_descriptor<W: Write>(w: &mut W, name: &[u8], length: u8) -> std::io::Result<()> {
    let mut padded_name = [0u8; 11];
    padded_name[..name.len()].copy_from_slice(name);
    w.write_all(&padded_name)?;
    w.write_u8(b'C')?; // type caractère
    w.write_all(&[0u8; 4])?; // adresse réservée
    w.write_u8(length)?;
    w.write_u8(0)?; // décimales
    w.write_all(&[0u8; 14])?;
    Ok(())
}

/// Écrit `text` tronqué/complété aux espaces sur `width` octets,
/// en respectant les frontières UTF-8
fn write_padded<W: Write>(w: &mut W, text: &str, width: usize) -> std::io::Result<()> {
    let clamped = clamp_utf8(text, width);
    w.write_all(clamped.as_bytes())?;
    for _ in clamped.len()..width {
        w.write_u8(b' ')?;
    }
    Ok(())
}

/// Plus long préfixe de `text` tenant dans `width` octets sans couper
/// de caractère multi-octets
fn clamp_utf8(text: &str, width: usize) -> &str {
    if text.len() <= width {
        return text;
    }
    let mut end = width;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
