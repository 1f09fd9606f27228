//! Minimal FITS primary-HDU support: the forms the camera actually writes.
//!
//! Covers a standard-conforming subset: 2880-byte blocks of 80-byte cards,
//! a primary header, and a 16-bit integer data array using the usual
//! `BZERO = 32768` unsigned convention. Extensions, scaling beyond an integer
//! zero point, and compressed variants are out of scope; anything else in a
//! file surfaces as [`ButlerError::Fits`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{ButlerError, Result};
use crate::image::{DecoratedImage, Image, PixelBuffer};
use crate::property::{PropertyList, PropertyValue};

/// FITS logical record size in bytes.
pub const BLOCK_SIZE: usize = 2880;
/// Header card size in bytes.
pub const CARD_SIZE: usize = 80;
/// Cards per logical record.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Zero point for the unsigned 16-bit convention.
const U16_BZERO: i64 = 32768;

fn fits_err(path: &Path, reason: impl Into<String>) -> ButlerError {
    ButlerError::Fits {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Read the primary header unit of `path` into a property list.
///
/// Commentary cards (`COMMENT`, `HISTORY`, blank keyword) are skipped; value
/// cards keep file order.
pub fn read_primary_header(path: &Path) -> Result<PropertyList> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let (header, _) = read_header(&mut reader, path)?;
    Ok(header)
}

/// Read a 16-bit unsigned primary image together with its header.
pub fn read_decorated_image_u16(path: &Path) -> Result<DecoratedImage> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let (header, _) = read_header(&mut reader, path)?;

    if header.get_bool("SIMPLE") != Some(true) {
        return Err(fits_err(path, "not a SIMPLE primary HDU"));
    }
    let bitpix = header
        .get_int("BITPIX")
        .ok_or_else(|| fits_err(path, "missing BITPIX"))?;
    if bitpix != 16 {
        return Err(fits_err(path, format!("unsupported BITPIX {bitpix}")));
    }
    let naxis = header
        .get_int("NAXIS")
        .ok_or_else(|| fits_err(path, "missing NAXIS"))?;
    if naxis != 2 {
        return Err(fits_err(path, format!("unsupported NAXIS {naxis}")));
    }
    let width = read_axis(&header, "NAXIS1", path)?;
    let height = read_axis(&header, "NAXIS2", path)?;
    let bzero = header.get_int("BZERO").unwrap_or(0);
    let bscale = header.get_float("BSCALE").unwrap_or(1.0);
    if bscale != 1.0 {
        return Err(fits_err(path, format!("unsupported BSCALE {bscale}")));
    }

    let count = (width as usize) * (height as usize);
    let mut raw = vec![0u8; count * 2];
    reader
        .read_exact(&mut raw)
        .map_err(|_| fits_err(path, "truncated data array"))?;

    let mut pixels = Vec::with_capacity(count);
    for chunk in raw.chunks_exact(2) {
        let stored = i16::from_be_bytes([chunk[0], chunk[1]]);
        let value = i64::from(stored) + bzero;
        let value = u16::try_from(value)
            .map_err(|_| fits_err(path, format!("pixel value {value} out of u16 range")))?;
        pixels.push(value);
    }

    debug!(path = %path.display(), width, height, "read u16 primary image");
    let image = Image::new(width, height, PixelBuffer::U16(pixels))?;
    Ok(DecoratedImage::new(image, header))
}

/// Write a 16-bit unsigned primary image.
///
/// `extra` cards follow the mandatory ones; reserved structural keywords in
/// `extra` are skipped rather than written twice.
pub fn write_simple_u16(path: &Path, image: &Image, extra: &PropertyList) -> Result<()> {
    let pixels = match image.pixels() {
        PixelBuffer::U16(data) => data,
        PixelBuffer::F32(_) => {
            return Err(fits_err(path, "only u16 pixel buffers can be written"))
        }
    };

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let mut header = PropertyList::new();
    header.set("SIMPLE", true);
    header.set("BITPIX", 16i64);
    header.set("NAXIS", 2i64);
    header.set("NAXIS1", i64::from(image.width()));
    header.set("NAXIS2", i64::from(image.height()));
    header.set("BZERO", U16_BZERO);
    header.set("BSCALE", 1i64);
    for (name, value) in extra.iter() {
        if !header.contains(name) {
            header.set(name, value.clone());
        }
    }

    let mut bytes = Vec::with_capacity(BLOCK_SIZE);
    for (name, value) in header.iter() {
        bytes.extend_from_slice(&format_card(name, value));
    }
    bytes.extend_from_slice(&format_end_card());
    pad_to_block(&mut bytes, b' ');
    writer.write_all(&bytes)?;

    let mut data = Vec::with_capacity(pixels.len() * 2);
    for &px in pixels {
        let stored = (i64::from(px) - U16_BZERO) as i16;
        data.extend_from_slice(&stored.to_be_bytes());
    }
    pad_to_block(&mut data, 0);
    writer.write_all(&data)?;
    writer.flush()?;
    Ok(())
}

fn read_axis(header: &PropertyList, key: &str, path: &Path) -> Result<u32> {
    let value = header
        .get_int(key)
        .ok_or_else(|| fits_err(path, format!("missing {key}")))?;
    u32::try_from(value).map_err(|_| fits_err(path, format!("invalid {key} = {value}")))
}

/// Parse header blocks up to and including the one holding END.
/// Returns the header and the number of blocks consumed.
fn read_header(reader: &mut impl Read, path: &Path) -> Result<(PropertyList, usize)> {
    let mut header = PropertyList::new();
    let mut block = [0u8; BLOCK_SIZE];
    let mut blocks = 0usize;

    loop {
        reader
            .read_exact(&mut block)
            .map_err(|_| fits_err(path, "truncated header (no END card)"))?;
        blocks += 1;

        for card in block.chunks_exact(CARD_SIZE) {
            let keyword = trimmed_keyword(card);
            match keyword {
                "END" => return Ok((header, blocks)),
                "" | "COMMENT" | "HISTORY" | "CONTINUE" => continue,
                _ => {}
            }
            if card[8] != b'=' {
                // Keyword without a value indicator; nothing to record.
                continue;
            }
            let raw = String::from_utf8_lossy(&card[10..]);
            let value = parse_value(&raw)
                .ok_or_else(|| fits_err(path, format!("unparsable card '{keyword}'")))?;
            header.set(keyword, value);
        }

        if blocks > 1000 {
            return Err(fits_err(path, "header exceeds 1000 blocks"));
        }
    }
}

fn trimmed_keyword(card: &[u8]) -> &str {
    let raw = &card[..8];
    std::str::from_utf8(raw)
        .map(|s| s.trim_end_matches([' ', '\0']))
        .unwrap_or("")
}

/// Parse the value field of a card (bytes after the value indicator).
fn parse_value(raw: &str) -> Option<PropertyValue> {
    let s = raw.trim_start();
    if let Some(rest) = s.strip_prefix('\'') {
        // Quoted string; '' escapes a literal quote. Trailing blanks are
        // insignificant per the standard.
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    out.push('\'');
                } else {
                    return Some(PropertyValue::Str(out.trim_end().to_string()));
                }
            } else {
                out.push(c);
            }
        }
        None
    } else {
        let field = s.split('/').next().unwrap_or("").trim();
        if field.is_empty() {
            return None;
        }
        match field {
            "T" => return Some(PropertyValue::Bool(true)),
            "F" => return Some(PropertyValue::Bool(false)),
            _ => {}
        }
        if let Ok(v) = field.parse::<i64>() {
            return Some(PropertyValue::Int(v));
        }
        let normalized = field.replace(['D', 'd'], "E");
        normalized.parse::<f64>().ok().map(PropertyValue::Float)
    }
}

fn format_card(name: &str, value: &PropertyValue) -> [u8; CARD_SIZE] {
    let rendered = match value {
        PropertyValue::Bool(v) => format!("{:<8}= {:>20}", name, if *v { "T" } else { "F" }),
        PropertyValue::Int(v) => format!("{name:<8}= {v:>20}"),
        PropertyValue::Float(v) => {
            // Debug formatting keeps a decimal point or exponent, so the
            // value reads back as a float rather than an integer.
            format!("{:<8}= {:>20}", name, format!("{v:?}"))
        }
        PropertyValue::Str(v) => {
            let escaped = v.replace('\'', "''");
            format!("{name:<8}= '{escaped:<8}'")
        }
    };
    to_card_bytes(&rendered)
}

fn format_end_card() -> [u8; CARD_SIZE] {
    to_card_bytes("END")
}

fn to_card_bytes(rendered: &str) -> [u8; CARD_SIZE] {
    let mut card = [b' '; CARD_SIZE];
    let bytes = rendered.as_bytes();
    let n = bytes.len().min(CARD_SIZE);
    card[..n].copy_from_slice(&bytes[..n]);
    card
}

fn pad_to_block(bytes: &mut Vec<u8>, fill: u8) {
    let rem = bytes.len() % BLOCK_SIZE;
    if rem != 0 {
        bytes.resize(bytes.len() + BLOCK_SIZE - rem, fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_image() -> Image {
        let pixels: Vec<u16> = (0..12).map(|v| v * 1000).collect();
        Image::new(4, 3, PixelBuffer::U16(pixels)).unwrap()
    }

    #[test]
    fn test_write_read_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.fits");

        let mut extra = PropertyList::new();
        extra.set("EXPTIME", 30.0);
        extra.set("FILTER", "r");
        extra.set("VISIT", 1234i64);

        write_simple_u16(&path, &sample_image(), &extra).unwrap();

        let decorated = read_decorated_image_u16(&path).unwrap();
        assert_eq!(decorated.image, sample_image());
        assert_eq!(decorated.metadata.get_float("EXPTIME"), Some(30.0));
        assert_eq!(decorated.metadata.get_str("FILTER"), Some("r"));
        assert_eq!(decorated.metadata.get_int("VISIT"), Some(1234));
    }

    #[test]
    fn test_header_only_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.fits");
        let mut extra = PropertyList::new();
        extra.set("OBJECT", "M31");
        write_simple_u16(&path, &sample_image(), &extra).unwrap();

        let header = read_primary_header(&path).unwrap();
        assert_eq!(header.get_bool("SIMPLE"), Some(true));
        assert_eq!(header.get_int("NAXIS1"), Some(4));
        assert_eq!(header.get_str("OBJECT"), Some("M31"));
    }

    #[test]
    fn test_full_dynamic_range_survives() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("range.fits");
        let image = Image::new(2, 1, PixelBuffer::U16(vec![0, 65535])).unwrap();
        write_simple_u16(&path, &image, &PropertyList::new()).unwrap();

        let back = read_decorated_image_u16(&path).unwrap();
        match back.image.pixels() {
            PixelBuffer::U16(data) => assert_eq!(data, &vec![0, 65535]),
            PixelBuffer::F32(_) => panic!("expected u16 pixels"),
        }
    }

    #[test]
    fn test_truncated_file_is_a_fits_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.fits");
        std::fs::write(&path, b"SIMPLE  =                    T").unwrap();
        assert!(matches!(
            read_primary_header(&path),
            Err(ButlerError::Fits { .. })
        ));
    }

    #[test]
    fn test_quoted_string_with_comment() {
        assert_eq!(
            parse_value("'SDSS r '           / filter name"),
            Some(PropertyValue::Str("SDSS r".to_string()))
        );
        assert_eq!(parse_value("     123 / counts"), Some(PropertyValue::Int(123)));
        assert_eq!(
            parse_value("  6.1942E2"),
            Some(PropertyValue::Float(619.42))
        );
        assert_eq!(parse_value("    T"), Some(PropertyValue::Bool(true)));
    }
}
