#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const DATE_TIME: u16 = 0x0132;
pub const ORIENTATION: u16 = 0x0112;
pub const DATE_TIME_ORIGINAL: u16 = 0x9003;
pub const DATE_TIME_DIGITIZED: u16 = 0x9004;
const EXIF_IFD_POINTER: u16 = 0x8769;

/// One TIFF directory entry.
pub enum Field<'a> {
    Ascii(u16, &'a str),
    Short(u16, u16),
}

fn ifd_len(entries: usize) -> usize {
    2 + 12 * entries + 4
}

fn write_entry(out: &mut Vec<u8>, field: &Field, data_base: usize, data: &mut Vec<u8>) {
    match field {
        Field::Ascii(tag, text) => {
            let mut bytes = text.as_bytes().to_vec();
            bytes.push(0);
            out.extend_from_slice(&tag.to_le_bytes());
            out.extend_from_slice(&2u16.to_le_bytes());
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            if bytes.len() <= 4 {
                bytes.resize(4, 0);
                out.extend_from_slice(&bytes);
            } else {
                out.extend_from_slice(&((data_base + data.len()) as u32).to_le_bytes());
                data.extend_from_slice(&bytes);
                if data.len() % 2 == 1 {
                    data.push(0);
                }
            }
        }
        Field::Short(tag, value) => {
            out.extend_from_slice(&tag.to_le_bytes());
            out.extend_from_slice(&3u16.to_le_bytes());
            out.extend_from_slice(&1u32.to_le_bytes());
            out.extend_from_slice(&value.to_le_bytes());
            out.extend_from_slice(&[0, 0]);
        }
    }
}

/// Little-endian TIFF/EXIF block. `ifd0` and `exif` entries must be sorted
/// by tag; the Exif IFD is only linked when `exif` is not empty.
pub fn exif_tiff(ifd0: &[Field], exif: &[Field]) -> Vec<u8> {
    let ifd0_entries = ifd0.len() + usize::from(!exif.is_empty());
    let exif_at = 8 + ifd_len(ifd0_entries);
    let data_base = exif_at + if exif.is_empty() { 0 } else { ifd_len(exif.len()) };

    let mut out = b"II*\0".to_vec();
    out.extend_from_slice(&8u32.to_le_bytes());
    let mut data = Vec::new();

    out.extend_from_slice(&(ifd0_entries as u16).to_le_bytes());
    for field in ifd0 {
        write_entry(&mut out, field, data_base, &mut data);
    }
    if !exif.is_empty() {
        out.extend_from_slice(&EXIF_IFD_POINTER.to_le_bytes());
        out.extend_from_slice(&4u16.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(exif_at as u32).to_le_bytes());
    }
    out.extend_from_slice(&0u32.to_le_bytes());

    if !exif.is_empty() {
        assert_eq!(out.len(), exif_at);
        out.extend_from_slice(&(exif.len() as u16).to_le_bytes());
        for field in exif {
            write_entry(&mut out, field, data_base, &mut data);
        }
        out.extend_from_slice(&0u32.to_le_bytes());
    }

    assert_eq!(out.len(), data_base);
    out.extend(data);
    out
}

/// A JPEG whose only segment is an APP1 EXIF block.
pub fn exif_jpeg(ifd0: &[Field], exif: &[Field]) -> Vec<u8> {
    let tiff = exif_tiff(ifd0, exif);
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend(tiff);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// JPEG with only a capture time.
pub fn jpeg_captured_at(exif_datetime: &str) -> Vec<u8> {
    exif_jpeg(&[], &[Field::Ascii(DATE_TIME_ORIGINAL, exif_datetime)])
}

/// JPEG carrying EXIF, but no date tag at all.
pub fn jpeg_without_dates() -> Vec<u8> {
    exif_jpeg(&[Field::Short(ORIENTATION, 1)], &[])
}

fn atom(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

/// Minimal MP4 with a version 0 movie header. Times are Unix seconds.
pub fn mp4(created_unix: i64, modified_unix: i64) -> Vec<u8> {
    let qt = |unix: i64| if unix == 0 { 0u32 } else { (unix + 2_082_844_800) as u32 };
    let mut mvhd = vec![0u8; 4];
    mvhd.extend_from_slice(&qt(created_unix).to_be_bytes());
    mvhd.extend_from_slice(&qt(modified_unix).to_be_bytes());
    mvhd.extend_from_slice(&[0u8; 88]);

    let mut out = atom(b"ftyp", b"isom\0\0\x02\0isomiso2mp41");
    out.extend(atom(b"moov", &atom(b"mvhd", &mvhd)));
    out.extend(atom(b"mdat", &[0u8; 16]));
    out
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &b in bytes {
        crc ^= b as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

fn png_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = (data.len() as u32).to_be_bytes().to_vec();
    let mut body = kind.to_vec();
    body.extend_from_slice(data);
    out.extend_from_slice(&body);
    out.extend_from_slice(&crc32(&body).to_be_bytes());
    out
}

/// 1x1 grayscale PNG with a `tIME` chunk and no EXIF.
pub fn png_modified_at(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Vec<u8> {
    let mut out = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    out.extend(png_chunk(b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0]));
    let y = year.to_be_bytes();
    out.extend(png_chunk(b"tIME", &[y[0], y[1], month, day, hour, minute, second]));
    out.extend(png_chunk(b"IDAT", &[0x78, 0x9c, 0x63, 0x60, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01]));
    out.extend(png_chunk(b"IEND", &[]));
    out
}

pub fn write(path: &Path, bytes: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
    path.to_path_buf()
}

/// Every file under `root`, relative and with `/` separators, sorted.
pub fn tree(root: &Path) -> Vec<String> {
    let mut out: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    out.sort();
    out
}
