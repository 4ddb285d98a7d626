//! The PNG `tIME` chunk: last modification time of the image, UTC.

use chrono::{NaiveDate, NaiveDateTime};
use std::io::{self, Read};

use crate::error::ContainerError;

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

pub(crate) fn is_png(head: &[u8]) -> bool {
    head.starts_with(&SIGNATURE)
}

/// Walk every chunk from `IHDR` to `IEND` and return the `tIME` value, if
/// any. Running out of data before `IEND` means the file is truncated.
pub fn read_modified_time<R: Read>(reader: &mut R) -> Result<Option<NaiveDateTime>, ContainerError> {
    let mut signature = [0u8; 8];
    reader.read_exact(&mut signature)?;
    if signature != SIGNATURE {
        return Err(ContainerError::corrupt("missing PNG signature"));
    }

    let mut modified = None;
    let mut first = true;
    loop {
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let kind = &header[4..8];

        if first && kind != b"IHDR" {
            return Err(ContainerError::corrupt("first PNG chunk is not IHDR"));
        }
        first = false;

        if kind == b"IEND" {
            return Ok(modified);
        }
        if kind == b"tIME" && len == 7 {
            let mut data = [0u8; 7];
            reader.read_exact(&mut data)?;
            modified = decode_time(&data);
            skip(reader, 4)?;
        } else {
            // Chunk data plus CRC.
            skip(reader, len + 4)?;
        }
    }
}

fn skip<R: Read>(reader: &mut R, n: u64) -> Result<(), ContainerError> {
    let skipped = io::copy(&mut reader.by_ref().take(n), &mut io::sink())?;
    if skipped < n {
        return Err(ContainerError::corrupt("file is truncated"));
    }
    Ok(())
}

fn decode_time(data: &[u8; 7]) -> Option<NaiveDateTime> {
    let year = u16::from_be_bytes([data[0], data[1]]);
    NaiveDate::from_ymd_opt(year as i32, data[2] as u32, data[3] as u32)?.and_hms_opt(
        data[4] as u32,
        data[5] as u32,
        data[6] as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = (data.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        out.extend_from_slice(&[0u8; 4]);
        out
    }

    fn png(time: Option<[u8; 7]>) -> Vec<u8> {
        let mut out = SIGNATURE.to_vec();
        out.extend(chunk(b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0]));
        if let Some(t) = time {
            out.extend(chunk(b"tIME", &t));
        }
        out.extend(chunk(b"IEND", &[]));
        out
    }

    #[test]
    fn test_time_chunk() {
        let t = [0x07, 0xE1, 6, 30, 14, 3, 33];
        let got = read_modified_time(&mut Cursor::new(png(Some(t)))).unwrap();
        assert_eq!(got.unwrap().to_string(), "2017-06-30 14:03:33");
    }

    #[test]
    fn test_no_time_chunk() {
        assert_eq!(read_modified_time(&mut Cursor::new(png(None))).unwrap(), None);
    }

    #[test]
    fn test_zeroed_time_is_absent() {
        let got = read_modified_time(&mut Cursor::new(png(Some([0; 7])))).unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn test_truncated() {
        let mut data = png(None);
        data.truncate(20);
        assert!(matches!(
            read_modified_time(&mut Cursor::new(data)),
            Err(ContainerError::Corrupt(_))
        ));

        // Signature and nothing else.
        let bare = SIGNATURE.to_vec();
        assert!(read_modified_time(&mut Cursor::new(bare)).is_err());

        // Time chunk present, but the file stops before IEND.
        let mut data = png(Some([0x07, 0xE1, 6, 30, 14, 3, 33]));
        data.truncate(data.len() - 12);
        assert!(read_modified_time(&mut Cursor::new(data)).is_err());
    }

    #[test]
    fn test_ihdr_must_come_first() {
        let mut data = SIGNATURE.to_vec();
        data.extend(chunk(b"IEND", &[]));
        assert!(read_modified_time(&mut Cursor::new(data)).is_err());
    }
}
