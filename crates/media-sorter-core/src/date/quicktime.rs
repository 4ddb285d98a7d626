//! Movie header times from ISO base media / QuickTime files (MP4, MOV, 3GP).

use chrono::{DateTime, NaiveDateTime};
use std::io::{self, Read, Seek, SeekFrom};

use crate::error::ContainerError;

/// Seconds between 1904-01-01 (QuickTime epoch) and 1970-01-01.
const QT_TO_UNIX_OFFSET: i64 = 2_082_844_800;

/// Box types that may open a QuickTime-family file. Matching one is only a
/// hint; [`read_movie_times`] checks the structure.
const LEADING_ATOMS: [&[u8; 4]; 7] = [b"ftyp", b"moov", b"mdat", b"wide", b"free", b"skip", b"pnot"];

pub(crate) fn is_quicktime(head: &[u8]) -> bool {
    if head.len() < 8 {
        return false;
    }
    let size = u32::from_be_bytes([head[0], head[1], head[2], head[3]]);
    let kind = &head[4..8];
    (size == 0 || size == 1 || size >= 8) && LEADING_ATOMS.iter().any(|a| kind == &a[..])
}

/// Creation and modification time from `moov/mvhd`, both UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovieTimes {
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy)]
struct Atom {
    kind: [u8; 4],
    data_start: u64,
    data_end: u64,
}

/// Read the movie header times.
///
/// The top-level atoms have to cover the file exactly and include `ftyp` or
/// `moov`; anything else is corrupt or not a QuickTime file. A file with
/// `ftyp` but no `moov` (HEIF, AVIF) is valid and has no movie times.
pub fn read_movie_times<R: Read + Seek>(reader: &mut R) -> Result<MovieTimes, ContainerError> {
    let len = reader.seek(SeekFrom::End(0))?;
    let top = list_atoms(reader, 0, len)?;

    let Some(moov) = top.iter().find(|a| &a.kind == b"moov") else {
        if top.iter().any(|a| &a.kind == b"ftyp") {
            return Ok(MovieTimes::default());
        }
        return Err(ContainerError::corrupt("no ftyp or moov atom"));
    };
    let children = list_atoms(reader, moov.data_start, moov.data_end)?;
    let mvhd = children
        .iter()
        .find(|a| &a.kind == b"mvhd")
        .ok_or_else(|| ContainerError::corrupt("moov atom has no mvhd"))?;
    parse_mvhd(reader, mvhd)
}

/// Atoms laid end to end between `start` and `end`.
fn list_atoms<R: Read + Seek>(reader: &mut R, start: u64, end: u64) -> Result<Vec<Atom>, ContainerError> {
    let mut atoms = Vec::new();
    let mut offset = start;
    while offset < end {
        if end - offset < 8 {
            return Err(ContainerError::corrupt(format!("truncated atom header at {}", offset)));
        }
        reader.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let mut size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let mut header_size = 8u64;

        if size == 1 {
            size = read_u64(reader)?;
            header_size = 16;
        } else if size == 0 {
            size = end - offset;
        }
        if size < header_size || size > end - offset {
            return Err(ContainerError::corrupt(format!(
                "atom {:?} at {} has size {} but {} bytes remain",
                String::from_utf8_lossy(&header[4..8]),
                offset,
                size,
                end - offset
            )));
        }

        atoms.push(Atom {
            kind: [header[4], header[5], header[6], header[7]],
            data_start: offset + header_size,
            data_end: offset + size,
        });
        offset += size;
    }
    Ok(atoms)
}

fn parse_mvhd<R: Read + Seek>(reader: &mut R, mvhd: &Atom) -> Result<MovieTimes, ContainerError> {
    let too_short = || ContainerError::corrupt("mvhd atom too short");
    let len = mvhd.data_end - mvhd.data_start;
    if len < 12 {
        return Err(too_short());
    }
    reader.seek(SeekFrom::Start(mvhd.data_start))?;
    let mut version_flags = [0u8; 4];
    reader.read_exact(&mut version_flags)?;
    let (created, modified) = if version_flags[0] == 1 {
        if len < 20 {
            return Err(too_short());
        }
        (read_u64(reader)?, read_u64(reader)?)
    } else {
        (read_u32(reader)? as u64, read_u32(reader)? as u64)
    };
    Ok(MovieTimes {
        created: qt_seconds_to_naive(created),
        modified: qt_seconds_to_naive(modified),
    })
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

/// Zero is what encoders write when they have no clock; treat it as absent.
fn qt_seconds_to_naive(qt_seconds: u64) -> Option<NaiveDateTime> {
    if qt_seconds == 0 {
        return None;
    }
    let unix = i64::try_from(qt_seconds).ok()?.checked_sub(QT_TO_UNIX_OFFSET)?;
    DateTime::from_timestamp(unix, 0).map(|utc| utc.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn atom(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(body);
        out
    }

    fn movie(created: u32, modified: u32) -> Vec<u8> {
        let mut mvhd = vec![0u8; 4];
        mvhd.extend_from_slice(&created.to_be_bytes());
        mvhd.extend_from_slice(&modified.to_be_bytes());
        mvhd.extend_from_slice(&[0u8; 88]);
        let mut file = atom(b"ftyp", b"isom\0\0\x02\0isom");
        file.extend(atom(b"free", &[0u8; 4]));
        file.extend(atom(b"moov", &atom(b"mvhd", &mvhd)));
        file
    }

    #[test]
    fn test_sniff() {
        assert!(is_quicktime(&movie(0, 0)));
        assert!(!is_quicktime(b"just some exported bytes"));
        assert!(!is_quicktime(b"\0\0"));
    }

    #[test]
    fn test_mvhd_times() {
        // 2017-06-30 14:03:33 UTC
        let unix = 1_498_831_413i64;
        let qt = (unix + QT_TO_UNIX_OFFSET) as u32;
        let times = read_movie_times(&mut Cursor::new(movie(qt, qt + 60))).unwrap();
        assert_eq!(times.created.unwrap().to_string(), "2017-06-30 14:03:33");
        assert_eq!(times.modified.unwrap().to_string(), "2017-06-30 14:04:33");
    }

    #[test]
    fn test_zero_times_are_absent() {
        let times = read_movie_times(&mut Cursor::new(movie(0, 0))).unwrap();
        assert_eq!(times, MovieTimes::default());
    }

    #[test]
    fn test_ftyp_without_moov() {
        let file = atom(b"ftyp", b"heic\0\0\0\0mif1heic");
        assert_eq!(read_movie_times(&mut Cursor::new(file)).unwrap(), MovieTimes::default());
    }

    #[test]
    fn test_truncated_movie() {
        let mut file = movie(1, 1);
        file.truncate(file.len() - 10);
        let err = read_movie_times(&mut Cursor::new(file)).unwrap_err();
        assert!(matches!(err, ContainerError::Corrupt(_)));

        let header_only = b"\xff\xff\xff\xffftypisom".to_vec();
        assert!(matches!(
            read_movie_times(&mut Cursor::new(header_only)),
            Err(ContainerError::Corrupt(_))
        ));
    }

    #[test]
    fn test_text_with_atom_name_is_rejected() {
        let text = b"I'm free to go home now\n".to_vec();
        assert!(is_quicktime(&text));
        assert!(matches!(
            read_movie_times(&mut Cursor::new(text)),
            Err(ContainerError::Corrupt(_))
        ));
    }

    #[test]
    fn test_moov_needs_mvhd() {
        let mut file = atom(b"ftyp", b"isom\0\0\x02\0isom");
        file.extend(atom(b"moov", &atom(b"trak", &[0u8; 8])));
        assert!(read_movie_times(&mut Cursor::new(file)).is_err());
    }
}
