use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use exif::{Exif, In, Reader, Tag, Value};
use std::io::{BufRead, Seek};
use std::path::Path;

use super::{DateSource, FieldIssue, MediaMetadata};
use crate::error::MetadataError;

const DATE_TAGS: [(Tag, DateSource); 3] = [
    (Tag::DateTimeOriginal, DateSource::Capture),
    (Tag::DateTime, DateSource::Generic),
    (Tag::DateTimeDigitized, DateSource::Digitized),
];

/// Read the EXIF date tags from any container kamadak-exif understands.
/// A container without an EXIF block is not an error.
pub(crate) fn read_exif<R: BufRead + Seek>(
    reader: &mut R,
    meta: &mut MediaMetadata,
) -> Result<(), exif::Error> {
    let exif = match Reader::new().read_from_container(reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(()),
        Err(e) => return Err(e),
    };
    collect_dates(&exif, meta);
    Ok(())
}

pub(crate) fn into_metadata_error(path: &Path, err: exif::Error) -> MetadataError {
    match err {
        exif::Error::Io(source) => MetadataError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => MetadataError::Unsupported {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

fn collect_dates(exif: &Exif, meta: &mut MediaMetadata) {
    for (tag, source) in DATE_TAGS {
        match field_date(exif, tag) {
            Ok(value) => meta.fields.offer(source, value),
            Err(reason) => meta.issues.push(FieldIssue { source, reason }),
        }
    }
}

fn field_date(exif: &Exif, tag: Tag) -> Result<Option<NaiveDateTime>, String> {
    let Some(field) = exif.get_field(tag, In::PRIMARY) else {
        return Ok(None);
    };
    // Read the raw ASCII; display_value() quotes the string.
    let Value::Ascii(ref parts) = field.value else {
        return Err(format!("{} is not an ASCII value", tag));
    };
    let Some(raw) = parts.iter().find(|p| !p.is_empty()) else {
        return Ok(None);
    };
    let text = std::str::from_utf8(raw).map_err(|_| format!("{} is not valid text", tag))?;
    if is_sentinel(text) {
        return Ok(None);
    }
    parse_exif_datetime(text)
        .map(Some)
        .ok_or_else(|| format!("cannot parse {} value {:?}", tag, text))
}

/// Placeholder values cameras write when the clock was never set.
fn is_sentinel(s: &str) -> bool {
    s.chars().all(|c| matches!(c, '0' | ':' | '-' | ' ' | '\0'))
}

/// Parse `YYYY:MM:DD HH:MM:SS`, tolerating other date separators, a `T`
/// between date and time, and trailing sub-seconds or offsets.
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let mut parts = s
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .splitn(2, |c: char| c.is_whitespace() || c == 'T');

    let date = parts
        .next()?
        .replace(|c: char| matches!(c, '-' | '/' | '\\' | '.'), ":");
    let date = NaiveDate::parse_from_str(&date, "%Y:%m:%d").ok()?;

    let Some(time) = parts.next().map(str::trim).filter(|t| !t.is_empty()) else {
        return date.and_hms_opt(0, 0, 0);
    };
    let time: String = time
        .chars()
        .take(8)
        .map(|c| if c == '.' { ':' } else { c })
        .collect();
    let time = NaiveTime::parse_from_str(&time, "%H:%M:%S").ok()?;
    Some(date.and_time(time))
}
