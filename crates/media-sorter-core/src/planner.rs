use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Year,
    Month,
    Day,
}

/// Dated output path with `{year}`, `{month}` and `{day}` placeholders.
/// Placeholder names ignore case, `{{` and `}}` are literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl OutputTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((at, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|&(_, n)| n) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().map(|&(_, n)| n) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, '{')) | None => return Err(TemplateError::UnbalancedBrace { at }),
                            Some((_, n)) => name.push(n),
                        }
                    }
                    let segment = match name.trim().to_ascii_lowercase().as_str() {
                        "year" => Segment::Year,
                        "month" => Segment::Month,
                        "day" => Segment::Day,
                        _ => return Err(TemplateError::UnknownPlaceholder { name }),
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '}' => return Err(TemplateError::UnbalancedBrace { at }),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The year is printed with at least four digits, month and day with two.
    pub fn render(&self, date: NaiveDate) -> PathBuf {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Year => out.push_str(&format!("{:04}", date.year())),
                Segment::Month => out.push_str(&format!("{:02}", date.month())),
                Segment::Day => out.push_str(&format!("{:02}", date.day())),
            }
        }
        PathBuf::from(out)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Every directory a file can be copied into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub dated: OutputTemplate,
    pub unknown_date: PathBuf,
    pub duplicates: PathBuf,
    pub not_supported: PathBuf,
}

/// The plain-string form of [`OutputLayout`], as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub dated: String,
    pub unknown_date: PathBuf,
    pub duplicates: PathBuf,
    pub not_supported: PathBuf,
}

impl LayoutOptions {
    /// `root/{year}/{month}/{day}`, `root/UnknownDate`, `root/Duplicates`
    /// and `root/NotSupported`.
    /// Braces already in `root` are escaped so they stay literal.
    pub fn under(root: &Path) -> Self {
        let escaped = root.to_string_lossy().replace('{', "{{").replace('}', "}}");
        let dated = Path::new(&escaped).join("{year}").join("{month}").join("{day}");
        Self {
            dated: dated.to_string_lossy().into_owned(),
            unknown_date: root.join("UnknownDate"),
            duplicates: root.join("Duplicates"),
            not_supported: root.join("NotSupported"),
        }
    }

    pub fn compile(&self) -> Result<OutputLayout, TemplateError> {
        Ok(OutputLayout {
            dated: OutputTemplate::parse(&self.dated)?,
            unknown_date: self.unknown_date.clone(),
            duplicates: self.duplicates.clone(),
            not_supported: self.not_supported.clone(),
        })
    }
}

/// Destination directory for a file. Without a date the file goes to the
/// unknown-date bucket and the tag is dropped.
pub fn plan(date: Option<NaiveDate>, tag: Option<&str>, layout: &OutputLayout) -> PathBuf {
    let Some(date) = date else {
        return layout.unknown_date.clone();
    };
    let dir = layout.dated.render(date);
    match tag {
        Some(tag) => dir.join(tag),
        None => dir,
    }
}
