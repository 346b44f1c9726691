//! Parsing of verbose (`LIST`) directory listings.
//!
//! The reply to `LIST` is whatever the server feels like sending, so each
//! format gets its own [`DirEntry`] implementation. Debian mirrors all answer
//! in the classic Unix `ls -l` layout handled by [`UnixDirEntry`].

use log::warn;
use std::fmt::{self, Display};
use std::num::ParseIntError;

#[derive(Debug)]
pub enum Error {
    TooFewFields {
        line: String,
        found: usize,
    },
    InvalidNumber {
        line: String,
        field: &'static str,
        error: ParseIntError,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooFewFields { line, found } => {
                write!(
                    f,
                    "listing line has {found} fields, expected at least {}: {line:?}",
                    UnixDirEntry::MIN_FIELDS
                )
            }
            Error::InvalidNumber { line, field, error } => {
                write!(f, "invalid {field} in listing line {line:?}: {error}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::TooFewFields { .. } => None,
            Error::InvalidNumber { error, .. } => Some(error),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// One record of a `LIST` reply.
pub trait DirEntry: Sized {
    /// Parses a single line of a `LIST` reply.
    fn from_list_line(line: &str) -> Result<Self>;

    fn filename(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnixDirEntry {
    pub filename: String,
    pub perm_triad: String,
    pub link_count: u32,
    pub owner: String,
    pub group: String,
    pub size_bytes: u64,
    /// Month, day and time-or-year, as listed.
    pub mod_time: [String; 3],
}

impl UnixDirEntry {
    pub const MIN_FIELDS: usize = 9;
}

impl DirEntry for UnixDirEntry {
    fn from_list_line(line: &str) -> Result<Self> {
        let line = line.trim_end();
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < Self::MIN_FIELDS {
            return Err(Error::TooFewFields {
                line: line.to_string(),
                found: fields.len(),
            });
        }

        let number_err = |field: &'static str| {
            move |error: ParseIntError| Error::InvalidNumber {
                line: line.to_string(),
                field,
                error,
            }
        };

        // The name runs to the end of the line and may itself contain
        // whitespace, so take it as a slice rather than re-joining tokens.
        let name_start = fields[8].as_ptr() as usize - line.as_ptr() as usize;

        Ok(UnixDirEntry {
            filename: line[name_start..].to_string(),
            perm_triad: fields[0].to_string(),
            link_count: fields[1].parse().map_err(number_err("link count"))?,
            owner: fields[2].to_string(),
            group: fields[3].to_string(),
            size_bytes: fields[4].parse().map_err(number_err("size"))?,
            mod_time: [
                fields[5].to_string(),
                fields[6].to_string(),
                fields[7].to_string(),
            ],
        })
    }

    fn filename(&self) -> &str {
        &self.filename
    }
}

/// Ordered entries of one `LIST` reply, parsed with the format `E`.
#[derive(Debug)]
pub struct DirListing<E: DirEntry> {
    entries: Vec<E>,
}

impl<E: DirEntry> DirListing<E> {
    /// Parses every line with `E`. Lines `E` rejects (such as the `total`
    /// header many servers send) are skipped with a warning.
    pub fn parse_list_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut entries = Vec::with_capacity(lines.len());
        for line in lines {
            match E::from_list_line(line.as_ref()) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("skipping unparseable listing line: {e}"),
            }
        }
        DirListing { entries }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn filenames(&self) -> Vec<String> {
        self.iter().map(|e| e.filename().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LINE: &str =
        "-rw-r--r--    1 1176     1176     12345678 Jun 10 09:12 Contents-amd64.gz";

    #[test]
    fn unix_line_is_parsed() {
        let entry = UnixDirEntry::from_list_line(LINE).unwrap();
        assert_eq!(
            entry,
            UnixDirEntry {
                filename: "Contents-amd64.gz".to_string(),
                perm_triad: "-rw-r--r--".to_string(),
                link_count: 1,
                owner: "1176".to_string(),
                group: "1176".to_string(),
                size_bytes: 12345678,
                mod_time: ["Jun".to_string(), "10".to_string(), "09:12".to_string()],
            }
        );
    }

    #[test]
    fn filename_keeps_internal_whitespace() {
        let line = "drwxr-xr-x 2 ftp ftp 4096 Jan  1  2023 my   odd\tname ";
        let entry = UnixDirEntry::from_list_line(line).unwrap();
        assert_eq!(entry.filename(), "my   odd\tname");
        assert_eq!(entry.mod_time[2], "2023");
    }

    #[test]
    fn short_line_is_rejected() {
        match UnixDirEntry::from_list_line("total 48") {
            Err(Error::TooFewFields { found, .. }) => assert_eq!(found, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_size_is_rejected() {
        let line = "-rw-r--r-- 1 ftp ftp big Jun 10 09:12 file";
        assert!(matches!(
            UnixDirEntry::from_list_line(line),
            Err(Error::InvalidNumber { field: "size", .. })
        ));
    }

    #[test]
    fn listing_skips_bad_lines_and_keeps_order() {
        let lines = [
            "total 8",
            "lrwxrwxrwx 1 ftp ftp 17 Jun 10 09:12 Contents-all.gz -> Contents-amd64.gz",
            LINE,
        ];
        let listing = DirListing::<UnixDirEntry>::parse_list_lines(&lines);
        assert_eq!(listing.len(), 2);
        assert_eq!(
            listing.filenames(),
            vec![
                "Contents-all.gz -> Contents-amd64.gz".to_string(),
                "Contents-amd64.gz".to_string()
            ]
        );
    }
}
