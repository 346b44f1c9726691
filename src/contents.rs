//! Content index files (`Contents-<arch>.gz`) and the statistics drawn from them.

use crate::common::{self, CONTENTS_ARCH_SEPARATOR, CONTENTS_PREFIX, CONTENTS_SUFFIX};
use log::{debug, trace, warn};
use std::collections::{BTreeMap, HashMap};

/// Maps each architecture to the name of its content index file.
pub type ArchitectureIndex = BTreeMap<String, String>;

/// Picks the content index files out of a directory listing, keyed by
/// architecture.
pub fn extract_architectures<S: AsRef<str>>(listing: &[S]) -> ArchitectureIndex {
    let mut archs = ArchitectureIndex::new();
    for name in listing {
        let name = name.as_ref();
        if !name.starts_with(CONTENTS_PREFIX) {
            continue;
        }
        let filename = common::strip_annotation(name);
        match architecture_of(filename) {
            Some(arch) => {
                archs.insert(arch.to_string(), filename.to_string());
            }
            None => debug!("{filename} does not look like a content index, skipping"),
        }
    }
    archs
}

fn architecture_of(filename: &str) -> Option<&str> {
    let arch = filename
        .strip_prefix(CONTENTS_PREFIX)?
        .strip_prefix(CONTENTS_ARCH_SEPARATOR)?
        .strip_suffix(CONTENTS_SUFFIX)?;
    if arch.is_empty() {
        None
    } else {
        Some(arch)
    }
}

/// One line of a content index: a file path followed by the packages
/// that ship it.
#[derive(Debug, PartialEq, Eq)]
pub struct ContentRecord<'l> {
    fields: Vec<&'l str>,
}

impl<'l> ContentRecord<'l> {
    pub fn path(&self) -> String {
        self.fields[..self.fields.len() - 1].join(" ")
    }

    /// Packages named in the last column, e.g. `admin/foo,net/bar`.
    pub fn packages(&self) -> impl Iterator<Item = &'l str> {
        self.fields[self.fields.len() - 1].split(',')
    }
}

/// Parses a content index line. Returns `None` for lines that cannot be a
/// record: the only thing known for sure about the format is that the
/// package list is the last whitespace separated column.
pub fn parse_content_index_entry(line: &str) -> Option<ContentRecord<'_>> {
    if !line.contains(char::is_whitespace) {
        return None;
    }
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() {
        return None;
    }
    Some(ContentRecord { fields })
}

/// Occurrence counts per package, remembering the order packages were
/// first seen so that ties rank in discovery order.
#[derive(Debug, Default)]
pub struct PackageCount {
    positions: HashMap<String, usize>,
    counts: Vec<(String, usize)>,
}

impl PackageCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, package: &str) {
        match self.positions.get(package) {
            Some(&pos) => self.counts[pos].1 += 1,
            None => {
                self.positions.insert(package.to_string(), self.counts.len());
                self.counts.push((package.to_string(), 1));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// The `n` packages with the highest counts, highest first.
    pub fn most_common(&self, n: usize) -> Vec<(String, usize)> {
        let mut ranked = self.counts.clone();
        // Stable sort, so equal counts stay in insertion order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

/// Counts how many files each package ships in a decompressed content
/// index and returns the `n` packages with the most files.
pub fn top_n_packages_by_files(index_data: &[u8], n: usize) -> Vec<(String, usize)> {
    let index_txt = String::from_utf8_lossy(index_data);
    let mut package_count = PackageCount::new();

    for (i, raw_line) in index_txt.lines().enumerate() {
        let record = match parse_content_index_entry(raw_line) {
            Some(record) => record,
            None => {
                warn!("found potentially invalid entry on line {i}, skipping");
                continue;
            }
        };
        trace!("{}: {}", record.path(), record.fields[record.fields.len() - 1]);
        for package in record.packages() {
            package_count.add(package);
        }
    }
    debug!("counted {} distinct packages", package_count.len());
    package_count.most_common(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(items: &[(&str, usize)]) -> Vec<(String, usize)> {
        items.iter().map(|(p, c)| (p.to_string(), *c)).collect()
    }

    #[test]
    fn architectures_are_extracted() {
        let archs = extract_architectures(&["Contents-amd64.gz", "Contents-source.gz", "README"]);
        let expected: ArchitectureIndex = [
            ("amd64".to_string(), "Contents-amd64.gz".to_string()),
            ("source".to_string(), "Contents-source.gz".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(archs, expected);
    }

    #[test]
    fn annotations_and_udeb_names_are_handled() {
        let archs = extract_architectures(&[
            "Contents-arm64.gz -> 5d41402abc4b2a76",
            "Contents-udeb-amd64.gz",
            "Contents-amd64.gz",
            "Contents.gz",
            "Contents-.gz",
            "Contents-i386",
        ]);
        assert_eq!(
            archs.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["amd64", "arm64", "udeb-amd64"]
        );
        assert_eq!(archs["arm64"], "Contents-arm64.gz");
        assert_eq!(archs["udeb-amd64"], "Contents-udeb-amd64.gz");
    }

    #[test]
    fn content_line_is_parsed() {
        let record = parse_content_index_entry("bin/foo 1.0  pkgA,pkgB").unwrap();
        assert_eq!(record.fields, vec!["bin/foo", "1.0", "pkgA,pkgB"]);
        assert_eq!(record.path(), "bin/foo 1.0");
        assert_eq!(record.packages().collect::<Vec<_>>(), vec!["pkgA", "pkgB"]);
    }

    #[test]
    fn lines_without_columns_are_invalid() {
        assert_eq!(parse_content_index_entry("no-whitespace-here"), None);
        assert_eq!(parse_content_index_entry(""), None);
        assert_eq!(parse_content_index_entry("   \t "), None);
    }

    #[test]
    fn packages_are_counted() {
        let top = top_n_packages_by_files(b"path/a x,y\npath/b x\n", 2);
        assert_eq!(top, pairs(&[("x", 2), ("y", 1)]));
    }

    #[test]
    fn invalid_lines_are_skipped() {
        let top = top_n_packages_by_files(b"garbage\npath/a x\n\npath/b y,x\n", 10);
        assert_eq!(top, pairs(&[("x", 2), ("y", 1)]));
    }

    #[test]
    fn ties_rank_in_discovery_order() {
        let top = top_n_packages_by_files(b"a p3\nb p1\nc p2\nd p1,p2\ne p3\n", 3);
        assert_eq!(top, pairs(&[("p3", 2), ("p1", 2), ("p2", 2)]));
    }

    #[test]
    fn asking_for_more_than_exists_returns_everything() {
        let top = top_n_packages_by_files(b"a x\nb y\n", 50);
        assert_eq!(top, pairs(&[("x", 1), ("y", 1)]));
    }

    #[test]
    fn aggregation_is_repeatable() {
        let data = b"usr/bin/a admin/a\nusr/bin/b admin/a,net/b\nusr/share/c net/b\n";
        assert_eq!(
            top_n_packages_by_files(data, 10),
            top_n_packages_by_files(data, 10)
        );
    }

    #[test]
    fn package_count_tracks_totals() {
        let mut count = PackageCount::new();
        count.add("a");
        count.add("b");
        count.add("a");
        assert_eq!(count.len(), 2);
        assert_eq!(count.most_common(1), pairs(&[("a", 2)]));
        assert_eq!(count.most_common(0), pairs(&[]));
    }
}
