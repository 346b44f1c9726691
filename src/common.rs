pub const MIRROR_HOST: &'static str = "ftp.uk.debian.org";
pub const MIRROR_PORT: u16 = 21;
pub const REPO_PATH: &'static str = "/debian/dists/stable/main/";

pub const ANONYMOUS_USER: &'static str = "anonymous";
pub const ANONYMOUS_PASSWORD: &'static str = "anonymous";

/// Content index files are published as `Contents-<arch>.gz`.
pub const CONTENTS_PREFIX: &'static str = "Contents";
pub const CONTENTS_ARCH_SEPARATOR: char = '-';
pub const CONTENTS_SUFFIX: &'static str = ".gz";

/// Some LIST formats annotate names with a target or hash after this marker.
pub const ANNOTATION_MARKER: &'static str = "->";

/// Strips a trailing `-> ...` annotation from a listed file name.
pub fn strip_annotation(name: &str) -> &str {
    match name.split_once(ANNOTATION_MARKER) {
        Some((name, _)) => name.trim(),
        None => name.trim(),
    }
}
