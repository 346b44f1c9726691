/*

package-statistics amd64
package-statistics arm64 --top-n 25 --passive-mode
package-statistics --list-archs --mirror ftp.de.debian.org
 */

use crate::common::{MIRROR_HOST, REPO_PATH};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Retrieve statistics about packages for a given architecture.")]
pub struct Cli {
    /// Architecture to retrieve statistics for.
    #[arg(value_name = "ARCH", required_unless_present = "list_archs")]
    pub arch: Option<String>,
    /// Set the FTP session log level. 0 is silent, 2 is the loudest setting.
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    pub verbose: u8,
    /// Number of top packages to output.
    #[arg(
        short = 'n',
        long,
        value_name = "N",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub top_n: u64,
    /// Run FTP operations in passive mode.
    /// Try this if encountering connection or socket issues.
    #[arg(long, overrides_with = "no_passive_mode", verbatim_doc_comment)]
    passive_mode: bool,
    /// Run FTP operations in active mode (the default).
    #[arg(long, overrides_with = "passive_mode")]
    no_passive_mode: bool,
    /// Host name of the Debian FTP mirror to query.
    #[arg(long, value_name = "HOST", default_value = MIRROR_HOST)]
    pub mirror: String,
    /// Directory on the mirror holding the content index files.
    #[arg(long, value_name = "PATH", default_value = REPO_PATH)]
    pub repo_path: String,
    /// Print the architectures available on the mirror and exit.
    #[arg(long)]
    pub list_archs: bool,
}

impl Cli {
    pub fn passive_mode(&self) -> bool {
        self.passive_mode && !self.no_passive_mode
    }
}
