mod cli;
mod common;
mod contents;
mod listing;
mod mirror;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use common::MIRROR_PORT;
use contents::ArchitectureIndex;
use log::{debug, error, LevelFilter};
use mirror::{FtpSession, Mirror, Session};
use std::io::{self, Write};
use std::process::ExitCode;

/// How a run ended, short of an error.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Reported,
    ArchsListed,
    NoData,
    UnknownArch,
}

impl Outcome {
    fn exit_code(&self) -> ExitCode {
        match self {
            Outcome::Reported | Outcome::ArchsListed => ExitCode::SUCCESS,
            Outcome::NoData | Outcome::UnknownArch => ExitCode::from(1),
        }
    }
}

fn init_logger(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder
                .filter_module(module_path!(), LevelFilter::Info)
                .filter_module("suppaftp", LevelFilter::Debug);
        }
        _ => {
            builder
                .filter_module(module_path!(), LevelFilter::Info)
                .filter_module("suppaftp", LevelFilter::Trace);
        }
    }
    builder.init();
}

fn write_valid_archs<W: Write>(out: &mut W, content_files: &ArchitectureIndex) -> io::Result<()> {
    for arch in content_files.keys() {
        writeln!(out, "  - {arch}")?;
    }
    Ok(())
}

fn write_report<W: Write>(out: &mut W, top_n: u64, top: &[(String, usize)]) -> io::Result<()> {
    writeln!(out, "Top {top_n} packages by number of associated files:")?;
    for (i, (package, count)) in top.iter().enumerate() {
        writeln!(out, "  {:>3}: [{:>5}] {}", i + 1, count, package)?;
    }
    writeln!(out)
}

fn run<S: Session, W: Write>(
    cli: &Cli,
    mirror: &mut Mirror<S>,
    out: &mut W,
) -> anyhow::Result<Outcome> {
    mirror.set_debug_level(cli.verbose);
    mirror.set_passive_mode(cli.passive_mode());
    debug!(
        "session options: debug level {}, passive mode {}",
        mirror.debug_level(),
        mirror.passive_mode()
    );
    mirror
        .connect()
        .with_context(|| format!("could not open a session with {}", cli.mirror))?;

    let listing = mirror
        .list(Some(cli.repo_path.as_str()))
        .with_context(|| format!("could not list {} on {}", cli.repo_path, cli.mirror))?;
    let content_files = contents::extract_architectures(&listing);
    if content_files.is_empty() {
        writeln!(
            out,
            "[!] No files were found. Please note any errors above, and retry."
        )?;
        return Ok(Outcome::NoData);
    }

    if cli.list_archs {
        writeln!(out, "Available architectures:")?;
        write_valid_archs(out, &content_files)?;
        return Ok(Outcome::ArchsListed);
    }

    let arch = cli
        .arch
        .as_deref()
        .context("an architecture is required unless --list-archs is given")?;
    let filename = match content_files.get(arch) {
        Some(filename) => filename,
        None => {
            writeln!(
                out,
                "Content file not available for architecture \"{arch}\". Available options:"
            )?;
            write_valid_archs(out, &content_files)?;
            return Ok(Outcome::UnknownArch);
        }
    };

    let index_data = mirror
        .read(filename, true)
        .with_context(|| format!("could not read the content index for {arch}"))?;
    let top_n = usize::try_from(cli.top_n).context("--top-n is too large")?;
    let top = contents::top_n_packages_by_files(&index_data, top_n);
    write_report(out, cli.top_n, &top)?;
    Ok(Outcome::Reported)
}

fn try_main(cli: &Cli) -> anyhow::Result<Outcome> {
    let mut mirror = Mirror::new(FtpSession::new(&cli.mirror, MIRROR_PORT));
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut mirror, &mut out)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    match try_main(&cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(error) => {
            let mut msg = format!("{}", error);
            for cause in error.chain().skip(1) {
                msg += &format!("\n\tCaused by: {}", cause);
            }
            error!("{}", msg);
            ExitCode::FAILURE
        }
    }
}
