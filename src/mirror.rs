use crate::common::{ANONYMOUS_PASSWORD, ANONYMOUS_USER};
use crate::listing::{DirEntry, DirListing, UnixDirEntry};
use flate2::read::GzDecoder;
use log::{debug, info, warn};
use std::fmt::{self, Display};
use std::io::Read;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Mode};

#[derive(Debug)]
pub enum Error {
    NotConnected,
    Connect { host: String, error: FtpError },
    Login { host: String, error: FtpError },
    TransferType(FtpError),
    ChangeDir { path: String, error: FtpError },
    List { command: &'static str, error: FtpError },
    Retrieve { path: String, error: FtpError },
    Decompress { path: String, error: std::io::Error },
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotConnected => write!(f, "no session is open with the mirror"),
            Error::Connect { host, error } => {
                write!(f, "failed to connect to {host}: {error}")
            }
            Error::Login { host, error } => {
                write!(f, "anonymous login to {host} failed: {error}")
            }
            Error::TransferType(e) => {
                write!(f, "failed to switch the session to binary transfers: {e}")
            }
            Error::ChangeDir { path, error } => {
                write!(f, "failed to change directory to {path}: {error}")
            }
            Error::List { command, error } => {
                write!(f, "{command} listing failed: {error}")
            }
            Error::Retrieve { path, error } => {
                write!(f, "failed to retrieve {path}: {error}")
            }
            Error::Decompress { path, error } => {
                write!(f, "failed to gzip decompress {path}: {error}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotConnected => None,
            Error::Connect { error, .. } => Some(error),
            Error::Login { error, .. } => Some(error),
            Error::TransferType(e) => Some(e),
            Error::ChangeDir { error, .. } => Some(error),
            Error::List { error, .. } => Some(error),
            Error::Retrieve { error, .. } => Some(error),
            Error::Decompress { error, .. } => Some(error),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The file transfer operations a [`Mirror`] needs from its client.
pub trait Session {
    /// Opens a fresh, logged in session, replacing any existing one.
    fn connect(&mut self) -> Result<()>;
    fn set_passive_mode(&mut self, passive: bool);
    fn cwd(&mut self, path: &str) -> Result<()>;
    /// Bare names of the working directory (`NLST`).
    fn name_list(&mut self) -> Result<Vec<String>>;
    /// Raw `LIST` reply lines for the working directory.
    fn detail_list(&mut self) -> Result<Vec<String>>;
    /// Downloads a whole file in binary mode.
    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>>;
}

/// Anonymous FTP session backed by `suppaftp`.
pub struct FtpSession {
    host: String,
    port: u16,
    passive: bool,
    stream: Option<FtpStream>,
}

impl FtpSession {
    pub fn new(host: &str, port: u16) -> Self {
        FtpSession {
            host: host.to_string(),
            port,
            passive: false,
            stream: None,
        }
    }

    fn mode(&self) -> Mode {
        if self.passive {
            Mode::Passive
        } else {
            Mode::Active
        }
    }

    fn stream(&mut self) -> Result<&mut FtpStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }
}

impl Session for FtpSession {
    fn connect(&mut self) -> Result<()> {
        if let Some(mut old) = self.stream.take() {
            if let Err(e) = old.quit() {
                debug!("ignoring error while closing previous session: {e}");
            }
        }

        let mut stream =
            FtpStream::connect((self.host.as_str(), self.port)).map_err(|error| {
                Error::Connect {
                    host: self.host.clone(),
                    error,
                }
            })?;
        stream
            .login(ANONYMOUS_USER, ANONYMOUS_PASSWORD)
            .map_err(|error| Error::Login {
                host: self.host.clone(),
                error,
            })?;
        stream
            .transfer_type(FileType::Binary)
            .map_err(Error::TransferType)?;
        stream.set_mode(self.mode());
        self.stream = Some(stream);
        Ok(())
    }

    fn set_passive_mode(&mut self, passive: bool) {
        self.passive = passive;
        let mode = self.mode();
        if let Some(stream) = self.stream.as_mut() {
            stream.set_mode(mode);
        }
    }

    fn cwd(&mut self, path: &str) -> Result<()> {
        self.stream()?
            .cwd(path)
            .map_err(|error| Error::ChangeDir {
                path: path.to_string(),
                error,
            })
    }

    fn name_list(&mut self) -> Result<Vec<String>> {
        self.stream()?
            .nlst(None)
            .map_err(|error| Error::List {
                command: "NLST",
                error,
            })
    }

    fn detail_list(&mut self) -> Result<Vec<String>> {
        self.stream()?
            .list(None)
            .map_err(|error| Error::List {
                command: "LIST",
                error,
            })
    }

    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>> {
        let buffer = self
            .stream()?
            .retr_as_buffer(path)
            .map_err(|error| Error::Retrieve {
                path: path.to_string(),
                error,
            })?;
        Ok(buffer.into_inner())
    }
}

/// Ways of listing a directory, tried in order until one succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListStrategy {
    NameList,
    DetailList,
}

const LIST_STRATEGIES: [ListStrategy; 2] = [ListStrategy::NameList, ListStrategy::DetailList];

pub struct Mirror<S: Session> {
    session: S,
    debug_level: u8,
    passive_mode: bool,
}

impl<S: Session> Mirror<S> {
    /// Wraps `session`. Transfers default to active mode.
    pub fn new(mut session: S) -> Self {
        session.set_passive_mode(false);
        Mirror {
            session,
            debug_level: 0,
            passive_mode: false,
        }
    }

    /// 0 is silent, 1 logs each command issued, 2 also logs reply summaries.
    pub fn set_debug_level(&mut self, level: u8) {
        self.debug_level = level;
    }

    pub fn debug_level(&self) -> u8 {
        self.debug_level
    }

    pub fn set_passive_mode(&mut self, passive: bool) {
        self.passive_mode = passive;
        self.session.set_passive_mode(passive);
    }

    pub fn passive_mode(&self) -> bool {
        self.passive_mode
    }

    #[cfg(test)]
    pub fn session(&self) -> &S {
        &self.session
    }

    /// (Re-)initialises the session.
    pub fn connect(&mut self) -> Result<()> {
        self.command("connect");
        self.session.connect()
    }

    /// Lists the file names in `path`, or in the working directory.
    ///
    /// `NLST` is tried first and `LIST` second. When both fail the
    /// result is an empty list rather than an error, so callers see
    /// "no data" instead of a transport failure.
    pub fn list(&mut self, path: Option<&str>) -> Result<Vec<String>> {
        if let Some(path) = path {
            self.command(&format!("CWD {path}"));
            self.session.cwd(path)?;
        }

        for (attempt, strategy) in LIST_STRATEGIES.iter().enumerate() {
            match self.list_with(*strategy) {
                Ok(names) => return Ok(names),
                Err(e) if attempt + 1 < LIST_STRATEGIES.len() => {
                    warn!("server error during directory listing, trying the next method: {e}");
                }
                Err(e) => {
                    warn!(
                        "server error during directory listing; check your network settings and that the server is up: {e}"
                    );
                }
            }
        }
        Ok(Vec::new())
    }

    fn list_with(&mut self, strategy: ListStrategy) -> Result<Vec<String>> {
        match strategy {
            ListStrategy::NameList => {
                self.command("NLST");
                let names = self.session.name_list()?;
                self.reply(&format!("{} names", names.len()));
                Ok(names)
            }
            ListStrategy::DetailList => {
                self.command("LIST");
                let lines = self.session.detail_list()?;
                let listing = DirListing::<UnixDirEntry>::parse_list_lines(&lines);
                self.reply(&format!(
                    "{} lines, {} entries parsed",
                    lines.len(),
                    listing.len()
                ));
                if self.debug_level >= 2 {
                    for entry in listing.iter() {
                        info!(
                            "*entry* {} {} {}:{} {:>10} {} {}",
                            entry.perm_triad,
                            entry.link_count,
                            entry.owner,
                            entry.group,
                            entry.size_bytes,
                            entry.mod_time.join(" "),
                            entry.filename()
                        );
                    }
                }
                Ok(listing.filenames())
            }
        }
    }

    /// Downloads `path` into memory, gzip decompressing it when asked to.
    pub fn read(&mut self, path: &str, decompress: bool) -> Result<Vec<u8>> {
        self.command(&format!("RETR {path}"));
        let raw = self.session.retrieve(path)?;
        self.reply(&format!("{} bytes", raw.len()));
        if !decompress {
            return Ok(raw);
        }

        let mut data = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut data)
            .map_err(|error| Error::Decompress {
                path: path.to_string(),
                error,
            })?;
        self.reply(&format!("{} bytes decompressed", data.len()));
        Ok(data)
    }

    fn command(&self, command: &str) {
        if self.debug_level >= 1 {
            info!("*cmd* {command}");
        }
    }

    fn reply(&self, summary: &str) {
        if self.debug_level >= 2 {
            info!("*resp* {summary}");
        }
    }
}
