//! Console logging for applications which use the allocator.

mod pretty_list;

use {
    anyhow::{anyhow, Result},
    flexi_logger::{DeferredNow, Logger, LoggerHandle, Record},
    regex::Regex,
    std::{
        fmt::Write as FmtWrite,
        sync::{Mutex, OnceLock},
    },
    textwrap::{termwidth, Options},
};

pub use self::pretty_list::PrettyList;

/// Keeps the logger alive once it has been started.
static LOGGER_HANDLE: Mutex<Option<LoggerHandle>> = Mutex::new(None);

/// Matches the last wrapped line of a log entry.
static LAST_LINE: OnceLock<Option<Regex>> = OnceLock::new();

/// Setup console logging. The level defaults to `info` and can be changed
/// with RUST_LOG.
///
/// Calling this more than once is a no-op.
pub fn setup() -> Result<()> {
    let mut handle = LOGGER_HANDLE
        .lock()
        .map_err(|_| anyhow!("The logger handle lock is poisoned"))?;
    if handle.is_some() {
        return Ok(());
    }

    *handle = Some(
        Logger::try_with_env_or_str("info")?
            .format(multiline_format)
            .start()?,
    );

    log::info!(
        "Adjust the log level by setting RUST_LOG. By default RUST_LOG=info"
    );

    Ok(())
}

/// A multiline log format for flexi_logger.
///
/// Entries are wrapped to the terminal width and framed with box-drawing
/// characters so long entries, like pool dumps, are easy to pick out.
pub fn multiline_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let size = termwidth().min(74);
    let wrap_options = Options::new(size)
        .initial_indent("┏ ")
        .subsequent_indent("┃ ");

    let mut full_line = String::new();
    writeln!(
        full_line,
        "{} [{}] [{}:{}]",
        record.level(),
        now.now().format("%H:%M:%S%.6f"),
        record.file().unwrap_or("<unnamed>"),
        record.line().unwrap_or(0),
    )
    .and_then(|_| write!(full_line, "{}", record.args()))
    .map_err(std::io::Error::other)?;

    let wrapped = textwrap::fill(&full_line, wrap_options);
    let last_line = LAST_LINE.get_or_init(|| Regex::new(r"(┃)(.*)$").ok());
    match last_line {
        Some(matcher) => writeln!(w, "{}", matcher.replace(&wrapped, "┗$2")),
        None => writeln!(w, "{}", wrapped),
    }
}
