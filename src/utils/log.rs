use chrono::{Local, Timelike};
use fern::colors::{Color, ColoredLevelConfig};
use fern::{self, Dispatch};
use log::LevelFilter;

fn log_level() -> LevelFilter {
    if let Ok(s) = std::env::var("PACKCHECK_LOG") {
        match s.parse() {
            Ok(level) => return level,
            Err(err) => eprintln!("PACKCHECK_LOG is invalid: {err}"),
        }
    }
    LevelFilter::Info
}

/// Detect `PACKCHECK_LOG` environment variable first; if it's not set,
/// default to INFO level.
pub fn init_log() -> Result<(), fern::InitError> {
    let dispatch = Dispatch::new().level(log_level());

    let color_line = ColoredLevelConfig::new()
        .info(Color::White)
        .error(Color::Red)
        .warn(Color::Yellow)
        .debug(Color::White)
        .trace(Color::BrightBlack);

    let color_level = color_line.info(Color::Green);

    let stderr_dispatch = Dispatch::new()
        .format(move |callback, args, record| {
            let time_now = Local::now();
            callback.finish(format_args!(
                "{}{}:{}|PACKCHECK|{}{}|: {}\x1B[0m",
                format_args!(
                    "\x1B[{}m",
                    color_line.get_color(&record.level()).to_fg_str()
                ),
                time_now.hour(),
                time_now.minute(),
                color_level.color(record.level()),
                format_args!(
                    "\x1B[{}m",
                    color_line.get_color(&record.level()).to_fg_str()
                ),
                args
            ))
        })
        .chain(std::io::stderr());

    /* Note that we cannot dispatch to stdout due to some bugs */
    dispatch.chain(stderr_dispatch).apply()?;
    Ok(())
}

#[macro_export]
macro_rules! pack_debug {
    ($($arg:tt)+) => (
        ::log::debug!(target: "PACKCHECK", $($arg)+)
    );
}

#[macro_export]
macro_rules! pack_info {
    ($($arg:tt)+) => (
        ::log::info!(target: "PACKCHECK", $($arg)+)
    );
}

#[macro_export]
macro_rules! pack_warn {
    ($($arg:tt)+) => (
        ::log::warn!(target: "PACKCHECK", $($arg)+)
    );
}

#[macro_export]
macro_rules! pack_error {
    ($($arg:tt)+) => (
        ::log::error!(target: "PACKCHECK", $($arg)+)
    );
}

pub fn pack_error_and_exit(msg: impl AsRef<str>) -> ! {
    pack_error!("{}", msg.as_ref());
    std::process::exit(1)
}
