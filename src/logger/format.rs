//! Console formatting for the `env_logger` backend
//!
//! Lines look like `12:04:31 [LOADER    ] [INFO   ] message`, with the tag and
//! level colored. Records from other crates fall back to their raw target.

use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::Write;

/// Log format widths for alignment
const TAG_WIDTH: usize = 10;
const LEVEL_WIDTH: usize = 7;

pub fn format_record(
    buf: &mut env_logger::fmt::Formatter,
    record: &log::Record<'_>,
) -> std::io::Result<()> {
    let time = Local::now().format("%H:%M:%S").to_string();
    let tag = match LogTag::from_target(record.target()) {
        Some(tag) => format_tag(&tag),
        None => format!("{:<width$}", record.target(), width = TAG_WIDTH).normal(),
    };
    let level = format_level(LogLevel::from_log_level(record.level()));

    writeln!(buf, "{} [{}] [{}] {}", time.dimmed(), tag, level, record.args())
}

/// Format a tag with appropriate color
fn format_tag(tag: &LogTag) -> ColoredString {
    let label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::Catalog => label.bright_cyan().bold(),
        LogTag::Fetcher => label.bright_blue().bold(),
        LogTag::Loader => label.bright_green().bold(),
        LogTag::Governor => label.bright_yellow().bold(),
        LogTag::Holdings => label.bright_magenta().bold(),
        LogTag::Api => label.bright_purple().bold(),
        LogTag::Config => label.bright_white().bold(),
    }
}

fn format_level(level: LogLevel) -> ColoredString {
    let label = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);
    match level {
        LogLevel::Error => label.bright_red().bold(),
        LogLevel::Warning => label.bright_yellow(),
        LogLevel::Info => label.normal(),
        LogLevel::Debug => label.dimmed(),
    }
}
