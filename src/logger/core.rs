/// Core logging entry point
///
/// Level filtering is left to whichever `log` backend is installed; the tag
/// only decides the record's target.
use super::levels::LogLevel;
use super::tags::LogTag;

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    log::log!(target: tag.target(), level.to_log_level(), "{}", message);
}
