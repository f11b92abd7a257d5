use std::fmt::Display;

use bitflags::bitflags;

use crate::status::Status;

bitflags! {
    /// Bitmask over the log categories a model description advertises.
    /// `ALL` is the wildcard: a message carrying it matches any non-empty
    /// mask, and a mask containing it passes any category.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LogMask: u32 {
        const EVENTS = 1;
        const WARNING = 1 << 1;
        const DISCARD = 1 << 2;
        const ERROR = 1 << 3;
        const FATAL = 1 << 4;
        const PENDING = 1 << 5;
        const ALL = Self::EVENTS.bits()
            | Self::WARNING.bits()
            | Self::DISCARD.bits()
            | Self::ERROR.bits()
            | Self::FATAL.bits()
            | Self::PENDING.bits();
    }
}

impl LogMask {
    /// The category name reported to the environment callback. The
    /// wildcard is checked first since it covers every other bit.
    pub fn name(self) -> &'static str {
        if self == LogMask::ALL {
            "logAll"
        } else if self == LogMask::EVENTS {
            "logEvents"
        } else if self == LogMask::WARNING {
            "logStatusWarning"
        } else if self == LogMask::DISCARD {
            "logStatusDiscard"
        } else if self == LogMask::ERROR {
            "logStatusError"
        } else if self == LogMask::FATAL {
            "logStatusFatal"
        } else if self == LogMask::PENDING {
            "logStatusPending"
        } else {
            "unknown"
        }
    }

    /// Resolve a category name from `fmi2SetDebugLogging`.
    pub fn from_category_name(name: &str) -> Result<LogMask, String> {
        match name {
            "logEvents" => Ok(LogMask::EVENTS),
            "logStatusWarning" => Ok(LogMask::WARNING),
            "logStatusDiscard" => Ok(LogMask::DISCARD),
            "logStatusError" => Ok(LogMask::ERROR),
            "logStatusFatal" => Ok(LogMask::FATAL),
            "logStatusPending" => Ok(LogMask::PENDING),
            "logAll" => Ok(LogMask::ALL),
            "" => Err("log category cannot be empty".to_string()),
            other => Err(format!("log category {other} is unknown")),
        }
    }
}

/// Receives `(status, category name, message)` for every emitted record.
pub type LoggerCallback = Box<dyn Fn(Status, &str, &str) + Send>;

/// Per-instance categorized logger around the environment's callback.
/// Messages are dropped unless their category intersects the mask.
pub struct Logger {
    mask: LogMask,
    callback: LoggerCallback,
}

impl Logger {
    pub fn new(mask: LogMask, callback: LoggerCallback) -> Self {
        Self { mask, callback }
    }

    /// Replace the category mask; used by `fmi2SetDebugLogging`.
    pub(crate) fn set_mask(&mut self, mask: LogMask) {
        self.mask = mask;
    }

    pub fn error(&self, message: impl Display) {
        self.log(Status::Error, LogMask::ERROR, message);
    }

    pub fn fatal(&self, message: impl Display) {
        self.log(Status::Fatal, LogMask::FATAL, message);
    }

    pub fn warning(&self, message: impl Display) {
        self.log(Status::Warning, LogMask::WARNING, message);
    }

    pub fn discard(&self, message: impl Display) {
        self.log(Status::Discard, LogMask::DISCARD, message);
    }

    pub fn event(&self, message: impl Display) {
        self.log(Status::Ok, LogMask::EVENTS, message);
    }

    /// Informational message matched by any enabled category.
    pub fn info(&self, message: impl Display) {
        self.log(Status::Ok, LogMask::ALL, message);
    }

    fn log(&self, status: Status, category: LogMask, message: impl Display) {
        if !self.mask.intersects(category) {
            return;
        }
        (self.callback)(status, category.name(), &message.to_string());
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("mask", &self.mask).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recording_logger(mask: LogMask) -> (Logger, Arc<Mutex<Vec<(Status, String, String)>>>) {
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&records);
        let logger = Logger::new(
            mask,
            Box::new(move |status, category, message| {
                sink.lock()
                    .unwrap()
                    .push((status, category.to_string(), message.to_string()));
            }),
        );
        (logger, records)
    }

    #[test]
    fn masked_categories_are_suppressed() {
        let (logger, records) = recording_logger(LogMask::DISCARD | LogMask::PENDING);
        logger.event("ignored");
        logger.error("ignored");
        logger.discard("kept");
        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, Status::Discard);
        assert_eq!(records[0].1, "logStatusDiscard");
        assert_eq!(records[0].2, "kept");
    }

    #[test]
    fn empty_mask_drops_everything() {
        let (logger, records) = recording_logger(LogMask::empty());
        logger.error("nope");
        logger.fatal("nope");
        logger.info("nope");
        assert!(records.lock().unwrap().is_empty());
    }

    #[test]
    fn all_mask_passes_every_level() {
        let (logger, records) = recording_logger(LogMask::ALL);
        logger.error("e");
        logger.fatal("f");
        logger.warning("w");
        logger.discard("d");
        logger.event("ev");
        logger.info("i");
        let records = records.lock().unwrap();
        let statuses: Vec<Status> = records.iter().map(|r| r.0).collect();
        assert_eq!(
            statuses,
            vec![
                Status::Error,
                Status::Fatal,
                Status::Warning,
                Status::Discard,
                Status::Ok,
                Status::Ok,
            ]
        );
        assert_eq!(records[5].1, "logAll");
    }

    #[test]
    fn info_is_matched_by_any_enabled_category() {
        let (logger, records) = recording_logger(LogMask::WARNING);
        logger.info("through the wildcard");
        assert_eq!(records.lock().unwrap().len(), 1);
    }

    #[test]
    fn category_names_round_trip() {
        for category in [
            LogMask::EVENTS,
            LogMask::WARNING,
            LogMask::DISCARD,
            LogMask::ERROR,
            LogMask::FATAL,
            LogMask::PENDING,
            LogMask::ALL,
        ] {
            assert_eq!(LogMask::from_category_name(category.name()), Ok(category));
        }
        assert!(LogMask::from_category_name("").is_err());
        assert!(LogMask::from_category_name("logFoo").is_err());
    }
}
