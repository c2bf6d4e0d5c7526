// Global logging system for the installer
//
// Keeps the most recent lines in a fixed ring so the UI layer can redraw
// the status console after every blocking step.

use core::fmt::{self, Write};
use spin::Mutex;

const MAX_LOG_ENTRIES: usize = 64;
const MAX_LINE_LEN: usize = 120;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// One formatted log line. Text longer than the line buffer is cut off.
#[derive(Copy, Clone)]
pub struct LogLine {
    pub level: LogLevel,
    len: usize,
    text: [u8; MAX_LINE_LEN],
}

impl LogLine {
    const EMPTY: Self = Self {
        level: LogLevel::Info,
        len: 0,
        text: [0; MAX_LINE_LEN],
    };

    pub fn as_str(&self) -> &str {
        // Truncation in write_str only ever cuts on a char boundary
        core::str::from_utf8(&self.text[..self.len]).unwrap_or("")
    }
}

impl Write for LogLine {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = MAX_LINE_LEN - self.len;
        let mut take = s.len().min(room);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.text[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

struct LogRing {
    lines: [LogLine; MAX_LOG_ENTRIES],
    next: usize,
    total: usize,
}

static LOG_RING: Mutex<LogRing> = Mutex::new(LogRing {
    lines: [LogLine::EMPTY; MAX_LOG_ENTRIES],
    next: 0,
    total: 0,
});

pub fn log(level: LogLevel, args: fmt::Arguments<'_>) {
    let mut line = LogLine::EMPTY;
    line.level = level;
    let _ = line.write_fmt(args);

    let mut ring = LOG_RING.lock();
    let slot = ring.next;
    ring.lines[slot] = line;
    ring.next = (slot + 1) % MAX_LOG_ENTRIES;
    ring.total += 1;
}

/// Number of lines logged since boot (including ones already overwritten).
pub fn log_count() -> usize {
    LOG_RING.lock().total
}

/// Visit retained lines, oldest first.
pub fn for_each_line<F: FnMut(&LogLine)>(mut f: F) {
    let ring = LOG_RING.lock();
    let kept = ring.total.min(MAX_LOG_ENTRIES);
    let first = (ring.next + MAX_LOG_ENTRIES - kept) % MAX_LOG_ENTRIES;
    for i in 0..kept {
        f(&ring.lines[(first + i) % MAX_LOG_ENTRIES]);
    }
}

/// Most recent line, if anything was logged yet.
pub fn last_line() -> Option<LogLine> {
    let ring = LOG_RING.lock();
    if ring.total == 0 {
        return None;
    }
    Some(ring.lines[(ring.next + MAX_LOG_ENTRIES - 1) % MAX_LOG_ENTRIES])
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::LogLevel::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::LogLevel::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::LogLevel::Error, format_args!($($arg)*))
    };
}
