use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

static LOG_LEVEL: AtomicUsize = AtomicUsize::new(0);
static SPINNER: Lazy<Mutex<Option<ProgressBar>>> = Lazy::new(|| Mutex::new(None));

/// Logger is a static class that provides logging functionality for storyline.
///
/// `info` writes to stdout, everything else goes to stderr so that
/// transformed code printed on stdout is never interleaved with diagnostics.
///
/// # Examples
///
/// ```
/// use storyline_logger::Logger;
/// Logger::info("Scanning project");
/// Logger::warn("Could not parse src/Broken.tsx");
/// Logger::error("Failed to write story");
/// Logger::set_level(2);
/// Logger::debug("Found component: Button", 2);
/// Logger::loading("Scanning...");
/// Logger::done_loading();
/// ```
pub struct Logger;

enum Stream {
    Stdout,
    Stderr,
}

impl Logger {
    pub fn set_level(level: u8) {
        LOG_LEVEL.store(level as usize, Ordering::Relaxed);
    }

    pub fn level() -> usize {
        LOG_LEVEL.load(Ordering::Relaxed)
    }

    pub fn info(msg: &str) {
        Self::emit(Stream::Stdout, msg.blue());
    }

    pub fn warn(msg: &str) {
        Self::emit(Stream::Stderr, msg.yellow());
    }

    pub fn error(msg: &str) {
        Self::emit(Stream::Stderr, msg.red());
    }

    pub fn debug(msg: &str, level: usize) {
        if Self::level() >= level {
            Self::emit(Stream::Stderr, msg.magenta());
        }
    }

    pub fn loading(msg: &str) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈")
            .template("{spinner:.blue} {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut spinner) = SPINNER.lock() {
            *spinner = Some(pb);
        }
    }

    pub fn done_loading() {
        let finished = SPINNER.lock().ok().and_then(|mut spinner| spinner.take());
        if let Some(pb) = finished {
            pb.finish_and_clear();
        }
    }

    /// Prints a message, suspending the spinner while doing so if one is active.
    fn emit(stream: Stream, line: ColoredString) {
        let print = || match stream {
            Stream::Stdout => println!("{}", line),
            Stream::Stderr => eprintln!("{}", line),
        };

        match SPINNER.lock() {
            Ok(spinner) => match spinner.as_ref() {
                Some(pb) => pb.suspend(print),
                None => print(),
            },
            Err(_) => print(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_levels() {
        Logger::set_level(2);
        assert_eq!(Logger::level(), 2);

        // Should not print
        Logger::debug("Level 3 message", 3);

        // Should print
        Logger::debug("Level 2 message", 2);
        Logger::debug("Level 1 message", 1);
    }

    #[test]
    fn test_loading_indicator() {
        Logger::loading("Scanning files...");
        std::thread::sleep(std::time::Duration::from_millis(200));
        Logger::warn("A warning while loading");
        Logger::done_loading();
        Logger::done_loading();
    }
}
