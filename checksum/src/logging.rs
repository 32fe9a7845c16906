//! `tracing` dispatcher built from the command-line flags.
//!
//! Nothing is installed globally. The binary builds one [`Dispatch`] with
//! [`build_dispatch`] and hands it to [`crate::run::run`], which makes it the
//! default dispatcher only while the run is in progress. Library code emits
//! events with the ordinary `tracing` macros.
//!
//! Console output is the bare message at info level. Under `--debug` it
//! shows debug events together with their level and target. The optional
//! log file always receives debug events with a timestamp, level, and
//! target.

use camino::Utf8Path;
use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;

/// Logging options derived from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSettings {
    /// Show debug events on the console in the detailed format.
    pub debug: bool,
}

impl LogSettings {
    /// Most verbose level shown on the console.
    #[must_use]
    pub const fn console_level(self) -> LevelFilter {
        if self.debug {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        }
    }
}

/// Open `path` for appending debug output, creating it if needed.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be created or opened.
pub fn open_log_file(path: &Utf8Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Build the dispatcher for one run.
///
/// `console` receives events at [`LogSettings::console_level`]; `log_file`,
/// when present, receives every debug event.
#[must_use]
pub fn build_dispatch<W>(settings: LogSettings, console: W, log_file: Option<File>) -> Dispatch
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let console_layer = fmt::layer()
        .with_writer(console)
        .with_ansi(false)
        .without_time()
        .with_target(settings.debug)
        .with_level(settings.debug)
        .with_filter(settings.console_level());

    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_filter(LevelFilter::DEBUG)
    });

    Dispatch::new(
        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer),
    )
}

#[cfg(any(test, feature = "test-support"))]
mod capture {
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Dispatch, Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer};
    use tracing_subscriber::prelude::*;

    type Events = Arc<Mutex<Vec<(Level, String)>>>;

    /// Keeps every event emitted under its dispatcher in memory.
    #[derive(Debug, Clone, Default)]
    pub struct LogCapture {
        events: Events,
    }

    impl LogCapture {
        /// Dispatcher that records into this capture.
        #[must_use]
        pub fn dispatch(&self) -> Dispatch {
            Dispatch::new(tracing_subscriber::registry().with(CaptureLayer {
                events: Arc::clone(&self.events),
            }))
        }

        /// Run `f` with this capture as the default dispatcher.
        pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
            tracing::dispatcher::with_default(&self.dispatch(), f)
        }

        /// Every `(level, message)` recorded so far, in order.
        #[must_use]
        pub fn messages(&self) -> Vec<(Level, String)> {
            self.events
                .lock()
                .map(|events| events.clone())
                .unwrap_or_default()
        }

        /// Returns true if any message at `level` contains `needle`.
        #[must_use]
        pub fn contains(&self, level: Level, needle: &str) -> bool {
            self.messages()
                .iter()
                .any(|(lvl, msg)| *lvl == level && msg.contains(needle))
        }
    }

    struct CaptureLayer {
        events: Events,
    }

    impl<S: Subscriber> Layer<S> for CaptureLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut message = MessageVisitor::default();
            event.record(&mut message);
            if let Ok(mut events) = self.events.lock() {
                events.push((*event.metadata().level(), message.0));
            }
        }
    }

    #[derive(Default)]
    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use capture::LogCapture;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use tracing::Level;

    /// Shared buffer standing in for stdout.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("buffer lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for SharedBuffer {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl SharedBuffer {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().expect("buffer lock").clone();
            String::from_utf8(bytes)
                .expect("utf8")
                .lines()
                .map(|line| line.trim().to_owned())
                .collect()
        }
    }

    #[test]
    fn plain_console_shows_bare_info_messages() {
        let buffer = SharedBuffer::default();
        let dispatch = build_dispatch(LogSettings::default(), buffer.clone(), None);

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!("All files are up to date");
            tracing::debug!("hidden");
        });

        assert_eq!(buffer.lines(), ["All files are up to date"]);
    }

    #[test]
    fn debug_console_shows_level_and_target() {
        let buffer = SharedBuffer::default();
        let dispatch = build_dispatch(LogSettings { debug: true }, buffer.clone(), None);

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::debug!("hashing a.txt");
        });

        let lines = buffer.lines();
        let line = lines.first().expect("one line");
        assert!(line.contains("DEBUG"), "line: {line}");
        assert!(line.contains("hathi_checksum::logging"), "line: {line}");
        assert!(line.ends_with("hashing a.txt"), "line: {line}");
    }

    #[test]
    fn log_file_receives_timestamped_debug_events() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = camino::Utf8PathBuf::try_from(dir.path().join("debug.log")).expect("utf8");
        let console = SharedBuffer::default();
        let file = open_log_file(&path).expect("log file opens");
        let dispatch = build_dispatch(LogSettings::default(), console.clone(), Some(file));

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::debug!("rewrote f.txt");
        });

        let text = std::fs::read_to_string(&path).expect("read log");
        let line = text.lines().next().expect("one line in the log file");
        assert!(
            line.starts_with(|c: char| c.is_ascii_digit()),
            "expected a timestamp: {line}"
        );
        assert!(line.contains("DEBUG"));
        assert!(line.contains("hathi_checksum::logging"));
        assert!(line.ends_with("rewrote f.txt"));
        assert!(console.lines().is_empty());
    }

    #[test]
    fn log_file_is_appended_to() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = camino::Utf8PathBuf::try_from(dir.path().join("debug.log")).expect("utf8");
        std::fs::write(&path, "earlier run\n").expect("seed log");

        let file = open_log_file(&path).expect("log file opens");
        let dispatch = build_dispatch(LogSettings::default(), io::sink, Some(file));
        tracing::dispatcher::with_default(&dispatch, || tracing::info!("later run"));

        let text = std::fs::read_to_string(&path).expect("read log");
        assert!(text.starts_with("earlier run\n"));
        assert!(text.trim_end().ends_with("later run"));
    }

    #[test]
    fn capture_keeps_order_and_levels() {
        let capture = LogCapture::default();
        capture.in_scope(|| {
            tracing::info!("first");
            tracing::warn!("second");
        });
        assert_eq!(
            capture.messages(),
            vec![(Level::INFO, "first".to_owned()), (Level::WARN, "second".to_owned())]
        );
        assert!(capture.contains(Level::WARN, "sec"));
    }

    #[test]
    fn console_level_follows_debug_flag() {
        assert_eq!(LogSettings::default().console_level(), LevelFilter::INFO);
        assert_eq!(LogSettings { debug: true }.console_level(), LevelFilter::DEBUG);
    }
}
