//! Live console rendering of the battlefield.

use std::io::{self, Write};

use botarena_core::publisher::SnapshotListener;
use botarena_types::Snapshot;
use tracing::debug;

/// Redraws the field on one terminal line for every snapshot.
#[derive(Debug)]
pub struct ConsoleListener<W> {
    out: W,
}

impl ConsoleListener<io::Stdout> {
    /// Listener writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + 'static> ConsoleListener<W> {
    /// Listener writing to `out`.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// The underlying writer.
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send + 'static> SnapshotListener for ConsoleListener<W> {
    fn on_snapshot(&mut self, snapshot: Snapshot) {
        let written = write!(self.out, "\rround: {} | {}", snapshot.round, snapshot.field)
            .and_then(|()| self.out.flush());
        if let Err(e) = written {
            debug!(error = %e, "Failed to draw snapshot");
        }
    }
}
