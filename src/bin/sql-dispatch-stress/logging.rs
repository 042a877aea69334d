use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriter;

/// Install the global subscriber. Lines go to stdout and, with `log_file`, to that file too.
pub(crate) fn init(log_file: Option<&Path>) -> io::Result<()> {
    let sink = RunLog::open(log_file)?;
    tracing_subscriber::fmt()
        .with_writer(sink)
        .with_target(false)
        .with_thread_names(true)
        .with_max_level(Level::INFO)
        .init();
    Ok(())
}

/// Shared handle to the optional run log file.
#[derive(Clone)]
struct RunLog {
    file: Option<Arc<Mutex<BufWriter<File>>>>,
}

impl RunLog {
    fn open(path: Option<&Path>) -> io::Result<Self> {
        let file = path
            .map(|path| File::create(path).map(|f| Arc::new(Mutex::new(BufWriter::new(f)))))
            .transpose()?;
        Ok(Self { file })
    }
}

impl<'a> MakeWriter<'a> for RunLog {
    type Writer = Tee<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        Tee {
            stdout: io::stdout(),
            file: self.file.as_deref(),
        }
    }
}

/// One log event's writer: stdout first, then the file.
struct Tee<'a> {
    stdout: io::Stdout,
    file: Option<&'a Mutex<BufWriter<File>>>,
}

impl Tee<'_> {
    fn with_file(
        &self,
        op: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
    ) -> io::Result<()> {
        match self.file {
            Some(file) => op(&mut file.lock().unwrap_or_else(PoisonError::into_inner)),
            None => Ok(()),
        }
    }
}

impl Write for Tee<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdout.lock().write_all(buf)?;
        self.with_file(|file| file.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()?;
        self.with_file(Write::flush)
    }
}

impl Drop for Tee<'_> {
    // One writer per event, so the file is flushed per event.
    fn drop(&mut self) {
        let _ = self.with_file(Write::flush);
    }
}
