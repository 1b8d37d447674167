use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::fmt::MakeWriter;

const QUEUE_CAPACITY: usize = 256;

enum LogTask {
    Write(Vec<u8>),
    Flush,
    Reopen,
    Shutdown,
}

/// Log file appender fed through a channel, so emitting an event never blocks on disk.
///
/// Clones share the same file. [`LogWriter::reopen`] lets an external rotator move
/// the file away and have a fresh one created in its place.
#[derive(Clone)]
pub struct LogWriter {
    sender: mpsc::Sender<LogTask>,
}

pub struct Writer<'a> {
    sender: &'a mpsc::Sender<LogTask>,
}

impl Write for Writer<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sender
            .try_send(LogTask::Write(buf.to_vec()))
            .map_err(|_| io::Error::other("Failed to queue log line"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sender
            .try_send(LogTask::Flush)
            .map_err(|_| io::Error::other("Failed to queue log flush"))
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = Writer<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        Writer {
            sender: &self.sender,
        }
    }
}

impl LogWriter {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<(Self, JoinHandle<()>)> {
        let path = path.as_ref().to_path_buf();
        let mut file = Self::open_file(&path)?;
        let (sender, mut tasks) = mpsc::channel::<LogTask>(QUEUE_CAPACITY);
        let handle = tokio::spawn(async move {
            while let Some(task) = tasks.recv().await {
                let result = match task {
                    LogTask::Write(buf) => file.write_all(&buf).map_err(anyhow::Error::from),
                    LogTask::Flush => file.flush().map_err(anyhow::Error::from),
                    LogTask::Reopen => Self::open_file(&path).map(|reopened| file = reopened),
                    LogTask::Shutdown => break,
                };
                if let Err(err) = result {
                    eprintln!("Log writer for {path:?} failed: {err:?}");
                }
            }
            let _ = file.flush();
        });
        Ok((Self { sender }, handle))
    }

    fn open_file(path: &PathBuf) -> anyhow::Result<File> {
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {path:?}"))
    }

    pub fn reopen(&self) -> anyhow::Result<()> {
        self.sender
            .try_send(LogTask::Reopen)
            .map_err(|_| anyhow::anyhow!("Failed to queue log reopen"))
    }

    pub fn shutdown(&self) {
        if self.sender.try_send(LogTask::Shutdown).is_err() {
            eprintln!("Failed to stop log writer");
        }
    }

    /// Stops the writer task and waits for it to flush. Clones held elsewhere,
    /// such as the one inside the subscriber, do not keep the task alive.
    pub async fn finish(&self, handle: JoinHandle<()>) {
        self.shutdown();
        if let Err(err) = handle.await {
            eprintln!("Log writer task failed: {err:?}");
        }
    }
}
