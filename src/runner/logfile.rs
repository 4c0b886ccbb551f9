//! Log file runner - sends every line of one or more log files.

use std::path::{Path, PathBuf};

use log::{info, warn};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::Result;
use crate::lifecycle::LifecycleContext;
use crate::output::{Output, write_until_cancelled};

/// Send each line of each file, newline-terminated, in order.
///
/// Reads and writes both give way to cancellation of `ctx`, after which the
/// lines sent so far are reported. Returns the number of lines sent.
pub async fn stream_log_files(ctx: &LifecycleContext, files: &[PathBuf], output: &mut dyn Output) -> Result<usize> {
    let mut sent = 0;
    for path in files {
        let (count, finished) = stream_log_file(ctx, path, output).await?;
        sent += count;
        if !finished {
            warn!("Interrupted while streaming {}, {} lines sent", path.display(), sent);
            break;
        }
    }
    Ok(sent)
}

async fn stream_log_file(ctx: &LifecycleContext, path: &Path, output: &mut dyn Output) -> Result<(usize, bool)> {
    let file = tokio::select! {
        biased;
        _ = ctx.cancelled() => return Ok((0, false)),
        file = File::open(path) => file?,
    };
    let mut lines = BufReader::new(file).lines();

    let mut count = 0;
    loop {
        let line = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Ok((count, false)),
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };

        let mut payload = line.into_bytes();
        payload.push(b'\n');
        if !write_until_cancelled(ctx, output, &payload).await? {
            return Ok((count, false));
        }
        count += 1;
    }

    info!("Sent {} lines from {}", count, path.display());
    Ok((count, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use crate::output::memory::MemorySink;
    use tempfile::TempDir;

    async fn connected(sink: &MemorySink) -> crate::output::memory::MemoryOutput {
        let mut output = sink.output();
        output.dial(&LifecycleContext::new()).await.unwrap();
        output
    }

    #[tokio::test]
    async fn test_streams_all_lines_in_order() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("a.log");
        let second = temp.path().join("b.log");
        std::fs::write(&first, "one\ntwo\n").unwrap();
        std::fs::write(&second, "three").unwrap();

        let sink = MemorySink::new();
        let mut output = connected(&sink).await;
        let sent = stream_log_files(&LifecycleContext::new(), &[first, second], &mut output)
            .await
            .unwrap();

        assert_eq!(sent, 3);
        assert_eq!(
            sink.payloads(),
            vec![b"one\n".to_vec(), b"two\n".to_vec(), b"three\n".to_vec()]
        );
    }

    #[tokio::test]
    async fn test_cancelled_context_sends_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.log");
        std::fs::write(&path, "one\ntwo\n").unwrap();

        let ctx = LifecycleContext::new();
        ctx.cancel();
        let sink = MemorySink::new();
        let mut output = connected(&sink).await;
        let sent = stream_log_files(&ctx, &[path.clone(), path], &mut output).await.unwrap();

        assert_eq!(sent, 0);
        assert!(sink.payloads().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_releases_blocked_read() {
        let temp = TempDir::new().unwrap();
        let fifo = temp.path().join("input.fifo");
        let status = std::process::Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(status.success());

        // Hold the write end open without ever writing a line.
        let writer_path = fifo.clone();
        let writer = std::thread::spawn(move || std::fs::OpenOptions::new().write(true).open(writer_path));

        let ctx = LifecycleContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let sink = MemorySink::new();
        let mut output = connected(&sink).await;
        let sent = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            stream_log_files(&ctx, &[fifo], &mut output),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(sent, 0);
        drop(writer.join().unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let sink = MemorySink::new();
        let mut output = connected(&sink).await;
        let result = stream_log_files(&LifecycleContext::new(), &[temp.path().join("missing.log")], &mut output).await;
        assert!(matches!(result, Err(StreamError::Io(_))));
    }
}
