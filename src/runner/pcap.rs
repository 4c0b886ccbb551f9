//! Pcap runner - sends the captured bytes of every packet.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use log::{info, warn};
use pcap_file::pcap::PcapReader;

use crate::error::{Result, StreamError};
use crate::lifecycle::LifecycleContext;
use crate::output::{Output, write_until_cancelled};

/// Send each packet of each capture as one payload, in order.
///
/// Each capture is read into memory before its packets are sent. Writes give
/// way to cancellation of `ctx`. Returns the number of packets sent.
pub async fn stream_pcap_files(ctx: &LifecycleContext, files: &[PathBuf], output: &mut dyn Output) -> Result<usize> {
    let mut sent = 0;
    for path in files {
        let (count, finished) = stream_pcap_file(ctx, path, output).await?;
        sent += count;
        if !finished {
            warn!("Interrupted while streaming {}, {} packets sent", path.display(), sent);
            break;
        }
    }
    Ok(sent)
}

async fn stream_pcap_file(ctx: &LifecycleContext, path: &Path, output: &mut dyn Output) -> Result<(usize, bool)> {
    let capture = tokio::select! {
        biased;
        _ = ctx.cancelled() => return Ok((0, false)),
        bytes = tokio::fs::read(path) => bytes?,
    };
    let pcap_error = |e: pcap_file::PcapError| StreamError::Pcap(format!("{}: {}", path.display(), e));
    let mut reader = PcapReader::new(Cursor::new(capture)).map_err(pcap_error)?;

    let mut count = 0;
    while let Some(packet) = reader.next_packet() {
        let packet = packet.map_err(pcap_error)?;
        if !write_until_cancelled(ctx, output, &packet.data).await? {
            return Ok((count, false));
        }
        count += 1;
    }

    info!("Sent {} packets from {}", count, path.display());
    Ok((count, true))
}
