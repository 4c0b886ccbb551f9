//! Subcommand bodies - what gets streamed once startup has cleared.

pub mod logfile;
pub mod pcap;

use std::path::PathBuf;

use crate::error::Result;
use crate::lifecycle::LifecycleContext;
use crate::output::Output;

pub use self::logfile::stream_log_files;
pub use self::pcap::stream_pcap_files;

/// The streaming work requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workload {
    /// Lines of log files
    Log(Vec<PathBuf>),
    /// Packets of capture files
    Pcap(Vec<PathBuf>),
}

impl Workload {
    pub fn name(&self) -> &'static str {
        match self {
            Workload::Log(_) => "log",
            Workload::Pcap(_) => "pcap",
        }
    }

    /// Stream everything into `output`, returning the number of payloads sent.
    pub async fn run(&self, ctx: &LifecycleContext, output: &mut dyn Output) -> Result<usize> {
        match self {
            Workload::Log(files) => stream_log_files(ctx, files, output).await,
            Workload::Pcap(files) => stream_pcap_files(ctx, files, output).await,
        }
    }
}
