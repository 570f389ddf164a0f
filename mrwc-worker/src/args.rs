use std::time::Duration;

use clap::Parser;

use common::WorkerKind;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Whether this worker maps or reduces.
    #[arg(short, long, value_enum)]
    pub kind: WorkerKind,

    /// The port to run the worker on.
    #[arg(short, long)]
    pub port: u16,

    /// Host name the coordinator should use to reach this worker.
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// The address of the coordinator server
    #[arg(short = 'j', long = "join", default_value = "http://localhost:3000")]
    pub coordinator: String,

    /// Name of the workload to serve.
    #[arg(short, long, default_value = "wc")]
    pub workload: String,

    /// Seconds to wait between registration attempts.
    #[arg(long, default_value = "5")]
    pub retry_secs: u64,

    /// Seconds before a register or unregister request is abandoned.
    #[arg(long, default_value = "5")]
    pub timeout_secs: u64,
}

impl Args {
    /// The address this worker registers under.
    pub fn advertised_address(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
