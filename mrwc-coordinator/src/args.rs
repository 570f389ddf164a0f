use std::time::Duration;

use clap::builder::RangedU64ValueParser;
use clap::Parser;

use crate::worker_registry::Requirements;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The port for the server to run on.
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Mappers that must be registered before a job is accepted.
    #[arg(long, default_value = "2", value_parser = at_least_one())]
    pub min_mappers: usize,

    /// Reducers that must be registered before a job is accepted.
    #[arg(long, default_value = "2", value_parser = at_least_one())]
    pub min_reducers: usize,

    /// Upper bound, in seconds, on every call to a mapper or reducer.
    #[arg(long, default_value = "5")]
    pub call_timeout_secs: u64,
}

fn at_least_one() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::<usize>::new().range(1..)
}

impl Args {
    pub fn requirements(&self) -> Requirements {
        Requirements {
            min_mappers: self.min_mappers,
            min_reducers: self.min_reducers,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}
