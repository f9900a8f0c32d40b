mod analyze;
mod probe;
mod run;

pub use analyze::*;
pub use probe::*;
pub use run::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}
