use anyhow::Result;
use tracing::error;
use goaltrack::{cli::run_cli, utils::runtime::single_thread_runtime};

fn main() -> Result<()> {
    let result = single_thread_runtime()?.block_on(run_cli());
    if let Err(e) = &result {
        // Rejected input is reported the same way clap reports bad arguments.
        if let Some(clap_error) = e.downcast_ref::<clap::Error>() {
            clap_error.exit();
        }
        error!("Error running cli {e:?}");
    }
    result
}
