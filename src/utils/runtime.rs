use anyhow::Result;

/// Everything in goaltrack happens on one thread. Store writes are single documents and nothing
/// is shared between tasks.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
