use anyhow::Result;

/// The timer is driven by a single cooperative thread. Nothing in the crate needs more.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
