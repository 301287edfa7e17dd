//! Small helpers shared across the crate.

#[cfg(test)]
pub mod test_helpers;

/// Runs `job` on a blocking worker: tokio's blocking pool when called inside a runtime,
/// otherwise a named OS thread.
///
/// An error means the job could not be started and has been dropped.
pub(crate) fn spawn_background<F>(name: &str, job: F) -> std::io::Result<()>
where
    F: FnOnce() + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(job);
            Ok(())
        }
        Err(_) => std::thread::Builder::new()
            .name(name.to_string())
            .spawn(job)
            .map(|_| ()),
    }
}
