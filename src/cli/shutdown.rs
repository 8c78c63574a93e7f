use tokio::select;
use tokio_util::sync::CancellationToken;

/// Cancels `cancelation` on Ctrl-C. Returns early once something else cancels it.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
