use tokio::task::JoinHandle;
use tokio::{select, signal};
use tracing::{debug, error, warn};

use bucket2drive::types::token::PipelineCancellationToken;

const EXIT_CODE_INTERRUPTED: i32 = 130;

/// The first ctrl-c stops the transfer between objects and abandons in-flight uploads.
/// A second one exits immediately.
pub fn spawn_ctrl_c_handler(cancellation_token: PipelineCancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        select! {
            _ = cancellation_token.cancelled() => {
                debug!("transfer has been cancelled before ctrl-c.");
                return;
            }
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("failed to listen for ctrl-c signal: {e}");
                    return;
                }

                warn!("ctrl-c received, abandoning in-flight uploads. press ctrl-c again to exit immediately.");
                cancellation_token.cancel();
            }
        }

        if signal::ctrl_c().await.is_ok() {
            warn!("second ctrl-c received, exiting.");
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }
    })
}
