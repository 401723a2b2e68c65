//! Process-manager integration: the shutdown signal future and the grace
//! window the manager allows before a forced kill.

use std::time::Duration;

/// How long an in-flight run may keep going after a shutdown request,
/// matching the process manager's kill timeout.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Resolves when the process is asked to shut down (Ctrl+C or SIGTERM).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install terminate handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
