use tokio::sync::watch;

/// Creates the signal used to request an explicit shutdown: sending `true` asks every session
///  holding a receiver to end.
pub fn shutdown_signal() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Completes once shutdown was requested. If the sending side is dropped without requesting
///  shutdown, this never completes.
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
