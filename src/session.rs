// UI-facing side effects of an unrecoverable session failure

use std::{sync::Arc, time::Duration};

use tracing::{info, warn};

/// The surface that shows notifications and performs navigation.
pub trait SessionObserver: Send + Sync + 'static {
    // Path of the page currently shown, if known
    fn current_path(&self) -> Option<String>;

    fn notify_error(&self, message: &str);

    fn redirect(&self, path: &str);
}

// Default observer for headless use: only logs
#[derive(Debug, Default, Clone)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn current_path(&self) -> Option<String> {
        None
    }

    fn notify_error(&self, message: &str) {
        warn!(%message, "session notification");
    }

    fn redirect(&self, path: &str) {
        info!(%path, "redirect requested");
    }
}

// Shows the error and sends the user to login, unless they are already there.
// The redirect is delayed so the notification stays visible.
pub(crate) fn handle_session_expired(
    observer: &Arc<dyn SessionObserver>,
    login_path: &str,
    delay: Duration,
    message: &str,
) {
    if observer.current_path().as_deref() == Some(login_path) {
        return;
    }

    observer.notify_error(message);

    let observer = observer.clone();
    let login_path = login_path.to_string();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        observer.redirect(&login_path);
    });
}
