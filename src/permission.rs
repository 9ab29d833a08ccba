use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

/// Source of the "microphone may be used" decision.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    fn is_capture_authorized(&self) -> bool;

    /// Ask for authorization; may wait on the user. `false` is final for the
    /// current start attempt.
    async fn request_capture_authorization(&self) -> bool;
}

/// Permission held in process settings and toggled from the command line,
/// standing in for a desktop privacy prompt.
pub struct SettingsPermissionGate {
    granted: AtomicBool,
    grant_on_request: bool,
}

impl SettingsPermissionGate {
    pub fn new(granted: bool, grant_on_request: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
            grant_on_request,
        }
    }

    pub fn grant(&self) {
        self.granted.store(true, Ordering::SeqCst);
        log::info!("Capture permission granted");
    }

    pub fn revoke(&self) {
        self.granted.store(false, Ordering::SeqCst);
        log::info!("Capture permission revoked");
    }
}

#[async_trait]
impl PermissionGate for SettingsPermissionGate {
    fn is_capture_authorized(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    async fn request_capture_authorization(&self) -> bool {
        if self.is_capture_authorized() {
            return true;
        }
        if self.grant_on_request {
            self.grant();
            true
        } else {
            log::warn!("Capture permission requested but not granted; use `grant` to allow");
            false
        }
    }
}
