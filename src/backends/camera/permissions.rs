// SPDX-License-Identifier: GPL-3.0-only

//! Camera permission gate
//!
//! A denied permission parks the live screen in a waiting state. Denial is
//! never cached: every check asks the provider again.

use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// User has not been asked yet
    Undetermined,
}

/// What the live screen should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Placeholder until access is granted
    Waiting,
    Ready,
}

/// Source of permission state, implemented by the platform collaborator
pub trait PermissionProvider {
    fn camera_status(&self) -> PermissionStatus;

    /// Prompt the user; returns the resulting status
    fn request_camera(&self) -> PermissionStatus;
}

pub struct PermissionGate<P: PermissionProvider> {
    provider: P,
}

impl<P: PermissionProvider> PermissionGate<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Query (and if needed request) camera access
    pub fn check(&self) -> ScreenState {
        let status = match self.provider.camera_status() {
            PermissionStatus::Undetermined => {
                info!("Requesting camera permission");
                self.provider.request_camera()
            }
            status => status,
        };

        debug!(?status, "Camera permission checked");
        match status {
            PermissionStatus::Granted => ScreenState::Ready,
            PermissionStatus::Denied | PermissionStatus::Undetermined => ScreenState::Waiting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeProvider {
        status: Cell<PermissionStatus>,
        on_request: PermissionStatus,
        requests: Cell<u32>,
    }

    impl PermissionProvider for &FakeProvider {
        fn camera_status(&self) -> PermissionStatus {
            self.status.get()
        }

        fn request_camera(&self) -> PermissionStatus {
            self.requests.set(self.requests.get() + 1);
            self.status.set(self.on_request);
            self.on_request
        }
    }

    #[test]
    fn test_undetermined_requests_once() {
        let provider = FakeProvider {
            status: Cell::new(PermissionStatus::Undetermined),
            on_request: PermissionStatus::Granted,
            requests: Cell::new(0),
        };
        let gate = PermissionGate::new(&provider);
        assert_eq!(gate.check(), ScreenState::Ready);
        assert_eq!(gate.check(), ScreenState::Ready);
        assert_eq!(provider.requests.get(), 1);
    }

    #[test]
    fn test_denial_is_rechecked() {
        let provider = FakeProvider {
            status: Cell::new(PermissionStatus::Denied),
            on_request: PermissionStatus::Denied,
            requests: Cell::new(0),
        };
        let gate = PermissionGate::new(&provider);
        assert_eq!(gate.check(), ScreenState::Waiting);

        // User grants access in system settings
        provider.status.set(PermissionStatus::Granted);
        assert_eq!(gate.check(), ScreenState::Ready);
    }
}
