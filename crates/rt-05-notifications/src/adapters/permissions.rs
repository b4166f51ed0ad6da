//! Permission adapter with a configured answer.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::PermissionState;
use crate::ports::PermissionRequester;

/// Starts in `initial`; a prompt resolves to `answer`.
#[derive(Debug)]
pub struct StaticPermissions {
    state: Mutex<PermissionState>,
    answer: PermissionState,
}

impl StaticPermissions {
    pub fn new(initial: PermissionState, answer: PermissionState) -> Self {
        Self {
            state: Mutex::new(initial),
            answer,
        }
    }

    pub fn granted() -> Self {
        Self::new(PermissionState::Granted, PermissionState::Granted)
    }

    pub fn denied() -> Self {
        Self::new(PermissionState::Denied, PermissionState::Denied)
    }
}

#[async_trait]
impl PermissionRequester for StaticPermissions {
    fn current(&self) -> PermissionState {
        *self.state.lock()
    }

    async fn request(&self) -> PermissionState {
        let mut state = self.state.lock();
        // A denial is sticky, as on real platforms.
        if *state == PermissionState::Prompt {
            *state = self.answer;
        }
        *state
    }
}
