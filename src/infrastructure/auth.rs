use std::sync::Mutex;

pub trait AuthGateway: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Single-user gateway for hosts that authenticate elsewhere.
#[derive(Debug, Default)]
pub struct InMemoryAuthGateway {
    user_id: Mutex<Option<String>>,
}

impl InMemoryAuthGateway {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Mutex::new(Some(user_id.into())),
        }
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        if let Ok(mut guard) = self.user_id.lock() {
            *guard = Some(user_id.into());
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut guard) = self.user_id.lock() {
            *guard = None;
        }
    }
}

impl AuthGateway for InMemoryAuthGateway {
    fn current_user_id(&self) -> Option<String> {
        self.user_id
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .filter(|user_id| !user_id.trim().is_empty())
    }
}
