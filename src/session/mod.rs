// Session context: the one owner of "who is signed in right now".
//
// Initialized once at startup from the store's persisted session, then kept
// current by a listener on the store's session-change notifications. Injected
// through `AppState` rather than living in a global.
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::store::{SessionEvent, SessionUser, StoreClient};

pub struct SessionContext {
    current: RwLock<Option<SessionUser>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionContext {
    /// Restore the persisted session (if any) and start listening for
    /// session changes. A failed session fetch is treated the same as an
    /// absent session; the failure is only logged.
    pub async fn attach(store: Arc<StoreClient>) -> Arc<Self> {
        let context = Arc::new(Self {
            current: RwLock::new(None),
            listener: Mutex::new(None),
        });

        match store.get_session().await {
            Ok(Some(session)) => context.set(Some(session.user)),
            Ok(None) => {}
            Err(e) => tracing::warn!("session restore failed, treating as signed out: {}", e),
        }

        let mut events = store.subscribe();
        let weak = Arc::downgrade(&context);
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(context) = weak.upgrade() else { break };
                        match event {
                            SessionEvent::SignedIn(session) | SessionEvent::TokenRefreshed(session) => {
                                context.set(Some(session.user));
                            }
                            SessionEvent::SignedOut => context.set(None),
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("session listener lagged, skipped {} notifications", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        *context.listener.lock().unwrap() = Some(handle);
        context
    }

    /// Current identity, absent when signed out.
    pub fn current(&self) -> Option<SessionUser> {
        self.current.read().unwrap().clone()
    }

    pub fn set(&self, user: Option<SessionUser>) {
        *self.current.write().unwrap() = user;
    }

    /// Stop listening for session changes. Also runs on drop.
    pub fn detach(&self) {
        if let Some(handle) = self.listener.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.detach();
    }
}
