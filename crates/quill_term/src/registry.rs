//! Process-wide session registry.
//!
//! External commands ("send this string to the active terminal") need to
//! find the session behind a given host view. The registry is a single
//! map from view id to session handle, mutated on register/deregister;
//! readers clone the handle out under the lock and work with the clone.

use std::collections::HashMap;

use lazy_static::lazy_static;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use crate::SessionCommand;

pub type ViewId = u64;

#[derive(Clone)]
pub struct SessionHandle {
    pub commands: UnboundedSender<SessionCommand>,
}

lazy_static! {
    static ref SESSIONS: Mutex<HashMap<ViewId, SessionHandle>> = Mutex::new(HashMap::new());
    static ref ACTIVE_VIEW: Mutex<Option<ViewId>> = Mutex::new(None);
}

/// Register a session; the newest registration becomes the active view.
pub fn register(view_id: ViewId, handle: SessionHandle) {
    SESSIONS.lock().insert(view_id, handle);
    *ACTIVE_VIEW.lock() = Some(view_id);
}

pub fn deregister(view_id: ViewId) {
    SESSIONS.lock().remove(&view_id);
    let mut active = ACTIVE_VIEW.lock();
    if *active == Some(view_id) {
        *active = None;
    }
}

/// Mark the view the user is focused on.
pub fn set_active(view_id: ViewId) {
    if SESSIONS.lock().contains_key(&view_id) {
        *ACTIVE_VIEW.lock() = Some(view_id);
    }
}

pub fn active_view() -> Option<ViewId> {
    *ACTIVE_VIEW.lock()
}

/// Send a command to the session of a specific view. `false` when the
/// view has no live session.
pub fn send_to_view(view_id: ViewId, command: SessionCommand) -> bool {
    let handle = SESSIONS.lock().get(&view_id).cloned();
    match handle {
        Some(handle) => handle.commands.send(command).is_ok(),
        None => false,
    }
}

/// Send a command to the active session, if any.
pub fn send_to_active(command: SessionCommand) -> bool {
    match active_view() {
        Some(view_id) => send_to_view(view_id, command),
        None => false,
    }
}
