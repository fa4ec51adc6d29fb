//! In-process broadcast channel between sessions.
//!
//! DESIGN
//! ======
//! Every joined session gets a bounded mpsc receiver. Emitting from one
//! session delivers the encoded payload to every other session and never
//! back to the sender. Delivery is best-effort: a full queue drops the
//! message for that session, and a closed receiver removes the session.
//! There is no ordering across senders and no acknowledgement.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use socket::SocketMessage;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::SocketError;
use crate::host::Socket;

/// Per-session queue depth.
pub const SESSION_QUEUE: usize = 64;

/// One payload as a receiving session sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub event: String,
    pub payload: Value,
}

type Sessions = Rc<RefCell<HashMap<Uuid, mpsc::Sender<Envelope>>>>;

#[derive(Clone, Default)]
pub struct SessionHub {
    sessions: Sessions,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. The returned socket emits to every other session.
    pub fn join(&self) -> (HubSocket, mpsc::Receiver<Envelope>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SESSION_QUEUE);
        self.sessions.borrow_mut().insert(id, tx);
        debug!(%id, "session joined");
        (HubSocket { id, sessions: Rc::clone(&self.sessions) }, rx)
    }

    pub fn leave(&self, id: Uuid) -> bool {
        let removed = self.sessions.borrow_mut().remove(&id).is_some();
        if removed {
            debug!(%id, "session left");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.borrow().len()
    }
}

/// A session's handle on the hub.
#[derive(Clone)]
pub struct HubSocket {
    id: Uuid,
    sessions: Sessions,
}

impl HubSocket {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Socket for HubSocket {
    fn emit(&self, event: &str, message: &SocketMessage) -> Result<(), SocketError> {
        let envelope = Envelope { event: event.to_owned(), payload: socket::encode(message) };
        let mut closed = Vec::new();
        {
            let sessions = self.sessions.borrow();
            for (id, tx) in sessions.iter() {
                if *id == self.id {
                    continue;
                }
                match tx.try_send(envelope.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => warn!(%id, kind = message.kind(), "session queue full; dropping"),
                    Err(TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }
        if !closed.is_empty() {
            let mut sessions = self.sessions.borrow_mut();
            for id in closed {
                sessions.remove(&id);
                debug!(%id, "pruned closed session");
            }
        }
        Ok(())
    }
}
