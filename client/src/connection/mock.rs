//! Scripted connection for session tests

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use pylon_common::protocol::Packet;

use super::{Connection, Error, Result};

#[derive(Default)]
pub(crate) struct MockConnection {
    sent: Mutex<Vec<Packet>>,
    replies: Mutex<VecDeque<Packet>>,
    lookups: Mutex<Vec<(String, u64, bool)>>,
    send_error: Mutex<Option<Error>>,
    lookup_error: Mutex<Option<Error>>,
    receives: AtomicUsize,
}

impl MockConnection {
    pub fn with_replies(replies: impl IntoIterator<Item = Packet>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn push_reply(&self, reply: Packet) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn fail_next_send(&self, error: Error) {
        *self.send_error.lock().unwrap() = Some(error);
    }

    pub fn fail_lookup(&self, error: Error) {
        *self.lookup_error.lock().unwrap() = Some(error);
    }

    pub fn sent(&self) -> Vec<Packet> {
        self.sent.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> Vec<(String, u64, bool)> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn receives(&self) -> usize {
        self.receives.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn send(&self, request: Packet) -> Result<()> {
        if let Some(e) = self.send_error.lock().unwrap().take() {
            return Err(e);
        }
        self.sent.lock().unwrap().push(request);
        Ok(())
    }

    /// an exhausted script looks like a closed connection
    async fn receive(&self) -> Result<Packet> {
        self.receives.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(Error::Disconnected)
    }

    async fn resolve_and_connect(
        &self,
        topic: &str,
        request_id: u64,
        authoritative: bool,
    ) -> Result<()> {
        self.lookups
            .lock()
            .unwrap()
            .push((topic.to_string(), request_id, authoritative));
        match self.lookup_error.lock().unwrap().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
