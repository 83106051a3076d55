//! Shared mock port implementations for tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use domain::alert::entity::AlertId;
use domain::alert::error::SyncError;
use domain::common::entity::Identity;

use crate::secondary::alert_api::AlertApi;
use crate::secondary::push_channel::{PushChannel, PushConnection};

/// `AlertApi` mock with canned snapshot bodies and call recording.
///
/// Snapshot bodies are consumed front to back; once exhausted, further
/// fetches return an empty JSON array.
#[derive(Default)]
pub struct StaticAlertApi {
    snapshots: Mutex<VecDeque<Result<Vec<u8>, String>>>,
    pub snapshot_calls: AtomicU32,
    pub marked_read: Mutex<Vec<String>>,
    pub mark_all_calls: AtomicU32,
    pub fail_commands: AtomicBool,
}

impl StaticAlertApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful snapshot response body.
    pub fn with_snapshot(self, body: &str) -> Self {
        self.snapshots
            .lock()
            .unwrap()
            .push_back(Ok(body.as_bytes().to_vec()));
        self
    }

    /// Queue a failed snapshot response.
    pub fn with_snapshot_failure(self, reason: &str) -> Self {
        self.snapshots
            .lock()
            .unwrap()
            .push_back(Err(reason.to_string()));
        self
    }

    /// Make subsequent mark-read commands fail.
    pub fn fail_commands(self) -> Self {
        self.fail_commands.store(true, Ordering::Relaxed);
        self
    }

    pub fn marked_read_ids(&self) -> Vec<String> {
        self.marked_read.lock().unwrap().clone()
    }
}

impl AlertApi for StaticAlertApi {
    fn fetch_snapshot<'a>(
        &'a self,
        _identity: &'a Identity,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, SyncError>> + Send + 'a>> {
        self.snapshot_calls.fetch_add(1, Ordering::Relaxed);
        let next = self.snapshots.lock().unwrap().pop_front();
        Box::pin(async move {
            match next {
                Some(Ok(body)) => Ok(body),
                Some(Err(reason)) => Err(SyncError::SnapshotFailed(reason)),
                None => Ok(b"[]".to_vec()),
            }
        })
    }

    fn mark_read<'a>(
        &'a self,
        _identity: &'a Identity,
        id: &'a AlertId,
    ) -> Pin<Box<dyn Future<Output = Result<(), SyncError>> + Send + 'a>> {
        self.marked_read.lock().unwrap().push(id.0.clone());
        let fail = self.fail_commands.load(Ordering::Relaxed);
        Box::pin(async move {
            if fail {
                Err(SyncError::CommandFailed("mock command failure".to_string()))
            } else {
                Ok(())
            }
        })
    }

    fn mark_all_read<'a>(
        &'a self,
        _identity: &'a Identity,
    ) -> Pin<Box<dyn Future<Output = Result<(), SyncError>> + Send + 'a>> {
        self.mark_all_calls.fetch_add(1, Ordering::Relaxed);
        let fail = self.fail_commands.load(Ordering::Relaxed);
        Box::pin(async move {
            if fail {
                Err(SyncError::CommandFailed("mock command failure".to_string()))
            } else {
                Ok(())
            }
        })
    }
}

/// What one scripted connection does after delivering its payloads.
pub enum ConnectionScript {
    /// Deliver these payloads, then close in an orderly fashion.
    DeliverThenClose(Vec<Vec<u8>>),
    /// Deliver these payloads, then die with a transport error.
    DeliverThenFail(Vec<Vec<u8>>),
    /// Deliver these payloads, then stay open without further messages.
    DeliverThenHang(Vec<Vec<u8>>),
    /// Refuse the connection attempt outright.
    Refuse,
}

/// `PushChannel` mock driven by a queue of [`ConnectionScript`]s, one per
/// connection attempt. Attempts beyond the script produce idle connections
/// that stay open silently.
pub struct ScriptedChannel {
    scripts: Mutex<VecDeque<ConnectionScript>>,
    pub connect_attempts: AtomicU32,
}

impl ScriptedChannel {
    pub fn new(scripts: Vec<ConnectionScript>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            connect_attempts: AtomicU32::new(0),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.connect_attempts.load(Ordering::Relaxed)
    }
}

impl PushChannel for ScriptedChannel {
    fn connect<'a>(
        &'a self,
        _identity: &'a Identity,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn PushConnection>, SyncError>> + Send + 'a>> {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConnectionScript::DeliverThenHang(Vec::new()));
        Box::pin(async move {
            let (payloads, terminal) = match script {
                ConnectionScript::Refuse => {
                    return Err(SyncError::ConnectionLost("connection refused".to_string()));
                }
                ConnectionScript::DeliverThenClose(p) => (p, Terminal::Close),
                ConnectionScript::DeliverThenFail(p) => (p, Terminal::Fail),
                ConnectionScript::DeliverThenHang(p) => (p, Terminal::Hang),
            };
            Ok(Box::new(ScriptedConnection {
                pending: payloads.into(),
                terminal,
            }) as Box<dyn PushConnection>)
        })
    }
}

enum Terminal {
    Close,
    Fail,
    Hang,
}

struct ScriptedConnection {
    pending: VecDeque<Vec<u8>>,
    terminal: Terminal,
}

impl PushConnection for ScriptedConnection {
    fn next_message(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Option<Result<Vec<u8>, SyncError>>> + Send + '_>> {
        if let Some(payload) = self.pending.pop_front() {
            return Box::pin(async move { Some(Ok(payload)) });
        }
        match self.terminal {
            Terminal::Close => Box::pin(async { None }),
            Terminal::Fail => Box::pin(async {
                Some(Err(SyncError::ConnectionLost("scripted failure".to_string())))
            }),
            Terminal::Hang => Box::pin(std::future::pending()),
        }
    }
}
