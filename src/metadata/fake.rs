//! Scripted in-memory metadata client for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::metadata::client::MetadataClient;
use crate::metadata::types::{MetadataError, RawMetadataResult};

#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Present(&'static str),
    Absent,
    Error,
}

impl Reply {
    fn into_result(self) -> RawMetadataResult {
        match self {
            Reply::Present(body) => RawMetadataResult::Present(body.to_string()),
            Reply::Absent => RawMetadataResult::Absent,
            Reply::Error => RawMetadataResult::TransientError(MetadataError::Status(500)),
        }
    }
}

/// Replies are consumed in order per path; once a script runs out the
/// persistent reply (or `Absent`) is returned.
#[derive(Default)]
pub struct FakeMetadata {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    persistent: HashMap<String, Reply>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, path: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(path.to_string(), replies.into());
        self
    }

    pub fn persistent(mut self, path: &str, reply: Reply) -> Self {
        self.persistent.insert(path.to_string(), reply);
        self
    }

    pub fn calls(&self, path: &str) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

#[async_trait]
impl MetadataClient for FakeMetadata {
    async fn fetch(&self, path: &str) -> RawMetadataResult {
        *self.calls.lock().unwrap().entry(path.to_string()).or_default() += 1;

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|replies| replies.pop_front());

        scripted
            .or_else(|| self.persistent.get(path).copied())
            .unwrap_or(Reply::Absent)
            .into_result()
    }
}
