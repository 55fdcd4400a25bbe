//! Scripted fakes of the store collaborators, shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use s3ddb::batch::{Jitter, Sleeper};
use s3ddb::store::{ObjectLocation, ObjectReader, ReadError, StoreError, TableWriter, WriteItem};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// What the fake table does with one submission.
#[derive(Debug, Clone)]
pub enum Reply {
    Accept,
    /// Hand back the items at these positions of the submission
    Unprocessed(Vec<usize>),
    /// Reject with a service error code
    Error(&'static str),
    Transport,
}

type Rule = Box<dyn Fn(usize, &[WriteItem]) -> Reply + Send + Sync>;

/// Records every submission and answers from a script (then accepts).
pub struct ScriptedTable {
    script: Mutex<VecDeque<Reply>>,
    rule: Option<Rule>,
    calls: Mutex<Vec<Vec<WriteItem>>>,
}

impl ScriptedTable {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            rule: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting() -> Self {
        Self::new(Vec::new())
    }

    /// Decide each reply from the call number and the submitted items.
    pub fn with_rule<F>(rule: F) -> Self
    where
        F: Fn(usize, &[WriteItem]) -> Reply + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            rule: Some(Box::new(rule)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<WriteItem>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every item submitted across all calls
    pub fn submitted_items(&self) -> usize {
        self.calls.lock().unwrap().iter().map(Vec::len).sum()
    }
}

#[async_trait]
impl TableWriter for ScriptedTable {
    async fn batch_write(
        &self,
        _table: &str,
        items: &[WriteItem],
    ) -> Result<Vec<WriteItem>, StoreError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(items.to_vec());
            calls.len() - 1
        };

        let reply = match &self.rule {
            Some(rule) => rule(call, items),
            None => self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Reply::Accept),
        };

        // Let sibling writers interleave
        tokio::task::yield_now().await;

        match reply {
            Reply::Accept => Ok(Vec::new()),
            Reply::Unprocessed(positions) => Ok(positions.iter().map(|&i| items[i].clone()).collect()),
            Reply::Error(code) => Err(StoreError::Service {
                code: code.to_string(),
                message: "scripted failure".to_string(),
            }),
            Reply::Transport => Err(StoreError::Transport("connection reset".to_string())),
        }
    }
}

/// Records requested delays without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Always picks the window midpoint.
pub struct MidpointJitter;

impl Jitter for MidpointJitter {
    fn sample(&self, min: Duration, max: Duration) -> Duration {
        min + (max - min) / 2
    }
}

/// Objects held in memory, keyed by location.
#[derive(Default)]
pub struct MemoryObjects {
    objects: HashMap<ObjectLocation, Vec<u8>>,
}

impl MemoryObjects {
    pub fn with(mut self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) -> Self {
        self.objects
            .insert(ObjectLocation::new(bucket, key), body.into());
        self
    }
}

#[async_trait]
impl ObjectReader for MemoryObjects {
    async fn get(&self, location: &ObjectLocation) -> Result<Vec<u8>, ReadError> {
        self.objects
            .get(location)
            .cloned()
            .ok_or_else(|| ReadError::NotFound(location.to_string()))
    }
}

pub fn item(value: Value) -> WriteItem {
    match value {
        Value::Object(map) => WriteItem::new(map),
        other => panic!("not an object: {}", other),
    }
}

pub fn items(n: usize) -> Vec<WriteItem> {
    (0..n)
        .map(|i| item(json!({ "DeviceId": format!("device-{}", i), "StatusTime": 1_672_531_200_000i64 + i as i64 })))
        .collect()
}

/// `n` valid NDJSON lines, one second apart from 2023-01-01T00:00:00Z
pub fn ndjson_lines(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            format!(
                r#"{{"DeviceId":"device-{}","StatusTime":"2023-01-01T00:{:02}:{:02}Z","Reading":{}}}"#,
                i,
                i / 60,
                i % 60,
                i * 10
            )
        })
        .collect()
}
