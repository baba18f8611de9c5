#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rowkit::{Connector, Driver, DriverError, QueryEvent, QuerySink, SqlRow, StaticRegistry};

/// Scripted driver state shared between a test and the driver the session
/// opens through [`FakeConnector`].
#[derive(Default)]
pub struct FakeState {
    /// Every statement the session issued, in order.
    pub log: Mutex<Vec<String>>,
    /// Replies for `query`, popped front to back. Missing reply = no rows.
    pub query_replies: Mutex<VecDeque<Result<Vec<SqlRow>, String>>>,
    /// Replies for `execute`, popped front to back. Missing reply = 0 rows.
    pub execute_replies: Mutex<VecDeque<Result<u64, String>>>,
    /// Reply for `run_atomic`. Missing reply = success.
    pub atomic_replies: Mutex<VecDeque<Result<(), String>>>,
}

impl FakeState {
    pub fn push_query_rows(&self, rows: Vec<SqlRow>) {
        self.query_replies.lock().unwrap().push_back(Ok(rows));
    }

    pub fn push_query_failure(&self, message: &str) {
        self.query_replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_owned()));
    }

    pub fn push_execute_affected(&self, affected: u64) {
        self.execute_replies.lock().unwrap().push_back(Ok(affected));
    }

    pub fn logged(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

pub struct FakeConnector(pub Arc<FakeState>);

#[async_trait]
impl Connector for FakeConnector {
    async fn open(&self) -> Result<Box<dyn Driver>, DriverError> {
        Ok(Box::new(FakeDriver(Arc::clone(&self.0))))
    }
}

struct FakeDriver(Arc<FakeState>);

#[async_trait]
impl Driver for FakeDriver {
    async fn execute(&self, sql: &str) -> Result<u64, DriverError> {
        self.0.log.lock().unwrap().push(sql.to_owned());
        self.0
            .execute_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(0))
            .map_err(DriverError::Statement)
    }

    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>, DriverError> {
        self.0.log.lock().unwrap().push(sql.to_owned());
        self.0
            .query_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
            .map_err(DriverError::Statement)
    }

    async fn run_atomic(&self, statements: &[String]) -> Result<(), DriverError> {
        let mut log = self.0.log.lock().unwrap();
        for sql in statements {
            log.push(sql.clone());
        }
        drop(log);
        self.0
            .atomic_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
            .map_err(DriverError::Statement)
    }

    async fn close(&self) {}
}

/// Sink that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<QueryEvent>>,
}

impl RecordingSink {
    pub fn recorded(&self) -> Vec<QueryEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl QuerySink for RecordingSink {
    fn record(&self, event: QueryEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn person_registry() -> StaticRegistry {
    StaticRegistry::new().register("person", "Person")
}
