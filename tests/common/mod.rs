//! Scripted in-memory driver shared by the integration tests.

#![allow(dead_code)]

use mongo_motors::db::{Driver, DriverResult};
use mongo_motors::{DriverError, MongoConfig};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// A fake connection. Handles with the same `id` are the same connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeHandle {
    pub id: usize,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeDatabase {
    pub name: String,
    pub handle_id: usize,
}

#[derive(Default)]
struct State {
    next_id: AtomicUsize,
    dials: AtomicUsize,
    probes: AtomicUsize,
    dials_by_url: Mutex<HashMap<String, usize>>,
    closed: Mutex<Vec<usize>>,
    failing_dials: Mutex<HashSet<String>>,
    failing_probes: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

/// Driver that records every call and can fail or stall dials per URL.
#[derive(Clone, Default)]
pub struct ScriptedDriver {
    state: Arc<State>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of dials so far.
    pub fn dials(&self) -> usize {
        self.state.dials.load(Ordering::SeqCst)
    }

    pub fn dials_for(&self, url: &str) -> usize {
        self.state
            .dials_by_url
            .lock()
            .unwrap()
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub fn probes(&self) -> usize {
        self.state.probes.load(Ordering::SeqCst)
    }

    /// Ids of closed handles, in close order.
    pub fn closed(&self) -> Vec<usize> {
        self.state.closed.lock().unwrap().clone()
    }

    pub fn fail_dials(&self, url: &str) {
        self.state.failing_dials.lock().unwrap().insert(url.to_string());
    }

    pub fn fail_probes(&self, url: &str) {
        self.state.failing_probes.lock().unwrap().insert(url.to_string());
    }

    pub fn clear_failures(&self, url: &str) {
        self.state.failing_dials.lock().unwrap().remove(url);
        self.state.failing_probes.lock().unwrap().remove(url);
    }

    /// Make dials to `url` wait until [`release`](Self::release) is called.
    pub fn hold(&self, url: &str) {
        self.state
            .gates
            .lock()
            .unwrap()
            .insert(url.to_string(), Arc::new(Notify::new()));
    }

    /// Let a held dial to `url` complete.
    pub fn release(&self, url: &str) {
        if let Some(gate) = self.state.gates.lock().unwrap().remove(url) {
            gate.notify_one();
        }
    }

    /// Wait until at least `count` dials have started, panicking after a second.
    pub async fn wait_for_dials(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while self.dials() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("dials did not start in time");
    }
}

impl Driver for ScriptedDriver {
    type Handle = FakeHandle;
    type Database = FakeDatabase;

    fn dial(&self, url: &str) -> impl Future<Output = DriverResult<FakeHandle>> + Send {
        let url = url.to_string();
        let state = Arc::clone(&self.state);
        async move {
            state.dials.fetch_add(1, Ordering::SeqCst);
            *state
                .dials_by_url
                .lock()
                .unwrap()
                .entry(url.clone())
                .or_insert(0) += 1;

            let gate = state.gates.lock().unwrap().get(&url).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            if state.failing_dials.lock().unwrap().contains(&url) {
                return Err(DriverError::new("connection refused"));
            }

            let id = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(FakeHandle { id, url })
        }
    }

    fn probe(&self, handle: &FakeHandle) -> impl Future<Output = DriverResult<()>> + Send {
        let url = handle.url.clone();
        let state = Arc::clone(&self.state);
        async move {
            state.probes.fetch_add(1, Ordering::SeqCst);
            if state.failing_probes.lock().unwrap().contains(&url) {
                return Err(DriverError::new("server selection timeout"));
            }
            Ok(())
        }
    }

    fn close(&self, handle: FakeHandle) -> impl Future<Output = ()> + Send {
        let state = Arc::clone(&self.state);
        async move {
            state.closed.lock().unwrap().push(handle.id);
        }
    }

    fn select_database(
        &self,
        handle: &FakeHandle,
        name: Option<&str>,
    ) -> DriverResult<FakeDatabase> {
        let name = match name {
            Some(name) => name.to_string(),
            None => default_database(&handle.url)
                .ok_or_else(|| DriverError::new("no default database in URL"))?,
        };
        Ok(FakeDatabase {
            name,
            handle_id: handle.id,
        })
    }
}

/// Database named by the URL path, if any.
fn default_database(url: &str) -> Option<String> {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let (_, path) = rest.split_once('/')?;
    let name = path.split('?').next().unwrap_or("");
    (!name.is_empty()).then(|| name.to_string())
}

/// Config for `host:27017` with no database.
pub fn config(host: &str) -> MongoConfig {
    MongoConfig::new(host, 27017)
}
