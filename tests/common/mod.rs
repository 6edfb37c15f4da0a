//! Shared integration test helpers for termshim.
//!
//! Provides a recording mock engine, a loader whose completion the test
//! controls, and a container with adjustable size.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::{MockContainer, controlled_loader};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a subset
//! of helpers are used per file.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use termshim::{
    Container, ContainerMetrics, Engine, EngineError, EngineResult, HyperlinkSpan, OptionValue,
};
use tokio::sync::oneshot;

/// Everything an engine was asked to do.
#[derive(Debug, Default)]
pub struct EngineRecord {
    pub writes: Vec<Vec<u8>>,
    pub resizes: Vec<(u16, u16)>,
    pub options: Vec<(String, OptionValue)>,
    pub rows: HashMap<usize, String>,
    pub hyperlinks: HashMap<usize, Vec<HyperlinkSpan>>,
}

impl EngineRecord {
    /// All written bytes as one string.
    pub fn output(&self) -> String {
        self.writes
            .iter()
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect()
    }

    pub fn option_sets(&self, name: &str) -> Vec<OptionValue> {
        self.options
            .iter()
            .filter(|(option, _)| option == name)
            .map(|(_, value)| value.clone())
            .collect()
    }
}

pub type SharedRecord = Arc<Mutex<EngineRecord>>;

/// Engine that records every call into a shared [`EngineRecord`].
pub struct MockEngine {
    record: SharedRecord,
}

impl MockEngine {
    pub fn new() -> (Self, SharedRecord) {
        let record = SharedRecord::default();
        (
            Self {
                record: Arc::clone(&record),
            },
            record,
        )
    }
}

impl Engine for MockEngine {
    fn write(&mut self, data: &[u8]) {
        self.record.lock().writes.push(data.to_vec());
    }

    fn resize(&mut self, cols: u16, rows: u16) -> Result<(), EngineError> {
        self.record.lock().resizes.push((cols, rows));
        Ok(())
    }

    fn set_option(&mut self, name: &str, value: &OptionValue) -> Result<(), EngineError> {
        self.record
            .lock()
            .options
            .push((name.to_string(), value.clone()));
        Ok(())
    }

    fn hyperlinks(&self, row: usize) -> Vec<HyperlinkSpan> {
        self.record
            .lock()
            .hyperlinks
            .get(&row)
            .cloned()
            .unwrap_or_default()
    }

    fn row_codepoints(&self, row: usize) -> Option<Vec<u32>> {
        let record = self.record.lock();
        let text = record.rows.get(&row)?;
        Some(text.chars().map(u32::from).collect())
    }
}

/// Completes a pending engine load on demand.
pub struct LoaderControl {
    tx: oneshot::Sender<EngineResult>,
}

impl LoaderControl {
    /// Finish the load with a fresh mock engine; returns its record.
    pub fn succeed(self) -> SharedRecord {
        let (engine, record) = MockEngine::new();
        let _ = self.tx.send(Ok(Box::new(engine)));
        record
    }

    pub fn fail(self, reason: &str) {
        let _ = self.tx.send(Err(EngineError::Init(reason.to_string())));
    }
}

/// A loader future that resolves when the returned control says so.
pub fn controlled_loader() -> (LoaderControl, impl Future<Output = EngineResult> + Send + 'static) {
    let (tx, rx) = oneshot::channel();
    let load = async move { rx.await.unwrap_or(Err(EngineError::Cancelled)) };
    (LoaderControl { tx }, load)
}

/// A loader that resolves immediately with a mock engine.
pub fn ready_loader() -> (SharedRecord, impl Future<Output = EngineResult> + Send + 'static) {
    let (engine, record) = MockEngine::new();
    let load = async move { Ok(Box::new(engine) as Box<dyn Engine>) };
    (record, load)
}

/// Let spawned tasks run to completion on the current-thread runtime.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Container with 10x20 px cells and no padding, resizable from the test.
pub struct MockContainer {
    metrics: Mutex<Option<ContainerMetrics>>,
}

impl MockContainer {
    pub fn new(width: f64, height: f64) -> Arc<Self> {
        Arc::new(Self {
            metrics: Mutex::new(Some(cell_metrics(width, height))),
        })
    }

    pub fn set_size(&self, width: f64, height: f64) {
        *self.metrics.lock() = Some(cell_metrics(width, height));
    }

    pub fn hide(&self) {
        *self.metrics.lock() = None;
    }
}

impl Container for MockContainer {
    fn metrics(&self) -> Option<ContainerMetrics> {
        *self.metrics.lock()
    }
}

pub fn cell_metrics(width: f64, height: f64) -> ContainerMetrics {
    ContainerMetrics {
        width,
        height,
        horizontal_padding: 0.0,
        vertical_padding: 0.0,
        cell_width: 10.0,
        cell_height: 20.0,
    }
}
