use std::io;
use std::sync::{Arc, Mutex};

use treewatch::exec::{EventSink, ExecError, TriggeredEvent};

/// A sink that records every triggered event. Clones share the record, so a
/// test can keep one handle while the dispatcher owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<TriggeredEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TriggeredEvent> {
        self.events.lock().unwrap().clone()
    }

    /// `(kind, name)` pairs, in trigger order.
    pub fn kinds_and_names(&self) -> Vec<(String, String)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| (e.kind.to_string(), e.name.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn trigger(&mut self, event: &TriggeredEvent) -> Result<(), ExecError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// A sink that always fails, either recoverably or fatally.
#[derive(Debug, Clone, Copy)]
pub struct FailingSink {
    pub fatal: bool,
}

impl EventSink for FailingSink {
    fn trigger(&mut self, event: &TriggeredEvent) -> Result<(), ExecError> {
        if self.fatal {
            Err(ExecError::ResourceExhausted(io::Error::other("fork refused")))
        } else {
            Err(ExecError::Spawn {
                command: format!("handle {}", event.name),
                source: io::Error::from(io::ErrorKind::NotFound),
            })
        }
    }
}
