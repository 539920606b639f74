//! Fakes that record what passes through them.

use async_trait::async_trait;
use parking_lot::Mutex;
use trellis_core::{CoreError, Escalation, EscalationSink, Signal, SignalSink};

/// Signal sink that keeps every accepted signal in arrival order
#[derive(Debug, Default)]
pub struct RecordingSink {
    signals: Mutex<Vec<Signal>>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Every signal accepted so far
    pub fn signals(&self) -> Vec<Signal> {
        self.signals.lock().clone()
    }

    /// Signal types accepted so far, with repeats
    pub fn types(&self) -> Vec<String> {
        self.signals
            .lock()
            .iter()
            .map(|s| s.signal_type.clone())
            .collect()
    }

    /// Signals of one type
    pub fn of_type(&self, signal_type: &str) -> Vec<Signal> {
        self.signals
            .lock()
            .iter()
            .filter(|s| s.signal_type == signal_type)
            .cloned()
            .collect()
    }

    /// Forget everything recorded
    pub fn clear(&self) {
        self.signals.lock().clear();
    }
}

impl SignalSink for RecordingSink {
    fn accept(&self, signal: Signal) {
        self.signals.lock().push(signal);
    }
}

/// Escalation sink that keeps every escalation
#[derive(Debug, Default)]
pub struct RecordingEscalation {
    escalations: Mutex<Vec<Escalation>>,
}

impl RecordingEscalation {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Escalations received so far
    pub fn escalations(&self) -> Vec<Escalation> {
        self.escalations.lock().clone()
    }
}

#[async_trait]
impl EscalationSink for RecordingEscalation {
    async fn escalate(&self, escalation: Escalation) -> Result<(), CoreError> {
        self.escalations.lock().push(escalation);
        Ok(())
    }
}
