/// Brackets a group of edits so an undo stack can treat them as one step.
pub trait TransactionLog {
    fn begin_batch(&mut self, label: &str);

    fn commit_batch(&mut self);
}

/// Used when the caller keeps no undo history.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransactionLog;

impl TransactionLog for NoopTransactionLog {
    fn begin_batch(&mut self, _label: &str) {}

    fn commit_batch(&mut self) {}
}

/// Remembers the label of every committed batch.
#[derive(Debug, Default, Clone)]
pub struct BatchRecorder {
    open: Vec<String>,
    pub committed: Vec<String>,
}

impl BatchRecorder {
    pub fn is_open(&self) -> bool {
        !self.open.is_empty()
    }
}

impl TransactionLog for BatchRecorder {
    fn begin_batch(&mut self, label: &str) {
        self.open.push(label.to_string());
    }

    fn commit_batch(&mut self) {
        if let Some(label) = self.open.pop() {
            self.committed.push(label);
        }
    }
}
