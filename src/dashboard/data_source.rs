use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Identifies one fetch. Tags increase monotonically per data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTag(u64);

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading(RequestTag),
    Ready(Arc<Vec<T>>),
    Failed(String),
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    /// A newer fetch was started after this one; its result was dropped
    Stale,
}

/// Fetch state of one list (records, wages or persons).
///
/// Only the most recently issued fetch may complete; earlier completions are
/// discarded so a slow response can never overwrite a newer one. A failed
/// fetch leaves the last good snapshot in place.
#[derive(Debug)]
pub struct DataSource<T> {
    name: &'static str,
    state: LoadState<T>,
    snapshot: Arc<Vec<T>>,
    issued: u64,
    pending: Option<RequestTag>,
}

impl<T> DataSource<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: LoadState::Idle,
            snapshot: Arc::new(Vec::new()),
            issued: 0,
            pending: None,
        }
    }

    /// Starts a fetch and returns the tag its result must be delivered with.
    pub fn begin(&mut self) -> RequestTag {
        self.issued += 1;
        let tag = RequestTag(self.issued);
        self.pending = Some(tag);
        self.state = LoadState::Loading(tag);
        tag
    }

    pub fn complete<E: fmt::Display>(
        &mut self,
        tag: RequestTag,
        result: Result<Vec<T>, E>,
    ) -> Completion {
        if self.pending != Some(tag) {
            debug!(source = self.name, %tag, "Discarding stale fetch result");
            return Completion::Stale;
        }
        self.pending = None;

        match result {
            Ok(items) => {
                self.snapshot = Arc::new(items);
                self.state = LoadState::Ready(Arc::clone(&self.snapshot));
                Completion::Applied
            }
            Err(e) => {
                self.state = LoadState::Failed(e.to_string());
                Completion::Failed
            }
        }
    }

    pub fn state(&self) -> &LoadState<T> {
        &self.state
    }

    /// Last successfully loaded list; empty before the first load.
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.snapshot)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading(_))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_latest_result() {
        let mut source = DataSource::new("records");
        assert_eq!(source.state(), &LoadState::Idle);

        let tag = source.begin();
        assert!(source.is_loading());
        assert_eq!(source.complete::<String>(tag, Ok(vec![1, 2])), Completion::Applied);
        assert_eq!(*source.snapshot(), vec![1, 2]);
        assert_eq!(source.state(), &LoadState::Ready(Arc::new(vec![1, 2])));
    }

    #[test]
    fn discards_stale_completions() {
        let mut source = DataSource::new("records");
        let first = source.begin();
        let second = source.begin();
        assert!(second > first);

        assert_eq!(source.complete::<String>(second, Ok(vec![2])), Completion::Applied);
        assert_eq!(source.complete::<String>(first, Ok(vec![1])), Completion::Stale);
        assert_eq!(*source.snapshot(), vec![2]);

        // A tag can only complete once
        assert_eq!(source.complete::<String>(second, Ok(vec![3])), Completion::Stale);
    }

    #[test]
    fn failure_keeps_previous_snapshot() {
        let mut source = DataSource::new("wages");
        let tag = source.begin();
        source.complete::<String>(tag, Ok(vec!["Ana"]));

        let tag = source.begin();
        assert_eq!(
            source.complete(tag, Err("connection refused")),
            Completion::Failed
        );
        assert_eq!(
            source.state(),
            &LoadState::Failed("connection refused".to_string())
        );
        assert_eq!(*source.snapshot(), vec!["Ana"]);
    }
}
