use std::sync::Arc;
use tokio::sync::RwLock;

/// Load state of the document corpus.
#[derive(Debug, Clone)]
pub enum CorpusState {
    Unloaded,
    Loading,
    Ready(Arc<str>),
    Failed(String),
}

impl CorpusState {
    pub fn label(&self) -> &'static str {
        match self {
            CorpusState::Unloaded => "unloaded",
            CorpusState::Loading => "loading",
            CorpusState::Ready(_) => "ready",
            CorpusState::Failed(_) => "failed",
        }
    }
}

/// Process-wide readiness gate around the corpus text.
///
/// Written by the loader exactly once per successful start, read by every
/// request. Readers only clone the `Arc`, so the lock is never held across
/// an upstream call.
#[derive(Debug, Clone)]
pub struct Corpus {
    state: Arc<RwLock<CorpusState>>,
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new()
    }
}

impl Corpus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(CorpusState::Unloaded)),
        }
    }

    pub fn ready(text: impl Into<Arc<str>>) -> Self {
        Self {
            state: Arc::new(RwLock::new(CorpusState::Ready(text.into()))),
        }
    }

    pub async fn snapshot(&self) -> CorpusState {
        self.state.read().await.clone()
    }

    /// Moves `Unloaded` to `Loading`. Returns false if a load already ran
    /// or is running.
    pub async fn begin_loading(&self) -> bool {
        let mut state = self.state.write().await;
        match *state {
            CorpusState::Unloaded => {
                *state = CorpusState::Loading;
                true
            }
            _ => false,
        }
    }

    pub async fn finish(&self, result: anyhow::Result<String>) {
        let mut state = self.state.write().await;
        *state = match result {
            Ok(text) => CorpusState::Ready(Arc::from(text)),
            Err(e) => CorpusState::Failed(format!("{:#}", e)),
        };
    }
}
