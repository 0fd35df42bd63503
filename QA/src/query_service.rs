use crate::corpus::{Corpus, CorpusState};
use crate::models::Prompt;
use crate::openai_service::ChatClient;
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use tokio::sync::OnceCell;

pub const SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant for India's 2025 budget and related announcements.";
pub const FALLBACK_ANSWER: &str = "No response received from OpenAI.";

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("PDF content is not loaded yet.")]
    NotReady,
    #[error("Failed to load PDFs: {0}")]
    LoadFailed(String),
    #[error("Upstream request failed: {0:#}")]
    Upstream(anyhow::Error),
    #[error("Internal error: {0:#}")]
    Internal(anyhow::Error),
}

pub fn build_prompt(query: &str, corpus: &str) -> Prompt {
    Prompt {
        system: SYSTEM_INSTRUCTION.to_string(),
        user: format!("Based on these documents, answer this query: {query}\n\n{corpus}"),
    }
}

/// Caps the corpus at a number of `cl100k_base` tokens.
pub struct CorpusBudget {
    bpe: CoreBPE,
    max_tokens: usize,
}

impl CorpusBudget {
    pub fn new(max_tokens: usize) -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().context("Failed to load cl100k_base tokenizer")?;
        Ok(Self { bpe, max_tokens })
    }

    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    /// Returns `corpus` unchanged when it fits, otherwise its longest
    /// decodable token prefix within the budget, along with the token count
    /// of whatever is returned.
    pub fn fit<'a>(&self, corpus: &'a str) -> (Cow<'a, str>, usize) {
        let tokens = self.bpe.encode_with_special_tokens(corpus);
        if tokens.len() <= self.max_tokens {
            return (Cow::Borrowed(corpus), tokens.len());
        }

        // A cut can land inside a multi-byte character; back off until the
        // prefix decodes.
        let mut end = self.max_tokens;
        while end > 0 {
            if let Ok(text) = self.bpe.decode(tokens[..end].to_vec()) {
                log::warn!("Corpus truncated from {} to {} tokens", tokens.len(), end);
                return (Cow::Owned(text), end);
            }
            end -= 1;
        }
        (Cow::Owned(String::new()), 0)
    }
}

/// Corpus text as sent upstream, computed once per process.
#[derive(Debug, Clone)]
struct FittedCorpus {
    text: Arc<str>,
    tokens: usize,
}

pub struct QueryService {
    corpus: Corpus,
    chat_client: Arc<dyn ChatClient>,
    budget: Option<Arc<CorpusBudget>>,
    fitted: OnceCell<FittedCorpus>,
    verbose: bool,
}

impl QueryService {
    pub fn new(corpus: Corpus, chat_client: Arc<dyn ChatClient>, verbose: bool) -> Self {
        Self {
            corpus,
            chat_client,
            budget: None,
            fitted: OnceCell::new(),
            verbose,
        }
    }

    pub fn with_budget(mut self, budget: CorpusBudget) -> Self {
        self.budget = Some(Arc::new(budget));
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// The ready corpus cut down to the token budget.
    ///
    /// Tokenizing runs once on the blocking pool; the ready text never
    /// changes, so later calls reuse the first result.
    async fn fitted_corpus(
        &self,
        budget: &Arc<CorpusBudget>,
        text: Arc<str>,
    ) -> Result<&FittedCorpus, QueryError> {
        self.fitted
            .get_or_try_init(|| async move {
                let budget = Arc::clone(budget);
                tokio::task::spawn_blocking(move || {
                    let (fitted, tokens) = budget.fit(&text);
                    let text = match fitted {
                        Cow::Borrowed(_) => Arc::clone(&text),
                        Cow::Owned(owned) => Arc::from(owned),
                    };
                    FittedCorpus { text, tokens }
                })
                .await
                .context("Corpus tokenizer task panicked")
                .map_err(QueryError::Internal)
            })
            .await
    }

    /// Answers one non-empty query against the loaded corpus.
    pub async fn answer(&self, request_id: &str, query: &str) -> Result<String, QueryError> {
        let text = match self.corpus.snapshot().await {
            CorpusState::Ready(text) => text,
            CorpusState::Unloaded | CorpusState::Loading => {
                log::error!("[{}] Combined text not loaded", request_id);
                return Err(QueryError::NotReady);
            }
            CorpusState::Failed(reason) => {
                log::error!("[{}] Corpus unavailable: {}", request_id, reason);
                return Err(QueryError::LoadFailed(reason));
            }
        };

        let prompt = match &self.budget {
            Some(budget) => {
                let fitted = self.fitted_corpus(budget, text).await?;
                if self.verbose {
                    log::info!("[{}] Corpus tokens: {}", request_id, fitted.tokens);
                }
                build_prompt(query, &fitted.text)
            }
            None => build_prompt(query, &text),
        };

        if self.verbose {
            log::info!(
                "[{}] Prompt built, {} characters",
                request_id,
                prompt.user.len()
            );
        }

        match self.chat_client.complete(&prompt).await {
            Ok(Some(answer)) => Ok(answer),
            Ok(None) => {
                log::warn!("[{}] Empty completion, using fallback answer", request_id);
                Ok(FALLBACK_ANSWER.to_string())
            }
            Err(e) => {
                log::error!("[{}] Error with OpenAI API: {:#}", request_id, e);
                Err(QueryError::Upstream(e))
            }
        }
    }
}
