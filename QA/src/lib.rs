pub mod config;
pub mod corpus;
pub mod document_processor;
pub mod models;
pub mod openai_service;
pub mod query_service;

pub use config::Config;
pub use corpus::{Corpus, CorpusState};
pub use document_processor::{spawn_load, DocumentProcessor, PdfTextExtractor, TextExtractor};
pub use models::*;
pub use openai_service::{ChatClient, OpenAIService};
pub use query_service::{build_prompt, CorpusBudget, QueryError, QueryService};
