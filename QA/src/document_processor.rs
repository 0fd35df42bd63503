use crate::corpus::Corpus;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Turns the raw bytes of one document into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let text = pdf_extract::extract_text_from_mem(bytes)?;
        Ok(text)
    }
}

pub struct DocumentProcessor<E = PdfTextExtractor> {
    extractor: E,
}

impl DocumentProcessor<PdfTextExtractor> {
    pub fn new() -> Self {
        Self {
            extractor: PdfTextExtractor,
        }
    }
}

impl Default for DocumentProcessor<PdfTextExtractor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TextExtractor> DocumentProcessor<E> {
    pub fn with_extractor(extractor: E) -> Self {
        Self { extractor }
    }

    /// Extracts every document in order and joins them, each followed by a
    /// blank line. Any failure aborts the whole load.
    pub fn process_documents(&self, paths: &[PathBuf]) -> Result<String> {
        let mut all_text = String::new();

        for path in paths {
            let text = self.process_document(path)?;
            all_text.push_str(&text);
            all_text.push_str("\n\n");
        }

        log::info!(
            "Combined text loaded from {} documents. Length: {}",
            paths.len(),
            all_text.len()
        );
        Ok(all_text)
    }

    fn process_document(&self, path: &Path) -> Result<String> {
        log::info!("Reading document: {}", path.display());

        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let text = self
            .extractor
            .extract(&bytes)
            .with_context(|| format!("Failed to extract text from {}", path.display()))?;

        log::info!("Extracted text length from {}: {}", path.display(), text.len());
        Ok(text)
    }
}

/// Loads the corpus into `corpus` on the blocking pool.
///
/// Does nothing if a load already started. The returned handle resolves once
/// the gate is `Ready` or `Failed`.
pub fn spawn_load<E>(
    corpus: Corpus,
    processor: Arc<DocumentProcessor<E>>,
    paths: Vec<PathBuf>,
) -> tokio::task::JoinHandle<()>
where
    E: TextExtractor + 'static,
{
    tokio::spawn(async move {
        if !corpus.begin_loading().await {
            log::warn!("Document load already started, skipping");
            return;
        }

        let result = tokio::task::spawn_blocking(move || processor.process_documents(&paths))
            .await
            .context("Document loader task panicked")
            .and_then(|r| r);

        if let Err(e) = &result {
            log::error!("Error loading PDFs: {:#}", e);
        }
        corpus.finish(result).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusState;
    use std::io::Write;
    use tempfile::TempDir;

    /// Treats file contents as already-extracted UTF-8 text.
    struct Utf8Extractor;

    impl TextExtractor for Utf8Extractor {
        fn extract(&self, bytes: &[u8]) -> Result<String> {
            Ok(String::from_utf8(bytes.to_vec())?)
        }
    }

    fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn concatenates_in_order_with_blank_lines() {
        let dir = TempDir::new().unwrap();
        let budget = write_file(&dir, "budget.pdf", b"Fiscal deficit target: 4.4%");
        let transcript = write_file(&dir, "transcript.pdf", b"Speech transcript");

        let processor = DocumentProcessor::with_extractor(Utf8Extractor);
        let text = processor.process_documents(&[budget, transcript]).unwrap();

        assert_eq!(text, "Fiscal deficit target: 4.4%\n\nSpeech transcript\n\n");
    }

    #[test]
    fn missing_file_fails_whole_load() {
        let dir = TempDir::new().unwrap();
        let budget = write_file(&dir, "budget.pdf", b"budget");
        let missing = dir.path().join("transcript.pdf");

        let processor = DocumentProcessor::with_extractor(Utf8Extractor);
        let err = processor.process_documents(&[budget, missing]).unwrap_err();

        assert!(format!("{:#}", err).contains("transcript.pdf"));
    }

    #[test]
    fn pdf_extractor_rejects_non_pdf_bytes() {
        let dir = TempDir::new().unwrap();
        let bogus = write_file(&dir, "budget.pdf", b"this is not a pdf");

        let err = DocumentProcessor::new().process_documents(&[bogus]).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to extract text"));
    }

    #[tokio::test]
    async fn spawn_load_publishes_ready_corpus() {
        let dir = TempDir::new().unwrap();
        let budget = write_file(&dir, "budget.pdf", b"budget");

        let corpus = Corpus::new();
        let processor = Arc::new(DocumentProcessor::with_extractor(Utf8Extractor));
        spawn_load(corpus.clone(), processor, vec![budget]).await.unwrap();

        match corpus.snapshot().await {
            CorpusState::Ready(text) => assert_eq!(&*text, "budget\n\n"),
            other => panic!("expected ready, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn spawn_load_records_failure() {
        let dir = TempDir::new().unwrap();
        let corpus = Corpus::new();
        let processor = Arc::new(DocumentProcessor::with_extractor(Utf8Extractor));

        spawn_load(corpus.clone(), processor, vec![dir.path().join("budget.pdf")])
            .await
            .unwrap();

        assert!(matches!(corpus.snapshot().await, CorpusState::Failed(_)));
    }

    #[tokio::test]
    async fn spawn_load_does_not_reload_ready_corpus() {
        let dir = TempDir::new().unwrap();
        let other = write_file(&dir, "other.pdf", b"other");

        let corpus = Corpus::ready("original\n\n");
        let processor = Arc::new(DocumentProcessor::with_extractor(Utf8Extractor));
        spawn_load(corpus.clone(), processor, vec![other]).await.unwrap();

        match corpus.snapshot().await {
            CorpusState::Ready(text) => assert_eq!(&*text, "original\n\n"),
            other => panic!("expected ready, got {:?}", other),
        }
    }
}
