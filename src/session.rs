//! The calling loop of a translation job: consume the reassembled stream,
//! cut it into subtitle blocks, and accumulate the translated file while the
//! original content is fetched alongside for progress reporting.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::client::JobBackend;
use crate::error::{Result, SubtransError};
use crate::subtitle::{parse_chunk, parse_srt, split_blocks, Chunk, Segment};

/// Receives progress while a job streams in
pub trait ProgressSink: Send + Sync {
    /// Number of segments in the original file, once known
    fn set_total(&self, total: usize);
    fn on_chunk(&self, chunk: &Chunk);
    fn finish(&self);
}

/// Discards all progress
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn set_total(&self, _total: usize) {}
    fn on_chunk(&self, _chunk: &Chunk) {}
    fn finish(&self) {}
}

/// Terminal progress bar
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} segments {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("Translating...");
        Self { bar }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn set_total(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.green/white} {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
    }

    fn on_chunk(&self, chunk: &Chunk) {
        self.bar.inc(1);
        let preview = chunk.text.lines().next().unwrap_or_default();
        self.bar.set_message(preview.chars().take(48).collect::<String>());
    }

    fn finish(&self) {
        self.bar.finish_with_message("Done!");
    }
}

/// Append-only accumulation of translated subtitle blocks
#[derive(Debug, Default)]
pub struct TranslationAccumulator {
    srt: String,
    chunks: Vec<Chunk>,
}

impl TranslationAccumulator {
    /// Split one stream chunk into blocks, keep every non-blank block in the
    /// SRT text, and return the blocks that parsed as chunks
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Chunk> {
        let text = String::from_utf8_lossy(bytes);
        let mut parsed = Vec::new();

        for block in split_blocks(&text) {
            if block.trim().is_empty() {
                continue;
            }
            self.srt.push_str(block);
            self.srt.push_str("\n\n");

            match parse_chunk(block) {
                Ok(chunk) => parsed.push(chunk),
                Err(e) => warn!("Keeping unparsable subtitle block: {}", e),
            }
        }

        self.chunks.extend(parsed.iter().cloned());
        parsed
    }

    pub fn srt(&self) -> &str {
        &self.srt
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn into_parts(self) -> (String, Vec<Chunk>) {
        (self.srt, self.chunks)
    }
}

/// Result of one translation job
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub job_id: String,
    pub srt: String,
    pub chunks: Vec<Chunk>,
    /// Original segments, when the content fetch succeeded
    pub original: Option<Vec<Segment>>,
}

impl TranslationOutcome {
    pub fn filename(&self) -> String {
        format!("{}.srt", self.job_id)
    }

    /// Original text next to its translation, in stream order
    pub fn pairs(&self) -> Vec<(Option<&str>, &str)> {
        self.chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let source = self
                    .original
                    .as_ref()
                    .and_then(|segments| segments.get(i))
                    .map(|segment| segment.text.as_str());
                (source, chunk.text.as_str())
            })
            .collect()
    }
}

pub struct TranslationSession {
    backend: Box<dyn JobBackend>,
    progress: Box<dyn ProgressSink>,
}

impl TranslationSession {
    pub fn new(backend: Box<dyn JobBackend>, progress: Box<dyn ProgressSink>) -> Self {
        Self { backend, progress }
    }

    /// Stream the job's translation while fetching its original content
    pub async fn run(&self, job_id: &str) -> Result<TranslationOutcome> {
        info!("Starting translation job {}", job_id);

        let (original, translated) = tokio::join!(self.load_original(job_id), self.consume(job_id));
        let (srt, chunks) = translated?;
        self.progress.finish();

        if srt.is_empty() {
            return Err(SubtransError::EmptyTranslation);
        }

        info!("Job {} produced {} subtitle blocks", job_id, chunks.len());
        Ok(TranslationOutcome {
            job_id: job_id.to_string(),
            srt,
            chunks,
            original,
        })
    }

    async fn load_original(&self, job_id: &str) -> Option<Vec<Segment>> {
        let content = match self.backend.fetch_content(job_id).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to fetch original content of job {}: {}", job_id, e);
                return None;
            }
        };

        match parse_srt(&content) {
            Ok(segments) => {
                debug!("Original content has {} segments", segments.len());
                self.progress.set_total(segments.len());
                Some(segments)
            }
            Err(e) => {
                warn!("Original content of job {} is not valid SRT: {}", job_id, e);
                None
            }
        }
    }

    async fn consume(&self, job_id: &str) -> Result<(String, Vec<Chunk>)> {
        let mut stream = self.backend.submit_job(job_id).await?;
        let mut accumulator = TranslationAccumulator::default();

        while let Some(item) = stream.next().await {
            let bytes = item?;
            for chunk in accumulator.push(&bytes) {
                debug!("Translated segment {}", chunk.index);
                self.progress.on_chunk(&chunk);
            }
        }

        Ok(accumulator.into_parts())
    }
}

/// Write the translated file as `<job_id>.srt` under `output_dir`
pub async fn save_srt<P: AsRef<Path>>(outcome: &TranslationOutcome, output_dir: P) -> Result<PathBuf> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir).await?;

    let output_path = output_dir.join(outcome.filename());
    info!("Writing translated subtitles: {}", output_path.display());
    fs::write(&output_path, &outcome.srt).await?;

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockJobBackend;
    use crate::stream::ByteStream;
    use bytes::Bytes;
    use std::sync::Mutex;

    const ORIGINAL: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:03,000 --> 00:00:04,000\nGoodbye\n\n";

    fn stream_of(items: Vec<Result<Bytes>>) -> ByteStream {
        Box::pin(futures_util::stream::iter(items))
    }

    #[derive(Default)]
    struct RecordingProgress {
        total: Mutex<Option<usize>>,
        seen: Mutex<Vec<String>>,
    }

    impl ProgressSink for std::sync::Arc<RecordingProgress> {
        fn set_total(&self, total: usize) {
            *self.total.lock().unwrap() = Some(total);
        }
        fn on_chunk(&self, chunk: &Chunk) {
            self.seen.lock().unwrap().push(chunk.index.clone());
        }
        fn finish(&self) {}
    }

    #[test]
    fn test_accumulator_splits_and_keeps_blocks() {
        let mut acc = TranslationAccumulator::default();
        let parsed = acc.push(b"1\n00:00:01,000 --> 00:00:02,000\nHola\n\n2\n00:00:03,000 --> 00:00:04,000\nAdios\n\n");
        assert_eq!(parsed.len(), 2);

        let parsed = acc.push(b"\n\nnot a subtitle\n\n");
        assert!(parsed.is_empty());

        assert_eq!(acc.chunks().len(), 2);
        assert_eq!(
            acc.srt(),
            "1\n00:00:01,000 --> 00:00:02,000\nHola\n\n2\n00:00:03,000 --> 00:00:04,000\nAdios\n\nnot a subtitle\n\n"
        );
    }

    #[tokio::test]
    async fn test_session_accumulates_stream_and_reports_progress() {
        let mut backend = MockJobBackend::new();
        backend.expect_submit_job().times(1).returning(|_| {
            Ok(stream_of(vec![
                Ok(Bytes::from("1\n00:00:01,000 --> 00:00:02,000\nHola\n\n")),
                Ok(Bytes::from("2\n00:00:03,000 --> 00:00:04,000\nAdios\n\n")),
            ]))
        });
        backend
            .expect_fetch_content()
            .times(1)
            .returning(|_| Ok(ORIGINAL.to_string()));

        let progress = std::sync::Arc::new(RecordingProgress::default());
        let session = TranslationSession::new(Box::new(backend), Box::new(progress.clone()));
        let outcome = session.run("job-1").await.unwrap();

        assert_eq!(outcome.filename(), "job-1.srt");
        assert_eq!(outcome.chunks.len(), 2);
        assert_eq!(
            outcome.pairs(),
            vec![(Some("Hello"), "Hola"), (Some("Goodbye"), "Adios")]
        );
        assert_eq!(*progress.total.lock().unwrap(), Some(2));
        assert_eq!(*progress.seen.lock().unwrap(), vec!["1".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn test_content_fetch_failure_does_not_fail_session() {
        let mut backend = MockJobBackend::new();
        backend.expect_submit_job().returning(|_| {
            Ok(stream_of(vec![Ok(Bytes::from("1\n00:00:01,000 --> 00:00:02,000\nHola\n\n"))]))
        });
        backend
            .expect_fetch_content()
            .returning(|_| Err(SubtransError::Job("content unavailable".to_string())));

        let session = TranslationSession::new(Box::new(backend), Box::new(NoProgress));
        let outcome = session.run("job-2").await.unwrap();

        assert!(outcome.original.is_none());
        assert_eq!(outcome.pairs(), vec![(None, "Hola")]);
    }

    #[tokio::test]
    async fn test_stream_error_fails_session() {
        let mut backend = MockJobBackend::new();
        backend.expect_submit_job().returning(|_| {
            Ok(stream_of(vec![
                Ok(Bytes::from("1\n00:00:01,000 --> 00:00:02,000\nHola\n\n")),
                Err(SubtransError::Parse("bad fragment".to_string())),
            ]))
        });
        backend
            .expect_fetch_content()
            .returning(|_| Ok(ORIGINAL.to_string()));

        let session = TranslationSession::new(Box::new(backend), Box::new(NoProgress));
        let err = session.run("job-3").await.unwrap_err();
        assert!(matches!(err, SubtransError::Parse(_)));
    }

    #[tokio::test]
    async fn test_empty_stream_is_an_empty_translation() {
        let mut backend = MockJobBackend::new();
        backend.expect_submit_job().returning(|_| Ok(stream_of(vec![])));
        backend
            .expect_fetch_content()
            .returning(|_| Ok(ORIGINAL.to_string()));

        let session = TranslationSession::new(Box::new(backend), Box::new(NoProgress));
        let err = session.run("job-4").await.unwrap_err();
        assert!(matches!(err, SubtransError::EmptyTranslation));
    }

    #[tokio::test]
    async fn test_save_srt_writes_job_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        let outcome = TranslationOutcome {
            job_id: "abc123".to_string(),
            srt: "1\n00:00:01,000 --> 00:00:02,000\nHola\n\n".to_string(),
            chunks: Vec::new(),
            original: None,
        };

        let path = save_srt(&outcome, dir.path().join("out")).await.unwrap();
        assert_eq!(path, dir.path().join("out").join("abc123.srt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), outcome.srt);
    }
}
