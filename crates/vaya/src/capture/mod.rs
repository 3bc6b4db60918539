//! Voice memory capture for vaya.
//!
//! This module models the recording flow: an [`AudioSource`] delivers
//! timestamped chunks over a channel while recording, and a
//! [`RecordingSession`] assembles them into a single [`Recording`] blob when
//! the source stops.

pub mod transcribe;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};

/// The container format of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// WebM/Opus, the default browser recording container.
    Webm,
    /// Ogg/Opus.
    Ogg,
    /// Uncompressed WAV.
    Wav,
}

impl AudioFormat {
    /// The MIME type for this format.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Webm => "audio/webm",
            Self::Ogg => "audio/ogg",
            Self::Wav => "audio/wav",
        }
    }

    /// Parse a MIME type back into a format.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "audio/webm" => Some(Self::Webm),
            "audio/ogg" => Some(Self::Ogg),
            "audio/wav" => Some(Self::Wav),
            _ => None,
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}

/// A chunk of encoded audio delivered while recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// The encoded audio bytes.
    pub data: Vec<u8>,
    /// When this chunk arrived.
    pub received_at: DateTime<Utc>,
}

impl AudioChunk {
    /// Create a chunk stamped with the current time.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            received_at: Utc::now(),
        }
    }
}

/// A completed voice recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Unique identifier (assigned by the storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// When the recording was finished.
    pub created_at: DateTime<Utc>,

    /// Container format of the audio data.
    pub format: AudioFormat,

    /// The assembled audio blob.
    #[serde(skip)]
    pub data: Vec<u8>,

    /// BLAKE3 hash of the audio data, used for deduplication.
    pub content_hash: String,

    /// Recording duration in milliseconds.
    pub duration_ms: u64,
}

impl Recording {
    /// Create a recording from assembled audio data.
    ///
    /// Computes the content hash and stamps the creation time.
    #[must_use]
    pub fn new(data: Vec<u8>, format: AudioFormat, duration_ms: u64) -> Self {
        let content_hash = Self::compute_hash(&data);
        Self {
            id: None,
            created_at: Utc::now(),
            format,
            data,
            content_hash,
            duration_ms,
        }
    }

    /// Compute the BLAKE3 hash of audio data.
    #[must_use]
    pub fn compute_hash(data: &[u8]) -> String {
        blake3::hash(data).to_hex().to_string()
    }

    /// Size of the audio blob in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Check if the recording holds no audio.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Trait for audio capture sources.
///
/// Implementors provide the actual recording mechanism (a microphone
/// backend, a test fixture) and deliver chunks through the provided channel
/// until stopped.
pub trait AudioSource: Send + Sync {
    /// The name of this source (for logging/debugging).
    fn name(&self) -> &'static str;

    /// The container format this source produces.
    fn format(&self) -> AudioFormat;

    /// Start capturing.
    ///
    /// Chunks are sent through `sender` until the source is stopped or the
    /// receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails to start, such as when the
    /// microphone permission is missing.
    fn start(&mut self, sender: mpsc::Sender<AudioChunk>) -> Result<()>;

    /// Stop capturing.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails to stop cleanly.
    fn stop(&mut self) -> Result<()>;

    /// Check if the source is currently capturing.
    fn is_running(&self) -> bool;
}

/// Assembles audio chunks into a single recording.
///
/// Chunks accumulate while the source runs and the blob is assembled when
/// it stops.
#[derive(Debug)]
pub struct RecordingSession {
    format: AudioFormat,
    buffer: Vec<u8>,
    chunk_count: usize,
    first_chunk_at: Option<DateTime<Utc>>,
    last_chunk_at: Option<DateTime<Utc>>,
}

impl RecordingSession {
    /// Start a new session for the given format.
    #[must_use]
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            buffer: Vec::new(),
            chunk_count: 0,
            first_chunk_at: None,
            last_chunk_at: None,
        }
    }

    /// Append a chunk to the session.
    pub fn push(&mut self, chunk: AudioChunk) {
        if self.first_chunk_at.is_none() {
            self.first_chunk_at = Some(chunk.received_at);
        }
        self.last_chunk_at = Some(chunk.received_at);
        self.buffer.extend_from_slice(&chunk.data);
        self.chunk_count += 1;
    }

    /// Number of chunks received so far.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Consume chunks from a channel until the sender side closes, then
    /// assemble the recording.
    ///
    /// # Errors
    ///
    /// Returns an error if no audio was received.
    pub async fn run(mut self, receiver: &mut mpsc::Receiver<AudioChunk>) -> Result<Recording> {
        while let Some(chunk) = receiver.recv().await {
            self.push(chunk);
        }
        self.finish()
    }

    /// Assemble the accumulated chunks into a recording.
    ///
    /// Duration is derived from the first and last chunk timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if no audio was received.
    pub fn finish(self) -> Result<Recording> {
        if self.buffer.is_empty() {
            return Err(Error::RecordingEmpty);
        }

        let duration_ms = match (self.first_chunk_at, self.last_chunk_at) {
            (Some(first), Some(last)) => u64::try_from(
                last.signed_duration_since(first).num_milliseconds().max(0),
            )
            .unwrap_or(0),
            _ => 0,
        };

        debug!(
            "Assembled recording: {} chunk(s), {} byte(s)",
            self.chunk_count,
            self.buffer.len()
        );
        Ok(Recording::new(self.buffer, self.format, duration_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// Source that delivers a fixed script of chunks and then closes.
    struct ScriptedSource {
        chunks: Vec<Vec<u8>>,
        running: bool,
    }

    impl ScriptedSource {
        fn new(chunks: Vec<Vec<u8>>) -> Self {
            Self {
                chunks,
                running: false,
            }
        }
    }

    impl AudioSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn format(&self) -> AudioFormat {
            AudioFormat::Webm
        }

        fn start(&mut self, sender: mpsc::Sender<AudioChunk>) -> Result<()> {
            if self.running {
                return Err(Error::audio_source_start(self.name(), "already running"));
            }
            self.running = true;
            let chunks = self.chunks.clone();
            tokio::spawn(async move {
                for data in chunks {
                    if sender.send(AudioChunk::new(data)).await.is_err() {
                        break;
                    }
                }
            });
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.running = false;
            Ok(())
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    #[tokio::test]
    async fn test_source_feeds_session() {
        let mut source = ScriptedSource::new(vec![vec![1, 2], vec![3]]);
        let (sender, mut receiver) = mpsc::channel(8);

        assert!(!source.is_running());
        source.start(sender).unwrap();
        assert!(source.is_running());

        let session = RecordingSession::new(source.format());
        let recording = session.run(&mut receiver).await.unwrap();
        assert_eq!(recording.data, vec![1, 2, 3]);
        assert_eq!(recording.format, AudioFormat::Webm);

        source.stop().unwrap();
        assert!(!source.is_running());
    }

    #[tokio::test]
    async fn test_source_rejects_double_start() {
        let mut source = ScriptedSource::new(vec![vec![1]]);
        let (sender, _receiver) = mpsc::channel(1);
        source.start(sender).unwrap();

        let (sender2, _receiver2) = mpsc::channel(1);
        let result = source.start(sender2);
        assert!(matches!(result, Err(Error::AudioSourceStart { .. })));
    }

    #[test]
    fn test_audio_format_mime_roundtrip() {
        for format in [AudioFormat::Webm, AudioFormat::Ogg, AudioFormat::Wav] {
            assert_eq!(AudioFormat::from_mime(format.mime_type()), Some(format));
        }
        assert_eq!(AudioFormat::from_mime("audio/flac"), None);
    }

    #[test]
    fn test_audio_format_display() {
        assert_eq!(AudioFormat::Webm.to_string(), "audio/webm");
    }

    #[test]
    fn test_recording_new_computes_hash() {
        let recording = Recording::new(vec![1, 2, 3], AudioFormat::Webm, 1000);
        assert!(recording.id.is_none());
        assert_eq!(recording.byte_len(), 3);
        assert!(!recording.is_empty());
        assert_eq!(recording.content_hash, Recording::compute_hash(&[1, 2, 3]));
    }

    #[test]
    fn test_recording_hash_consistency() {
        let a = Recording::compute_hash(b"audio");
        let b = Recording::compute_hash(b"audio");
        assert_eq!(a, b);
        assert_ne!(a, Recording::compute_hash(b"other"));
    }

    #[test]
    fn test_session_assembles_chunks_in_order() {
        let mut session = RecordingSession::new(AudioFormat::Webm);
        session.push(AudioChunk::new(vec![1, 2]));
        session.push(AudioChunk::new(vec![3]));
        session.push(AudioChunk::new(vec![4, 5]));
        assert_eq!(session.chunk_count(), 3);

        let recording = session.finish().unwrap();
        assert_eq!(recording.data, vec![1, 2, 3, 4, 5]);
        assert_eq!(recording.format, AudioFormat::Webm);
    }

    #[test]
    fn test_session_empty_is_an_error() {
        let session = RecordingSession::new(AudioFormat::Webm);
        let result = session.finish();
        assert!(matches!(result, Err(Error::RecordingEmpty)));
    }

    #[test]
    fn test_session_duration_from_chunk_timestamps() {
        let mut session = RecordingSession::new(AudioFormat::Ogg);
        let start = Utc::now();
        session.push(AudioChunk {
            data: vec![1],
            received_at: start,
        });
        session.push(AudioChunk {
            data: vec![2],
            received_at: start + Duration::milliseconds(1500),
        });

        let recording = session.finish().unwrap();
        assert_eq!(recording.duration_ms, 1500);
    }

    #[test]
    fn test_session_single_chunk_zero_duration() {
        let mut session = RecordingSession::new(AudioFormat::Wav);
        session.push(AudioChunk::new(vec![1, 2, 3]));
        let recording = session.finish().unwrap();
        assert_eq!(recording.duration_ms, 0);
    }

    #[tokio::test]
    async fn test_session_run_drains_channel() {
        let (sender, mut receiver) = mpsc::channel(8);
        let session = RecordingSession::new(AudioFormat::Webm);

        sender.send(AudioChunk::new(vec![1])).await.unwrap();
        sender.send(AudioChunk::new(vec![2, 3])).await.unwrap();
        drop(sender); // recorder stopped

        let recording = session.run(&mut receiver).await.unwrap();
        assert_eq!(recording.data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_session_run_empty_channel_is_an_error() {
        let (sender, mut receiver) = mpsc::channel::<AudioChunk>(1);
        drop(sender);

        let session = RecordingSession::new(AudioFormat::Webm);
        let result = session.run(&mut receiver).await;
        assert!(matches!(result, Err(Error::RecordingEmpty)));
    }

    #[test]
    fn test_recording_serialization_skips_blob() {
        let recording = Recording::new(vec![1, 2, 3], AudioFormat::Webm, 500);
        let json = serde_json::to_string(&recording).unwrap();
        assert!(json.contains("content_hash"));
        assert!(!json.contains("\"data\""));
    }
}
