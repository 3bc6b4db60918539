//! Remote transcription of voice recordings.
//!
//! A [`Transcriber`] turns a recording into text. The HTTP implementation
//! posts `{ "audio": <base64>, "language"? }` to a transcription endpoint
//! and expects `{ "text": ... }` back. [`FallbackTranscriber`] wraps any
//! transcriber and substitutes a canned response after a short delay when
//! the real call fails, so a flaky service never blocks saving a memory.
//!
//! There is no retry and no cancellation of in-flight calls.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capture::Recording;
use crate::error::{Error, Result};

/// How long the fallback waits before answering, simulating a slow service.
pub const FALLBACK_DELAY: Duration = Duration::from_secs(2);

/// Canned transcript returned when transcription fails.
pub const FALLBACK_TEXT: &str =
    "We couldn't transcribe this memory right now, but your recording is saved. \
     You can try transcribing it again later.";

/// Default request timeout for the HTTP transcriber.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A transcription request: raw audio plus an optional language hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionRequest {
    /// The encoded audio bytes.
    pub audio: Vec<u8>,
    /// BCP-47 language hint (e.g. "es", "en-US").
    pub language: Option<String>,
}

impl TranscriptionRequest {
    /// Build a request from a finished recording.
    #[must_use]
    pub fn from_recording(recording: &Recording, language: Option<String>) -> Self {
        Self {
            audio: recording.data.clone(),
            language,
        }
    }

    /// The base64 payload sent over the wire.
    #[must_use]
    pub fn audio_base64(&self) -> String {
        BASE64.encode(&self.audio)
    }
}

/// A transcription result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// The transcribed text.
    pub text: String,
    /// Whether this is the canned fallback rather than a real transcription.
    pub is_fallback: bool,
}

/// Trait for transcription backends.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe the given audio.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or rejects the
    /// request.
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<Transcript>;
}

/// JSON body sent to the transcription endpoint.
#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    audio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

/// JSON body returned by the transcription endpoint.
#[derive(Debug, Deserialize)]
struct WireResponse {
    text: String,
}

/// HTTP transcription client.
#[derive(Debug, Clone)]
pub struct HttpTranscriber {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTranscriber {
    /// Create a client for the given endpoint with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// The endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<Transcript> {
        let body = WireRequest {
            audio: request.audio_base64(),
            language: request.language.as_deref(),
        };

        debug!(
            "Posting {} byte(s) of audio to {}",
            request.audio.len(),
            self.endpoint
        );
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::TranscriptionUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Transcription {
                status: status.as_u16(),
                message,
            });
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| Error::TranscriptionUnavailable(e.to_string()))?;
        Ok(Transcript {
            text: wire.text,
            is_fallback: false,
        })
    }
}

/// Wraps a transcriber with a canned fallback response.
///
/// On failure it waits [`FALLBACK_DELAY`], simulating a slow service, and
/// answers with [`FALLBACK_TEXT`] flagged as a fallback.
#[derive(Debug)]
pub struct FallbackTranscriber<T> {
    inner: T,
    delay: Duration,
}

impl<T> FallbackTranscriber<T> {
    /// Wrap a transcriber with the default fallback delay.
    #[must_use]
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            delay: FALLBACK_DELAY,
        }
    }

    /// Override the fallback delay (used by tests).
    #[must_use]
    pub fn with_delay(inner: T, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<T: Transcriber> Transcriber for FallbackTranscriber<T> {
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<Transcript> {
        match self.inner.transcribe(request).await {
            Ok(transcript) => Ok(transcript),
            Err(err) => {
                warn!("Transcription failed, using fallback: {err}");
                tokio::time::sleep(self.delay).await;
                Ok(Transcript {
                    text: FALLBACK_TEXT.to_string(),
                    is_fallback: true,
                })
            }
        }
    }
}
