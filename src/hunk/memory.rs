//! In-memory hunks
//!
//! Content that is no longer a direct representation of one source file:
//! the output of a filter, a cached result, or several files merged together.

use crate::content::{Content, ContentKind};
use crate::error::{MillError, MillResult};
use crate::hunk::Hunk;
use std::fmt;
use std::io::{self, Read};
use std::sync::{Mutex, OnceLock};

/// Where a reader-backed hunk stands
enum StreamState {
    Unread(Box<dyn Read + Send>, ContentKind),
    /// Reading failed; every later access reports the same failure
    Failed(StreamFailure),
    Drained,
}

enum StreamFailure {
    Io {
        context: String,
        kind: io::ErrorKind,
        message: String,
    },
    Decode(String),
    Other(String),
}

impl StreamFailure {
    fn record(err: &MillError) -> Self {
        match err {
            MillError::Io { context, source } => Self::Io {
                context: context.clone(),
                kind: source.kind(),
                message: source.to_string(),
            },
            MillError::Decode { context } => Self::Decode(context.clone()),
            other => Self::Other(other.to_string()),
        }
    }

    fn to_error(&self) -> MillError {
        match self {
            Self::Io {
                context,
                kind,
                message,
            } => MillError::io(context.clone(), io::Error::new(*kind, message.clone())),
            Self::Decode(context) => MillError::Decode {
                context: context.clone(),
            },
            Self::Other(message) => MillError::Internal(message.clone()),
        }
    }
}

/// Hunk holding already-computed content
pub struct MemoryHunk {
    content: OnceLock<Content>,
    stream: Mutex<StreamState>,
    files: Vec<String>,
}

impl MemoryHunk {
    /// Wrap text or bytes
    pub fn new(content: impl Into<Content>) -> Self {
        Self {
            content: OnceLock::from(content.into()),
            stream: Mutex::new(StreamState::Drained),
            files: Vec::new(),
        }
    }

    /// Wrap binary content without attempting to decode it
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(Content::Bytes(bytes))
    }

    /// Wrap an unread stream.
    ///
    /// The stream is read to the end on the first `data()` call and the
    /// result memoised; it is never read twice. A failed read is memoised
    /// too and reported again on every later call.
    pub fn from_reader(reader: impl Read + Send + 'static, kind: ContentKind) -> Self {
        Self {
            content: OnceLock::new(),
            stream: Mutex::new(StreamState::Unread(Box::new(reader), kind)),
            files: Vec::new(),
        }
    }

    /// Attach provenance
    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Re-tag the content as binary, keeping provenance.
    ///
    /// Needed before running byte-producing filters such as gzip over text,
    /// since a chain keeps the kind of its input.
    pub fn into_binary(self) -> MillResult<Self> {
        let bytes = self.data()?.into_bytes();
        Ok(Self::from_bytes(bytes).with_files(self.files))
    }

    fn drain_reader(&self) -> MillResult<Content> {
        let mut stream = self
            .stream
            .lock()
            .map_err(|_| MillError::Internal("memory hunk reader lock poisoned".to_string()))?;

        // Another caller may have drained the reader while we waited
        if let Some(content) = self.content.get() {
            return Ok(content.clone());
        }

        match std::mem::replace(&mut *stream, StreamState::Drained) {
            StreamState::Unread(mut reader, kind) => match read_stream(reader.as_mut(), kind) {
                Ok(content) => Ok(self.content.get_or_init(|| content).clone()),
                Err(e) => {
                    *stream = StreamState::Failed(StreamFailure::record(&e));
                    Err(e)
                }
            },
            StreamState::Failed(failure) => {
                let err = failure.to_error();
                *stream = StreamState::Failed(failure);
                Err(err)
            }
            StreamState::Drained => Err(MillError::Internal(
                "memory hunk has no content".to_string(),
            )),
        }
    }
}

fn read_stream(reader: &mut dyn Read, kind: ContentKind) -> MillResult<Content> {
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .map_err(|e| MillError::io("reading in-memory stream", e))?;
    Content::from_kind(kind, buf)
}

impl Hunk for MemoryHunk {
    fn data(&self) -> MillResult<Content> {
        match self.content.get() {
            Some(content) => Ok(content.clone()),
            None => self.drain_reader(),
        }
    }

    fn provenance(&self) -> Vec<String> {
        self.files.clone()
    }
}

impl fmt::Debug for MemoryHunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.content.get() {
            Some(content) => write!(f, "<MemoryHunk {}>", content.fingerprint().short()),
            None => write!(f, "<MemoryHunk unread>"),
        }
    }
}
