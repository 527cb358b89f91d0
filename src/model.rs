use serde::{Deserialize, Serialize};

/// Bearer session handed out by `POST /session`, cached for the whole
/// process lifetime and attached to every later request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
}

/// One time-bounded span of transcribed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub token_count: u32,
}

/// Transcription task requested from the ASR backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscribeTask {
    #[default]
    Transcribe,
    Translate,
}

impl TranscribeTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscribeTask::Transcribe => "transcribe",
            TranscribeTask::Translate => "translate",
        }
    }
}

/// Result of a transcription run, or of the cheap pre-decode pass.
///
/// `decoded == false` means only the preview metadata (duration, detected
/// language, cost estimate) is populated; `segments` is only meaningful
/// once `decoded` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscribeResult {
    #[serde(default)]
    pub segments: Vec<Segment>,
    /// Media duration in seconds.
    pub duration: f64,
    #[serde(default)]
    pub task: TranscribeTask,
    /// ISO language code, e.g. "en".
    pub lang: String,
    /// Human readable language name, e.g. "English".
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub decoded: bool,
    /// True when only the first minute was decoded.
    #[serde(default)]
    pub limited: bool,
    #[serde(default)]
    pub decode_time: Option<f64>,
    /// Projected decoding cost in USD, from the preview pass.
    #[serde(default)]
    pub estimated_cost: Option<f64>,
}

/// Media class reported by the server's upload detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

/// Shape of a successful `POST /data/input` response.
///
/// The server answers with per-file row counts for tabular batches, or a
/// single detection payload for media. Modeled as an explicit union so the
/// classification happens exactly once, at the deserialization edge.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UploadOutcome {
    Media {
        #[serde(rename = "type")]
        media_type: MediaKind,
        url: String,
        result: TranscribeResult,
    },
    Tabular {
        rows: Vec<u64>,
    },
}

/// One successfully uploaded input file. Ordering matches submission
/// order; the whole list is replaced when a new batch is uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub index: usize,
    pub label: String,
    /// Total row count, tabular files only.
    pub rows: Option<u64>,
    pub url: Option<String>,
    pub result: Option<TranscribeResult>,
}

/// The active data context the conversation or media view runs against.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSelection {
    pub filename: String,
    pub head: Option<u64>,
    pub committed: bool,
    pub media: bool,
    pub media_type: Option<MediaKind>,
    pub url: Option<String>,
    pub result: Option<TranscribeResult>,
}

/// Backend LLM selectable through `POST /model`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelName {
    Bamboo,
    #[default]
    OpenAi,
}

impl ModelName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Bamboo => "bamboo",
            ModelName::OpenAi => "openai",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "bamboo" => Some(ModelName::Bamboo),
            "openai" => Some(ModelName::OpenAi),
            _ => None,
        }
    }
}

/// Speed/accuracy trade-off for transcription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Performance {
    Fastest,
    #[default]
    Fast,
    Balanced,
    Accurate,
}

impl Performance {
    pub const ALL: [Performance; 4] = [
        Performance::Fastest,
        Performance::Fast,
        Performance::Balanced,
        Performance::Accurate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Performance::Fastest => "fastest",
            Performance::Fast => "fast",
            Performance::Balanced => "balanced",
            Performance::Accurate => "accurate",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == name)
    }
}

/// Whether to decode the full media or only the first minute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationLimit {
    #[default]
    Full,
    Head,
}

impl DurationLimit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationLimit::Full => "full",
            DurationLimit::Head => "head",
        }
    }
}

/// JSON body of `POST /transcribe`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranscribePrefs {
    pub performance: Performance,
    pub limit: DurationLimit,
    pub task: TranscribeTask,
    pub prompt: String,
}

/// JSON body of `POST /query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub query: String,
}

/// Response of `POST /query`. The answer may be any JSON value (data
/// queries frequently come back as bare numbers).
#[derive(Debug, Clone, Deserialize)]
pub struct QueryAnswer {
    pub answer: serde_json::Value,
    #[serde(default)]
    pub html: bool,
}

impl QueryAnswer {
    /// Flatten the answer to display text. Strings are taken verbatim,
    /// everything else keeps its JSON rendering.
    pub fn answer_text(&self) -> String {
        match &self.answer {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Response envelope of `POST /transcribe`.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeResponse {
    pub result: TranscribeResult,
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

/// How a chat message body should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Html,
    /// Transient placeholder for an in-flight AI response.
    Pending,
}

/// One entry of the append-only conversation log.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub kind: MessageKind,
    pub body: String,
}

/// Client-side guess whether a file batch is media, made before the
/// upload round-trips. The upload response stays authoritative.
pub fn predicts_media<S: AsRef<str>>(filenames: &[S]) -> bool {
    filenames.iter().any(|name| {
        let ext = name
            .as_ref()
            .rsplit('.')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        !matches!(ext.as_str(), "csv" | "xls" | "xlsx")
    })
}
