use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::model::{
    predicts_media, DataSelection, DurationLimit, Performance, TranscribePrefs, TranscribeResult,
    TranscribeTask, UploadOutcome, UploadedFile,
};

/// Detected duration at or above which the coverage control is offered,
/// defaulting to decoding only the first minute.
const LIMIT_OFFER_SECONDS: f64 = 61.0;

/// Lifecycle of the active data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// No files chosen.
    Empty,
    /// Upload begun, response not yet accepted.
    Uploading,
    /// Tabular batch uploaded; picking file and row limit.
    RowSelecting,
    /// Row selection applied on the server.
    Committed,
    /// Media detected; configuring transcription preferences.
    MediaConfiguring,
    /// Transcription request in flight.
    Transcribing,
    /// Segments populated, subtitle lookup valid.
    Transcribed,
}

/// State machine for upload, selection and transcription.
///
/// Transitions are pure: network completions are fed in as parsed
/// outcomes, so the machine never touches a socket. Every mutating
/// operation begin bumps a generation counter; completions carry the
/// generation they were issued under and are dropped when a later begin
/// has superseded them.
#[derive(Debug)]
pub struct SelectionMachine {
    state: SourceState,
    generation: u64,
    /// Names submitted with the in-flight upload, in submission order.
    pending_files: Vec<String>,
    uploaded: Vec<UploadedFile>,
    selection: Option<DataSelection>,
    index: usize,
    head: u64,
    max_rows: u64,
    dirty: bool,
    prefs: TranscribePrefs,
}

impl Default for SelectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self {
            state: SourceState::Empty,
            generation: 0,
            pending_files: Vec::new(),
            uploaded: Vec::new(),
            selection: None,
            index: 0,
            head: 0,
            max_rows: 0,
            dirty: false,
            prefs: TranscribePrefs::default(),
        }
    }

    pub fn state(&self) -> SourceState {
        self.state
    }

    pub fn selection(&self) -> Option<&DataSelection> {
        self.selection.as_ref()
    }

    pub fn uploaded_files(&self) -> &[UploadedFile] {
        &self.uploaded
    }

    pub fn prefs(&self) -> &TranscribePrefs {
        &self.prefs
    }

    /// Unsubmitted edits exist; gates the apply/transcribe affordance.
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Total row count of the active file; upper bound for the row limit.
    pub fn max_rows(&self) -> u64 {
        self.max_rows
    }

    /// Client-side guess for the batch about to be uploaded.
    pub fn predicted_media(&self) -> bool {
        predicts_media(&self.pending_files)
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn stale(&self, generation: u64) -> bool {
        generation != self.generation
    }

    // ------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------

    /// Start an upload. Hard reset: prior files, selection and commit
    /// state are discarded wholesale, whatever state we were in.
    pub fn begin_upload(&mut self, filenames: Vec<String>) -> u64 {
        self.state = SourceState::Uploading;
        self.pending_files = filenames;
        self.uploaded.clear();
        self.selection = None;
        self.index = 0;
        self.head = 0;
        self.max_rows = 0;
        self.dirty = false;
        self.prefs = TranscribePrefs::default();
        self.bump()
    }

    /// Accept an upload response. Classification is wholesale from the
    /// response shape: per-file row counts mean tabular, a detection
    /// payload means media.
    pub fn complete_upload(&mut self, generation: u64, outcome: UploadOutcome) -> ClientResult<()> {
        if self.stale(generation) {
            debug!(generation, current = self.generation, "stale upload response dropped");
            return Ok(());
        }
        match outcome {
            UploadOutcome::Tabular { rows } => {
                if rows.len() != self.pending_files.len() {
                    return Err(ClientError::Validation("upload files out of sync".into()));
                }
                self.uploaded = self
                    .pending_files
                    .iter()
                    .zip(rows.iter())
                    .enumerate()
                    .map(|(index, (label, count))| UploadedFile {
                        index,
                        label: label.clone(),
                        rows: Some(*count),
                        url: None,
                        result: None,
                    })
                    .collect();
                self.state = SourceState::RowSelecting;
                self.pick_file(0)?;
                info!(files = self.uploaded.len(), "tabular upload accepted");
            }
            UploadOutcome::Media {
                media_type,
                url,
                result,
            } => {
                let label = self
                    .pending_files
                    .first()
                    .cloned()
                    .unwrap_or_else(|| url.clone());
                self.uploaded = vec![UploadedFile {
                    index: 0,
                    label: label.clone(),
                    rows: None,
                    url: Some(url.clone()),
                    result: Some(result.clone()),
                }];
                self.prefs = TranscribePrefs {
                    performance: Performance::Fast,
                    limit: if result.duration >= LIMIT_OFFER_SECONDS {
                        DurationLimit::Head
                    } else {
                        DurationLimit::Full
                    },
                    task: TranscribeTask::Transcribe,
                    prompt: String::new(),
                };
                self.selection = Some(DataSelection {
                    filename: label,
                    head: None,
                    committed: false,
                    media: true,
                    media_type: Some(media_type),
                    url: Some(url),
                    result: Some(result),
                });
                self.index = 0;
                self.dirty = true;
                self.state = SourceState::MediaConfiguring;
                info!(media = media_type.as_str(), "media upload accepted");
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Row selection
    // ------------------------------------------------------------------

    /// Re-pick which uploaded file is active. Resets the row limit to the
    /// file's total and drops any prior commit.
    pub fn pick_file(&mut self, index: usize) -> ClientResult<()> {
        if !matches!(
            self.state,
            SourceState::RowSelecting | SourceState::Committed
        ) {
            return Err(ClientError::Validation("no tabular upload to select from".into()));
        }
        let (label, rows) = match self.uploaded.get(index) {
            Some(file) => (file.label.clone(), file.rows.unwrap_or(0)),
            None => return Err(ClientError::Validation("selecting data out of range".into())),
        };
        self.index = index;
        self.head = rows;
        self.max_rows = rows;
        self.dirty = true;
        // Any in-flight apply was issued under the previous pick.
        self.bump();
        self.selection = Some(DataSelection {
            filename: label,
            head: Some(rows),
            committed: false,
            media: false,
            media_type: None,
            url: None,
            result: None,
        });
        self.state = SourceState::RowSelecting;
        Ok(())
    }

    /// Adjust the row limit. Drops any prior commit.
    pub fn set_head(&mut self, head: u64) -> ClientResult<()> {
        if !matches!(
            self.state,
            SourceState::RowSelecting | SourceState::Committed
        ) {
            return Err(ClientError::Validation("no tabular upload to select from".into()));
        }
        self.head = head;
        self.dirty = true;
        self.bump();
        self.state = SourceState::RowSelecting;
        if let Some(selection) = self.selection.as_mut() {
            selection.head = Some(head);
            selection.committed = false;
        }
        Ok(())
    }

    /// Parameters for the selection-apply call, when one may be issued.
    pub fn begin_apply(&mut self) -> Option<(u64, usize, u64)> {
        if self.state != SourceState::RowSelecting || !self.dirty {
            return None;
        }
        Some((self.bump(), self.index, self.head))
    }

    /// The selection-apply call succeeded: the selection becomes usable
    /// by the conversation.
    pub fn complete_apply(&mut self, generation: u64) {
        if self.stale(generation) {
            debug!(generation, current = self.generation, "stale apply response dropped");
            return;
        }
        if self.state != SourceState::RowSelecting {
            return;
        }
        if let Some(selection) = self.selection.as_mut() {
            selection.committed = true;
        }
        self.dirty = false;
        self.state = SourceState::Committed;
        info!(index = self.index, head = self.head, "selection committed");
    }

    // ------------------------------------------------------------------
    // Transcription preferences
    // ------------------------------------------------------------------

    /// Detection metadata from the media upload, valid in media states.
    pub fn detection(&self) -> Option<&TranscribeResult> {
        if self.selection.as_ref()?.media {
            self.selection.as_ref()?.result.as_ref()
        } else {
            None
        }
    }

    /// The coverage control is only offered for media long enough for
    /// the limit to matter.
    pub fn offers_duration_limit(&self) -> bool {
        matches!(self.detection(), Some(d) if d.duration >= LIMIT_OFFER_SECONDS)
    }

    /// The translate control is only offered when the detected language
    /// is not already English.
    pub fn offers_translation(&self) -> bool {
        matches!(self.detection(), Some(d) if d.lang != "en")
    }

    pub fn set_performance(&mut self, performance: Performance) {
        self.prefs.performance = performance;
        self.touch_prefs();
    }

    pub fn set_limit(&mut self, limit: DurationLimit) {
        self.prefs.limit = limit;
        self.touch_prefs();
    }

    pub fn set_task(&mut self, task: TranscribeTask) {
        self.prefs.task = task;
        self.touch_prefs();
    }

    pub fn set_prompt(&mut self, prompt: String) {
        self.prefs.prompt = prompt;
        self.touch_prefs();
    }

    fn touch_prefs(&mut self) {
        self.dirty = true;
        // Any in-flight transcription was issued under the previous prefs;
        // its completion is now stale, so fall back to configuring.
        self.bump();
        if self.state == SourceState::Transcribing {
            self.state = SourceState::MediaConfiguring;
        }
    }

    // ------------------------------------------------------------------
    // Transcription
    // ------------------------------------------------------------------

    /// Start a transcription run, when one may be issued.
    pub fn begin_transcribe(&mut self) -> Option<(u64, TranscribePrefs)> {
        if !matches!(
            self.state,
            SourceState::MediaConfiguring | SourceState::Transcribed
        ) || !self.dirty
        {
            return None;
        }
        self.state = SourceState::Transcribing;
        Some((self.bump(), self.prefs.clone()))
    }

    /// Store the decoded result; subtitle lookup becomes valid.
    pub fn complete_transcribe(&mut self, generation: u64, result: TranscribeResult) {
        if self.stale(generation) {
            debug!(generation, current = self.generation, "stale transcription dropped");
            return;
        }
        if self.state != SourceState::Transcribing {
            return;
        }
        if let Some(selection) = self.selection.as_mut() {
            selection.result = Some(result);
        }
        self.dirty = false;
        self.state = SourceState::Transcribed;
        info!("transcription stored");
    }

    /// The transcription call failed: fall back to configuring, edits
    /// intact, so the user can resubmit.
    pub fn fail_transcribe(&mut self, generation: u64) {
        if self.stale(generation) {
            return;
        }
        if self.state == SourceState::Transcribing {
            self.state = SourceState::MediaConfiguring;
        }
    }
}
