use std::path::Path;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::conversation::ConversationLog;
use crate::error::{ClientError, ClientResult};
use crate::gateway::ApiClient;
use crate::model::{ModelName, QueryAnswer, QueryRequest, Session, TranscribeResponse, UploadOutcome};
use crate::selection::SelectionMachine;
use crate::session::SessionManager;

/// Per-operation in-flight flags. Upload, apply, transcribe and query are
/// independent, but each is individually serialized: a second submission
/// while one is pending is a no-op, never queued.
#[derive(Debug, Default)]
struct InFlight {
    upload: bool,
    apply: bool,
    transcribe: bool,
    query: bool,
}

/// The owned context object tying the core together: gateway, session,
/// selection machine and conversation log. All state lives here and is
/// only ever touched from the driving event loop.
pub struct DataChatClient {
    api: ApiClient,
    session: Arc<SessionManager>,
    machine: SelectionMachine,
    log: ConversationLog,
    in_flight: InFlight,
    model: ModelName,
}

impl DataChatClient {
    pub fn new(config: &ClientConfig) -> Self {
        let session = Arc::new(SessionManager::new());
        Self {
            api: ApiClient::new(config, session.clone()),
            session,
            machine: SelectionMachine::new(),
            log: ConversationLog::new(),
            in_flight: InFlight::default(),
            model: ModelName::default(),
        }
    }

    pub fn machine(&self) -> &SelectionMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut SelectionMachine {
        &mut self.machine
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn model(&self) -> ModelName {
        self.model
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Create the session if none exists yet. Safe to call again after a
    /// failure; nothing else waits on this.
    pub async fn connect(&self) -> ClientResult<Session> {
        let session = self.session.get_or_create(&self.api).await?;
        Ok(session.clone())
    }

    /// Upload a batch of files as multipart form data, replacing whatever
    /// was uploaded before.
    pub async fn upload(&mut self, paths: &[&Path]) -> ClientResult<()> {
        if self.in_flight.upload {
            debug!("upload already in flight");
            return Ok(());
        }
        if paths.is_empty() {
            return Err(ClientError::Validation("no files chosen".into()));
        }
        let filenames: Vec<String> = paths
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.to_string_lossy().into_owned())
            })
            .collect();

        let generation = self.machine.begin_upload(filenames.clone());
        self.in_flight.upload = true;
        let outcome = self.upload_request(paths, &filenames).await;
        self.in_flight.upload = false;

        match outcome {
            Ok(outcome) => self.machine.complete_upload(generation, outcome),
            Err(err) => {
                warn!(%err, "upload failed");
                Err(err)
            }
        }
    }

    async fn upload_request(
        &self,
        paths: &[&Path],
        filenames: &[String],
    ) -> ClientResult<UploadOutcome> {
        let mut form = Form::new();
        for (path, name) in paths.iter().zip(filenames) {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| ClientError::Validation(format!("cannot read {}: {e}", name)))?;
            form = form.part("files", Part::bytes(bytes).file_name(name.clone()));
        }
        self.api.post_form("/data/input", form, &[]).await
    }

    /// Commit the current row selection on the server.
    pub async fn apply_selection(&mut self) -> ClientResult<()> {
        if self.in_flight.apply {
            debug!("selection apply already in flight");
            return Ok(());
        }
        let Some((generation, index, head)) = self.machine.begin_apply() else {
            debug!("nothing to apply");
            return Ok(());
        };
        let params = [
            ("index", index.to_string()),
            ("head", head.to_string()),
        ];
        self.in_flight.apply = true;
        let result: ClientResult<serde_json::Value> =
            self.api.post_empty("/data/select", &params).await;
        self.in_flight.apply = false;

        match result {
            Ok(_) => {
                self.machine.complete_apply(generation);
                Ok(())
            }
            Err(err) => {
                warn!(%err, "selection apply failed");
                Err(err)
            }
        }
    }

    /// Run transcription with the configured preferences.
    pub async fn transcribe(&mut self) -> ClientResult<()> {
        if self.in_flight.transcribe {
            debug!("transcription already in flight");
            return Ok(());
        }
        let Some((generation, prefs)) = self.machine.begin_transcribe() else {
            debug!("nothing to transcribe");
            return Ok(());
        };
        self.in_flight.transcribe = true;
        let result: ClientResult<TranscribeResponse> =
            self.api.post_json("/transcribe", &prefs, &[]).await;
        self.in_flight.transcribe = false;

        match result {
            Ok(response) => {
                self.machine.complete_transcribe(generation, response.result);
                Ok(())
            }
            Err(err) => {
                warn!(%err, "transcription failed");
                self.machine.fail_transcribe(generation);
                Err(err)
            }
        }
    }

    /// Ask a question against the committed selection. The user message
    /// and a pending placeholder are appended before the request goes
    /// out; on failure the placeholder is removed and the user message
    /// kept so the query can be edited and resent.
    pub async fn send_query(&mut self, text: &str) -> ClientResult<()> {
        if self.in_flight.query {
            debug!("query already in flight");
            return Ok(());
        }
        let Some(pending_id) = self.log.begin_query(text, self.machine.selection()) else {
            return Ok(());
        };
        let body = QueryRequest {
            query: text.to_string(),
        };
        self.in_flight.query = true;
        let result: ClientResult<QueryAnswer> = self.api.post_json("/query", &body, &[]).await;
        self.in_flight.query = false;

        match result {
            Ok(answer) => {
                self.log.complete_query(pending_id, &answer);
                Ok(())
            }
            Err(err) => {
                warn!(%err, "query failed");
                self.log.abort_query(pending_id);
                Err(err)
            }
        }
    }

    /// Switch the backend LLM for subsequent queries.
    pub async fn switch_model(&mut self, model: ModelName) -> ClientResult<()> {
        let params = [("model", model.as_str().to_string())];
        let _: serde_json::Value = self.api.post_empty("/model", &params).await?;
        self.model = model;
        Ok(())
    }
}
