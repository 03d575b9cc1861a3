//! Scripted collaborator and candidate builders for pipeline tests

use async_trait::async_trait;
use rk_import::models::{CandidateSource, ImportCandidate, ImportOptions};
use rk_import::pipeline::{ImportCollaborator, SubmitResponse};
use rk_import::services::ClientError;
use rk_import::SelectionSet;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Scripted response for one candidate, keyed by display name
#[derive(Debug, Clone)]
pub enum Script {
    Import,
    Skip,
    ServerFailed(&'static str),
    Network,
    Timeout,
    Api(u16, Option<&'static str>),
}

/// Collaborator that answers from a script and records every call
///
/// Names without a script entry import successfully.
#[derive(Default)]
pub struct ScriptedCollaborator {
    script: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
    /// Tripped after the call for this display name completes
    cancel_after: Option<(String, CancellationToken)>,
}

impl ScriptedCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, script: Script) -> Self {
        self.script.insert(name.to_string(), script);
        self
    }

    pub fn cancel_after(mut self, name: &str, token: CancellationToken) -> Self {
        self.cancel_after = Some((name.to_string(), token));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImportCollaborator for ScriptedCollaborator {
    async fn submit(
        &self,
        candidate: &ImportCandidate,
        _options: &ImportOptions,
    ) -> Result<SubmitResponse, ClientError> {
        let name = candidate.display_name.clone();
        self.calls.lock().unwrap().push(name.clone());
        tokio::task::yield_now().await;

        if let Some((trigger, token)) = &self.cancel_after {
            if *trigger == name {
                token.cancel();
            }
        }

        match self.script.get(&name).cloned().unwrap_or(Script::Import) {
            Script::Import => Ok(SubmitResponse {
                imported: 1,
                ..Default::default()
            }),
            Script::Skip => Ok(SubmitResponse {
                skipped: 1,
                ..Default::default()
            }),
            Script::ServerFailed(message) => Ok(SubmitResponse {
                failed: 1,
                message: Some(message.to_string()),
                ..Default::default()
            }),
            Script::Network => Err(ClientError::Network("connection refused".to_string())),
            Script::Timeout => Err(ClientError::Timeout),
            Script::Api(status, message) => Err(ClientError::Api {
                status,
                message: message.map(str::to_string),
            }),
        }
    }
}

pub fn scanned(name: &str, selected: bool) -> ImportCandidate {
    ImportCandidate {
        source: CandidateSource::Scanned {
            path: format!("/library/inbox/{}", name),
        },
        display_name: name.to_string(),
        size_bytes: 1024,
        extension: name.rsplit('.').next().unwrap_or_default().to_string(),
        last_modified: None,
        selected,
    }
}

/// Every name becomes a selected scanned candidate, in order
pub fn scanned_selection(names: &[&str]) -> SelectionSet {
    names.iter().map(|n| scanned(n, true)).collect()
}
