//! Effect runner around [`AppState`]
//!
//! Performs the effects the reducer asks for (PDF extraction, backend calls,
//! export) and feeds their results back in, one at a time, until the chain
//! started by a user action is done.

use crate::app_state::{Action, AppState, Effect, Notice};
use crate::backend::BackendClient;
use crate::db::KeyValueStore;
use crate::export::{export_to_file, ExportOptions};
use crate::ingest;
use std::collections::VecDeque;
use std::path::PathBuf;

/// What a dispatched action produced for the user
#[derive(Debug, Default)]
pub struct Outcome {
    pub notices: Vec<Notice>,
    pub exported: Option<PathBuf>,
}

pub struct Session<S: KeyValueStore> {
    state: AppState<S>,
    backend: BackendClient,
    export_dir: PathBuf,
    export_options: ExportOptions,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(
        state: AppState<S>,
        backend: BackendClient,
        export_dir: PathBuf,
        export_options: ExportOptions,
    ) -> Self {
        Self {
            state,
            backend,
            export_dir,
            export_options,
        }
    }

    pub fn state(&self) -> &AppState<S> {
        &self.state
    }

    /// Run one action and every effect it leads to
    pub async fn dispatch(&mut self, action: Action) -> Outcome {
        let mut outcome = Outcome::default();
        let mut queue: VecDeque<Effect> = self.state.dispatch(action).into();

        while let Some(effect) = queue.pop_front() {
            let follow_up = match effect {
                Effect::ExtractPdf(bytes) => {
                    let size = bytes.len();
                    let result = ingest::extract_text_async(bytes).await;
                    if let Ok(text) = &result {
                        log::info!(
                            "Extracted {} pages ({} chars) from {} byte upload",
                            text.lines().count(),
                            text.chars().count(),
                            size
                        );
                    }
                    Some(Action::PdfExtracted(result))
                }
                Effect::Summarize { text } => {
                    Some(Action::SummaryReceived(self.backend.summarize(&text).await))
                }
                Effect::Suggest { text, profile } => {
                    log::info!("Requesting suggestion for profile '{}'", profile);
                    Some(Action::SuggestionReceived(
                        self.backend.suggest(&text, &profile).await,
                    ))
                }
                Effect::Export(activities) => {
                    match export_to_file(&activities, &self.export_dir, &self.export_options) {
                        Ok(path) => {
                            log::info!("Exported {} activities to {}", activities.len(), path.display());
                            outcome.exported = Some(path);
                        }
                        Err(e) => {
                            log::error!("Export failed: {}", e);
                            outcome.notices.push(Notice::ExportFailed);
                        }
                    }
                    None
                }
                Effect::Notify(notice) => {
                    log::debug!("Notice: {}", notice);
                    outcome.notices.push(notice);
                    None
                }
            };

            if let Some(action) = follow_up {
                queue.extend(self.state.dispatch(action));
            }
        }
        outcome
    }
}
