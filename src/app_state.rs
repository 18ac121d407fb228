//! Application state and action reducer
//!
//! All session state lives in [`AppState`]. [`AppState::dispatch`] applies one
//! [`Action`] and returns the [`Effect`]s the caller has to perform; results of
//! those effects come back in as further actions. Busy tokens per action
//! category reject overlapping triggers.

use crate::activities::ActivityStore;
use crate::backend::SUGGESTION_PLACEHOLDER;
use crate::db::{Activity, KeyValueStore};
use crate::error::{Error, Result};
use crate::goals::{GoalCatalog, GoalRecord};
use crate::prompt::build_suggestion_prompt;
use std::fmt;

/// Categories of work that may be outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Busy {
    Ingest,
    Summary,
    Suggestion,
}

#[derive(Debug)]
pub enum Action {
    /// A PDF was chosen for upload
    UploadPdf(Vec<u8>),
    PdfExtracted(Result<String>),
    SummaryReceived(Result<String>),
    SelectProfile(String),
    RequestSuggestion,
    SuggestionReceived(Result<String>),
    SaveActivity,
    UpdateReflection { index: usize, value: String },
    DeleteActivity { index: usize },
    Export,
}

/// Side effects requested by the reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ExtractPdf(Vec<u8>),
    Summarize { text: String },
    Suggest { text: String, profile: String },
    Export(Vec<Activity>),
    Notify(Notice),
}

/// Messages shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PdfUnreadable,
    SummaryFailed,
    MissingSummary,
    SuggestionFailed,
    NothingToSave,
    ActivityLimit,
    NoSuchActivity { index: usize },
    StorageFailed,
    ExportFailed,
    Busy(Busy),
    Saved { count: usize },
    Deleted,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PdfUnreadable => write!(f, "Kunne ikke læse PDF"),
            Notice::SummaryFailed => write!(f, "Kunne ikke opsummere læreplanen"),
            Notice::MissingSummary => {
                write!(f, "Upload først en PDF, så vi har et resumé at arbejde med.")
            }
            Notice::SuggestionFailed => write!(f, "Kunne ikke generere forslag"),
            Notice::NothingToSave => write!(f, "Der er intet forslag at gemme."),
            Notice::ActivityLimit => write!(f, "Du kan kun gemme op til 3 aktiviteter."),
            Notice::NoSuchActivity { index } => write!(f, "Aktivitet {} findes ikke.", index + 1),
            Notice::StorageFailed => write!(f, "Kunne ikke gemme aktiviteterne."),
            Notice::ExportFailed => write!(f, "Kunne ikke udskrive aktiviteterne."),
            Notice::Busy(Busy::Ingest) => write!(f, "📄 Indlæser PDF..."),
            Notice::Busy(Busy::Summary) => write!(f, "✨ Opsummerer læreplan..."),
            Notice::Busy(Busy::Suggestion) => write!(f, "⏳ Genererer forslag..."),
            Notice::Saved { count } => write!(f, "Aktivitet gemt ({} af 3).", count),
            Notice::Deleted => write!(f, "Aktivitet slettet."),
        }
    }
}

pub struct AppState<S: KeyValueStore> {
    catalog: GoalCatalog,
    activities: ActivityStore<S>,
    pub summary: String,
    pub profile: String,
    pub goals: GoalRecord,
    pub suggestion: String,
    pub loading_pdf: bool,
    pub loading_summary: bool,
    pub loading_suggestion: bool,
}

impl<S: KeyValueStore> AppState<S> {
    /// Fresh session over a loaded catalog; activities are restored from storage
    pub fn new(catalog: GoalCatalog, storage: S) -> Self {
        Self {
            catalog,
            activities: ActivityStore::open(storage),
            summary: String::new(),
            profile: String::new(),
            goals: GoalRecord::default(),
            suggestion: String::new(),
            loading_pdf: false,
            loading_summary: false,
            loading_suggestion: false,
        }
    }

    pub fn catalog(&self) -> &GoalCatalog {
        &self.catalog
    }

    pub fn activities(&self) -> &[Activity] {
        self.activities.activities()
    }

    pub fn is_busy(&self, busy: Busy) -> bool {
        match busy {
            Busy::Ingest => self.loading_pdf,
            Busy::Summary => self.loading_summary,
            Busy::Suggestion => self.loading_suggestion,
        }
    }

    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::UploadPdf(bytes) => self.upload_pdf(bytes),
            Action::PdfExtracted(result) => self.pdf_extracted(result),
            Action::SummaryReceived(result) => self.summary_received(result),
            Action::SelectProfile(profile) => {
                self.goals = self.catalog.lookup(&profile);
                self.profile = profile;
                Vec::new()
            }
            Action::RequestSuggestion => self.request_suggestion(),
            Action::SuggestionReceived(result) => self.suggestion_received(result),
            Action::SaveActivity => {
                let suggestion = self.suggestion.clone();
                self.mutate(|store| store.save(&suggestion).map(|_| Notice::Saved { count: store.len() }))
            }
            Action::UpdateReflection { index, value } => {
                self.mutate(|store| store.update_reflection(index, &value).map(|_| None::<Notice>))
            }
            Action::DeleteActivity { index } => {
                self.mutate(|store| store.delete(index).map(|_| Notice::Deleted))
            }
            Action::Export => vec![Effect::Export(self.activities().to_vec())],
        }
    }

    fn upload_pdf(&mut self, bytes: Vec<u8>) -> Vec<Effect> {
        if let Some(busy) = [Busy::Ingest, Busy::Summary].into_iter().find(|b| self.is_busy(*b)) {
            return vec![Effect::Notify(Notice::Busy(busy))];
        }
        self.summary.clear();
        self.loading_pdf = true;
        vec![Effect::ExtractPdf(bytes)]
    }

    fn pdf_extracted(&mut self, result: Result<String>) -> Vec<Effect> {
        self.loading_pdf = false;
        match result {
            Ok(text) => {
                self.loading_summary = true;
                vec![Effect::Summarize { text }]
            }
            Err(e) => {
                log::error!("Upload failed: {}", e);
                self.summary.clear();
                self.loading_summary = false;
                vec![Effect::Notify(Notice::PdfUnreadable)]
            }
        }
    }

    fn summary_received(&mut self, result: Result<String>) -> Vec<Effect> {
        self.loading_pdf = false;
        self.loading_summary = false;
        match result {
            Ok(summary) => {
                self.summary = summary;
                Vec::new()
            }
            Err(e) => {
                log::error!("Summary failed: {}", e);
                vec![Effect::Notify(Notice::SummaryFailed)]
            }
        }
    }

    fn request_suggestion(&mut self) -> Vec<Effect> {
        if self.loading_suggestion {
            return vec![Effect::Notify(Notice::Busy(Busy::Suggestion))];
        }
        if self.summary.is_empty() {
            return vec![Effect::Notify(Notice::MissingSummary)];
        }
        self.loading_suggestion = true;
        vec![Effect::Suggest {
            text: build_suggestion_prompt(&self.summary, &self.goals),
            profile: self.profile.clone(),
        }]
    }

    fn suggestion_received(&mut self, result: Result<String>) -> Vec<Effect> {
        self.loading_suggestion = false;
        match result {
            Ok(suggestion) if suggestion.is_empty() => {
                self.suggestion = SUGGESTION_PLACEHOLDER.to_string();
                Vec::new()
            }
            Ok(suggestion) => {
                self.suggestion = suggestion;
                Vec::new()
            }
            Err(e) => {
                log::error!("Suggestion failed: {}", e);
                vec![Effect::Notify(Notice::SuggestionFailed)]
            }
        }
    }

    fn mutate<N, F>(&mut self, op: F) -> Vec<Effect>
    where
        N: Into<Option<Notice>>,
        F: FnOnce(&mut ActivityStore<S>) -> Result<N>,
    {
        match op(&mut self.activities) {
            Ok(notice) => notice.into().map(Effect::Notify).into_iter().collect(),
            Err(e) => vec![Effect::Notify(notice_for(&e))],
        }
    }
}

fn notice_for(err: &Error) -> Notice {
    match err {
        Error::NothingToSave => Notice::NothingToSave,
        Error::ActivityLimit { .. } => Notice::ActivityLimit,
        Error::ActivityIndex { index, .. } => Notice::NoSuchActivity { index: *index },
        other => {
            log::error!("Activity storage failed: {}", other);
            Notice::StorageFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    const CATALOG: &str = r#"{
        "Dagtilbudspædagogik – 1. praktik": {
            "kompetencemål": ["Pædagogens praksis De studerende kan indgå"],
            "vidensmål": ["leg"],
            "færdighedsmål": ["observere"]
        }
    }"#;

    fn state() -> AppState<MemoryStore> {
        AppState::new(GoalCatalog::from_json(CATALOG).unwrap(), MemoryStore::new())
    }

    fn notices(effects: &[Effect]) -> Vec<&Notice> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Notify(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn with_summary(summary: &str) -> AppState<MemoryStore> {
        let mut state = state();
        state.dispatch(Action::UploadPdf(b"%PDF".to_vec()));
        state.dispatch(Action::PdfExtracted(Ok("tekst\n".to_string())));
        state.dispatch(Action::SummaryReceived(Ok(summary.to_string())));
        state
    }

    #[test]
    fn test_upload_flow_sequences_flags() {
        let mut state = state();
        state.summary = "gammelt resumé".to_string();

        let effects = state.dispatch(Action::UploadPdf(b"%PDF-1.5".to_vec()));
        assert_eq!(effects, vec![Effect::ExtractPdf(b"%PDF-1.5".to_vec())]);
        assert!(state.summary.is_empty());
        assert!(state.loading_pdf);
        assert!(!state.loading_summary);

        let effects = state.dispatch(Action::PdfExtracted(Ok("side 1\n".to_string())));
        assert_eq!(effects, vec![Effect::Summarize { text: "side 1\n".to_string() }]);
        assert!(!state.loading_pdf);
        assert!(state.loading_summary);

        let effects = state.dispatch(Action::SummaryReceived(Ok("resumé".to_string())));
        assert!(effects.is_empty());
        assert_eq!(state.summary, "resumé");
        assert!(!state.loading_pdf && !state.loading_summary);
    }

    #[test]
    fn test_unreadable_pdf_clears_summary_and_flags() {
        let mut state = state();
        state.summary = "gammelt".to_string();
        state.dispatch(Action::UploadPdf(b"junk".to_vec()));

        let effects = state.dispatch(Action::PdfExtracted(Err(Error::Pdf("bad".into()))));
        assert_eq!(notices(&effects), vec![&Notice::PdfUnreadable]);
        assert!(state.summary.is_empty());
        assert!(!state.loading_pdf && !state.loading_summary);
    }

    #[test]
    fn test_summary_failure_notifies_and_clears_flags() {
        let mut state = state();
        state.dispatch(Action::UploadPdf(b"%PDF".to_vec()));
        state.dispatch(Action::PdfExtracted(Ok("t".to_string())));

        let effects = state.dispatch(Action::SummaryReceived(Err(Error::Backend("down".into()))));
        assert_eq!(notices(&effects), vec![&Notice::SummaryFailed]);
        assert!(!state.loading_summary);
    }

    #[test]
    fn test_upload_rejected_while_busy() {
        let mut state = state();
        state.dispatch(Action::UploadPdf(b"%PDF".to_vec()));

        let effects = state.dispatch(Action::UploadPdf(b"%PDF".to_vec()));
        assert_eq!(effects, vec![Effect::Notify(Notice::Busy(Busy::Ingest))]);

        state.dispatch(Action::PdfExtracted(Ok("t".to_string())));
        let effects = state.dispatch(Action::UploadPdf(b"%PDF".to_vec()));
        assert_eq!(effects, vec![Effect::Notify(Notice::Busy(Busy::Summary))]);
    }

    #[test]
    fn test_select_profile_looks_up_goals() {
        let mut state = state();
        state.dispatch(Action::SelectProfile("Dagtilbudspædagogik – 1. praktik".to_string()));
        assert_eq!(state.goals.knowledge_goals, vec!["leg"]);

        state.dispatch(Action::SelectProfile("ukendt".to_string()));
        assert_eq!(state.profile, "ukendt");
        assert!(state.goals.is_empty());
    }

    #[test]
    fn test_suggestion_without_summary_makes_no_call() {
        let mut state = state();
        state.suggestion = "tidligere".to_string();

        let effects = state.dispatch(Action::RequestSuggestion);
        assert_eq!(effects, vec![Effect::Notify(Notice::MissingSummary)]);
        assert!(!state.loading_suggestion);
        assert_eq!(state.suggestion, "tidligere");
    }

    #[test]
    fn test_suggestion_request_builds_prompt() {
        let mut state = with_summary("Resumé af læreplan");
        state.dispatch(Action::SelectProfile("Dagtilbudspædagogik – 1. praktik".to_string()));

        let effects = state.dispatch(Action::RequestSuggestion);
        assert_eq!(
            effects,
            vec![Effect::Suggest {
                text: build_suggestion_prompt("Resumé af læreplan", &state.goals),
                profile: "Dagtilbudspædagogik – 1. praktik".to_string(),
            }]
        );
        assert!(state.loading_suggestion);

        // Second trigger while outstanding is rejected centrally
        let effects = state.dispatch(Action::RequestSuggestion);
        assert_eq!(effects, vec![Effect::Notify(Notice::Busy(Busy::Suggestion))]);

        state.dispatch(Action::SuggestionReceived(Ok("Lav en sansesti".to_string())));
        assert_eq!(state.suggestion, "Lav en sansesti");
        assert!(!state.loading_suggestion);
    }

    #[test]
    fn test_suggestion_failure_keeps_previous() {
        let mut state = with_summary("R");
        state.suggestion = "forrige".to_string();
        state.dispatch(Action::RequestSuggestion);

        let effects = state.dispatch(Action::SuggestionReceived(Err(Error::Backend("x".into()))));
        assert_eq!(notices(&effects), vec![&Notice::SuggestionFailed]);
        assert_eq!(state.suggestion, "forrige");
        assert!(!state.loading_suggestion);
    }

    #[test]
    fn test_empty_suggestion_becomes_placeholder() {
        let mut state = with_summary("R");
        state.dispatch(Action::RequestSuggestion);
        state.dispatch(Action::SuggestionReceived(Ok(String::new())));
        assert_eq!(state.suggestion, SUGGESTION_PLACEHOLDER);
    }

    #[test]
    fn test_save_without_suggestion() {
        let mut state = state();
        let effects = state.dispatch(Action::SaveActivity);
        assert_eq!(effects, vec![Effect::Notify(Notice::NothingToSave)]);
        assert!(state.activities().is_empty());
    }

    #[test]
    fn test_fourth_save_is_rejected() {
        let mut state = state();
        for i in 0..3 {
            state.suggestion = format!("forslag {}", i);
            let effects = state.dispatch(Action::SaveActivity);
            assert_eq!(effects, vec![Effect::Notify(Notice::Saved { count: i + 1 })]);
        }

        state.suggestion = "forslag 3".to_string();
        let effects = state.dispatch(Action::SaveActivity);
        assert_eq!(effects, vec![Effect::Notify(Notice::ActivityLimit)]);
        assert_eq!(Notice::ActivityLimit.to_string(), "Du kan kun gemme op til 3 aktiviteter.");
        assert_eq!(state.activities().len(), 3);
    }

    #[test]
    fn test_reflection_and_delete() {
        let mut state = state();
        for s in ["a", "b"] {
            state.suggestion = s.to_string();
            state.dispatch(Action::SaveActivity);
        }

        let effects = state.dispatch(Action::UpdateReflection {
            index: 1,
            value: "lærerigt".to_string(),
        });
        assert!(effects.is_empty());
        assert_eq!(state.activities()[1].reflection, "lærerigt");

        let effects = state.dispatch(Action::DeleteActivity { index: 0 });
        assert_eq!(effects, vec![Effect::Notify(Notice::Deleted)]);
        assert_eq!(state.activities()[0].text, "b");

        let effects = state.dispatch(Action::DeleteActivity { index: 4 });
        assert_eq!(effects, vec![Effect::Notify(Notice::NoSuchActivity { index: 4 })]);
    }

    #[test]
    fn test_export_snapshots_activities() {
        let mut state = state();
        state.suggestion = "a".to_string();
        state.dispatch(Action::SaveActivity);

        let effects = state.dispatch(Action::Export);
        assert_eq!(effects, vec![Effect::Export(vec![Activity::new("a")])]);
    }

    #[test]
    fn test_activities_restored_on_new_session() {
        let storage = MemoryStore::new();
        {
            let mut state = AppState::new(GoalCatalog::empty(), &storage);
            state.suggestion = "gemt".to_string();
            state.dispatch(Action::SaveActivity);
        }
        let state = AppState::new(GoalCatalog::empty(), &storage);
        assert_eq!(state.activities(), &[Activity::new("gemt")]);
        assert!(state.summary.is_empty());
        assert!(state.suggestion.is_empty());
    }
}
