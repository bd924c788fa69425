use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::wire::{ContentType, GeneratedContent, NarrativeOption, RagResult, ThumbnailSpec, WizardInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    ContentType,
    Inputs,
    Narratives,
    Draft,
    Review,
    Assets,
    Done,
}

impl WizardStep {
    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::ContentType => Some(WizardStep::Inputs),
            WizardStep::Inputs => Some(WizardStep::Narratives),
            WizardStep::Narratives => Some(WizardStep::Draft),
            WizardStep::Draft => Some(WizardStep::Review),
            WizardStep::Review => Some(WizardStep::Assets),
            WizardStep::Assets => Some(WizardStep::Done),
            WizardStep::Done => None,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StepError {
    #[error("step {0:?} is missing {1}")]
    Incomplete(WizardStep, &'static str),
    #[error("wizard is already done")]
    Finished,
}

/// Where the flow goes after a draft generation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Retry,
    KeepDraft,
    Exit,
}

/// Everything the creator has chosen so far. Only moves forward once a step's data is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardSession {
    pub step: WizardStep,
    pub content_type: Option<ContentType>,
    pub input: Option<WizardInput>,
    pub rag: Option<RagResult>,
    pub transcript: Option<String>,
    pub narratives: Vec<NarrativeOption>,
    pub selected: Option<NarrativeOption>,
    pub content: Option<GeneratedContent>,
    /// Prompt of the first generation; refactors are layered on top of it.
    pub generation_prompt: Option<String>,
    pub history: Vec<GeneratedContent>,
    pub approved: bool,
    pub thumbnail: Option<ThumbnailSpec>,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self {
            step: WizardStep::ContentType,
            content_type: None,
            input: None,
            rag: None,
            transcript: None,
            narratives: Vec::new(),
            selected: None,
            content: None,
            generation_prompt: None,
            history: Vec::new(),
            approved: false,
            thumbnail: None,
        }
    }
}

impl WizardSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn ready(&self) -> Result<(), StepError> {
        let missing = match self.step {
            WizardStep::ContentType if self.content_type.is_none() => Some("a content type"),
            WizardStep::Inputs if self.input.as_ref().map(|i| i.theme.trim().is_empty()).unwrap_or(true) => Some("a theme"),
            WizardStep::Narratives if self.selected.is_none() => Some("a selected narrative"),
            WizardStep::Draft if self.content.is_none() => Some("a draft"),
            WizardStep::Review if !self.approved => Some("approval"),
            WizardStep::Done => return Err(StepError::Finished),
            _ => None,
        };
        match missing {
            Some(what) => Err(StepError::Incomplete(self.step, what)),
            None => Ok(()),
        }
    }

    pub fn advance(&mut self) -> Result<WizardStep, StepError> {
        self.ready()?;
        let next = self.step.next().ok_or(StepError::Finished)?;
        self.step = next;
        Ok(next)
    }

    pub fn choose_type(&mut self, t: ContentType) {
        self.content_type = Some(t);
        if let Some(input) = self.input.as_mut() {
            input.content_type = t;
        }
    }

    pub fn set_input(&mut self, mut input: WizardInput) {
        if let Some(t) = self.content_type {
            input.content_type = t;
        }
        self.input = Some(input);
    }

    /// Picks by id; an unknown id leaves the selection unchanged.
    pub fn select_narrative(&mut self, id: &str) -> bool {
        match self.narratives.iter().find(|n| n.id == id) {
            Some(n) => {
                self.selected = Some(n.clone());
                true
            }
            None => false,
        }
    }

    /// Replace the current draft wholesale; the previous one goes to history.
    pub fn replace_content(&mut self, content: GeneratedContent) {
        if let Some(prev) = self.content.replace(content) {
            self.history.push(prev);
        }
        self.approved = false;
    }

    /// A failed regenerate never discards the draft under review.
    pub fn after_failed_generation(&self, retry: bool) -> Recovery {
        if retry {
            Recovery::Retry
        } else if self.content.is_some() {
            Recovery::KeepDraft
        } else {
            Recovery::Exit
        }
    }

    pub fn approve(&mut self) {
        self.approved = self.content.is_some();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ContentMetadata, NarrativeAngle, TextPost};
    use chrono::Utc;

    fn text(n: u32) -> GeneratedContent {
        GeneratedContent::Text {
            post: TextPost { texto: format!("v{n}"), legenda: "l".into(), hashtags: vec![] },
            metadata: ContentMetadata {
                model: "m".into(),
                rag_sources: vec![],
                narrative_id: None,
                generated_at: Utc::now(),
                refactor_count: n,
                prompt: None,
                negative_terms: vec![],
            },
        }
    }

    #[test]
    fn cannot_skip_steps_without_data() {
        let mut s = WizardSession::new();
        assert_eq!(s.advance(), Err(StepError::Incomplete(WizardStep::ContentType, "a content type")));
        s.choose_type(ContentType::Text);
        assert_eq!(s.advance(), Ok(WizardStep::Inputs));
        s.set_input(WizardInput::new(ContentType::Carousel, " "));
        assert!(s.advance().is_err());
        s.set_input(WizardInput::new(ContentType::Carousel, "Tema"));
        assert_eq!(s.input.as_ref().unwrap().content_type, ContentType::Text);
        assert_eq!(s.advance(), Ok(WizardStep::Narratives));
    }

    #[test]
    fn failed_regenerate_keeps_existing_draft() {
        let mut s = WizardSession::new();
        assert_eq!(s.after_failed_generation(false), Recovery::Exit);
        assert_eq!(s.after_failed_generation(true), Recovery::Retry);
        s.replace_content(text(0));
        assert_eq!(s.after_failed_generation(false), Recovery::KeepDraft);
        assert!(s.content.is_some());
    }

    #[test]
    fn full_walk_to_done() {
        let mut s = WizardSession::new();
        s.choose_type(ContentType::Text);
        s.advance().unwrap();
        s.set_input(WizardInput::new(ContentType::Text, "Tema"));
        s.advance().unwrap();
        s.narratives = vec![NarrativeOption {
            id: "1-herege".into(),
            title: "t".into(),
            description: "d".into(),
            angle: NarrativeAngle::Herege,
            hook: None,
            core_belief: None,
            status_quo_challenged: None,
        }];
        assert!(!s.select_narrative("9-nada"));
        assert!(s.select_narrative("1-herege"));
        s.advance().unwrap();
        s.replace_content(text(0));
        s.advance().unwrap();
        assert!(s.advance().is_err());
        s.replace_content(text(1));
        assert_eq!(s.history.len(), 1);
        s.approve();
        assert_eq!(s.advance(), Ok(WizardStep::Assets));
        assert_eq!(s.advance(), Ok(WizardStep::Done));
        assert_eq!(s.advance(), Err(StepError::Finished));
    }
}
