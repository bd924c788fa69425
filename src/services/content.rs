use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use super::ServiceCtx;
use crate::errors::WizardError;
use crate::normalize;
use crate::prompt::{content_prompt, refactor_prompt, PromptContext};
use crate::safety;
use crate::validate::{
    validate_carousel_response, validate_image_response, validate_text_response, validate_video_script, Validated,
};
use crate::wire::{ContentMetadata, ContentType, GeneratedContent, RagSource};

/// A validated draft plus the prompt that produced it (kept for the refactor loop).
#[derive(Debug, Clone)]
pub struct Generation {
    pub content: GeneratedContent,
    pub prompt: String,
    pub warnings: Vec<String>,
}

/// Validate a raw response body for `kind` and wrap it with `metadata`.
pub fn build_content(kind: ContentType, body: &Value, metadata: ContentMetadata) -> Validated<GeneratedContent> {
    Ok(match kind {
        ContentType::Text => GeneratedContent::Text { post: validate_text_response(body)?, metadata },
        ContentType::Image => GeneratedContent::Image { post: validate_image_response(body)?, metadata },
        ContentType::Carousel => GeneratedContent::Carousel { carousel: validate_carousel_response(body)?, metadata },
        ContentType::Video => GeneratedContent::Video { script: validate_video_script(body)?, metadata },
    })
}

fn finish(mut content: GeneratedContent, prompt: String, negative_terms: &[String]) -> Generation {
    let mut warnings = normalize::sanitize(&mut content);
    let hits = safety::screen_content(&content, negative_terms);
    if !hits.is_empty() {
        warn!(?hits, "generated content uses negative terms");
        warnings.push(format!("negative terms present: {}", hits.join(", ")));
    }
    Generation { content, prompt, warnings }
}

pub async fn generate_content(
    svc: &ServiceCtx<'_>,
    ctx: &PromptContext<'_>,
    rag_sources: &[RagSource],
) -> Result<Generation, WizardError> {
    let kind = ctx.input.content_type;
    let prompt = content_prompt(ctx);
    let req = svc.request(prompt.clone());
    let (body, resp) = svc.call_json(&format!("generate.{kind}"), &req).await?;

    let metadata = ContentMetadata {
        model: resp.model,
        rag_sources: rag_sources.to_vec(),
        narrative_id: ctx.narrative.map(|n| n.id.clone()),
        generated_at: Utc::now(),
        refactor_count: 0,
        prompt: Some(prompt.clone()),
        negative_terms: ctx.input.negative_terms.clone(),
    };
    let content = build_content(kind, &body, metadata)?;
    Ok(finish(content, prompt, &ctx.input.negative_terms))
}

/// Rewrite `current` with the creator's feedback. The result replaces the draft wholesale.
pub async fn refactor_content(
    svc: &ServiceCtx<'_>,
    original_prompt: &str,
    current: &GeneratedContent,
    feedback: &str,
    negative_terms: &[String],
) -> Result<Generation, WizardError> {
    if feedback.trim().is_empty() {
        return Err(WizardError::Validation(crate::validate::ValidationError::new(
            "feedback",
            "non-empty string",
            "empty string",
        )));
    }
    let kind = current.content_type();
    let current_json = serde_json::to_string_pretty(&current.body_json()).map_err(|e| WizardError::Parse(e.to_string()))?;
    let prompt = refactor_prompt(original_prompt, &current_json, feedback);
    let req = svc.request(prompt);
    let (body, resp) = svc.call_json(&format!("refactor.{kind}"), &req).await?;

    let previous = current.metadata();
    let mut terms = previous.negative_terms.clone();
    for t in negative_terms {
        if !terms.iter().any(|k| k.to_lowercase() == t.to_lowercase()) {
            terms.push(t.clone());
        }
    }
    let metadata = ContentMetadata {
        model: resp.model,
        rag_sources: previous.rag_sources.clone(),
        narrative_id: previous.narrative_id.clone(),
        generated_at: Utc::now(),
        refactor_count: previous.refactor_count + 1,
        prompt: Some(original_prompt.to_string()),
        negative_terms: terms.clone(),
    };
    let content = build_content(kind, &body, metadata)?;
    // The loop keeps refactoring against the first prompt, not the stacked one.
    Ok(finish(content, original_prompt.to_string(), &terms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::provider::mock::ScriptedProvider;
    use crate::wire::{NarrativeAngle, NarrativeOption, WizardInput};

    const TEXT: &str = r##"{"texto":"Ninguém te conta isso sobre hack de rotina.","legenda":"A verdade","hashtags":["rotina","#Rotina","#foco"]}"##;
    const TEXT_V2: &str = r##"{"texto":"Versão mais curta.","legenda":"Curta","hashtags":["#foco"]}"##;

    fn narrative() -> NarrativeOption {
        NarrativeOption {
            id: "3-tradutor".into(),
            title: "Rotina sem mistério".into(),
            description: "d".into(),
            angle: NarrativeAngle::Tradutor,
            hook: None,
            core_belief: None,
            status_quo_challenged: None,
        }
    }

    #[tokio::test]
    async fn generate_validates_normalizes_and_screens() {
        let provider = ScriptedProvider::replying(&[TEXT]);
        let cfg = Config::default();
        let svc = ServiceCtx::new(&provider, &cfg);
        let mut input = WizardInput::new(ContentType::Text, "Rotina");
        input.negative_terms = vec!["hack".into()];
        let n = narrative();
        let sources = vec![RagSource { id: "doc-1".into(), title: "Ebook".into(), similarity: 0.9 }];

        let gen = generate_content(&svc, &PromptContext::new(&input).with_narrative(Some(&n)), &sources).await.unwrap();

        assert_eq!(gen.content.content_type(), ContentType::Text);
        assert_eq!(gen.content.hashtags(), ["#rotina".to_string(), "#foco".to_string()]);
        assert_eq!(gen.content.metadata().narrative_id.as_deref(), Some("3-tradutor"));
        assert_eq!(gen.content.metadata().rag_sources, sources);
        assert!(gen.warnings.iter().any(|w| w == "negative terms present: hack"));
        assert!(gen.prompt.contains("Rotina sem mistério"));
    }

    #[tokio::test]
    async fn refactor_replaces_draft_and_counts() {
        let provider = ScriptedProvider::replying(&[TEXT, TEXT_V2]);
        let cfg = Config::default();
        let svc = ServiceCtx::new(&provider, &cfg);
        let input = WizardInput::new(ContentType::Text, "Rotina");
        let n = narrative();
        let first = generate_content(&svc, &PromptContext::new(&input).with_narrative(Some(&n)), &[]).await.unwrap();

        let second = refactor_content(&svc, &first.prompt, &first.content, "mais curto", &[]).await.unwrap();
        assert_eq!(second.content.metadata().refactor_count, 1);
        assert_eq!(second.content.metadata().narrative_id.as_deref(), Some("3-tradutor"));
        assert_eq!(second.prompt, first.prompt);
        let last = provider.last_prompt();
        assert!(last.contains("Feedback do criador:\nmais curto"));
        assert!(last.contains("Ninguém te conta isso"));
    }

    #[tokio::test]
    async fn saved_draft_carries_prompt_and_terms_into_refactor() {
        let provider = ScriptedProvider::replying(&[TEXT, TEXT]);
        let cfg = Config::default();
        let svc = ServiceCtx::new(&provider, &cfg);
        let mut input = WizardInput::new(ContentType::Text, "Rotina");
        input.negative_terms = vec!["hack".into()];
        let n = narrative();
        let first = generate_content(&svc, &PromptContext::new(&input).with_narrative(Some(&n)), &[]).await.unwrap();

        // Round-trip through JSON the way the CLI hands a draft back in.
        let saved: GeneratedContent = serde_json::from_str(&serde_json::to_string(&first.content).unwrap()).unwrap();
        let original = saved.metadata().prompt.clone().unwrap();
        assert_eq!(original, first.prompt);

        let second = refactor_content(&svc, &original, &saved, "mais direto", &["guru".into()]).await.unwrap();
        let last = provider.last_prompt();
        assert!(last.contains("Rotina sem mistério"));
        assert!(last.contains("Tema: Rotina"));
        assert_eq!(second.content.metadata().negative_terms, vec!["hack", "guru"]);
        assert!(second.warnings.iter().any(|w| w == "negative terms present: hack"));
    }

    #[tokio::test]
    async fn invalid_carousel_is_not_retried() {
        let provider = ScriptedProvider::replying(&[r#"{"throughline":"t"}"#]);
        let cfg = Config::default();
        let svc = ServiceCtx::new(&provider, &cfg);
        let input = WizardInput::new(ContentType::Carousel, "Tema");
        let err = generate_content(&svc, &PromptContext::new(&input), &[]).await.unwrap_err();
        assert!(matches!(err, WizardError::Validation(ref v) if v.field == "valor_central"));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn empty_feedback_is_rejected_without_a_call() {
        let provider = ScriptedProvider::replying(&[TEXT]);
        let cfg = Config::default();
        let svc = ServiceCtx::new(&provider, &cfg);
        let input = WizardInput::new(ContentType::Text, "Rotina");
        let first = generate_content(&svc, &PromptContext::new(&input), &[]).await.unwrap();
        let err = refactor_content(&svc, &first.prompt, &first.content, "  ", &[]).await.unwrap_err();
        assert!(matches!(err, WizardError::Validation(_)));
        assert_eq!(provider.calls(), 1);
    }
}
