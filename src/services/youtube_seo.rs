use super::ServiceCtx;
use crate::errors::WizardError;
use crate::prompt::video::{script_outline, youtube_seo_prompt};
use crate::validate::validate_youtube_seo;
use crate::wire::{ServiceResult, VideoScriptStructured, YoutubeSeo};

/// YouTube tags are plain search terms; strip any `#` the model adds and drop repeats.
fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in tags {
        let plain = t.trim().trim_start_matches('#').split_whitespace().collect::<Vec<_>>().join(" ");
        if !plain.is_empty() && !out.iter().any(|o| o.to_lowercase() == plain.to_lowercase()) {
            out.push(plain);
        }
    }
    out
}

async fn seo(
    svc: &ServiceCtx<'_>,
    title: &str,
    script: &VideoScriptStructured,
    transcript: Option<&str>,
) -> Result<YoutubeSeo, WizardError> {
    let req = svc.request(youtube_seo_prompt(title, &script_outline(script), transcript));
    let (value, _) = svc.call_json("youtube_seo", &req).await?;
    let mut out = validate_youtube_seo(&value)?;
    out.tags = clean_tags(out.tags);
    Ok(out)
}

pub async fn generate_youtube_seo(
    svc: &ServiceCtx<'_>,
    title: &str,
    script: &VideoScriptStructured,
    transcript: Option<&str>,
) -> ServiceResult<YoutubeSeo> {
    seo(svc, title, script, transcript).await.into()
}
