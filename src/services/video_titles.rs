use super::ServiceCtx;
use crate::errors::WizardError;
use crate::prompt::video::{script_outline, video_titles_prompt};
use crate::validate::validate_video_titles;
use crate::wire::{ServiceResult, VideoScriptStructured, VideoTitle};

pub const DEFAULT_TITLE_COUNT: usize = 5;

async fn titles(svc: &ServiceCtx<'_>, theme: &str, outline: &str, count: usize) -> Result<Vec<VideoTitle>, WizardError> {
    let req = svc.request(video_titles_prompt(theme, outline, count));
    let (value, _) = svc.call_json("video_titles", &req).await?;
    let mut out = validate_video_titles(&value)?;
    out.truncate(count.max(1));
    Ok(out)
}

pub async fn generate_video_titles(
    svc: &ServiceCtx<'_>,
    theme: &str,
    script: &VideoScriptStructured,
    count: usize,
) -> ServiceResult<Vec<VideoTitle>> {
    titles(svc, theme, &script_outline(script), count).await.into()
}
