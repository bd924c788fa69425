use super::ServiceCtx;
use crate::errors::WizardError;
use crate::prompt::assets::thumbnail_prompt;
use crate::render::is_hex_color;
use crate::validate::validate_thumbnail;
use crate::wire::{GeneratedContent, ServiceResult, ThumbnailSpec};

const FALLBACK_COLORS: [&str; 2] = ["#111111", "#FFD400"];

async fn thumbnail(svc: &ServiceCtx<'_>, content: &GeneratedContent, style: Option<&str>) -> Result<ThumbnailSpec, WizardError> {
    let req = svc.request(thumbnail_prompt(content, style));
    let (value, _) = svc.call_json("thumbnail", &req).await?;
    let mut spec = validate_thumbnail(&value)?;
    spec.cores.retain(|c| is_hex_color(c.trim()));
    if spec.cores.len() < 2 {
        spec.cores = FALLBACK_COLORS.iter().map(|c| c.to_string()).collect();
    }
    Ok(spec)
}

pub async fn generate_thumbnail(
    svc: &ServiceCtx<'_>,
    content: &GeneratedContent,
    style: Option<&str>,
) -> ServiceResult<ThumbnailSpec> {
    thumbnail(svc, content, style).await.into()
}
