use tracing::warn;

use super::ServiceCtx;
use crate::errors::WizardError;
use crate::prompt::{narratives_prompt, PromptContext};
use crate::validate::validate_narratives;
use crate::wire::{NarrativeAngle, NarrativeOption};

/// Ask the model for one narrative per angle. Fewer than four is accepted with a warning.
pub async fn generate_narratives(svc: &ServiceCtx<'_>, ctx: &PromptContext<'_>) -> Result<Vec<NarrativeOption>, WizardError> {
    let req = svc.request(narratives_prompt(ctx));
    let (value, _) = svc.call_json("narratives", &req).await?;
    let mut options = validate_narratives(&value)?;

    let missing: Vec<&str> = NarrativeAngle::ALL
        .iter()
        .filter(|a| !options.iter().any(|o| o.angle == **a))
        .map(|a| a.as_str())
        .collect();
    if !missing.is_empty() {
        warn!(?missing, "model skipped narrative angles");
    }

    // Models sometimes reuse ids across options; selection needs them unique.
    for (i, opt) in options.iter_mut().enumerate() {
        opt.id = format!("{}-{}", i + 1, opt.angle);
    }
    Ok(options)
}
