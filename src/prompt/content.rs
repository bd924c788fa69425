use super::{brief, narrative_block, negative_terms_block, rag_block, transcript_block, PromptContext};
use crate::validate::{MAX_CAPTION_WORDS, MAX_SLIDE_BODY_CHARS, MAX_SLIDE_TITLE_WORDS, MIN_CAPTION_WORDS};
use crate::wire::SlideKind;

const DEFAULT_SLIDES: u32 = 7;

fn caption_rules() -> String {
    format!(
"Legenda:
- Entre {MIN_CAPTION_WORDS} e {MAX_CAPTION_WORDS} palavras.
- Abra com o gancho, desenvolva o throughline e feche com uma pergunta ou CTA.
- Hashtags fora da legenda, no campo \"hashtags\" (de 5 a 10, todas começando com #)."
    )
}

fn shared_sections(ctx: &PromptContext<'_>) -> String {
    format!(
        "{brief}{narrative}{rag}{transcript}{negatives}",
        brief = brief(ctx.input),
        narrative = narrative_block(ctx.narrative),
        rag = rag_block(ctx.rag_context),
        transcript = transcript_block(ctx.transcript),
        negatives = negative_terms_block(&ctx.input.negative_terms),
    )
}

pub fn carousel_prompt(ctx: &PromptContext<'_>) -> String {
    let slides = ctx.input.slide_count.unwrap_or(DEFAULT_SLIDES).clamp(3, 12);
    let kinds = SlideKind::ALL.iter().map(|k| format!("\"{}\"", k.as_str())).collect::<Vec<_>>().join(" | ");
    format!(
"{shared}
Crie um CARROSSEL com {slides} slides (além da capa).

Regras dos slides:
- \"titulo\": no máximo {MAX_SLIDE_TITLE_WORDS} palavras.
- \"corpo\": no máximo {MAX_SLIDE_BODY_CHARS} caracteres. Uma ideia por slide.
- \"tipo\": um de {kinds}.
- O último slide é sempre do tipo \"cta\".
- Todos os slides servem ao mesmo throughline.

{caption_rules}

Responda no formato:
{{
  \"throughline\": string,
  \"valor_central\": string,
  \"capa\": {{ \"titulo\": string, \"subtitulo\": string }},
  \"slides\": [
    {{ \"numero\": number, \"tipo\": string, \"titulo\": string, \"corpo\": string, \"imagem_sugerida\": string }}
  ],
  \"legenda\": string,
  \"hashtags\": [string]
}}",
        shared = shared_sections(ctx),
        caption_rules = caption_rules(),
    )
}

pub fn text_prompt(ctx: &PromptContext<'_>) -> String {
    format!(
"{shared}
Crie um POST DE TEXTO (formato thread/LinkedIn).
- \"texto\": o post completo, parágrafos curtos separados por linha em branco, de 150 a 300 palavras.
- \"legenda\": versão curta para a primeira linha visível (até 2 frases).
- \"hashtags\": de 3 a 6, todas começando com #.

Responda no formato:
{{
  \"texto\": string,
  \"legenda\": string,
  \"hashtags\": [string]
}}",
        shared = shared_sections(ctx),
    )
}

pub fn image_prompt(ctx: &PromptContext<'_>) -> String {
    format!(
"{shared}
Crie um POST DE IMAGEM ÚNICA.
- \"prompt_imagem\": descrição em inglês para um gerador de imagens (estilo, composição, luz, sem texto na imagem).
- \"texto_imagem\": frase curta (até 12 palavras) para sobrepor na imagem.
- \"legenda\": de 80 a 200 palavras.
- \"hashtags\": de 5 a 10, todas começando com #.

Responda no formato:
{{
  \"prompt_imagem\": string,
  \"texto_imagem\": string,
  \"legenda\": string,
  \"hashtags\": [string]
}}",
        shared = shared_sections(ctx),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ContentType, NarrativeAngle, NarrativeOption, WizardInput};

    #[test]
    fn carousel_prompt_embeds_limits_and_narrative() {
        let mut input = WizardInput::new(ContentType::Carousel, "Hábitos");
        input.slide_count = Some(40);
        let narrative = NarrativeOption {
            id: "n2".into(),
            title: "O mito da motivação".into(),
            description: "Motivação é consequência".into(),
            angle: NarrativeAngle::Herege,
            hook: Some("Motivação é superestimada".into()),
            core_belief: None,
            status_quo_challenged: None,
        };
        let p = carousel_prompt(&PromptContext::new(&input).with_narrative(Some(&narrative)).with_rag(Some("doc")));
        assert!(p.contains("com 12 slides"));
        assert!(p.contains("no máximo 130 caracteres"));
        assert!(p.contains("no máximo 6 palavras"));
        assert!(p.contains("\"principio\""));
        assert!(p.contains("- Gancho: Motivação é superestimada"));
        assert!(p.contains("<referencia>\ndoc\n</referencia>"));
        assert!(p.contains("Entre 200 e 400 palavras"));
    }
}
