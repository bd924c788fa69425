use super::{brief, narrative_block, negative_terms_block, rag_block, transcript_block, PromptContext};
use crate::wire::VideoScriptStructured;

fn duration_or_default<'a>(ctx: &PromptContext<'a>) -> &'a str {
    ctx.input.video_duration.as_deref().filter(|d| !d.trim().is_empty()).unwrap_or("60 segundos")
}

pub fn video_script_prompt(ctx: &PromptContext<'_>) -> String {
    format!(
"{brief}{narrative}{rag}{transcript}{negatives}
Crie um ROTEIRO DE VÍDEO com duração de {duration}.

Estrutura obrigatória:
- \"roteiro.hook\": a primeira frase, dita nos 3 primeiros segundos. Quebra de padrão, sem saudação.
- \"roteiro.desenvolvimento\": blocos em ordem; cada um com \"topico\", \"fala\" (o texto falado, natural, em primeira pessoa) e \"visual\" (o que aparece na tela).
- \"roteiro.cta\": chamada para ação coerente com o throughline, sem pedir \"like\".
- \"thumbnail\": título curto (até 5 palavras), expressão facial sugerida, texto de sobreposição (até 4 palavras) e paleta de cores.
- \"notas_producao\": dicas de gravação e edição (cortes, b-roll, ritmo).
- \"caption\": legenda para a publicação, de 80 a 200 palavras.
- \"hashtags\": de 5 a 10, todas começando com #.

Responda no formato:
{{
  \"meta\": {{ \"duracao_estimada\": string, \"angulo\": string, \"valor_central\": string }},
  \"thumbnail\": {{ \"titulo\": string, \"expressao\": string, \"texto_overlay\": string, \"cores\": [string] }},
  \"roteiro\": {{
    \"hook\": string,
    \"desenvolvimento\": [ {{ \"topico\": string, \"fala\": string, \"visual\": string }} ],
    \"cta\": string
  }},
  \"notas_producao\": string,
  \"caption\": string,
  \"hashtags\": [string]
}}",
        brief = brief(ctx.input),
        narrative = narrative_block(ctx.narrative),
        rag = rag_block(ctx.rag_context),
        transcript = transcript_block(ctx.transcript),
        negatives = negative_terms_block(&ctx.input.negative_terms),
        duration = duration_or_default(ctx),
    )
}

/// Compact plain-text rendering of a script, used as context by the title and SEO prompts.
pub fn script_outline(script: &VideoScriptStructured) -> String {
    let mut s = format!("Hook: {}\n", script.roteiro.hook);
    for (i, sec) in script.roteiro.desenvolvimento.iter().enumerate() {
        s.push_str(&format!("{}. {} — {}\n", i + 1, sec.topico, sec.fala));
    }
    s.push_str(&format!("CTA: {}\n", script.roteiro.cta));
    s
}

pub fn video_titles_prompt(theme: &str, outline: &str, count: usize) -> String {
    let count = count.clamp(1, 20);
    format!(
"Tema do vídeo: {theme}

Roteiro:
{outline}

Gere {count} títulos para YouTube.
- Até 60 caracteres cada.
- Cada título usa um gatilho diferente (curiosidade, contraste, número, pergunta, promessa, erro comum...).
- Nada de clickbait que o vídeo não entrega.

Responda no formato:
{{
  \"titulos\": [ {{ \"titulo\": string, \"gatilho\": string, \"justificativa\": string }} ]
}}",
        theme = theme.trim(),
        outline = outline.trim(),
    )
}

pub fn youtube_seo_prompt(title: &str, outline: &str, transcript: Option<&str>) -> String {
    format!(
"Título do vídeo: {title}

Roteiro:
{outline}
{transcript}
Gere o pacote de SEO para o YouTube:
- \"titulo\": versão final otimizada (até 70 caracteres).
- \"descricao\": de 150 a 300 palavras; as duas primeiras linhas resumem a promessa do vídeo.
- \"tags\": de 10 a 20 termos de busca, sem #.
- \"capitulos\": marcações de tempo no formato \"0:00\", a primeira sempre em 0:00.

Responda no formato:
{{
  \"titulo\": string,
  \"descricao\": string,
  \"tags\": [string],
  \"capitulos\": [ {{ \"tempo\": string, \"titulo\": string }} ]
}}",
        title = title.trim(),
        outline = outline.trim(),
        transcript = transcript_block(transcript),
    )
}
