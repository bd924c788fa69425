use crate::wire::GeneratedContent;

/// Headline material the thumbnail should be built around.
fn thumbnail_subject(content: &GeneratedContent) -> String {
    match content {
        GeneratedContent::Carousel { carousel, .. } => {
            format!("Capa: {} / {}\nThroughline: {}", carousel.capa.titulo, carousel.capa.subtitulo, carousel.throughline)
        }
        GeneratedContent::Video { script, .. } => format!(
            "Título: {}\nTexto sugerido: {}\nExpressão: {}\nHook: {}",
            script.thumbnail.titulo, script.thumbnail.texto_overlay, script.thumbnail.expressao, script.roteiro.hook
        ),
        GeneratedContent::Text { post, .. } => {
            let opening: String = post.texto.chars().take(400).collect();
            format!("Abertura do post: {opening}")
        }
        GeneratedContent::Image { post, .. } => {
            format!("Texto da imagem: {}\nCena: {}", post.texto_imagem, post.prompt_imagem)
        }
    }
}

pub fn thumbnail_prompt(content: &GeneratedContent, style_hint: Option<&str>) -> String {
    let style = style_hint.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("alto contraste, tipografia bold, fundo limpo");
    format!(
"Crie a thumbnail/capa visual para este conteúdo ({kind}).

{subject}

Estilo desejado: {style}

Regras:
- \"texto\": até 4 palavras, em CAIXA ALTA, legível em tamanho pequeno.
- \"subtexto\": opcional, até 6 palavras.
- \"estilo\": descrição curta do estilo visual.
- \"prompt_imagem\": descrição em inglês para um gerador de imagens, sem texto na imagem.
- \"cores\": 2 ou 3 cores em hexadecimal (#RRGGBB), a primeira é o fundo.

Responda no formato:
{{
  \"texto\": string,
  \"subtexto\": string,
  \"estilo\": string,
  \"prompt_imagem\": string,
  \"cores\": [string]
}}",
        kind = content.content_type().label(),
        subject = thumbnail_subject(content),
    )
}
