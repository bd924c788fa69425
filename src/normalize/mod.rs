use crate::wire::GeneratedContent;
use std::collections::HashSet;

/// `#Tag` form: leading `#`, no inner whitespace. Empty input yields `None`.
pub fn normalize_hashtag(raw: &str) -> Option<String> {
    let body: String = raw.trim().trim_start_matches('#').split_whitespace().collect();
    if body.is_empty() {
        None
    } else {
        Some(format!("#{body}"))
    }
}

/// Normalize and dedupe hashtags (case-insensitive, first spelling wins).
pub fn clean_hashtags(tags: &[String]) -> (Vec<String>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for t in tags {
        match normalize_hashtag(t) {
            None => warnings.push("dropped empty hashtag".to_string()),
            Some(tag) => {
                if seen.insert(tag.to_lowercase()) {
                    out.push(tag);
                } else {
                    warnings.push(format!("dropped duplicate hashtag {tag}"));
                }
            }
        }
    }
    (out, warnings)
}

/// Tidy LLM output in place: hashtags, slide numbering, stray whitespace.
/// Returns human-readable warnings about what was changed.
pub fn sanitize(content: &mut GeneratedContent) -> Vec<String> {
    let (tags, mut warnings) = clean_hashtags(content.hashtags());
    content.set_hashtags(tags);

    match content {
        GeneratedContent::Carousel { carousel, .. } => {
            for (i, slide) in carousel.slides.iter_mut().enumerate() {
                let expected = i as u32 + 1;
                if slide.numero != expected {
                    warnings.push(format!("renumbered slide {} to {}", slide.numero, expected));
                    slide.numero = expected;
                }
                slide.titulo = slide.titulo.trim().to_string();
                slide.corpo = slide.corpo.trim().to_string();
            }
            carousel.legenda = carousel.legenda.trim().to_string();
        }
        GeneratedContent::Text { post, .. } => {
            post.texto = post.texto.trim().to_string();
            post.legenda = post.legenda.trim().to_string();
        }
        GeneratedContent::Image { post, .. } => {
            post.legenda = post.legenda.trim().to_string();
            post.texto_imagem = post.texto_imagem.trim().to_string();
        }
        GeneratedContent::Video { script, .. } => {
            script.caption = script.caption.trim().to_string();
            script.roteiro.desenvolvimento.retain(|s| {
                let keep = !s.fala.trim().is_empty();
                if !keep {
                    warnings.push(format!("dropped empty script section '{}'", s.topico));
                }
                keep
            });
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{CarouselCover, CarouselResponse, CarouselSlide, ContentMetadata, SlideKind};
    use chrono::Utc;

    #[test]
    fn hashtags_are_prefixed_and_deduped() {
        let raw: Vec<String> = ["marketing", "#Marketing", "  ", "# tribo digital", "#Vendas"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (tags, warnings) = clean_hashtags(&raw);
        assert_eq!(tags, vec!["#marketing", "#tribodigital", "#Vendas"]);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn carousel_slides_are_renumbered() {
        let slide = |n: u32| CarouselSlide {
            numero: n,
            tipo: SlideKind::Passo,
            titulo: " Passo ".into(),
            corpo: "corpo".into(),
            imagem_sugerida: None,
        };
        let mut content = GeneratedContent::Carousel {
            carousel: CarouselResponse {
                throughline: "t".into(),
                valor_central: "v".into(),
                capa: CarouselCover { titulo: "c".into(), subtitulo: "s".into() },
                slides: vec![slide(1), slide(5)],
                legenda: "leg".into(),
                hashtags: vec!["a".into()],
            },
            metadata: ContentMetadata {
                model: "m".into(),
                rag_sources: vec![],
                narrative_id: None,
                generated_at: Utc::now(),
                refactor_count: 0,
                prompt: None,
                negative_terms: vec![],
            },
        };
        let warnings = sanitize(&mut content);
        assert_eq!(warnings, vec!["renumbered slide 5 to 2".to_string()]);
        let GeneratedContent::Carousel { carousel, .. } = &content else { panic!("type changed") };
        assert_eq!(carousel.slides[1].numero, 2);
        assert_eq!(carousel.slides[0].titulo, "Passo");
        assert_eq!(carousel.hashtags, vec!["#a"]);
    }
}
