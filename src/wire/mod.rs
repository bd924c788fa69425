use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ========================================
/// Wizard data model
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    Carousel,
    Video,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [ContentType::Text, ContentType::Image, ContentType::Carousel, ContentType::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
            ContentType::Carousel => "carousel",
            ContentType::Video => "video",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Text => "Post de texto",
            ContentType::Image => "Post com imagem",
            ContentType::Carousel => "Carrossel",
            ContentType::Video => "Roteiro de vídeo",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeAngle {
    Herege,
    Visionario,
    Tradutor,
    Testemunha,
}

impl NarrativeAngle {
    pub const ALL: [NarrativeAngle; 4] = [
        NarrativeAngle::Herege,
        NarrativeAngle::Visionario,
        NarrativeAngle::Tradutor,
        NarrativeAngle::Testemunha,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NarrativeAngle::Herege => "herege",
            NarrativeAngle::Visionario => "visionario",
            NarrativeAngle::Tradutor => "tradutor",
            NarrativeAngle::Testemunha => "testemunha",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }

    /// One-line stance handed to the model so every angle reads differently.
    pub fn stance(&self) -> &'static str {
        match self {
            NarrativeAngle::Herege => "desafia uma crença dominante do nicho e prova que o consenso está errado",
            NarrativeAngle::Visionario => "aponta para onde o mercado está indo e convida a tribo a chegar lá primeiro",
            NarrativeAngle::Tradutor => "pega algo complexo e traduz em linguagem simples e aplicável",
            NarrativeAngle::Testemunha => "conta uma experiência vivida em primeira pessoa e extrai a lição",
        }
    }
}

impl fmt::Display for NarrativeAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeOption {
    pub id: String,
    pub title: String,
    pub description: String,
    pub angle: NarrativeAngle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_belief: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_quo_challenged: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    Problema,
    Conceito,
    Passo,
    Exemplo,
    Erro,
    Principio,
    Cta,
}

impl SlideKind {
    pub const ALL: [SlideKind; 7] = [
        SlideKind::Problema,
        SlideKind::Conceito,
        SlideKind::Passo,
        SlideKind::Exemplo,
        SlideKind::Erro,
        SlideKind::Principio,
        SlideKind::Cta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlideKind::Problema => "problema",
            SlideKind::Conceito => "conceito",
            SlideKind::Passo => "passo",
            SlideKind::Exemplo => "exemplo",
            SlideKind::Erro => "erro",
            SlideKind::Principio => "principio",
            SlideKind::Cta => "cta",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarouselCover {
    pub titulo: String,
    pub subtitulo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarouselSlide {
    #[serde(default)]
    pub numero: u32,
    pub tipo: SlideKind,
    pub titulo: String,
    pub corpo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagem_sugerida: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarouselResponse {
    pub throughline: String,
    pub valor_central: String,
    pub capa: CarouselCover,
    pub slides: Vec<CarouselSlide>,
    pub legenda: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPost {
    pub texto: String,
    pub legenda: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePost {
    pub prompt_imagem: String,
    #[serde(default)]
    pub texto_imagem: String,
    pub legenda: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMeta {
    pub duracao_estimada: String,
    pub angulo: String,
    pub valor_central: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoThumbnail {
    pub titulo: String,
    pub expressao: String,
    pub texto_overlay: String,
    #[serde(default)]
    pub cores: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSection {
    pub topico: String,
    pub fala: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roteiro {
    pub hook: String,
    pub desenvolvimento: Vec<ScriptSection>,
    pub cta: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoScriptStructured {
    pub meta: VideoMeta,
    pub thumbnail: VideoThumbnail,
    pub roteiro: Roteiro,
    #[serde(default)]
    pub notas_producao: String,
    pub caption: String,
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub model: String,
    #[serde(default)]
    pub rag_sources: Vec<RagSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_id: Option<String>,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub refactor_count: u32,
    /// Prompt of the first generation. Refactors of a saved draft start from it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub negative_terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeneratedContent {
    Text { post: TextPost, metadata: ContentMetadata },
    Image { post: ImagePost, metadata: ContentMetadata },
    Carousel { carousel: CarouselResponse, metadata: ContentMetadata },
    Video { script: VideoScriptStructured, metadata: ContentMetadata },
}

impl GeneratedContent {
    pub fn content_type(&self) -> ContentType {
        match self {
            GeneratedContent::Text { .. } => ContentType::Text,
            GeneratedContent::Image { .. } => ContentType::Image,
            GeneratedContent::Carousel { .. } => ContentType::Carousel,
            GeneratedContent::Video { .. } => ContentType::Video,
        }
    }

    pub fn metadata(&self) -> &ContentMetadata {
        match self {
            GeneratedContent::Text { metadata, .. }
            | GeneratedContent::Image { metadata, .. }
            | GeneratedContent::Carousel { metadata, .. }
            | GeneratedContent::Video { metadata, .. } => metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ContentMetadata {
        match self {
            GeneratedContent::Text { metadata, .. }
            | GeneratedContent::Image { metadata, .. }
            | GeneratedContent::Carousel { metadata, .. }
            | GeneratedContent::Video { metadata, .. } => metadata,
        }
    }

    pub fn caption(&self) -> &str {
        match self {
            GeneratedContent::Text { post, .. } => &post.legenda,
            GeneratedContent::Image { post, .. } => &post.legenda,
            GeneratedContent::Carousel { carousel, .. } => &carousel.legenda,
            GeneratedContent::Video { script, .. } => &script.caption,
        }
    }

    pub fn hashtags(&self) -> &[String] {
        match self {
            GeneratedContent::Text { post, .. } => &post.hashtags,
            GeneratedContent::Image { post, .. } => &post.hashtags,
            GeneratedContent::Carousel { carousel, .. } => &carousel.hashtags,
            GeneratedContent::Video { script, .. } => &script.hashtags,
        }
    }

    /// Edit-buffer overwrite of the caption; everything else stays as generated.
    pub fn set_caption(&mut self, caption: String) {
        match self {
            GeneratedContent::Text { post, .. } => post.legenda = caption,
            GeneratedContent::Image { post, .. } => post.legenda = caption,
            GeneratedContent::Carousel { carousel, .. } => carousel.legenda = caption,
            GeneratedContent::Video { script, .. } => script.caption = caption,
        }
    }

    pub fn set_hashtags(&mut self, hashtags: Vec<String>) {
        match self {
            GeneratedContent::Text { post, .. } => post.hashtags = hashtags,
            GeneratedContent::Image { post, .. } => post.hashtags = hashtags,
            GeneratedContent::Carousel { carousel, .. } => carousel.hashtags = hashtags,
            GeneratedContent::Video { script, .. } => script.hashtags = hashtags,
        }
    }

    /// The LLM-facing JSON body, without the wizard's metadata.
    pub fn body_json(&self) -> serde_json::Value {
        let body = match self {
            GeneratedContent::Text { post, .. } => serde_json::to_value(post),
            GeneratedContent::Image { post, .. } => serde_json::to_value(post),
            GeneratedContent::Carousel { carousel, .. } => serde_json::to_value(carousel),
            GeneratedContent::Video { script, .. } => serde_json::to_value(script),
        };
        body.unwrap_or(serde_json::Value::Null)
    }

    /// Every user-visible string, used for negative-term screening.
    pub fn visible_text(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        match self {
            GeneratedContent::Text { post, .. } => {
                out.push(&post.texto);
                out.push(&post.legenda);
            }
            GeneratedContent::Image { post, .. } => {
                out.push(&post.texto_imagem);
                out.push(&post.legenda);
            }
            GeneratedContent::Carousel { carousel, .. } => {
                out.push(&carousel.capa.titulo);
                out.push(&carousel.capa.subtitulo);
                for s in &carousel.slides {
                    out.push(&s.titulo);
                    out.push(&s.corpo);
                }
                out.push(&carousel.legenda);
            }
            GeneratedContent::Video { script, .. } => {
                out.push(&script.thumbnail.texto_overlay);
                out.push(&script.roteiro.hook);
                for s in &script.roteiro.desenvolvimento {
                    out.push(&s.fala);
                }
                out.push(&script.roteiro.cta);
                out.push(&script.caption);
            }
        }
        out
    }
}

/// Retrieval parameters chosen in the inputs step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default)]
    pub document_ids: Vec<String>,
    #[serde(default)]
    pub collection_ids: Vec<String>,
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f32,
}

fn default_max_chunks() -> usize { 10 }
fn default_max_tokens() -> usize { 3000 }
fn default_threshold() -> f32 { 0.5 }

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            document_ids: Vec::new(),
            collection_ids: Vec::new(),
            max_chunks: default_max_chunks(),
            max_tokens: default_max_tokens(),
            similarity_threshold: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSource {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResult {
    pub context: String,
    pub token_count: usize,
    pub sources: Vec<RagSource>,
}

/// Envelope every service hands back to the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ServiceResult<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    /// Successful call that produced nothing; the pipeline continues without it.
    pub fn empty() -> Self {
        Self { success: true, data: None, error: None }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()) }
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for ServiceResult<T> {
    fn from(r: Result<T, E>) -> Self {
        match r {
            Ok(v) => ServiceResult::ok(v),
            Err(e) => ServiceResult::fail(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardInput {
    pub content_type: ContentType,
    pub theme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default)]
    pub negative_terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag: Option<RagConfig>,
}

impl WizardInput {
    pub fn new(content_type: ContentType, theme: impl Into<String>) -> Self {
        Self {
            content_type,
            theme: theme.into(),
            context: None,
            objective: None,
            audience: None,
            negative_terms: Vec::new(),
            slide_count: None,
            video_duration: None,
            reference_url: None,
            rag: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoTitle {
    pub titulo: String,
    pub gatilho: String,
    #[serde(default)]
    pub justificativa: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoutubeChapter {
    pub tempo: String,
    pub titulo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoutubeSeo {
    pub titulo: String,
    pub descricao: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub capitulos: Vec<YoutubeChapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailSpec {
    pub texto: String,
    #[serde(default)]
    pub subtexto: String,
    pub estilo: String,
    pub prompt_imagem: String,
    #[serde(default)]
    pub cores: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta() -> ContentMetadata {
        ContentMetadata {
            model: "test/model".into(),
            rag_sources: vec![],
            narrative_id: Some("n1".into()),
            generated_at: Utc::now(),
            refactor_count: 0,
            prompt: None,
            negative_terms: vec![],
        }
    }

    #[test]
    fn generated_content_is_tagged_by_type() {
        let content = GeneratedContent::Text {
            post: TextPost { texto: "corpo".into(), legenda: "legenda".into(), hashtags: vec!["#a".into()] },
            metadata: meta(),
        };
        let v = serde_json::to_value(&content).unwrap();
        assert_eq!(v["type"], "text");
        assert_eq!(v["post"]["texto"], "corpo");
        let back: GeneratedContent = serde_json::from_value(v).unwrap();
        assert_eq!(back.content_type(), ContentType::Text);
    }

    #[test]
    fn edit_buffer_overwrites_caption_only() {
        let mut content = GeneratedContent::Image {
            post: ImagePost {
                prompt_imagem: "foto".into(),
                texto_imagem: "texto".into(),
                legenda: "antes".into(),
                hashtags: vec![],
            },
            metadata: meta(),
        };
        content.set_caption("depois".into());
        content.set_hashtags(vec!["#novo".into()]);
        assert_eq!(content.caption(), "depois");
        assert_eq!(content.hashtags(), ["#novo".to_string()]);
        assert_eq!(content.body_json()["prompt_imagem"], "foto");
    }

    #[test]
    fn narrative_optional_fields_default_to_none() {
        let n: NarrativeOption = serde_json::from_value(json!({
            "id": "1", "title": "t", "description": "d", "angle": "tradutor"
        }))
        .unwrap();
        assert_eq!(n.angle, NarrativeAngle::Tradutor);
        assert!(n.hook.is_none());
        assert_eq!(NarrativeAngle::parse("visionario"), Some(NarrativeAngle::Visionario));
        assert_eq!(NarrativeAngle::parse("rebelde"), None);
    }

    #[test]
    fn service_result_from_result() {
        let ok: ServiceResult<u32> = Ok::<u32, String>(3).into();
        assert!(ok.success);
        assert_eq!(ok.data, Some(3));
        let err: ServiceResult<u32> = Err::<u32, String>("boom".into()).into();
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("boom"));
        let v = serde_json::to_value(ServiceResult::<u32>::empty()).unwrap();
        assert_eq!(v, json!({ "success": true }));
    }
}
