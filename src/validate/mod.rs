use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::wire::{
    CarouselResponse, ImagePost, NarrativeAngle, NarrativeOption, SlideKind, TextPost, ThumbnailSpec,
    VideoScriptStructured, VideoTitle, YoutubeSeo,
};

pub const MAX_SLIDE_BODY_CHARS: usize = 130;
pub const MAX_SLIDE_TITLE_WORDS: usize = 6;
pub const MIN_CAPTION_WORDS: usize = 200;
pub const MAX_CAPTION_WORDS: usize = 400;

/// First field of an LLM response that broke its contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub expected: String,
    pub received: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, expected: impl Into<String>, received: impl Into<String>) -> Self {
        Self { field: field.into(), expected: expected.into(), received: received.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid field `{}`: expected {}, received {}", self.field, self.expected, self.received)
    }
}

impl std::error::Error for ValidationError {}

pub type Validated<T> = Result<T, ValidationError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeValidation<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ValidationError>,
}

/// Run a validator without propagating: violations come back as `success: false`.
pub fn safe_validate<T>(validator: impl FnOnce(&Value) -> Validated<T>, value: &Value) -> SafeValidation<T> {
    match validator(value) {
        Ok(data) => SafeValidation { success: true, data: Some(data), error: None },
        Err(e) => SafeValidation { success: false, data: None, error: Some(e) },
    }
}

pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

fn describe(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => "nothing".to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => "empty string".to_string(),
        Some(Value::String(s)) => {
            let short: String = s.chars().take(40).collect();
            if short.len() < s.len() { format!("\"{short}…\"") } else { format!("\"{short}\"") }
        }
        Some(Value::Array(a)) => format!("array of {}", a.len()),
        Some(Value::Object(_)) => "object".to_string(),
        Some(other) => other.to_string(),
    }
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |v, key| v.get(key))
}

fn require_str<'a>(root: &'a Value, path: &str) -> Validated<&'a str> {
    let v = lookup(root, path);
    match v.and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ValidationError::new(path, "non-empty string", describe(v))),
    }
}

fn require_array<'a>(root: &'a Value, path: &str) -> Validated<&'a Vec<Value>> {
    let v = lookup(root, path);
    match v.and_then(Value::as_array) {
        Some(a) if !a.is_empty() => Ok(a),
        _ => Err(ValidationError::new(path, "non-empty array", describe(v))),
    }
}

fn require_string_array(root: &Value, path: &str) -> Validated<()> {
    let items = require_array(root, path)?;
    for (i, item) in items.iter().enumerate() {
        if !item.as_str().map(|s| !s.trim().is_empty()).unwrap_or(false) {
            return Err(ValidationError::new(format!("{path}[{i}]"), "non-empty string", describe(Some(item))));
        }
    }
    Ok(())
}

fn optional_string_array(root: &Value, path: &str) -> Validated<()> {
    match lookup(root, path) {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(a)) if a.is_empty() => Ok(()),
        Some(Value::Array(_)) => require_string_array(root, path),
        other => Err(ValidationError::new(path, "array of strings", describe(other))),
    }
}

fn require_word_range(root: &Value, path: &str, min: usize, max: usize) -> Validated<()> {
    let text = require_str(root, path)?;
    let words = word_count(text);
    if words < min || words > max {
        return Err(ValidationError::new(path, format!("between {min} and {max} words"), format!("{words} words")));
    }
    Ok(())
}

fn decode<T: DeserializeOwned>(value: &Value, what: &str) -> Validated<T> {
    serde_json::from_value(value.clone()).map_err(|e| ValidationError::new(what, "well-formed object", e.to_string()))
}

fn validate_slide(slide: &Value, i: usize) -> Validated<()> {
    let tipo = slide.get("tipo");
    match tipo.and_then(Value::as_str) {
        Some(t) if SlideKind::ALL.iter().any(|k| k.as_str() == t) => {}
        _ => {
            let allowed = SlideKind::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>().join("|");
            return Err(ValidationError::new(format!("slides[{i}].tipo"), format!("one of {allowed}"), describe(tipo)));
        }
    }

    let titulo = require_str(slide, "titulo").map_err(|e| at_slide(e, i))?;
    let words = word_count(titulo);
    if words > MAX_SLIDE_TITLE_WORDS {
        return Err(ValidationError::new(
            format!("slides[{i}].titulo"),
            format!("at most {MAX_SLIDE_TITLE_WORDS} words"),
            format!("{words} words"),
        ));
    }

    let corpo = require_str(slide, "corpo").map_err(|e| at_slide(e, i))?;
    let chars = corpo.chars().count();
    if chars > MAX_SLIDE_BODY_CHARS {
        return Err(ValidationError::new(
            format!("slides[{i}].corpo"),
            format!("at most {MAX_SLIDE_BODY_CHARS} characters"),
            format!("{chars} characters"),
        ));
    }
    Ok(())
}

fn at_slide(mut e: ValidationError, i: usize) -> ValidationError {
    e.field = format!("slides[{i}].{}", e.field);
    e
}

pub fn validate_carousel_response(v: &Value) -> Validated<CarouselResponse> {
    require_str(v, "throughline")?;
    require_str(v, "valor_central")?;
    require_str(v, "capa.titulo")?;
    require_str(v, "capa.subtitulo")?;
    let slides = require_array(v, "slides")?;
    for (i, slide) in slides.iter().enumerate() {
        validate_slide(slide, i)?;
    }
    require_word_range(v, "legenda", MIN_CAPTION_WORDS, MAX_CAPTION_WORDS)?;
    optional_string_array(v, "hashtags")?;

    let mut carousel: CarouselResponse = decode(v, "carousel")?;
    for (i, slide) in carousel.slides.iter_mut().enumerate() {
        if slide.numero == 0 {
            slide.numero = i as u32 + 1;
        }
    }
    Ok(carousel)
}

pub fn validate_text_response(v: &Value) -> Validated<TextPost> {
    require_str(v, "texto")?;
    require_str(v, "legenda")?;
    optional_string_array(v, "hashtags")?;
    decode(v, "text")
}

pub fn validate_image_response(v: &Value) -> Validated<ImagePost> {
    require_str(v, "prompt_imagem")?;
    require_str(v, "legenda")?;
    optional_string_array(v, "hashtags")?;
    decode(v, "image")
}

pub fn validate_video_script(v: &Value) -> Validated<VideoScriptStructured> {
    require_str(v, "meta.duracao_estimada")?;
    require_str(v, "meta.angulo")?;
    require_str(v, "meta.valor_central")?;
    require_str(v, "thumbnail.titulo")?;
    require_str(v, "thumbnail.expressao")?;
    require_str(v, "thumbnail.texto_overlay")?;
    require_str(v, "roteiro.hook")?;
    let sections = require_array(v, "roteiro.desenvolvimento")?;
    for (i, s) in sections.iter().enumerate() {
        for key in ["topico", "fala"] {
            require_str(s, key).map_err(|mut e| {
                e.field = format!("roteiro.desenvolvimento[{i}].{}", e.field);
                e
            })?;
        }
    }
    require_str(v, "roteiro.cta")?;
    require_str(v, "caption")?;
    require_string_array(v, "hashtags")?;
    decode(v, "video")
}

/// Accepts either `{"narratives": [...]}` or a bare array.
pub fn validate_narratives(v: &Value) -> Validated<Vec<NarrativeOption>> {
    let list = match v {
        Value::Array(_) => v,
        _ => v.get("narratives").unwrap_or(&Value::Null),
    };
    let items = match list.as_array() {
        Some(a) if !a.is_empty() => a,
        _ => return Err(ValidationError::new("narratives", "non-empty array", describe(Some(list)))),
    };
    for (i, item) in items.iter().enumerate() {
        for key in ["id", "title", "description"] {
            require_str(item, key).map_err(|mut e| {
                e.field = format!("narratives[{i}].{}", e.field);
                e
            })?;
        }
        let angle = item.get("angle");
        if angle.and_then(Value::as_str).and_then(NarrativeAngle::parse).is_none() {
            let allowed = NarrativeAngle::ALL.iter().map(|a| a.as_str()).collect::<Vec<_>>().join("|");
            return Err(ValidationError::new(format!("narratives[{i}].angle"), format!("one of {allowed}"), describe(angle)));
        }
    }
    decode(list, "narratives")
}

pub fn validate_video_titles(v: &Value) -> Validated<Vec<VideoTitle>> {
    let titles = require_array(v, "titulos")?;
    for (i, t) in titles.iter().enumerate() {
        require_str(t, "titulo").map_err(|mut e| {
            e.field = format!("titulos[{i}].{}", e.field);
            e
        })?;
    }
    decode(&v["titulos"], "titulos")
}

pub fn validate_youtube_seo(v: &Value) -> Validated<YoutubeSeo> {
    require_str(v, "titulo")?;
    require_str(v, "descricao")?;
    require_string_array(v, "tags")?;
    decode(v, "seo")
}

pub fn validate_thumbnail(v: &Value) -> Validated<ThumbnailSpec> {
    require_str(v, "texto")?;
    require_str(v, "estilo")?;
    require_str(v, "prompt_imagem")?;
    decode(v, "thumbnail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn words(n: usize) -> String {
        vec!["palavra"; n].join(" ")
    }

    fn carousel() -> Value {
        json!({
            "throughline": "Consistência vence intensidade",
            "valor_central": "Pequenos passos diários",
            "capa": { "titulo": "Pare de começar do zero", "subtitulo": "O método dos 3 minutos" },
            "slides": [
                { "tipo": "problema", "titulo": "Você recomeça toda segunda", "corpo": "E toda sexta desiste." },
                { "tipo": "cta", "titulo": "Salve este post", "corpo": "Volte aqui amanhã." }
            ],
            "legenda": words(200),
            "hashtags": ["#habitos", "#rotina"]
        })
    }

    #[test]
    fn accepts_well_formed_carousel_and_numbers_slides() {
        let c = validate_carousel_response(&carousel()).unwrap();
        assert_eq!(c.slides.len(), 2);
        assert_eq!(c.slides[1].numero, 2);
        assert_eq!(c.slides[0].tipo, SlideKind::Problema);
    }

    #[test]
    fn rejects_missing_required_carousel_fields() {
        for path in ["throughline", "valor_central", "capa.titulo", "capa.subtitulo"] {
            let mut v = carousel();
            let mut parts = path.split('.').collect::<Vec<_>>();
            let last = parts.pop().unwrap();
            let mut target = &mut v;
            for p in parts {
                target = target.get_mut(p).unwrap();
            }
            target.as_object_mut().unwrap().remove(last);
            let err = validate_carousel_response(&v).unwrap_err();
            assert_eq!(err.field, path);
        }
    }

    #[test]
    fn rejects_empty_slides() {
        let mut v = carousel();
        v["slides"] = json!([]);
        let err = validate_carousel_response(&v).unwrap_err();
        assert_eq!(err.field, "slides");
        assert_eq!(err.received, "array of 0");
    }

    #[test]
    fn slide_body_limit_is_130_characters() {
        let mut v = carousel();
        v["slides"][0]["corpo"] = json!("é".repeat(130));
        assert!(validate_carousel_response(&v).is_ok());
        v["slides"][0]["corpo"] = json!("a".repeat(131));
        let err = validate_carousel_response(&v).unwrap_err();
        assert_eq!(err.field, "slides[0].corpo");
        assert_eq!(err.received, "131 characters");
    }

    #[test]
    fn slide_title_limit_is_six_words() {
        let mut v = carousel();
        v["slides"][1]["titulo"] = json!(words(6));
        assert!(validate_carousel_response(&v).is_ok());
        v["slides"][1]["titulo"] = json!(words(7));
        let err = validate_carousel_response(&v).unwrap_err();
        assert_eq!(err.field, "slides[1].titulo");
    }

    #[test]
    fn slide_kind_must_be_known() {
        let mut v = carousel();
        v["slides"][0]["tipo"] = json!("intro");
        let err = validate_carousel_response(&v).unwrap_err();
        assert_eq!(err.field, "slides[0].tipo");
        assert!(err.expected.contains("principio"));
        assert_eq!(err.received, "\"intro\"");
    }

    #[test]
    fn caption_word_count_bounds() {
        let mut v = carousel();
        v["legenda"] = json!(words(199));
        assert_eq!(validate_carousel_response(&v).unwrap_err().field, "legenda");
        v["legenda"] = json!(words(200));
        assert!(validate_carousel_response(&v).is_ok());
        v["legenda"] = json!(words(400));
        assert!(validate_carousel_response(&v).is_ok());
        v["legenda"] = json!(words(401));
        assert_eq!(validate_carousel_response(&v).unwrap_err().field, "legenda");
    }

    #[test]
    fn safe_validate_reports_instead_of_failing() {
        let mut v = carousel();
        v["slides"][0]["tipo"] = json!(42);
        let res = safe_validate(validate_carousel_response, &v);
        assert!(!res.success);
        assert!(res.data.is_none());
        assert_eq!(res.error.unwrap().field, "slides[0].tipo");

        let ok = safe_validate(validate_carousel_response, &carousel());
        assert!(ok.success);
        assert!(ok.data.is_some());
    }

    #[test]
    fn narratives_accept_wrapped_or_bare_lists() {
        let item = json!({ "id": "1", "title": "O mito", "description": "d", "angle": "herege" });
        assert_eq!(validate_narratives(&json!({ "narratives": [item.clone()] })).unwrap().len(), 1);
        assert_eq!(validate_narratives(&json!([item])).unwrap()[0].angle, NarrativeAngle::Herege);

        let bad = json!({ "narratives": [{ "id": "1", "title": "t", "description": "d", "angle": "poeta" }] });
        assert_eq!(validate_narratives(&bad).unwrap_err().field, "narratives[0].angle");
        assert_eq!(validate_narratives(&json!({})).unwrap_err().field, "narratives");
    }

    #[test]
    fn video_script_requires_development_sections() {
        let mut v = json!({
            "meta": { "duracao_estimada": "60s", "angulo": "tradutor", "valor_central": "v" },
            "thumbnail": { "titulo": "t", "expressao": "surpresa", "texto_overlay": "ISSO MUDA TUDO" },
            "roteiro": {
                "hook": "Você está fazendo errado.",
                "desenvolvimento": [{ "topico": "o erro", "fala": "explicação" }],
                "cta": "Siga para mais"
            },
            "notas_producao": "",
            "caption": "legenda",
            "hashtags": ["#video"]
        });
        let script = validate_video_script(&v).unwrap();
        assert_eq!(script.roteiro.desenvolvimento.len(), 1);

        v["roteiro"]["desenvolvimento"][0]["fala"] = json!(" ");
        assert_eq!(validate_video_script(&v).unwrap_err().field, "roteiro.desenvolvimento[0].fala");
        v["roteiro"]["desenvolvimento"] = json!([]);
        assert_eq!(validate_video_script(&v).unwrap_err().field, "roteiro.desenvolvimento");
    }

    #[test]
    fn text_and_image_posts() {
        let t = json!({ "texto": "corpo", "legenda": "leg", "hashtags": [] });
        assert!(validate_text_response(&t).is_ok());
        let bad = json!({ "texto": "corpo", "legenda": "leg", "hashtags": [1] });
        assert_eq!(validate_text_response(&bad).unwrap_err().field, "hashtags[0]");
        let i = json!({ "prompt_imagem": "", "legenda": "leg" });
        assert_eq!(validate_image_response(&i).unwrap_err().field, "prompt_imagem");
    }
}
