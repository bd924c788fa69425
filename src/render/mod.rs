use anyhow::Result;
use fs_err as fs;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::wire::{CarouselResponse, CarouselSlide, GeneratedContent, ThumbnailSpec};

pub const SLIDE_W: u32 = 1080;
pub const SLIDE_H: u32 = 1350;
pub const THUMB_W: u32 = 1280;
pub const THUMB_H: u32 = 720;

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub background: String,
    pub accent: String,
    pub text: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self { background: "#111111".into(), accent: "#FFD400".into(), text: "#FFFFFF".into() }
    }
}

/// `#RRGGBB` only; anything else never reaches an SVG attribute.
pub fn is_hex_color(c: &str) -> bool {
    c.len() == 7 && c.starts_with('#') && c[1..].chars().all(|ch| ch.is_ascii_hexdigit())
}

impl Palette {
    /// First valid color is the background, second the accent; text stays white unless a third is given.
    pub fn from_colors(colors: &[String]) -> Self {
        let mut valid = colors.iter().map(|c| c.trim()).filter(|c| is_hex_color(c));
        let mut p = Palette::default();
        if let Some(bg) = valid.next() {
            p.background = bg.to_string();
        }
        if let Some(accent) = valid.next() {
            p.accent = accent.to_string();
        }
        if let Some(text) = valid.next() {
            p.text = text.to_string();
        }
        p
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAsset {
    pub name: String,
    pub svg: String,
}

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Greedy word wrap by character count. Words longer than a line get a line of their own.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() { word.chars().count() } else { current.chars().count() + 1 + word.chars().count() };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn text_block(svg: &mut String, lines: &[String], x: u32, y: u32, size: u32, weight: &str, fill: &str) -> u32 {
    let line_height = size * 13 / 10;
    let mut cy = y;
    for line in lines {
        let _ = writeln!(
            svg,
            r#"  <text x="{x}" y="{cy}" font-family="Inter, Helvetica, Arial, sans-serif" font-size="{size}" font-weight="{weight}" fill="{fill}">{}</text>"#,
            escape_xml(line)
        );
        cy += line_height;
    }
    cy
}

fn open_svg(w: u32, h: u32, bg: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n  <rect width=\"{w}\" height=\"{h}\" fill=\"{bg}\"/>\n"
    )
}

pub fn render_cover(carousel: &CarouselResponse, palette: &Palette) -> RenderedAsset {
    let mut svg = open_svg(SLIDE_W, SLIDE_H, &palette.background);
    let _ = writeln!(svg, r#"  <rect x="90" y="420" width="120" height="12" fill="{}"/>"#, palette.accent);
    let y = text_block(&mut svg, &wrap_text(&carousel.capa.titulo, 18), 90, 540, 88, "800", &palette.text);
    text_block(&mut svg, &wrap_text(&carousel.capa.subtitulo, 32), 90, y + 40, 46, "400", &palette.accent);
    svg.push_str("</svg>\n");
    RenderedAsset { name: "slide-00-capa.svg".into(), svg }
}

pub fn render_slide(slide: &CarouselSlide, total: usize, palette: &Palette) -> RenderedAsset {
    let mut svg = open_svg(SLIDE_W, SLIDE_H, &palette.background);
    let _ = writeln!(
        svg,
        r#"  <text x="90" y="140" font-family="Inter, Helvetica, Arial, sans-serif" font-size="36" fill="{}">{:02}/{:02} · {}</text>"#,
        palette.accent,
        slide.numero,
        total,
        slide.tipo.as_str().to_uppercase()
    );
    let y = text_block(&mut svg, &wrap_text(&slide.titulo, 20), 90, 420, 76, "800", &palette.text);
    text_block(&mut svg, &wrap_text(&slide.corpo, 36), 90, y + 60, 44, "400", &palette.text);
    svg.push_str("</svg>\n");
    RenderedAsset { name: format!("slide-{:02}-{}.svg", slide.numero, slide.tipo.as_str()), svg }
}

pub fn render_carousel(carousel: &CarouselResponse, palette: &Palette) -> Vec<RenderedAsset> {
    let mut out = vec![render_cover(carousel, palette)];
    let total = carousel.slides.len();
    out.extend(carousel.slides.iter().map(|s| render_slide(s, total, palette)));
    out
}

pub fn render_thumbnail(spec: &ThumbnailSpec) -> RenderedAsset {
    let palette = Palette::from_colors(&spec.cores);
    let mut svg = open_svg(THUMB_W, THUMB_H, &palette.background);
    let _ = writeln!(svg, r#"  <rect x="0" y="{}" width="{THUMB_W}" height="24" fill="{}"/>"#, THUMB_H - 24, palette.accent);
    let y = text_block(&mut svg, &wrap_text(&spec.texto.to_uppercase(), 14), 70, 260, 120, "900", &palette.text);
    if !spec.subtexto.trim().is_empty() {
        text_block(&mut svg, &wrap_text(&spec.subtexto, 28), 70, y + 20, 52, "600", &palette.accent);
    }
    svg.push_str("</svg>\n");
    RenderedAsset { name: "thumbnail.svg".into(), svg }
}

/// Slide renders for carousels; other types only get a thumbnail.
pub fn render_content(content: &GeneratedContent, thumbnail: Option<&ThumbnailSpec>) -> Vec<RenderedAsset> {
    let palette = thumbnail.map(|t| Palette::from_colors(&t.cores)).unwrap_or_default();
    let mut out = match content {
        GeneratedContent::Carousel { carousel, .. } => render_carousel(carousel, &palette),
        _ => Vec::new(),
    };
    if let Some(t) = thumbnail {
        out.push(render_thumbnail(t));
    }
    out
}

pub fn write_assets(dir: &Path, assets: &[RenderedAsset]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(assets.len());
    for a in assets {
        let p = dir.join(&a.name);
        fs::write(&p, &a.svg)?;
        paths.push(p);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{CarouselCover, SlideKind};

    fn carousel() -> CarouselResponse {
        CarouselResponse {
            throughline: "t".into(),
            valor_central: "v".into(),
            capa: CarouselCover { titulo: "Pare de começar do zero".into(), subtitulo: "Tom & Jerry <3".into() },
            slides: vec![CarouselSlide {
                numero: 1,
                tipo: SlideKind::Cta,
                titulo: "Salve".into(),
                corpo: "Volte amanhã".into(),
                imagem_sugerida: None,
            }],
            legenda: "l".into(),
            hashtags: vec![],
        }
    }

    #[test]
    fn palette_skips_values_that_are_not_hex() {
        let colors = vec!["red\" onload=\"x".to_string(), "#000000".into(), "#12345".into(), " #FF0000 ".into()];
        let p = Palette::from_colors(&colors);
        assert_eq!(p.background, "#000000");
        assert_eq!(p.accent, "#FF0000");
        assert_eq!(p.text, "#FFFFFF");
        let svg = render_cover(&carousel(), &p).svg;
        assert!(!svg.contains("onload"));
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(wrap_text("um dois tres quatro", 8), vec!["um dois", "tres", "quatro"]);
        assert_eq!(wrap_text("supercalifragilistico curto", 5), vec!["supercalifragilistico", "curto"]);
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn carousel_renders_cover_plus_slides_escaped() {
        let assets = render_carousel(&carousel(), &Palette::default());
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].name, "slide-00-capa.svg");
        assert_eq!(assets[1].name, "slide-01-cta.svg");
        assert!(assets[0].svg.contains("Tom &amp; Jerry &lt;3"));
        assert!(assets[1].svg.contains("01/01 · CTA"));
        assert!(assets[1].svg.starts_with("<svg"));
    }

    #[test]
    fn thumbnail_uses_palette_and_writes_to_disk() {
        let spec = ThumbnailSpec {
            texto: "pare agora".into(),
            subtexto: String::new(),
            estilo: "bold".into(),
            prompt_imagem: "p".into(),
            cores: vec!["#000000".into(), "#FF0000".into()],
        };
        let asset = render_thumbnail(&spec);
        assert!(asset.svg.contains("PARE AGORA"));
        assert!(asset.svg.contains("fill=\"#000000\""));

        let tmp = tempfile::tempdir().unwrap();
        let paths = write_assets(&tmp.path().join("assets"), &[asset]).unwrap();
        assert!(paths[0].ends_with("thumbnail.svg"));
        assert!(fs::read_to_string(&paths[0]).unwrap().contains("</svg>"));
    }
}
