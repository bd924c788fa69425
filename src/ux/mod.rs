use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

use crate::wire::{
    ContentType, GeneratedContent, NarrativeOption, RagResult, ThumbnailSpec, VideoTitle, YoutubeSeo,
};

/// What the creator wants to do with a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Refactor(String),
    Regenerate,
    EditCaption(String),
    Quit,
}

pub fn ask(prompt: &str) -> String {
    print!("{} ", prompt.bold());
    let _ = io::stdout().flush();
    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        s.trim().to_string()
    } else {
        String::new()
    }
}

pub fn ask_optional(prompt: &str) -> Option<String> {
    let s = ask(&format!("{prompt} (enter para pular):"));
    if s.is_empty() { None } else { Some(s) }
}

pub fn confirm(prompt: &str) -> bool {
    let ans = ask(&format!("{prompt} [s/N]:")).to_lowercase();
    ans == "y" || ans == "yes" || ans == "s" || ans == "sim"
}

/// 1-based menu index typed by the user, if it is in range.
pub fn parse_choice(answer: &str, len: usize) -> Option<usize> {
    let n: usize = answer.trim().parse().ok()?;
    (1..=len).contains(&n).then(|| n - 1)
}

pub fn choose_content_type() -> ContentType {
    println!("\n{}", "=== TIPO DE CONTEÚDO ===".bold());
    for (i, t) in ContentType::ALL.iter().enumerate() {
        println!("{}. {}", i + 1, t.label());
    }
    loop {
        if let Some(i) = parse_choice(&ask("Escolha:"), ContentType::ALL.len()) {
            return ContentType::ALL[i];
        }
        println!("{}", "opção inválida".red());
    }
}

fn angle_badge(n: &NarrativeOption) -> colored::ColoredString {
    let tag = format!("[{}]", n.angle.as_str().to_uppercase());
    match n.angle {
        crate::wire::NarrativeAngle::Herege => tag.red().bold(),
        crate::wire::NarrativeAngle::Visionario => tag.magenta().bold(),
        crate::wire::NarrativeAngle::Tradutor => tag.cyan().bold(),
        crate::wire::NarrativeAngle::Testemunha => tag.green().bold(),
    }
}

pub fn show_narratives(options: &[NarrativeOption]) {
    println!("\n{}", "=== NARRATIVAS ===".bold());
    for (i, n) in options.iter().enumerate() {
        println!("{}. {}  {}", i + 1, angle_badge(n), n.title.bold());
        println!("   {}", n.description);
        if let Some(h) = &n.hook {
            println!("   {} {}", "gancho:".dimmed(), h);
        }
    }
    println!();
}

pub fn choose_narrative(options: &[NarrativeOption]) -> Option<usize> {
    loop {
        let ans = ask("Escolha a narrativa (ou 'r' para gerar novas):");
        if ans.eq_ignore_ascii_case("r") {
            return None;
        }
        if let Some(i) = parse_choice(&ans, options.len()) {
            return Some(i);
        }
        println!("{}", "opção inválida".red());
    }
}

pub fn show_rag(rag: &RagResult) {
    println!(
        "{} {} trechos, ~{} tokens",
        "referências:".dimmed(),
        rag.sources.len(),
        rag.token_count
    );
}

pub fn show_content(content: &GeneratedContent) {
    println!("\n{}", format!("=== {} ===", content.content_type().label().to_uppercase()).bold());
    match content {
        GeneratedContent::Carousel { carousel, .. } => {
            println!("{} {}", "throughline:".dimmed(), carousel.throughline.italic());
            println!("{}  {} / {}", "[CAPA]".yellow().bold(), carousel.capa.titulo.bold(), carousel.capa.subtitulo);
            for s in &carousel.slides {
                println!(
                    "{:>2}. {}  {} — {}",
                    s.numero,
                    format!("[{}]", s.tipo.as_str().to_uppercase()).cyan().bold(),
                    s.titulo.bold(),
                    s.corpo
                );
            }
        }
        GeneratedContent::Text { post, .. } => println!("{}", post.texto),
        GeneratedContent::Image { post, .. } => {
            println!("{} {}", "imagem:".dimmed(), post.prompt_imagem);
            println!("{} {}", "texto:".dimmed(), post.texto_imagem.bold());
        }
        GeneratedContent::Video { script, .. } => {
            println!("{} {}", "[HOOK]".red().bold(), script.roteiro.hook.bold());
            for (i, s) in script.roteiro.desenvolvimento.iter().enumerate() {
                println!("{}. {}  {}", i + 1, format!("[{}]", s.topico).cyan(), s.fala);
                if let Some(v) = &s.visual {
                    println!("   {} {}", "visual:".dimmed(), v);
                }
            }
            println!("{} {}", "[CTA]".green().bold(), script.roteiro.cta);
            if !script.notas_producao.is_empty() {
                println!("{} {}", "produção:".dimmed(), script.notas_producao);
            }
        }
    }
    println!("\n{}\n{}", "legenda:".dimmed(), content.caption());
    println!("{}", content.hashtags().join(" ").blue());
    let meta = content.metadata();
    println!(
        "{}",
        format!("modelo {} · refactors {} · fontes {}", meta.model, meta.refactor_count, meta.rag_sources.len()).dimmed()
    );
}

pub fn show_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    println!("\n{}", "Avisos:".yellow().bold());
    for w in warnings {
        println!(" - {w}");
    }
}

pub fn parse_review(answer: &str) -> Option<ReviewAction> {
    let answer = answer.trim();
    let (cmd, rest) = answer.split_once(char::is_whitespace).unwrap_or((answer, ""));
    let rest = rest.trim();
    match cmd.to_lowercase().as_str() {
        "a" | "aprovar" => Some(ReviewAction::Approve),
        "g" | "regerar" => Some(ReviewAction::Regenerate),
        "q" | "sair" => Some(ReviewAction::Quit),
        "r" | "refatorar" if !rest.is_empty() => Some(ReviewAction::Refactor(rest.to_string())),
        "l" | "legenda" if !rest.is_empty() => Some(ReviewAction::EditCaption(rest.to_string())),
        _ => None,
    }
}

pub fn review() -> ReviewAction {
    println!(
        "{}",
        "[a] aprovar · [r <feedback>] refatorar · [g] regerar · [l <texto>] nova legenda · [q] sair".dimmed()
    );
    loop {
        if let Some(action) = parse_review(&ask(">")) {
            return action;
        }
        println!("{}", "comando inválido".red());
    }
}

pub fn show_titles(titles: &[VideoTitle]) {
    println!("\n{}", "=== TÍTULOS ===".bold());
    for (i, t) in titles.iter().enumerate() {
        println!("{}. {}  {}", i + 1, t.titulo.bold(), format!("({})", t.gatilho).dimmed());
    }
}

pub fn show_seo(seo: &YoutubeSeo) {
    println!("\n{}", "=== SEO YOUTUBE ===".bold());
    println!("{}\n\n{}", seo.titulo.bold(), seo.descricao);
    println!("{} {}", "tags:".dimmed(), seo.tags.join(", "));
    for c in &seo.capitulos {
        println!("{} {}", c.tempo.cyan(), c.titulo);
    }
}

pub fn show_thumbnail(spec: &ThumbnailSpec) {
    println!("\n{}", "=== THUMBNAIL ===".bold());
    println!("{}  {}", spec.texto.bold(), spec.subtexto);
    println!("{} {}", "estilo:".dimmed(), spec.estilo);
    println!("{} {}", "prompt:".dimmed(), spec.prompt_imagem);
    println!("{} {}", "cores:".dimmed(), spec.cores.join(" "));
}

/// Spinner shown while waiting on the model; hidden when progress is off.
pub fn spinner(msg: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
