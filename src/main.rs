use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use fs_err as fs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

mod cli;
mod config;
mod context;
mod errors;
mod log;
mod normalize;
mod prompt;
mod provider;
mod render;
mod safety;
mod services;
mod ux;
mod validate;
mod wire;
mod wizard;

use cli::{Args, Brief, Command, ValidateKind};
use prompt::PromptContext;
use services::apify::ApifyClient;
use services::ServiceCtx;
use wire::{ContentType, GeneratedContent, NarrativeOption, RagConfig, RagResult, ServiceResult, WizardInput};
use wizard::WizardSession;

/// Optional material gathered before prompting. Both halves degrade to `None`.
#[derive(Debug, Default)]
struct Enrichment {
    rag: Option<RagResult>,
    transcript: Option<String>,
}

fn load_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let s = fs::read_to_string(path)?;
    serde_json::from_str(&s).with_context(|| format!("parsing {path}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn input_from_brief(b: &Brief) -> WizardInput {
    let mut input = WizardInput::new(b.content_type, b.theme.trim());
    input.context = b.context.clone();
    input.objective = b.objective.clone();
    input.audience = b.audience.clone();
    input.negative_terms = b.negative_terms.clone();
    input.slide_count = b.slides;
    input.video_duration = b.duration.clone();
    input.reference_url = b.reference_url.clone();
    if b.no_rag {
        input.rag = None;
    } else {
        input.rag = Some(RagConfig::default());
    }
    input
}

fn split_terms(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|t| !t.is_empty()).map(String::from).collect()
}

async fn enrich(cfg: &config::Config, input: &WizardInput, progress: bool) -> Result<Enrichment> {
    let mut out = Enrichment::default();

    if let Some(url) = input.reference_url.as_deref() {
        let pb = ux::spinner("transcrevendo vídeo de referência", progress);
        let r = ApifyClient::new(cfg)?.transcribe(url).await;
        pb.finish_and_clear();
        out.transcript = r.into_data().map(|t| t.text);
    }

    if let Some(rag_cfg) = input.rag.as_ref() {
        let backend = services::rag::make_rag_backend(cfg)?;
        let backend = backend.as_deref().map(|b| b as &dyn services::rag::RagBackend);
        if services::rag::is_wizard_rag_available(backend).await.data == Some(true) {
            let query = match input.context.as_deref() {
                Some(c) => format!("{} {}", input.theme, c),
                None => input.theme.clone(),
            };
            out.rag = services::rag::generate_wizard_rag_context(backend, &query, rag_cfg).await.into_data();
        } else {
            info!("no rag documents available; prompting without references");
        }
    }
    Ok(out)
}

/// Prompt a saved draft is refactored against: `--prompt` file first, then the draft's own metadata.
fn refactor_base_prompt(current: &GeneratedContent, prompt_file: Option<&str>) -> Result<String> {
    if let Some(path) = prompt_file {
        let raw = fs::read_to_string(path)?;
        return Ok(match serde_json::from_str::<provider::ChatRequest>(&raw) {
            Ok(req) => req.user_prompt().to_string(),
            Err(_) => raw.trim().to_string(),
        });
    }
    match current.metadata().prompt.as_deref() {
        Some(p) if !p.trim().is_empty() => Ok(p.to_string()),
        _ => bail!("draft has no recorded generation prompt; pass --prompt with the generate request artifact"),
    }
}

fn assets_dir(cfg: &config::Config, run_id: Uuid) -> PathBuf {
    Path::new(&cfg.root).join(&cfg.output_dir).join(run_id.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    log::init_tracing(args.debug);

    let mut cfg = config::Config::load(args.config.as_deref())?;
    cfg.root = args.root.clone();
    if let Some(m) = &args.model {
        cfg.model = m.clone();
    }
    if let Some(o) = &args.out {
        cfg.output_dir = o.clone();
    }
    cfg.save_artifacts = cfg.save_artifacts && args.save_artifacts;

    let run_id = Uuid::new_v4();
    let artifacts = cfg.save_artifacts.then(|| log::ArtifactLog::new(&cfg, run_id));
    if args.debug {
        if let Some(a) = &artifacts {
            eprintln!("debug: artifacts -> {}", a.dir().display());
        }
    }

    match args.command.unwrap_or(Command::Wizard) {
        Command::Wizard => {
            let prov = provider::make_provider(&cfg)?;
            let svc = ServiceCtx::new(&*prov, &cfg).with_artifacts(artifacts.as_ref());
            run_wizard(&svc, run_id, args.progress, artifacts.as_ref()).await
        }
        Command::Narratives { brief } => {
            let prov = provider::make_provider(&cfg)?;
            let svc = ServiceCtx::new(&*prov, &cfg).with_artifacts(artifacts.as_ref());
            let input = input_from_brief(&brief);
            let extra = enrich(&cfg, &input, args.progress).await?;
            let ctx = PromptContext::new(&input)
                .with_rag(extra.rag.as_ref().map(|r| r.context.as_str()))
                .with_transcript(extra.transcript.as_deref());
            let pb = ux::spinner("gerando narrativas", args.progress);
            let r: ServiceResult<Vec<NarrativeOption>> = services::narratives::generate_narratives(&svc, &ctx).await.into();
            pb.finish_and_clear();
            print_json(&r)
        }
        Command::Generate { brief, narrative } => {
            let prov = provider::make_provider(&cfg)?;
            let svc = ServiceCtx::new(&*prov, &cfg).with_artifacts(artifacts.as_ref());
            let input = input_from_brief(&brief);
            let narrative: Option<NarrativeOption> = narrative.as_deref().map(load_json).transpose()?;
            let extra = enrich(&cfg, &input, args.progress).await?;
            let sources = extra.rag.as_ref().map(|r| r.sources.clone()).unwrap_or_default();
            let ctx = PromptContext::new(&input)
                .with_narrative(narrative.as_ref())
                .with_rag(extra.rag.as_ref().map(|r| r.context.as_str()))
                .with_transcript(extra.transcript.as_deref());
            let pb = ux::spinner("gerando conteúdo", args.progress);
            let r = services::content::generate_content(&svc, &ctx, &sources).await;
            pb.finish_and_clear();
            let r: ServiceResult<GeneratedContent> = r.map(|g| {
                for w in &g.warnings {
                    warn!("{w}");
                }
                g.content
            })
            .into();
            print_json(&r)
        }
        Command::Refactor { content, feedback, prompt, negative_terms } => {
            let current: GeneratedContent = load_json(&content)?;
            let original = refactor_base_prompt(&current, prompt.as_deref())?;
            let prov = provider::make_provider(&cfg)?;
            let svc = ServiceCtx::new(&*prov, &cfg).with_artifacts(artifacts.as_ref());
            let pb = ux::spinner("refatorando", args.progress);
            let r = services::content::refactor_content(&svc, &original, &current, &feedback, &negative_terms).await;
            pb.finish_and_clear();
            let r: ServiceResult<GeneratedContent> = r.map(|g| g.content).into();
            print_json(&r)
        }
        Command::Titles { content, count } => {
            let prov = provider::make_provider(&cfg)?;
            let svc = ServiceCtx::new(&*prov, &cfg).with_artifacts(artifacts.as_ref());
            let script = match load_json::<GeneratedContent>(&content)? {
                GeneratedContent::Video { script, .. } => script,
                other => bail!("titles need a video draft, got {}", other.content_type()),
            };
            let theme = script.meta.valor_central.clone();
            let pb = ux::spinner("gerando títulos", args.progress);
            let r = services::video_titles::generate_video_titles(&svc, &theme, &script, count).await;
            pb.finish_and_clear();
            print_json(&r)
        }
        Command::Seo { content, title, reference_url } => {
            let prov = provider::make_provider(&cfg)?;
            let svc = ServiceCtx::new(&*prov, &cfg).with_artifacts(artifacts.as_ref());
            let script = match load_json::<GeneratedContent>(&content)? {
                GeneratedContent::Video { script, .. } => script,
                other => bail!("seo needs a video draft, got {}", other.content_type()),
            };
            let transcript = match reference_url.as_deref() {
                Some(url) => ApifyClient::new(&cfg)?.transcribe(url).await.into_data().map(|t| t.text),
                None => None,
            };
            let title = title.unwrap_or_else(|| script.thumbnail.titulo.clone());
            let pb = ux::spinner("gerando SEO", args.progress);
            let r = services::youtube_seo::generate_youtube_seo(&svc, &title, &script, transcript.as_deref()).await;
            pb.finish_and_clear();
            print_json(&r)
        }
        Command::Transcript { url } => {
            let pb = ux::spinner("transcrevendo", args.progress);
            let r = ApifyClient::new(&cfg)?.transcribe(&url).await;
            pb.finish_and_clear();
            print_json(&r)
        }
        Command::Validate { kind, file } => {
            let raw = fs::read_to_string(&file)?;
            let value = provider::parse_json_content(&raw)?;
            let report = validate_report(kind, &value)?;
            let ok = report.get("success").and_then(Value::as_bool).unwrap_or(false);
            print_json(&report)?;
            if !ok {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Render { content, thumbnail } => {
            let content: GeneratedContent = load_json(&content)?;
            let thumb: Option<wire::ThumbnailSpec> = thumbnail.as_deref().map(load_json).transpose()?;
            let assets = render::render_content(&content, thumb.as_ref());
            if assets.is_empty() {
                println!("nothing to render for {} without a thumbnail", content.content_type());
                return Ok(());
            }
            for p in render::write_assets(&assets_dir(&cfg, run_id), &assets)? {
                println!("{}", p.display());
            }
            Ok(())
        }
    }
}

fn validate_report(kind: ValidateKind, value: &Value) -> Result<Value> {
    use validate::*;
    let report = match kind {
        ValidateKind::Carousel => serde_json::to_value(safe_validate(validate_carousel_response, value))?,
        ValidateKind::Text => serde_json::to_value(safe_validate(validate_text_response, value))?,
        ValidateKind::Image => serde_json::to_value(safe_validate(validate_image_response, value))?,
        ValidateKind::Video => serde_json::to_value(safe_validate(validate_video_script, value))?,
        ValidateKind::Narratives => serde_json::to_value(safe_validate(validate_narratives, value))?,
        ValidateKind::Titles => serde_json::to_value(safe_validate(validate_video_titles, value))?,
        ValidateKind::Seo => serde_json::to_value(safe_validate(validate_youtube_seo, value))?,
        ValidateKind::Thumbnail => serde_json::to_value(safe_validate(validate_thumbnail, value))?,
    };
    Ok(report)
}

fn ask_input(content_type: ContentType) -> WizardInput {
    let theme = loop {
        let t = ux::ask("Tema:");
        if !t.is_empty() {
            break t;
        }
        println!("{}", "o tema é obrigatório".red());
    };
    let mut input = WizardInput::new(content_type, theme);
    input.context = ux::ask_optional("Contexto");
    input.objective = ux::ask_optional("Objetivo");
    input.audience = ux::ask_optional("Público");
    input.negative_terms = ux::ask_optional("Termos a evitar, separados por vírgula")
        .map(|s| split_terms(&s))
        .unwrap_or_default();
    match content_type {
        ContentType::Carousel => {
            input.slide_count = ux::ask_optional("Número de slides").and_then(|s| s.parse().ok());
        }
        ContentType::Video => {
            input.video_duration = ux::ask_optional("Duração do vídeo");
        }
        _ => {}
    }
    input.reference_url = ux::ask_optional("URL de vídeo de referência no YouTube");
    if ux::confirm("Usar sua base de conhecimento?") {
        input.rag = Some(RagConfig::default());
    }
    input
}

async fn run_wizard(
    svc: &ServiceCtx<'_>,
    run_id: Uuid,
    progress: bool,
    artifacts: Option<&log::ArtifactLog>,
) -> Result<()> {
    let cfg = svc.cfg;
    let mut session = WizardSession::new();

    // ===== TYPE & INPUTS =====
    session.choose_type(ux::choose_content_type());
    session.advance()?;
    let content_type = session.content_type.unwrap_or(ContentType::Carousel);
    session.set_input(ask_input(content_type));
    session.advance()?;

    let input = session.input.clone().context("wizard input missing after inputs step")?;
    let extra = enrich(cfg, &input, progress).await?;
    if let Some(r) = &extra.rag {
        ux::show_rag(r);
    }
    session.rag = extra.rag;
    session.transcript = extra.transcript;

    // ===== NARRATIVES =====
    loop {
        let ctx = PromptContext::new(&input)
            .with_rag(session.rag.as_ref().map(|r| r.context.as_str()))
            .with_transcript(session.transcript.as_deref());
        let pb = ux::spinner("gerando narrativas", progress);
        let r = services::narratives::generate_narratives(svc, &ctx).await;
        pb.finish_and_clear();
        match r {
            Ok(options) => session.narratives = options,
            Err(e) => {
                println!("{} {e}", "falha ao gerar narrativas:".red());
                if ux::confirm("Tentar de novo?") {
                    continue;
                }
                return Ok(());
            }
        }
        ux::show_narratives(&session.narratives);
        if let Some(i) = ux::choose_narrative(&session.narratives) {
            let id = session.narratives[i].id.clone();
            session.select_narrative(&id);
            break;
        }
    }
    session.advance()?;

    // ===== DRAFT & REVIEW =====
    let sources = session.rag.as_ref().map(|r| r.sources.clone()).unwrap_or_default();
    let mut pending_generation = true;
    loop {
        if pending_generation {
            let ctx = PromptContext::new(&input)
                .with_narrative(session.selected.as_ref())
                .with_rag(session.rag.as_ref().map(|r| r.context.as_str()))
                .with_transcript(session.transcript.as_deref());
            let pb = ux::spinner("gerando conteúdo", progress);
            let r = services::content::generate_content(svc, &ctx, &sources).await;
            pb.finish_and_clear();
            match r {
                Ok(gen) => {
                    ux::show_warnings(&gen.warnings);
                    session.generation_prompt = Some(gen.prompt);
                    session.replace_content(gen.content);
                }
                Err(e) => {
                    println!("{} {e}", "falha ao gerar conteúdo:".red());
                    match session.after_failed_generation(ux::confirm("Tentar de novo?")) {
                        wizard::Recovery::Retry => continue,
                        wizard::Recovery::KeepDraft => {
                            println!("{}", "rascunho anterior mantido".yellow());
                            pending_generation = false;
                            continue;
                        }
                        wizard::Recovery::Exit => {
                            save_session(&session, artifacts)?;
                            return Ok(());
                        }
                    }
                }
            }
            pending_generation = false;
            if session.step == wizard::WizardStep::Draft {
                session.advance()?;
            }
        }

        let Some(current) = session.content.clone() else {
            pending_generation = true;
            continue;
        };
        ux::show_content(&current);
        match ux::review() {
            ux::ReviewAction::Approve => {
                session.approve();
                break;
            }
            ux::ReviewAction::Regenerate => pending_generation = true,
            ux::ReviewAction::EditCaption(caption) => {
                if let Some(c) = session.content.as_mut() {
                    c.set_caption(caption);
                }
            }
            ux::ReviewAction::Refactor(feedback) => {
                let original = session.generation_prompt.clone().unwrap_or_default();
                let pb = ux::spinner("refatorando", progress);
                let r = services::content::refactor_content(svc, &original, &current, &feedback, &input.negative_terms).await;
                pb.finish_and_clear();
                match r {
                    Ok(gen) => {
                        ux::show_warnings(&gen.warnings);
                        session.replace_content(gen.content);
                    }
                    Err(e) => println!("{} {e}", "refactor falhou; rascunho mantido:".red()),
                }
            }
            ux::ReviewAction::Quit => {
                save_session(&session, artifacts)?;
                println!("Sessão encerrada sem aprovação.");
                return Ok(());
            }
        }
    }
    session.advance()?;

    // ===== ASSETS =====
    let content = session.content.clone().context("approved draft missing")?;
    let pb = ux::spinner("gerando thumbnail", progress);
    let thumb = services::thumbnail::generate_thumbnail(svc, &content, None).await;
    pb.finish_and_clear();
    match thumb {
        ServiceResult { data: Some(spec), .. } => {
            ux::show_thumbnail(&spec);
            session.thumbnail = Some(spec);
        }
        ServiceResult { error, .. } => warn!(error = ?error, "thumbnail unavailable"),
    }

    let out_dir = assets_dir(cfg, run_id);
    if let GeneratedContent::Video { script, .. } = &content {
        let pb = ux::spinner("gerando títulos e SEO", progress);
        let titles = services::video_titles::generate_video_titles(
            svc,
            &input.theme,
            script,
            services::video_titles::DEFAULT_TITLE_COUNT,
        )
        .await;
        let title = titles
            .data
            .as_ref()
            .and_then(|t| t.first())
            .map(|t| t.titulo.clone())
            .unwrap_or_else(|| script.thumbnail.titulo.clone());
        let seo = services::youtube_seo::generate_youtube_seo(svc, &title, script, session.transcript.as_deref()).await;
        pb.finish_and_clear();

        fs::create_dir_all(&out_dir)?;
        if let Some(t) = &titles.data {
            ux::show_titles(t);
        }
        if let Some(s) = &seo.data {
            ux::show_seo(s);
        }
        fs::write(out_dir.join("titles.json"), serde_json::to_string_pretty(&titles)?)?;
        fs::write(out_dir.join("seo.json"), serde_json::to_string_pretty(&seo)?)?;
    }

    let assets = render::render_content(&content, session.thumbnail.as_ref());
    let written = render::write_assets(&out_dir, &assets)?;
    fs::write(out_dir.join("content.json"), serde_json::to_string_pretty(&content)?)?;
    session.advance()?;
    save_session(&session, artifacts)?;

    println!("\n{} {}", "Pronto:".green().bold(), out_dir.display());
    for p in written {
        println!(" - {}", p.display());
    }
    Ok(())
}

fn save_session(session: &WizardSession, artifacts: Option<&log::ArtifactLog>) -> Result<()> {
    if let Some(a) = artifacts {
        let p = a.save_json("session", session)?;
        info!(path = %p.display(), "session saved");
    }
    Ok(())
}
