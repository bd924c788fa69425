use clap::{Parser, Subcommand, ValueEnum};

use crate::wire::ContentType;

#[derive(Parser, Debug)]
#[command(name = "tribal_wizard", version, about = "Content wizard: narratives, drafts and assets generated through OpenRouter")]
pub struct Args {
    #[arg(long, global = true, default_value = ".")]
    pub root: String,

    #[arg(long, global = true)]
    pub config: Option<String>,

    /// OpenRouter model id, e.g. `google/gemini-2.5-flash`.
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub out: Option<String>,

    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    #[arg(long, global = true, default_value_t = true, action = clap::ArgAction::Set)]
    pub progress: bool,

    #[arg(long, global = true, default_value_t = true, action = clap::ArgAction::Set)]
    pub save_artifacts: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Brief shared by the one-shot commands.
#[derive(clap::Args, Debug, Clone)]
pub struct Brief {
    #[arg(long = "type", value_enum, default_value_t = ContentType::Carousel)]
    pub content_type: ContentType,

    #[arg(long)]
    pub theme: String,

    #[arg(long)]
    pub context: Option<String>,

    #[arg(long)]
    pub objective: Option<String>,

    #[arg(long)]
    pub audience: Option<String>,

    /// Terms the copy must avoid; repeatable.
    #[arg(long = "avoid")]
    pub negative_terms: Vec<String>,

    #[arg(long)]
    pub slides: Option<u32>,

    #[arg(long)]
    pub duration: Option<String>,

    /// YouTube video whose transcript feeds the prompts.
    #[arg(long)]
    pub reference_url: Option<String>,

    #[arg(long, default_value_t = false)]
    pub no_rag: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive step-by-step flow (default).
    Wizard,
    /// Print four narrative options for a brief.
    Narratives {
        #[command(flatten)]
        brief: Brief,
    },
    /// Generate a draft, optionally for a given narrative (JSON file from `narratives`).
    Generate {
        #[command(flatten)]
        brief: Brief,
        #[arg(long)]
        narrative: Option<String>,
    },
    /// Rewrite a saved draft with feedback.
    Refactor {
        /// GeneratedContent JSON.
        #[arg(long)]
        content: String,
        #[arg(long)]
        feedback: String,
        /// Generation prompt to build on: a saved `generate.*.request.json` or plain text.
        /// Defaults to the prompt recorded in the draft's metadata.
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long = "avoid")]
        negative_terms: Vec<String>,
    },
    /// YouTube title options for a saved video draft.
    Titles {
        #[arg(long)]
        content: String,
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    /// YouTube title, description, tags and chapters for a saved video draft.
    Seo {
        #[arg(long)]
        content: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        reference_url: Option<String>,
    },
    /// Fetch a YouTube transcript through Apify.
    Transcript { url: String },
    /// Check a raw model response against a validator.
    Validate {
        #[arg(value_enum)]
        kind: ValidateKind,
        file: String,
    },
    /// Render SVG assets for a saved draft.
    Render {
        #[arg(long)]
        content: String,
        #[arg(long)]
        thumbnail: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidateKind {
    Carousel,
    Text,
    Image,
    Video,
    Narratives,
    Titles,
    Seo,
    Thumbnail,
}
