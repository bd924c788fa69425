use crate::wire::{ContentType, NarrativeAngle, NarrativeOption, WizardInput};

pub mod assets;
pub mod content;
pub mod video;

/// Everything a prompt can draw from in one wizard run.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub input: &'a WizardInput,
    pub narrative: Option<&'a NarrativeOption>,
    pub rag_context: Option<&'a str>,
    pub transcript: Option<&'a str>,
}

impl<'a> PromptContext<'a> {
    pub fn new(input: &'a WizardInput) -> Self {
        Self { input, narrative: None, rag_context: None, transcript: None }
    }

    pub fn with_narrative(mut self, narrative: Option<&'a NarrativeOption>) -> Self {
        self.narrative = narrative;
        self
    }

    pub fn with_rag(mut self, rag_context: Option<&'a str>) -> Self {
        self.rag_context = rag_context;
        self
    }

    pub fn with_transcript(mut self, transcript: Option<&'a str>) -> Self {
        self.transcript = transcript;
        self
    }
}

pub fn system_prompt() -> String {
    format!(
r#"Você é um estrategista de conteúdo tribal para redes sociais.
Seu trabalho é transformar o tema do criador em conteúdo que une uma tribo em torno de uma crença compartilhada.

Princípios:
- Conteúdo tribal não vende produto; ele nomeia um inimigo comum (o status quo) e oferece uma nova crença.
- Cada peça tem UM throughline: a ideia central que conecta o gancho à chamada para ação.
- Fale com uma pessoa, não com uma multidão. Frases curtas. Zero jargão corporativo.
- Nunca invente números, estudos ou citações. Se o contexto de referência trouxer dados, use-os; caso contrário, não cite dados.

{json_only}"#,
        json_only = json_only()
    )
}

pub(crate) fn json_only() -> &'static str {
r#"Formato de saída:
- Responda com EXATAMENTE UM objeto JSON válido.
- Sem markdown, sem blocos de código, sem texto antes ou depois do JSON.
- Todas as strings em português do Brasil."#
}

pub(crate) fn brief(input: &WizardInput) -> String {
    let mut s = format!("Tema: {}\n", input.theme.trim());
    if let Some(c) = input.context.as_deref().filter(|c| !c.trim().is_empty()) {
        s.push_str(&format!("Contexto: {}\n", c.trim()));
    }
    if let Some(o) = input.objective.as_deref().filter(|o| !o.trim().is_empty()) {
        s.push_str(&format!("Objetivo: {}\n", o.trim()));
    }
    if let Some(a) = input.audience.as_deref().filter(|a| !a.trim().is_empty()) {
        s.push_str(&format!("Público-alvo: {}\n", a.trim()));
    }
    s
}

pub(crate) fn negative_terms_block(terms: &[String]) -> String {
    let terms: Vec<&str> = terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        return String::new();
    }
    let mut s = String::from("\nTermos proibidos (NUNCA use estas palavras ou variações):\n");
    for t in terms {
        s.push_str(" - ");
        s.push_str(t);
        s.push('\n');
    }
    s
}

pub(crate) fn rag_block(rag_context: Option<&str>) -> String {
    match rag_context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) => format!(
            "\nMaterial de referência do criador (use como base factual, não copie literalmente):\n<referencia>\n{c}\n</referencia>\n"
        ),
        None => String::new(),
    }
}

pub(crate) fn transcript_block(transcript: Option<&str>) -> String {
    match transcript.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => {
            let clipped: String = t.chars().take(12_000).collect();
            format!("\nTranscrição do vídeo de referência:\n<transcricao>\n{clipped}\n</transcricao>\n")
        }
        None => String::new(),
    }
}

pub(crate) fn narrative_block(narrative: Option<&NarrativeOption>) -> String {
    let Some(n) = narrative else {
        return String::new();
    };
    let mut s = format!(
        "\nNarrativa escolhida:\n- Título: {}\n- Ângulo: {} ({})\n- Descrição: {}\n",
        n.title,
        n.angle,
        n.angle.stance(),
        n.description
    );
    if let Some(h) = &n.hook {
        s.push_str(&format!("- Gancho: {h}\n"));
    }
    if let Some(b) = &n.core_belief {
        s.push_str(&format!("- Crença central: {b}\n"));
    }
    if let Some(q) = &n.status_quo_challenged {
        s.push_str(&format!("- Status quo desafiado: {q}\n"));
    }
    s
}

pub fn narratives_prompt(ctx: &PromptContext<'_>) -> String {
    let angles = NarrativeAngle::ALL
        .iter()
        .map(|a| format!(" - {}: {}", a, a.stance()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
"{brief}
Formato do conteúdo: {format}
{rag}{transcript}{negatives}
Proponha QUATRO narrativas para este conteúdo, uma para cada ângulo:
{angles}

Cada narrativa deve ter um gancho que funcione nos 3 primeiros segundos e uma crença central que a tribo possa defender.

Responda no formato:
{{
  \"narratives\": [
    {{
      \"id\": string,
      \"title\": string,
      \"description\": string,
      \"angle\": \"herege\" | \"visionario\" | \"tradutor\" | \"testemunha\",
      \"hook\": string,
      \"core_belief\": string,
      \"status_quo_challenged\": string
    }}
  ]
}}",
        brief = brief(ctx.input),
        format = ctx.input.content_type.label(),
        rag = rag_block(ctx.rag_context),
        transcript = transcript_block(ctx.transcript),
        negatives = negative_terms_block(&ctx.input.negative_terms),
        angles = angles,
    )
}

/// Generation prompt for the selected content type.
pub fn content_prompt(ctx: &PromptContext<'_>) -> String {
    match ctx.input.content_type {
        ContentType::Carousel => content::carousel_prompt(ctx),
        ContentType::Text => content::text_prompt(ctx),
        ContentType::Image => content::image_prompt(ctx),
        ContentType::Video => video::video_script_prompt(ctx),
    }
}

/// Re-run of a generation with the current draft and the user's feedback appended.
pub fn refactor_prompt(original_prompt: &str, current_json: &str, feedback: &str) -> String {
    format!(
"{original_prompt}

---
Versão atual gerada:
{current_json}

Feedback do criador:
{feedback}

Reescreva o conteúdo aplicando o feedback. Mantenha o mesmo formato JSON e todas as regras acima.
Preserve o que o feedback não mencionar; mude apenas o necessário.",
        feedback = feedback.trim(),
    )
}
