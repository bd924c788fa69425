use regex::RegexBuilder;

use crate::wire::GeneratedContent;

/// Negative terms that appear in any of `texts`, as whole words and ignoring case.
///
/// Rules:
/// - Blank terms are ignored.
/// - Multi-word terms match as a phrase ("marketing digital").
/// - Each offending term is reported once, in the order the user listed them.
pub fn find_negative_terms(texts: &[&str], terms: &[String]) -> Vec<String> {
    let mut hits = Vec::new();
    for term in terms {
        let t = term.trim();
        let folded = t.to_lowercase();
        if t.is_empty() || hits.iter().any(|h: &String| h.to_lowercase() == folded) {
            continue;
        }
        let words: Vec<String> = t.split_whitespace().map(regex::escape).collect();
        let pattern = format!(r"\b{}\b", words.join(r"\s+"));
        let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
            continue;
        };
        if texts.iter().any(|text| re.is_match(text)) {
            hits.push(t.to_string());
        }
    }
    hits
}

pub fn screen_content(content: &GeneratedContent, terms: &[String]) -> Vec<String> {
    find_negative_terms(&content.visible_text(), terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(ts: &[&str]) -> Vec<String> {
        ts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_whole_words_case_insensitively() {
        let texts = ["Esse HACK de produtividade", "sem hackers aqui"];
        assert_eq!(find_negative_terms(&texts, &terms(&["hack"])), vec!["hack"]);
        assert!(find_negative_terms(&["sem hackers aqui"], &terms(&["hack"])).is_empty());
    }

    #[test]
    fn phrases_and_blanks() {
        let texts = ["Todo mundo fala de marketing   digital."];
        let found = find_negative_terms(&texts, &terms(&["", "marketing digital", "guru", "Marketing Digital"]));
        assert_eq!(found, vec!["marketing digital"]);
    }

    #[test]
    fn accented_terms_are_escaped_and_matched() {
        let texts = ["Isso é fácil (demais)."];
        assert_eq!(find_negative_terms(&texts, &terms(&["fácil"])), vec!["fácil"]);
        assert!(find_negative_terms(&texts, &terms(&["(demais"])).is_empty());
    }

    #[test]
    fn accented_duplicates_reported_once() {
        let texts = ["Ficou FÁCIL demais, é fácil"];
        assert_eq!(find_negative_terms(&texts, &terms(&["fácil", "FÁCIL", "Fácil"])), vec!["fácil"]);
    }
}
