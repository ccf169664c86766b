//! Text analysis for analyzed fields.
//!
//! Titles run through `SimpleTokenizer`, `LowerCaser`, `RemoveLongFilter` and a
//! language-specific `Stemmer`. `Match` queries use the same analyzer, so query
//! text and indexed text always agree on token boundaries and stems.

use tantivy::{
    Index,
    tokenizer::{Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer},
};

use crate::IndexError;

/// Name of the tokenizer registered for analyzed fields.
pub const QUARRY_TOKENIZER: &str = "quarry_text";

/// Maximum token length in bytes before filtering.
const MAX_TOKEN_LENGTH: usize = 40;

/// Stemmer languages by configuration name.
const LANGUAGES: [(&str, Language); 18] = [
    ("arabic", Language::Arabic),
    ("danish", Language::Danish),
    ("dutch", Language::Dutch),
    ("english", Language::English),
    ("finnish", Language::Finnish),
    ("french", Language::French),
    ("german", Language::German),
    ("greek", Language::Greek),
    ("hungarian", Language::Hungarian),
    ("italian", Language::Italian),
    ("norwegian", Language::Norwegian),
    ("portuguese", Language::Portuguese),
    ("romanian", Language::Romanian),
    ("russian", Language::Russian),
    ("spanish", Language::Spanish),
    ("swedish", Language::Swedish),
    ("tamil", Language::Tamil),
    ("turkish", Language::Turkish),
];

/// Parses a case-insensitive stemmer language name.
pub fn parse_language(name: &str) -> Result<Language, IndexError> {
    let lowered = name.to_lowercase();
    LANGUAGES
        .iter()
        .find(|(candidate, _)| *candidate == lowered)
        .map(|(_, language)| *language)
        .ok_or(IndexError::InvalidLanguage(lowered))
}

/// Builds the analyzer for the given stemmer language.
pub fn build_analyzer(language: Language) -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH))
        .filter(Stemmer::new(language))
        .build()
}

/// Registers the quarry analyzer on an index under [`QUARRY_TOKENIZER`].
pub fn register_analyzer(index: &Index, language_name: &str) -> Result<(), IndexError> {
    let language = parse_language(language_name)?;
    index
        .tokenizers()
        .register(QUARRY_TOKENIZER, build_analyzer(language));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::iter;

    use tantivy::tokenizer::TokenStream;

    use super::*;
    use crate::IndexSchema;

    /// Runs `text` through the English analyzer.
    fn analyze(text: &str) -> Vec<String> {
        let mut analyzer = build_analyzer(Language::English);
        let mut stream = analyzer.token_stream(text);
        iter::from_fn(|| stream.next().map(|t| t.text.clone())).collect()
    }

    #[test]
    fn languages_case_insensitive() {
        assert_eq!(parse_language("English").unwrap(), Language::English);
        assert_eq!(parse_language("TURKISH").unwrap(), Language::Turkish);
        for (name, language) in LANGUAGES {
            assert_eq!(parse_language(name).unwrap(), language);
        }
    }

    #[test]
    fn unknown_language() {
        let err = parse_language("Klingon").unwrap_err();
        assert!(err.to_string().contains("klingon"));
    }

    #[test]
    fn titles_lowercased_and_stemmed() {
        assert_eq!(analyze("Lucene in Action"), vec!["lucen", "in", "action"]);
        assert_eq!(analyze("Managing Gigabytes"), vec!["manag", "gigabyt"]);
    }

    #[test]
    fn query_text_matches_title_stems() {
        assert_eq!(analyze("lucene"), analyze("Lucene"));
        assert_eq!(analyze("managed"), analyze("Managing"));
    }

    #[test]
    fn long_tokens_dropped() {
        let text = format!("short {} word", "x".repeat(50));
        assert_eq!(analyze(&text), vec!["short", "word"]);
    }

    #[test]
    fn registers_on_index() {
        let index = Index::create_in_ram(IndexSchema::new().schema().clone());
        register_analyzer(&index, "english").unwrap();
        assert!(index.tokenizers().get(QUARRY_TOKENIZER).is_some());
        assert!(register_analyzer(&index, "elvish").is_err());
    }
}
