//! Configuration template for `quarry init`.

/// Local configuration template (valid TOML).
const LOCAL_TEMPLATE: &str = include_str!("../templates/config.toml");

/// Returns the configuration template written by `quarry init`.
///
/// The template is live TOML that spells out the default settings, so a freshly
/// initialized directory behaves exactly like one without a config file, except
/// that the index is kept on disk.
pub fn local_template() -> String {
    LOCAL_TEMPLATE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScoringSettings, parse::parse_config};

    #[test]
    fn template_parses() {
        let result = parse_config(LOCAL_TEMPLATE);
        assert!(result.is_ok(), "template failed to parse: {result:?}");
    }

    #[test]
    fn template_bindings_match_defaults() {
        let raw = parse_config(LOCAL_TEMPLATE).unwrap();
        let scoring = raw.scoring.unwrap();
        let defaults = ScoringSettings::default();
        assert_eq!(scoring.leaf, defaults.leaf);
        assert_eq!(scoring.derived, defaults.derived);
    }
}
