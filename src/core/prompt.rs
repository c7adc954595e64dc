use crate::core::{DocumentType, ProcessingMode};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fmt::Display;

/// Key of the placeholder that structured templates use for the field list.
pub const FIELD_LIST_KEY: &str = "field_list";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("placeholder pattern is valid"));

pub struct PromptBuilder;

impl PromptBuilder {
    /// Renders the instruction text for one document type.
    ///
    /// Generic templates are returned verbatim. Structured templates get every
    /// `{{field_list}}` replaced by the field ids joined with ", "; a template
    /// without the placeholder simply does not mention the fields.
    pub fn build(doc: &DocumentType) -> String {
        match doc.processing_mode {
            ProcessingMode::Generic => doc.prompt_template.clone(),
            ProcessingMode::Structured => {
                Self::build_custom(&doc.prompt_template, [(FIELD_LIST_KEY, doc.field_list())])
            }
        }
    }

    /// Replaces each `{{key}}` in `template` with the matching substitution.
    ///
    /// The template is scanned once, so a substituted value that itself looks
    /// like a placeholder is never expanded again. Unknown placeholders stay
    /// as written; unused keys are ignored.
    pub fn build_custom<K, V, I>(template: &str, substitutions: I) -> String
    where
        K: Into<String>,
        V: Display,
        I: IntoIterator<Item = (K, V)>,
    {
        let values: HashMap<String, String> = substitutions
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();

        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match values.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}
