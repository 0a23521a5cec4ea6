//! Per-model-family request features
//!
//! Families are matched by the longest prefix of the model id, so
//! `gpt-4o-mini-2024-07-18` picks the `gpt-4o` row over `gpt-4`. New
//! families are added here instead of in adapter code.

/// Request features a model family accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCapabilities {
    /// Accepts a sampling `temperature` parameter
    pub temperature: bool,
    /// Accepts a structured JSON response mode
    pub json_mode: bool,
}

impl ModelCapabilities {
    pub const fn new(temperature: bool, json_mode: bool) -> Self {
        Self { temperature, json_mode }
    }
}

/// Family prefix and its capabilities
pub type CapabilityTable = &'static [(&'static str, ModelCapabilities)];

/// Used when no family matches
pub const UNKNOWN_FAMILY: ModelCapabilities = ModelCapabilities::new(true, false);

pub const OPENAI_FAMILIES: CapabilityTable = &[
    // Reasoning models reject temperature
    ("gpt-5", ModelCapabilities::new(false, true)),
    ("o1", ModelCapabilities::new(false, true)),
    ("o1-mini", ModelCapabilities::new(false, false)),
    ("o3", ModelCapabilities::new(false, true)),
    ("o4", ModelCapabilities::new(false, true)),
    ("gpt-4.1", ModelCapabilities::new(true, true)),
    ("gpt-4o", ModelCapabilities::new(true, true)),
    ("chatgpt-4o", ModelCapabilities::new(true, true)),
    ("gpt-4-turbo", ModelCapabilities::new(true, true)),
    ("gpt-4", ModelCapabilities::new(true, false)),
    ("gpt-3.5-turbo", ModelCapabilities::new(true, true)),
];

pub const GEMINI_FAMILIES: CapabilityTable = &[
    ("gemini-1.0", ModelCapabilities::new(true, false)),
    ("gemini-1.5", ModelCapabilities::new(true, true)),
    ("gemini-2", ModelCapabilities::new(true, true)),
    ("gemini-3", ModelCapabilities::new(true, true)),
];

/// Longest-prefix lookup of `model` in `table`
pub fn lookup(table: CapabilityTable, model: &str) -> ModelCapabilities {
    table
        .iter()
        .filter(|(prefix, _)| model.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, caps)| *caps)
        .unwrap_or(UNKNOWN_FAMILY)
}

/// Whether `model` belongs to any family in `table`
pub fn is_known_family(table: CapabilityTable, model: &str) -> bool {
    table.iter().any(|(prefix, _)| model.starts_with(prefix))
}
