//! Image metadata (generation parameters) and its edit form.
//!
//! [`ImageMeta`] is what gets stored on an entry. [`MetaForm`] mirrors
//! the edit popover: raw, possibly empty inputs. Submitting a form with
//! every field empty yields `None`, which clears the entry's metadata
//! instead of storing an empty structure.

use serde::{Deserialize, Serialize};

/// Upper bound of the guidance scale input.
pub const MAX_CFG_SCALE: f64 = 30.0;

/// Sampler names offered by the edit form.
pub const SAMPLERS: &[&str] = &[
    "Euler a",
    "Euler",
    "LMS",
    "Heun",
    "DPM2",
    "DPM2 a",
    "DPM fast",
    "DPM adaptive",
    "LMS Karras",
    "DPM2 Karras",
    "DPM2 a Karras",
    "DDIM",
    "PLMS",
];

/// Structured annotation of an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cfg_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ImageMeta {
    /// Number of populated fields.
    pub fn field_count(&self) -> usize {
        [
            self.prompt.is_some(),
            self.negative_prompt.is_some(),
            self.cfg_scale.is_some(),
            self.steps.is_some(),
            self.sampler.is_some(),
            self.seed.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }

    /// Pre-fill an edit form with this annotation.
    pub fn to_form(&self) -> MetaForm {
        MetaForm {
            prompt: self.prompt.clone().unwrap_or_default(),
            negative_prompt: self.negative_prompt.clone().unwrap_or_default(),
            cfg_scale: self.cfg_scale,
            steps: self.steps,
            sampler: self.sampler.clone(),
            seed: self.seed,
        }
    }
}

/// Raw contents of the metadata edit form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaForm {
    pub prompt: String,
    pub negative_prompt: String,
    pub cfg_scale: Option<f64>,
    pub steps: Option<u32>,
    pub sampler: Option<String>,
    pub seed: Option<u64>,
}

impl MetaForm {
    /// Form for an entry's current metadata (empty when absent).
    pub fn from_meta(meta: Option<&ImageMeta>) -> Self {
        meta.map(ImageMeta::to_form).unwrap_or_default()
    }

    /// Build the annotation to store.
    ///
    /// Empty strings and zero numbers count as unset. Returns `None`
    /// when nothing is left, meaning "clear".
    pub fn submit(&self) -> Option<ImageMeta> {
        let meta = ImageMeta {
            prompt: non_blank(&self.prompt),
            negative_prompt: non_blank(&self.negative_prompt),
            cfg_scale: self
                .cfg_scale
                .filter(|v| v.is_finite() && *v != 0.0)
                .map(|v| v.clamp(0.0, MAX_CFG_SCALE)),
            steps: self.steps.filter(|v| *v != 0),
            sampler: self.sampler.as_deref().and_then(non_blank),
            seed: self.seed.filter(|v| *v != 0),
        };

        if meta.is_empty() {
            None
        } else {
            Some(meta)
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse `key=value` pairs (CLI `--meta` flags) into a form.
///
/// Keys: `prompt`, `negativePrompt`, `cfgScale`, `steps`, `sampler`, `seed`.
pub fn parse_meta_pairs<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<MetaForm, String> {
    let mut form = MetaForm::default();

    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{}'", pair))?;
        let value = value.trim();

        match key.trim() {
            "prompt" => form.prompt = value.to_string(),
            "negativePrompt" | "negative_prompt" => form.negative_prompt = value.to_string(),
            "cfgScale" | "cfg_scale" => {
                form.cfg_scale = Some(value.parse().map_err(|_| format!("invalid cfgScale '{}'", value))?)
            }
            "steps" => form.steps = Some(value.parse().map_err(|_| format!("invalid steps '{}'", value))?),
            "sampler" => {
                if !SAMPLERS.contains(&value) {
                    log::warn!("Unknown sampler '{}'", value);
                }
                form.sampler = Some(value.to_string());
            }
            "seed" => form.seed = Some(value.parse().map_err(|_| format!("invalid seed '{}'", value))?),
            other => return Err(format!("unknown metadata field '{}'", other)),
        }
    }

    Ok(form)
}
