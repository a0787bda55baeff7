//! Request configuration builder.
//!
//! One builder, keyed by call purpose, replaces per-call-site payload
//! literals. Chat requests resolve their parameters from settings with
//! documented defaults; the image-generation endpoint runs with its own
//! fixed parameter block.

use crate::settings::Settings;

use super::types::{
    GenerationConfig, HarmBlockThreshold, HarmCategory, SafetySetting, SystemInstruction,
};

/// Which endpoint a request is being built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPurpose {
    /// General multimodal chat.
    Chat,
    /// Dedicated image generation.
    ImageGeneration,
}

impl CallPurpose {
    /// Model served by this purpose's endpoint.
    pub fn model(&self) -> &'static str {
        match self {
            CallPurpose::Chat => "gemini-2.0-flash",
            CallPurpose::ImageGeneration => "gemini-2.0-flash-exp-image-generation",
        }
    }
}

impl HarmCategory {
    /// Settings key holding this category's threshold level.
    pub fn settings_key(&self) -> &'static str {
        match self {
            HarmCategory::Harassment => "harassmentThreshold",
            HarmCategory::HateSpeech => "hateSpeechThreshold",
            HarmCategory::SexuallyExplicit => "sexuallyExplicitThreshold",
            HarmCategory::DangerousContent => "dangerousContentThreshold",
            HarmCategory::CivicIntegrity => "civicIntegrityThreshold",
        }
    }
}

/// Categories configurable through settings, in request order.
const SETTINGS_CATEGORIES: [HarmCategory; 5] = [
    HarmCategory::Harassment,
    HarmCategory::DangerousContent,
    HarmCategory::SexuallyExplicit,
    HarmCategory::HateSpeech,
    HarmCategory::CivicIntegrity,
];

/// Categories pinned by the image-generation endpoint.
const IMAGE_CATEGORIES: [HarmCategory; 4] = [
    HarmCategory::Harassment,
    HarmCategory::HateSpeech,
    HarmCategory::SexuallyExplicit,
    HarmCategory::DangerousContent,
];

/// Map a stored threshold level to the wire enforcement level.
///
/// Levels 0-3 select increasingly aggressive blocking. Anything else
/// (missing, out of range, non-numeric) is the unspecified sentinel,
/// never a parse failure.
pub fn threshold_from_level(level: Option<&str>) -> HarmBlockThreshold {
    match level.map(str::trim).and_then(|v| v.parse::<u32>().ok()) {
        Some(0) => HarmBlockThreshold::BlockNone,
        Some(1) => HarmBlockThreshold::BlockOnlyHigh,
        Some(2) => HarmBlockThreshold::BlockMediumAndAbove,
        Some(3) => HarmBlockThreshold::BlockLowAndAbove,
        _ => HarmBlockThreshold::Unspecified,
    }
}

/// Fully-resolved configuration for one outbound request.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub generation: GenerationConfig,
    pub system_instruction: Option<SystemInstruction>,
    pub safety_settings: Vec<SafetySetting>,
}

impl RequestConfig {
    /// Build the configuration for one request.
    ///
    /// Pure function of the settings snapshot: absent or unparsable
    /// values resolve to documented defaults, never to an error.
    pub fn build(purpose: CallPurpose, settings: &Settings) -> Self {
        match purpose {
            CallPurpose::Chat => Self::for_chat(settings),
            CallPurpose::ImageGeneration => Self::for_image_generation(),
        }
    }

    fn for_chat(settings: &Settings) -> Self {
        let generation = GenerationConfig {
            temperature: settings.get_f32_or("temperature", 1.0),
            top_p: settings.get_f32_or("top_p", 0.95),
            top_k: settings.get_u32_or("top_k", 40),
            max_output_tokens: settings.get_u32_or("maxOutputTokens", 8192),
            candidate_count: 1,
            stop_sequences: Vec::new(),
            response_modalities: response_modalities(),
            response_mime_type: "text/plain".to_string(),
        };

        let safety_settings = SETTINGS_CATEGORIES
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold: threshold_from_level(settings.get(category.settings_key())),
            })
            .collect();

        Self {
            generation,
            system_instruction: Some(SystemInstruction::from_text(
                settings.system_instructions(),
            )),
            safety_settings,
        }
    }

    fn for_image_generation() -> Self {
        let generation = GenerationConfig {
            temperature: 0.4,
            top_p: 1.0,
            top_k: 32,
            max_output_tokens: 2048,
            candidate_count: 1,
            stop_sequences: Vec::new(),
            response_modalities: response_modalities(),
            response_mime_type: "text/plain".to_string(),
        };

        let safety_settings = IMAGE_CATEGORIES
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold: HarmBlockThreshold::BlockMediumAndAbove,
            })
            .collect();

        Self {
            generation,
            system_instruction: None,
            safety_settings,
        }
    }
}

fn response_modalities() -> Vec<String> {
    vec!["Text".to_string(), "Image".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_defaults_when_settings_absent() {
        let config = RequestConfig::build(CallPurpose::Chat, &Settings::new());

        assert_eq!(config.generation.temperature, 1.0);
        assert_eq!(config.generation.top_p, 0.95);
        assert_eq!(config.generation.top_k, 40);
        assert_eq!(config.generation.max_output_tokens, 8192);
        assert_eq!(config.generation.candidate_count, 1);
        assert!(config.generation.stop_sequences.is_empty());
        assert_eq!(config.generation.response_modalities, vec!["Text", "Image"]);
        assert!(config.system_instruction.is_some());
    }

    #[test]
    fn test_chat_parses_valid_settings_exactly() {
        let mut settings = Settings::new();
        settings.set("temperature", "0.3");
        settings.set("top_p", "0.5");
        settings.set("top_k", "12");
        settings.set("maxOutputTokens", "1024");

        let config = RequestConfig::build(CallPurpose::Chat, &settings);
        assert_eq!(config.generation.temperature, 0.3);
        assert_eq!(config.generation.top_p, 0.5);
        assert_eq!(config.generation.top_k, 12);
        assert_eq!(config.generation.max_output_tokens, 1024);
    }

    #[test]
    fn test_chat_defaults_on_unparsable_settings() {
        let mut settings = Settings::new();
        settings.set("temperature", "warm");
        settings.set("top_k", "-3");

        let config = RequestConfig::build(CallPurpose::Chat, &settings);
        assert_eq!(config.generation.temperature, 1.0);
        assert_eq!(config.generation.top_k, 40);
    }

    #[test]
    fn test_threshold_level_mapping() {
        assert_eq!(
            threshold_from_level(Some("0")),
            HarmBlockThreshold::BlockNone
        );
        assert_eq!(
            threshold_from_level(Some("1")),
            HarmBlockThreshold::BlockOnlyHigh
        );
        assert_eq!(
            threshold_from_level(Some("2")),
            HarmBlockThreshold::BlockMediumAndAbove
        );
        assert_eq!(
            threshold_from_level(Some("3")),
            HarmBlockThreshold::BlockLowAndAbove
        );
    }

    #[test]
    fn test_threshold_sentinel_for_unrecognized_levels() {
        assert_eq!(threshold_from_level(None), HarmBlockThreshold::Unspecified);
        assert_eq!(
            threshold_from_level(Some("4")),
            HarmBlockThreshold::Unspecified
        );
        assert_eq!(
            threshold_from_level(Some("-1")),
            HarmBlockThreshold::Unspecified
        );
        assert_eq!(
            threshold_from_level(Some("high")),
            HarmBlockThreshold::Unspecified
        );
        assert_eq!(
            threshold_from_level(Some("")),
            HarmBlockThreshold::Unspecified
        );
    }

    #[test]
    fn test_chat_reads_threshold_levels_per_category() {
        let mut settings = Settings::new();
        settings.set("harassmentThreshold", "2");
        settings.set("civicIntegrityThreshold", "0");

        let config = RequestConfig::build(CallPurpose::Chat, &settings);
        assert_eq!(config.safety_settings.len(), 5);

        let find = |category: HarmCategory| {
            config
                .safety_settings
                .iter()
                .find(|s| s.category == category)
                .map(|s| s.threshold)
                .unwrap()
        };
        assert_eq!(
            find(HarmCategory::Harassment),
            HarmBlockThreshold::BlockMediumAndAbove
        );
        assert_eq!(
            find(HarmCategory::CivicIntegrity),
            HarmBlockThreshold::BlockNone
        );
        assert_eq!(
            find(HarmCategory::HateSpeech),
            HarmBlockThreshold::Unspecified
        );
    }

    #[test]
    fn test_image_generation_uses_fixed_parameters() {
        let mut settings = Settings::new();
        settings.set("temperature", "0.9");

        let config = RequestConfig::build(CallPurpose::ImageGeneration, &settings);
        assert_eq!(config.generation.temperature, 0.4);
        assert_eq!(config.generation.top_p, 1.0);
        assert_eq!(config.generation.top_k, 32);
        assert_eq!(config.generation.max_output_tokens, 2048);
        assert!(config.system_instruction.is_none());

        assert_eq!(config.safety_settings.len(), 4);
        assert!(config
            .safety_settings
            .iter()
            .all(|s| s.threshold == HarmBlockThreshold::BlockMediumAndAbove));
    }

    #[test]
    fn test_purpose_models() {
        assert_eq!(CallPurpose::Chat.model(), "gemini-2.0-flash");
        assert_eq!(
            CallPurpose::ImageGeneration.model(),
            "gemini-2.0-flash-exp-image-generation"
        );
    }
}
