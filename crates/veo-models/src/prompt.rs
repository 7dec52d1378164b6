//! Prompt enhancement for the Veo3 model.
//!
//! Veo3 accepts only a subset of the parameters clients can request, so the
//! full technical requirements are spelled out in the prompt text.

use crate::request::{AspectRatio, VideoSpec};

/// Build the prompt sent upstream from a validated spec.
pub fn enhance_prompt(spec: &VideoSpec) -> String {
    let mut prompt = format!(
        "Create a {duration}-second video with the following specifications:\n\n\
         Content: {content}\n\n\
         Technical Requirements:\n\
         - Resolution: {resolution}\n\
         - Quality: {quality}\n\
         - Aspect Ratio: {aspect} ({orientation})\n\
         - Duration: {duration} seconds\n\
         - Frame Rate: {fps} fps\n\
         - Format: {format}",
        duration = spec.duration,
        content = spec.prompt,
        resolution = spec.resolution,
        quality = spec.quality,
        aspect = spec.aspect_ratio,
        orientation = spec.aspect_ratio.orientation_hint(),
        fps = spec.fps,
        format = spec.format,
    );

    if let Some(style) = &spec.style {
        prompt.push_str(&format!("\n- Style: {}", style));
    }

    if let Some(note) = optimization_note(spec.aspect_ratio) {
        prompt.push_str("\n\nOptimization Notes: ");
        prompt.push_str(note);
    }

    prompt.push_str(
        "\n\nGenerate a high-quality, professional video that matches the prompt description \
         with smooth motion, proper lighting, and composition optimized for the specified aspect ratio.",
    );

    prompt
}

fn optimization_note(aspect: AspectRatio) -> Option<&'static str> {
    match aspect {
        AspectRatio::Portrait => Some(
            "Optimize for vertical mobile viewing, ensure key elements are centered vertically, \
             use larger text and clear visuals suitable for smartphone screens.",
        ),
        AspectRatio::Square => Some(
            "Optimize for square social media format, ensure content fits well within square \
             boundaries, center important elements.",
        ),
        AspectRatio::Widescreen => Some(
            "Create cinematic widescreen content, utilize the wide format for panoramic shots \
             or dramatic compositions.",
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{GenerationLimits, VideoGenerationRequest};

    fn spec(aspect: &str, style: Option<&str>) -> VideoSpec {
        let mut request = VideoGenerationRequest::with_prompt("A golden retriever in sunflowers");
        request.aspect_ratio = Some(aspect.to_string());
        request.style = style.map(str::to_string);
        request.duration = Some(8);
        request.validate_with(&GenerationLimits::default()).unwrap()
    }

    #[test]
    fn test_enhanced_prompt_carries_parameters() {
        let prompt = enhance_prompt(&spec("16:9", None));

        assert!(prompt.starts_with("Create a 8-second video"));
        assert!(prompt.contains("Content: A golden retriever in sunflowers"));
        assert!(prompt.contains("- Resolution: 720p"));
        assert!(prompt.contains("- Aspect Ratio: 16:9 (landscape orientation"));
        assert!(prompt.contains("- Frame Rate: 30 fps"));
        assert!(prompt.contains("- Format: mp4"));
        assert!(!prompt.contains("- Style:"));
        assert!(!prompt.contains("Optimization Notes"));
    }

    #[test]
    fn test_style_and_portrait_notes() {
        let prompt = enhance_prompt(&spec("9:16", Some("film noir")));

        assert!(prompt.contains("- Style: film noir"));
        assert!(prompt.contains("Optimization Notes: Optimize for vertical mobile viewing"));
    }
}
