//! Wardrobe application: tint target, morph pulse and style descriptor

use crate::motion::SubjectMotion;
use studio_catalog::{Outfit, Tint};
use studio_core::Color;

/// Prompt fragment describing what the subject wears. Empty without an outfit.
pub fn style_descriptor(outfit: Option<&Outfit>, tint: &Tint) -> String {
    match outfit {
        Some(outfit) => format!(
            "wearing a {} {}, material: {}, texture: {}, fit: {}",
            tint.name.to_lowercase(),
            outfit.prompt_modifier,
            outfit.material,
            outfit.texture,
            outfit.fit
        ),
        None => String::new(),
    }
}

/// Color the subject eases toward: the tint while dressed, neutral white otherwise
pub fn tint_target(outfit: Option<&Outfit>, tint: &Tint) -> Color {
    match outfit {
        Some(_) => tint.hex,
        None => Color::WHITE,
    }
}

/// Applies outfit and tint selections to the subject motion and tracks the
/// last descriptor handed downstream
#[derive(Debug, Default)]
pub struct AppearanceController {
    descriptor: Option<String>,
}

impl AppearanceController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retarget the subject color and optionally restart the morph pulse.
    /// Returns the descriptor when it differs from the last one returned.
    pub fn apply(
        &mut self,
        outfit: Option<&Outfit>,
        tint: &Tint,
        motion: &mut SubjectMotion,
        pulse: bool,
    ) -> Option<String> {
        motion.target_color = tint_target(outfit, tint);
        if pulse {
            motion.pulse();
        }

        let descriptor = style_descriptor(outfit, tint);
        if self.descriptor.as_ref() == Some(&descriptor) {
            return None;
        }
        log::debug!("Style descriptor: {:?}", descriptor);
        self.descriptor = Some(descriptor.clone());
        Some(descriptor)
    }

    pub fn descriptor(&self) -> &str {
        self.descriptor.as_deref().unwrap_or("")
    }
}
