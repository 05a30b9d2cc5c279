//! Instruction text sent to the model for each stage action.
//!
//! Every builder is a pure function of its parameters.

use crate::params::{Integration, OverlayParams, Placement};

/// Remove the background, keeping the product centered.
pub const REMOVE_BACKGROUND: &str = "Remove the background of this product image, making it \
     transparent. Keep the product and its shadow intact. The main subject should be perfectly \
     centered in the frame.";

/// Ground the product with a soft shadow.
pub const ADD_SHADOW: &str = "Add a realistic, soft shadow underneath the product to make it \
     look grounded. Do not change the product itself.";

/// General photo enhancement that leaves the product untouched.
pub const AUTO_ENHANCE: &str = "Perform automatic photo enhancements on this product image. \
     Improve brightness, contrast, and color saturation to make it look more professional. Do \
     not alter the shape or color of the product itself.";

/// Product-photo critique returned as text.
pub const ADVISE: &str = "You are an e-commerce photo expert. Analyze this product image and \
     provide three concise, actionable tips to improve its quality for a marketplace listing. \
     Focus on lighting, composition, and background. Format as a bulleted list.";

const REGENERATE_SUFFIX: &str = " Generate a completely new and different visual style and \
     layout than the previous one, while respecting all instructions.";

/// How much freedom the model has when compositing the product.
#[must_use]
pub const fn integration_clause(integration: Integration) -> &'static str {
    match integration {
        Integration::Flexible => {
            "You are allowed to slightly scale or rotate the product to fit naturally into the \
             new background."
        }
        Integration::ScaleOnly => {
            "You are allowed to scale the product, but you must not rotate or change its \
             appearance."
        }
        Integration::Strict => {
            "You must not change the product's scale, rotation, or appearance at all. Place it \
             exactly as it is."
        }
    }
}

/// Replace the background with `prompt`.
///
/// With a cutout armed the source already has a transparent background,
/// so the model is asked to place it rather than to swap the backdrop.
#[must_use]
pub fn replace_background(prompt: &str, integration: Integration, cutout_armed: bool) -> String {
    let clause = integration_clause(integration);
    if cutout_armed {
        format!(
            "Take this product image which has a transparent background and place it on a new \
             background described as: '{prompt}'. {clause} Make it look natural and realistic, \
             preserving the product's proportions."
        )
    } else {
        format!(
            "Replace the background with: {prompt}. {clause} The product should look natural in \
             the new environment. The main subject should be perfectly centered in the frame."
        )
    }
}

/// Change the product's color to `color`.
#[must_use]
pub fn recolor(color: &str) -> String {
    format!(
        "Change the color of the main product in the image to {color}. Keep the lighting and \
         texture realistic."
    )
}

/// Overlay the filled features as infographic blocks.
///
/// `language` is the language of the feature text. `regenerate` asks for
/// a layout different from the previous attempt.
#[must_use]
pub fn overlay(params: &OverlayParams, language: &str, regenerate: bool) -> String {
    let features = params
        .filled_features()
        .enumerate()
        .map(|(i, f)| {
            format!(
                "Feature {}: Text is \"{}\". Desired location is {}.",
                i + 1,
                f.text,
                f.placement.label()
            )
        })
        .collect::<Vec<_>>()
        .join(" ");

    let mut text = format!(
        "You are an expert graphic designer creating a compelling infographic for an e-commerce \
         product in {language}. Your task is to overlay the following key features onto the \
         image.\n\
         Do not just add plain text. Instead, create visually appealing graphic blocks that \
         integrate seamlessly with the product's design. These blocks should contain the text \
         and may include subtle design elements like icons, shapes, or stylized containers to \
         enhance visualization.\n\
         \n\
         Global Style Instructions:\n\
         - Overall Style: Apply a '{style}' aesthetic.\n\
         - Font: Use a clear, professional font similar to '{font}' that supports {language} \
         text.\n\
         - Font Size: Use a '{size}' size relative to the image.\n\
         - Text Clarity: The text must be perfectly clear, legible, and exactly match the \
         original text provided.\n\
         \n\
         Feature-specific Instructions:\n\
         {features}\n\
         For any feature where the location is '{auto}', use your expert judgment to find the \
         best placement that is balanced and does not obscure the product. Ensure the graphic \
         elements complement the product, not distract from it.",
        style = params.style.name(),
        font = params.font.family(),
        size = params.font_size.name(),
        auto = Placement::Auto.label(),
    );
    if regenerate {
        text.push_str(REGENERATE_SUFFIX);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Feature, Font, FontSize, OverlayStyle};

    fn overlay_params() -> OverlayParams {
        OverlayParams {
            features: [
                Feature {
                    text: "Waterproof".into(),
                    placement: Placement::TopLeft,
                },
                Feature::default(),
                Feature {
                    text: "2 year warranty".into(),
                    placement: Placement::Auto,
                },
            ],
            font: Font::Georgia,
            font_size: FontSize::Large,
            style: OverlayStyle::Modern,
        }
    }

    #[test]
    fn replace_background_depends_on_cutout() {
        let armed = replace_background("a beach", Integration::Strict, true);
        assert!(armed.starts_with("Take this product image which has a transparent background"));
        assert!(armed.contains("'a beach'"));
        assert!(armed.contains("Place it exactly as it is."));

        let plain = replace_background("a beach", Integration::Flexible, false);
        assert!(plain.starts_with("Replace the background with: a beach."));
        assert!(plain.contains("slightly scale or rotate"));
        assert!(plain.ends_with("perfectly centered in the frame."));
    }

    #[test]
    fn integration_clauses_differ() {
        let clauses = [
            integration_clause(Integration::Flexible),
            integration_clause(Integration::ScaleOnly),
            integration_clause(Integration::Strict),
        ];
        assert_ne!(clauses[0], clauses[1]);
        assert_ne!(clauses[1], clauses[2]);
        assert!(clauses[1].contains("must not rotate"));
    }

    #[test]
    fn recolor_names_the_color() {
        assert!(recolor("bright red").contains("to bright red."));
    }

    #[test]
    fn overlay_numbers_only_filled_features() {
        let text = overlay(&overlay_params(), "Russian", false);
        assert!(text.contains("Feature 1: Text is \"Waterproof\". Desired location is top-left."));
        assert!(
            text.contains("Feature 2: Text is \"2 year warranty\". Desired location is Auto.")
        );
        assert!(!text.contains("Feature 3"));
        assert!(text.contains("Apply a 'modern' aesthetic."));
        assert!(text.contains("similar to 'Georgia'"));
        assert!(text.contains("Use a 'large' size"));
        assert!(text.contains("product in Russian."));
        assert!(!text.contains("completely new and different"));
    }

    #[test]
    fn regenerate_appends_divergence_request() {
        let text = overlay(&overlay_params(), "Russian", true);
        assert!(text.ends_with(
            "Generate a completely new and different visual style and layout than the previous \
             one, while respecting all instructions."
        ));
    }
}
