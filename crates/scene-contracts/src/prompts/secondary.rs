use std::fmt::Write as _;

use super::aesthetic::continuity_block;
use super::fidelity::{FIDELITY_LOCK_BLOCK, PRIORITY_STATEMENT, SECONDARY_INPUT_DESCRIPTION};
use crate::category::ProductCategory;
use crate::error::{PipelineError, PipelineResult};
use crate::selection::SceneSelection;

struct SecondaryProfile {
    preserve: &'static [&'static str],
    depth_cues: &'static [&'static str],
}

const WALL_ART: SecondaryProfile = SecondaryProfile {
    preserve: &[
        "Same room, same furniture, same wall art, same materials and colors",
        "Same lighting direction and warmth",
        "Same casual, lived-in styling (draped throws, tossed pillows, natural arrangements)",
    ],
    depth_cues: &[
        "Floor planks or tiles must converge toward a vanishing point",
        "The side wall should be visible, receding into depth",
        "The sofa should show its side profile and arm structure",
        "The wall art should appear foreshortened, narrower on the far side, with its artwork unchanged",
        "Objects closer to the camera should appear larger than those further away",
        "The room corner or adjacent wall may become visible from this angle",
    ],
};

const SHELF: SecondaryProfile = SecondaryProfile {
    preserve: &[
        "Same room, same furniture, same shelf, same decorative props, same materials and colors",
        "Same lighting direction and warmth",
        "Same casual, lived-in styling (draped throws, tossed pillows, natural arrangements)",
    ],
    depth_cues: &[
        "Floor planks or tiles must converge toward a vanishing point",
        "The side wall should be visible, receding into depth",
        "The shelf should show its depth, thickness, and side profile",
        "Props on the shelf should reveal their three-dimensional form from this angle",
        "The sofa should show its side profile, arm structure, and depth",
        "Objects closer to the camera should appear larger than those further away",
        "The room corner or adjacent wall may become visible from this angle",
    ],
};

fn profile(category: ProductCategory) -> &'static SecondaryProfile {
    match category {
        ProductCategory::WallArt => &WALL_ART,
        ProductCategory::Shelf => &SHELF,
    }
}

fn push_list(out: &mut String, items: &[&str]) {
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
}

pub(crate) fn render(selection: &SceneSelection) -> PipelineResult<String> {
    let Some(camera_angle) = &selection.camera_angle else {
        return Err(PipelineError::validation(
            "secondary view requires a camera angle selection",
        ));
    };
    let subject = selection.category.subject();
    let profile = profile(selection.category);
    let accents = &selection.accents;
    let mut out = String::new();

    out.push_str("<system_context>\n");
    out.push_str("TASK: Re-render the provided reference image from a 3/4 camera angle.\n");
    out.push_str("ENGINE_MODE: Perspective Shift\n");
    let _ = writeln!(
        out,
        "FIDELITY_TARGET: Preserve Asset_1 ({subject}) and the entire room exactly as photographed"
    );
    out.push_str("</system_context>\n\n");

    out.push_str("<camera_geometry>\n");
    let _ = writeln!(out, "- {}", camera_angle.text);
    push_list(
        &mut out,
        &[
            "Eye-level height, 35mm lens",
            "REQUIRED: an oblique three-quarter view; a head-on or frontal framing is a failed render",
            &format!(
                "The image must show clear perspective: converging lines on walls and floor, foreshortening on the {subject}, visible depth between foreground and background"
            ),
        ],
    );
    out.push_str("</camera_geometry>\n\n");

    out.push_str(FIDELITY_LOCK_BLOCK);
    out.push_str("\n\n");
    out.push_str(SECONDARY_INPUT_DESCRIPTION);
    out.push_str("\n\n");

    out.push_str(&continuity_block());
    out.push_str("\n\n");

    out.push_str("<scene_specification>\n");
    out.push_str("PRESERVE FROM REFERENCE:\n");
    push_list(&mut out, profile.preserve);
    // Lighting and accents drawn without a primary selection describe nothing
    // the reference is known to contain.
    if selection.inherits_primary {
        let _ = writeln!(out, "- Light: {}", selection.lighting_direction.text);
        out.push_str("\nBRAND ACCENTS TO KEEP (each must remain visible from the new angle):\n");
    } else {
        out.push_str("\nBRAND ACCENT HINTS (keep the accents the reference already shows; use these only where the reference has none):\n");
    }
    let _ = writeln!(out, "- Fresh flowers: {}", accents.fresh_flowers.text);
    let _ = writeln!(out, "- Metallic accent: {}", accents.metallic_accent.text);
    let _ = writeln!(out, "- Woven texture: {}", accents.woven_texture.text);
    let _ = writeln!(out, "- Lived-in detail: {}", accents.lived_in_detail.text);
    if selection.inherits_primary {
        out.push_str("If the reference shows an accent differently from the wording above, keep the reference's version.\n");
    }
    out.push_str("</scene_specification>\n\n");

    out.push_str("<placement_rules>\n");
    out.push_str("DEPTH CUES (important):\n");
    push_list(&mut out, profile.depth_cues);
    let _ = writeln!(
        out,
        "- The {subject} keeps its real-world size relative to the sofa; only perspective changes"
    );
    out.push_str("</placement_rules>\n\n");

    out.push_str("<fidelity_instructions>\n");
    out.push_str("PRESERVE EVERYTHING ELSE:\n");
    push_list(
        &mut out,
        &[
            "Do not add, remove, restyle or recolor any object from the reference",
            "Do not change wall, floor, sofa or prop materials",
        ],
    );
    let _ = writeln!(
        out,
        "- The {subject} must keep its exact colors, texture and finish; only its perspective changes"
    );
    out.push_str("\nOUTPUT:\nA photorealistic photograph of the same room, taken from a 3/4 angle. It should feel like a second photograph taken in the same room by moving the camera to the side.\n");
    let _ = writeln!(out, "\n{PRIORITY_STATEMENT}");
    out.push_str("</fidelity_instructions>");
    Ok(out)
}
