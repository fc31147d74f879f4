use std::fmt::Write as _;

use super::aesthetic::aesthetic_block;
use super::fidelity::{FIDELITY_LOCK_BLOCK, PRIMARY_INPUT_DESCRIPTION, PRIORITY_STATEMENT};
use crate::category::ProductCategory;
use crate::error::{PipelineError, PipelineResult};
use crate::selection::SceneSelection;

/// Fixed, per-category wording for the head-on render.
struct PrimaryProfile {
    task: &'static str,
    engine_mode: &'static str,
    sofa_placement: &'static str,
    environment_note: &'static str,
    placement_heading: &'static str,
    placement_rules: &'static [&'static str],
    identity_lock: &'static [&'static str],
    shadow_rules: &'static [&'static str],
    alpha_rules: &'static [&'static str],
    output: &'static str,
}

const WALL_ART: PrimaryProfile = PrimaryProfile {
    task: "Physics-Aware Compositing",
    engine_mode: "High-Fidelity Scene Generation",
    sofa_placement: "The sofa is centered on the back wall directly beneath the wall art.",
    environment_note: "Render the back wall texture visible through any transparent or alpha regions in the wall art",
    placement_heading: "WALL ART PLACEMENT & SCALE",
    placement_rules: &[
        "The provided wall art image must be mounted flat on the back wall as the focal point of the composition",
        "Scale Constraint: The wall art must occupy between 30% and 40% of the total image width",
        "Proportional Anchoring: The wall art should be roughly 2/3 the width of the sofa positioned beneath it",
        "Vertical Alignment: Hang the wall art so its center sits at standing eye level, with its bottom edge 20-25cm (8-10 inches) above the sofa back",
        "Negative Space: Keep generous empty wall on both sides of the wall art; no other wall decor may compete with it",
    ],
    identity_lock: &[
        "Do NOT apply style transfer to the wall art",
        "Do NOT smooth or enhance the wall art texture",
        "Do NOT modify the wall art's colors, contrast, or saturation",
        "The AI is the architect for the sofa, rug, props and room ONLY",
        "The wall art must appear exactly as provided in the input",
    ],
    shadow_rules: &[
        "Cast soft, realistic contact shadows from the wall art onto the wall behind it",
        "Shadows must fall opposite the light source and stay low contrast",
    ],
    alpha_rules: &[
        "If the wall art has transparent regions, the wall must be visible through them",
        "Maintain crisp edges where the wall art meets its frame or border",
        "No artificial glow or halo effects around the wall art edges",
    ],
    output: "Generate a photorealistic lifestyle scene featuring the provided wall art as the immutable focal point. The scene should feel aspirational, lived-in, and consistent with high-end interior photography.",
};

const SHELF: PrimaryProfile = PrimaryProfile {
    task: "Contextual Prop Generation",
    engine_mode: "High-Fidelity Scene Generation with Surface-Aware Object Placement",
    sofa_placement: "The sofa is positioned against the back wall directly beneath the shelf.",
    environment_note: "The back wall must be visible through any open brackets, gaps, or transparent regions of the shelf",
    placement_heading: "SHELF PLACEMENT & SCALE",
    placement_rules: &[
        "The provided shelf image is mounted on the wall",
        "Scale Constraint: The shelf is a wall-mounted accent piece; it must occupy no more than 25-30% of the total image width",
        "Proportional Anchoring: The shelf should be exactly 1/3 the width of the sofa positioned directly below it",
        "Vertical Alignment: Position the bottom of the shelf approximately 40-50cm (15-20 inches) above the top of the sofa",
        "Negative Space: Maintain at least 60cm (2 feet) of empty wall on the left and right sides of the shelf",
        "Real-world Dimensions: Render the shelf at a realistic decorative scale, approximately 60-90cm (2-3 feet) wide",
        "Visual Hierarchy: The sofa is the largest, most dominant piece of furniture; the shelf is a delicate secondary element and must not be cropped tightly",
    ],
    identity_lock: &[
        "Do NOT modify, enhance, or re-render the shelf texture",
        "Do NOT change the shelf's color, finish, or material appearance",
        "Do NOT warp or adjust the shelf's geometry",
        "The AI generates ONLY: sofa, background wall, floor, accents and decorative props",
        "The shelf pixels must remain exactly as provided",
    ],
    shadow_rules: &[
        "Cast realistic shadows from generated props onto the shelf surface",
        "Cast soft shadows from the shelf brackets and props onto the wall behind",
        "Shadows must fall opposite the light source and stay low contrast",
    ],
    alpha_rules: &[
        "The back wall must be visible through all open brackets and gaps in the shelf",
        "Maintain crisp edges where the shelf meets the wall",
        "No artificial glow or halo effects around shelf edges",
    ],
    output: "Generate a photorealistic lifestyle scene featuring the provided shelf as an immutable element, styled with the specified props. The scene should feel authentic to high-end interior photography and home staging.",
};

const PROP_PHYSICS_RULES: &[&str] = &[
    "All props must rest naturally on the shelf's top plane",
    "Props must respect gravity; no floating objects",
    "Props should cast realistic shadows onto the shelf surface",
    "Arrange props with intentional asymmetry for a styled, lived-in look",
    "Props must not extend beyond shelf edges unless intentionally draped",
];

fn profile(category: ProductCategory) -> &'static PrimaryProfile {
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
    let (Some(wall), Some(floor), Some(sofa)) =
        (&selection.wall, &selection.floor, &selection.sofa)
    else {
        return Err(PipelineError::validation(
            "primary view requires wall, floor and sofa selections",
        ));
    };
    let category = selection.category;
    let subject = category.subject();
    let profile = profile(category);
    let accents = &selection.accents;
    let mut out = String::new();

    let _ = writeln!(out, "<system_context>");
    let _ = writeln!(out, "TASK: {}", profile.task);
    let _ = writeln!(out, "ENGINE_MODE: {}", profile.engine_mode);
    let _ = writeln!(
        out,
        "FIDELITY_TARGET: Preserve Asset_1 ({subject}) with absolute pixel accuracy"
    );
    out.push_str("</system_context>\n\n");

    out.push_str("<camera_geometry>\n");
    push_list(
        &mut out,
        &[
            "Lens: 35mm environmental lens, rectilinear projection, f/8.0 deep focus",
            "Viewpoint: Eye-level, orthogonal frontal view at 90 degrees to the wall plane",
            "Camera parameters: Roll 0, Pitch 0, Yaw 0; no parallax, no perspective distortion, no keystone effect",
            "Vertical lines perfectly vertical, horizontal lines perfectly horizontal, flat wall plane rendering",
            "FORBIDDEN: oblique, rotated, tilted or three-quarter framing of any kind",
        ],
    );
    out.push_str("</camera_geometry>\n\n");

    out.push_str(FIDELITY_LOCK_BLOCK);
    out.push_str("\n\n");
    out.push_str(PRIMARY_INPUT_DESCRIPTION);
    out.push_str("\n\n");

    out.push_str("<reference_guidance>\n");
    out.push_str(&aesthetic_block());
    out.push_str("\n\nAESTHETIC DIRECTION:\n");
    push_list(
        &mut out,
        &[
            "Any reference images demonstrate target lighting quality, material palette and prop styling",
            "Use references to guide atmosphere and texture choices, never to override the scene structure",
        ],
    );
    out.push_str("</reference_guidance>\n\n");

    out.push_str("<scene_specification>\n");
    out.push_str("GENERATIVE SUBJECT:\n");
    let _ = writeln!(out, "{} {}", sofa.text, profile.sofa_placement);
    out.push_str("\nENVIRONMENT:\n");
    let _ = writeln!(out, "- Back Wall: {}", wall.text);
    let _ = writeln!(out, "- Flooring: {}", floor.text);
    let _ = writeln!(out, "- Light: {}", selection.lighting_direction.text);
    let _ = writeln!(out, "- {}", profile.environment_note);
    out.push_str("\nMANDATORY BRAND ACCENTS (every one must appear in the scene):\n");
    let _ = writeln!(out, "- Fresh flowers: {}", accents.fresh_flowers.text);
    let _ = writeln!(out, "- Metallic accent: {}", accents.metallic_accent.text);
    let _ = writeln!(out, "- Woven texture: {}", accents.woven_texture.text);
    let _ = writeln!(out, "- Lived-in detail: {}", accents.lived_in_detail.text);
    if let Some(prop_set) = &selection.prop_set {
        let _ = writeln!(
            out,
            "\nPROP ARRANGEMENT ON SHELF SURFACE ({}):",
            prop_set.name
        );
        out.push_str("The following decorative items must be generated and placed ON TOP of the shelf:\n");
        for item in &prop_set.items {
            let _ = writeln!(out, "- {} ({})", item.description, item.placement);
        }
        out.push_str("\nPROP PHYSICS RULES:\n");
        push_list(&mut out, PROP_PHYSICS_RULES);
    }
    out.push_str("</scene_specification>\n\n");

    out.push_str("<placement_rules>\n");
    let _ = writeln!(out, "{}:", profile.placement_heading);
    push_list(&mut out, profile.placement_rules);
    out.push_str("</placement_rules>\n\n");

    out.push_str("<fidelity_instructions>\n");
    out.push_str("IDENTITY_LOCK PROTOCOL:\n");
    let _ = writeln!(
        out,
        "The {subject} image (Asset_1) is a FIXED GEOMETRIC CONSTANT."
    );
    push_list(&mut out, profile.identity_lock);
    out.push_str("\nSHADOW CASTING:\n");
    push_list(&mut out, profile.shadow_rules);
    let _ = writeln!(out, "- Light source: {}", selection.lighting_direction.text);
    out.push_str("\nALPHA INTEGRITY:\n");
    push_list(&mut out, profile.alpha_rules);
    out.push_str("\nOUTPUT:\n");
    let _ = writeln!(out, "{}", profile.output);
    let _ = writeln!(out, "\n{PRIORITY_STATEMENT}");
    out.push_str("</fidelity_instructions>");
    Ok(out)
}
