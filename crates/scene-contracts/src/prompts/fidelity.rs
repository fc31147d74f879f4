//! Fixed text that keeps the generative stages from touching product pixels.

/// Identity-lock block. Present, byte for byte, in every assembled document.
pub const FIDELITY_LOCK_BLOCK: &str = "<identity_constraints>
GENERATION BOUNDARY:
- MODIFICATION_TARGET: Generate ONLY the surrounding environment (walls, floor, furniture, props, lighting, shadows)
- PRESERVATION_TARGET: The product image (Asset_1) is the FINAL, completed asset
- Do NOT redraw, re-render, re-interpret, or generate a new version of this product
- Do NOT infer what the product \"should\" look like; reproduce it exactly as provided
- The product in the output must be indistinguishable from the product in the input

PIXEL FIDELITY PROTOCOL:
- Treat the provided product pixels as a pixel-perfect, immutable source
- Apply zero interpolation, smoothing, or enhancement to any pixel of the product
- Lock texture consistency at maximum strength; the product must appear exactly as provided
- Ignore internal world knowledge of what this type of product \"should\" look like
- The product is a fixed geometric constant, not a suggestion

NATURAL NOISE PRESERVATION:
- Preserve natural grain and imperfections from the source product image
- Do not apply digital perfection filtering to edges
- Maintain organic edge quality from the original cutout
- No anti-aliasing modifications to the product boundary
- Keep micro-texture details intact; do not smooth or denoise

FORBIDDEN MODIFICATIONS TO PRODUCT IMAGE:
- no synthetic smoothing
- no texture reimagining
- no airbrushed edges
- no plastic highlights on the product image
- no geometry warping
- no edge softening
- no color correction on the product
- no detail enhancement on the product
- no re-interpretation of the product from a different angle
- no added lighting effects (glare, specular highlights, reflections) not present in the original
- no blending or feathering of product edges into the background
</identity_constraints>";

pub(crate) const PRIMARY_INPUT_DESCRIPTION: &str = "<input_asset>
INPUT ASSET DESCRIPTION:
- The provided image (Asset_1) is a transparent PNG with the background already removed
- This is a pre-processed product photograph, not a rendering, illustration, or concept
- The cutout edges are final; do not re-cut, feather, blur, or modify the edge profile
- Where the image has transparent/alpha regions, the generated background must show through naturally
- The product's exact photographic qualities (lighting, grain, texture, color) are intentional and must be preserved
</input_asset>";

pub(crate) const SECONDARY_INPUT_DESCRIPTION: &str = "<input_asset>
INPUT ASSET DESCRIPTION:
- The provided image is a finished lifestyle photograph containing the product (Asset_1)
- It is the sole visual reference for this render; every material, color and object in it is already decided
- Only the camera moves; the product keeps its exact colors, texture, finish and proportions
</input_asset>";

/// Closing statement shared by every document.
pub(crate) const PRIORITY_STATEMENT: &str =
    "PRIORITY: Product accuracy outranks every aesthetic consideration. If any instruction above conflicts with reproducing the product exactly, reproduce the product exactly.";
