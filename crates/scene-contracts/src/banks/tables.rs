//! Curated scene fragments for the Maison Home casual-luxury look.
//!
//! Tables are append-only. Bump `BANK_VERSION` whenever an entry is added or
//! reworded so stored selections stay traceable to the text they rendered.

use super::{BankEntry, PropItem, PropSet};

pub const BANK_VERSION: &str = "maison-2025.3";

pub static LIGHTING_DIRECTIONS: &[BankEntry] = &[
    BankEntry {
        key: "flooded-left-morning",
        text: "Flooded high-key window light from camera-left, overexposed +1.5 EV, 10am bright morning sun, near-invisible pale shadows, entire room drenched in white light.",
    },
    BankEntry {
        key: "left-30-midday",
        text: "Bright overexposed natural light from camera-left at a 30-degree angle, midday sun flooding through large windows, high-key with luminous warm-white highlights, shadows barely perceptible.",
    },
    BankEntry {
        key: "diffused-right-wraparound",
        text: "Flooded diffused light from camera-right, wrap-around brightness filling every corner, bright clear day, near-zero shadows, pristine white airy aesthetic.",
    },
    BankEntry {
        key: "unseen-side-window",
        text: "Brilliant natural light pouring from an unseen side window, light gradients washed bright across all surfaces, 11am clear sky, flooded high-key exposure, no dark areas anywhere.",
    },
    BankEntry {
        key: "even-left-ethereal",
        text: "Bright even natural light from camera-left flooding the room, every surface bathed in soft white luminosity, diffused morning sun, ethereal bright atmosphere, shadows barely a whisper.",
    },
    BankEntry {
        key: "overhead-skylight",
        text: "Intense overhead diffused daylight flooding from skylights, overexposed high-key, zero shadows, perfectly even white light distribution, pristine sun-drenched aesthetic.",
    },
    BankEntry {
        key: "frontal-behind-camera",
        text: "Bright frontal diffused natural light from behind the camera, flooded flat lighting, high-key overexposure, emphasizing textures and materials in brilliant white light, no shadows deeper than 10% grey.",
    },
];

pub static WALLS: &[BankEntry] = &[
    BankEntry {
        key: "swiss-coffee-limewash",
        text: "Soft 'Swiss Coffee' limewash plaster with subtle movement and matte texture, bright and luminous",
    },
    BankEntry {
        key: "parisian-wainscoting",
        text: "Classic Parisian-style wainscoting with picture frame molding in a crisp 'All White' finish, catching the light beautifully",
    },
    BankEntry {
        key: "micro-shiplap",
        text: "Slim-profile vertical micro-shiplap paneling in bright white for a relaxed, modern cottage feel",
    },
    BankEntry {
        key: "roman-clay",
        text: "Bright limewash Roman clay in warm white with soft tonal variation, sun-washed and luminous",
    },
    BankEntry {
        key: "gallery-white-plaster",
        text: "Clean gallery-white walls with subtle hand-troweled plaster texture, reflecting abundant natural light",
    },
    BankEntry {
        key: "smooth-matte-plaster",
        text: "Minimalist white walls with a smooth matte plaster finish, bright and airy",
    },
];

pub static FLOORS: &[BankEntry] = &[
    BankEntry {
        key: "wide-plank-white-oak",
        text: "Wide-plank white oak with matte finish, ultra-light blonde with minimal knots, bright and clean",
    },
    BankEntry {
        key: "bleached-herringbone",
        text: "Bleached oak herringbone parquet in a tight pattern for a bright European touch",
    },
    BankEntry {
        key: "cream-limestone",
        text: "Pale cream limestone tiles with barely visible veining, luminous and light-reflecting",
    },
    BankEntry {
        key: "chunky-jute-rug",
        text: "Large chunky-knit natural jute rug in a light sand tone covering 80% of the floor space",
    },
    BankEntry {
        key: "honed-travertine",
        text: "Large-format honed light travertine tiles with soft blurred grout lines, sun-washed appearance",
    },
    BankEntry {
        key: "whitewashed-oak",
        text: "Ultra-light whitewashed wide-plank oak with a soft matte sheen, bright Scandinavian feel",
    },
    BankEntry {
        key: "pale-sisal",
        text: "Tight-knit sisal flooring in a pale sand-colored hue, light and natural",
    },
];

/// Sofa descriptions stop short of placement; the renderer positions the sofa
/// relative to the product for each category.
pub static SOFAS: &[BankEntry] = &[
    BankEntry {
        key: "cloud-sectional",
        text: "A low-profile oversized slipcovered linen 'Cloud' sectional in Optic White. The seat cushions show soft body impressions where someone was just sitting. A cream throw is bunched up in one corner rather than neatly draped. Mismatched pillows in dusty blue and oatmeal are squished against the arm, one slipped halfway off onto the cushion edge.",
    },
    BankEntry {
        key: "kidney-boucle",
        text: "A sculptural kidney-bean shaped curved sofa in heavy cream bouclé. A lightweight knit blanket has been pulled to one side and is half-sliding off the seat. A couple of soft grey linen pillows are stacked unevenly, one dented from being leaned against. The cushions show a gentle impression of recent use.",
    },
    BankEntry {
        key: "tufted-tuxedo",
        text: "A high-arm deep-seated tuxedo sofa with square tufting in an oatmeal wool blend. A chunky cream wool throw is bunched into a nest in one corner as if someone was curled up reading. Pillows in muted slate and warm white are pushed to the sides, one fallen against the arm at an angle, another slightly squished flat.",
    },
    BankEntry {
        key: "belgian-track-arm",
        text: "A structured yet soft Belgian track-arm sofa with thin track arms and down-filled cushions. A linen throw blanket is tangled loosely across the seat, trailing over one arm. A few soft blue-grey accent pillows are scattered unevenly: one propped upright, one lying flat, one pushed into the corner. The down cushions show soft sitting impressions.",
    },
    BankEntry {
        key: "deconstructed-oak",
        text: "A deconstructed sofa with a light oak frame, exposed linen-wrapped cushions and leather straps. A waffle-weave throw is half-pulled off the arm, one end pooling slightly. Natural linen pillows are askew, one flopped on its side, another wedged into the corner. The seat cushion fabric is gently rumpled from use.",
    },
    BankEntry {
        key: "piped-greige-modular",
        text: "A blocky modular piped-linen sectional with prominent seams in Greige. A lightweight cream blanket is bunched and twisted across one cushion as if someone pushed it aside when standing up. Soft oatmeal and dusty blue throw pillows are scattered in a loose cluster, not lined up and not evenly spaced. One pillow sits on the floor beside the sofa where it tumbled.",
    },
    BankEntry {
        key: "modern-camelback",
        text: "A modern camelback sofa with a slight soft curve to the backrest and cylindrical bolster pillows. A cashmere-blend throw in warm white is bunched up against one arm, half-draped and half-fallen. A couple of pillows are stacked unevenly against the opposite arm, and a coffee-table book lies open face-down on the middle cushion. The seat shows soft impressions from someone who was just sitting there.",
    },
];

pub static PROP_SETS: &[PropSet] = &[
    PropSet {
        key: "organic-minimalist",
        name: "The Organic Minimalist",
        items: &[
            PropItem {
                description: "Three linen-bound books in shades of cream and oatmeal, casually stacked with one slightly offset",
                placement: "horizontal_stack_on_shelf_surface",
            },
            PropItem {
                description: "A tall matte-white cracked ceramic vase holding a few stems of fresh white roses, loosely arranged as if just picked",
                placement: "standing_on_shelf_surface",
            },
            PropItem {
                description: "A small brushed gold dish or trinket tray with a warm antique patina",
                placement: "resting_on_shelf_surface",
            },
        ],
    },
    PropSet {
        key: "architectural-gallery",
        name: "The Architectural Gallery",
        items: &[
            PropItem {
                description: "A pair of brushed brass pillar candleholders in varying heights with partially burned cream candles",
                placement: "standing_on_shelf_surface",
            },
            PropItem {
                description: "A clear glass vase with a few stems of fresh white hydrangeas, petals slightly open and natural",
                placement: "standing_on_shelf_surface",
            },
            PropItem {
                description: "A fine-weave woven rattan tray or low basket in a natural warm tone",
                placement: "resting_on_shelf_surface",
            },
        ],
    },
    PropSet {
        key: "sculptural-tactile",
        name: "The Sculptural Tactile",
        items: &[
            PropItem {
                description: "A heavy raw-edge travertine marble slab used as a pedestal",
                placement: "resting_on_shelf_surface",
            },
            PropItem {
                description: "A handmade textured stoneware pitcher holding a few fresh white peonies, casually arranged",
                placement: "standing_on_shelf_surface",
            },
            PropItem {
                description: "A small antique gold-finish picture frame or decorative object with warm metallic patina",
                placement: "resting_on_shelf_surface",
            },
        ],
    },
    PropSet {
        key: "designer",
        name: "The Designer",
        items: &[
            PropItem {
                description: "A small woven seagrass basket with a natural, handcrafted look",
                placement: "resting_on_shelf_surface",
            },
            PropItem {
                description: "A fluted glass vase with a small bunch of fresh cream garden roses, loosely gathered",
                placement: "standing_on_shelf_surface",
            },
            PropItem {
                description: "Two oversized coffee-table books in pale beige tones, casually stacked with a small brushed gold object resting on top",
                placement: "horizontal_stack_on_shelf_surface",
            },
        ],
    },
    PropSet {
        key: "golden-hour",
        name: "The Golden Hour",
        items: &[
            PropItem {
                description: "A warm brass tray holding a few small objects: a candle in a cream jar and a small ceramic dish",
                placement: "resting_on_shelf_surface",
            },
            PropItem {
                description: "A clear ribbed glass vase with fresh white and blush ranunculus, arranged loosely and naturally",
                placement: "standing_on_shelf_surface",
            },
            PropItem {
                description: "A woven rattan storage basket with a rounded shape and natural warm tone",
                placement: "resting_on_shelf_surface",
            },
        ],
    },
    PropSet {
        key: "high-key-reflection",
        name: "The High-Key Reflection",
        items: &[
            PropItem {
                description: "A cluster of three ribbed glass bud vases in different heights, each holding a single fresh white flower stem",
                placement: "standing_on_shelf_surface",
            },
            PropItem {
                description: "A stack of white books with gold-embossed lettering on the spines, placed casually with one slightly angled",
                placement: "horizontal_stack_on_shelf_surface",
            },
            PropItem {
                description: "A small brushed gold bowl or dish with a warm antique finish",
                placement: "resting_on_shelf_surface",
            },
        ],
    },
    PropSet {
        key: "soft-textures",
        name: "The Soft Textures",
        items: &[
            PropItem {
                description: "A strand of oversized raw blonde wood beads draped over a stack of cream linen-bound books",
                placement: "draped_on_shelf_surface",
            },
            PropItem {
                description: "A ceramic-poured candle in a matte sand-colored jar, wick slightly blackened as if recently burned",
                placement: "standing_on_shelf_surface",
            },
            PropItem {
                description: "A small low woven basket filled with fresh white rose heads, loosely arranged",
                placement: "resting_on_shelf_surface",
            },
        ],
    },
];

pub static LIVED_IN_DETAILS: &[BankEntry] = &[
    BankEntry {
        key: "face-down-book",
        text: "An open hardcover book lying face-down on the sofa cushion mid-read, with a pair of tortoiseshell reading glasses resting on the sofa arm nearby.",
    },
    BankEntry {
        key: "half-finished-coffee",
        text: "A handmade ceramic mug of half-finished coffee sitting on a side table, with a faint ring stain forming underneath it on a small linen coaster.",
    },
    BankEntry {
        key: "shrugged-cardigan",
        text: "A lightweight cashmere cardigan in soft oatmeal draped over the sofa arm as if just shrugged off, one sleeve trailing down.",
    },
    BankEntry {
        key: "kicked-off-flats",
        text: "A pair of leather ballet flats kicked off near the base of the sofa, slightly askew and pointing in different directions, as if someone just got comfortable.",
    },
    BankEntry {
        key: "open-journal",
        text: "An open linen-covered notebook or journal with a brass pen resting across it, left on the sofa cushion as if mid-thought.",
    },
    BankEntry {
        key: "fanned-magazines",
        text: "A small stack of glossy magazines fanned out on a side table, the top one open to a dog-eared page, a reading glasses case beside them.",
    },
    BankEntry {
        key: "pooling-throw",
        text: "A knit throw blanket pulled halfway off the sofa and pooling gently on the floor, as if someone just stood up and walked away.",
    },
];

pub static FRESH_FLOWERS: &[BankEntry] = &[
    BankEntry {
        key: "day-old-white-roses",
        text: "A clear glass vase with a loose bunch of white roses, still beautiful but a day or two old, a few petals dropped onto the surface below and one stem leaning out of the arrangement",
    },
    BankEntry {
        key: "softening-peonies",
        text: "A stoneware pitcher holding cream and blush peonies, petals fully open and beginning to soften, a couple of fallen petals scattered on the table around the base",
    },
    BankEntry {
        key: "past-peak-hydrangeas",
        text: "A simple glass cylinder vase with white hydrangeas, soft and full but slightly past peak, one or two florets browning at the edges",
    },
    BankEntry {
        key: "drooping-ranunculus",
        text: "A ceramic jug with a few stems of white ranunculus and eucalyptus, casually placed and slightly drooping, the water level low and a fallen leaf resting on the surface nearby",
    },
    BankEntry {
        key: "garden-roses-fluted",
        text: "A small fluted glass vase holding a cluster of white garden roses and greenery, petals softly opening, a couple beginning to curl at the edges, one petal on the table",
    },
];

pub static METALLIC_ACCENTS: &[BankEntry] = &[
    BankEntry {
        key: "brushed-gold-tray",
        text: "A small warm 18K brushed gold tray on a side table, with visible highlights and soft reflections",
    },
    BankEntry {
        key: "brass-accent-table",
        text: "A warm brass side table or accent table with a geometric frame, catching natural light with dimensional reflections",
    },
    BankEntry {
        key: "gold-sculpture",
        text: "A small brushed gold decorative sculpture or object on a side table, with warm amber tone and specular highlights",
    },
    BankEntry {
        key: "antique-brass-bowl",
        text: "A small antique brass bowl or dish with warm patina placed on a nearby surface, light glinting softly off the rim",
    },
    BankEntry {
        key: "gold-rimmed-glass",
        text: "A gold-rimmed glass or decorative object with rich warm tone catching the light, showing depth and dimension",
    },
];

pub static WOVEN_TEXTURES: &[BankEntry] = &[
    BankEntry {
        key: "seagrass-basket",
        text: "A natural woven seagrass basket placed near the sofa or on the floor",
    },
    BankEntry {
        key: "striped-pouf",
        text: "A striped woven ottoman pouf in cream and oatmeal tones beside the sofa",
    },
    BankEntry {
        key: "jute-rattan-tray",
        text: "A woven jute or rattan tray on the coffee table or nearby surface",
    },
    BankEntry {
        key: "chunky-knit-throw",
        text: "A chunky knit throw blanket in cream casually draped over furniture",
    },
    BankEntry {
        key: "wicker-storage",
        text: "A woven wicker storage basket with a rounded shape on the floor nearby",
    },
];

pub static CAMERA_ANGLES: &[BankEntry] = &[
    BankEntry {
        key: "left-45",
        text: "Reposition the camera approximately 45 degrees to the left of the original head-on position",
    },
    BankEntry {
        key: "right-45",
        text: "Reposition the camera approximately 45 degrees to the right of the original head-on position",
    },
    BankEntry {
        key: "left-35-step-back",
        text: "Reposition the camera approximately 35 degrees to the left of the original head-on position and one step further back",
    },
    BankEntry {
        key: "right-35-step-back",
        text: "Reposition the camera approximately 35 degrees to the right of the original head-on position and one step further back",
    },
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn assert_unique_keys(entries: &[BankEntry]) {
        let keys: HashSet<&str> = entries.iter().map(|entry| entry.key).collect();
        assert_eq!(keys.len(), entries.len());
        assert!(entries.iter().all(|entry| !entry.text.trim().is_empty()));
    }

    #[test]
    fn text_banks_have_unique_keys() {
        for bank in [
            LIGHTING_DIRECTIONS,
            WALLS,
            FLOORS,
            SOFAS,
            LIVED_IN_DETAILS,
            FRESH_FLOWERS,
            METALLIC_ACCENTS,
            WOVEN_TEXTURES,
            CAMERA_ANGLES,
        ] {
            assert_unique_keys(bank);
        }
    }

    #[test]
    fn prop_sets_hold_two_to_four_items() {
        let keys: HashSet<&str> = PROP_SETS.iter().map(|set| set.key).collect();
        assert_eq!(keys.len(), PROP_SETS.len());
        for set in PROP_SETS {
            assert!((2..=4).contains(&set.items.len()), "{}", set.name);
        }
    }
}
