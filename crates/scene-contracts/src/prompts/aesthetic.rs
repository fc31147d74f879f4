use std::fmt::Write as _;

pub(crate) struct Lighting {
    pub primary: &'static str,
    pub quality: &'static str,
    pub temperature: &'static str,
    pub shadows: &'static str,
    pub exposure: &'static str,
}

pub(crate) struct Palette {
    pub primary: &'static [&'static str],
    pub accents: &'static [&'static str],
    pub luxury_touches: &'static [&'static str],
    pub neutrals: &'static [&'static str],
}

pub(crate) struct Materials {
    pub fabrics: &'static [&'static str],
    pub woods: &'static [&'static str],
    pub ceramics: &'static [&'static str],
    pub metallics: &'static [&'static str],
    pub woven_accents: &'static [&'static str],
}

pub(crate) struct Composition {
    pub lens: &'static str,
    pub aperture: &'static str,
    pub style: &'static str,
}

pub(crate) struct AestheticDna {
    pub identity: &'static str,
    pub lighting: Lighting,
    pub palette: Palette,
    pub materials: Materials,
    pub composition: Composition,
}

pub(crate) static AESTHETIC_DNA: AestheticDna = AestheticDna {
    identity: "Maison Home Casual Luxury: aspirational yet lived-in, shabby chic yet tailored. A bright Parisian apartment meets California light.",
    lighting: Lighting {
        primary: "High-key overexposed natural light flooding the entire scene, 5600K bright neutral daylight; the room should feel drenched in light",
        quality: "Extremely bright and airy, diffused through sheer white linen, every surface washed in soft white light with almost no dark areas",
        temperature: "5600K bright neutral daylight with slight warm bias",
        shadows: "Near-invisible shadows, extremely low contrast, never darker than 15% grey. No dark shadows anywhere in the scene.",
        exposure: "+1.5 to +2.0 EV overexposure; whites bloom slightly, mid-tones pushed bright, no muddy or dark areas",
    },
    palette: Palette {
        primary: &["cream", "oatmeal", "warm white"],
        accents: &["light oak", "dusty blue", "soft grey", "muted slate"],
        luxury_touches: &["brushed gold", "warm brass", "antique gold"],
        neutrals: &["matte white", "soft beige", "natural linen"],
    },
    materials: Materials {
        fabrics: &["high-texture woven fabric", "Belgian linen", "bouclé", "chunky cream wool"],
        woods: &["light oak", "white oak", "bleached white oak"],
        ceramics: &["matte white stoneware", "handmade ceramics", "travertine"],
        metallics: &[
            "warm 18K brushed gold with visible micro-highlights and soft reflections, never flat or greenish",
            "rich warm brass with subtle patina and specular highlights catching the light",
            "antique gold hardware with warm amber undertones and dimensional light-play",
        ],
        woven_accents: &[
            "woven seagrass storage basket",
            "striped woven ottoman pouf",
            "woven rattan tray",
            "natural jute accent rug",
        ],
    },
    composition: Composition {
        lens: "35mm environmental, rectilinear projection",
        aperture: "f/8.0 for deep focus",
        style: "Aspirational but approachable: a beautiful home that feels real and lived-in. Not a showroom, not rustic farmhouse. The home of someone who entertains effortlessly.",
    },
};

/// Static style section. Never randomized.
pub(crate) fn aesthetic_block() -> String {
    let dna = &AESTHETIC_DNA;
    let mut out = String::new();
    out.push_str("<aesthetic_dna>\n");
    let _ = writeln!(out, "  <style>{}</style>", dna.identity);
    out.push_str("  <lighting>\n");
    let _ = writeln!(out, "    <primary>{}</primary>", dna.lighting.primary);
    let _ = writeln!(out, "    <quality>{}</quality>", dna.lighting.quality);
    let _ = writeln!(out, "    <temperature>{}</temperature>", dna.lighting.temperature);
    let _ = writeln!(out, "    <shadows>{}</shadows>", dna.lighting.shadows);
    let _ = writeln!(out, "    <exposure>{}</exposure>", dna.lighting.exposure);
    out.push_str("  </lighting>\n");
    out.push_str("  <palette>\n");
    let _ = writeln!(out, "    <primary>{}</primary>", dna.palette.primary.join(", "));
    let _ = writeln!(out, "    <accents>{}</accents>", dna.palette.accents.join(", "));
    let _ = writeln!(
        out,
        "    <luxury_touches>{}</luxury_touches>",
        dna.palette.luxury_touches.join(", ")
    );
    let _ = writeln!(out, "    <neutrals>{}</neutrals>", dna.palette.neutrals.join(", "));
    out.push_str("  </palette>\n");
    out.push_str("  <materials>\n");
    let _ = writeln!(out, "    <fabrics>{}</fabrics>", dna.materials.fabrics.join(", "));
    let _ = writeln!(out, "    <woods>{}</woods>", dna.materials.woods.join(", "));
    let _ = writeln!(out, "    <ceramics>{}</ceramics>", dna.materials.ceramics.join(", "));
    let _ = writeln!(out, "    <metallics>{}</metallics>", dna.materials.metallics.join(", "));
    let _ = writeln!(
        out,
        "    <woven_accents>{}</woven_accents>",
        dna.materials.woven_accents.join(", ")
    );
    out.push_str("  </materials>\n");
    out.push_str("  <composition>\n");
    let _ = writeln!(out, "    <lens>{}</lens>", dna.composition.lens);
    let _ = writeln!(out, "    <aperture>{}</aperture>", dna.composition.aperture);
    let _ = writeln!(out, "    <style>{}</style>", dna.composition.style);
    out.push_str("  </composition>\n");
    out.push_str("</aesthetic_dna>");
    out
}

/// Short continuity reminder used by the secondary view, where the reference
/// photograph already carries the full aesthetic.
pub(crate) fn continuity_block() -> String {
    let dna = &AESTHETIC_DNA;
    format!(
        "<aesthetic_continuity>\n- Style: {}\n- Lighting quality: {}\n- Palette: {}; luxury touches in {}\n</aesthetic_continuity>",
        dna.identity,
        dna.lighting.quality,
        dna.palette.primary.join(", "),
        dna.palette.luxury_touches.join(", "),
    )
}
