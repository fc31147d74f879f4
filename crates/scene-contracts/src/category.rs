use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::banks::BankKind;
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductCategory {
    WallArt,
    Shelf,
}

const SHARED_PRIMARY_BANKS: &[BankKind] = &[
    BankKind::Lighting,
    BankKind::Wall,
    BankKind::Floor,
    BankKind::Sofa,
    BankKind::FreshFlowers,
    BankKind::MetallicAccent,
    BankKind::WovenTexture,
    BankKind::LivedInDetail,
];

const SHELF_PRIMARY_BANKS: &[BankKind] = &[
    BankKind::Lighting,
    BankKind::Wall,
    BankKind::Floor,
    BankKind::Sofa,
    BankKind::PropSet,
    BankKind::FreshFlowers,
    BankKind::MetallicAccent,
    BankKind::WovenTexture,
    BankKind::LivedInDetail,
];

/// Banks drawn for a standalone secondary view. Material and furniture banks
/// are absent: the primary view already fixes them.
pub const SECONDARY_BANKS: &[BankKind] = &[
    BankKind::CameraAngle,
    BankKind::Lighting,
    BankKind::FreshFlowers,
    BankKind::MetallicAccent,
    BankKind::WovenTexture,
    BankKind::LivedInDetail,
];

impl ProductCategory {
    pub const ALL: [ProductCategory; 2] = [ProductCategory::WallArt, ProductCategory::Shelf];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WallArt => "wall-art",
            Self::Shelf => "shelf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::WallArt => "Wall Art",
            Self::Shelf => "Shelf",
        }
    }

    /// Noun used inside prompt text for the uploaded product.
    pub fn subject(self) -> &'static str {
        match self {
            Self::WallArt => "wall art",
            Self::Shelf => "shelf",
        }
    }

    pub fn primary_banks(self) -> &'static [BankKind] {
        match self {
            Self::WallArt => SHARED_PRIMARY_BANKS,
            Self::Shelf => SHELF_PRIMARY_BANKS,
        }
    }

    pub fn uses_prop_sets(self) -> bool {
        self.primary_banks().contains(&BankKind::PropSet)
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = PipelineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "wall-art" | "wall_art" | "wallart" => Ok(Self::WallArt),
            "shelf" => Ok(Self::Shelf),
            "" => Err(PipelineError::validation("No product type provided")),
            other => Err(PipelineError::validation(format!(
                "Invalid product type '{other}'. Must be 'wall-art' or 'shelf'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProductCategory;
    use crate::banks::BankKind;

    #[test]
    fn parses_known_categories() {
        assert_eq!("wall-art".parse::<ProductCategory>(), Ok(ProductCategory::WallArt));
        assert_eq!(" Shelf ".parse::<ProductCategory>(), Ok(ProductCategory::Shelf));
    }

    #[test]
    fn rejects_unknown_category_as_validation_error() {
        let err = "lamp".parse::<ProductCategory>().unwrap_err();
        assert_eq!(err.kind(), "validation");
        let err = "".parse::<ProductCategory>().unwrap_err();
        assert!(err.to_string().contains("No product type"));
    }

    #[test]
    fn only_shelf_uses_prop_sets() {
        assert!(ProductCategory::Shelf.uses_prop_sets());
        assert!(!ProductCategory::WallArt.uses_prop_sets());
        for category in ProductCategory::ALL {
            for accent in BankKind::MANDATORY_ACCENTS {
                assert!(category.primary_banks().contains(&accent));
            }
        }
    }

    #[test]
    fn serializes_as_kebab_case() {
        let value = serde_json::to_value(ProductCategory::WallArt).unwrap();
        assert_eq!(value, serde_json::json!("wall-art"));
    }
}
