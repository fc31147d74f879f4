mod registry;
mod tables;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::selection::Selector;

pub use registry::{BankRegistry, BankRegistryBuilder};
pub use tables::BANK_VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankKind {
    Lighting,
    Wall,
    Floor,
    Sofa,
    PropSet,
    FreshFlowers,
    MetallicAccent,
    WovenTexture,
    LivedInDetail,
    CameraAngle,
}

impl BankKind {
    /// Accents present in every rendered document regardless of category.
    pub const MANDATORY_ACCENTS: [BankKind; 4] = [
        BankKind::FreshFlowers,
        BankKind::MetallicAccent,
        BankKind::WovenTexture,
        BankKind::LivedInDetail,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lighting => "lighting",
            Self::Wall => "wall",
            Self::Floor => "floor",
            Self::Sofa => "sofa",
            Self::PropSet => "prop_set",
            Self::FreshFlowers => "fresh_flowers",
            Self::MetallicAccent => "metallic_accent",
            Self::WovenTexture => "woven_texture",
            Self::LivedInDetail => "lived_in_detail",
            Self::CameraAngle => "camera_angle",
        }
    }

    pub fn is_mandatory_accent(self) -> bool {
        Self::MANDATORY_ACCENTS.contains(&self)
    }
}

impl fmt::Display for BankKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankEntry {
    pub key: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropItem {
    pub description: &'static str,
    pub placement: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropSet {
    pub key: &'static str,
    pub name: &'static str,
    pub items: &'static [PropItem],
}

/// Immutable, non-empty table of interchangeable fragments.
///
/// Emptiness is rejected at construction, so `pick` has no failure path.
#[derive(Debug, Clone, Copy)]
pub struct Bank<T: 'static> {
    kind: BankKind,
    entries: &'static [T],
}

impl<T: 'static> Bank<T> {
    pub fn new(kind: BankKind, entries: &'static [T]) -> Result<Self, RegistryError> {
        if entries.is_empty() {
            return Err(RegistryError::EmptyBank(kind));
        }
        Ok(Self { kind, entries })
    }

    pub fn kind(&self) -> BankKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &'static [T] {
        self.entries
    }

    /// Uniform draw; the selector keeps no memory of earlier picks.
    pub fn pick(&self, selector: &mut dyn Selector) -> &'static T {
        let idx = selector.pick_index(self.entries.len()) % self.entries.len();
        &self.entries[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::{Bank, BankEntry, BankKind};
    use crate::error::RegistryError;
    use crate::selection::{FixedSelector, SeededSelector};

    static COLORS: &[BankEntry] = &[
        BankEntry { key: "red", text: "Red" },
        BankEntry { key: "green", text: "Green" },
        BankEntry { key: "blue", text: "Blue" },
        BankEntry { key: "cream", text: "Cream" },
    ];

    #[test]
    fn empty_bank_is_rejected() {
        static EMPTY: &[BankEntry] = &[];
        let err = Bank::new(BankKind::Wall, EMPTY).unwrap_err();
        assert_eq!(err, RegistryError::EmptyBank(BankKind::Wall));
    }

    #[test]
    fn pick_follows_selector_index() {
        let bank = Bank::new(BankKind::Wall, COLORS).unwrap();
        let mut selector = FixedSelector::new(vec![2, 0, 7]);
        assert_eq!(bank.pick(&mut selector).key, "blue");
        assert_eq!(bank.pick(&mut selector).key, "red");
        // Out-of-range scripted indexes wrap instead of panicking.
        assert_eq!(bank.pick(&mut selector).key, "cream");
    }

    #[test]
    fn pick_is_approximately_uniform() {
        let bank = Bank::new(BankKind::Wall, COLORS).unwrap();
        let mut selector = SeededSelector::new(7);
        let draws = 40_000usize;
        let mut counts = [0usize; 4];
        for _ in 0..draws {
            let picked = bank.pick(&mut selector);
            let idx = COLORS.iter().position(|entry| entry.key == picked.key).unwrap();
            counts[idx] += 1;
        }
        let expected = draws as f64 / COLORS.len() as f64;
        for count in counts {
            assert!(count > 0);
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "count {count} deviates {deviation:.3} from {expected}");
        }
    }
}
