use indexmap::IndexMap;

use super::tables;
use super::{Bank, BankEntry, BankKind, PropSet};
use crate::category::{ProductCategory, SECONDARY_BANKS};
use crate::error::RegistryError;

/// Read-only set of banks, validated against every category's requirements
/// when built. Safe to share between concurrent runs.
#[derive(Debug, Clone)]
pub struct BankRegistry {
    version: String,
    text_banks: IndexMap<BankKind, Bank<BankEntry>>,
    prop_sets: Option<Bank<PropSet>>,
}

#[derive(Debug, Default)]
pub struct BankRegistryBuilder {
    version: String,
    text_banks: Vec<(BankKind, &'static [BankEntry])>,
    prop_sets: Option<&'static [PropSet]>,
}

impl BankRegistryBuilder {
    pub fn text(mut self, kind: BankKind, entries: &'static [BankEntry]) -> Self {
        self.text_banks.push((kind, entries));
        self
    }

    pub fn prop_sets(mut self, entries: &'static [PropSet]) -> Self {
        self.prop_sets = Some(entries);
        self
    }

    pub fn build(self) -> Result<BankRegistry, RegistryError> {
        let mut text_banks = IndexMap::new();
        for (kind, entries) in self.text_banks {
            if kind == BankKind::PropSet {
                return Err(RegistryError::WrongShape(kind));
            }
            if text_banks.contains_key(&kind) {
                return Err(RegistryError::Duplicate(kind));
            }
            text_banks.insert(kind, Bank::new(kind, entries)?);
        }
        let prop_sets = self
            .prop_sets
            .map(|entries| Bank::new(BankKind::PropSet, entries))
            .transpose()?;

        let registry = BankRegistry {
            version: self.version,
            text_banks,
            prop_sets,
        };
        registry.validate()?;
        Ok(registry)
    }
}

impl BankRegistry {
    pub fn builder(version: impl Into<String>) -> BankRegistryBuilder {
        BankRegistryBuilder {
            version: version.into(),
            ..BankRegistryBuilder::default()
        }
    }

    /// Registry over the curated tables compiled into the crate.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::builder(tables::BANK_VERSION)
            .text(BankKind::Lighting, tables::LIGHTING_DIRECTIONS)
            .text(BankKind::Wall, tables::WALLS)
            .text(BankKind::Floor, tables::FLOORS)
            .text(BankKind::Sofa, tables::SOFAS)
            .text(BankKind::FreshFlowers, tables::FRESH_FLOWERS)
            .text(BankKind::MetallicAccent, tables::METALLIC_ACCENTS)
            .text(BankKind::WovenTexture, tables::WOVEN_TEXTURES)
            .text(BankKind::LivedInDetail, tables::LIVED_IN_DETAILS)
            .text(BankKind::CameraAngle, tables::CAMERA_ANGLES)
            .prop_sets(tables::PROP_SETS)
            .build()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn text_bank(&self, kind: BankKind) -> Option<&Bank<BankEntry>> {
        self.text_banks.get(&kind)
    }

    pub fn prop_set_bank(&self) -> Option<&Bank<PropSet>> {
        self.prop_sets.as_ref()
    }

    pub fn contains(&self, kind: BankKind) -> bool {
        match kind {
            BankKind::PropSet => self.prop_sets.is_some(),
            other => self.text_banks.contains_key(&other),
        }
    }

    /// `(kind, size)` for every registered bank, text banks in registration order.
    pub fn sizes(&self) -> Vec<(BankKind, usize)> {
        let mut out = self
            .text_banks
            .iter()
            .map(|(kind, bank)| (*kind, bank.len()))
            .collect::<Vec<_>>();
        if let Some(bank) = &self.prop_sets {
            out.push((BankKind::PropSet, bank.len()));
        }
        out
    }

    fn validate(&self) -> Result<(), RegistryError> {
        for category in ProductCategory::ALL {
            for kind in category.primary_banks() {
                if !self.contains(*kind) {
                    return Err(RegistryError::MissingBank {
                        category,
                        kind: *kind,
                    });
                }
            }
        }
        for kind in SECONDARY_BANKS {
            if !self.contains(*kind) {
                return Err(RegistryError::MissingSecondaryBank { kind: *kind });
            }
        }
        Ok(())
    }
}
