//! Prompt assembly for the two generative views.
//!
//! Selection draws from the bank registry; rendering is a pure function of a
//! [`SceneSelection`], so a stored selection always reproduces its document.

mod aesthetic;
mod fidelity;
mod primary;
mod secondary;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::banks::{BankEntry, BankKind, BankRegistry};
use crate::category::ProductCategory;
use crate::error::{PipelineError, PipelineResult};
use crate::selection::{AccentSet, Choice, SceneSelection, Selector, ViewStage};

pub use fidelity::FIDELITY_LOCK_BLOCK;

/// A fully rendered generation instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDocument {
    text: String,
}

impl PromptDocument {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Hex sha256 of the text; used in receipts instead of the full prompt.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.text.as_bytes()))
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub document: PromptDocument,
    pub selection: SceneSelection,
}

#[derive(Debug, Clone)]
pub struct PromptEngine {
    registry: Arc<BankRegistry>,
}

impl PromptEngine {
    pub fn new(registry: Arc<BankRegistry>) -> Self {
        Self { registry }
    }

    pub fn builtin() -> PipelineResult<Self> {
        Ok(Self::new(Arc::new(BankRegistry::builtin()?)))
    }

    pub fn registry(&self) -> &BankRegistry {
        &self.registry
    }

    fn draw(&self, kind: BankKind, selector: &mut dyn Selector) -> PipelineResult<Choice> {
        let bank = self.registry.text_bank(kind).ok_or_else(|| {
            PipelineError::configuration(format!("bank registry has no {kind} bank"))
        })?;
        let entry: &BankEntry = bank.pick(selector);
        Ok(Choice::from(entry))
    }

    fn draw_accents(&self, selector: &mut dyn Selector) -> PipelineResult<AccentSet> {
        Ok(AccentSet {
            fresh_flowers: self.draw(BankKind::FreshFlowers, selector)?,
            metallic_accent: self.draw(BankKind::MetallicAccent, selector)?,
            woven_texture: self.draw(BankKind::WovenTexture, selector)?,
            lived_in_detail: self.draw(BankKind::LivedInDetail, selector)?,
        })
    }

    /// Draws one entry from every bank the category/stage needs and nothing else.
    pub fn select(
        &self,
        category: ProductCategory,
        stage: ViewStage,
        selector: &mut dyn Selector,
    ) -> PipelineResult<SceneSelection> {
        let lighting_direction = self.draw(BankKind::Lighting, selector)?;
        let accents = self.draw_accents(selector)?;
        let mut selection = SceneSelection {
            bank_version: self.registry.version().to_string(),
            category,
            stage,
            lighting_direction,
            accents,
            wall: None,
            floor: None,
            sofa: None,
            prop_set: None,
            camera_angle: None,
            inherits_primary: false,
        };
        match stage {
            ViewStage::Primary => {
                selection.wall = Some(self.draw(BankKind::Wall, selector)?);
                selection.floor = Some(self.draw(BankKind::Floor, selector)?);
                selection.sofa = Some(self.draw(BankKind::Sofa, selector)?);
                if category.uses_prop_sets() {
                    let bank = self.registry.prop_set_bank().ok_or_else(|| {
                        PipelineError::configuration("bank registry has no prop_set bank")
                    })?;
                    selection.prop_set = Some(bank.pick(selector).into());
                }
            }
            ViewStage::Secondary => {
                selection.camera_angle = Some(self.draw(BankKind::CameraAngle, selector)?);
            }
        }
        tracing::debug!(
            category = %category,
            stage = %stage,
            lighting = %selection.lighting_direction.key,
            camera_angle = selection.camera_angle.as_ref().map(|c| c.key.as_str()),
            "scene selection drawn"
        );
        Ok(selection)
    }

    /// Secondary selection that carries the primary's lighting and accents
    /// forward and only draws a camera angle.
    pub fn select_continuation(
        &self,
        primary: &SceneSelection,
        selector: &mut dyn Selector,
    ) -> PipelineResult<SceneSelection> {
        if primary.stage != ViewStage::Primary {
            return Err(PipelineError::validation(
                "continuation requires a primary view selection",
            ));
        }
        let camera_angle = self.draw(BankKind::CameraAngle, selector)?;
        tracing::debug!(
            category = %primary.category,
            camera_angle = %camera_angle.key,
            "continuation selection drawn"
        );
        Ok(SceneSelection {
            bank_version: primary.bank_version.clone(),
            category: primary.category,
            stage: ViewStage::Secondary,
            lighting_direction: primary.lighting_direction.clone(),
            accents: primary.accents.clone(),
            wall: None,
            floor: None,
            sofa: None,
            prop_set: None,
            camera_angle: Some(camera_angle),
            inherits_primary: true,
        })
    }

    /// Pure rendering. Rejects selections missing a field the stage needs.
    pub fn render(&self, selection: &SceneSelection) -> PipelineResult<PromptDocument> {
        render(selection)
    }

    pub fn assemble(
        &self,
        category: ProductCategory,
        stage: ViewStage,
        selector: &mut dyn Selector,
    ) -> PipelineResult<Assembly> {
        let selection = self.select(category, stage, selector)?;
        let document = render(&selection)?;
        Ok(Assembly {
            document,
            selection,
        })
    }

    pub fn assemble_continuation(
        &self,
        primary: &SceneSelection,
        selector: &mut dyn Selector,
    ) -> PipelineResult<Assembly> {
        let selection = self.select_continuation(primary, selector)?;
        let document = render(&selection)?;
        Ok(Assembly {
            document,
            selection,
        })
    }
}

/// Renders a stored selection without touching any bank.
pub fn render(selection: &SceneSelection) -> PipelineResult<PromptDocument> {
    selection.validate()?;
    let text = match selection.stage {
        ViewStage::Primary => primary::render(selection)?,
        ViewStage::Secondary => secondary::render(selection)?,
    };
    Ok(PromptDocument { text })
}

#[cfg(test)]
mod tests {
    use super::{render, PromptEngine, FIDELITY_LOCK_BLOCK};
    use crate::category::ProductCategory;
    use crate::selection::{FixedSelector, SeededSelector, ViewStage};

    fn engine() -> PromptEngine {
        PromptEngine::builtin().unwrap()
    }

    #[test]
    fn same_selection_renders_identical_text() {
        let engine = engine();
        let assembly = engine
            .assemble(
                ProductCategory::Shelf,
                ViewStage::Primary,
                &mut SeededSelector::new(11),
            )
            .unwrap();
        let again = render(&assembly.selection).unwrap();
        assert_eq!(again, assembly.document);
        assert_eq!(again.fingerprint(), assembly.document.fingerprint());
        assert_eq!(assembly.document.fingerprint().len(), 64);
    }

    #[test]
    fn same_seed_yields_same_document() {
        let engine = engine();
        for category in ProductCategory::ALL {
            for stage in [ViewStage::Primary, ViewStage::Secondary] {
                let a = engine
                    .assemble(category, stage, &mut SeededSelector::new(99))
                    .unwrap();
                let b = engine
                    .assemble(category, stage, &mut SeededSelector::new(99))
                    .unwrap();
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn every_document_carries_lock_block_and_accents() {
        let engine = engine();
        for seed in 0..16u64 {
            for category in ProductCategory::ALL {
                for stage in [ViewStage::Primary, ViewStage::Secondary] {
                    let assembly = engine
                        .assemble(category, stage, &mut SeededSelector::new(seed))
                        .unwrap();
                    let text = assembly.document.as_str();
                    assert_eq!(text.matches(FIDELITY_LOCK_BLOCK).count(), 1);
                    for accent in assembly.selection.accents.texts() {
                        assert!(text.contains(accent), "{category} {stage} lacks {accent}");
                    }
                    if stage == ViewStage::Primary {
                        assert!(text.contains(&assembly.selection.lighting_direction.text));
                    }
                }
            }
        }
    }

    #[test]
    fn primary_text_contains_selected_fragments_verbatim() {
        let engine = engine();
        let assembly = engine
            .assemble(
                ProductCategory::Shelf,
                ViewStage::Primary,
                &mut FixedSelector::new(vec![1, 2, 3, 0, 4, 5, 6, 2]),
            )
            .unwrap();
        let selection = &assembly.selection;
        let text = assembly.document.as_str();
        for fragment in [
            selection.wall.as_ref().unwrap(),
            selection.floor.as_ref().unwrap(),
            selection.sofa.as_ref().unwrap(),
        ] {
            assert!(text.contains(&fragment.text));
        }
        let props = selection.prop_set.as_ref().unwrap();
        assert_eq!(props.items.len(), 3);
        for item in &props.items {
            assert!(text.contains(&format!("- {} ({})", item.description, item.placement)));
        }
        assert!(text.contains("1/3 the width of the sofa"));
        assert!(text.contains("Roll 0, Pitch 0, Yaw 0"));
    }

    #[test]
    fn wall_art_primary_has_no_prop_list() {
        let assembly = engine()
            .assemble(
                ProductCategory::WallArt,
                ViewStage::Primary,
                &mut SeededSelector::new(5),
            )
            .unwrap();
        assert!(assembly.selection.prop_set.is_none());
        assert!(!assembly.document.as_str().contains("PROP ARRANGEMENT"));
        assert!(assembly.document.as_str().contains("WALL ART PLACEMENT"));
    }

    #[test]
    fn secondary_view_draws_only_angle_lighting_and_accents() {
        let assembly = engine()
            .assemble(
                ProductCategory::WallArt,
                ViewStage::Secondary,
                &mut SeededSelector::new(3),
            )
            .unwrap();
        let selection = &assembly.selection;
        assert!(selection.camera_angle.is_some());
        assert!(selection.wall.is_none());
        assert!(selection.floor.is_none());
        assert!(selection.sofa.is_none());
        assert!(selection.prop_set.is_none());
        let text = assembly.document.as_str();
        assert!(text.contains("oblique three-quarter view"));
        assert!(text.contains(&selection.camera_angle.as_ref().unwrap().text));
    }

    #[test]
    fn continuation_reuses_primary_lighting_and_accents() {
        let engine = engine();
        let primary = engine
            .assemble(
                ProductCategory::Shelf,
                ViewStage::Primary,
                &mut SeededSelector::new(8),
            )
            .unwrap();
        let secondary = engine
            .assemble_continuation(&primary.selection, &mut SeededSelector::new(1))
            .unwrap();
        assert_eq!(secondary.selection.stage, ViewStage::Secondary);
        assert_eq!(
            secondary.selection.lighting_direction,
            primary.selection.lighting_direction
        );
        assert_eq!(secondary.selection.accents, primary.selection.accents);
        assert!(secondary.selection.prop_set.is_none());

        let err = engine
            .assemble_continuation(&secondary.selection, &mut SeededSelector::new(1))
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn standalone_secondary_offers_accents_as_hints() {
        let engine = engine();
        let standalone = engine
            .assemble(
                ProductCategory::Shelf,
                ViewStage::Secondary,
                &mut SeededSelector::new(8),
            )
            .unwrap();
        assert!(!standalone.selection.inherits_primary);
        let text = standalone.document.as_str();
        assert!(text.contains("BRAND ACCENT HINTS"));
        assert!(!text.contains("BRAND ACCENTS TO KEEP"));
        assert!(!text.contains(&standalone.selection.lighting_direction.text));
        for accent in standalone.selection.accents.texts() {
            assert!(text.contains(accent));
        }

        let primary = engine
            .assemble(
                ProductCategory::Shelf,
                ViewStage::Primary,
                &mut SeededSelector::new(8),
            )
            .unwrap();
        let continuation = engine
            .assemble_continuation(&primary.selection, &mut SeededSelector::new(8))
            .unwrap();
        assert!(continuation.selection.inherits_primary);
        let text = continuation.document.as_str();
        assert!(text.contains("BRAND ACCENTS TO KEEP"));
        assert!(!text.contains("BRAND ACCENT HINTS"));
        assert!(text.contains(&format!(
            "- Light: {}",
            primary.selection.lighting_direction.text
        )));

        let json = serde_json::to_value(&standalone.selection).unwrap();
        assert!(json.get("inherits_primary").is_none());
        let json = serde_json::to_value(&continuation.selection).unwrap();
        assert_eq!(json["inherits_primary"], serde_json::json!(true));
    }

    #[test]
    fn incomplete_selection_is_rejected() {
        let engine = engine();
        let mut selection = engine
            .select(
                ProductCategory::Shelf,
                ViewStage::Primary,
                &mut SeededSelector::new(2),
            )
            .unwrap();
        selection.prop_set = None;
        let err = render(&selection).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("missing prop_set"));

        let mut secondary = engine
            .select(
                ProductCategory::WallArt,
                ViewStage::Secondary,
                &mut SeededSelector::new(2),
            )
            .unwrap();
        secondary.wall = Some(selection.wall.clone().unwrap());
        let err = engine.render(&secondary).unwrap_err();
        assert!(err.to_string().contains("unexpected wall"));
    }

    #[test]
    fn stored_selection_round_trips_through_json() {
        let engine = engine();
        let assembly = engine
            .assemble(
                ProductCategory::Shelf,
                ViewStage::Primary,
                &mut SeededSelector::new(21),
            )
            .unwrap();
        let json = serde_json::to_string(&assembly.selection).unwrap();
        let restored = serde_json::from_str(&json).unwrap();
        assert_eq!(render(&restored).unwrap(), assembly.document);
    }
}
