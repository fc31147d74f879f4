use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::banks::{BankEntry, PropSet};
use crate::category::ProductCategory;
use crate::error::{PipelineError, PipelineResult};

/// Source of bank indexes. Implementations must not favour entries based on
/// earlier draws.
pub trait Selector {
    /// Returns an index in `0..len`. `len` is always non-zero.
    fn pick_index(&mut self, len: usize) -> usize;
}

/// OS-seeded selector for production runs.
#[derive(Debug, Clone)]
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector for RandomSelector {
    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Reproducible selector; the same seed always yields the same scene.
#[derive(Debug, Clone)]
pub struct SeededSelector {
    rng: StdRng,
}

impl SeededSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Selector for SeededSelector {
    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Replays a scripted list of indexes, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct FixedSelector {
    script: Vec<usize>,
    cursor: usize,
}

impl FixedSelector {
    pub fn new(script: Vec<usize>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Always picks the first entry.
    pub fn first() -> Self {
        Self::new(vec![0])
    }
}

impl Selector for FixedSelector {
    fn pick_index(&mut self, len: usize) -> usize {
        if self.script.is_empty() {
            return 0;
        }
        let value = self.script[self.cursor % self.script.len()];
        self.cursor += 1;
        value % len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewStage {
    /// Head-on lifestyle scene built around the transparent product.
    Primary,
    /// Three-quarter re-render of the primary view.
    Secondary,
}

impl ViewStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for ViewStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViewStage {
    type Err = PipelineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "primary" | "head-on" | "primary-view" => Ok(Self::Primary),
            "secondary" | "three-quarter" | "3/4" | "secondary-view" => Ok(Self::Secondary),
            other => Err(PipelineError::validation(format!(
                "Invalid view stage '{other}'. Must be 'primary' or 'secondary'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub key: String,
    pub text: String,
}

impl From<&BankEntry> for Choice {
    fn from(entry: &BankEntry) -> Self {
        Self {
            key: entry.key.to_string(),
            text: entry.text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropChoice {
    pub description: String,
    pub placement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropSetChoice {
    pub key: String,
    pub name: String,
    pub items: Vec<PropChoice>,
}

impl From<&PropSet> for PropSetChoice {
    fn from(set: &PropSet) -> Self {
        Self {
            key: set.key.to_string(),
            name: set.name.to_string(),
            items: set
                .items
                .iter()
                .map(|item| PropChoice {
                    description: item.description.to_string(),
                    placement: item.placement.to_string(),
                })
                .collect(),
        }
    }
}

/// The four accents every scene carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccentSet {
    pub fresh_flowers: Choice,
    pub metallic_accent: Choice,
    pub woven_texture: Choice,
    pub lived_in_detail: Choice,
}

impl AccentSet {
    pub fn texts(&self) -> [&str; 4] {
        [
            self.fresh_flowers.text.as_str(),
            self.metallic_accent.text.as_str(),
            self.woven_texture.text.as_str(),
            self.lived_in_detail.text.as_str(),
        ]
    }
}

/// Record of the bank entries drawn for one assembly call.
///
/// Material and furniture fields belong to the primary stage, `camera_angle`
/// to the secondary stage, and `prop_set` to shelf primaries only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSelection {
    pub bank_version: String,
    pub category: ProductCategory,
    pub stage: ViewStage,
    pub lighting_direction: Choice,
    pub accents: AccentSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall: Option<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sofa: Option<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prop_set: Option<PropSetChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_angle: Option<Choice>,
    /// Lighting and accents were carried over from a primary selection
    /// rather than drawn for this view.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inherits_primary: bool,
}

impl SceneSelection {
    /// Fields the category/stage requires but the selection lacks, and
    /// fields it carries that do not belong to it.
    pub fn problems(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut require = |present: bool, name: &str| {
            if !present {
                out.push(format!("missing {name}"));
            }
        };
        match self.stage {
            ViewStage::Primary => {
                require(self.wall.is_some(), "wall");
                require(self.floor.is_some(), "floor");
                require(self.sofa.is_some(), "sofa");
                if self.category.uses_prop_sets() {
                    require(self.prop_set.is_some(), "prop_set");
                }
            }
            ViewStage::Secondary => {
                require(self.camera_angle.is_some(), "camera_angle");
            }
        }

        let mut reject = |present: bool, name: &str| {
            if present {
                out.push(format!("unexpected {name}"));
            }
        };
        match self.stage {
            ViewStage::Primary => {
                reject(self.camera_angle.is_some(), "camera_angle");
                reject(self.inherits_primary, "inherits_primary");
                if !self.category.uses_prop_sets() {
                    reject(self.prop_set.is_some(), "prop_set");
                }
            }
            ViewStage::Secondary => {
                reject(self.wall.is_some(), "wall");
                reject(self.floor.is_some(), "floor");
                reject(self.sofa.is_some(), "sofa");
                reject(self.prop_set.is_some(), "prop_set");
            }
        }
        out
    }

    pub fn validate(&self) -> PipelineResult<()> {
        let problems = self.problems();
        if problems.is_empty() {
            return Ok(());
        }
        Err(PipelineError::validation(format!(
            "incomplete scene selection for {} {} view: {}",
            self.category,
            self.stage,
            problems.join(", ")
        )))
    }
}
