//! Static loot tables.
//!
//! A [`LootCatalog`] holds one fully-derived [`LootRates`] record per loot type,
//! in declared order. Declared order matters twice: it is the tie-break when two
//! types have the same density, and it is the order in which stacks are
//! numbered during expansion.
//!
//! # Primary targets
//!
//! The primary target is a flat-value item that never takes bag space. Its
//! value depends only on the target and on whether the run is in hard mode.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

use crate::types::ResourceId;

/// Declared attributes of one loot type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootProfile {
    pub id: ResourceId,
    pub value_per_stack: Decimal,
    /// Percent of one bag taken by a full stack.
    pub bag_space_per_stack: Decimal,
    /// Number of grabs needed to clear a stack. A stack can only be split at
    /// click boundaries.
    pub clicks_per_stack: u32,
}

/// A loot profile together with its per-click rates and density.
#[derive(Debug, Clone, Serialize)]
pub struct LootRates {
    pub id: ResourceId,
    pub value_per_stack: Decimal,
    pub bag_space_per_stack: Decimal,
    pub clicks_per_stack: u32,
    pub value_per_click: Decimal,
    pub bag_space_per_click: Decimal,
    /// Value gained per 1% of bag space.
    pub density: Decimal,
}

impl LootRates {
    pub fn try_from_profile(profile: &LootProfile) -> Result<Self, CatalogError> {
        if profile.clicks_per_stack == 0 {
            return Err(CatalogError::ZeroClicks(profile.id.clone()));
        }
        if profile.bag_space_per_stack <= Decimal::ZERO {
            return Err(CatalogError::NonPositiveBagSpace(profile.id.clone()));
        }
        if profile.value_per_stack < Decimal::ZERO {
            return Err(CatalogError::NegativeValue(profile.id.clone()));
        }

        // Per-click space can underflow to zero for tiny stacks
        let unratable = || CatalogError::NonPositiveBagSpace(profile.id.clone());
        let clicks = Decimal::from(profile.clicks_per_stack);
        let value_per_click = profile
            .value_per_stack
            .checked_div(clicks)
            .ok_or_else(unratable)?;
        let bag_space_per_click = profile
            .bag_space_per_stack
            .checked_div(clicks)
            .filter(|space| *space > Decimal::ZERO)
            .ok_or_else(unratable)?;
        let density = value_per_click
            .checked_div(bag_space_per_click)
            .ok_or_else(unratable)?;

        Ok(Self {
            id: profile.id.clone(),
            value_per_stack: profile.value_per_stack,
            bag_space_per_stack: profile.bag_space_per_stack,
            clicks_per_stack: profile.clicks_per_stack,
            value_per_click,
            bag_space_per_click,
            density,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    ZeroClicks(ResourceId),
    NonPositiveBagSpace(ResourceId),
    NegativeValue(ResourceId),
    DuplicateId(ResourceId),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::ZeroClicks(id) => write!(f, "Loot {} has zero clicks per stack", id),
            CatalogError::NonPositiveBagSpace(id) => {
                write!(f, "Loot {} must take a positive amount of bag space", id)
            }
            CatalogError::NegativeValue(id) => write!(f, "Loot {} has a negative value", id),
            CatalogError::DuplicateId(id) => write!(f, "Loot {} is declared twice", id),
        }
    }
}

impl Error for CatalogError {}

#[derive(Debug, Clone)]
pub struct LootCatalog {
    rates: Vec<LootRates>,
}

impl LootCatalog {
    pub fn new(profiles: Vec<LootProfile>) -> Result<Self, CatalogError> {
        let mut rates: Vec<LootRates> = Vec::with_capacity(profiles.len());
        for profile in &profiles {
            if rates.iter().any(|r| r.id == profile.id) {
                return Err(CatalogError::DuplicateId(profile.id.clone()));
            }
            rates.push(LootRates::try_from_profile(profile)?);
        }
        Ok(Self { rates })
    }

    /// The secondary loot found on the island compound.
    pub fn heist() -> Self {
        let rates = heist_profiles()
            .iter()
            .filter_map(|p| LootRates::try_from_profile(p).ok())
            .collect();
        Self { rates }
    }

    pub fn get(&self, id: &str) -> Option<&LootRates> {
        self.rates.iter().find(|r| r.id.as_str() == id)
    }

    /// Loot types in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &LootRates> {
        self.rates.iter()
    }

    /// Loot types by density, highest first. Ties keep declared order.
    pub fn ranked(&self) -> Vec<&LootRates> {
        let mut ranked: Vec<&LootRates> = self.rates.iter().collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.density.cmp(&a.density));
        ranked
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for LootCatalog {
    fn default() -> Self {
        Self::heist()
    }
}

fn heist_profiles() -> Vec<LootProfile> {
    vec![
        profile("gold", dec!(328584), dec!(66.67), 10),
        profile("cocaine", dec!(220500), dec!(50.0), 10),
        profile("weed", dec!(145980), dec!(37.5), 10),
        // Paintings are cut from the frame in one action
        profile("painting", dec!(176200), dec!(50.0), 1),
        profile("cash", dec!(78480), dec!(25.0), 10),
    ]
}

fn profile(id: &str, value: Decimal, bag_space: Decimal, clicks: u32) -> LootProfile {
    LootProfile {
        id: ResourceId::new(id),
        value_per_stack: value,
        bag_space_per_stack: bag_space,
        clicks_per_stack: clicks,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimaryTarget {
    SinsimitoTequila,
    RubyNecklace,
    BearerBonds,
    PinkDiamond,
    PantherStatue,
}

impl PrimaryTarget {
    pub const ALL: [PrimaryTarget; 5] = [
        PrimaryTarget::SinsimitoTequila,
        PrimaryTarget::RubyNecklace,
        PrimaryTarget::BearerBonds,
        PrimaryTarget::PinkDiamond,
        PrimaryTarget::PantherStatue,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PrimaryTarget::SinsimitoTequila => "Sinsimito Tequila",
            PrimaryTarget::RubyNecklace => "Ruby Necklace",
            PrimaryTarget::BearerBonds => "Bearer Bonds",
            PrimaryTarget::PinkDiamond => "Pink Diamond",
            PrimaryTarget::PantherStatue => "Panther Statue",
        }
    }

    /// Exact, case-sensitive match on the display name.
    pub fn from_name(name: &str) -> Option<PrimaryTarget> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn value(&self, hard_mode: bool) -> Decimal {
        let (normal, hard) = match self {
            PrimaryTarget::SinsimitoTequila => (dec!(630000), dec!(693000)),
            PrimaryTarget::RubyNecklace => (dec!(700000), dec!(770000)),
            PrimaryTarget::BearerBonds => (dec!(770000), dec!(847000)),
            PrimaryTarget::PinkDiamond => (dec!(1300000), dec!(1430000)),
            PrimaryTarget::PantherStatue => (dec!(1900000), dec!(2090000)),
        };
        if hard_mode { hard } else { normal }
    }
}

impl fmt::Display for PrimaryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
