//! Presentation of an [`AllocationResult`].
//!
//! This is the only place where numbers are rounded: bag space to two
//! decimals, values truncated to whole dollars. The allocator itself always
//! works at full precision.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

use crate::allocator::{AllocationResult, Leftover, LineItem, LootHaul, ParticipantHaul};

pub const PRIMARY_TARGET_KEY: &str = "Primary Target";

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StackLine {
    pub stack_id: usize,
    pub clicks: u32,
    pub bag_space_used: f64,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LootLine {
    pub total_clicks: u32,
    pub stacks: Vec<StackLine>,
    pub total_value: i64,
    pub total_bag_space_used: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantReport {
    pub label: String,
    /// Loot types in the order the participant first received them.
    pub loot: Vec<(String, LootLine)>,
    pub total_value: i64,
    pub total_bag_space_used: f64,
}

impl ParticipantReport {
    pub fn loot_line(&self, resource: &str) -> Option<&LootLine> {
        self.loot
            .iter()
            .find(|(name, _)| name == resource)
            .map(|(_, line)| line)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TargetReport {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanReport {
    pub participants: Vec<ParticipantReport>,
    pub primary_target: TargetReport,
    pub leftovers: Vec<Leftover>,
}

/// Round bag space for display.
pub fn round_bag_space(value: Decimal) -> f64 {
    value.round_dp(2).to_f64().unwrap_or(0.0)
}

/// Drop the fractional part of a value.
pub fn truncate_value(value: Decimal) -> i64 {
    value.trunc().to_i64().unwrap_or(0)
}

impl PlanReport {
    pub fn from_result(result: &AllocationResult) -> Self {
        Self {
            participants: result.participants.iter().map(participant_report).collect(),
            primary_target: TargetReport {
                name: result.primary_target.name.clone(),
                value: truncate_value(result.primary_target.value),
            },
            leftovers: result.leftovers.clone(),
        }
    }

    pub fn participant(&self, label: &str) -> Option<&ParticipantReport> {
        self.participants.iter().find(|p| p.label == label)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn save_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn participant_report(haul: &ParticipantHaul) -> ParticipantReport {
    // Sum of truncated line values can differ from the truncated sum; the total
    // is truncated once from full precision.
    ParticipantReport {
        label: haul.participant_id.label(),
        loot: haul
            .loot
            .iter()
            .map(|h| (h.resource_id.0.clone(), loot_line(h)))
            .collect(),
        total_value: truncate_value(haul.total_value),
        total_bag_space_used: round_bag_space(haul.total_bag_space_used),
    }
}

fn loot_line(haul: &LootHaul) -> LootLine {
    LootLine {
        total_clicks: haul.total_clicks,
        stacks: haul.stacks.iter().map(stack_line).collect(),
        total_value: truncate_value(haul.total_value),
        total_bag_space_used: round_bag_space(haul.total_bag_space_used),
    }
}

fn stack_line(item: &LineItem) -> StackLine {
    StackLine {
        stack_id: item.stack_id.0,
        clicks: item.clicks,
        bag_space_used: round_bag_space(item.bag_space_used),
        value: truncate_value(item.value),
    }
}

// serde_json maps are sorted unless `preserve_order` is on, and "Participant 10"
// must not sort before "Participant 2". Serialize maps by hand to keep order.
struct OrderedLoot<'a>(&'a [(String, LootLine)]);

impl Serialize for OrderedLoot<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, line) in self.0 {
            map.serialize_entry(name, line)?;
        }
        map.end()
    }
}

impl Serialize for ParticipantReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("loot", &OrderedLoot(&self.loot))?;
        map.serialize_entry("total_value", &self.total_value)?;
        map.serialize_entry("total_bag_space_used", &self.total_bag_space_used)?;
        map.end()
    }
}

impl Serialize for PlanReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.participants.len() + 1))?;
        for participant in &self.participants {
            map.serialize_entry(&participant.label, participant)?;
        }
        map.serialize_entry(PRIMARY_TARGET_KEY, &self.primary_target)?;
        map.end()
    }
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Loot Plan ===")?;

        if self.participants.is_empty() {
            writeln!(f, "No participants")?;
        }

        let mut crew_total: i64 = 0;
        for participant in &self.participants {
            writeln!(f)?;
            writeln!(
                f,
                "{}: ${} ({:.2}% bag)",
                participant.label, participant.total_value, participant.total_bag_space_used
            )?;
            for (name, line) in &participant.loot {
                writeln!(
                    f,
                    "  {:<9} {:>3} clicks  {:>6.2}%  ${}",
                    name, line.total_clicks, line.total_bag_space_used, line.total_value
                )?;
                for stack in &line.stacks {
                    writeln!(
                        f,
                        "    stack {:<3} {:>3} clicks  {:>6.2}%  ${}",
                        stack.stack_id, stack.clicks, stack.bag_space_used, stack.value
                    )?;
                }
            }
            crew_total = crew_total.saturating_add(participant.total_value);
        }

        writeln!(f)?;
        if self.primary_target.name.is_empty() {
            writeln!(f, "{}: none", PRIMARY_TARGET_KEY)?;
        } else {
            writeln!(
                f,
                "{}: {} (${})",
                PRIMARY_TARGET_KEY, self.primary_target.name, self.primary_target.value
            )?;
        }

        if !self.leftovers.is_empty() {
            writeln!(f)?;
            writeln!(f, "Left behind:")?;
            for leftover in &self.leftovers {
                writeln!(
                    f,
                    "  stack {} of {}: {}/{} clicks",
                    leftover.stack_id.0,
                    leftover.resource_id,
                    leftover.remaining_clicks,
                    leftover.original_clicks
                )?;
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Crew total: ${} loot + ${} primary",
            crew_total, self.primary_target.value
        )
    }
}
