use log::{debug, info, trace, warn};
use rust_decimal::prelude::*; // Includes Decimal, Zero, ToPrimitive
use serde::Serialize;
use std::collections::HashMap;

use crate::catalog::{LootCatalog, LootRates, PrimaryTarget};
use crate::events::{EventLog, EventType};
use crate::request::{LootManifest, PlanRequest, PlannerParameters};
use crate::stack_builder::{Stack, StackBuilder};
use crate::types::{ParticipantId, ResourceId, StackId};

// --- Allocation state ---

/// A participant's bag while loot is being handed out.
#[derive(Debug, Clone)]
pub struct Bag {
    pub participant_id: ParticipantId,
    pub remaining_capacity: Decimal,
    /// Loot types in the order this bag first received them.
    pub loot: Vec<(ResourceId, Vec<LineItem>)>,
}

impl Bag {
    fn new(participant_id: ParticipantId, capacity: Decimal) -> Self {
        Self {
            participant_id,
            remaining_capacity: capacity,
            loot: Vec::new(),
        }
    }

    /// A bag with exactly zero capacity left is full.
    pub fn has_space(&self) -> bool {
        self.remaining_capacity > Decimal::ZERO
    }

    fn record(&mut self, resource_id: &ResourceId, item: LineItem) {
        match self.loot.iter_mut().find(|(id, _)| id == resource_id) {
            Some((_, items)) => items.push(item),
            None => self.loot.push((resource_id.clone(), vec![item])),
        }
    }
}

/// Clicks taken from one stack by one participant in one grab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub stack_id: StackId,
    pub clicks: u32,
    pub bag_space_used: Decimal,
    pub value: Decimal,
}

// --- Public result structures (full precision) ---

#[derive(Debug, Clone, Serialize)]
pub struct LootHaul {
    pub resource_id: ResourceId,
    pub stacks: Vec<LineItem>,
    pub total_clicks: u32,
    pub total_value: Decimal,
    pub total_bag_space_used: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantHaul {
    pub participant_id: ParticipantId,
    pub loot: Vec<LootHaul>,
    pub total_value: Decimal,
    /// Ceiling minus remaining capacity.
    pub total_bag_space_used: Decimal,
    pub remaining_capacity: Decimal,
}

impl ParticipantHaul {
    pub fn haul_for(&self, resource: &str) -> Option<&LootHaul> {
        self.loot.iter().find(|h| h.resource_id.as_str() == resource)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimaryTargetOutcome {
    /// The name as requested, even when it matched no known target.
    pub name: String,
    pub value: Decimal,
}

/// A stack that still had clicks when allocation finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leftover {
    pub stack_id: StackId,
    pub resource_id: ResourceId,
    pub original_clicks: u32,
    pub remaining_clicks: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationResult {
    pub bag_capacity: Decimal,
    pub participants: Vec<ParticipantHaul>,
    pub primary_target: PrimaryTargetOutcome,
    pub leftovers: Vec<Leftover>,
}

impl AllocationResult {
    /// Loot value across every participant. Excludes the primary target.
    pub fn loot_value(&self) -> Decimal {
        self.participants.iter().map(|p| p.total_value).sum()
    }

    pub fn total_value(&self) -> Decimal {
        self.loot_value() + self.primary_target.value
    }
}

// --- Allocation logic ---

/// Greedy loot splitter: highest density first, participants in index order.
pub struct Allocator<'a> {
    catalog: &'a LootCatalog,
    bag_capacity: Decimal,
}

impl<'a> Allocator<'a> {
    pub fn new(catalog: &'a LootCatalog) -> Self {
        Self {
            catalog,
            bag_capacity: PlannerParameters::default().bag_capacity,
        }
    }

    pub fn with_bag_capacity(mut self, bag_capacity: Decimal) -> Self {
        self.bag_capacity = bag_capacity;
        self
    }

    pub fn allocate(
        &self,
        manifest: &LootManifest,
        players: usize,
        hard_mode: bool,
        log: &mut EventLog,
    ) -> AllocationResult {
        // 1. & 2. Priority order (densities were derived when the catalog was built)
        let priority = self.catalog.ranked();

        // 3. Expand quantities into stacks, numbered in catalog order
        let builder = StackBuilder::from_quantities(self.catalog, &manifest.loot);
        let stack_count = builder.stack_count();
        let mut stacks = builder.build();

        let mut bags: Vec<Bag> = (0..players)
            .map(|i| Bag::new(ParticipantId(i), self.bag_capacity))
            .collect();

        debug!(
            "Allocating {} stacks across {} bags of {}%",
            stack_count, players, self.bag_capacity
        );

        // 4. Hand out each loot type in priority order
        for (rank, rates) in priority.iter().enumerate() {
            let Some(type_stacks) = stacks.get_mut(&rates.id) else {
                continue;
            };
            log.log(EventType::PriorityRanked {
                rank: rank + 1,
                resource: rates.id.clone(),
                density: rates.density,
                stacks: type_stacks.len(),
            });
            if type_stacks.is_empty() {
                continue;
            }

            for stack in type_stacks.iter_mut() {
                distribute_stack(stack, rates, &mut bags, log);
            }
        }

        // 5. Aggregate
        let participants: Vec<ParticipantHaul> = bags
            .into_iter()
            .map(|bag| summarize_bag(bag, self.bag_capacity))
            .collect();

        let leftovers = collect_leftovers(self.catalog, &stacks);

        // 6. Primary target, outside of bag capacity
        let primary_target = resolve_primary_target(manifest, hard_mode);

        let result = AllocationResult {
            bag_capacity: self.bag_capacity,
            participants,
            primary_target,
            leftovers,
        };

        info!(
            "Planned {} in loot for {} players ({} stacks left behind), primary target {} worth {}",
            result.loot_value().trunc(),
            players,
            result.leftovers.len(),
            result.primary_target.name,
            result.primary_target.value
        );

        result
    }
}

/// Split a loot request across `players` bags using the heist catalog and
/// 100% bags.
pub fn allocate(manifest: &LootManifest, players: usize, hard_mode: bool) -> AllocationResult {
    let catalog = LootCatalog::heist();
    Allocator::new(&catalog).allocate(manifest, players, hard_mode, &mut EventLog::new())
}

/// Run a stored request against a catalog, recording every step.
pub fn plan_request(
    request: &PlanRequest,
    catalog: &LootCatalog,
    log: &mut EventLog,
) -> AllocationResult {
    Allocator::new(catalog)
        .with_bag_capacity(request.parameters.bag_capacity)
        .allocate(&request.manifest, request.players, request.hard_mode, log)
}

// Hand out clicks of one stack until it is empty or a full pass over the bags
// assigns nothing. Every pass rescans from the first bag.
fn distribute_stack(stack: &mut Stack, rates: &LootRates, bags: &mut [Bag], log: &mut EventLog) {
    while stack.remaining_clicks > 0 {
        let mut assigned = false;

        for bag in bags.iter_mut() {
            if !bag.has_space() {
                continue;
            }

            let clicks = affordable_clicks(bag.remaining_capacity, rates.bag_space_per_click)
                .min(stack.remaining_clicks);
            if clicks == 0 {
                trace!(
                    "{} cannot fit a click of {} ({}% left)",
                    bag.participant_id, rates.id, bag.remaining_capacity
                );
                continue;
            }

            let clicks_dec = Decimal::from(clicks);
            let bag_space_used = clicks_dec * rates.bag_space_per_click;
            let value = clicks_dec * rates.value_per_click;

            bag.remaining_capacity -= bag_space_used;
            bag.record(
                &rates.id,
                LineItem {
                    stack_id: stack.id,
                    clicks,
                    bag_space_used,
                    value,
                },
            );
            stack.remaining_clicks -= clicks;
            assigned = true;

            debug!(
                "{} takes {} clicks of {} from stack {} ({}% left)",
                bag.participant_id, clicks, rates.id, stack.id.0, bag.remaining_capacity
            );
            log.log(EventType::ClicksAssigned {
                participant: bag.participant_id,
                resource: rates.id.clone(),
                stack_id: stack.id,
                clicks,
                bag_space_used,
                value,
                remaining_capacity: bag.remaining_capacity,
            });

            if !bag.has_space() {
                log.log(EventType::BagFilled {
                    participant: bag.participant_id,
                });
                break;
            }
            if stack.is_depleted() {
                break;
            }
        }

        if !assigned {
            warn!(
                "No bag can take more {}: stack {} left with {} clicks",
                rates.id, stack.id.0, stack.remaining_clicks
            );
            log.log(EventType::StackAbandoned {
                resource: rates.id.clone(),
                stack_id: stack.id,
                remaining_clicks: stack.remaining_clicks,
            });
            break;
        }
    }
}

/// Whole clicks that fit in `remaining` bag space.
fn affordable_clicks(remaining: Decimal, bag_space_per_click: Decimal) -> u32 {
    if remaining <= Decimal::ZERO || bag_space_per_click <= Decimal::ZERO {
        return 0;
    }
    // Saturate rather than fail on absurd capacities
    (remaining / bag_space_per_click)
        .floor()
        .to_u32()
        .unwrap_or(u32::MAX)
}

fn summarize_bag(bag: Bag, bag_capacity: Decimal) -> ParticipantHaul {
    let loot: Vec<LootHaul> = bag
        .loot
        .into_iter()
        .map(|(resource_id, stacks)| LootHaul {
            total_clicks: stacks.iter().map(|s| s.clicks).sum(),
            total_value: stacks.iter().map(|s| s.value).sum(),
            total_bag_space_used: stacks.iter().map(|s| s.bag_space_used).sum(),
            resource_id,
            stacks,
        })
        .collect();

    ParticipantHaul {
        participant_id: bag.participant_id,
        total_value: loot.iter().map(|h| h.total_value).sum(),
        total_bag_space_used: bag_capacity - bag.remaining_capacity,
        remaining_capacity: bag.remaining_capacity,
        loot,
    }
}

// Leftovers in stack id order
fn collect_leftovers(
    catalog: &LootCatalog,
    stacks: &HashMap<ResourceId, Vec<Stack>>,
) -> Vec<Leftover> {
    catalog
        .iter()
        .filter_map(|rates| stacks.get(&rates.id))
        .flatten()
        .filter(|stack| !stack.is_depleted())
        .map(|stack| Leftover {
            stack_id: stack.id,
            resource_id: stack.resource_id.clone(),
            original_clicks: stack.original_clicks,
            remaining_clicks: stack.remaining_clicks,
        })
        .collect()
}

fn resolve_primary_target(manifest: &LootManifest, hard_mode: bool) -> PrimaryTargetOutcome {
    let Some(request) = &manifest.primary_target else {
        return PrimaryTargetOutcome {
            name: String::new(),
            value: Decimal::ZERO,
        };
    };

    let value = match PrimaryTarget::from_name(&request.name) {
        Some(target) => target.value(hard_mode) * Decimal::from(request.quantity),
        None => {
            debug!("Unknown primary target '{}' counts as zero", request.name);
            Decimal::ZERO
        }
    };

    PrimaryTargetOutcome {
        name: request.name.clone(),
        value,
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LootProfile;
    use rust_decimal_macros::dec;

    // Helper to build a catalog with a single loot type named "loot"
    fn single_loot_catalog(bag_space: Decimal, clicks: u32) -> LootCatalog {
        LootCatalog::new(vec![LootProfile {
            id: ResourceId::new("loot"),
            value_per_stack: dec!(1000),
            bag_space_per_stack: bag_space,
            clicks_per_stack: clicks,
        }])
        .unwrap()
    }

    fn run(catalog: &LootCatalog, manifest: &LootManifest, players: usize) -> AllocationResult {
        Allocator::new(catalog).allocate(manifest, players, false, &mut EventLog::new())
    }

    #[test]
    fn test_two_divisible_stacks_fill_one_bag() {
        let catalog = single_loot_catalog(dec!(50), 10);
        let manifest = LootManifest::new().with_loot("loot", 2);

        let result = run(&catalog, &manifest, 1);

        let player = &result.participants[0];
        let haul = player.haul_for("loot").unwrap();
        assert_eq!(haul.total_clicks, 20);
        assert_eq!(haul.stacks.len(), 2);
        assert_eq!(player.total_bag_space_used, dec!(100));
        assert_eq!(player.remaining_capacity, dec!(0));
        assert_eq!(player.total_value, dec!(2000));
        assert!(result.leftovers.is_empty());
    }

    #[test]
    fn test_indivisible_stacks_leave_one_behind() {
        let catalog = single_loot_catalog(dec!(50), 1);
        let manifest = LootManifest::new().with_loot("loot", 3);

        let result = run(&catalog, &manifest, 1);

        let haul = result.participants[0].haul_for("loot").unwrap();
        assert_eq!(haul.total_clicks, 2);
        assert_eq!(
            haul.stacks.iter().map(|s| s.stack_id).collect::<Vec<_>>(),
            vec![StackId(0), StackId(1)]
        );
        assert_eq!(
            result.leftovers,
            vec![Leftover {
                stack_id: StackId(2),
                resource_id: ResourceId::new("loot"),
                original_clicks: 1,
                remaining_clicks: 1,
            }]
        );
    }

    #[test]
    fn test_first_participant_fills_first() {
        let catalog = single_loot_catalog(dec!(100), 10);
        let manifest = LootManifest::new().with_loot("loot", 1);

        let result = run(&catalog, &manifest, 2);

        assert_eq!(result.participants.len(), 2);
        let first = result.participants[0].haul_for("loot").unwrap();
        assert_eq!(first.total_clicks, 10);
        assert!(result.participants[1].loot.is_empty());
        assert_eq!(result.participants[1].total_bag_space_used, dec!(0));
    }

    #[test]
    fn test_zero_participants_still_price_target() {
        let manifest = LootManifest::new()
            .with_loot("gold", 3)
            .with_target("Pink Diamond", 2);

        let result = allocate(&manifest, 0, true);

        assert!(result.participants.is_empty());
        assert_eq!(result.leftovers.len(), 3);
        assert!(result.leftovers.iter().all(|l| l.remaining_clicks == 10));
        assert_eq!(result.primary_target.name, "Pink Diamond");
        assert_eq!(result.primary_target.value, dec!(2860000));
    }

    #[test]
    fn test_unknown_target_is_worth_nothing() {
        let manifest = LootManifest::new().with_target("Golden Toilet", 5);
        let result = allocate(&manifest, 2, true);
        assert_eq!(result.primary_target.name, "Golden Toilet");
        assert_eq!(result.primary_target.value, dec!(0));
    }

    #[test]
    fn test_missing_target_is_empty() {
        let result = allocate(&LootManifest::new(), 1, false);
        assert_eq!(result.primary_target.name, "");
        assert_eq!(result.primary_target.value, dec!(0));
    }

    #[test]
    fn test_unaffordable_stack_is_abandoned() {
        // One click needs more space than an empty bag has
        let catalog = single_loot_catalog(dec!(150), 1);
        let manifest = LootManifest::new().with_loot("loot", 2);
        let mut log = EventLog::new();

        let result = Allocator::new(&catalog).allocate(&manifest, 3, false, &mut log);

        assert!(result.participants.iter().all(|p| p.loot.is_empty()));
        assert_eq!(result.leftovers.len(), 2);
        let abandoned = log
            .get_events()
            .iter()
            .filter(|e| matches!(e.event_type, EventType::StackAbandoned { .. }))
            .count();
        assert_eq!(abandoned, 2);
    }

    #[test]
    fn test_stack_splits_across_participants() {
        // 30 bag space per click: each bag fits 3 clicks and keeps 10% spare
        let catalog = single_loot_catalog(dec!(300), 10);
        let manifest = LootManifest::new().with_loot("loot", 1);

        let result = run(&catalog, &manifest, 3);

        let clicks: Vec<u32> = result
            .participants
            .iter()
            .map(|p| p.haul_for("loot").map_or(0, |h| h.total_clicks))
            .collect();
        assert_eq!(clicks, vec![3, 3, 3]);
        assert!(result.participants.iter().all(|p| p.remaining_capacity == dec!(10)));
        assert_eq!(result.leftovers[0].remaining_clicks, 1);
    }

    #[test]
    fn test_partial_bag_continues_to_next_participant_in_same_pass() {
        // 40 per click: first bag takes 2 clicks and keeps 20%, second bag
        // receives the rest of the stack without a rescan.
        let catalog = single_loot_catalog(dec!(160), 4);
        let manifest = LootManifest::new().with_loot("loot", 1);
        let mut log = EventLog::new();

        let result = Allocator::new(&catalog).allocate(&manifest, 2, false, &mut log);

        assert_eq!(result.participants[0].haul_for("loot").unwrap().total_clicks, 2);
        assert_eq!(result.participants[1].haul_for("loot").unwrap().total_clicks, 2);
        assert_eq!(result.participants[0].remaining_capacity, dec!(20));
        assert!(result.leftovers.is_empty());
    }

    #[test]
    fn test_rescan_returns_to_first_participant() {
        let catalog = LootCatalog::new(vec![
            LootProfile {
                id: ResourceId::new("big"),
                value_per_stack: dec!(1000),
                bag_space_per_stack: dec!(60),
                clicks_per_stack: 1,
            },
            LootProfile {
                id: ResourceId::new("small"),
                value_per_stack: dec!(100),
                bag_space_per_stack: dec!(100),
                clicks_per_stack: 10,
            },
        ])
        .unwrap();
        let manifest = LootManifest::new().with_loot("big", 1).with_loot("small", 1);

        let result = run(&catalog, &manifest, 2);

        // The painting-like item fills 60% of bag 1; the divisible stack tops up
        // bag 1 (4 clicks) before bag 2 sees anything.
        let first = &result.participants[0];
        assert_eq!(first.haul_for("big").unwrap().total_clicks, 1);
        assert_eq!(first.haul_for("small").unwrap().total_clicks, 4);
        assert_eq!(first.remaining_capacity, dec!(0));
        assert_eq!(
            result.participants[1].haul_for("small").unwrap().total_clicks,
            6
        );
    }

    #[test]
    fn test_stack_ids_follow_catalog_order() {
        let manifest = LootManifest::new()
            .with_loot("cash", 1)
            .with_loot("gold", 1)
            .with_loot("painting", 1);

        let result = allocate(&manifest, 1, false);

        // gold=0, painting=1, cash=2 regardless of priority
        let player = &result.participants[0];
        assert_eq!(player.haul_for("gold").unwrap().stacks[0].stack_id, StackId(0));
        assert_eq!(player.haul_for("painting").map(|h| h.stacks[0].stack_id), None);
        assert_eq!(player.haul_for("cash").unwrap().stacks[0].stack_id, StackId(2));
    }

    #[test]
    fn test_unknown_and_negative_quantities_ignored() {
        let manifest = LootManifest::new()
            .with_loot("diamonds", 4)
            .with_loot("cash", -2);

        let result = allocate(&manifest, 1, false);

        assert!(result.participants[0].loot.is_empty());
        assert!(result.leftovers.is_empty());
        assert_eq!(result.participants[0].total_value, dec!(0));
    }

    #[test]
    fn test_exact_decimal_capacity_accounting() {
        // 6.667 per gold click: 14 clicks leave 6.662, which still fits one cocaine click
        let manifest = LootManifest::new().with_loot("gold", 2).with_loot("cocaine", 1);

        let result = allocate(&manifest, 1, false);

        let player = &result.participants[0];
        assert_eq!(player.haul_for("gold").unwrap().total_clicks, 14);
        assert_eq!(player.haul_for("cocaine").unwrap().total_clicks, 1);
        assert_eq!(player.remaining_capacity, dec!(1.662));
        assert_eq!(player.total_bag_space_used, dec!(98.338));
    }

    #[test]
    fn test_repeating_click_size_leaves_sliver_but_respects_capacity() {
        // 100 / 3 has no finite decimal form and rounds at 28 digits
        let catalog = single_loot_catalog(dec!(100), 3);
        let manifest = LootManifest::new().with_loot("loot", 2);
        let mut log = EventLog::new();

        let result = Allocator::new(&catalog).allocate(&manifest, 1, false, &mut log);

        let player = &result.participants[0];
        assert_eq!(player.haul_for("loot").unwrap().total_clicks, 3);
        assert!(player.total_bag_space_used <= dec!(100));
        assert!(player.remaining_capacity > Decimal::ZERO);
        assert!(player.remaining_capacity < dec!(0.000001));

        let events = log.get_events();
        assert!(!events.iter().any(|e| matches!(e.event_type, EventType::BagFilled { .. })));
        assert!(events.iter().any(|e| matches!(
            e.event_type,
            EventType::StackAbandoned { stack_id: StackId(1), remaining_clicks: 3, .. }
        )));
        assert_eq!(result.leftovers.len(), 1);
        assert_eq!(result.leftovers[0].remaining_clicks, 3);
    }
}
