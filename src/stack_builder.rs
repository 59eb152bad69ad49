use crate::catalog::LootCatalog;
use crate::types::{ResourceId, StackId};
use std::collections::{BTreeMap, HashMap};

/// One physical pile of loot. Clicks are taken from it until it is empty or
/// nobody has room left.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    pub id: StackId,
    pub resource_id: ResourceId,
    pub original_clicks: u32,
    pub remaining_clicks: u32,
}

impl Stack {
    pub fn is_depleted(&self) -> bool {
        self.remaining_clicks == 0
    }

    pub fn clicks_taken(&self) -> u32 {
        self.original_clicks - self.remaining_clicks
    }
}

/// Builder for numbering stacks with a single id counter shared by every
/// loot type.
pub struct StackBuilder {
    stacks: HashMap<ResourceId, Vec<Stack>>,
    id_counter: usize,
}

impl StackBuilder {
    pub fn new() -> Self {
        Self {
            stacks: HashMap::new(),
            id_counter: 0,
        }
    }

    /// Add `quantity` fresh stacks of one loot type. Zero or negative
    /// quantities add nothing.
    pub fn add_stacks(&mut self, resource_id: &ResourceId, quantity: i64, clicks_per_stack: u32) {
        let entry = self.stacks.entry(resource_id.clone()).or_default();
        for _ in 0..quantity.max(0) {
            entry.push(Stack {
                id: StackId(self.id_counter),
                resource_id: resource_id.clone(),
                original_clicks: clicks_per_stack,
                remaining_clicks: clicks_per_stack,
            });
            self.id_counter += 1;
        }
    }

    /// Expand requested quantities in catalog order. Names the catalog does not
    /// know are ignored.
    pub fn from_quantities(catalog: &LootCatalog, quantities: &BTreeMap<String, i64>) -> Self {
        let mut builder = Self::new();
        for rates in catalog.iter() {
            let quantity = quantities.get(rates.id.as_str()).copied().unwrap_or(0);
            builder.add_stacks(&rates.id, quantity, rates.clicks_per_stack);
        }
        builder
    }

    pub fn stack_count(&self) -> usize {
        self.id_counter
    }

    /// Get the stacks grouped by loot type, each group in creation order.
    pub fn build(self) -> HashMap<ResourceId, Vec<Stack>> {
        self.stacks
    }
}

impl Default for StackBuilder {
    fn default() -> Self {
        Self::new()
    }
}
