#[cfg(test)]
mod tests {
    use super::super::catalog::LootCatalog;
    use super::super::stack_builder::*;
    use super::super::types::{ResourceId, StackId};
    use std::collections::BTreeMap;

    #[test]
    fn test_ids_shared_across_types() {
        let mut builder = StackBuilder::new();
        builder.add_stacks(&ResourceId::new("a"), 2, 10);
        builder.add_stacks(&ResourceId::new("b"), 1, 1);
        assert_eq!(builder.stack_count(), 3);

        let stacks = builder.build();
        let a: Vec<StackId> = stacks[&ResourceId::new("a")].iter().map(|s| s.id).collect();
        assert_eq!(a, vec![StackId(0), StackId(1)]);
        assert_eq!(stacks[&ResourceId::new("b")][0].id, StackId(2));
        assert_eq!(stacks[&ResourceId::new("b")][0].remaining_clicks, 1);
    }

    #[test]
    fn test_non_positive_quantity_adds_nothing() {
        let mut builder = StackBuilder::new();
        builder.add_stacks(&ResourceId::new("a"), 0, 10);
        builder.add_stacks(&ResourceId::new("a"), -3, 10);
        assert_eq!(builder.stack_count(), 0);
        assert!(builder.build()[&ResourceId::new("a")].is_empty());
    }

    #[test]
    fn test_expansion_uses_catalog_order() {
        let catalog = LootCatalog::heist();
        let mut quantities = BTreeMap::new();
        // BTreeMap iterates alphabetically; ids must follow the catalog instead
        quantities.insert("cash".to_string(), 2);
        quantities.insert("weed".to_string(), 1);
        quantities.insert("gold".to_string(), 1);
        quantities.insert("rubies".to_string(), 5);

        let builder = StackBuilder::from_quantities(&catalog, &quantities);
        assert_eq!(builder.stack_count(), 4);

        let stacks = builder.build();
        assert_eq!(stacks[&ResourceId::new("gold")][0].id, StackId(0));
        assert_eq!(stacks[&ResourceId::new("weed")][0].id, StackId(1));
        let cash: Vec<StackId> = stacks[&ResourceId::new("cash")].iter().map(|s| s.id).collect();
        assert_eq!(cash, vec![StackId(2), StackId(3)]);
        assert!(!stacks.contains_key(&ResourceId::new("rubies")));
    }

    #[test]
    fn test_stack_click_accounting() {
        let mut stack = Stack {
            id: StackId(0),
            resource_id: ResourceId::new("cash"),
            original_clicks: 10,
            remaining_clicks: 10,
        };
        assert!(!stack.is_depleted());
        stack.remaining_clicks = 3;
        assert_eq!(stack.clicks_taken(), 7);
        stack.remaining_clicks = 0;
        assert!(stack.is_depleted());
    }
}
