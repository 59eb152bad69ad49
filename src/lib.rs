pub mod allocator;
pub mod catalog;
pub mod cli;
pub mod events;
pub mod report;
pub mod request;
pub mod stack_builder;
pub mod types;

pub use allocator::{AllocationResult, Allocator, allocate};
pub use request::{LootManifest, PlanRequest};

#[cfg(test)]
mod stack_builder_test;
