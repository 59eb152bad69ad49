use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ParticipantId, ResourceId, StackId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationEvent {
    pub step: usize,
    pub event_type: EventType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum EventType {
    PriorityRanked {
        rank: usize,
        resource: ResourceId,
        density: Decimal,
        stacks: usize,
    },
    ClicksAssigned {
        participant: ParticipantId,
        resource: ResourceId,
        stack_id: StackId,
        clicks: u32,
        bag_space_used: Decimal,
        value: Decimal,
        remaining_capacity: Decimal,
    },
    BagFilled {
        participant: ParticipantId,
    },
    StackAbandoned {
        resource: ResourceId,
        stack_id: StackId,
        remaining_clicks: u32,
    },
}

impl fmt::Display for AllocationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.step)?;

        match &self.event_type {
            EventType::PriorityRanked {
                rank,
                resource,
                density,
                stacks,
            } => {
                write!(
                    f,
                    "Priority {}: {} ({:.2} per 1% bag, {} stacks)",
                    rank, resource, density, stacks
                )
            }
            EventType::ClicksAssigned {
                participant,
                resource,
                stack_id,
                clicks,
                bag_space_used,
                value,
                remaining_capacity,
            } => {
                write!(
                    f,
                    "{} takes {} clicks of {} from stack {} ({:.2}% bag, value {:.0}, {:.2}% left)",
                    participant,
                    clicks,
                    resource,
                    stack_id.0,
                    bag_space_used,
                    value,
                    remaining_capacity
                )
            }
            EventType::BagFilled { participant } => write!(f, "{} bag is full", participant),
            EventType::StackAbandoned {
                resource,
                stack_id,
                remaining_clicks,
            } => {
                write!(
                    f,
                    "Stack {} of {} left behind with {} clicks",
                    stack_id.0, resource, remaining_clicks
                )
            }
        }
    }
}

#[derive(Default)]
pub struct EventLog {
    events: Vec<AllocationEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, event_type: EventType) {
        self.events.push(AllocationEvent {
            step: self.events.len(),
            event_type,
        });
    }

    pub fn get_events(&self) -> &[AllocationEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn save_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.events)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let events: Vec<AllocationEvent> = serde_json::from_str(&json)?;
        Ok(Self { events })
    }
}
