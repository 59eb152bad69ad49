use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt;
use std::path::Path;

use crate::catalog::{LootCatalog, PrimaryTarget};

/// What is on the island: stack counts per loot name and the primary target.
/// Loot quantities sit at the top level next to `primary_target`, so any key
/// that is not a named field is read as a loot name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LootManifest {
    #[serde(flatten)]
    pub loot: BTreeMap<String, i64>,
    #[serde(default)]
    pub primary_target: Option<TargetRequest>,
}

impl LootManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loot(mut self, name: impl Into<String>, quantity: i64) -> Self {
        self.loot.insert(name.into(), quantity);
        self
    }

    pub fn with_target(mut self, name: impl Into<String>, quantity: u32) -> Self {
        self.primary_target = Some(TargetRequest {
            name: name.into(),
            quantity,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRequest {
    pub name: String,
    #[serde(default = "default_target_quantity")]
    pub quantity: u32,
}

fn default_target_quantity() -> u32 {
    1
}

fn default_players() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerParameters {
    /// Capacity of every bag, in percent.
    pub bag_capacity: Decimal,
}

impl Default for PlannerParameters {
    fn default() -> Self {
        Self {
            bag_capacity: dec!(100.0),
        }
    }
}

/// A complete planning run as stored in a request file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub manifest: LootManifest,
    #[serde(default = "default_players")]
    pub players: usize,
    #[serde(default)]
    pub hard_mode: bool,
    #[serde(default)]
    pub parameters: PlannerParameters,
}

#[derive(Debug)]
pub enum RequestError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Io(e) => write!(f, "Failed to read request: {}", e),
            RequestError::Json(e) => write!(f, "Invalid JSON request: {}", e),
            RequestError::Yaml(e) => write!(f, "Invalid YAML request: {}", e),
        }
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RequestError::Io(e) => Some(e),
            RequestError::Json(e) => Some(e),
            RequestError::Yaml(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for RequestError {
    fn from(e: std::io::Error) -> Self {
        RequestError::Io(e)
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(e: serde_json::Error) -> Self {
        RequestError::Json(e)
    }
}

impl From<serde_yaml::Error> for RequestError {
    fn from(e: serde_yaml::Error) -> Self {
        RequestError::Yaml(e)
    }
}

impl PlanRequest {
    pub fn new(name: String) -> Self {
        Self {
            name,
            description: String::new(),
            manifest: LootManifest::default(),
            players: default_players(),
            hard_mode: false,
            parameters: PlannerParameters::default(),
        }
    }

    pub fn save_to_file(&self, path: &str) -> Result<(), RequestError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a request. Files ending in `.yaml` or `.yml` are read as YAML,
    /// everything else as JSON.
    pub fn load_from_file(path: &str) -> Result<Self, RequestError> {
        let text = std::fs::read_to_string(path)?;
        let is_yaml = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let request: Self = if is_yaml {
            serde_yaml::from_str(&text)?
        } else {
            serde_json::from_str(&text)?
        };
        Ok(request)
    }

    /// Flag requests that will plan nothing useful. The allocator accepts all of
    /// these; the warnings are for whoever wrote the request.
    pub fn validate(&self, catalog: &LootCatalog) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.players == 0 {
            problems.push("No players: every stack will be left behind".to_string());
        }
        if self.parameters.bag_capacity <= Decimal::ZERO {
            problems.push(format!(
                "Bag capacity {} leaves no room for loot",
                self.parameters.bag_capacity
            ));
        }
        for (name, quantity) in &self.manifest.loot {
            if catalog.get(name).is_none() {
                problems.push(format!("Unknown loot type '{}' will be ignored", name));
            } else if *quantity < 0 {
                problems.push(format!("Negative quantity {} for {}", quantity, name));
            }
        }
        if let Some(target) = &self.manifest.primary_target {
            if PrimaryTarget::from_name(&target.name).is_none() {
                problems.push(format!(
                    "Unknown primary target '{}' is worth nothing",
                    target.name
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

impl fmt::Display for PlanRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Request: {}", self.name)?;
        if !self.description.is_empty() {
            writeln!(f, "Description: {}", self.description)?;
        }
        writeln!(f, "  Players: {}", self.players)?;
        writeln!(
            f,
            "  Difficulty: {}",
            if self.hard_mode { "hard" } else { "normal" }
        )?;
        writeln!(f, "  Bag capacity: {}%", self.parameters.bag_capacity)?;
        match &self.manifest.primary_target {
            Some(target) => writeln!(f, "  Primary target: {} x{}", target.name, target.quantity)?,
            None => writeln!(f, "  Primary target: none")?,
        }
        writeln!(f, "  Loot:")?;
        for (name, quantity) in &self.manifest.loot {
            writeln!(f, "    {}: {}", name, quantity)?;
        }
        Ok(())
    }
}

pub fn create_standard_presets() -> HashMap<String, PlanRequest> {
    let mut presets = HashMap::new();

    let mut crew = PlanRequest::new("full_crew".to_string());
    crew.description = "Four players, hard mode, mixed compound loot".to_string();
    crew.players = 4;
    crew.hard_mode = true;
    crew.manifest = LootManifest::new()
        .with_target("Sinsimito Tequila", 1)
        .with_loot("gold", 2)
        .with_loot("cocaine", 2)
        .with_loot("weed", 2)
        .with_loot("painting", 1)
        .with_loot("cash", 6);
    presets.insert("crew".to_string(), crew);

    let mut solo = PlanRequest::new("solo_run".to_string());
    solo.description = "One player, no gold, paintings and cash".to_string();
    solo.manifest = LootManifest::new()
        .with_target("Ruby Necklace", 1)
        .with_loot("painting", 2)
        .with_loot("cash", 3)
        .with_loot("weed", 1);
    presets.insert("solo".to_string(), solo);

    let mut duo = PlanRequest::new("duo_gold".to_string());
    duo.description = "Two players sharing a gold-heavy compound".to_string();
    duo.players = 2;
    duo.manifest = LootManifest::new()
        .with_target("Panther Statue", 1)
        .with_loot("gold", 4)
        .with_loot("cocaine", 1)
        .with_loot("cash", 2);
    presets.insert("duo".to_string(), duo);

    presets
}
