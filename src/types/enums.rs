//! Enumeration types for the plant simulator
//!
//! This module contains the enumerations used throughout the simulation:
//! GMO segregation classes, sorting line modes, dryer module states, loss
//! causes, resource classes and report output formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GMO segregation class of a batch, dryer or shelling line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GmoClass {
    /// Genetically modified material
    Gmo,
    /// Conventional material
    NonGmo,
}

impl GmoClass {
    /// Whether this is the GMO class
    pub fn is_gmo(self) -> bool {
        self == GmoClass::Gmo
    }
}

impl From<bool> for GmoClass {
    fn from(gmo: bool) -> Self {
        if gmo {
            GmoClass::Gmo
        } else {
            GmoClass::NonGmo
        }
    }
}

impl fmt::Display for GmoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GmoClass::Gmo => write!(f, "GMO"),
            GmoClass::NonGmo => write!(f, "Non-GMO"),
        }
    }
}

impl FromStr for GmoClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gmo" | "true" => Ok(GmoClass::Gmo),
            "non-gmo" | "non_gmo" | "nongmo" | "false" => Ok(GmoClass::NonGmo),
            _ => Err(format!("Unknown GMO class: {}", s)),
        }
    }
}

/// Operating mode of a sorting line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Machine sorting, higher throughput
    Automatic,
    /// Hand sorting, lower throughput
    Manual,
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortMode::Automatic => write!(f, "Automatic"),
            SortMode::Manual => write!(f, "Manual"),
        }
    }
}

/// State machine of a dryer module
///
/// `WaitingLoad -> Drying -> WaitingUnload -> WaitingLoad`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    /// Open and accepting batches (possibly empty)
    WaitingLoad,
    /// Closed, drying its mixed batch
    Drying,
    /// Dry, contents handed to shelling, waiting to be emptied
    WaitingUnload,
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleState::WaitingLoad => write!(f, "Waiting Load"),
            ModuleState::Drying => write!(f, "Drying"),
            ModuleState::WaitingUnload => write!(f, "Waiting Unload"),
        }
    }
}

/// Reason a batch left the plant without being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossCause {
    /// Waited in the unloading queue past the patience timeout
    QueueTimeout,
    /// No sorting line free when unloading finished
    SortingCapacity,
    /// No dryer module could take the batch
    DryingCapacity,
}

impl LossCause {
    /// All causes in reporting order
    pub const ALL: [LossCause; 3] =
        [LossCause::QueueTimeout, LossCause::SortingCapacity, LossCause::DryingCapacity];
}

impl fmt::Display for LossCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossCause::QueueTimeout => write!(f, "Queue Timeout"),
            LossCause::SortingCapacity => write!(f, "Sorting Capacity"),
            LossCause::DryingCapacity => write!(f, "Drying Capacity"),
        }
    }
}

/// Resource pools tracked for utilization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    /// Unloading lines
    Unloading,
    /// Sorting lines
    Sorting,
    /// Dryer modules
    DryerModules,
    /// Shelling lines
    Shelling,
}

impl ResourceClass {
    /// All resource classes in process order
    pub const ALL: [ResourceClass; 4] = [
        ResourceClass::Unloading,
        ResourceClass::Sorting,
        ResourceClass::DryerModules,
        ResourceClass::Shelling,
    ];
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceClass::Unloading => write!(f, "Unloading"),
            ResourceClass::Sorting => write!(f, "Sorting"),
            ResourceClass::DryerModules => write!(f, "Dryer Modules"),
            ResourceClass::Shelling => write!(f, "Shelling"),
        }
    }
}

/// Output format for the final statistics report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Pretty-printed JSON document
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
