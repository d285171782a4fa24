//! Identifier and handle types for the plant simulator
//!
//! Batches get monotonically assigned numeric ids, resources are addressed by
//! typed index handles, and each simulation run carries a UUID.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RUN_{}", self.0.simple())
    }
}

impl Serialize for RunId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("RUN_{}", self.0.simple()))
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let raw = s.strip_prefix("RUN_").unwrap_or(&s);
        let uuid = Uuid::parse_str(raw).map_err(serde::de::Error::custom)?;
        Ok(RunId(uuid))
    }
}

/// Identifier of a truck load, assigned in arrival order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub u64);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BATCH_{:05}", self.0)
    }
}

/// Hands out batch ids in strictly increasing order
#[derive(Debug, Clone, Default)]
pub struct BatchIdAllocator {
    next: u64,
}

impl BatchIdAllocator {
    /// Create an allocator whose first id is 1
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Take the next id
    pub fn allocate(&mut self) -> BatchId {
        if self.next == 0 {
            self.next = 1;
        }
        let id = BatchId(self.next);
        self.next += 1;
        id
    }
}

/// Categorical cultivar identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HybridType(pub u32);

impl fmt::Display for HybridType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0)
    }
}

macro_rules! index_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// Zero-based position inside the owning pool
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0 + 1)
            }
        }
    };
}

index_handle!(
    /// Handle of an unloading line
    UnloadLineId,
    "UL"
);
index_handle!(
    /// Handle of a sorting line
    SortLineId,
    "SL"
);
index_handle!(
    /// Handle of a shelling line
    ShellLineId,
    "SH"
);
index_handle!(
    /// Handle of a dryer
    DryerId,
    "D"
);
index_handle!(
    /// Handle of a module inside its dryer
    ModuleId,
    "M"
);

/// Fully qualified module address: dryer plus module within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleRef {
    /// Owning dryer
    pub dryer: DryerId,
    /// Module inside the dryer
    pub module: ModuleId,
}

impl ModuleRef {
    /// Build a module reference
    pub fn new(dryer: DryerId, module: ModuleId) -> Self {
        Self { dryer, module }
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dryer, self.module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_roundtrip_format() {
        let id = RunId::new();
        assert!(id.to_string().starts_with("RUN_"));

        let json = serde_json::to_string(&id).unwrap();
        let back: RunId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_run_id_accepts_raw_uuid() {
        let uuid = Uuid::new_v4();
        let json = format!("\"{}\"", uuid);
        let parsed: RunId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.0, uuid);
    }

    #[test]
    fn test_batch_ids_are_monotonic() {
        let mut allocator = BatchIdAllocator::new();
        let first = allocator.allocate();
        let second = allocator.allocate();
        let third = allocator.allocate();

        assert_eq!(first, BatchId(1));
        assert!(first < second && second < third);
    }

    #[test]
    fn test_default_allocator_starts_at_one() {
        let mut allocator = BatchIdAllocator::default();
        assert_eq!(allocator.allocate(), BatchId(1));
    }

    #[test]
    fn test_handle_display_is_one_based() {
        assert_eq!(UnloadLineId(0).to_string(), "UL1");
        assert_eq!(SortLineId(3).to_string(), "SL4");
        assert_eq!(ShellLineId(1).to_string(), "SH2");
        assert_eq!(ModuleRef::new(DryerId(4), ModuleId(2)).to_string(), "D5/M3");
        assert_eq!(HybridType(17).to_string(), "H17");
    }

    #[test]
    fn test_handles_serialize_transparently() {
        assert_eq!(serde_json::to_string(&UnloadLineId(2)).unwrap(), "2");
        assert_eq!(serde_json::to_string(&HybridType(9)).unwrap(), "9");
        let module = ModuleRef::new(DryerId(0), ModuleId(1));
        assert_eq!(serde_json::to_string(&module).unwrap(), r#"{"dryer":0,"module":1}"#);
    }
}
