//! Dryers and their modules
//!
//! A dryer is a group of modules restricted to one GMO class. Each module
//! collects batches of a single hybrid type into a `MixedBatch`, dries it once
//! closed and is emptied after shelling. The dryer keeps an index from hybrid
//! type to the modules currently holding it so that same-type batches can be
//! co-located without scanning every module.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::batch::{Batch, Lot, MixedBatch};
use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{DryerId, DryerSpec, GmoClass, HybridType, ModuleId, ModuleRef, ModuleState};

/// Capacity-bounded drying container
#[derive(Debug, Clone, Serialize)]
pub struct DryerModule {
    id: ModuleRef,
    capacity: f64,
    state: ModuleState,
    contents: Option<MixedBatch>,
    hybrid_type: Option<HybridType>,
    load_started: Option<f64>,
}

impl DryerModule {
    /// Create an empty module waiting for load
    pub fn new(id: ModuleRef, capacity: f64) -> Self {
        Self {
            id,
            capacity,
            state: ModuleState::WaitingLoad,
            contents: None,
            hybrid_type: None,
            load_started: None,
        }
    }

    /// Module address
    pub fn id(&self) -> ModuleRef {
        self.id
    }

    /// Capacity in tonnes
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Current state
    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Accumulated batches, present while loading and drying
    pub fn contents(&self) -> Option<&MixedBatch> {
        self.contents.as_ref()
    }

    /// Hybrid type held from first load until the module is emptied
    pub fn hybrid_type(&self) -> Option<HybridType> {
        self.hybrid_type
    }

    /// Time of the first load of the current cycle
    pub fn load_started(&self) -> Option<f64> {
        self.load_started
    }

    /// Tonnes loaded so far
    pub fn loaded(&self) -> f64 {
        self.contents.as_ref().map(Lot::load).unwrap_or(0.0)
    }

    /// Capacity still available
    pub fn remaining_capacity(&self) -> f64 {
        (self.capacity - self.loaded()).max(0.0)
    }

    /// Whether the module is open and holds nothing
    pub fn is_empty(&self) -> bool {
        self.state == ModuleState::WaitingLoad && self.hybrid_type.is_none()
    }

    /// Whether the module is taken by a drying cycle in any state
    pub fn is_in_use(&self) -> bool {
        !self.is_empty()
    }

    /// Whether a batch of this type and load can join the module
    pub fn can_take(&self, hybrid_type: HybridType, load: f64) -> bool {
        self.state == ModuleState::WaitingLoad
            && self.hybrid_type.map_or(true, |held| held == hybrid_type)
            && load <= self.remaining_capacity()
    }

    /// Add a batch; returns true when this is the first load of the cycle
    pub fn load(&mut self, batch: Batch, clock: f64) -> SimulationResult<bool> {
        if self.state != ModuleState::WaitingLoad {
            return Err(SimulationError::contract_violation(format!(
                "module {} is {} and cannot be loaded",
                self.id, self.state
            )));
        }
        if batch.load() > self.remaining_capacity() {
            return Err(SimulationError::contract_violation(format!(
                "{} ({:.2} t) exceeds the remaining capacity of module {} ({:.2} t)",
                batch.id(),
                batch.load(),
                self.id,
                self.remaining_capacity()
            )));
        }

        match self.contents.as_mut() {
            Some(mixed) => {
                mixed.push(batch)?;
                Ok(false)
            }
            None => {
                self.hybrid_type = Some(batch.hybrid_type());
                self.load_started = Some(clock);
                self.contents = Some(MixedBatch::new(batch));
                Ok(true)
            }
        }
    }

    /// Close the module for drying and return the humidity of its contents
    pub fn close(&mut self) -> SimulationResult<f64> {
        let humidity = match (&self.state, &self.contents) {
            (ModuleState::WaitingLoad, Some(mixed)) => mixed.humidity(),
            _ => {
                return Err(SimulationError::contract_violation(format!(
                    "module {} cannot be closed while {} and {}",
                    self.id,
                    self.state,
                    if self.contents.is_some() { "loaded" } else { "empty" }
                )))
            }
        };
        self.state = ModuleState::Drying;
        Ok(humidity)
    }

    /// Finish drying and hand the contents over for shelling
    pub fn open(&mut self) -> SimulationResult<MixedBatch> {
        if self.state != ModuleState::Drying {
            return Err(SimulationError::contract_violation(format!(
                "module {} opened while {}",
                self.id, self.state
            )));
        }
        let mixed = self.contents.take().ok_or_else(|| {
            SimulationError::contract_violation(format!("module {} dried without contents", self.id))
        })?;
        self.state = ModuleState::WaitingUnload;
        Ok(mixed)
    }

    /// Empty the module after shelling; returns the hybrid type it held
    pub fn unload(&mut self) -> SimulationResult<HybridType> {
        if self.state != ModuleState::WaitingUnload {
            return Err(SimulationError::contract_violation(format!(
                "module {} emptied while {}",
                self.id, self.state
            )));
        }
        let held = self.hybrid_type.take().ok_or_else(|| {
            SimulationError::contract_violation(format!("module {} has no hybrid type", self.id))
        })?;
        self.state = ModuleState::WaitingLoad;
        self.load_started = None;
        Ok(held)
    }
}

/// Group of modules restricted to one GMO class
#[derive(Debug, Clone)]
pub struct Dryer {
    id: DryerId,
    gmo: GmoClass,
    modules: Vec<DryerModule>,
    type_index: HashMap<HybridType, BTreeSet<ModuleId>>,
}

impl Dryer {
    /// Create a dryer with empty modules
    pub fn new(id: DryerId, spec: &DryerSpec) -> Self {
        let modules = (0..spec.modules)
            .map(|index| DryerModule::new(ModuleRef::new(id, ModuleId(index)), spec.module_capacity))
            .collect();
        Self { id, gmo: spec.gmo, modules, type_index: HashMap::new() }
    }

    /// Dryer handle
    pub fn id(&self) -> DryerId {
        self.id
    }

    /// GMO class served by every module
    pub fn gmo(&self) -> GmoClass {
        self.gmo
    }

    /// All modules in index order
    pub fn modules(&self) -> &[DryerModule] {
        &self.modules
    }

    /// Look up a module
    pub fn module(&self, id: ModuleId) -> SimulationResult<&DryerModule> {
        self.modules.get(id.index()).ok_or_else(|| {
            SimulationError::contract_violation(format!("dryer {} has no module {}", self.id, id))
        })
    }

    fn module_mut(&mut self, id: ModuleId) -> SimulationResult<&mut DryerModule> {
        let dryer = self.id;
        self.modules.get_mut(id.index()).ok_or_else(|| {
            SimulationError::contract_violation(format!("dryer {} has no module {}", dryer, id))
        })
    }

    /// Modules currently holding `hybrid_type`, in index order
    pub fn modules_holding(&self, hybrid_type: HybridType) -> impl Iterator<Item = ModuleId> + '_ {
        self.type_index.get(&hybrid_type).into_iter().flat_map(|set| set.iter().copied())
    }

    /// First open module already holding this type with room for `load`
    pub fn affinity_module(&self, hybrid_type: HybridType, load: f64) -> Option<ModuleId> {
        self.modules_holding(hybrid_type).find(|id| {
            self.modules.get(id.index()).map_or(false, |module| module.can_take(hybrid_type, load))
        })
    }

    /// First empty module able to hold `load`
    pub fn empty_module(&self, load: f64) -> Option<ModuleId> {
        self.modules
            .iter()
            .find(|module| module.is_empty() && load <= module.capacity())
            .map(|module| module.id().module)
    }

    /// Number of modules taken by a drying cycle
    pub fn modules_in_use(&self) -> usize {
        self.modules.iter().filter(|module| module.is_in_use()).count()
    }

    /// Load a batch into a module; returns true on the first load of the cycle
    pub fn load(&mut self, module: ModuleId, batch: Batch, clock: f64) -> SimulationResult<bool> {
        if batch.gmo() != self.gmo {
            return Err(SimulationError::contract_violation(format!(
                "{} ({}) routed to {} dryer {}",
                batch.id(),
                batch.gmo(),
                self.gmo,
                self.id
            )));
        }
        let hybrid_type = batch.hybrid_type();
        let first = self.module_mut(module)?.load(batch, clock)?;
        self.type_index.entry(hybrid_type).or_default().insert(module);
        Ok(first)
    }

    /// Close a module for drying; returns the humidity of its contents
    pub fn close(&mut self, module: ModuleId) -> SimulationResult<f64> {
        self.module_mut(module)?.close()
    }

    /// Finish drying a module and take its contents
    pub fn open(&mut self, module: ModuleId) -> SimulationResult<MixedBatch> {
        self.module_mut(module)?.open()
    }

    /// Empty a module, dropping it from the type index
    pub fn unload(&mut self, module: ModuleId) -> SimulationResult<()> {
        let held = self.module_mut(module)?.unload()?;
        let now_unused = match self.type_index.get_mut(&held) {
            Some(set) => {
                set.remove(&module);
                set.is_empty()
            }
            None => false,
        };
        if now_unused {
            self.type_index.remove(&held);
        }
        Ok(())
    }

    /// Verify that the type index matches the modules exactly
    pub fn check_index(&self) -> SimulationResult<()> {
        for (hybrid_type, ids) in &self.type_index {
            if ids.is_empty() {
                return Err(SimulationError::contract_violation(format!(
                    "dryer {} indexes {} with no modules",
                    self.id, hybrid_type
                )));
            }
            for id in ids {
                if self.module(*id)?.hybrid_type() != Some(*hybrid_type) {
                    return Err(SimulationError::contract_violation(format!(
                        "dryer {} indexes module {} under {} but it holds {:?}",
                        self.id,
                        id,
                        hybrid_type,
                        self.module(*id)?.hybrid_type()
                    )));
                }
            }
        }
        for module in &self.modules {
            if let Some(held) = module.hybrid_type() {
                let indexed =
                    self.type_index.get(&held).map_or(false, |ids| ids.contains(&module.id().module));
                if !indexed {
                    return Err(SimulationError::contract_violation(format!(
                        "module {} holds {} but is not indexed",
                        module.id(),
                        held
                    )));
                }
            }
        }
        Ok(())
    }
}
