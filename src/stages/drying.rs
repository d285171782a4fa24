//! Drying stage
//!
//! Sorted batches are routed to a module of a dryer with the same GMO class,
//! preferring a module that already holds the batch's hybrid type. A module
//! closes a fixed time after its first load, dries down to the target
//! humidity and then hands its contents to shelling.

use serde::Serialize;
use tracing::debug;

use crate::batch::{Batch, Lot, MixedBatch};
use crate::resources::{Dryer, DryerModule};
use crate::simulation::{Event, SimulationError, SimulationResult};
use crate::stages::FollowUp;
use crate::types::{DryerId, GmoClass, HybridType, ModuleRef, SimulationConfig};

/// Dried contents of a module waiting for or going through shelling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriedLot {
    /// Module the lot is still occupying
    pub module: ModuleRef,
    /// Contents of the module
    pub mixed: MixedBatch,
    /// Time drying finished
    pub ready_at: f64,
}

impl Lot for DriedLot {
    fn hybrid_type(&self) -> HybridType {
        self.mixed.hybrid_type()
    }

    fn gmo(&self) -> GmoClass {
        self.mixed.gmo()
    }

    fn load(&self) -> f64 {
        self.mixed.load()
    }
}

/// Dryers and the drying policy
#[derive(Debug)]
pub struct DryingStage {
    dryers: Vec<Dryer>,
    closure_hours: f64,
    drying_rate: f64,
    target_humidity: f64,
}

impl DryingStage {
    /// Build the dryers from the configuration
    pub fn new(config: &SimulationConfig) -> Self {
        let dryers = config
            .drying
            .dryers
            .iter()
            .enumerate()
            .map(|(index, spec)| Dryer::new(DryerId(index), spec))
            .collect();
        Self {
            dryers,
            closure_hours: config.drying.module_closure_hours,
            drying_rate: config.drying.rate,
            target_humidity: config.drying.target_humidity,
        }
    }

    /// Dryers in routing order
    pub fn dryers(&self) -> &[Dryer] {
        &self.dryers
    }

    /// Look up a module
    pub fn module(&self, module: ModuleRef) -> SimulationResult<&DryerModule> {
        self.dryer(module.dryer)?.module(module.module)
    }

    fn dryer(&self, id: DryerId) -> SimulationResult<&Dryer> {
        self.dryers
            .get(id.index())
            .ok_or_else(|| SimulationError::contract_violation(format!("unknown dryer {}", id)))
    }

    fn dryer_mut(&mut self, id: DryerId) -> SimulationResult<&mut Dryer> {
        self.dryers
            .get_mut(id.index())
            .ok_or_else(|| SimulationError::contract_violation(format!("unknown dryer {}", id)))
    }

    /// Total number of modules
    pub fn module_count(&self) -> usize {
        self.dryers.iter().map(|dryer| dryer.modules().len()).sum()
    }

    /// Modules taken by a drying cycle in any state
    pub fn modules_in_use(&self) -> usize {
        self.dryers.iter().map(Dryer::modules_in_use).sum()
    }

    /// Tonnes loading or drying inside modules
    pub fn load_in_stage(&self) -> f64 {
        self.dryers
            .iter()
            .flat_map(|dryer| dryer.modules())
            .map(DryerModule::loaded)
            .sum()
    }

    /// Pick a module for the batch: same-type open module first, then any empty one
    pub fn route(&self, batch: &Batch) -> Option<ModuleRef> {
        let candidates = || self.dryers.iter().filter(|dryer| dryer.gmo() == batch.gmo());

        candidates()
            .find_map(|dryer| {
                dryer
                    .affinity_module(batch.hybrid_type(), batch.load())
                    .map(|module| ModuleRef::new(dryer.id(), module))
            })
            .or_else(|| {
                candidates().find_map(|dryer| {
                    dryer.empty_module(batch.load()).map(|module| ModuleRef::new(dryer.id(), module))
                })
            })
    }

    /// Load a batch; on the first load of a cycle returns the closing event
    pub fn load(
        &mut self,
        batch: Batch,
        module: ModuleRef,
        clock: f64,
    ) -> SimulationResult<Option<FollowUp>> {
        let batch_id = batch.id();
        let first = self.dryer_mut(module.dryer)?.load(module.module, batch, clock)?;
        debug!(batch = %batch_id, module = %module, first, "Module loaded");

        Ok(first.then(|| FollowUp::new(clock + self.closure_hours, Event::CloseModule { module })))
    }

    /// Hours needed to bring `humidity` down to the target
    pub fn drying_time(&self, humidity: f64) -> f64 {
        (humidity - self.target_humidity).max(0.0) / self.drying_rate
    }

    /// Close a module and schedule the end of drying
    pub fn close(&mut self, module: ModuleRef, clock: f64) -> SimulationResult<FollowUp> {
        let humidity = self.dryer_mut(module.dryer)?.close(module.module)?;
        let finish = clock + self.drying_time(humidity);
        debug!(module = %module, humidity, finish, "Module closed for drying");
        Ok(FollowUp::new(finish, Event::DryingFinished { module }))
    }

    /// Finish drying and take the contents for shelling
    pub fn open(&mut self, module: ModuleRef, clock: f64) -> SimulationResult<DriedLot> {
        let mixed = self.dryer_mut(module.dryer)?.open(module.module)?;
        Ok(DriedLot { module, mixed, ready_at: clock })
    }

    /// Empty a module after its contents were shelled
    pub fn unload(&mut self, module: ModuleRef) -> SimulationResult<()> {
        self.dryer_mut(module.dryer)?.unload(module.module)
    }

    /// Verify every dryer's hybrid type index
    pub fn check_indices(&self) -> SimulationResult<()> {
        self.dryers.iter().try_for_each(Dryer::check_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BatchId, DryerSpec, ModuleId, ModuleState};

    fn config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.drying.dryers =
            vec![DryerSpec::new(GmoClass::NonGmo, 2, 30.0), DryerSpec::new(GmoClass::Gmo, 1, 30.0)];
        config
    }

    fn batch(id: u64, hybrid: u32, gmo: GmoClass, load: f64) -> Batch {
        Batch::new(BatchId(id), HybridType(hybrid), gmo, 0.325, load, 0.0)
    }

    fn module(dryer: usize, module: usize) -> ModuleRef {
        ModuleRef::new(DryerId(dryer), ModuleId(module))
    }

    #[test]
    fn test_route_prefers_affinity_then_empty() {
        let mut stage = DryingStage::new(&config());

        let first = batch(1, 5, GmoClass::NonGmo, 10.0);
        assert_eq!(stage.route(&first), Some(module(0, 0)));
        stage.load(first, module(0, 0), 0.0).unwrap();

        assert_eq!(stage.route(&batch(2, 5, GmoClass::NonGmo, 10.0)), Some(module(0, 0)));
        assert_eq!(stage.route(&batch(3, 6, GmoClass::NonGmo, 10.0)), Some(module(0, 1)));
        assert_eq!(stage.route(&batch(4, 5, GmoClass::NonGmo, 25.0)), Some(module(0, 1)));
        assert_eq!(stage.route(&batch(5, 5, GmoClass::Gmo, 10.0)), Some(module(1, 0)));
        assert_eq!(stage.route(&batch(6, 5, GmoClass::Gmo, 31.0)), None);
    }

    #[test]
    fn test_first_load_schedules_closure() {
        let mut stage = DryingStage::new(&config());

        let closing = stage.load(batch(1, 5, GmoClass::NonGmo, 10.0), module(0, 0), 2.0).unwrap();
        assert_eq!(
            closing,
            Some(FollowUp::new(9.0, Event::CloseModule { module: module(0, 0) }))
        );
        let again = stage.load(batch(2, 5, GmoClass::NonGmo, 10.0), module(0, 0), 3.0).unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn test_drying_cycle() {
        let mut stage = DryingStage::new(&config());
        stage.load(batch(1, 5, GmoClass::NonGmo, 10.0), module(0, 0), 0.0).unwrap();

        let finished = stage.close(module(0, 0), 7.0).unwrap();
        assert!((finished.time - 15.0).abs() < 1e-9);
        assert_eq!(stage.module(module(0, 0)).unwrap().state(), ModuleState::Drying);
        assert_eq!(stage.route(&batch(2, 5, GmoClass::NonGmo, 10.0)), Some(module(0, 1)));

        let lot = stage.open(module(0, 0), 15.0).unwrap();
        assert_eq!(lot.module, module(0, 0));
        assert_eq!(lot.load(), 10.0);
        assert_eq!(stage.modules_in_use(), 1);

        stage.unload(module(0, 0)).unwrap();
        assert_eq!(stage.modules_in_use(), 0);
        assert!(stage.unload(module(0, 0)).is_err());
        stage.check_indices().unwrap();
    }

    #[test]
    fn test_dry_batches_take_no_drying_time() {
        let stage = DryingStage::new(&config());
        assert_eq!(stage.drying_time(0.10), 0.0);
        assert!((stage.drying_time(0.34) - 8.6).abs() < 1e-9);
    }
}
