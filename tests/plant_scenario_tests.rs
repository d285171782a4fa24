//! Scenario tests for the plant event loop
//!
//! Each scenario scripts the trucks of day 0 and uses fixed durations so the
//! timeline of every stage can be checked exactly.

use grain_plant_simulator::batch::Lot;
use grain_plant_simulator::simulation::{
    ArrivalRecord, Event, FixedDurations, Plant, ScheduledEvent, ScriptedArrivals,
};
use grain_plant_simulator::types::{
    BatchId, GmoClass, HybridType, LossCause, ShellLineId, SimulationConfig, SortingConfig,
    UnloadLineId, UnloadingConfig,
};

const EPS: f64 = 1e-9;

fn truck(hybrid: u32, gmo: GmoClass, delay: f64) -> ArrivalRecord {
    ArrivalRecord::new(HybridType(hybrid), gmo, delay)
}

fn time_of(journal: &[ScheduledEvent], kind: &str) -> Vec<f64> {
    journal
        .iter()
        .filter(|scheduled| scheduled.event().kind() == kind)
        .map(ScheduledEvent::time)
        .collect()
}

fn mentions_batch(event: &Event, id: BatchId) -> bool {
    match event {
        Event::QueueTimeout { batch } => *batch == id,
        Event::UnloadFinished { batch, .. } | Event::SortingFinished { batch, .. } => *batch == id,
        Event::SortingReady { batch } | Event::FillModule { batch } => batch.id() == id,
        _ => false,
    }
}

/// A single 15 t non-GMO batch of type 5 crosses an idle plant with no cleaning
#[test]
fn test_single_batch_timeline() {
    let config = SimulationConfig { days: 1, ..Default::default() };
    let arrivals = ScriptedArrivals::new().with_day(0, vec![truck(5, GmoClass::NonGmo, 0.0)]);
    let mut plant = Plant::new(config, arrivals, FixedDurations::new(0.34, 15.0))
        .unwrap()
        .with_journal();

    plant.simulate().unwrap();
    let journal = plant.journal().unwrap();

    assert_eq!(time_of(journal, "truck_arrival"), vec![0.0]);
    let unload = time_of(journal, "unload_finished");
    assert!((unload[0] - 0.75).abs() < EPS);
    let sorted = time_of(journal, "sorting_finished");
    assert!((sorted[0] - 2.0).abs() < EPS);
    let fill = time_of(journal, "fill_module");
    assert!((fill[0] - 2.0).abs() < EPS);
    let closed = time_of(journal, "close_module");
    assert!((closed[0] - 9.0).abs() < EPS);
    let dried = time_of(journal, "drying_finished");
    assert!((dried[0] - 17.6).abs() < EPS);
    let shelled = time_of(journal, "shelling_finished");
    assert!((shelled[0] - 18.2).abs() < EPS);

    // No cleaning anywhere and the non-GMO shelling line did the work
    for scheduled in journal {
        match scheduled.event() {
            Event::UnloadFinished { cleaning, line, .. } => {
                assert_eq!(*cleaning, 0.0);
                assert_eq!(*line, UnloadLineId(0));
            }
            Event::ShellingFinished { cleaning, line, .. } => {
                assert_eq!(*cleaning, 0.0);
                assert_eq!(*line, ShellLineId(1));
            }
            _ => {}
        }
    }

    let stats = plant.statistics();
    assert_eq!(stats.received.batches, 1);
    assert_eq!(stats.processed.batches, 1);
    assert!((stats.processed.load - 15.0).abs() < EPS);
    assert_eq!(stats.lost_batches(), 0);
    assert!((stats.average_dwell_time() - 18.2).abs() < EPS);
    assert_eq!(stats.average_queue_wait(), 0.0);
    assert_eq!(plant.clock(), 24.0);
    assert_eq!(plant.in_flight_load(), 0.0);
    assert_eq!(plant.drying().modules_in_use(), 0);
}

/// Sorting is full when unloading finishes: the batch is lost and the freed
/// unloading line immediately takes the next truck
#[test]
fn test_sorting_capacity_loss() {
    let config = SimulationConfig {
        days: 1,
        unloading: UnloadingConfig { line_count: 2, ..Default::default() },
        sorting: SortingConfig { automatic_lines: 1, manual_lines: 0, ..Default::default() },
        ..Default::default()
    };
    let arrivals = ScriptedArrivals::new().with_day(
        0,
        vec![
            truck(5, GmoClass::NonGmo, 0.0),
            truck(5, GmoClass::NonGmo, 0.0),
            truck(5, GmoClass::NonGmo, 0.0),
        ],
    );
    let durations = FixedDurations::new(0.34, 0.0).with_load_sequence(vec![10.0, 12.0, 14.0]);
    let mut plant = Plant::new(config, arrivals, durations).unwrap().with_journal();

    plant.simulate().unwrap();
    let journal = plant.journal().unwrap();

    // Batch 3 waited for line 1 and started the moment batch 1 left it
    let third = journal
        .iter()
        .find(|scheduled| {
            matches!(scheduled.event(), Event::UnloadFinished { batch, .. } if *batch == BatchId(3))
        })
        .unwrap();
    assert!((third.time() - 1.2).abs() < EPS);
    assert!(matches!(
        third.event(),
        Event::UnloadFinished { line: UnloadLineId(0), cleaning, .. } if *cleaning == 0.0
    ));

    let stats = plant.statistics();
    let lost = stats.loss(LossCause::SortingCapacity);
    assert_eq!(lost.batches, 2);
    assert!((lost.load - 26.0).abs() < EPS);
    assert!((stats.processed.load - 10.0).abs() < EPS);
    assert!((stats.accounted_load() + plant.in_flight_load() - stats.received.load).abs() < EPS);

    // Lost batches never reach the dryers
    let filled: Vec<BatchId> = journal
        .iter()
        .filter_map(|scheduled| match scheduled.event() {
            Event::FillModule { batch } => Some(batch.id()),
            _ => None,
        })
        .collect();
    assert_eq!(filled, vec![BatchId(1)]);
}

/// A queued batch past its patience is evicted once and never seen downstream
#[test]
fn test_queue_timeout_evicts_once() {
    let config = SimulationConfig {
        days: 1,
        unloading: UnloadingConfig { line_count: 1, patience_hours: 0.5, ..Default::default() },
        ..Default::default()
    };
    let arrivals = ScriptedArrivals::new().with_day(
        0,
        vec![truck(5, GmoClass::NonGmo, 0.0), truck(6, GmoClass::NonGmo, 0.0)],
    );
    let mut plant = Plant::new(config, arrivals, FixedDurations::new(0.34, 20.0))
        .unwrap()
        .with_journal();

    plant.simulate().unwrap();
    let journal = plant.journal().unwrap();

    let stats = plant.statistics();
    let lost = stats.loss(LossCause::QueueTimeout);
    assert_eq!(lost.batches, 1);
    assert!((lost.load - 20.0).abs() < EPS);
    assert_eq!(stats.processed.batches, 1);
    assert_eq!(stats.lost_batches(), 1);

    // Only the arrival-time timeout mentions batch 2
    let mentions: Vec<&str> = journal
        .iter()
        .filter(|scheduled| mentions_batch(scheduled.event(), BatchId(2)))
        .map(|scheduled| scheduled.event().kind())
        .collect();
    assert_eq!(mentions, vec!["queue_timeout"]);
    assert_eq!(plant.unloading().queue_len(), 0);
}

/// GMO material is dried and shelled only on GMO resources
#[test]
fn test_gmo_segregation() {
    let config = SimulationConfig { days: 1, ..Default::default() };
    let arrivals = ScriptedArrivals::new().with_day(
        0,
        vec![truck(7, GmoClass::Gmo, 0.0), truck(8, GmoClass::NonGmo, 0.0)],
    );
    let mut plant = Plant::new(config, arrivals, FixedDurations::default()).unwrap().with_journal();

    plant.run(10.0).unwrap();
    for dryer in plant.drying().dryers() {
        for module in dryer.modules() {
            if let Some(contents) = module.contents() {
                assert_eq!(contents.batches()[0].id().0 == 1, dryer.gmo() == GmoClass::Gmo);
            }
        }
    }

    plant.run(24.0).unwrap();
    let journal = plant.journal().unwrap();
    let gmo_line_jobs = journal
        .iter()
        .filter(|scheduled| {
            matches!(scheduled.event(), Event::ShellingFinished { line: ShellLineId(0), .. })
        })
        .count();
    assert_eq!(gmo_line_jobs, 1);
    assert_eq!(plant.statistics().processed.batches, 2);
}

/// Same-type batches share a module; a different type opens a new one
#[test]
fn test_module_affinity_and_type_purity() {
    let config = SimulationConfig { days: 1, ..Default::default() };
    let arrivals = ScriptedArrivals::new().with_day(
        0,
        vec![
            truck(5, GmoClass::NonGmo, 0.0),
            truck(5, GmoClass::NonGmo, 0.1),
            truck(9, GmoClass::NonGmo, 0.1),
        ],
    );
    let mut plant = Plant::new(config, arrivals, FixedDurations::default()).unwrap();

    plant.run(6.0).unwrap();
    let held: Vec<(HybridType, usize)> = plant
        .drying()
        .dryers()
        .iter()
        .flat_map(|dryer| dryer.modules())
        .filter_map(|module| module.contents())
        .map(|mixed| {
            assert!(mixed.batches().iter().all(|batch| batch.hybrid_type() == mixed.hybrid_type()));
            (mixed.hybrid_type(), mixed.len())
        })
        .collect();
    assert_eq!(held, vec![(HybridType(5), 2), (HybridType(9), 1)]);
    plant.drying().check_indices().unwrap();
}

fn single_sorter_plant(gated: bool) -> Plant {
    let config = SimulationConfig {
        days: 1,
        unloading: UnloadingConfig { line_count: 1, requires_free_sorter: gated, ..Default::default() },
        sorting: SortingConfig { automatic_lines: 1, manual_lines: 0, ..Default::default() },
        ..Default::default()
    };
    let arrivals = ScriptedArrivals::new().with_day(0, vec![truck(5, GmoClass::NonGmo, 0.0); 4]);
    let mut plant = Plant::new(config, arrivals, FixedDurations::new(0.34, 20.0))
        .unwrap()
        .with_journal();
    plant.simulate().unwrap();
    plant
}

fn unload_and_sort_order(journal: &[ScheduledEvent]) -> Vec<&'static str> {
    journal
        .iter()
        .map(|scheduled| scheduled.event().kind())
        .filter(|kind| *kind == "unload_finished" || *kind == "sorting_finished")
        .collect()
}

/// With gating on, a truck only leaves the queue once the single sorter can
/// take it, so nothing is lost at sorting
#[test]
fn test_gated_unloading_waits_for_sorter() {
    let plant = single_sorter_plant(true);
    let journal = plant.journal().unwrap();

    // Every unload after the first is released by a sorter finishing
    let order = unload_and_sort_order(journal);
    assert_eq!(
        order,
        vec![
            "unload_finished",
            "sorting_finished",
            "unload_finished",
            "sorting_finished",
            "unload_finished",
            "sorting_finished",
            "unload_finished",
            "sorting_finished",
        ]
    );

    let unloaded = time_of(journal, "unload_finished");
    let sorted = time_of(journal, "sorting_finished");
    for (unload, sort) in unloaded.iter().skip(1).zip(&sorted) {
        assert!((unload - (sort + 1.0)).abs() < EPS);
    }

    let stats = plant.statistics();
    assert_eq!(stats.loss(LossCause::SortingCapacity).batches, 0);
    assert_eq!(stats.lost_batches(), 0);
    assert_eq!(stats.received.batches, 4);
}

/// The same trucks without gating overrun the sorter
#[test]
fn test_ungated_unloading_loses_at_sorting() {
    let gated = single_sorter_plant(true);
    let ungated = single_sorter_plant(false);

    let order = unload_and_sort_order(ungated.journal().unwrap());
    assert_eq!(&order[..2], &["unload_finished", "unload_finished"]);

    let lost = ungated.statistics().loss(LossCause::SortingCapacity);
    assert_eq!(lost.batches, 2);
    assert!((lost.load - 40.0).abs() < EPS);
    assert_ne!(lost.batches, gated.statistics().loss(LossCause::SortingCapacity).batches);
}
