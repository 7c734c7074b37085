//! Concurrent allocation tests.
//!
//! Every thread waits on a barrier before calling `allocate`, so the calls
//! race for the same top-ranked drones.

use std::collections::HashSet;
use std::sync::Barrier;
use std::thread;

use hive_dispatch::{
    default_fleet, AllocationError, Assignment, Dispatcher, Drone, EngineConfig, FleetRegistry,
    Job, LedgerError, WeatherCondition,
};
use hive_events::{DroneStatus, GeoPoint};
use hive_id::{DroneId, JobId};

const PICKUP: GeoPoint = GeoPoint::new(28.7041, 77.1025);

/// `n` drones strung out north of the pickup, nearest first.
fn fleet(n: usize) -> Vec<Drone> {
    let template = default_fleet().remove(0);
    (0..n)
        .map(|i| Drone {
            id: DroneId::parse(&format!("DRONE_{i:03}")).unwrap(),
            location: GeoPoint::new(PICKUP.lat + 0.002 * i as f64, PICKUP.lng),
            ..template.clone()
        })
        .collect()
}

fn job(id: &str) -> Job {
    Job {
        id: JobId::parse(id).unwrap(),
        pickup: Some(PICKUP),
        delivery: None,
        weight_kg: 1.0,
        weather_condition: WeatherCondition::Clear,
        payment_amount: None,
    }
}

fn race(dispatcher: &Dispatcher, jobs: Vec<Job>) -> Vec<Result<Assignment, AllocationError>> {
    let barrier = Barrier::new(jobs.len());
    thread::scope(|s| {
        let handles: Vec<_> = jobs
            .iter()
            .map(|job| {
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    dispatcher.allocate(job)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

#[test]
fn test_n_requests_n_drones_all_distinct() {
    const N: usize = 12;
    let dispatcher = Dispatcher::new(FleetRegistry::new(fleet(N)).unwrap(), EngineConfig::default());

    let results = race(&dispatcher, (0..N).map(|i| job(&format!("job-{i}"))).collect());

    let drones: HashSet<String> = results
        .into_iter()
        .map(|r| r.unwrap().drone_id.to_string())
        .collect();
    assert_eq!(drones.len(), N);
    assert!(dispatcher.fleet_snapshot().iter().all(|d| d.status == DroneStatus::Assigned));
}

#[test]
fn test_one_request_too_many_fails_exactly_once() {
    const N: usize = 10;
    let dispatcher = Dispatcher::new(
        FleetRegistry::new(fleet(N - 1)).unwrap(),
        EngineConfig::default(),
    );

    let results = race(&dispatcher, (0..N).map(|i| job(&format!("job-{i}"))).collect());

    let (ok, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    assert_eq!(ok.len(), N - 1);
    assert_eq!(failed.len(), 1);
    assert!(matches!(
        failed[0],
        Err(AllocationError::NoDronesAvailable | AllocationError::AllocationRaceExhausted { .. })
    ));

    let drones: HashSet<String> = ok
        .into_iter()
        .map(|r| r.unwrap().drone_id.to_string())
        .collect();
    assert_eq!(drones.len(), N - 1);
}

#[test]
fn test_same_job_submitted_concurrently_binds_one_drone() {
    const N: usize = 8;
    let dispatcher = Dispatcher::new(FleetRegistry::new(fleet(N)).unwrap(), EngineConfig::default());

    let results = race(&dispatcher, (0..N).map(|_| job("job-dup")).collect());

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            result,
            Err(AllocationError::Ledger(LedgerError::DuplicateJob(_)))
        ));
    }

    // Losers released whatever drone they had claimed.
    let assigned = dispatcher
        .fleet_snapshot()
        .into_iter()
        .filter(|d| d.status == DroneStatus::Assigned)
        .count();
    assert_eq!(assigned, 1);
}

#[test]
fn test_every_allocation_is_announced() {
    const N: usize = 6;
    let dispatcher = Dispatcher::new(FleetRegistry::new(fleet(N)).unwrap(), EngineConfig::default());
    let mut events = dispatcher.subscribe();

    race(&dispatcher, (0..N).map(|i| job(&format!("job-{i}"))).collect());

    let created = std::iter::from_fn(|| events.try_recv())
        .filter(|e| e.event_type == "assignment.created")
        .count();
    assert_eq!(created, N);
}
