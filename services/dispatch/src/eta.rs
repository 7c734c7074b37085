//! Delivery time estimates.

use std::sync::Arc;

use crate::geo::{DistanceModel, GreatCircle};
use crate::model::{Drone, Job};

/// Estimate used when either end of the job is missing or malformed.
pub const DEFAULT_ETA_MINUTES: u32 = 30;

/// Fixed handling time added to every flight estimate.
pub const ETA_BUFFER_MINUTES: u32 = 10;

/// Estimates minutes from assignment to delivery.
///
/// The flight covers two legs, drone to pickup and pickup to delivery, at
/// the drone's cruise speed. Flight time is rounded up to whole minutes
/// before the buffer is added.
#[derive(Clone)]
pub struct EtaEstimator {
    distance: Arc<dyn DistanceModel>,
}

impl Default for EtaEstimator {
    fn default() -> Self {
        Self::new(Arc::new(GreatCircle))
    }
}

impl std::fmt::Debug for EtaEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtaEstimator").finish_non_exhaustive()
    }
}

impl EtaEstimator {
    pub fn new(distance: Arc<dyn DistanceModel>) -> Self {
        Self { distance }
    }

    pub fn estimate(&self, drone: &Drone, job: &Job) -> u32 {
        let (Some(pickup), Some(delivery)) = (job.valid_pickup(), job.valid_delivery()) else {
            return DEFAULT_ETA_MINUTES;
        };

        let leg_km = self.distance.distance_km(drone.location, pickup)
            + self.distance.distance_km(pickup, delivery);
        let flight_minutes = (leg_km / drone.capabilities.cruise_speed_kmh * 60.0).ceil();

        // Registration guarantees a positive speed, so this is finite. Very
        // slow drones on long legs saturate at u32::MAX.
        let flight_minutes = flight_minutes.min(f64::from(u32::MAX - ETA_BUFFER_MINUTES));
        flight_minutes as u32 + ETA_BUFFER_MINUTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeatherCondition;
    use crate::seed::default_fleet;
    use hive_events::GeoPoint;
    use hive_id::JobId;
    use rstest::rstest;

    /// Legs measured from the pickup are the delivery leg; anything else is
    /// the drone leg.
    struct Legs {
        to_pickup: f64,
        to_delivery: f64,
    }

    impl DistanceModel for Legs {
        fn distance_km(&self, from: GeoPoint, _to: GeoPoint) -> f64 {
            if from == PICKUP {
                self.to_delivery
            } else {
                self.to_pickup
            }
        }
    }

    const PICKUP: GeoPoint = GeoPoint::new(28.6139, 77.2090);
    const DELIVERY: GeoPoint = GeoPoint::new(28.4089, 77.3178);

    fn job(pickup: Option<GeoPoint>, delivery: Option<GeoPoint>) -> Job {
        Job {
            id: JobId::parse("job-eta").unwrap(),
            pickup,
            delivery,
            weight_kg: 1.0,
            weather_condition: WeatherCondition::Clear,
            payment_amount: None,
        }
    }

    #[rstest]
    #[case(None, Some(DELIVERY))]
    #[case(Some(PICKUP), None)]
    #[case(None, None)]
    #[case(Some(GeoPoint::new(95.0, 0.0)), Some(DELIVERY))]
    fn test_missing_leg_uses_default(
        #[case] pickup: Option<GeoPoint>,
        #[case] delivery: Option<GeoPoint>,
    ) {
        let drone = &default_fleet()[0];
        assert_eq!(EtaEstimator::default().estimate(drone, &job(pickup, delivery)), 30);
    }

    #[rstest]
    // 22.5 km at 45 km/h is exactly 30 minutes.
    #[case(7.5, 15.0, 45.0, 40)]
    // 10 km at 45 km/h is 13.33 minutes, rounded up to 14.
    #[case(4.0, 6.0, 45.0, 24)]
    // Drone already at the pickup and delivery at the pickup.
    #[case(0.0, 0.0, 50.0, 10)]
    // Twelve billion minutes does not fit; the estimate saturates.
    #[case(10_000.0, 10_000.0, 0.0001, u32::MAX)]
    fn test_two_leg_estimate(
        #[case] to_pickup: f64,
        #[case] to_delivery: f64,
        #[case] speed: f64,
        #[case] expected: u32,
    ) {
        let mut drone = default_fleet().remove(0);
        drone.capabilities.cruise_speed_kmh = speed;
        let estimator = EtaEstimator::new(Arc::new(Legs {
            to_pickup,
            to_delivery,
        }));

        assert_eq!(
            estimator.estimate(&drone, &job(Some(PICKUP), Some(DELIVERY))),
            expected
        );
    }

    #[test]
    fn test_great_circle_estimate_is_at_least_buffer() {
        let drone = &default_fleet()[1];
        let eta = EtaEstimator::default().estimate(drone, &job(Some(PICKUP), Some(DELIVERY)));
        assert!(eta > ETA_BUFFER_MINUTES);
    }
}
