//! Feature derivation
//!
//! Reduces the raw session accumulators to the aggregate metrics carried by
//! a [`crate::types::BiometricSummary`]. Everything here is deliberately
//! simple arithmetic over pairwise deltas: feature extraction runs on the
//! interaction thread on every summary request, so classification complexity
//! belongs to the verdict service, not here.

use crate::types::{KeyboardMetrics, KeystrokeRecord, MouseMetrics, MovementStep, PointerSample};

/// Derive mouse aggregates from the pointer path
///
/// For each consecutive sample pair:
/// `velocity = sqrt(dx² + dy²) / dt` with `dt` in seconds, defined as 0 when
/// `dt` is 0. Average velocity is the mean over all steps; total distance is
/// the sum of the pairwise Euclidean distances. Empty input degrades to the
/// all-zero metrics.
pub fn derive_mouse_metrics(samples: &[PointerSample]) -> MouseMetrics {
    let movement_pattern = movement_pattern(samples);

    let total_distance: f64 = movement_pattern
        .iter()
        .map(|step| (step.dx * step.dx + step.dy * step.dy).sqrt())
        .sum();

    let avg_velocity = if movement_pattern.is_empty() {
        0.0
    } else {
        movement_pattern.iter().map(|step| step.velocity).sum::<f64>()
            / movement_pattern.len() as f64
    };

    MouseMetrics {
        movement_count: samples.len() as u32,
        avg_velocity,
        total_distance,
        movement_pattern,
    }
}

/// Derive keyboard aggregates from the keystroke log
///
/// Average dwell is the mean of the recorded dwell times (0 when empty).
/// Average flight is the mean of the stored flight times over records after
/// the first (0 when fewer than two records): flight time is fixed once at
/// capture, from consecutive key-up timestamps, and the aggregate reuses
/// those stored values rather than rederiving them.
pub fn derive_keyboard_metrics(records: &[KeystrokeRecord]) -> KeyboardMetrics {
    let avg_dwell_time = if records.is_empty() {
        0.0
    } else {
        records.iter().map(|r| r.dwell_ms).sum::<f64>() / records.len() as f64
    };

    let avg_flight_time = if records.len() < 2 {
        0.0
    } else {
        records.iter().skip(1).map(|r| r.flight_ms).sum::<f64>() / (records.len() - 1) as f64
    };

    KeyboardMetrics {
        keystroke_count: records.len() as u32,
        avg_dwell_time,
        avg_flight_time,
        keys_pressed: records.iter().map(|r| r.key.clone()).collect(),
    }
}

/// Per-step deltas and velocities between consecutive pointer samples
fn movement_pattern(samples: &[PointerSample]) -> Vec<MovementStep> {
    samples
        .windows(2)
        .map(|pair| {
            let dx = pair[1].x - pair[0].x;
            let dy = pair[1].y - pair[0].y;
            let dt = (pair[1].elapsed_ms - pair[0].elapsed_ms) / 1000.0;
            let velocity = if dt > 0.0 {
                (dx * dx + dy * dy).sqrt() / dt
            } else {
                0.0
            };
            MovementStep { dx, dy, dt, velocity }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn sample(x: f64, y: f64, elapsed_ms: f64) -> PointerSample {
        PointerSample {
            x,
            y,
            page_x: x,
            page_y: y,
            elapsed_ms,
        }
    }

    fn record(key: &str, dwell_ms: f64, flight_ms: f64, captured_offset_ms: i64) -> KeystrokeRecord {
        KeystrokeRecord {
            key: key.to_string(),
            dwell_ms,
            flight_ms,
            captured_at: Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()
                + Duration::milliseconds(captured_offset_ms),
        }
    }

    #[test]
    fn test_three_four_five_step() {
        // Moves at (0,0)@t0 and (3,4)@t0+1000ms: one step with velocity 5.
        let metrics = derive_mouse_metrics(&[sample(0.0, 0.0, 0.0), sample(3.0, 4.0, 1000.0)]);

        assert_eq!(metrics.movement_count, 2);
        assert_eq!(metrics.movement_pattern.len(), 1);

        let step = metrics.movement_pattern[0];
        assert_eq!(step.dx, 3.0);
        assert_eq!(step.dy, 4.0);
        assert_eq!(step.dt, 1.0);
        assert_eq!(step.velocity, 5.0);

        assert_eq!(metrics.avg_velocity, 5.0);
        assert_eq!(metrics.total_distance, 5.0);
    }

    #[test]
    fn test_zero_dt_velocity_is_zero() {
        // Two samples with identical elapsed time: distance counts, velocity
        // does not explode.
        let metrics = derive_mouse_metrics(&[sample(0.0, 0.0, 100.0), sample(6.0, 8.0, 100.0)]);

        let step = metrics.movement_pattern[0];
        assert_eq!(step.dt, 0.0);
        assert_eq!(step.velocity, 0.0);
        assert!(step.velocity.is_finite());
        assert_eq!(metrics.total_distance, 10.0);
        assert_eq!(metrics.avg_velocity, 0.0);
    }

    #[test]
    fn test_zero_dt_step_included_in_mean() {
        let metrics = derive_mouse_metrics(&[
            sample(0.0, 0.0, 0.0),
            sample(3.0, 4.0, 1000.0),
            sample(6.0, 8.0, 1000.0),
        ]);

        // Steps: velocity 5 then velocity 0 (dt = 0); mean over both.
        assert_eq!(metrics.movement_pattern.len(), 2);
        assert_eq!(metrics.avg_velocity, 2.5);
        assert_eq!(metrics.total_distance, 10.0);
    }

    #[test]
    fn test_empty_and_single_sample_degrade_to_zero() {
        let empty = derive_mouse_metrics(&[]);
        assert_eq!(empty.movement_count, 0);
        assert_eq!(empty.avg_velocity, 0.0);
        assert_eq!(empty.total_distance, 0.0);
        assert!(empty.movement_pattern.is_empty());

        let single = derive_mouse_metrics(&[sample(10.0, 10.0, 50.0)]);
        assert_eq!(single.movement_count, 1);
        assert!(single.movement_pattern.is_empty());
        assert_eq!(single.avg_velocity, 0.0);
    }

    #[test]
    fn test_single_keystroke_dwell() {
        let metrics = derive_keyboard_metrics(&[record("a", 120.0, 0.0, 120)]);

        assert_eq!(metrics.keystroke_count, 1);
        assert_eq!(metrics.avg_dwell_time, 120.0);
        // One record: no inter-record gap exists yet.
        assert_eq!(metrics.avg_flight_time, 0.0);
        assert_eq!(metrics.keys_pressed, vec!["a".to_string()]);
    }

    #[test]
    fn test_flight_mean_skips_first_record() {
        let metrics = derive_keyboard_metrics(&[
            record("a", 100.0, 0.0, 100),
            record("b", 80.0, 230.0, 330),
            record("c", 90.0, 170.0, 500),
        ]);

        assert_eq!(metrics.keystroke_count, 3);
        assert!((metrics.avg_dwell_time - 90.0).abs() < 1e-9);
        // Mean of the stored flights of records 2 and 3: (230 + 170) / 2.
        assert_eq!(metrics.avg_flight_time, 200.0);
        assert_eq!(
            metrics.keys_pressed,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_empty_keyboard_degrades_to_zero() {
        let metrics = derive_keyboard_metrics(&[]);
        assert_eq!(metrics.keystroke_count, 0);
        assert_eq!(metrics.avg_dwell_time, 0.0);
        assert_eq!(metrics.avg_flight_time, 0.0);
        assert!(metrics.keys_pressed.is_empty());
    }
}
