use super::types::{RankedSchedule, Schedule};

/// Weight of each distinct person relative to the load-variance penalty
pub const UNIQUE_PERSON_WEIGHT: f64 = 1000.0;

/// Population variance of a set of counts (0 for an empty set)
pub fn variance(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n
}

/// Scores a schedule: distinct people × 1000 − variance of per-person load
///
/// More people on the roster always outweighs evenness; among schedules
/// using the same number of people, the more even one wins.
pub fn score_schedule(schedule: &Schedule) -> f64 {
    let counts: Vec<u32> = schedule.counts().into_values().collect();
    counts.len() as f64 * UNIQUE_PERSON_WEIGHT - variance(&counts)
}

/// Scores and orders schedules best first; ties keep discovery order
pub fn rank_schedules(schedules: Vec<Schedule>) -> Vec<RankedSchedule> {
    let mut ranked: Vec<RankedSchedule> = schedules
        .into_iter()
        .map(|schedule| RankedSchedule {
            score: score_schedule(&schedule),
            schedule,
        })
        .collect();

    // sort_by is stable, so equal scores stay in the order they were found
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn schedule(people: &[&str]) -> Schedule {
        let mut s = Schedule::default();
        for (i, p) in people.iter().enumerate() {
            s.assignments.insert(at(10 + i as u32), p.to_string());
        }
        s
    }

    #[test]
    fn test_variance_matches_population_formula() {
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(variance(&[2, 2, 2]), 0.0);
        assert!((variance(&[1, 3]) - 1.0).abs() < 1e-12);
        assert!((variance(&[2, 1, 1]) - 2.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_prefers_more_people() {
        let spread = schedule(&["A", "B", "C"]);
        let lumped = schedule(&["A", "A", "B"]);
        assert_eq!(score_schedule(&spread), 3000.0);
        assert!((score_schedule(&lumped) - (2000.0 - 0.25)).abs() < 1e-12);
        assert!(score_schedule(&spread) > score_schedule(&lumped));
    }

    #[test]
    fn test_empty_schedule_scores_zero() {
        assert_eq!(score_schedule(&Schedule::default()), 0.0);
    }

    #[test]
    fn test_rank_descending_and_stable() {
        let ranked = rank_schedules(vec![
            schedule(&["A"]),
            schedule(&["A", "B"]),
            schedule(&["B"]),
            schedule(&["C", "A"]),
        ]);

        let scores: Vec<f64> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![2000.0, 2000.0, 1000.0, 1000.0]);

        // Ties keep discovery order
        assert_eq!(ranked[0].schedule.person_at(&at(11)), Some("B"));
        assert_eq!(ranked[1].schedule.person_at(&at(10)), Some("C"));
        assert_eq!(ranked[2].schedule.person_at(&at(10)), Some("A"));
        assert_eq!(ranked[3].schedule.person_at(&at(10)), Some("B"));
    }
}
