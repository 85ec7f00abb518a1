//! SM-2 spaced repetition scheduler, grounded on
//! `srs_scheduler.cpp`'s `SRSScheduler`.

use std::collections::HashMap;

use crate::genome::ParameterGenome;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    Fail,
    Hard,
    Good,
    Easy,
}

#[derive(Debug, Clone)]
pub struct SrsItem {
    pub edge_id: u64,
    pub ease: f32,
    pub interval_days: f32,
    pub streak: u32,
    pub lapses: u32,
    pub total_reviews: u32,
    pub due_time_ns: u64,
    pub last_review_ns: u64,
    pub last_grade: Option<Grade>,
}

impl SrsItem {
    fn new(edge_id: u64, now_ns: u64, genome: &ParameterGenome) -> Self {
        let min_interval = genome.get("srs.min_interval_days");
        Self {
            edge_id,
            ease: genome.get("srs.ease_start"),
            interval_days: min_interval,
            streak: 0,
            lapses: 0,
            total_reviews: 0,
            due_time_ns: now_ns + (min_interval as f64 * SECONDS_PER_DAY * 1e9) as u64,
            last_review_ns: 0,
            last_grade: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SrsStats {
    pub items_total: u32,
    pub items_due: u32,
    pub avg_ease: f32,
    pub avg_interval: f32,
    pub pass_rate: f64,
}

/// Per-edge review state; keyed by the owning graph edge id,
/// kept outside `GraphStore` for the same ownership reasons as
/// [`crate::emergent::EdgeStateMap`].
#[derive(Debug, Clone, Default)]
pub struct SrsScheduler {
    items: HashMap<u64, SrsItem>,
}

impl SrsScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, edge_id: u64, now_ns: u64, genome: &ParameterGenome) {
        self.items
            .entry(edge_id)
            .or_insert_with(|| SrsItem::new(edge_id, now_ns, genome));
    }

    pub fn item(&self, edge_id: u64) -> Option<&SrsItem> {
        self.items.get(&edge_id)
    }

    /// Apply the SM-2 update rule for `grade`.
    pub fn review(&mut self, edge_id: u64, grade: Grade, now_ns: u64, genome: &ParameterGenome) {
        if !self.items.contains_key(&edge_id) {
            self.add_item(edge_id, now_ns, genome);
        }
        let ease_floor = genome.get("srs.ease_floor");
        let min_interval = genome.get("srs.min_interval_days");
        let max_interval = genome.get("srs.max_interval_days");
        let lapse_factor = genome.get("srs.lapse_factor");
        let easy_bonus = genome.get("srs.easy_interval_bonus");
        let step_hard = genome.get("srs.ease_step_hard");
        let step_good = genome.get("srs.ease_step_good");
        let step_easy = genome.get("srs.ease_step_easy");

        let item = self.items.get_mut(&edge_id).expect("just inserted");
        item.total_reviews += 1;
        item.last_review_ns = now_ns;
        item.last_grade = Some(grade);

        match grade {
            Grade::Fail => {
                item.ease = (item.ease - 0.8).max(ease_floor);
                item.interval_days = (item.interval_days * lapse_factor).max(min_interval);
                item.streak = 0;
                item.lapses += 1;
            }
            Grade::Hard | Grade::Good | Grade::Easy => {
                let delta = match grade {
                    Grade::Hard => step_hard,
                    Grade::Good => step_good,
                    Grade::Easy => step_easy,
                    Grade::Fail => unreachable!(),
                };
                item.ease = (item.ease + delta).max(ease_floor);
                if item.streak == 0 {
                    item.interval_days = min_interval;
                } else {
                    item.interval_days = (item.interval_days * item.ease).min(max_interval);
                    if grade == Grade::Easy {
                        item.interval_days = (item.interval_days * easy_bonus).min(max_interval);
                    }
                }
                item.streak += 1;
            }
        }

        item.due_time_ns = now_ns + (item.interval_days as f64 * SECONDS_PER_DAY * 1e9) as u64;
    }

    fn urgency(&self, item: &SrsItem, now_ns: u64) -> f64 {
        if item.due_time_ns > now_ns {
            return f64::NEG_INFINITY;
        }
        let overdue_days = (now_ns - item.due_time_ns) as f64 / (SECONDS_PER_DAY * 1e9);
        overdue_days / (item.interval_days as f64).max(0.1) + 0.1 * item.lapses as f64
    }

    /// Items due at `now_ns`, most urgent first, at most `limit` entries
    /// and never more than `srs.daily_limit`.
    pub fn due_items(&self, now_ns: u64, limit: usize, genome: &ParameterGenome) -> Vec<u64> {
        let capped_limit = limit.min(genome.get("srs.daily_limit") as usize);
        let mut due: Vec<(u64, f64)> = self
            .items
            .values()
            .filter(|it| it.due_time_ns <= now_ns)
            .map(|it| (it.edge_id, self.urgency(it, now_ns)))
            .collect();
        due.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        due.truncate(capped_limit.max(1).min(due.len().max(1)));
        due.into_iter().map(|(id, _)| id).collect()
    }

    pub fn stats(&self, now_ns: u64) -> SrsStats {
        let mut stats = SrsStats {
            items_total: self.items.len() as u32,
            ..Default::default()
        };
        if self.items.is_empty() {
            return stats;
        }
        let mut total_ease = 0.0f32;
        let mut total_interval = 0.0f32;
        let mut graded = 0u32;
        let mut passed = 0u32;
        for item in self.items.values() {
            if item.due_time_ns <= now_ns {
                stats.items_due += 1;
            }
            total_ease += item.ease;
            total_interval += item.interval_days;
            if let Some(grade) = item.last_grade {
                graded += 1;
                if grade != Grade::Fail {
                    passed += 1;
                }
            }
        }
        stats.avg_ease = total_ease / stats.items_total as f32;
        stats.avg_interval = total_interval / stats.items_total as f32;
        stats.pass_rate = if graded > 0 {
            passed as f64 / graded as f64
        } else {
            0.0
        };
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_resets_streak_and_shrinks_interval() {
        let genome = ParameterGenome::default_genome();
        let mut sched = SrsScheduler::new();
        sched.review(1, Grade::Good, 0, &genome);
        sched.review(1, Grade::Good, 0, &genome);
        let before = sched.item(1).unwrap().interval_days;
        sched.review(1, Grade::Fail, 0, &genome);
        let item = sched.item(1).unwrap();
        assert_eq!(item.streak, 0);
        assert_eq!(item.lapses, 1);
        assert!(item.interval_days <= before);
    }

    #[test]
    fn easy_grows_interval_faster_than_good() {
        let genome = ParameterGenome::default_genome();
        let mut good = SrsScheduler::new();
        good.review(1, Grade::Good, 0, &genome);
        good.review(1, Grade::Good, 0, &genome);

        let mut easy = SrsScheduler::new();
        easy.review(1, Grade::Easy, 0, &genome);
        easy.review(1, Grade::Easy, 0, &genome);

        assert!(easy.item(1).unwrap().interval_days >= good.item(1).unwrap().interval_days);
    }

    #[test]
    fn due_items_excludes_future_reviews() {
        let genome = ParameterGenome::default_genome();
        let mut sched = SrsScheduler::new();
        sched.add_item(1, 0, &genome);
        assert!(sched.due_items(0, 10, &genome).is_empty());
        let far_future = sched.item(1).unwrap().due_time_ns + 1;
        assert_eq!(sched.due_items(far_future, 10, &genome), vec![1]);
    }

    #[test]
    fn due_items_never_exceeds_the_daily_limit() {
        let mut genome = ParameterGenome::default_genome();
        genome.set("srs.daily_limit", 2.0);
        let mut sched = SrsScheduler::new();
        for edge_id in 1..=5u64 {
            sched.add_item(edge_id, 0, &genome);
        }
        let far_future = 10 * 86_400 * 1_000_000_000u64;
        assert_eq!(sched.due_items(far_future, 10, &genome).len(), 2);
    }
}
