/*
Ordering rules for tasks and day buckets.
Kept apart from the store so they can be tested on plain slices.
*/

use std::cmp::Ordering;

use crate::error::Error;
use crate::models::{Task, TaskExecution};

// Incomplete task order:
// 1) tasks without a start before tasks with one
// 2) earlier start first
// 3) tie -> name ascending
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    match (a.start, b.start) {
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.name.cmp(&b.name)),
        (None, None) => a.name.cmp(&b.name),
    }
}

// Index at which `new_task` goes: after every task that does not sort after it.
pub fn task_index(tasks: &[Task], new_task: &Task) -> usize {
    tasks.partition_point(|t| compare_tasks(t, new_task) != Ordering::Greater)
}

// Single forward scan over the bucket.
//
// Stops at the first execution whose finished status differs from the new one,
// or the first one with the same status and a larger day_order. Equal orders
// insert after the existing entry. An unfinished execution therefore never
// lands after a finished one; a finished one stops before the first unfinished
// one it meets.
pub fn execution_index(executions: &[TaskExecution], new_execution: &TaskExecution) -> usize {
    executions
        .iter()
        .position(|e| e.finished != new_execution.finished || e.day_order > new_execution.day_order)
        .unwrap_or(executions.len())
}

pub fn insert_execution(executions: &mut Vec<TaskExecution>, execution: TaskExecution) {
    let index = execution_index(executions, &execution);
    executions.insert(index, execution);
}

/// Direction in which to look for an exchange partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Next lower `day_order` (-1).
    Earlier,
    /// Next higher `day_order` (+1).
    Later,
}

impl Direction {
    fn sign(self) -> i64 {
        match self {
            Direction::Earlier => -1,
            Direction::Later => 1,
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Error> {
        match value {
            -1 => Ok(Direction::Earlier),
            1 => Ok(Direction::Later),
            other => Err(Error::InvalidDirection(other)),
        }
    }
}

// Nearest execution in `direction` among those sharing the finished status.
pub fn exchange_candidate<'a>(
    executions: &'a [TaskExecution],
    execution: &TaskExecution,
    direction: Direction,
) -> Option<&'a TaskExecution> {
    let sign = direction.sign();
    executions
        .iter()
        .filter(|other| other.id != execution.id && other.finished == execution.finished)
        .filter(|other| sign * other.day_order > sign * execution.day_order)
        .min_by_key(|other| sign * other.day_order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{day, execution, task};
    use proptest::prelude::*;
    use rstest::rstest;

    fn orders(executions: &[TaskExecution]) -> Vec<(i64, bool)> {
        executions.iter().map(|e| (e.day_order, e.finished)).collect()
    }

    // u1 u3 u5 | f2 f4
    fn bucket() -> Vec<TaskExecution> {
        [(1, 1, false), (2, 3, false), (3, 5, false), (4, 2, true), (5, 4, true)]
            .into_iter()
            .map(|(id, order, finished)| execution(id, "2024-03-09", order, finished))
            .collect()
    }

    #[test]
    fn tasks_without_start_come_first() {
        let mut dated = task(1, "a", "2", "0");
        dated.start = Some(day("2024-01-01"));
        let undated = task(2, "z", "2", "0");
        assert_eq!(compare_tasks(&undated, &dated), Ordering::Less);
        assert_eq!(compare_tasks(&dated, &undated), Ordering::Greater);
    }

    #[test]
    fn equal_starts_fall_back_to_name() {
        let mut a = task(1, "alpha", "2", "0");
        let mut b = task(2, "beta", "2", "0");
        a.start = Some(day("2024-01-01"));
        b.start = Some(day("2024-01-01"));
        assert_eq!(compare_tasks(&a, &b), Ordering::Less);
        b.start = Some(day("2023-12-31"));
        assert_eq!(compare_tasks(&a, &b), Ordering::Greater);
    }

    #[test]
    fn unfinished_insert_lands_inside_unfinished_run() {
        let mut list = bucket();
        insert_execution(&mut list, execution(9, "2024-03-09", 2, false));
        assert_eq!(
            orders(&list),
            vec![(1, false), (2, false), (3, false), (5, false), (2, true), (4, true)]
        );
    }

    #[test]
    fn unfinished_insert_with_largest_order_stays_before_finished() {
        let mut list = bucket();
        insert_execution(&mut list, execution(9, "2024-03-09", 10, false));
        assert_eq!(list[3].id, 9);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(9)]
    fn finished_insert_stops_at_first_unfinished(#[case] order: i64) {
        let list = bucket();
        let new = execution(9, "2024-03-09", order, true);
        assert_eq!(execution_index(&list, &new), 0);
    }

    #[rstest]
    #[case(1, 0)]
    #[case(3, 1)]
    #[case(4, 2)]
    #[case(9, 2)]
    fn finished_insert_walks_finished_run(#[case] order: i64, #[case] expected_index: usize) {
        // f2 f4 | u1
        let list: Vec<TaskExecution> = [(1, 2, true), (2, 4, true), (3, 1, false)]
            .into_iter()
            .map(|(id, order, finished)| execution(id, "2024-03-09", order, finished))
            .collect();
        let new = execution(9, "2024-03-09", order, true);
        assert_eq!(execution_index(&list, &new), expected_index);
    }

    #[test]
    fn equal_keys_insert_after_existing() {
        let list = bucket();
        let new = execution(9, "2024-03-09", 3, false);
        assert_eq!(execution_index(&list, &new), 2);
    }

    #[rstest]
    #[case(2, Direction::Later, Some(3))]
    #[case(2, Direction::Earlier, Some(1))]
    #[case(1, Direction::Earlier, None)]
    #[case(3, Direction::Later, None)]
    #[case(4, Direction::Later, Some(5))]
    #[case(5, Direction::Later, None)]
    fn exchange_stays_within_finished_status(
        #[case] id: i64,
        #[case] direction: Direction,
        #[case] expected: Option<i64>,
    ) {
        let list = bucket();
        let target = list.iter().find(|e| e.id == id).unwrap();
        let found = exchange_candidate(&list, target, direction).map(|e| e.id);
        assert_eq!(found, expected);
    }

    #[test]
    fn direction_from_sign() {
        assert_eq!(Direction::try_from(1i64).unwrap(), Direction::Later);
        assert_eq!(Direction::try_from(-1i64).unwrap(), Direction::Earlier);
        assert!(Direction::try_from(0i64).is_err());
    }

    proptest! {
        #[test]
        fn insert_index_follows_scan_rule(
            items in prop::collection::vec((0i64..20, any::<bool>()), 0..40),
            order in 0i64..20,
            finished in any::<bool>(),
        ) {
            let list: Vec<TaskExecution> = items
                .iter()
                .enumerate()
                .map(|(i, (o, f))| execution(i as i64, "2024-03-09", *o, *f))
                .collect();
            let new = execution(99, "2024-03-09", order, finished);
            let index = execution_index(&list, &new);

            for e in &list[..index] {
                prop_assert_eq!(e.finished, finished);
                prop_assert!(e.day_order <= order);
            }
            if let Some(stop) = list.get(index) {
                prop_assert!(stop.finished != finished || stop.day_order > order);
            }
        }

        #[test]
        fn unfinished_inserts_keep_unfinished_run_sorted(orders in prop::collection::vec(0i64..20, 0..40)) {
            let mut list = bucket();
            for (i, order) in orders.iter().enumerate() {
                insert_execution(&mut list, execution(100 + i as i64, "2024-03-09", *order, false));
            }
            let unfinished: Vec<i64> = list.iter().take_while(|e| !e.finished).map(|e| e.day_order).collect();
            prop_assert_eq!(unfinished.len(), 3 + orders.len());
            prop_assert!(unfinished.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
