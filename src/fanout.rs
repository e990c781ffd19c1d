//! Fan-out/fan-in over the rayon pool.
//!
//! One task per item, results gathered into slots indexed by source
//! position, so completion order never leaks into the output.

use rayon::prelude::*;

/// Run `task` for every item and return the results in source order.
///
/// Every task runs to completion. If any fail, the error of the lowest
/// position is returned and the other results are dropped.
pub fn collect_ordered<T, R, E, F>(items: &[T], task: F) -> Result<Vec<R>, E>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(usize, &T) -> Result<R, E> + Sync + Send,
{
    let slots: Vec<Result<R, E>> = items
        .par_iter()
        .enumerate()
        .map(|(position, item)| task(position, item))
        .collect();
    slots.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn keeps_source_order_whatever_finishes_first() {
        let items: Vec<u64> = (0..32).collect();
        let out = collect_ordered(&items, |_, n| {
            // later items finish first
            std::thread::sleep(Duration::from_micros((32 - n) * 50));
            Ok::<_, ()>(n * 10)
        })
        .unwrap();
        assert_eq!(out, items.iter().map(|n| n * 10).collect::<Vec<_>>());
    }

    #[test]
    fn lowest_position_error_wins_and_siblings_still_run() {
        let ran = AtomicUsize::new(0);
        let items: Vec<usize> = (0..16).collect();
        let err = collect_ordered(&items, |position, _| {
            ran.fetch_add(1, Ordering::SeqCst);
            if position == 3 || position == 11 { Err(position) } else { Ok(position) }
        })
        .unwrap_err();
        assert_eq!(err, 3);
        assert_eq!(ran.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn empty_input() {
        let items: Vec<u8> = Vec::new();
        let out = collect_ordered(&items, |_, x| Ok::<_, ()>(*x)).unwrap();
        assert!(out.is_empty());
    }
}
