use std::{collections::HashSet, sync::Arc, thread};

use super::*;

#[test]
fn claims_strictly_increasing_indices() {
    let queue = WorkQueue::new(5);

    let claimed: Vec<usize> =
        std::iter::from_fn(|| queue.claim_next()).collect();

    assert_eq!(claimed, vec![0, 1, 2, 3, 4]);
    assert!(queue.is_exhausted());
}

#[test]
fn stays_exhausted() {
    let queue = WorkQueue::new(1);

    assert_eq!(queue.claim_next(), Some(0));

    for _ in 0..100 {
        assert_eq!(queue.claim_next(), None);
    }
}

#[test]
fn empty_queue_never_yields() {
    let queue = WorkQueue::new(0);

    assert!(queue.is_empty());
    assert!(queue.is_exhausted());
    assert_eq!(queue.claim_next(), None);
}

#[test]
fn concurrent_claims_are_unique_and_gapless() {
    let len = 1_000;
    let workers = 16;
    let queue = Arc::new(WorkQueue::new(len));

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut mine = Vec::new();
                while let Some(index) = queue.claim_next() {
                    mine.push(index);
                }
                mine
            })
        })
        .collect();

    let mut all: Vec<usize> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let unique: HashSet<usize> = all.iter().copied().collect();
    assert_eq!(unique.len(), all.len());

    all.sort_unstable();
    assert_eq!(all, (0..len).collect::<Vec<_>>());
}

#[test]
fn bounded_claims_yield_min_of_requests_and_len() {
    let len = 50;
    let workers = 8;
    let claims_each = 4;
    let queue = Arc::new(WorkQueue::new(len));

    let claimed: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                s.spawn(|| {
                    (0..claims_each)
                        .filter_map(|_| queue.claim_next())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let expected = (workers * claims_each).min(len);
    let unique: HashSet<usize> = claimed.iter().copied().collect();

    assert_eq!(claimed.len(), expected);
    assert_eq!(unique.len(), expected);
    assert!(claimed.iter().all(|i| *i < expected));
}
