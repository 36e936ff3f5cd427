//! Property tests: structural invariants hold across arbitrary operation
//! sequences.
//!
//! - Disjointness: a region's unpinned intervals are pairwise disjoint and
//!   sorted ascending.
//! - Conservation: the manager's reclaimable-byte counter always equals
//!   the byte sum of every unpinned interval across every region.

use proptest::prelude::*;

use memshare_core::{Credentials, RegionHandle, RegionManager, PAGE_SIZE};

/// Pages per test region.
const REGION_PAGES: usize = 64;

#[derive(Debug, Clone)]
enum Op {
    Unpin { region: usize, start: usize, pages: usize },
    Pin { region: usize, start: usize, pages: usize },
    Status { region: usize, start: usize, pages: usize },
    PurgeAll,
}

fn op_strategy(regions: usize) -> impl Strategy<Value = Op> {
    let range = (0..regions, 0..REGION_PAGES).prop_flat_map(|(region, start)| {
        (
            Just(region),
            Just(start),
            1..=(REGION_PAGES - start),
        )
    });
    prop_oneof![
        4 => range.clone().prop_map(|(region, start, pages)| Op::Unpin { region, start, pages }),
        4 => range.clone().prop_map(|(region, start, pages)| Op::Pin { region, start, pages }),
        1 => range.prop_map(|(region, start, pages)| Op::Status { region, start, pages }),
        1 => Just(Op::PurgeAll),
    ]
}

fn check_invariants(manager: &RegionManager, regions: &[RegionHandle]) {
    let mut total = 0usize;
    for region in regions {
        let ranges = region.unpinned_ranges();
        for pair in ranges.windows(2) {
            // Ascending and disjoint: each span ends before the next starts.
            assert!(
                pair[0].span.end() < pair[1].span.start(),
                "intervals out of order or overlapping: {:?}",
                ranges
            );
        }
        total += ranges.iter().map(|r| r.span.bytes()).sum::<usize>();
    }
    assert_eq!(
        manager.reclaimable_bytes(),
        total,
        "reclaimable-byte counter out of conservation"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn invariants_hold_across_operation_sequences(
        ops in proptest::collection::vec(op_strategy(3), 1..80)
    ) {
        let manager = RegionManager::new();
        let regions: Vec<_> = (0..3)
            .map(|_| {
                let region = manager.open();
                region.set_size(REGION_PAGES * PAGE_SIZE).unwrap();
                region
            })
            .collect();

        for op in ops {
            match op {
                Op::Unpin { region, start, pages } => {
                    regions[region]
                        .unpin(start * PAGE_SIZE, pages * PAGE_SIZE)
                        .unwrap();
                }
                Op::Pin { region, start, pages } => {
                    regions[region]
                        .pin(start * PAGE_SIZE, pages * PAGE_SIZE)
                        .unwrap();
                }
                Op::Status { region, start, pages } => {
                    regions[region]
                        .pin_status(start * PAGE_SIZE, pages * PAGE_SIZE)
                        .unwrap();
                }
                Op::PurgeAll => {
                    manager.purge_all(&Credentials::admin()).unwrap();
                }
            }
            check_invariants(&manager, &regions);
        }
    }

    #[test]
    fn full_cycle_always_returns_to_empty(
        ops in proptest::collection::vec(op_strategy(1), 1..40)
    ) {
        let manager = RegionManager::new();
        let region = manager.open();
        region.set_size(REGION_PAGES * PAGE_SIZE).unwrap();

        for op in ops {
            match op {
                Op::Unpin { start, pages, .. } => {
                    region.unpin(start * PAGE_SIZE, pages * PAGE_SIZE).unwrap();
                }
                Op::Pin { start, pages, .. } => {
                    region.pin(start * PAGE_SIZE, pages * PAGE_SIZE).unwrap();
                }
                Op::Status { start, pages, .. } => {
                    region.pin_status(start * PAGE_SIZE, pages * PAGE_SIZE).unwrap();
                }
                Op::PurgeAll => {
                    manager.purge_all(&Credentials::admin()).unwrap();
                }
            }
        }

        // Pinning everything restores the empty state regardless of history.
        region.pin(0, 0).unwrap();
        prop_assert!(region.unpinned_ranges().is_empty());
        prop_assert_eq!(manager.reclaimable_bytes(), 0);
    }
}
