//! End-to-end pin/unpin/purge semantics at the byte-command level.

use memshare_core::{
    Credentials, Error, PageSpan, PinOutcome, PinStatus, RegionManager, PAGE_SIZE,
};

#[test]
fn pin_unpin_inverse_on_full_range() {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(64 * PAGE_SIZE).unwrap();

    region.unpin(0, 0).unwrap();
    assert_eq!(region.pin(0, 0).unwrap(), PinOutcome::NotPurged);
    assert!(region.unpinned_ranges().is_empty());
    assert_eq!(manager.reclaimable_bytes(), 0);
}

#[test]
fn purge_then_pin_reports_exactly_once() {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(16 * PAGE_SIZE).unwrap();

    region.unpin(0, 10 * PAGE_SIZE).unwrap();
    manager.purge_all(&Credentials::admin()).unwrap();
    assert_eq!(
        region.pin(0, 10 * PAGE_SIZE).unwrap(),
        PinOutcome::WasPurged
    );

    region.unpin(0, 10 * PAGE_SIZE).unwrap();
    assert_eq!(
        region.pin(0, 10 * PAGE_SIZE).unwrap(),
        PinOutcome::NotPurged
    );
}

#[test]
fn hole_punch_splits_and_tags_both_halves() {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(100 * PAGE_SIZE).unwrap();

    // Pages [0, 99] unpinned and purged.
    region.unpin(0, 0).unwrap();
    manager.purge_all(&Credentials::admin()).unwrap();

    // Pin pages [40, 59].
    assert_eq!(
        region.pin(40 * PAGE_SIZE, 20 * PAGE_SIZE).unwrap(),
        PinOutcome::WasPurged
    );

    let ranges = region.unpinned_ranges();
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0].span, PageSpan::new(0, 39));
    assert_eq!(ranges[1].span, PageSpan::new(60, 99));
    assert!(ranges[0].purged);
    assert!(ranges[1].purged);

    assert_eq!(
        region
            .pin_status(40 * PAGE_SIZE, 20 * PAGE_SIZE)
            .unwrap(),
        PinStatus::Pinned
    );
    assert_eq!(
        region.pin_status(0, 40 * PAGE_SIZE).unwrap(),
        PinStatus::Unpinned
    );
}

#[test]
fn overlapping_unpins_merge() {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(32 * PAGE_SIZE).unwrap();

    region.unpin(0, 10 * PAGE_SIZE).unwrap();
    region.unpin(5 * PAGE_SIZE, 10 * PAGE_SIZE).unwrap();

    let ranges = region.unpinned_ranges();
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].span, PageSpan::new(0, 14));
    assert_eq!(manager.reclaimable_bytes(), 15 * PAGE_SIZE);
}

#[test]
fn adjacent_unpins_stay_separate() {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(32 * PAGE_SIZE).unwrap();

    region.unpin(0, 5 * PAGE_SIZE).unwrap();
    region.unpin(5 * PAGE_SIZE, 5 * PAGE_SIZE).unwrap();
    assert_eq!(region.unpinned_ranges().len(), 2);
}

#[test]
fn purge_is_idempotent() {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(8 * PAGE_SIZE).unwrap();
    region.unpin(0, 0).unwrap();

    assert_eq!(
        manager.purge_all(&Credentials::admin()).unwrap(),
        8 * PAGE_SIZE
    );
    assert_eq!(manager.purge_all(&Credentials::admin()).unwrap(), 0);
}

#[test]
fn boundary_rejection() {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(4 * PAGE_SIZE).unwrap();

    // Misaligned offset and length.
    assert!(matches!(region.pin(1, 0), Err(Error::InvalidRange(_))));
    assert!(matches!(
        region.pin(0, PAGE_SIZE - 1),
        Err(Error::InvalidRange(_))
    ));
    assert!(matches!(
        region.unpin(PAGE_SIZE / 2, PAGE_SIZE),
        Err(Error::InvalidRange(_))
    ));

    // Out of bounds.
    assert!(matches!(
        region.pin(4 * PAGE_SIZE, 0),
        Err(Error::InvalidRange(_))
    ));
    assert!(matches!(
        region.pin(0, 5 * PAGE_SIZE),
        Err(Error::InvalidRange(_))
    ));

    // Offset + length overflow.
    let aligned_max = usize::MAX - (PAGE_SIZE - 1);
    assert!(matches!(
        region.pin(aligned_max, PAGE_SIZE),
        Err(Error::InvalidRange(_))
    ));

    // Nothing leaked into the state.
    assert!(region.unpinned_ranges().is_empty());
    assert_eq!(manager.reclaimable_bytes(), 0);
}

#[test]
fn status_never_mutates() {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(8 * PAGE_SIZE).unwrap();
    region.unpin(2 * PAGE_SIZE, 2 * PAGE_SIZE).unwrap();

    for _ in 0..3 {
        assert_eq!(
            region.pin_status(0, 0).unwrap(),
            PinStatus::Unpinned
        );
        assert_eq!(
            region.pin_status(0, 2 * PAGE_SIZE).unwrap(),
            PinStatus::Pinned
        );
    }
    assert_eq!(region.unpinned_ranges().len(), 1);
    assert_eq!(manager.reclaimable_bytes(), 2 * PAGE_SIZE);
}

#[test]
fn pin_wins_content_only_purged_while_unpinned() {
    let manager = RegionManager::new();
    let region = manager.open();
    region.set_size(8 * PAGE_SIZE).unwrap();

    // Pinned ranges have no representation and are never purged.
    manager.purge_all(&Credentials::admin()).unwrap();
    assert_eq!(region.pin(0, 0).unwrap(), PinOutcome::NotPurged);

    // Only the unpinned half is evicted.
    region.unpin(0, 4 * PAGE_SIZE).unwrap();
    assert_eq!(
        manager.purge_all(&Credentials::admin()).unwrap(),
        4 * PAGE_SIZE
    );
    assert_eq!(
        region.pin(4 * PAGE_SIZE, 4 * PAGE_SIZE).unwrap(),
        PinOutcome::NotPurged
    );
    assert_eq!(region.pin(0, 4 * PAGE_SIZE).unwrap(), PinOutcome::WasPurged);
}

#[test]
fn closing_a_region_drains_its_queue_share() {
    let manager = RegionManager::new();
    let keep = manager.open();
    let close = manager.open();
    keep.set_size(8 * PAGE_SIZE).unwrap();
    close.set_size(8 * PAGE_SIZE).unwrap();

    keep.unpin(0, 2 * PAGE_SIZE).unwrap();
    close.unpin(0, 0).unwrap();
    assert_eq!(manager.reclaimable_bytes(), 10 * PAGE_SIZE);

    close.close();
    assert_eq!(manager.reclaimable_bytes(), 2 * PAGE_SIZE);

    // The survivor still purges normally.
    assert_eq!(
        manager.purge_all(&Credentials::admin()).unwrap(),
        2 * PAGE_SIZE
    );
}
