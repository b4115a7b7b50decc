use super::*;

#[test]
fn zero_uuid_is_rejected() {
    assert!(TableUuid::new(0).is_none());
    assert_eq!(TableUuid::new(42).unwrap().get(), 42);
    assert_eq!(TableUuid::new(7).unwrap().to_string(), "7");
}

#[test]
fn flags_are_independent() {
    let mut flags = StateFlags::DIRTY | StateFlags::DEAD;
    assert_eq!(flags.bits(), 0b11);

    flags.remove(StateFlags::DEAD);
    assert!(flags.contains(StateFlags::DIRTY));
    assert!(!flags.contains(StateFlags::DEAD));

    flags.insert(StateFlags::DIRTY);
    assert_eq!(flags, StateFlags::DIRTY);

    flags.remove(StateFlags::DIRTY);
    assert_eq!(flags, StateFlags::empty());
}

#[test]
fn buffer_capacity_fits_largest_geometry() {
    assert!(usize::from(MAX_SLICES) <= MAX_BUFFER_SIZE);
    assert_eq!(64 * 64, MAX_BUFFER_SIZE);
    assert!(PERSISTED_VALUES_LEN <= MAX_BUFFER_SIZE);
}
