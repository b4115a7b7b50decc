use super::*;
use crate::foundation::core::{MAX_BUFFER_SIZE, TableUuid};

const DOOM: OffsetParams = OffsetParams {
    steps: 16,
    increment: 0.0625,
    factor: 0.6,
};

fn table_with_values(values: &[u8], offsets_size: u16, position: u16) -> MeltTable {
    let mut t = MeltTable::new(TableUuid::new(1).unwrap());
    t.values_buffer_mut()[..values.len()].copy_from_slice(values);
    t.set_sizes(values.len() as u16, offsets_size);
    t.position = position;
    t
}

#[test]
fn offsets_walk_matches_reference_steps() {
    // max_step 15, step_size round(255 * 0.6 / 15) = 10, inc_value 1, inc_modulo 3.
    // pos 2: 15 % 16 = 15
    // pos 3: 20 % 3 = 2 -> delta  1 -> 14
    // pos 4: 25 % 3 = 1 -> delta  0 -> 14
    // pos 5: 30 % 3 = 0 -> delta -1 -> 15
    let mut t = table_with_values(&[5, 10, 15, 20, 25, 30, 35, 40], 4, 2);
    generate_offsets(&mut t, DOOM).unwrap();
    assert_eq!(t.offsets(), &[150, 140, 140, 150]);
    assert_eq!(t.position, 5);
}

#[test]
fn offsets_walk_wraps_around_values() {
    let mut t = table_with_values(&[5, 10, 15, 20, 25, 30, 35, 40], 12, 6);
    generate_offsets(&mut t, DOOM).unwrap();
    assert_eq!(
        t.offsets(),
        &[30, 30, 20, 20, 30, 20, 20, 30, 20, 20, 10, 10]
    );
    assert_eq!(t.position, 1);
}

#[test]
fn offsets_walk_continues_from_saved_position() {
    let values = [5, 10, 15, 20, 25, 30, 35, 40];
    let mut once = table_with_values(&values, 4, 2);
    generate_offsets(&mut once, DOOM).unwrap();
    generate_offsets(&mut once, DOOM).unwrap();

    let mut fresh = table_with_values(&values, 4, 5);
    generate_offsets(&mut fresh, DOOM).unwrap();

    assert_eq!(once.offsets(), fresh.offsets());
    assert_eq!(once.position, fresh.position);
}

#[test]
fn legacy_walk_is_stable() {
    let mut t = MeltTable::new(TableUuid::new(1).unwrap());
    t.set_sizes(256, 8);
    t.position = 2;
    fill_legacy_values(&mut t);
    generate_offsets(&mut t, DOOM).unwrap();
    assert_eq!(t.offsets(), &[130, 130, 140, 140, 130, 120, 130, 120]);
    assert_eq!(t.position, 9);
}

#[test]
fn full_factor_uses_whole_range() {
    let mut t = table_with_values(&[0, 1, 2, 3], 6, 0);
    let params = OffsetParams {
        steps: 4,
        increment: 0.25,
        factor: 1.0,
    };
    generate_offsets(&mut t, params).unwrap();
    assert_eq!(t.offsets(), &[0, 0, 0, 85, 170, 170]);
}

#[test]
fn offsets_stay_within_scaled_bounds() {
    let mut t = MeltTable::new(TableUuid::new(1).unwrap());
    t.set_sizes(4096, 1600);
    generate_values(&mut t, &mut Rng64::new(7));
    let params = OffsetParams {
        steps: 64,
        increment: 0.25,
        factor: 1.0,
    };
    generate_offsets(&mut t, params).unwrap();
    // step_size = round(255 / 63) = 4
    assert!(t.offsets().iter().all(|&o| o % 4 == 0 && o <= 63 * 4));
}

#[test]
fn huge_increment_walks_like_the_widest_step() {
    let values = [5, 10, 15, 20, 25, 30, 35, 40];
    // round(16 * 0.9375) = 15 = max_step.
    let mut widest = table_with_values(&values, 8, 2);
    generate_offsets(&mut widest, OffsetParams { increment: 0.9375, ..DOOM }).unwrap();

    for increment in [1.0e12, f32::MAX] {
        let mut t = table_with_values(&values, 8, 2);
        generate_offsets(&mut t, OffsetParams { increment, ..DOOM }).unwrap();
        assert_eq!(t.offsets(), widest.offsets());
        assert_eq!(t.position, widest.position);
        assert!(t.offsets().iter().all(|&o| o <= 150));
    }
}

#[test]
fn invalid_steps_are_rejected() {
    let mut t = table_with_values(&[1, 2, 3], 2, 0);
    for steps in [0u16, 1, 257] {
        let params = OffsetParams { steps, ..DOOM };
        assert!(matches!(
            generate_offsets(&mut t, params),
            Err(MeltError::Validation(_))
        ));
    }
    let params = OffsetParams {
        factor: f32::NAN,
        ..DOOM
    };
    assert!(generate_offsets(&mut t, params).is_err());
}

#[test]
fn empty_values_are_rejected_and_empty_offsets_are_noop() {
    let mut t = MeltTable::new(TableUuid::new(1).unwrap());
    t.set_sizes(0, 4);
    assert!(generate_offsets(&mut t, DOOM).is_err());

    let mut t = table_with_values(&[1, 2], 0, 1);
    generate_offsets(&mut t, DOOM).unwrap();
    assert_eq!(t.position, 1);
}

#[test]
fn random_values_only_touch_used_prefix() {
    let mut t = MeltTable::new(TableUuid::new(1).unwrap());
    t.set_sizes(64, 8);
    generate_values(&mut t, &mut Rng64::new(3));
    assert!(t.values().iter().any(|&v| v != 0));
    assert!(t.values_buffer()[64..].iter().all(|&v| v == 0));
    assert_eq!(t.values_buffer().len(), MAX_BUFFER_SIZE);

    let mut again = MeltTable::new(TableUuid::new(2).unwrap());
    again.set_sizes(64, 8);
    generate_values(&mut again, &mut Rng64::new(3));
    assert_eq!(t.values(), again.values());
}

#[test]
fn fill_values_dispatches_on_source() {
    let mut t = MeltTable::new(TableUuid::new(1).unwrap());
    t.set_sizes(256, 8);
    fill_values(&mut t, ValueSource::Legacy, &mut Rng64::new(1));
    assert_eq!(t.values(), &LEGACY_VALUES[..]);

    fill_values(&mut t, ValueSource::Dynamic, &mut Rng64::new(1));
    assert_ne!(t.values(), &LEGACY_VALUES[..]);
}

#[test]
fn value_source_serde_names() {
    let s: ValueSource = serde_json::from_str("\"dynamic\"").unwrap();
    assert_eq!(s, ValueSource::Dynamic);
    assert_eq!(serde_json::to_string(&ValueSource::Legacy).unwrap(), "\"legacy\"");
}
