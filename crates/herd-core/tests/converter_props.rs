// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use proptest::prelude::*;

use herd_core::{
    BoolConverter, Datum, FloatConverter, IntConverter, Quat, RangeBindingMode, RangeConverter,
    Vec3,
};

fn finite() -> impl Strategy<Value = f32> {
    any::<f32>().prop_filter("finite", |v| v.is_finite() && v.abs() < 1.0e6)
}

fn range() -> impl Strategy<Value = (f32, f32)> {
    (finite(), finite())
        .prop_filter("non-degenerate", |(a, b)| (a - b).abs() > 1.0e-3)
        .prop_map(|(a, b)| (a.min(b), a.max(b)))
}

fn binding() -> impl Strategy<Value = RangeBindingMode> {
    prop_oneof![
        Just(RangeBindingMode::Clamped),
        Just(RangeBindingMode::CycleUp),
        Just(RangeBindingMode::CycleDown),
        Just(RangeBindingMode::Oscillate),
    ]
}

proptest! {
    #[test]
    fn flags_partition_and_normalized_bounded(raw in finite(), (min, max) in range()) {
        let c = FloatConverter::new(raw, min, max).unwrap();
        let n = c.normalized();
        prop_assert!((0.0..=1.0).contains(&n));
        prop_assert_eq!(c.over(), raw > max);
        prop_assert_eq!(c.under(), raw < min);
        prop_assert_eq!(c.in_range(), !c.over() && !c.under());
        prop_assert_eq!(c.as_axis(), n * 2.0 - 1.0);
    }

    #[test]
    fn as_axis_spans_minus_one_to_one((min, max) in range()) {
        prop_assert_eq!(FloatConverter::new(min, min, max).unwrap().as_axis(), -1.0);
        prop_assert_eq!(FloatConverter::new(max, min, max).unwrap().as_axis(), 1.0);
    }

    #[test]
    fn vector_converter_reads_length(v in prop::array::uniform3(finite()), (min, max) in range()) {
        let value = Vec3::from(v);
        let c = Datum::Vector(value).converter(min, max, RangeBindingMode::None).unwrap();
        prop_assert_eq!(c.raw(), value.length());
        prop_assert_eq!(c.in_range(), !c.over() && !c.under());
    }

    #[test]
    fn bound_ints_stay_in_range(
        value in any::<i32>(),
        min in -1000_i32..1000,
        width in 1_i32..500,
        mode in binding(),
    ) {
        let max = min + width;
        let bound = IntConverter::new(value, min, max, mode).unwrap().bound();
        let inside = (min..=max).contains(&bound);
        match mode {
            RangeBindingMode::Clamped | RangeBindingMode::Oscillate => prop_assert!(inside),
            RangeBindingMode::CycleUp => {
                prop_assert!(bound >= min);
                if value > max {
                    prop_assert!(inside);
                }
            }
            RangeBindingMode::CycleDown => {
                prop_assert!(bound <= max);
                if value < min {
                    prop_assert!(inside);
                }
            }
            RangeBindingMode::None => prop_assert_eq!(bound, value),
        }
        if (min..=max).contains(&value) {
            prop_assert_eq!(bound, value);
        }
    }

    #[test]
    fn bool_converter_never_fails(value in any::<bool>(), min in finite(), max in finite()) {
        let c = BoolConverter::new(value, min, max);
        prop_assert!((0.0..=1.0).contains(&c.normalized()));
    }

    #[test]
    fn datum_set_then_get_roundtrips(
        f in finite(),
        i in any::<i32>(),
        b in any::<bool>(),
        v in prop::array::uniform3(finite()),
        q in prop::array::uniform4(finite()),
        s in ".{0,16}",
    ) {
        let mut datum = Datum::default();
        datum.set(f);
        prop_assert_eq!(datum.get::<f32>(), Some(f));
        datum.set(i);
        prop_assert_eq!(datum.get::<i32>(), Some(i));
        prop_assert_eq!(datum.get::<f32>(), None);
        datum.set(b);
        prop_assert_eq!(datum.get::<bool>(), Some(b));
        datum.set(Vec3::from(v));
        prop_assert_eq!(datum.get::<Vec3>(), Some(Vec3::from(v)));
        datum.set(Quat::from(q));
        prop_assert_eq!(datum.get::<Quat>(), Some(Quat::from(q)));
        datum.set(s.clone());
        prop_assert_eq!(datum.get::<String>(), Some(s));
    }

    #[test]
    fn datum_set_value_then_get_roundtrips(
        f in finite(),
        i in any::<i32>(),
        wide in any::<i64>(),
        b in any::<bool>(),
        v in prop::array::uniform3(finite()),
        q in prop::array::uniform4(finite()),
    ) {
        let mut datum = Datum::default();
        prop_assert!(datum.set_value(&f).is_ok());
        prop_assert_eq!(datum.get::<f32>(), Some(f));
        prop_assert!(datum.set_value(&i).is_ok());
        prop_assert_eq!(datum.get::<i32>(), Some(i));
        prop_assert!(datum.set_value(&b).is_ok());
        prop_assert_eq!(datum.get::<bool>(), Some(b));
        prop_assert!(datum.set_value(&Vec3::from(v)).is_ok());
        prop_assert_eq!(datum.get::<Vec3>(), Some(Vec3::from(v)));
        prop_assert!(datum.set_value(&Quat::from(q)).is_ok());
        prop_assert_eq!(datum.get::<Quat>(), Some(Quat::from(q)));

        let before = datum.clone();
        let fits = i32::try_from(wide).is_ok();
        prop_assert_eq!(datum.set_value(&wide).is_ok(), fits);
        if fits {
            prop_assert_eq!(datum.get::<i32>().map(i64::from), Some(wide));
        } else {
            prop_assert_eq!(&datum, &before);
        }
        prop_assert!(datum.set_value(&'x').is_err());
    }
}
