use chrono::{DateTime, TimeDelta, Utc};
use proptest::prelude::*;
use sovran_valuemap::time::{format_duration, parse_duration};
use sovran_valuemap::TypedMap;

proptest! {
    #[test]
    fn integer_text_reads_back(n in any::<i64>()) {
        let map = TypedMap::new();
        map.set("n", n.to_string());
        prop_assert_eq!(map.get_i64("n"), n);
        prop_assert_eq!(map.get_f64("n"), n as f64);
    }

    #[test]
    fn floats_truncate_toward_zero(f in -1.0e15f64..1.0e15f64) {
        let map = TypedMap::new();
        map.set("f", f);
        prop_assert_eq!(map.get_i64("f"), f.trunc() as i64);
        prop_assert_eq!(map.get_bool("f"), f != 0.0);
    }

    #[test]
    fn float_text_round_trips(f in any::<f64>().prop_filter("finite", |f| f.is_finite())) {
        let map = TypedMap::new();
        map.set("f", f);
        map.set("text", map.get_string("f"));
        prop_assert_eq!(map.get_f64("text"), f);
    }

    #[test]
    fn unparseable_text_reads_as_zero(s in "[g-su-z ]{1,12}") {
        let map = TypedMap::new();
        map.set("s", s.as_str());
        prop_assert_eq!(map.get_i64("s"), 0);
        prop_assert_eq!(map.get_f64("s"), 0.0);
        prop_assert_eq!(map.get_time("s").timestamp(), 0);
        prop_assert_eq!(map.get_string("s"), s);
    }

    #[test]
    fn epoch_millis_truncate_to_seconds(ms in -62_000_000_000_000i64..250_000_000_000_000i64) {
        let map = TypedMap::new();
        map.set_epoch_millis("t", ms);
        prop_assert_eq!(map.get_time("t").timestamp(), ms / 1000);
        prop_assert_eq!(map.get_epoch_millis("t"), ms / 1000 * 1000);
    }

    #[test]
    fn timestamps_round_trip_through_text(secs in 0i64..253_402_300_799i64) {
        let map = TypedMap::new();
        let at: DateTime<Utc> = DateTime::from_timestamp(secs, 0).unwrap();
        map.set("t", at);
        map.set("text", map.get_string("t"));
        prop_assert_eq!(map.get_string("t"), map.get_string("text"));
        prop_assert_eq!(map.get_time("text").timestamp(), secs);
        prop_assert_eq!(map.get_time("text"), map.get_time("t"));
    }

    #[test]
    fn duration_text_round_trips(nanos in any::<i64>()) {
        let d = TimeDelta::nanoseconds(nanos);
        prop_assert_eq!(parse_duration(&format_duration(d)), Some(d));
    }

    #[test]
    fn json_round_trip_keeps_keys(
        entries in proptest::collection::hash_map("[a-z]{1,8}", any::<i64>(), 0..16)
    ) {
        let map = TypedMap::copy(entries.clone());
        let decoded = TypedMap::from_json(&map.to_json_vec().unwrap()).unwrap();
        prop_assert_eq!(decoded.len(), entries.len());
        for (key, value) in &entries {
            prop_assert_eq!(decoded.get_i64(key), *value);
        }
    }
}
