use cloudform_core::identity::{decode, encode};
use cloudform_core::{Identity, Segment, SegmentKind};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        any::<i64>().prop_map(Segment::Int),
        "[a-zA-Z][a-zA-Z0-9._@/-]{0,24}".prop_map(Segment::Str),
    ]
}

proptest! {
    #[test]
    fn test_encode_decode_round_trip(segments in prop::collection::vec(segment(), 1..5)) {
        let layout: Vec<SegmentKind> = segments.iter().map(Segment::kind).collect();
        let raw = encode(&segments).unwrap();
        prop_assert_eq!(decode(&raw, &layout).unwrap(), segments);
    }

    #[test]
    fn test_wrong_segment_count_is_rejected(
        ids in prop::collection::vec(any::<i64>(), 1..4),
        extra in 1usize..3,
    ) {
        let segments: Vec<Segment> = ids.into_iter().map(Segment::Int).collect();
        let raw = encode(&segments).unwrap();
        let layout = vec![SegmentKind::Int; segments.len() + extra];
        prop_assert!(Identity::parse(&raw, &layout).is_err());
    }
}
