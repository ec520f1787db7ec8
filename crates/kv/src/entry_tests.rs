use super::*;

fn arc(bytes: &[u8]) -> Arc<[u8]> {
    Arc::from(bytes)
}

#[test]
fn scalar_copy_is_a_distinct_allocation() {
    let input = arc(b"hello");
    let (stored, size) = StoredValue::build(Input::Scalar(input.clone()), SetFlags::new(false, false, false));
    assert_eq!(size, 5);
    assert_eq!(stored.to_vec(), b"hello");
    assert!(!stored.is_same_allocation(&input));
}

#[test]
fn scalar_ref_shares_the_allocation() {
    let input = arc(b"hello");
    let (stored, size) = StoredValue::build(Input::Scalar(input.clone()), SetFlags::new(false, true, false));
    assert_eq!(size, 5);
    assert!(stored.is_same_allocation(&input));
}

#[test]
fn vector_copy_without_merge_keeps_segments_separate() {
    let segments = vec![arc(b"ab"), arc(b"cd")];
    let (stored, size) = StoredValue::build(Input::Vector(segments), SetFlags::new(true, false, false));
    assert_eq!(size, 2);
    match stored {
        StoredValue::Segments(segs) => assert_eq!(segs.len(), 2),
        other => panic!("expected Segments, got {other:?}"),
    }
}

#[test]
fn vector_ref_without_merge_shares_each_segment() {
    let a = arc(b"ab");
    let b = arc(b"cd");
    let segments = vec![a.clone(), b.clone()];
    let (stored, _) = StoredValue::build(Input::Vector(segments), SetFlags::new(true, true, false));
    match stored {
        StoredValue::Segments(segs) => {
            assert!(Arc::ptr_eq(&segs[0], &a));
            assert!(Arc::ptr_eq(&segs[1], &b));
        }
        other => panic!("expected Segments, got {other:?}"),
    }
}

#[test]
fn vector_merge_without_ref_concatenates_into_one_copy() {
    let segments = vec![arc(b"ab"), arc(b"cd")];
    let (stored, size) = StoredValue::build(Input::Vector(segments), SetFlags::new(true, false, true));
    assert_eq!(size, 4);
    assert_eq!(stored.to_vec(), b"abcd");
    assert!(matches!(stored, StoredValue::Contiguous(_)));
}

#[test]
fn vector_merge_with_ref_produces_contiguous_value_and_views() {
    let segments = vec![arc(b"ab"), arc(b"cde")];
    let (stored, size) = StoredValue::build(Input::Vector(segments), SetFlags::new(true, true, true));
    assert_eq!(size, 5);
    match stored {
        StoredValue::ContiguousWithView(bytes, views) => {
            assert_eq!(&*bytes, b"abcde");
            assert_eq!(views, vec![(0, 2), (2, 3)]);
        }
        other => panic!("expected ContiguousWithView, got {other:?}"),
    }
}

#[test]
fn composite_key_joins_prefix_and_key() {
    assert_eq!(Entry::composite_key("udev", "ID_SERIAL"), "udev:ID_SERIAL");
}
