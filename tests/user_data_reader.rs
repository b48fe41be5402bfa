// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for set, merge, update and query parsing

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use user_data_reader::*;

fn reader() -> UserDataReader {
    let _ = env_logger::builder().is_test(true).try_init();
    UserDataReader::builder(DatabaseId::default_for("project")).build()
}

fn path(s: &str) -> FieldPath {
    FieldPath::from_dot_separated(s).unwrap()
}

fn mask(paths: &[&str]) -> FieldMask {
    FieldMask::new(paths.iter().map(|p| path(p)))
}

fn raw(value: serde_json::Value) -> RawValue {
    RawValue::from(value)
}

fn with(entries: Vec<(&str, RawValue)>) -> RawValue {
    RawValue::map(entries)
}

#[test]
fn test_set_round_trips_plain_data() {
    let input = raw(json!({
        "name": "Ada",
        "age": 36,
        "ratio": 0.5,
        "active": true,
        "nothing": null,
        "tags": ["x", "y"],
        "address": {"city": "London", "geo": {"zoom": 3}},
    }));

    let parsed = reader().parsed_set_data(&input).unwrap();
    assert!(parsed.field_transforms().is_empty());

    let back = FieldValue::Map(parsed.data().clone()).into_raw();
    assert_eq!(back, input);

    let reparsed = reader().parsed_set_data(&back).unwrap();
    assert_eq!(reparsed.data(), parsed.data());
}

#[test]
fn test_update_mask_is_exactly_the_keys() {
    let parsed = reader()
        .parsed_update_data(&raw(json!({"a.b": 1})))
        .unwrap();

    assert_eq!(parsed.field_mask(), &mask(&["a.b"]));
    assert_eq!(parsed.data().get(&path("a.b")), Some(&FieldValue::Integer(1)));
    assert!(parsed.field_transforms().is_empty());
}

#[test]
fn test_merge_with_explicit_mask() {
    let input = raw(json!({"a": {"b": 1, "c": 2}}));

    let parsed = reader()
        .parsed_merge_data(&input, Some(&[RawFieldPath::from("a.b")]))
        .unwrap();
    assert_eq!(parsed.field_mask(), Some(&mask(&["a.b"])));
    assert_eq!(parsed.data().get(&path("a.c")), Some(&FieldValue::Integer(2)));

    let err = reader()
        .parsed_merge_data(&input, Some(&[RawFieldPath::from("a.d")]))
        .unwrap_err();
    assert_eq!(err, UserDataError::MissingFieldForMerge { field: path("a.d") });
    assert_eq!(err.error_code().code_str(), "UD0002");
}

#[test]
fn test_merge_rejects_invalid_mask_path() {
    let input = raw(json!({"a": {"b": 1}}));

    let err = reader()
        .parsed_merge_data(&input, Some(&[RawFieldPath::from("a..b")]))
        .unwrap_err();
    assert!(matches!(err, UserDataError::InvalidPath { .. }));
    assert_eq!(err.error_code().code_str(), "UD0001");
}

#[test]
fn test_merge_infers_mask_from_leaves() {
    let input = with(vec![
        ("a", raw(json!({"b": 1, "c": {"d": "x"}}))),
        ("empty", raw(json!({}))),
        ("list", raw(json!([1, {"x": 2}]))),
        ("gone", Sentinel::delete().into()),
        ("stamp", Sentinel::server_timestamp().into()),
    ]);

    let parsed = reader().parsed_merge_data(&input, None).unwrap();
    assert_eq!(
        parsed.field_mask(),
        Some(&mask(&["a.b", "a.c.d", "empty", "gone", "list", "stamp"]))
    );

    let kinds: Vec<SentinelKind> = parsed
        .field_transforms()
        .iter()
        .map(|t| t.operation.kind())
        .collect();
    assert_eq!(kinds, vec![SentinelKind::Delete, SentinelKind::ServerTimestamp]);
    assert!(parsed.data().get(&path("gone")).is_none());
    assert!(parsed.data().get(&path("stamp")).is_none());
}

#[test]
fn test_merge_mask_drops_uncovered_transforms() {
    let input = with(vec![
        ("a", RawValue::from(1)),
        ("t", Sentinel::server_timestamp().into()),
    ]);

    let parsed = reader()
        .parsed_merge_data(&input, Some(&[RawFieldPath::from("a")]))
        .unwrap();
    assert!(parsed.field_transforms().is_empty());

    let parsed = reader()
        .parsed_merge_data(&input, Some(&[RawFieldPath::from("t")]))
        .unwrap();
    assert_eq!(parsed.field_transforms().len(), 1);
    assert_eq!(parsed.field_mask(), Some(&mask(&["t"])));
}

#[test]
fn test_delete_placement() {
    let top_level = with(vec![("a", Sentinel::delete().into())]);
    let parsed = reader().parsed_update_data(&top_level).unwrap();
    assert_eq!(
        parsed.field_transforms(),
        &[FieldTransform::new(path("a"), TransformOperation::Delete)]
    );
    assert_eq!(parsed.field_mask(), &mask(&["a"]));

    let nested = with(vec![(
        "a",
        with(vec![("b", Sentinel::delete().into())]),
    )]);
    assert!(matches!(
        reader().parsed_update_data(&nested),
        Err(UserDataError::InvalidDeleteNesting { .. })
    ));

    assert!(matches!(
        reader().parsed_set_data(&top_level),
        Err(UserDataError::InvalidDeleteNesting { .. })
    ));
}

#[rstest]
#[case(3, true)]
#[case(2, false)]
fn test_depth_limit(#[case] max_depth: usize, #[case] accepted: bool) {
    let reader = UserDataReader::builder(DatabaseId::default_for("project"))
        .with_max_depth(max_depth)
        .build();
    // The leaf sits at depth 3.
    let input = raw(json!({"a": {"b": {"c": 1}}}));

    let result = reader.parsed_set_data(&input);
    if accepted {
        assert!(result.is_ok());
    } else {
        assert_eq!(
            result.unwrap_err(),
            UserDataError::MaxDepthExceeded {
                max_depth: 2,
                path: Some(path("a.b.c")),
            }
        );
    }
}

#[test]
fn test_query_nested_arrays() {
    let input = raw(json!([1, [2, 3]]));

    assert!(matches!(
        reader().parsed_query_value(&input, false),
        Err(UserDataError::NestedArray { .. })
    ));

    let value = reader().parsed_query_value(&input, true).unwrap();
    assert_eq!(
        value,
        FieldValue::Array(vec![
            FieldValue::Integer(1),
            FieldValue::Array(vec![FieldValue::Integer(2), FieldValue::Integer(3)]),
        ])
    );
}

#[test]
fn test_query_rejects_delete() {
    let err = reader()
        .parsed_query_value(&RawValue::from(Sentinel::delete()), false)
        .unwrap_err();
    assert!(matches!(
        err,
        UserDataError::InvalidSentinelInQuery {
            sentinel: SentinelKind::Delete,
            ..
        }
    ));
}

#[test]
fn test_nested_arrays_rejected_in_writes() {
    let err = reader()
        .parsed_set_data(&raw(json!({"grid": [[1]]})))
        .unwrap_err();
    assert_eq!(err, UserDataError::NestedArray { path: Some(path("grid")) });
}

#[test]
fn test_overlapping_transforms() {
    let input = with(vec![
        ("a", Sentinel::server_timestamp().into()),
        ("a.b", Sentinel::increment(1).into()),
    ]);

    let err = reader().parsed_update_data(&input).unwrap_err();
    assert_eq!(
        err,
        UserDataError::TransformOverlap {
            path: path("a.b"),
            other: path("a"),
        }
    );
}

#[test]
fn test_update_key_conflict_reported_before_later_values() {
    let input = with(vec![
        ("a", RawValue::from(1)),
        ("a.b", RawValue::from(2)),
        ("c", RawValue::from(HostValue::new("Widget"))),
    ]);

    assert_eq!(
        reader().parsed_update_data(&input).unwrap_err(),
        UserDataError::ConflictingFieldPaths {
            path: path("a.b"),
            other: path("a"),
        }
    );
}

#[test]
fn test_deserialized_scalars_are_validated() {
    let stamp: Timestamp =
        serde_json::from_str(r#"{"seconds":1600000000,"nanos":123456000}"#).unwrap();
    let point: GeoPoint = serde_json::from_str(r#"{"latitude":48.1,"longitude":11.6}"#).unwrap();
    let input = with(vec![("at", stamp.into()), ("where", point.into())]);

    let parsed = reader().parsed_set_data(&input).unwrap();
    assert_eq!(parsed.data().get(&path("at")), Some(&FieldValue::Timestamp(stamp)));
    assert_eq!(parsed.data().get(&path("where")), Some(&FieldValue::GeoPoint(point)));

    assert!(
        serde_json::from_str::<Timestamp>(r#"{"seconds":999999999999999,"nanos":-7}"#).is_err()
    );
    assert!(
        serde_json::from_str::<GeoPoint>(r#"{"latitude":500.0,"longitude":-999.0}"#).is_err()
    );
}

#[test]
fn test_transforms_in_set() {
    let input = with(vec![
        ("count", Sentinel::increment(2).into()),
        (
            "tags",
            Sentinel::array_union([RawValue::from("a"), RawValue::from(json!({"k": 1}))]).into(),
        ),
        ("old", Sentinel::array_remove([RawValue::from(3)]).into()),
        ("nested", with(vec![("at", Sentinel::server_timestamp().into())])),
        ("plain", RawValue::from("v")),
    ]);

    let parsed = reader().parsed_set_data(&input).unwrap();
    let operations: Vec<(String, TransformOperation)> = parsed
        .field_transforms()
        .iter()
        .map(|t| (t.path.to_string(), t.operation.clone()))
        .collect();

    let mut element = ObjectValue::new();
    element.insert("k", FieldValue::Integer(1));
    assert_eq!(
        operations,
        vec![
            ("count".to_string(), TransformOperation::Increment(Number::Integer(2))),
            (
                "tags".to_string(),
                TransformOperation::ArrayUnion(vec![
                    FieldValue::String("a".into()),
                    FieldValue::Map(element),
                ])
            ),
            (
                "old".to_string(),
                TransformOperation::ArrayRemove(vec![FieldValue::Integer(3)])
            ),
            ("nested.at".to_string(), TransformOperation::ServerTimestamp),
        ]
    );

    // Only the plain value and the now-empty parent remain.
    assert_eq!(parsed.data().get(&path("plain")), Some(&FieldValue::String("v".into())));
    assert_eq!(parsed.data().get(&path("nested")), Some(&FieldValue::Map(ObjectValue::new())));
    assert!(parsed.field_mask().is_none());
}

#[test]
fn test_sentinel_inside_array() {
    let input = with(vec![(
        "list",
        RawValue::array([RawValue::from(Sentinel::server_timestamp())]),
    )]);

    let err = reader().parsed_set_data(&input).unwrap_err();
    assert!(matches!(
        err,
        UserDataError::InvalidSentinelNesting {
            sentinel: SentinelKind::ServerTimestamp,
            ..
        }
    ));
    assert!(err.to_string().ends_with("(found in field list)"));
}

#[test]
fn test_reserved_field_names() {
    let input = raw(json!({"__name__": 1}));
    assert!(matches!(
        reader().parsed_set_data(&input),
        Err(UserDataError::InvalidPath { .. })
    ));
    assert!(reader().parsed_query_value(&input, false).is_ok());
}

#[test]
fn test_invalid_update_key() {
    for key in ["a..b", "a~b", "", "a.`b"] {
        let input = RawValue::map([(key, RawValue::from(1))]);
        assert!(
            matches!(
                reader().parsed_update_data(&input),
                Err(UserDataError::InvalidPath { .. })
            ),
            "key {key:?} should be rejected"
        );
    }
}

#[test]
fn test_update_with_quoted_segment() {
    let parsed = reader()
        .parsed_update_data(&raw(json!({"a.`b.c`": true})))
        .unwrap();
    let expected = FieldPath::from_segments(["a", "b.c"]).unwrap();
    assert!(parsed.field_mask().contains(&expected));
    assert_eq!(parsed.data().get(&expected), Some(&FieldValue::Boolean(true)));
}

#[test]
fn test_error_codes_are_stable() {
    let err = reader()
        .parsed_set_data(&RawValue::from("not a map"))
        .unwrap_err();
    assert_eq!(err.error_code().code_str(), "UD0060");
    assert_eq!(
        err.to_string(),
        "Data passed to set() must be a map, found string"
    );
}
