mod common;

use common::seeded_collection;
use lutra::{doc, to_aggregate, Client, ErrorKind, Value};

#[test]
fn test_match_literal_golden() {
    let rendered = to_aggregate(&[doc! { "$match": { size: "medium" } }]).unwrap();
    assert_eq!(rendered, "$aggregate: {$match: {\"size\": {$eq: #0}}}");
}

#[test]
fn test_second_literal_gets_next_ordinal() {
    let rendered = to_aggregate(&[doc! {
        "$match": { size: "medium", count: { "$gte": 2 } }
    }])
    .unwrap();
    assert_eq!(
        rendered,
        "$aggregate: {$match: {$and: [\"size\": {$eq: #0}, \"count\": {$gte: #1}]}}"
    );
}

#[test]
fn test_interning_is_scoped_per_call() {
    // back-to-back compiles restart the ordinal counter, so the output is
    // byte-identical every time
    let pipeline = [
        doc! { "$match": { size: "small" } },
        doc! { "$sort": { count: (-1) } },
    ];
    let first = to_aggregate(&pipeline).unwrap();
    let second = to_aggregate(&pipeline).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first,
        "$aggregate: {$match: {\"size\": {$eq: #0}}, $sort: {count: -1}}"
    );
}

#[test]
fn test_interning_spans_stages_in_pipeline_order() {
    let rendered = to_aggregate(&[
        doc! { "$match": { size: "medium" } },
        doc! { "$group": { "_id": "$name", total: { "$multiply": ["$price", 10] } } },
    ])
    .unwrap();
    assert_eq!(
        rendered,
        "$aggregate: {$match: {\"size\": {$eq: #0}}, \
         $group: {_id: \"$name\", total: {$multiply: [\"$price\", #1]}}}"
    );
}

#[test]
fn test_field_references_render_verbatim() {
    let rendered = to_aggregate(&[doc! {
        "$group": { "_id": "$name", avg: { "$avg": "$count" } }
    }])
    .unwrap();
    assert_eq!(
        rendered,
        "$aggregate: {$group: {_id: \"$name\", avg: {$avg: \"$count\"}}}"
    );
}

#[test]
fn test_sort_directions_in_declared_order() {
    let rendered =
        to_aggregate(&[doc! { "$sort": { name: 1, count: (-1) } }]).unwrap();
    assert_eq!(rendered, "$aggregate: {$sort: {name: 1, count: -1}}");
}

#[test]
fn test_malformed_pipeline_fails_whole_call() {
    let err = to_aggregate(&[
        doc! { "$match": { size: "medium" } },
        doc! { "$unwind": "$tags" },
    ])
    .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ParseError);
}

#[test]
fn test_aggregate_match_executes_like_find() {
    let (_client, coll) = seeded_collection("aggdb", "match");

    let pipeline = [doc! { "$match": { count: { "$gte": 10, "$lt": 20 } } }];
    let via_pipeline = coll.aggregate(&pipeline).unwrap().count().unwrap();
    let via_find = coll
        .find(&doc! { count: { "$gte": 10, "$lt": 20 } })
        .unwrap()
        .count()
        .unwrap();
    assert_eq!(via_pipeline, 10);
    assert_eq!(via_pipeline, via_find);
}

#[test]
fn test_aggregate_match_group_sort() {
    let client = Client::new(None).unwrap();
    let coll = client.database("aggdb").collection("sales").unwrap();
    coll.insert_many(vec![
        doc! { name: "apple", price: 2, quantity: 3 },
        doc! { name: "pear", price: 5, quantity: 2 },
        doc! { name: "apple", price: 2, quantity: 1 },
        doc! { name: "plum", price: 2, quantity: 10 },
    ])
    .unwrap();

    let mut cursor = coll
        .aggregate(&[
            doc! { "$match": { quantity: { "$gte": 2 } } },
            doc! { "$group": {
                "_id": "$name",
                revenue: { "$sum": { "$multiply": ["$price", "$quantity"] } },
            } },
            doc! { "$sort": { revenue: (-1) } },
        ])
        .unwrap();

    // the quantity-1 apple row is filtered out before grouping
    assert_eq!(cursor.count().unwrap(), 3);
    let top = cursor.try_next().unwrap().unwrap();
    assert_eq!(top.get("_id"), Some(&Value::String("plum".into())));
    assert_eq!(top.get("revenue"), Some(&Value::Int(20)));
    let next = cursor.try_next().unwrap().unwrap();
    assert_eq!(next.get("_id"), Some(&Value::String("pear".into())));
    assert_eq!(next.get("revenue"), Some(&Value::Int(10)));
}

#[test]
fn test_aggregate_on_empty_pipeline_returns_everything() {
    let (_client, coll) = seeded_collection("aggdb", "empty");
    let cursor = coll.aggregate(&[]).unwrap();
    assert_eq!(cursor.count().unwrap(), 100);
}

#[test]
fn test_aggregate_group_count_accumulator() {
    let (_client, coll) = seeded_collection("aggdb", "countacc");
    let mut cursor = coll
        .aggregate(&[
            doc! { "$group": { "_id": "$countBool", n: { "$count": 1 } } },
            doc! { "$sort": { "_id": 1 } },
        ])
        .unwrap();
    assert_eq!(cursor.count().unwrap(), 2);
    let falses = cursor.try_next().unwrap().unwrap();
    assert_eq!(falses.get("n"), Some(&Value::Int(50)));
}
