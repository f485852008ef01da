mod common;

use common::seeded_collection;
use lutra::{doc, ErrorKind, Value};

#[test]
fn test_update_one_set() {
    let (_client, coll) = seeded_collection("updatedb", "set_one");
    let result = coll
        .update_one(&doc! { count: 3 }, &doc! { "$set": { countStr: "three" } }, false)
        .unwrap();
    assert_eq!(result.matched_count(), 1);
    assert_eq!(result.modified_count(), 1);
    assert!(result.upserted_id().is_none());

    let updated = coll.find_one(&doc! { count: 3 }).unwrap().unwrap();
    assert_eq!(updated.get("countStr"), Some(&Value::String("three".into())));
}

#[test]
fn test_update_adds_new_field() {
    let (_client, coll) = seeded_collection("updatedb", "new_field");
    assert_eq!(
        coll.find(&doc! { countStr2: "500" }).unwrap().count().unwrap(),
        0
    );

    let result = coll
        .update_one(
            &doc! { count: { "$eq": 50 } },
            &doc! { "$set": { countStr2: "500" } },
            false,
        )
        .unwrap();
    assert_eq!(result.modified_count(), 1);
    assert_eq!(
        coll.find(&doc! { countStr2: "500" }).unwrap().count().unwrap(),
        1
    );
}

#[test]
fn test_update_many_inc() {
    let (_client, coll) = seeded_collection("updatedb", "inc_many");
    let result = coll
        .update_many(
            &doc! { count: { "$gte": 50 } },
            &doc! { "$inc": { count: 100 } },
            false,
        )
        .unwrap();
    assert_eq!(result.matched_count(), 50);
    assert_eq!(result.modified_count(), 50);
    assert_eq!(
        coll.find(&doc! { count: { "$gt": 100 } }).unwrap().count().unwrap(),
        50
    );
}

#[test]
fn test_update_zero_matches_is_not_an_error() {
    let (_client, coll) = seeded_collection("updatedb", "zero");
    let result = coll
        .update_one(
            &doc! { count: { "$eq": 100 } },
            &doc! { "$set": { countStr: "500" } },
            false,
        )
        .unwrap();
    assert_eq!(result.matched_count(), 0);
    assert_eq!(result.modified_count(), 0);
    assert!(result.upserted_id().is_none());
    assert_eq!(
        coll.find(&doc! { countStr: "500" }).unwrap().count().unwrap(),
        0
    );
}

#[test]
fn test_upsert_inserts_and_reports_id() {
    let (_client, coll) = seeded_collection("updatedb", "upsert");
    let result = coll
        .update_one(
            &doc! { count: { "$eq": 100 } },
            &doc! { "$set": { countStr: "500" } },
            true,
        )
        .unwrap();
    assert_eq!(result.matched_count(), 0);
    assert!(result.upserted_id().is_some());
    assert_eq!(coll.count().unwrap(), 101);

    let upserted = coll.find_one(&doc! { countStr: "500" }).unwrap().unwrap();
    assert_eq!(upserted.get("count"), Some(&Value::Int(100)));

    // the same call against the now-existing match modifies instead
    let result = coll
        .update_one(
            &doc! { count: { "$eq": 100 } },
            &doc! { "$set": { countStr: "501" } },
            true,
        )
        .unwrap();
    assert_eq!(result.matched_count(), 1);
    assert_eq!(result.modified_count(), 1);
    assert!(result.upserted_id().is_none());
    assert_eq!(coll.count().unwrap(), 101);
}

#[test]
fn test_noop_update_counts() {
    let (_client, coll) = seeded_collection("updatedb", "noop");
    let result = coll
        .update_many(&doc! { count: 7 }, &doc! { "$set": { count: 7 } }, false)
        .unwrap();
    assert_eq!(result.matched_count(), 1);
    assert_eq!(result.modified_count(), 0);
}

#[test]
fn test_invalid_update_fails_whole_call() {
    let (_client, coll) = seeded_collection("updatedb", "invalid");
    let err = coll
        .update_many(&doc! {}, &doc! { "$rename": { a: "b" } }, false)
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidUpdate);
    // nothing was touched
    assert_eq!(coll.find(&doc! { count: 0 }).unwrap().count().unwrap(), 1);
}

#[test]
fn test_inc_type_mismatch_skips_only_that_document() {
    let (_client, coll) = seeded_collection("updatedb", "mismatch");
    // countStr is a string everywhere; $inc matches all but modifies none
    let result = coll
        .update_many(&doc! {}, &doc! { "$inc": { countStr: 1 } }, false)
        .unwrap();
    assert_eq!(result.matched_count(), 100);
    assert_eq!(result.modified_count(), 0);
}

#[test]
fn test_delete_one_decrements_matches_by_exactly_one() {
    let (_client, coll) = seeded_collection("updatedb", "del_one");
    let before = coll
        .find(&doc! { countBool: true })
        .unwrap()
        .count()
        .unwrap();
    assert_eq!(before, 50);

    let result = coll.delete_one(&doc! { countBool: true }).unwrap();
    assert_eq!(result.deleted_count(), 1);
    assert_eq!(
        coll.find(&doc! { countBool: true }).unwrap().count().unwrap(),
        before - 1
    );
    assert_eq!(coll.count().unwrap(), 99);
}

#[test]
fn test_delete_one_with_no_matches_reports_zero() {
    let (_client, coll) = seeded_collection("updatedb", "del_zero");
    coll.delete_many(&doc! { count: { "$lt": 100 } }).unwrap();

    let result = coll.delete_one(&doc! { count: { "$lt": 100 } }).unwrap();
    assert_eq!(result.deleted_count(), 0);
}

#[test]
fn test_delete_many_with_filter() {
    let (_client, coll) = seeded_collection("updatedb", "del_many");
    let result = coll.delete_many(&doc! { count: { "$gte": 50 } }).unwrap();
    assert_eq!(result.deleted_count(), 50);
    assert_eq!(coll.count().unwrap(), 50);
}

#[test]
fn test_delete_all() {
    let (_client, coll) = seeded_collection("updatedb", "del_all");
    let result = coll.delete_many(&doc! {}).unwrap();
    assert_eq!(result.deleted_count(), 100);
    assert_eq!(coll.count().unwrap(), 0);
}

#[test]
fn test_update_at_path_preserves_siblings() {
    let (_client, coll) = seeded_collection("updatedb", "path");
    let result = coll
        .update_one(
            &doc! { count: 5 },
            &doc! { "$set": { "countDict.three": false } },
            false,
        )
        .unwrap();
    assert_eq!(result.modified_count(), 1);

    let updated = coll.find_one(&doc! { count: 5 }).unwrap().unwrap();
    assert_eq!(updated.get("countDict.three"), Some(&Value::Bool(false)));
    // the sibling keys of the nested document survive
    assert_eq!(updated.get("countDict.odd"), Some(&Value::Bool(true)));
}
