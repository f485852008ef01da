mod common;

use common::seeded_collection;
use lutra::{doc, Client, ErrorKind, Value};

fn count_of(doc: &lutra::Document) -> i64 {
    doc.get("count").and_then(|v| v.as_int()).unwrap()
}

#[test]
fn test_insert_then_select() {
    let client = Client::new(None).unwrap();

    let result = client
        .execute("INSERT INTO sqldb.items (name, count) VALUES ('apple', 3), ('pear', 7);")
        .unwrap();
    assert_eq!(result.inserted_count, 2);
    assert!(result.cursor.is_none());

    let result = client.execute("SELECT * FROM sqldb.items;").unwrap();
    assert_eq!(result.cursor.unwrap().count().unwrap(), 2);
}

#[test]
fn test_select_where_matches_native_find() {
    let (client, coll) = seeded_collection("sqldb", "parity");

    let via_sql = client
        .execute("SELECT * FROM sqldb.parity WHERE count >= 10 AND count < 20")
        .unwrap()
        .cursor
        .unwrap()
        .count()
        .unwrap();
    let via_find = coll
        .find(&doc! { count: { "$gte": 10, "$lt": 20 } })
        .unwrap()
        .count()
        .unwrap();
    assert_eq!(via_sql, 10);
    assert_eq!(via_sql, via_find);
}

#[test]
fn test_select_without_where_matches_everything() {
    let (client, _coll) = seeded_collection("sqldb", "all");
    let result = client.execute("SELECT * FROM sqldb.all").unwrap();
    assert_eq!(result.cursor.unwrap().count().unwrap(), 100);
}

#[test]
fn test_select_order_by() {
    let (client, _coll) = seeded_collection("sqldb", "ordered");

    let cursor = client
        .execute("SELECT * FROM sqldb.ordered WHERE count < 10 ORDER BY count DESC")
        .unwrap()
        .cursor
        .unwrap();
    assert_eq!(count_of(&cursor.at(0).unwrap()), 9);
    assert_eq!(count_of(&cursor.at(9).unwrap()), 0);
}

#[test]
fn test_select_or_and_parentheses() {
    let (client, _coll) = seeded_collection("sqldb", "logic");
    let cursor = client
        .execute("SELECT * FROM sqldb.logic WHERE (count < 5) OR (count >= 95)")
        .unwrap()
        .cursor
        .unwrap();
    assert_eq!(cursor.count().unwrap(), 10);
}

#[test]
fn test_select_like() {
    let (client, _coll) = seeded_collection("sqldb", "like");
    // countStr LIKE '9%' matches 9 and 90..99
    let cursor = client
        .execute("SELECT * FROM sqldb.like WHERE countStr LIKE '9%'")
        .unwrap()
        .cursor
        .unwrap();
    assert_eq!(cursor.count().unwrap(), 11);
}

#[test]
fn test_update_reports_modified_count() {
    let (client, coll) = seeded_collection("sqldb", "upd");

    let result = client
        .execute("UPDATE sqldb.upd SET countStr = 'big' WHERE count >= 90")
        .unwrap();
    assert_eq!(result.modified_count, 10);
    assert_eq!(
        coll.find(&doc! { countStr: "big" }).unwrap().count().unwrap(),
        10
    );
}

#[test]
fn test_delete_reports_deleted_count() {
    let (client, coll) = seeded_collection("sqldb", "del");

    let result = client
        .execute("DELETE FROM sqldb.del WHERE count < 30")
        .unwrap();
    assert_eq!(result.deleted_count, 30);
    assert_eq!(coll.count().unwrap(), 70);

    // a second run has nothing left to delete
    let result = client
        .execute("DELETE FROM sqldb.del WHERE count < 30")
        .unwrap();
    assert_eq!(result.deleted_count, 0);
}

#[test]
fn test_not_condition() {
    let (client, _coll) = seeded_collection("sqldb", "not");
    let cursor = client
        .execute("SELECT * FROM sqldb.not WHERE NOT count < 90")
        .unwrap()
        .cursor
        .unwrap();
    assert_eq!(cursor.count().unwrap(), 10);
}

#[test]
fn test_parse_error_fails_before_mutation() {
    let (client, coll) = seeded_collection("sqldb", "bad");

    let err = client.execute("DELETE FROM sqldb.bad WHERE count <").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ParseError);
    assert_eq!(coll.count().unwrap(), 100);

    let err = client.execute("TRUNCATE sqldb.bad").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ParseError);
}

#[test]
fn test_sql_and_native_share_one_store() {
    let client = Client::new(None).unwrap();
    let coll = client.database("sqldb").collection("shared").unwrap();
    coll.insert_one(doc! { name: "native", count: 1 }).unwrap();

    client
        .execute("INSERT INTO sqldb.shared (name, count) VALUES ('sql', 2)")
        .unwrap();

    assert_eq!(coll.count().unwrap(), 2);
    let found = coll.find_one(&doc! { name: "sql" }).unwrap().unwrap();
    assert_eq!(found.get("count"), Some(&Value::Int(2)));
}
