use super::*;
use crate::error::BuildError;
use crate::record;
use crate::types::{RowValues, SortOrder};

fn placeholder_count(stmt: &Statement) -> usize {
    stmt.sql().matches('?').count()
}

#[test]
fn insert_aligns_columns_and_args() {
    let payload = record! { "name" => "a", "qty" => 1, "note" => RowValues::Null };
    let stmt = build_insert("items", &payload).unwrap();
    assert_eq!(
        stmt.sql(),
        "INSERT INTO items (name, qty, note) VALUES (?, ?, ?)"
    );
    assert_eq!(placeholder_count(&stmt), payload.len());
    for (i, column) in payload.keys().enumerate() {
        assert_eq!(&stmt.args()[i], payload.get(column).unwrap());
    }
}

#[test]
fn insert_rejects_empty_payload() {
    let err = build_insert("items", &Record::new()).unwrap_err();
    assert!(matches!(err, BuildError::InvalidPayload(_)));
}

#[test]
fn insert_rejects_sort_order_value() {
    let payload = record! { "name" => SortOrder::Asc };
    let err = build_insert("items", &payload).unwrap_err();
    assert!(matches!(err, BuildError::UnbindableValue { ref field, .. } if field == "name"));
}

#[test]
fn null_filter_uses_is_comparison() {
    let filter = record! { "deleted_at" => RowValues::Null, "id" => 4 };
    let stmt = build_delete("items", &filter, GlueOperator::And).unwrap();
    assert_eq!(
        stmt.sql(),
        "DELETE FROM items WHERE deleted_at IS ? AND id = ?"
    );
    assert_eq!(stmt.args(), &[RowValues::Null, RowValues::Int(4)]);
}

#[test]
fn update_puts_payload_args_before_filter_args() {
    let filter = record! { "id" => 1, "owner" => "bob" };
    let payload = record! { "qty" => 2 };
    let stmt = build_update("items", &filter, &payload, GlueOperator::Or).unwrap();
    assert_eq!(
        stmt.sql(),
        "UPDATE items SET qty = ? WHERE id = ? OR owner = ?"
    );
    assert_eq!(
        stmt.args(),
        &[
            RowValues::Int(2),
            RowValues::Int(1),
            RowValues::Text("bob".into())
        ]
    );
    assert_eq!(placeholder_count(&stmt), stmt.args().len());
}

#[test]
fn update_rejects_empty_payload() {
    let err = build_update("items", &record! { "id" => 1 }, &Record::new(), GlueOperator::And)
        .unwrap_err();
    assert!(matches!(err, BuildError::InvalidPayload(_)));
}

#[test]
fn empty_filter_keeps_where_for_writes_but_not_for_find() {
    let payload = record! { "qty" => 0 };
    let update = build_update("items", &Record::new(), &payload, GlueOperator::And).unwrap();
    assert!(update.sql().ends_with("WHERE"), "{}", update.sql());
    assert_eq!(update.args(), &[RowValues::Int(0)]);

    let delete = build_delete("items", &Record::new(), GlueOperator::And).unwrap();
    assert_eq!(delete.sql(), "DELETE FROM items WHERE");
    assert!(delete.args().is_empty());

    let find = build_find(
        "items",
        &Record::new(),
        &Record::order_by("id", SortOrder::Desc),
        GlueOperator::And,
    )
    .unwrap();
    assert_eq!(find.sql(), "SELECT * FROM items ORDER BY id DESC");
    assert!(!find.sql().contains("WHERE"));
}

#[test]
fn unfiltered_writes_have_no_where() {
    let update = build_update_unfiltered("items", &record! { "qty" => 0 }).unwrap();
    assert_eq!(update.sql(), "UPDATE items SET qty = ?");
    assert_eq!(build_delete_unfiltered("items").sql(), "DELETE FROM items");
}

#[test]
fn find_with_filter_and_multiple_orders() {
    let filter = record! { "enabled" => 1, "id" => 3 };
    let order = record! { "id" => SortOrder::Desc, "name" => SortOrder::Asc };
    let stmt = build_find("demo", &filter, &order, GlueOperator::Or).unwrap();
    assert_eq!(
        stmt.sql(),
        "SELECT * FROM demo WHERE enabled = ? OR id = ? ORDER BY id DESC, name ASC"
    );
    assert_eq!(stmt.args(), &[RowValues::Int(1), RowValues::Int(3)]);
}

#[test]
fn find_without_order_has_no_order_by() {
    let stmt = build_find("demo", &Record::new(), &Record::new(), GlueOperator::And).unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM demo");
}

#[test]
fn find_rejects_non_order_values_in_order_by() {
    let order = record! { "id" => "desc" };
    let err = build_find("demo", &Record::new(), &order, GlueOperator::And).unwrap_err();
    assert_eq!(err, BuildError::InvalidOrderBy("id".into()));
}

#[test]
fn first_limits_to_one_row() {
    let stmt = build_first("demo", &record! { "id" => 9 }, GlueOperator::And).unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM demo WHERE id = ? LIMIT 1");
    let probe = build_select("demo", &record! { "id" => 9 }, GlueOperator::And, 2).unwrap();
    assert_eq!(probe.sql(), "SELECT * FROM demo WHERE id = ? LIMIT 2");
}

#[test]
fn bulk_insert_emits_one_tuple_per_payload() {
    let payloads = vec![
        record! { "message" => "one", "enabled" => 1 },
        record! { "enabled" => 0, "message" => "two" },
    ];
    let stmt = build_bulk_insert("demo", &payloads).unwrap();
    assert_eq!(
        stmt.sql(),
        "INSERT INTO demo (message, enabled) VALUES (?, ?), (?, ?)"
    );
    assert_eq!(
        stmt.args(),
        &[
            RowValues::Text("one".into()),
            RowValues::Int(1),
            RowValues::Text("two".into()),
            RowValues::Int(0),
        ]
    );
    assert_eq!(placeholder_count(&stmt), 4);
}

#[test]
fn bulk_insert_rejects_differing_key_sets() {
    let payloads = vec![
        record! { "message" => "one", "enabled" => 1 },
        record! { "message" => "two" },
    ];
    let err = build_bulk_insert("demo", &payloads).unwrap_err();
    assert!(matches!(err, BuildError::MismatchedPayload { index: 1, .. }));

    let payloads = vec![record! { "a" => 1 }, record! { "b" => 1 }];
    assert!(build_bulk_insert("demo", &payloads).is_err());
}

#[test]
fn bulk_insert_rejects_empty_input() {
    assert!(matches!(
        build_bulk_insert("demo", &[]).unwrap_err(),
        BuildError::InvalidPayload(_)
    ));
    assert!(matches!(
        build_bulk_insert("demo", &[Record::new()]).unwrap_err(),
        BuildError::InvalidPayload(_)
    ));
}

#[test]
fn values_never_reach_sql_text() {
    let hostile = "x'; DROP TABLE items; --";
    let stmt = build_update(
        "items",
        &record! { "name" => hostile },
        &record! { "note" => hostile },
        GlueOperator::And,
    )
    .unwrap();
    assert!(!stmt.sql().contains("DROP"));
    assert_eq!(stmt.args().len(), 2);
}

#[test]
fn glue_from_flag() {
    assert_eq!(GlueOperator::from_or(true), GlueOperator::Or);
    assert_eq!(GlueOperator::from_or(false), GlueOperator::And);
    assert_eq!(GlueOperator::default(), GlueOperator::And);
}
