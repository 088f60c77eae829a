use crate::{CancellationToken, EntityId, EngineError, Operation, RecordKey, TableId, TenantId, Version};

fn tt(t: &str, tb: &str) -> (TenantId, TableId) {
    (TenantId::new(t), TableId::new(tb))
}

#[test]
fn record_key_orders_by_tenant_then_table_then_entity() {
    let (t1, tb) = tt("acme", "orders");
    let (t2, _) = tt("zenith", "orders");
    let e = EntityId::from("e1");

    let k1 = RecordKey::new(&t1, &tb, &e, Version(1));
    let k2 = RecordKey::new(&t2, &tb, &e, Version(1));
    assert!(k1 < k2, "acme should sort before zenith");
}

#[test]
fn record_key_higher_version_sorts_first_within_entity() {
    let (t, tb) = tt("acme", "orders");
    let e = EntityId::from("e1");

    let v1 = RecordKey::new(&t, &tb, &e, Version(1));
    let v5 = RecordKey::new(&t, &tb, &e, Version(5));

    assert!(v5 < v1, "version 5 must sort before version 1 within the same entity");
    assert!(v1.same_entity(&v5));
    assert_eq!(v1.entity_id(), e);
    assert_eq!(v5.version(), Version(5));
}

#[test]
fn record_key_different_entities_are_not_same_entity() {
    let (t, tb) = tt("acme", "orders");
    let e1 = EntityId::from("e1");
    let e2 = EntityId::from("e2");
    let k1 = RecordKey::new(&t, &tb, &e1, Version(1));
    let k2 = RecordKey::new(&t, &tb, &e2, Version(1));
    assert!(!k1.same_entity(&k2));
}

#[test]
fn operation_wire_tag_roundtrips() {
    for op in [Operation::Insert, Operation::Update, Operation::Delete, Operation::Checkpoint] {
        assert_eq!(Operation::from_wire_tag(op.as_wire_tag()), Some(op));
    }
    assert_eq!(Operation::from_wire_tag(0), None);
    assert_eq!(Operation::from_wire_tag(5), None);
}

#[test]
fn cancellation_token_propagates_after_cancel() {
    let token = CancellationToken::new();
    assert!(token.check().is_ok());
    token.cancel();
    assert!(matches!(token.check(), Err(EngineError::Cancelled)));
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    clone.cancel();
    assert!(token.is_cancelled());
}

#[test]
fn error_classification_predicates() {
    assert!(EngineError::Unavailable("down".into()).is_retryable());
    assert!(EngineError::CapacityExceeded("full".into()).is_retryable());
    assert!(!EngineError::NotFound("x".into()).is_retryable());

    assert!(EngineError::corruption("crc").is_serious());
    assert!(EngineError::internal("bug").is_serious());
    assert!(!EngineError::conflict("dup").is_serious());
}
