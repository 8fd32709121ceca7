//! The facade from the operator's seat: bootstrap a store, run a day of
//! bookings through it, close out the books, and come back after a restart
//! or a damaged disk to find everything still there.

use std::sync::Arc;

use innledger::{
    Collection, DatasetKind, Gatekeeper, Ledger, Record, Tenant, Vault, VaultConfig,
};
use serde_json::json;
use tempfile::TempDir;

fn open_ledger(dir: &TempDir) -> Ledger {
    let config = VaultConfig::rooted_at(dir.path().join("data"));
    Ledger::open(config).expect("open ledger")
}

fn tenant(id: &str) -> Tenant {
    Tenant::new(id).expect("tenant")
}

fn record(value: serde_json::Value) -> Record {
    Record::from_map(value.as_object().expect("object").clone())
}

// ─── A Full Day ─────────────────────────────────────────────────────────

#[test]
fn bootstrap_checkin_and_close_out() {
    let dir = TempDir::new().expect("tempdir");
    let ledger = open_ledger(&dir);
    let t = tenant("hotel1");

    // Two tenants, twelve datasets each.
    let summary = ledger.bootstrap().expect("bootstrap");
    assert_eq!(summary.seeded, 24);
    assert_eq!(summary.unrecoverable, 0);

    // The front desk signs in with the per-tenant staff account.
    let gate = Gatekeeper::with_defaults(ledger.tenants());
    let decision = gate.verify("hotel1_staff", "hotel1@staff");
    assert!(decision.permits(&t));

    // A guest checks into 101.
    let mut rooms = ledger.load(DatasetKind::Rooms, &t);
    {
        let map = rooms.as_rooms_mut().expect("rooms map");
        let room = map.get_mut("101").expect("room 101");
        room.status = "Occupied".to_owned();
        room.current_guest = Some("A. Guest".to_owned());
        room.checkin_date = Some("2025-08-25".to_owned());
    }
    assert!(ledger.save(DatasetKind::Rooms, &t, &rooms));

    // The day's money movements.
    assert!(ledger.add_record(
        DatasetKind::Sales,
        &t,
        record(json!({"date": "2025-08-25", "amount": 2000, "payment_type": "Cash",
                      "status": "Completed", "room_number": "101"})),
    ));
    assert!(ledger.add_record(
        DatasetKind::Sales,
        &t,
        record(json!({"date": "2025-08-25", "amount": 450, "payment_type": "Account",
                      "status": "Pending"})),
    ));
    assert!(ledger.add_record(
        DatasetKind::Expenditures,
        &t,
        record(json!({"date": "2025-08-25", "amount": 320, "description": "laundry"})),
    ));

    assert!((ledger.total_sales(&t) - 2450.0).abs() < 1e-9);
    assert!((ledger.total_expenditures(&t) - 320.0).abs() < 1e-9);
    assert!((ledger.pending_dues(&t) - 450.0).abs() < 1e-9);

    let today = ledger.records_in_range(DatasetKind::Sales, &t, "2025-08-25", "2025-08-25");
    assert_eq!(today.len(), 2);

    // A later session over the same directory sees the same books.
    let next = open_ledger(&dir);
    assert_eq!(next.bootstrap().expect("re-bootstrap").seeded, 0);
    let rooms = next.load(DatasetKind::Rooms, &t);
    let room = &rooms.as_rooms().expect("rooms map")["101"];
    assert_eq!(room.status, "Occupied");
    assert_eq!(room.current_guest.as_deref(), Some("A. Guest"));
    assert!((next.total_sales(&t) - 2450.0).abs() < 1e-9);
}

#[test]
fn staff_scope_guards_cross_tenant_access() {
    let dir = TempDir::new().expect("tempdir");
    let ledger = open_ledger(&dir);
    ledger.bootstrap().expect("bootstrap");
    let gate = Gatekeeper::with_defaults(ledger.tenants());

    let staff = gate.verify("hotel2_staff", "hotel2@staff");
    let reachable: Vec<_> = ledger.tenants().iter().filter(|t| staff.permits(t)).collect();
    assert_eq!(reachable.len(), 1);
    assert_eq!(reachable[0].as_str(), "hotel2");

    // A failed sign-in reaches nothing.
    let denied = gate.verify("hotel2_staff", "wrong");
    assert!(ledger.tenants().iter().all(|t| !denied.permits(t)));
}

// ─── Back-Dated Entries ─────────────────────────────────────────────────

#[test]
fn advance_settlement_survives_a_restart() {
    let dir = TempDir::new().expect("tempdir");
    let t = tenant("hotel2");
    {
        let ledger = open_ledger(&dir);
        ledger.bootstrap().expect("bootstrap");
        assert!(ledger.record_historical_advance_payment(
            &t,
            record(json!({"id": "adv9", "date": "2025-07-01", "amount": 1500,
                          "guest_name": "B. Guest", "status": "Pending"})),
        ));
        assert!(ledger.record_historical_sale(
            &t,
            record(json!({"date": "2025-07-15", "amount": 1500, "payment_type": "Cash",
                          "source": "advance_payment", "source_id": "adv9"})),
        ));
    }

    // New process, same books: the settlement is on disk, not in memory.
    let ledger = open_ledger(&dir);
    let advances = ledger.load(DatasetKind::AdvancePayments, &t);
    let adv = advances
        .as_records()
        .expect("records")
        .iter()
        .find(|r| r.id() == Some("adv9"))
        .expect("settled advance");
    assert_eq!(adv.str_field("status"), Some("Completed"));
    assert_eq!(adv.str_field("completion_date"), Some("2025-07-15 00:00:00"));
    assert_eq!(ledger.load(DatasetKind::Sales, &t).len(), 1);
}

// ─── Damage Between Sessions ────────────────────────────────────────────

#[test]
fn plain_loads_answer_through_disk_damage() {
    let dir = TempDir::new().expect("tempdir");
    let t = tenant("hotel1");
    {
        let ledger = open_ledger(&dir);
        ledger.bootstrap().expect("bootstrap");
        assert!(ledger.add_record(
            DatasetKind::Sales,
            &t,
            record(json!({"id": "keep", "date": "2025-08-25", "amount": 900})),
        ));
    }

    // Something scribbles over the primary while nothing is running.
    let ledger = open_ledger(&dir);
    let primary = ledger.vault().layout().primary(&t, DatasetKind::Sales);
    std::fs::write(&primary, b"<<not json>>").expect("corrupt primary");

    let sales = ledger.load(DatasetKind::Sales, &t);
    let records = sales.as_records().expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id(), Some("keep"));

    // Healed on disk for the next reader, not just in the returned value.
    let on_disk = std::fs::read_to_string(&primary).expect("read back");
    assert!(on_disk.contains("keep"), "primary restored: {on_disk}");
}

// ─── Shared Vault ───────────────────────────────────────────────────────

#[test]
fn with_vault_shares_one_store() {
    let dir = TempDir::new().expect("tempdir");
    let config = VaultConfig::rooted_at(dir.path().join("data"));
    let vault = Arc::new(Vault::open(config).expect("open vault"));
    let ledger = Ledger::with_vault(Arc::clone(&vault));
    let t = tenant("hotel1");

    assert!(ledger.add_record(
        DatasetKind::Sales,
        &t,
        record(json!({"id": "shared", "date": "2025-08-25", "amount": 5})),
    ));

    // The same bytes are visible through the bare vault handle.
    let direct = vault.load(&t, DatasetKind::Sales);
    assert_eq!(direct.as_records().expect("records")[0].id(), Some("shared"));
    assert!(matches!(direct, Collection::Records(_)));
}
