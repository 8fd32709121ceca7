//! Retention windows under arbitrary save sequences.
//!
//! Backup and snapshot trails prune oldest-first to their configured caps;
//! the newest artifacts always survive, and pruning one dataset's trail
//! never touches a neighbor's.

use innledger_types::{Collection, DatasetKind, Record, Tenant};
use innledger_vault::{NoBackoff, Vault, VaultConfig};
use proptest::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn vault_with_caps(stamped: usize, snapshots: usize) -> (TempDir, Vault) {
    let dir = TempDir::new().expect("create tempdir");
    let mut config = VaultConfig::rooted_at(dir.path().join("data"));
    config.timestamped_backups = stamped;
    config.emergency_snapshots = snapshots;
    let vault = Vault::open_with_backoff(config, Box::new(NoBackoff)).expect("open vault");
    (dir, vault)
}

fn sale(n: usize) -> Collection {
    Collection::Records(vec![Record::from_map(
        json!({"id": format!("s{n}"), "amount": n})
            .as_object()
            .expect("object")
            .clone(),
    )])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn windows_hold_for_any_cap_and_save_count(cap in 1usize..5, extra in 1usize..4) {
        let (_dir, vault) = vault_with_caps(cap, cap + 1);
        let t = Tenant::new("hotel1").expect("tenant");
        let k = DatasetKind::Sales;

        // The first save finds no primary to back up, so cap + extra + 1
        // saves produce cap + extra backup generations.
        for n in 0..(cap + extra + 1) {
            vault.save(&t, k, &sale(n)).expect("save");
        }

        let stamped = vault.layout().timestamped_backups(&t, k).expect("scan");
        prop_assert_eq!(stamped.len(), cap);
        let snaps = vault.layout().emergency_snapshots(&t, k).expect("scan");
        prop_assert_eq!(snaps.len(), cap + 1);

        // Oldest-first deletion: the survivors are the last `cap`
        // generations, in order.
        let newest = std::fs::read_to_string(stamped.last().expect("newest"))
            .expect("read newest");
        let tag = format!("s{}", cap + extra - 1);
        prop_assert!(newest.contains(&tag), "newest backup: {}", newest);

        let oldest = std::fs::read_to_string(stamped.first().expect("oldest"))
            .expect("read oldest");
        let tag = format!("s{extra}");
        prop_assert!(oldest.contains(&tag), "oldest backup: {}", oldest);
    }
}

#[test]
fn pruning_is_scoped_to_one_dataset_and_tenant() {
    let (_dir, vault) = vault_with_caps(1, 1);
    let h1 = Tenant::new("hotel1").expect("tenant");
    let h2 = Tenant::new("hotel2").expect("tenant");

    // Three hotel1 sales generations overflow its window of one; the
    // neighboring trails each hold exactly one backup of their own.
    for n in 0..3 {
        vault.save(&h1, DatasetKind::Sales, &sale(n)).expect("save");
    }
    for n in 0..2 {
        vault.save(&h2, DatasetKind::Sales, &sale(n)).expect("save");
        vault
            .save(&h1, DatasetKind::Expenditures, &sale(n))
            .expect("save");
    }

    let layout = vault.layout();
    let h1_sales = layout
        .timestamped_backups(&h1, DatasetKind::Sales)
        .expect("scan");
    assert_eq!(h1_sales.len(), 1);
    // The survivor is the newest generation's predecessor.
    let content = std::fs::read_to_string(&h1_sales[0]).expect("read");
    assert!(content.contains("s1"), "survivor: {content}");

    assert_eq!(
        layout
            .timestamped_backups(&h2, DatasetKind::Sales)
            .expect("scan")
            .len(),
        1
    );
    assert_eq!(
        layout
            .timestamped_backups(&h1, DatasetKind::Expenditures)
            .expect("scan")
            .len(),
        1
    );
    assert_eq!(
        layout
            .emergency_snapshots(&h1, DatasetKind::Sales)
            .expect("scan")
            .len(),
        1
    );
}
