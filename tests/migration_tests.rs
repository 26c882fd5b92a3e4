use probe_table::prime::is_prime;
use probe_table::{ProbeError, ProbePolicy, ProbeTable, Record, TableConfig, MAXPRIME, MINPRIME};

fn byte_hash(key: &str) -> u64 {
    key.bytes()
        .fold(0u64, |h, b| h.wrapping_mul(31).wrapping_add(b as u64))
}

fn small_table(size: usize, policy: ProbePolicy) -> ProbeTable {
    let config = TableConfig::new().with_prime_bounds(3, MAXPRIME);
    ProbeTable::with_config(size, byte_hash, policy, config).unwrap()
}

fn assert_capacity_ok(table: &ProbeTable) {
    let cfg = table.config();
    for cap in std::iter::once(table.capacity()).chain(table.old_capacity()) {
        assert!(is_prime(cap), "capacity {} is not prime", cap);
        assert!(cap >= cfg.min_prime && cap <= cfg.max_prime);
    }
}

#[test]
fn test_load_factor_starts_migration() {
    let mut table = small_table(7, ProbePolicy::Quadratic);
    assert_eq!(table.capacity(), 7);

    for i in 0..3 {
        assert!(table.insert(Record::new(format!("virus{}", i), 1000 + i)));
    }
    assert!(!table.is_migrating());

    assert!(table.insert(Record::new("virus3", 1003)));
    assert!(table.is_migrating());
    assert_eq!(table.old_capacity(), Some(7));
    assert_eq!(table.capacity(), 17);
    // One of four moved by the first step.
    assert_eq!(table.old_len(), Some(3));
    assert_eq!(table.len(), 4);
    assert_capacity_ok(&table);
}

#[test]
fn test_find_reaches_old_table() {
    let mut table = small_table(7, ProbePolicy::Quadratic);
    let records: Vec<Record> = (0..4)
        .map(|i| Record::new(format!("virus{}", i), 1000 + i))
        .collect();
    for record in &records {
        table.insert(record.clone());
    }
    assert_eq!(table.old_len(), Some(3));

    for record in &records {
        assert_eq!(table.find(&record.key, record.id), Some(record));
    }
    // Duplicate detection sees the old table too.
    for record in &records {
        assert!(!table.insert(record.clone()));
    }
    assert_eq!(table.len(), 4);
}

#[test]
fn test_old_table_released_after_drain() {
    let mut table = small_table(7, ProbePolicy::Quadratic);
    for i in 0..4 {
        table.insert(Record::new(format!("virus{}", i), 1000 + i));
    }

    // ceil(4 * 0.25) = 1 entry per step, 3 left after the first.
    let mut steps = 0;
    while table.is_migrating() {
        table.remove(&Record::new("missing", 9000));
        steps += 1;
        assert_capacity_ok(&table);
    }
    assert_eq!(steps, 3);
    assert_eq!(table.old_capacity(), None);
    assert_eq!(table.old_len(), None);
    assert_eq!(table.len(), 4);
    for i in 0..4 {
        assert!(table.find(&format!("virus{}", i), 1000 + i).is_some());
    }
    assert!(table.dump().ends_with("Dump for the old table:\n"));
}

#[test]
fn test_remove_does_not_reach_old_table() {
    let mut table = small_table(7, ProbePolicy::Quadratic);
    let records: Vec<Record> = (0..4)
        .map(|i| Record::new(format!("virus{}", i), 1000 + i))
        .collect();
    for record in &records {
        table.insert(record.clone());
    }

    let current_len = table.len() - table.old_len().unwrap_or(0);
    let migrated: Vec<Record> = table.iter().take(current_len).cloned().collect();
    assert_eq!(migrated.len(), 1);
    let waiting = records
        .iter()
        .find(|r| !migrated.contains(r))
        .unwrap()
        .clone();

    // The attempt fails but still advances the migration by one batch.
    assert!(!table.remove(&waiting));
    assert_eq!(table.old_len(), Some(2));
    assert_eq!(table.len(), 4);

    // The record that already moved can be removed.
    let moved = migrated[0].clone();
    assert!(table.remove(&moved));
    assert!(table.find(&moved.key, moved.id).is_none());
}

#[test]
fn test_pending_policy_waits_for_next_migration() {
    let mut table = small_table(7, ProbePolicy::Quadratic);
    table.insert(Record::new("virus0", 1000));
    table.set_probing_policy(ProbePolicy::DoubleHash);
    table.insert(Record::new("virus1", 1001));
    assert_eq!(table.policy(), ProbePolicy::Quadratic);

    table.insert(Record::new("virus2", 1002));
    table.insert(Record::new("virus3", 1003));
    assert!(table.is_migrating());
    assert_eq!(table.policy(), ProbePolicy::DoubleHash);
    assert_eq!(table.old_policy(), Some(ProbePolicy::Quadratic));

    // Asking again mid-flight leaves both tables alone.
    table.set_probing_policy(ProbePolicy::None);
    while table.is_migrating() {
        table.remove(&Record::new("missing", 9000));
    }
    assert_eq!(table.policy(), ProbePolicy::DoubleHash);
    assert_eq!(table.pending_policy(), Some(ProbePolicy::None));
    for i in 0..4 {
        assert!(table.find(&format!("virus{}", i), 1000 + i).is_some());
    }
}

#[test]
fn test_growth_keeps_every_record() {
    let mut table = ProbeTable::with_hasher(MINPRIME, byte_hash, ProbePolicy::DoubleHash);
    let total = 2_000;
    let mut max_old_len = 0;

    for i in 0..total {
        assert!(table.insert(Record::new(format!("sample-{}", i), 1000 + i)));
        max_old_len = max_old_len.max(table.old_len().unwrap_or(0));
        assert_capacity_ok(&table);
    }

    assert_eq!(table.len(), total as usize);
    assert!(max_old_len > 0, "inserting should have triggered migrations");
    for i in 0..total {
        assert!(
            table.find(&format!("sample-{}", i), 1000 + i).is_some(),
            "sample-{} missing",
            i
        );
    }
}

#[test]
fn test_migrations_bounded_work() {
    let mut table = ProbeTable::with_hasher(MINPRIME, byte_hash, ProbePolicy::Quadratic);
    let mut batch = 0;
    let mut migrations = 0;

    for i in 0..1_500 {
        let was_migrating = table.is_migrating();
        let before = table.old_len();
        table.insert(Record::new(format!("k{}", i), 1000 + i));

        match (was_migrating, before, table.old_len()) {
            (false, _, Some(after)) => {
                // Everything was live in the old table when it retired.
                migrations += 1;
                batch = (table.len() + 3) / 4;
                assert!(table.len() - after <= batch);
            }
            (true, Some(before), after) => {
                let moved = before - after.unwrap_or(0);
                assert!(moved <= batch, "moved {} with batch {}", moved, batch);
            }
            _ => {}
        }
    }
    assert!(migrations >= 3);
}

#[test]
fn test_capacity_ceiling_keeps_every_accepted_record() {
    for (max_prime, policy) in [
        (13, ProbePolicy::Quadratic),
        (31, ProbePolicy::Quadratic),
        (211, ProbePolicy::Quadratic),
        (11, ProbePolicy::DoubleHash),
        (101, ProbePolicy::DoubleHash),
    ] {
        let config = TableConfig::new().with_prime_bounds(3, max_prime);
        let mut table = ProbeTable::with_config(3, byte_hash, policy, config).unwrap();
        let limit = table.max_len();
        assert_eq!(limit, max_prime / 2);

        let mut accepted = Vec::new();
        for i in 0..(2 * max_prime as i32) {
            let record = Record::new(format!("strain-{}", i), 1000 + i);
            match table.try_insert(record.clone()) {
                Ok(()) => accepted.push(record),
                Err(err) => assert_eq!(err, ProbeError::TableFull { limit }),
            }
            assert_capacity_ok(&table);
        }
        assert_eq!(accepted.len(), limit, "max_prime {} {:?}", max_prime, policy);

        while table.is_migrating() {
            table.remove(&Record::new("missing", 9000));
        }
        assert_eq!(table.len(), accepted.len());
        for record in &accepted {
            assert_eq!(
                table.find(&record.key, record.id),
                Some(record),
                "max_prime {} {:?} lost {}",
                max_prime,
                policy,
                record
            );
        }

        // Room frees up again once something leaves.
        let gone = table.iter().next().cloned().unwrap();
        assert!(table.remove(&gone));
        assert!(table.insert(Record::new("late", 9999)));
        assert!(!table.insert(Record::new("later", 9998)));
    }
}
