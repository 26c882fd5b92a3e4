use probe_table::{ProbePolicy, ProbeTable, Record, TableConfig, MAXPRIME};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let config = TableConfig::new().with_prime_bounds(3, MAXPRIME);
    let mut table =
        ProbeTable::with_config(7, probe_table::default_hash, ProbePolicy::Quadratic, config)
            .expect("valid config");

    // Applies to the table built when the first migration starts.
    table.set_probing_policy(ProbePolicy::DoubleHash);

    println!("Inserting viruses...");
    for (i, name) in ["ebola", "zika", "dengue", "rabies"].iter().enumerate() {
        table.insert(Record::new(*name, 1000 + i as i32));
    }

    println!("Mid-migration:");
    print!("{}", table.dump());

    while table.is_migrating() {
        let n = table.len();
        table.insert(Record::new(format!("filler{}", n), 2000 + n as i32));
    }

    println!("Done, load factor {:.3}:", table.load_factor());
    print!("{}", table.dump());
}
