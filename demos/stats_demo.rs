use clap::Parser;
use cuckoo_bins::HashTable;
use cuckoo_bins::stats::InsertStats;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "count", default_value_t = 100_000)]
    count: usize,

    #[arg(short = 'p', long = "power", default_value_t = 1)]
    power: u8,

    /// Fail any growth that would exceed this many slots.
    #[arg(short = 'l', long = "slot_limit")]
    slot_limit: Option<usize>,
}

fn main() {
    let args = Args::parse();

    let keys: Vec<String> = (0..args.count).map(|i| format!("key_{i:08}")).collect();

    let mut table = HashTable::with_power(args.power)
        .with_probe(InsertStats::new())
        .with_slot_limit(args.slot_limit);

    println!(
        "Created table with 2^{} bins x {} slots",
        table.power(),
        table.bin_size()
    );

    let mut num_failures = 0;
    for (i, key) in keys.iter().enumerate() {
        if let Err(err) = table.insert(key.as_bytes(), i as u64) {
            if num_failures == 0 {
                println!("First failed insert at {i}: {err}");
            }
            num_failures += 1;
        }
    }

    let mut mismatches = 0;
    for (i, key) in keys.iter().enumerate() {
        match table.get(key.as_bytes()) {
            Some(&value) if value == i as u64 => {}
            Some(_) => mismatches += 1,
            None if num_failures > 0 => {}
            None => mismatches += 1,
        }
    }

    println!("Inserted {} of {} keys", table.len(), keys.len());
    println!(
        "Final load factor: {:.2}%",
        (table.len() as f64 / table.capacity() as f64) * 100.0
    );

    table.probe().print();
    table.debug_stats().print();
    println!(
        "Failed inserts: {} ({:.02}%), mismatched lookups: {}",
        num_failures,
        num_failures as f64 / keys.len().max(1) as f64 * 100.0,
        mismatches
    );
}
