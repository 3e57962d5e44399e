use clap::Parser;
use linprobe::HashTable;
use linprobe::XorShiftState;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Percentage of the inserted keys to remove again afterwards.
    #[arg(short = 'r', long = "remove_percent", default_value_t = 25)]
    remove_percent: usize,

    /// Hash with the deterministic xorshift mixer instead of the default
    /// hasher.
    #[arg(long)]
    xorshift: bool,
}

fn fill_and_report<S: linprobe::KeyHasher<u64>>(mut table: HashTable<u64, u64, S>, args: &Args) {
    println!("Actual capacity: {}", table.capacity());

    let num_values = (table.capacity() / 2) as u64;
    println!("Filling table with {num_values} u64 keys...");
    for i in 0..num_values {
        if table.insert(i, i * i).is_some() {
            panic!("Value already exists in table: {i}");
        }
    }

    println!("Inserted {} values into table", table.len());
    println!(
        "Load factor after filling: {:.2}%",
        (table.len() as f64 / table.capacity() as f64) * 100.0
    );
    table.debug_stats().print();
    println!("Probe distance histogram: {:?}", table.probe_histogram());

    let to_remove = num_values * args.remove_percent.min(100) as u64 / 100;
    for i in 0..to_remove {
        table.remove(&(i * 7 % num_values.max(1)));
    }
    println!();
    println!(
        "Removed {} keys, leaving {} tombstones",
        num_values as usize - table.len(),
        table.tombstones()
    );
    table.debug_stats().print();

    table.shrink_to_fit();
    println!();
    println!("After shrink_to_fit:");
    table.debug_stats().print();
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating HashTable with target capacity: {}",
        args.target_capacity
    );

    if args.xorshift {
        fill_and_report(
            HashTable::with_capacity_and_hasher(args.target_capacity, XorShiftState),
            &args,
        );
    } else {
        fill_and_report(HashTable::with_capacity(args.target_capacity), &args);
    }
}
