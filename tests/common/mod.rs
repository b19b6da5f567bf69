use rand::Rng;
use std::fs::File;
use std::io::Error;
use std::path::Path;

const ITEM_TYPES: [&str; 3] = ["weapon", "armor", "other"];

/// Writes `rows` create requests, each for a distinct item.
pub fn generate_csv(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["action", "user", "item", "item_type", "id"])?;

    for i in 1..=rows {
        wtr.write_record([
            "create",
            "1",
            &i.to_string(),
            ITEM_TYPES[i % ITEM_TYPES.len()],
            "",
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes create requests from random users for items drawn from `1..=items`
/// until the file reaches `size_kb`, so many rows contend for the same item.
pub fn generate_contended_csv(path: &Path, size_kb: usize, items: i64) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(["action", "user", "item", "item_type", "id"])?;

    let mut rng = rand::thread_rng();
    let target_size = (size_kb * 1024) as u64;

    // Check size every 1000 rows to avoid syscall overhead
    loop {
        for _ in 0..1000 {
            let user: i64 = rng.gen_range(1..=50);
            let item: i64 = rng.gen_range(1..=items);
            wtr.write_record([
                "create",
                &user.to_string(),
                &item.to_string(),
                ITEM_TYPES[rng.gen_range(0..ITEM_TYPES.len())],
                "",
            ])?;
        }
        wtr.flush()?; // Flush to ensure file size is updated
        if std::fs::metadata(path)?.len() >= target_size {
            break;
        }
    }
    Ok(())
}
