/* demos/history.rs */

use chrono::Local;
use fit_guard::HistoryError;
use fit_guard::history::{HistoryStore, MemoryBackend, SavedFit, current_streak};

fn main() -> Result<(), HistoryError> {
    println!("Starting history store demo...\n");

    // room for roughly three small fits
    let mut store = HistoryStore::new(MemoryBackend::with_quota(600));
    println!("Migration: {:?}", store.migrate()?);

    for (i, message) in ["Fresh", "Clean lines", "Bold colors", "Street ready"]
        .into_iter()
        .enumerate()
    {
        let fit = SavedFit::new(vec![i as u8; 48], 70 + i as u8 * 5, message);
        let evicted = store.append(fit)?;
        println!(
            "  Saved {:?}: {} stored, {} evicted",
            message,
            store.count()?,
            evicted
        );
    }

    println!("\nNewest first:");
    for fit in store.list_newest_first()? {
        println!("  [{}] {} - {}", fit.date, fit.score, fit.message);
    }

    let today = Local::now().date_naive();
    println!("\nCurrent streak: {} day(s)", current_streak(&store.list()?, today, &Local));

    match store.append(SavedFit::new(vec![0; 4096], 100, "Too big")) {
        Err(HistoryError::StorageExhausted) => println!("Oversized fit rejected: history is full."),
        other => println!("Unexpected result: {:?}", other),
    }

    Ok(())
}
