//! Period catalog listing.

use candlekeep_types::Period;

/// Prints every catalog period with its duration.
pub(crate) fn list_periods() {
    println!("{:<8} {:>12} {:>10}", "PERIOD", "MILLIS", "SECONDS");
    println!("{}", "-".repeat(32));

    for period in Period::all() {
        println!(
            "{:<8} {:>12} {:>10}",
            period.as_str(),
            period.duration_ms(),
            period.seconds()
        );
    }

    println!("\nTotal: {} periods", Period::all().len());
}
