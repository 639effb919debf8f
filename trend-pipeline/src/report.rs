use trendwatch_core::TrendRecord;

const BAR_WIDTH: usize = 30;

/// Render the stored trend as a plain-text table, oldest first, with a
/// share-of-positive bar per run.
pub fn render_history(records: &[TrendRecord]) -> String {
    if records.is_empty() {
        return "No sentiment history recorded yet.".to_string();
    }

    let mut out = format!(
        "{:<19}  {:>8}  {:>8}  {:>8}  positive share\n",
        "Date", "Positive", "Neutral", "Negative"
    );
    for record in records {
        out.push_str(&format!(
            "{:<19}  {:>8}  {:>8}  {:>8}  {}\n",
            record.formatted_timestamp(),
            record.positive,
            record.neutral,
            record.negative,
            positive_bar(record)
        ));
    }
    out
}

fn positive_bar(record: &TrendRecord) -> String {
    let total = record.total() as usize;
    let filled = if total == 0 {
        0
    } else {
        record.positive as usize * BAR_WIDTH / total
    };
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
