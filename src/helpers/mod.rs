pub mod fzf_invoker;
pub mod progress;

use self::fzf_invoker::FzfInvoker;
use anyhow::Result;
use anyhow::bail;

/// Let the user pick one entry, or the leading "All" entry for the whole
/// list. Returns indices into `items`.
pub fn choose_indices<S: ToString>(title: &str, items: Vec<S>) -> Result<Vec<usize>> {
    const ALL: &str = "All";

    let labels: Vec<String> = items.into_iter().map(|s| s.to_string()).collect();
    let mut display_items = vec![ALL.to_string()];
    display_items.extend(labels.iter().enumerate().map(|(idx, label)| format!("{}. {label}", idx + 1)));

    let picker = FzfInvoker::new(title, display_items.clone());
    let Some(choice) = picker.invoke()? else {
        bail!("No selection made");
    };

    Ok(selection_from_label(&choice, &display_items, labels.len()))
}

fn selection_from_label(choice: &str, display_items: &[String], count: usize) -> Vec<usize> {
    match display_items.iter().position(|item| item == choice) {
        Some(0) | None => (0..count).collect(),
        Some(pos) => vec![pos - 1],
    }
}
