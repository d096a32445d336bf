use std::path::Path;

use comfy_table::{ContentArrangement, Table};

pub fn run(file: &Path) -> Result<(), String> {
    let registry = super::load_registry(file)?;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name", "Dice", "Entries", "Range", "Subtables"]);

    for id in registry.ids() {
        let Some(t) = registry.get(id) else {
            continue;
        };
        let range = t
            .bounds()
            .map(|(lo, hi)| format!("{lo}-{hi}"))
            .unwrap_or_default();
        table.add_row(vec![
            t.id.clone(),
            t.name.clone(),
            t.dice.clone(),
            t.entries.len().to_string(),
            range,
            t.subtables.len().to_string(),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "  All checks passed for '{}': {} table{}",
        file.display(),
        registry.len(),
        if registry.len() == 1 { "" } else { "s" }
    );

    Ok(())
}
