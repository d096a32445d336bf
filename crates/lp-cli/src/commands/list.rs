use std::path::Path;

use comfy_table::{ContentArrangement, Table};
use lp_core::TableCategory;

pub fn run(file: &Path, category: Option<&str>, subject: Option<&Path>) -> Result<(), String> {
    let registry = super::load_registry(file)?;
    let subject = super::load_subject(subject)?;
    let category = category.map(TableCategory::parse);

    let tables = registry.available(&subject, category.as_ref());
    if tables.is_empty() {
        println!("  No tables found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name", "Category", "Dice", "Modifier"]);

    for t in &tables {
        let modifier = t
            .modifier
            .as_ref()
            .map_or_else(|| "—".to_string(), |m| m.as_str().to_string());
        table.add_row(vec![
            t.id.clone(),
            t.name.clone(),
            t.category.to_string(),
            t.dice.clone(),
            modifier,
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} tables", tables.len());

    Ok(())
}
