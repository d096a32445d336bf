use std::fs;
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use lp_core::Subject;
use lp_tables::{EngineConfig, ProcessingResult, ResolveOptions, TableEngine};

#[derive(Args)]
pub struct ResolveArgs {
    /// JSON table file
    file: PathBuf,

    /// Id of the table to resolve
    table: String,

    /// Use this value as the natural roll instead of rolling
    #[arg(long, conflicts_with = "entry")]
    manual: Option<i32>,

    /// Select this entry directly, skipping the roll
    #[arg(long)]
    entry: Option<String>,

    /// Then pick this choice of the selected entry
    #[arg(long)]
    choice: Option<String>,

    /// Do not follow gotos or subtables
    #[arg(long)]
    no_goto: bool,

    /// Ad hoc modifier, e.g. `--mod luck=2` (repeatable)
    #[arg(short = 'm', long = "mod", value_parser = super::parse_modifier)]
    modifiers: Vec<(String, i32)>,

    /// Subject to start from (JSON file)
    #[arg(long)]
    subject: Option<PathBuf>,

    /// Write the resulting subject to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// RNG seed for reproducible rolls
    #[arg(short, long)]
    seed: Option<u64>,

    /// Engine configuration (JSON file)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: &ResolveArgs) -> Result<(), String> {
    let registry = super::load_registry(&args.file)?;
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json(&super::read_file(path)?)
            .map_err(|e| format!("{}: {e}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    let mut subject = super::load_subject(args.subject.as_deref())?;
    let mut engine = TableEngine::new(&registry, config);

    let result = match &args.entry {
        Some(entry) => engine.resolve_manual(args.table.as_str(), entry, &mut subject),
        None => {
            let mut options = ResolveOptions::new();
            options.manual_selection = args.manual;
            options.skip_goto = args.no_goto;
            options.additional_modifiers = args.modifiers.iter().cloned().collect();
            engine.resolve(args.table.as_str(), &mut subject, &options)
        }
    }
    .map_err(|e| e.to_string())?;

    let chosen = args.choice.as_deref().map(|id| {
        let chosen = engine.resolve_choice(&result, id);
        if chosen.success {
            subject = chosen.subject.clone();
        }
        chosen
    });

    if args.json {
        let doc = serde_json::json!({ "result": &result, "choice": &chosen });
        let text = serde_json::to_string_pretty(&doc).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        print_result(&result, 0);
        if let Some(chosen) = &chosen {
            print_choice(chosen);
        }
        print_subject(&subject);
    }

    if let Some(path) = &args.output {
        let text = serde_json::to_string_pretty(&subject).map_err(|e| e.to_string())?;
        fs::write(path, text).map_err(|e| format!("cannot write {}: {e}", path.display()))?;
    }

    let error = result
        .errors
        .first()
        .or_else(|| chosen.as_ref().and_then(|c| c.errors.first()));
    match error {
        Some(e) => Err(e.to_string()),
        None => Ok(()),
    }
}

fn print_result(r: &ProcessingResult, depth: usize) {
    let pad = "  ".repeat(depth + 1);
    let roll = match (r.natural_roll, r.roll_result) {
        (Some(natural), Some(total)) if r.net_modifier != 0 => {
            format!("{natural} {:+} = {total}", r.net_modifier)
        }
        (Some(natural), Some(_)) => natural.to_string(),
        _ => "manual".to_string(),
    };
    let rerolled = if r.rerolled { " (rerolled)" } else { "" };
    println!(
        "{pad}{} {}  [{}{rerolled}]",
        r.table_id.bold(),
        r.table_name.as_deref().unwrap_or(""),
        roll.dimmed()
    );

    if let Some(entry) = &r.entry {
        println!("{pad}  {} {}", "→".cyan(), entry.result.green().bold());
        if let Some(description) = &entry.description {
            println!("{pad}    {}", description.dimmed());
        }
    }
    for effect in &r.effects {
        let mark = if effect.applied {
            "+".green()
        } else {
            "-".red()
        };
        println!("{pad}    {mark} {}", effect.description);
    }
    for xref in &r.applied_cross_references {
        println!("{pad}    {} {xref}", "see also:".cyan());
    }
    for warning in &r.warnings {
        println!("{pad}    {} {warning}", "warning:".yellow().bold());
    }
    if r.requires_choice
        && let Some(entry) = &r.entry
    {
        println!("{pad}    {}", "Choices:".bold());
        for choice in &entry.choices {
            println!("{pad}      {}  {}", choice.id, choice.label);
        }
    }

    for nested in &r.chain {
        print_result(nested, depth + 1);
    }
}

fn print_choice(r: &ProcessingResult) {
    let Some(choice) = &r.choice else {
        return;
    };
    println!("  {} {}", "Chose".bold(), choice);
    for effect in &r.effects {
        println!("    {} {}", "+".green(), effect.description);
    }
}

fn print_subject(subject: &Subject) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);

    if let Some(race) = &subject.race {
        table.add_row(vec!["Race".to_string(), race.name.clone()]);
    }
    if let Some(culture) = &subject.culture {
        table.add_row(vec!["Culture".to_string(), culture.name.clone()]);
    }
    if let Some(status) = &subject.social_status {
        table.add_row(vec!["Social status".to_string(), status.level.clone()]);
    }
    for (key, value) in subject.modifiers.iter() {
        table.add_row(vec![key.label().to_string(), format!("{value:+}")]);
    }
    let lists = [
        ("Skills", subject.skills.iter().map(|s| s.name.clone()).collect::<Vec<_>>()),
        ("Items", subject.items.iter().map(|i| i.name.clone()).collect()),
        ("Occupations", subject.occupations.iter().map(|o| o.name.clone()).collect()),
        ("Events", subject.events.iter().map(|e| e.title.clone()).collect()),
    ];
    for (label, names) in lists {
        if !names.is_empty() {
            table.add_row(vec![label.to_string(), names.join(", ")]);
        }
    }

    println!();
    println!("  {} {}", "Subject".bold().underline(), subject.name);
    println!("{table}");
}
