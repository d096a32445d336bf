use colored::Colorize;
use lp_mechanics::{Contribution, DiceSpec, ModifiedRoll, RollMode};
use rand::SeedableRng;
use rand::rngs::StdRng;

pub fn run(
    dice: &str,
    mode: RollMode,
    modifiers: &[(String, i32)],
    seed: Option<u64>,
) -> Result<(), String> {
    let spec = DiceSpec::parse(dice).map_err(|e| e.to_string())?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let contributions: Vec<Contribution> = modifiers
        .iter()
        .map(|(name, value)| Contribution::new(name.clone(), *value))
        .collect();
    let roll = ModifiedRoll::roll_with_mode(spec, &contributions, mode, &mut rng);

    println!("  {} {}", spec.to_string().bold(), roll.base);
    println!("  {}", roll.breakdown.dimmed());
    if let Some(other) = roll.discarded {
        println!("  {} {other}", "discarded:".dimmed());
    }
    println!(
        "  {} {}",
        "Result:".bold(),
        roll.final_result.to_string().green().bold()
    );

    Ok(())
}
