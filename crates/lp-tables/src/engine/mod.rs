//! The table resolution engine.
//!
//! One [`TableEngine::resolve`] call runs the whole pipeline for a table:
//!
//! 1. reject missing or empty tables
//! 2. push the table onto the processing stack (cycle and depth guard)
//! 3. aggregate the net modifier
//! 4. roll the table's dice, or take the manual selection, and apply the
//!    table's reroll rule to the natural roll
//! 5. `roll_result = natural_roll + net_modifier`
//! 6. match an entry, falling back to the highest or lowest entry when the
//!    roll is off either end
//! 7. apply the entry's effects to the subject
//! 8. record the cross-reference annotations that hold
//! 9. resolve the entry's subtable and goto, unless suppressed
//!
//! Expected failures end up in [`ProcessingResult::errors`]; only invalid
//! dice or a malformed ad hoc table produce an `Err`.

mod matching;
mod stack;

use std::collections::{HashMap, VecDeque, hash_map};

use lp_core::{Condition, Entry, GotoRef, Subject, Table, TableCategory};
use lp_mechanics::{DiceSpec, aggregate};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::apply::apply_effects;
use crate::config::EngineConfig;
use crate::error::{ResolveError, TableResult};
use crate::goto;
use crate::registry::TableRegistry;
use crate::result::{ProcessingResult, ResolveOptions};
use crate::validate::validate_table;

use matching::{Match, match_entry};
use stack::ProcessingStack;

/// A table to resolve: a registered id, or a table built on the fly.
#[derive(Debug, Clone, Copy)]
pub enum TableRef<'a> {
    /// Look the table up in the registry.
    Id(&'a str),
    /// Use this table directly, bypassing the registry.
    Table(&'a Table),
}

impl<'a> From<&'a str> for TableRef<'a> {
    fn from(id: &'a str) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a String> for TableRef<'a> {
    fn from(id: &'a String) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a Table> for TableRef<'a> {
    fn from(table: &'a Table) -> Self {
        Self::Table(table)
    }
}

/// Resolves tables from a shared registry against caller-owned subjects.
///
/// The engine owns only its RNG and configuration. The processing stack is
/// created per call, so one engine can serve any sequence of calls, and
/// separate sessions can each build an engine over the same registry.
pub struct TableEngine<'r> {
    registry: &'r TableRegistry,
    config: EngineConfig,
    rng: StdRng,
}

impl<'r> TableEngine<'r> {
    /// Create an engine. Rolls are reproducible when `config.seed` is set.
    pub fn new(registry: &'r TableRegistry, config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            registry,
            config,
            rng,
        }
    }

    /// The registry this engine reads from.
    pub fn registry(&self) -> &'r TableRegistry {
        self.registry
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registered tables offered to `subject`, optionally limited to one
    /// category.
    pub fn available_tables(
        &self,
        subject: &Subject,
        category: Option<&TableCategory>,
    ) -> Vec<&'r Table> {
        self.registry.available(subject, category)
    }

    /// Resolve a table for `subject`, mutating it in place.
    pub fn resolve<'t>(
        &mut self,
        table: impl Into<TableRef<'t>>,
        subject: &mut Subject,
        options: &ResolveOptions,
    ) -> TableResult<ProcessingResult> {
        let mut stack = ProcessingStack::new(self.config.max_depth);
        let registry = self.registry;
        match table.into() {
            TableRef::Id(id) => match registry.get(id) {
                Some(table) => self.resolve_table(table, subject, options, &mut stack),
                None => Ok(not_found(id, subject)),
            },
            TableRef::Table(table) => {
                check_ad_hoc(table)?;
                self.resolve_table(table, subject, options, &mut stack)
            }
        }
    }

    /// Apply the effects of one of `prior`'s choices.
    ///
    /// The effects are applied to a copy of `prior.subject`, which is
    /// returned in the new result; the caller adopts it as the current
    /// subject. An unknown choice id leaves that copy untouched.
    pub fn resolve_choice(&self, prior: &ProcessingResult, choice_id: &str) -> ProcessingResult {
        let mut subject = prior.subject.clone();
        let mut result = ProcessingResult::new(prior.table_id.clone(), &subject);
        result.table_name = prior.table_name.clone();
        result.entry = prior.entry.clone();

        let Some(choice) = prior.entry.as_ref().and_then(|e| e.choice(choice_id)) else {
            debug!(table = %prior.table_id, choice = choice_id, "invalid choice");
            return result.fail(ResolveError::InvalidChoice {
                id: choice_id.to_string(),
            });
        };

        let applied = apply_effects(&choice.effects, &mut subject);
        result.effects = applied.records;
        result.warnings = applied.warnings;
        result.choice = Some(choice.id.clone());
        result.subject = subject;
        result
    }

    /// Select an entry by id, skipping dice and range matching.
    ///
    /// Effects, annotations, subtables and gotos are handled exactly as in
    /// [`resolve`](Self::resolve). The result has no `roll_result`.
    pub fn resolve_manual<'t>(
        &mut self,
        table: impl Into<TableRef<'t>>,
        entry_id: &str,
        subject: &mut Subject,
    ) -> TableResult<ProcessingResult> {
        let registry = self.registry;
        let table: &Table = match table.into() {
            TableRef::Id(id) => match registry.get(id) {
                Some(table) => table,
                None => return Ok(not_found(id, subject)),
            },
            TableRef::Table(table) => {
                check_ad_hoc(table)?;
                table
            }
        };

        let mut result = ProcessingResult::new(table.id.clone(), subject);
        result.table_name = Some(table.name.clone());
        result.manual_selection = true;
        if table.entries.is_empty() {
            return Ok(result.fail(ResolveError::NoEntries {
                id: table.id.clone(),
            }));
        }
        let Some(entry) = table.entry(entry_id) else {
            return Ok(result.fail(ResolveError::EntryNotFound {
                id: entry_id.to_string(),
            }));
        };

        let mut stack = ProcessingStack::new(self.config.max_depth);
        let mut frame = match stack.enter(&table.id) {
            Ok(frame) => frame,
            Err(e) => return Ok(result.fail(e)),
        };
        debug!(table = %table.id, entry = %entry.id, "manual selection");

        let options = ResolveOptions::default();
        result.net_modifier = self.net_modifier(table, subject, &options, &mut result.warnings);
        self.finish(table, entry, subject, result, &options, &mut frame)
    }

    fn resolve_table(
        &mut self,
        table: &Table,
        subject: &mut Subject,
        options: &ResolveOptions,
        stack: &mut ProcessingStack,
    ) -> TableResult<ProcessingResult> {
        let mut result = ProcessingResult::new(table.id.clone(), subject);
        result.table_name = Some(table.name.clone());
        result.inherited_modifier = options.inherited_modifier;

        if table.entries.is_empty() {
            return Ok(result.fail(ResolveError::NoEntries {
                id: table.id.clone(),
            }));
        }

        if stack.is_full()
            && !stack.contains(&table.id)
            && let Some(path) = self.loop_back(table, stack)
        {
            let e = ResolveError::CircularReference { path };
            warn!(table = %table.id, error = %e, "resolution stopped");
            return Ok(result.fail(e));
        }

        let mut frame = match stack.enter(&table.id) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(table = %table.id, error = %e, "resolution stopped");
                return Ok(result.fail(e));
            }
        };
        debug!(table = %table.id, depth = frame.depth(), "resolving table");

        let net = self.net_modifier(table, subject, options, &mut result.warnings);
        result.net_modifier = net;

        let natural = match options.manual_selection {
            Some(value) => {
                result.manual_selection = true;
                value
            }
            None => {
                let dice = DiceSpec::parse(&table.dice)?;
                let first = dice.roll(&mut self.rng);
                if table.reroll_on.contains(&first) {
                    let second = dice.roll(&mut self.rng);
                    debug!(table = %table.id, first, second, "reroll");
                    result.rerolled = true;
                    second
                } else {
                    first
                }
            }
        };
        let roll = natural.saturating_add(net);
        result.natural_roll = Some(natural);
        result.roll_result = Some(roll);

        let entry = match match_entry(&table.entries, roll) {
            Some(Match::Exact(entry)) => entry,
            Some(m @ (Match::Ceiling(_) | Match::Floor(_))) => {
                debug!(table = %table.id, roll, "roll outside table range, using end entry");
                m.entry()
            }
            None => {
                return Ok(result.fail(ResolveError::NoMatchingEntry {
                    table: table.id.clone(),
                    roll,
                }));
            }
        };
        debug!(table = %table.id, natural, net, roll, entry = %entry.id, "entry selected");

        self.finish(table, entry, subject, result, options, &mut frame)
    }

    /// Steps shared by rolled and manual selection: effects, annotations,
    /// then chaining.
    fn finish(
        &mut self,
        table: &Table,
        entry: &Entry,
        subject: &mut Subject,
        mut result: ProcessingResult,
        options: &ResolveOptions,
        stack: &mut ProcessingStack,
    ) -> TableResult<ProcessingResult> {
        let applied = apply_effects(&entry.effects, subject);
        result.effects = applied.records;
        result.warnings.extend(applied.warnings);

        for xref in &table.cross_references {
            match Condition::parse(&xref.condition) {
                Ok(condition) if condition.evaluate(subject) => {
                    result.applied_cross_references.push(xref.condition.clone());
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(table = %table.id, condition = %xref.condition, "unparsable annotation");
                    result
                        .warnings
                        .push(format!("Unparsable cross-reference condition: {e}"));
                }
            }
        }

        result.requires_choice = !entry.choices.is_empty();
        result.requires_goto = entry.goto.is_some();
        result.entry = Some(entry.clone());

        if !options.skip_goto {
            let inherited = ResolveOptions::inherited(result.net_modifier);
            if let Some(sub_id) = &entry.subtable {
                match table.subtable_as_table(sub_id) {
                    Some(sub) => {
                        let nested = self.resolve_table(&sub, subject, &inherited, stack)?;
                        result.push_chain(nested);
                    }
                    None => {
                        warn!(table = %table.id, subtable = %sub_id, "missing subtable");
                        result.warnings.push(format!("Subtable not found: {sub_id}"));
                    }
                }
            }
            if let Some(goto_ref) = &entry.goto {
                self.follow(goto_ref, subject, &inherited, stack, &mut result)?;
            }
        }

        result.subject = subject.clone();
        Ok(result)
    }

    fn follow(
        &mut self,
        goto_ref: &GotoRef,
        subject: &mut Subject,
        options: &ResolveOptions,
        stack: &mut ProcessingStack,
        result: &mut ProcessingResult,
    ) -> TableResult<()> {
        let Some(link) = goto::link_for(goto_ref) else {
            warn!(table = %result.table_id, goto = %goto_ref, "unparsable goto");
            result
                .warnings
                .push(format!("Could not parse goto reference: {goto_ref}"));
            return Ok(());
        };

        if let Some(condition) = &link.condition
            && !condition.evaluate(subject)
        {
            debug!(target_table = %link.target, %condition, "goto condition not met");
            result.warnings.push(format!(
                "Goto {} not followed: condition not met ({condition})",
                link.target
            ));
            return Ok(());
        }

        debug!(from = %result.table_id, to = %link.target, "following goto");
        let registry = self.registry;
        let nested = match registry.get(&link.target) {
            Some(target) => self.resolve_table(target, subject, options, stack)?,
            None => not_found(&link.target, subject),
        };
        result.push_chain(nested);
        Ok(())
    }

    /// Search the goto graph for a path from `table` back onto the stack.
    ///
    /// Used when the depth limit refuses `table`, so a loop that closes
    /// beyond the limit is still reported as circular. Returns the full
    /// path, outermost table first.
    fn loop_back(&self, table: &Table, stack: &ProcessingStack) -> Option<String> {
        let mut parent: HashMap<String, String> = HashMap::new();
        let mut queue = VecDeque::from([table.id.clone()]);

        while let Some(id) = queue.pop_front() {
            let current = if id == table.id {
                Some(table)
            } else {
                self.registry.get(&id)
            };
            let Some(current) = current else {
                continue;
            };

            for target in link_targets(current) {
                if stack.contains(&target) {
                    let mut hops = vec![id.clone()];
                    let mut at = &id;
                    while let Some(prev) = parent.get(at) {
                        hops.push(prev.clone());
                        at = prev;
                    }
                    hops.reverse();

                    let mut path: Vec<&str> = stack.frames().collect();
                    path.extend(hops.iter().map(String::as_str));
                    path.push(&target);
                    return Some(path.join(" -> "));
                }
                if target != table.id
                    && let hash_map::Entry::Vacant(slot) = parent.entry(target.clone())
                {
                    slot.insert(id.clone());
                    queue.push_back(target);
                }
            }
        }
        None
    }

    fn net_modifier(
        &self,
        table: &Table,
        subject: &Subject,
        options: &ResolveOptions,
        warnings: &mut Vec<String>,
    ) -> i32 {
        let breakdown = aggregate(
            table,
            subject,
            &options.additional_modifiers,
            &self.config.supplemental_rules,
        );
        let Some(bounds) = self.config.modifier_bounds else {
            return breakdown.total;
        };
        let bounded = breakdown.bounded(bounds);
        if bounded.clamped {
            warn!(table = %table.id, total = breakdown.total, clamped = bounded.value, "net modifier clamped");
            warnings.push(format!(
                "Net modifier {} clamped to {}",
                breakdown.total, bounded.value
            ));
        }
        bounded.value
    }
}

/// Goto targets of every entry of `table`, including its subtables' entries.
fn link_targets(table: &Table) -> Vec<String> {
    table
        .entries
        .iter()
        .chain(table.subtables.iter().flat_map(|s| s.entries.iter()))
        .filter_map(|e| e.goto.as_ref())
        .filter_map(goto::link_for)
        .map(|link| link.target)
        .collect()
}

fn not_found(id: &str, subject: &Subject) -> ProcessingResult {
    debug!(table = id, "table not found");
    ProcessingResult::new(id, subject).fail(ResolveError::TableNotFound { id: id.to_string() })
}

/// Ad hoc tables skip the registry, so they are validated here. An empty
/// table is left for the engine to report as a domain error.
fn check_ad_hoc(table: &Table) -> TableResult<()> {
    if !table.entries.is_empty() {
        validate_table(table)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TableError, ValidationError};
    use lp_core::effect::{CultureTrait, RaceTrait, TraitEffect};
    use lp_core::{Choice, CrossReference, Effect, ModifierKey, Subtable, TableLink};
    use lp_mechanics::ModifierBounds;

    fn two_entry(id: &str) -> Table {
        Table::new(id, format!("Table {id}"), "d20")
            .with_entry(Entry::new("a", 1, 10, "A"))
            .with_entry(Entry::new("b", 11, 20, "B"))
    }

    fn registry(tables: Vec<Table>) -> TableRegistry {
        let mut reg = TableRegistry::new();
        reg.register_all(tables).unwrap();
        reg
    }

    fn engine(reg: &TableRegistry) -> TableEngine<'_> {
        TableEngine::new(reg, EngineConfig::default().with_seed(42))
    }

    #[test]
    fn modifier_shifts_entry_selection() {
        let reg = registry(vec![two_entry("T").with_modifier("cuMod")]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S").with_modifier("cuMod", 5);

        let result = eng
            .resolve("T", &mut subject, &ResolveOptions::new().manual(8))
            .unwrap();
        assert!(result.success);
        assert_eq!(result.natural_roll, Some(8));
        assert_eq!(result.net_modifier, 5);
        assert_eq!(result.roll_result, Some(13));
        assert_eq!(result.entry.unwrap().id, "b");
        assert!(result.manual_selection);
    }

    #[test]
    fn fallback_selects_end_entries() {
        let reg = registry(vec![two_entry("T")]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");

        let low = eng
            .resolve("T", &mut subject, &ResolveOptions::new().manual(-5))
            .unwrap();
        assert_eq!(low.result_text(), "A");
        let high = eng
            .resolve("T", &mut subject, &ResolveOptions::new().manual(99))
            .unwrap();
        assert_eq!(high.result_text(), "B");
    }

    #[test]
    fn rolled_values_stay_on_the_dice() {
        let reg = registry(vec![two_entry("T")]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");
        for _ in 0..100 {
            let r = eng.resolve("T", &mut subject, &ResolveOptions::new()).unwrap();
            let natural = r.natural_roll.unwrap();
            assert!((1..=20).contains(&natural));
            assert_eq!(r.roll_result, Some(natural));
            assert!(!r.manual_selection);
        }
    }

    #[test]
    fn same_seed_same_rolls() {
        let reg = registry(vec![two_entry("T")]);
        let mut a = engine(&reg);
        let mut b = engine(&reg);
        let mut subject = Subject::new("S");
        for _ in 0..20 {
            let ra = a.resolve("T", &mut subject, &ResolveOptions::new()).unwrap();
            let rb = b.resolve("T", &mut subject, &ResolveOptions::new()).unwrap();
            assert_eq!(ra.natural_roll, rb.natural_roll);
        }
    }

    #[test]
    fn additional_modifiers_and_supplemental_rules() {
        let reg = registry(vec![
            two_entry("Y")
                .with_category(TableCategory::Youth)
                .with_modifier("cuMod"),
        ]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S")
            .with_modifier("cuMod", 2)
            .with_modifier("solMod", 3);
        let r = eng
            .resolve(
                "Y",
                &mut subject,
                &ResolveOptions::new().manual(1).with_modifier("luck", 4),
            )
            .unwrap();
        assert_eq!(r.net_modifier, 9);
        assert_eq!(r.roll_result, Some(10));
    }

    #[test]
    fn modifier_bounds_clamp_with_warning() {
        let reg = registry(vec![two_entry("T").with_modifier("cuMod")]);
        let config = EngineConfig::default()
            .with_seed(1)
            .with_bounds(ModifierBounds::new(-3, 3).unwrap());
        let mut eng = TableEngine::new(&reg, config);
        let mut subject = Subject::new("S").with_modifier("cuMod", 12);
        let r = eng
            .resolve("T", &mut subject, &ResolveOptions::new().manual(5))
            .unwrap();
        assert_eq!(r.net_modifier, 3);
        assert_eq!(r.roll_result, Some(8));
        assert_eq!(r.warnings, vec!["Net modifier 12 clamped to 3".to_string()]);
    }

    #[test]
    fn extreme_ad_hoc_modifier_selects_ceiling() {
        let reg = registry(vec![two_entry("T").with_modifier("cuMod")]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S").with_modifier("cuMod", 1);
        let opts = ResolveOptions::new().manual(5).with_modifier("luck", i32::MAX);
        let r = eng.resolve("T", &mut subject, &opts).unwrap();
        assert!(r.success);
        assert_eq!(r.net_modifier, i32::MAX);
        assert_eq!(r.roll_result, Some(i32::MAX));
        assert_eq!(r.entry.unwrap().id, "b");
    }

    #[test]
    fn unknown_table_is_a_domain_error() {
        let reg = registry(vec![]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");
        let r = eng.resolve("nope", &mut subject, &ResolveOptions::new()).unwrap();
        assert!(!r.success);
        assert_eq!(r.errors, vec![ResolveError::TableNotFound { id: "nope".into() }]);
        assert_eq!(r.table_name, None);
    }

    #[test]
    fn empty_ad_hoc_table_is_a_domain_error() {
        let reg = registry(vec![]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");
        let empty = Table::new("adhoc", "Ad hoc", "d6");
        let r = eng.resolve(&empty, &mut subject, &ResolveOptions::new()).unwrap();
        assert!(!r.success);
        assert_eq!(r.errors, vec![ResolveError::NoEntries { id: "adhoc".into() }]);
    }

    #[test]
    fn malformed_ad_hoc_table_is_an_error() {
        let reg = registry(vec![]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");
        let bad = Table::new("adhoc", "Ad hoc", "d6")
            .with_entry(Entry::new("a", 1, 4, "A"))
            .with_entry(Entry::new("b", 3, 6, "B"));
        assert!(matches!(
            eng.resolve(&bad, &mut subject, &ResolveOptions::new()),
            Err(TableError::Validation(ValidationError::OverlappingRanges { .. }))
        ));

        let mut bad_dice = two_entry("adhoc");
        bad_dice.dice = "banana".into();
        assert!(matches!(
            eng.resolve(&bad_dice, &mut subject, &ResolveOptions::new()),
            Err(TableError::Validation(ValidationError::InvalidDice { .. }))
        ));
    }

    #[test]
    fn ad_hoc_table_can_goto_registered_table() {
        let reg = registry(vec![two_entry("627")]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");
        let adhoc = Table::new("gen", "Generated", "d4")
            .with_entry(Entry::new("x", 1, 4, "X").with_goto(GotoRef::Text("627".into())));
        let r = eng.resolve(&adhoc, &mut subject, &ResolveOptions::new()).unwrap();
        assert!(r.success);
        assert_eq!(r.visited_tables(), vec!["gen", "627"]);
    }

    #[test]
    fn effects_apply_and_annotations_record() {
        let elf = Entry::new("elf", 1, 20, "Elf")
            .with_effect(Effect::Race(RaceTrait {
                name: Some("Elf".into()),
                ..Default::default()
            }))
            .with_effect(Effect::modifier("dex", 2))
            .with_effect(Effect::modifier("luck", 1));
        let table = Table::new("101", "Race", "d20")
            .with_entry(elf)
            .with_cross_reference(CrossReference {
                condition: "race = Elf".into(),
                table: Some("627".into()),
                note: None,
            })
            .with_cross_reference(CrossReference {
                condition: "race = Dwarf".into(),
                table: None,
                note: None,
            })
            .with_cross_reference(CrossReference {
                condition: "gibberish".into(),
                table: None,
                note: None,
            });
        let reg = registry(vec![table]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");

        let r = eng.resolve("101", &mut subject, &ResolveOptions::new()).unwrap();
        assert!(r.success);
        assert_eq!(r.effects.len(), 3);
        assert!(!r.effects[2].applied);
        assert_eq!(r.applied_cross_references, vec!["race = Elf".to_string()]);
        assert_eq!(r.warnings.len(), 2);
        assert_eq!(subject.race.as_ref().unwrap().name, "Elf");
        assert_eq!(subject.attributes.dexterity, 12);
        assert_eq!(r.subject, subject);
    }

    #[test]
    fn text_goto_is_followed_with_inherited_modifier() {
        let parent = Table::new("101", "Race", "d20")
            .with_modifier("cuMod")
            .with_entry(
                Entry::new("elf", 1, 30, "Elf")
                    .with_effect(Effect::skill("Archery"))
                    .with_goto(GotoRef::Text("627 Elven Events".into())),
            );
        let child = Table::new("627", "Elven Events", "d6")
            .with_entry(Entry::new("e", 1, 6, "Event").with_effect(Effect::event("Met a dragon")));
        let reg = registry(vec![parent, child]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S").with_modifier("cuMod", 4);

        let r = eng.resolve("101", &mut subject, &ResolveOptions::new()).unwrap();
        assert!(r.success);
        assert!(r.requires_goto);
        assert_eq!(r.chain.len(), 1);
        let nested = &r.chain[0];
        assert_eq!(nested.table_id, "627");
        assert_eq!(nested.inherited_modifier, Some(4));
        assert_eq!(nested.net_modifier, 0);
        assert_eq!(r.all_effects().len(), 2);
        assert_eq!(subject.events.len(), 1);
        assert!(subject.has_skill("archery"));
    }

    #[test]
    fn skip_goto_leaves_reference_unfollowed() {
        let mut parent = two_entry("A");
        parent.entries[0].goto = Some(GotoRef::Link(TableLink::new("B")));
        parent.entries[1].goto = Some(GotoRef::Link(TableLink::new("B")));
        let reg = registry(vec![parent, two_entry("B")]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");
        let r = eng
            .resolve("A", &mut subject, &ResolveOptions::new().skip_goto())
            .unwrap();
        assert!(r.success);
        assert!(r.requires_goto);
        assert!(r.chain.is_empty());
    }

    #[test]
    fn unparsable_goto_is_a_warning() {
        let t = Table::new("T", "T", "d4")
            .with_entry(Entry::new("a", 1, 4, "A").with_goto(GotoRef::Text("ask the GM".into())));
        let reg = registry(vec![t]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");
        let r = eng.resolve("T", &mut subject, &ResolveOptions::new()).unwrap();
        assert!(r.success);
        assert!(r.requires_goto);
        assert!(r.chain.is_empty());
        assert_eq!(r.warnings, vec!["Could not parse goto reference: ask the GM".to_string()]);
    }

    #[test]
    fn guarded_goto_follows_only_when_condition_holds() {
        let mut link = TableLink::new("627");
        link.condition = Some(Condition::field_equals("race", "Elf"));
        let t = Table::new("T", "T", "d4")
            .with_entry(Entry::new("a", 1, 4, "A").with_goto(GotoRef::Link(link)));
        let reg = registry(vec![t, two_entry("627")]);
        let mut eng = engine(&reg);

        let mut human = Subject::new("H");
        let r = eng.resolve("T", &mut human, &ResolveOptions::new()).unwrap();
        assert!(r.chain.is_empty());
        assert!(r.requires_goto);
        assert_eq!(r.warnings.len(), 1);

        let mut elf = Subject::new("E");
        apply_effects(
            &[Effect::Race(RaceTrait {
                name: Some("Elf".into()),
                ..Default::default()
            })],
            &mut elf,
        );
        let r = eng.resolve("T", &mut elf, &ResolveOptions::new()).unwrap();
        assert_eq!(r.chain.len(), 1);
    }

    #[test]
    fn missing_goto_target_fails_the_chain() {
        let t = Table::new("T", "T", "d4")
            .with_entry(Entry::new("a", 1, 4, "A").with_goto(GotoRef::Link(TableLink::new("ghost"))));
        let reg = registry(vec![t]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");
        let r = eng.resolve("T", &mut subject, &ResolveOptions::new()).unwrap();
        assert!(!r.success);
        assert_eq!(r.chain.len(), 1);
        assert_eq!(r.errors, vec![ResolveError::TableNotFound { id: "ghost".into() }]);
    }

    #[test]
    fn self_reference_is_circular_for_any_depth() {
        let t = Table::new("T", "T", "d4")
            .with_entry(Entry::new("a", 1, 4, "A").with_goto(GotoRef::Link(TableLink::new("T"))));
        let reg = registry(vec![t]);
        for depth in 1..=12 {
            let mut eng = TableEngine::new(&reg, EngineConfig::default().with_seed(7).with_max_depth(depth));
            let mut subject = Subject::new("S");
            let r = eng.resolve("T", &mut subject, &ResolveOptions::new()).unwrap();
            assert!(!r.success);
            assert!(matches!(
                r.errors.as_slice(),
                [ResolveError::CircularReference { path }] if path == "T -> T"
            ));
        }
    }

    #[test]
    fn transitive_cycle_is_circular() {
        let a = Table::new("A", "A", "d4")
            .with_entry(Entry::new("a", 1, 4, "A").with_goto(GotoRef::Link(TableLink::new("B"))));
        let b = Table::new("B", "B", "d4")
            .with_entry(Entry::new("b", 1, 4, "B").with_goto(GotoRef::Link(TableLink::new("A"))));
        let reg = registry(vec![a, b]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");
        let r = eng.resolve("A", &mut subject, &ResolveOptions::new()).unwrap();
        assert!(!r.success);
        assert!(matches!(
            r.errors.as_slice(),
            [ResolveError::CircularReference { path }] if path == "A -> B -> A"
        ));

        // The stack is unwound: an unrelated call succeeds.
        let reg2 = registry(vec![two_entry("C")]);
        let mut eng2 = engine(&reg2);
        assert!(eng2.resolve("C", &mut subject, &ResolveOptions::new()).unwrap().success);
        assert!(eng.resolve("B", &mut subject, &ResolveOptions::new().skip_goto()).unwrap().success);
    }

    #[test]
    fn transitive_cycle_beyond_depth_limit_is_circular() {
        let link = |from: &str, to: &str| {
            Table::new(from, from, "d4")
                .with_entry(Entry::new("e", 1, 4, "E").with_goto(GotoRef::Link(TableLink::new(to))))
        };
        let reg = registry(vec![
            link("A", "B"),
            link("B", "A"),
            link("X", "Y"),
            link("Y", "Z"),
            link("Z", "X"),
        ]);

        for (start, depth, expected) in [
            ("A", 1, "A -> B -> A"),
            ("A", 2, "A -> B -> A"),
            ("X", 1, "X -> Y -> Z -> X"),
            ("X", 2, "X -> Y -> Z -> X"),
            ("X", 3, "X -> Y -> Z -> X"),
        ] {
            let mut eng = TableEngine::new(&reg, EngineConfig::default().with_seed(5).with_max_depth(depth));
            let mut subject = Subject::new("S");
            let r = eng.resolve(start, &mut subject, &ResolveOptions::new()).unwrap();
            assert!(!r.success);
            assert!(
                matches!(
                    r.errors.as_slice(),
                    [ResolveError::CircularReference { path }] if path == expected
                ),
                "start {start}, depth {depth}: {:?}",
                r.errors
            );
        }
    }

    #[test]
    fn long_chain_hits_recursion_limit() {
        let tables: Vec<Table> = (0..6)
            .map(|i| {
                Table::new(format!("t{i}"), format!("T{i}"), "d4").with_entry(
                    Entry::new("e", 1, 4, "E").with_goto(GotoRef::Link(TableLink::new(format!("t{}", i + 1)))),
                )
            })
            .collect();
        let reg = registry(tables);
        let mut eng = TableEngine::new(&reg, EngineConfig::default().with_seed(3).with_max_depth(3));
        let mut subject = Subject::new("S");
        let r = eng.resolve("t0", &mut subject, &ResolveOptions::new()).unwrap();
        assert!(!r.success);
        assert_eq!(
            r.errors,
            vec![ResolveError::RecursionLimit {
                table: "t3".into(),
                max: 3
            }]
        );
        assert_eq!(r.visited_tables(), vec!["t0", "t1", "t2", "t3"]);
    }

    #[test]
    fn subtable_resolves_as_nested_table() {
        let t = Table::new("T", "T", "d20")
            .with_entry(Entry::new("a", 1, 20, "A").with_subtable("weapons"))
            .with_subtable(Subtable {
                id: "weapons".into(),
                name: "Weapons".into(),
                dice: "d6".into(),
                entries: vec![Entry::new("sword", 1, 6, "Sword").with_effect(Effect::skill("Swordplay"))],
            });
        let reg = registry(vec![t]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");
        let r = eng.resolve("T", &mut subject, &ResolveOptions::new()).unwrap();
        assert!(r.success);
        assert_eq!(r.chain[0].table_id, "T/weapons");
        assert_eq!(r.chain[0].table_name.as_deref(), Some("Weapons"));
        assert!(subject.has_skill("Swordplay"));
    }

    #[test]
    fn reroll_rule_uses_natural_roll() {
        let t = Table::new("T", "T", "d1")
            .with_reroll_on(vec![1])
            .with_entry(Entry::new("a", 1, 20, "A"));
        let reg = registry(vec![t]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");

        let r = eng.resolve("T", &mut subject, &ResolveOptions::new()).unwrap();
        assert!(r.rerolled);
        assert_eq!(r.natural_roll, Some(1));

        let manual = eng
            .resolve("T", &mut subject, &ResolveOptions::new().manual(1))
            .unwrap();
        assert!(!manual.rerolled);
    }

    fn choice_table() -> Table {
        Table::new("C", "Choices", "d20").with_entry(
            Entry::new("fork", 1, 20, "Fork in the road")
                .with_effect(Effect::event("Reached a fork"))
                .with_choice(Choice {
                    id: "left".into(),
                    label: "Go left".into(),
                    effects: vec![Effect::skill("Tracking"), Effect::modifier("wis", 1)],
                })
                .with_choice(Choice {
                    id: "right".into(),
                    label: "Go right".into(),
                    effects: vec![Effect::Trait(TraitEffect::Culture(CultureTrait {
                        name: Some("Nomad".into()),
                        modifier: Some(2),
                        ..Default::default()
                    }))],
                }),
        )
    }

    #[test]
    fn choice_applies_branch_effects() {
        let reg = registry(vec![choice_table()]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");
        let prior = eng.resolve("C", &mut subject, &ResolveOptions::new()).unwrap();
        assert!(prior.requires_choice);

        let chosen = eng.resolve_choice(&prior, "left");
        assert!(chosen.success);
        assert_eq!(chosen.choice.as_deref(), Some("left"));
        assert_eq!(chosen.effects.len(), 2);
        assert_eq!(prior.effects.len() + chosen.effects.len(), 3);
        assert!(chosen.subject.has_skill("Tracking"));
        assert_eq!(chosen.subject.events.len(), 1);

        let right = eng.resolve_choice(&prior, "right");
        assert_eq!(right.subject.modifier(&ModifierKey::Cultural), 2);
        assert!(!right.subject.has_skill("Tracking"));
    }

    #[test]
    fn invalid_choice_leaves_subject_unchanged() {
        let reg = registry(vec![choice_table()]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");
        let prior = eng.resolve("C", &mut subject, &ResolveOptions::new()).unwrap();

        let r = eng.resolve_choice(&prior, "up");
        assert!(!r.success);
        assert_eq!(r.errors[0].to_string(), "Invalid choice selected: up");
        assert_eq!(r.subject, prior.subject);
        assert!(r.effects.is_empty());
    }

    #[test]
    fn manual_entry_selection() {
        let reg = registry(vec![choice_table(), two_entry("T")]);
        let mut eng = engine(&reg);
        let mut subject = Subject::new("S");

        let r = eng.resolve_manual("C", "fork", &mut subject).unwrap();
        assert!(r.success);
        assert!(r.manual_selection);
        assert_eq!(r.roll_result, None);
        assert_eq!(r.natural_roll, None);
        assert_eq!(r.effects.len(), 1);
        assert!(r.requires_choice);

        let missing = eng.resolve_manual("T", "zzz", &mut subject).unwrap();
        assert!(!missing.success);
        assert_eq!(missing.errors, vec![ResolveError::EntryNotFound { id: "zzz".into() }]);

        let unknown = eng.resolve_manual("nope", "a", &mut subject).unwrap();
        assert_eq!(unknown.errors, vec![ResolveError::TableNotFound { id: "nope".into() }]);
    }

    #[test]
    fn manual_selection_is_deterministic() {
        let entry = Entry::new("x", 1, 20, "X")
            .with_effect(Effect::modifier("cuMod", 2))
            .with_effect(Effect::skill("Riding"))
            .with_goto(GotoRef::Text("2".into()));
        let reg = registry(vec![
            Table::new("1", "One", "d20").with_entry(entry),
            Table::new("2", "Two", "d20").with_entry(Entry::new("y", 1, 20, "Y").with_effect(Effect::event("E"))),
        ]);
        let base = Subject::new("S");
        let mut s1 = base.clone();
        let mut s2 = base.clone();

        let mut eng1 = TableEngine::new(&reg, EngineConfig::default().with_seed(1));
        let mut eng2 = TableEngine::new(&reg, EngineConfig::default().with_seed(999));
        let r1 = eng1.resolve_manual("1", "x", &mut s1).unwrap();
        let r2 = eng2.resolve_manual("1", "x", &mut s2).unwrap();
        assert_eq!(r1.all_effects(), r2.all_effects());
        assert_eq!(s1, s2);
        assert_eq!(r1.chain.len(), 1);
    }

    #[test]
    fn available_tables_delegates_to_registry() {
        let reg = registry(vec![
            two_entry("a").with_category(TableCategory::Birth),
            two_entry("b").with_condition(Condition::field_equals("race", "Elf")),
        ]);
        let eng = engine(&reg);
        let subject = Subject::new("S");
        let ids: Vec<&str> = eng
            .available_tables(&subject, None)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a"]);
        assert_eq!(eng.available_tables(&subject, Some(&TableCategory::Birth)).len(), 1);
    }
}
