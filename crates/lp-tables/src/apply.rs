//! Applying entry effects to a subject.
//!
//! Effects are applied strictly in declaration order, and each one yields
//! exactly one [`EffectRecord`], whether or not it changed anything. Trait
//! writes merge into the existing sub-record (or its default), and collection
//! grants only ever append.

use lp_core::effect::{
    BirthTrait, CultureTrait, ItemGrant, OccupationGrant, PersonalityGrant, RaceTrait,
    RelationshipGrant, SkillGrant, StatusTrait, TraitEffect,
};
use lp_core::subject::{Item, LifeEvent, Occupation, PersonalityTrait, Relationship, Skill};
use lp_core::{Attribute, Effect, EffectRecord, ModifierKey, Subject};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::warn;

/// Records and warnings produced by [`apply_effects`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Applied {
    /// One record per effect, in application order.
    pub records: Vec<EffectRecord>,
    /// Unknown targets and other skipped writes.
    pub warnings: Vec<String>,
}

/// Apply a list of effects in order.
pub fn apply_effects(effects: &[Effect], subject: &mut Subject) -> Applied {
    let mut applied = Applied::default();
    for effect in effects {
        let record = apply_one(effect, subject, &mut applied.warnings);
        applied.records.push(record);
    }
    applied
}

/// Apply a single effect, discarding any warnings.
pub fn apply_effect(effect: &Effect, subject: &mut Subject) -> EffectRecord {
    apply_one(effect, subject, &mut Vec::new())
}

fn apply_one(effect: &Effect, subject: &mut Subject, warnings: &mut Vec<String>) -> EffectRecord {
    match effect {
        Effect::Modifier { target, value } => {
            apply_modifier(effect, target, *value, subject, warnings)
        }
        Effect::Trait(t) => {
            let value = apply_trait(t, subject, warnings);
            record(effect, value, true)
        }
        Effect::Race(r) => {
            let value = apply_race(r, subject, warnings);
            record(effect, value, true)
        }
        Effect::Skill(g) => record(effect, grant_skill(g, subject), true),
        Effect::Item(g) => record(effect, grant_item(g, subject), true),
        Effect::Relationship(g) => record(effect, grant_relationship(g, subject), true),
        Effect::Occupation(g) => record(effect, grant_occupation(g, subject), true),
        Effect::Event(g) => {
            let event = LifeEvent {
                title: g.title.clone(),
                description: g.description.clone(),
                age: g.age,
            };
            let value = to_value(&event);
            subject.events.push(event);
            record(effect, value, true)
        }
    }
}

fn record(effect: &Effect, value: Value, applied: bool) -> EffectRecord {
    EffectRecord {
        kind: effect.kind(),
        target: effect.target().to_string(),
        value,
        description: effect.to_string(),
        applied,
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn unknown_target(warnings: &mut Vec<String>, target: &str) {
    warn!(effect_target = target, "unknown effect target");
    warnings.push(format!("Unknown effect target: {target}"));
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

fn apply_modifier(
    effect: &Effect,
    target: &str,
    delta: i32,
    subject: &mut Subject,
    warnings: &mut Vec<String>,
) -> EffectRecord {
    if let Ok(attr) = Attribute::parse(target) {
        let now = subject.attributes.adjust(attr, delta);
        let mut rec = record(effect, json!({ "delta": delta, "result": now }), true);
        rec.target = attr.to_string();
        return rec;
    }

    match ModifierKey::parse(target) {
        ModifierKey::Custom(_) => {
            unknown_target(warnings, target);
            record(effect, json!({ "delta": delta }), false)
        }
        key => {
            let now = subject.modifiers.adjust(key.clone(), delta);
            let mut rec = record(effect, json!({ "delta": delta, "result": now }), true);
            rec.target = key.as_str().to_string();
            rec
        }
    }
}

// ---------------------------------------------------------------------------
// Trait writes
// ---------------------------------------------------------------------------

fn apply_trait(t: &TraitEffect, subject: &mut Subject, warnings: &mut Vec<String>) -> Value {
    match t {
        TraitEffect::Race(r) => apply_race(r, subject, warnings),
        TraitEffect::Culture(c) => apply_culture(c, subject),
        TraitEffect::SocialStatus(s) => apply_status(s, subject),
        TraitEffect::Birth(b) => apply_birth(b, subject),
        TraitEffect::Personality(p) => grant_personality(p, subject),
    }
}

fn apply_race(r: &RaceTrait, subject: &mut Subject, warnings: &mut Vec<String>) -> Value {
    let mut race = subject.race.clone().unwrap_or_default();
    if let Some(name) = &r.name {
        race.name = name.clone();
    }
    if r.description.is_some() {
        race.description = r.description.clone();
    }
    if let Some(abilities) = &r.abilities {
        race.abilities = abilities.clone();
    }
    if let Some(languages) = &r.languages {
        race.languages = languages.clone();
    }
    if let Some(size) = r.size {
        race.size = size;
    }
    if let Some(speed) = r.speed {
        race.speed = speed;
    }

    for (name, score) in &r.base_attributes {
        match Attribute::parse(name) {
            Ok(attr) => *subject.attributes.get_mut(attr) = *score,
            Err(_) => unknown_target(warnings, name),
        }
    }

    let value = to_value(&race);
    subject.race = Some(race);
    value
}

fn apply_culture(c: &CultureTrait, subject: &mut Subject) -> Value {
    let mut culture = subject.culture.clone().unwrap_or_default();
    if let Some(name) = &c.name {
        culture.name = name.clone();
    }
    if c.description.is_some() {
        culture.description = c.description.clone();
    }
    if c.language.is_some() {
        culture.language = c.language.clone();
    }
    if let Some(m) = c.modifier {
        subject.modifiers.set(ModifierKey::Cultural, m);
    }

    let value = to_value(&culture);
    subject.culture = Some(culture);
    value
}

fn apply_status(s: &StatusTrait, subject: &mut Subject) -> Value {
    let mut status = subject.social_status.clone().unwrap_or_default();
    if let Some(level) = &s.level {
        status.level = level.clone();
    }
    if s.description.is_some() {
        status.description = s.description.clone();
    }
    if s.wealth.is_some() {
        status.wealth = s.wealth.clone();
    }
    if s.title.is_some() {
        status.title = s.title.clone();
    }
    if let Some(m) = s.modifier {
        subject.modifiers.set(ModifierKey::SocialStatus, m);
    }
    if let Some(m) = s.title_modifier {
        subject.modifiers.set(ModifierKey::Title, m);
    }

    let value = to_value(&status);
    subject.social_status = Some(status);
    value
}

fn apply_birth(b: &BirthTrait, subject: &mut Subject) -> Value {
    let mut birth = subject.birth.clone().unwrap_or_default();
    if let Some(legitimate) = b.legitimate {
        birth.legitimate = legitimate;
    }
    if b.birth_order.is_some() {
        birth.birth_order = b.birth_order;
    }
    if b.siblings.is_some() {
        birth.siblings = b.siblings;
    }
    if b.place.is_some() {
        birth.place = b.place.clone();
    }
    if b.description.is_some() {
        birth.description = b.description.clone();
    }
    if let Some(m) = b.modifier {
        subject.modifiers.set(ModifierKey::Birth, m);
    }
    if let Some(m) = b.legitimacy_modifier {
        subject.modifiers.set(ModifierKey::Legitimacy, m);
    }

    let value = to_value(&birth);
    subject.birth = Some(birth);
    value
}

// ---------------------------------------------------------------------------
// Collection grants
// ---------------------------------------------------------------------------

fn grant_personality(p: &PersonalityGrant, subject: &mut Subject) -> Value {
    let item = PersonalityTrait {
        name: p.name.clone(),
        alignment: p.alignment.clone(),
        description: p.description.clone(),
    };
    let value = to_value(&item);
    subject.personality.push(item);
    value
}

fn grant_skill(g: &SkillGrant, subject: &mut Subject) -> Value {
    let skill = Skill {
        name: g.name.clone(),
        rank: g.rank.unwrap_or(1),
        source: g.source.clone(),
    };
    let value = to_value(&skill);
    subject.skills.push(skill);
    value
}

fn grant_item(g: &ItemGrant, subject: &mut Subject) -> Value {
    let item = Item {
        name: g.name.clone(),
        quantity: g.quantity.unwrap_or(1),
        description: g.description.clone(),
        value: g.value,
    };
    let value = to_value(&item);
    subject.items.push(item);
    value
}

fn grant_relationship(g: &RelationshipGrant, subject: &mut Subject) -> Value {
    let rel = Relationship {
        name: g.name.clone(),
        kind: g.kind.clone(),
        attitude: g.attitude.clone(),
        description: g.description.clone(),
    };
    let value = to_value(&rel);
    subject.relationships.push(rel);
    value
}

fn grant_occupation(g: &OccupationGrant, subject: &mut Subject) -> Value {
    let occ = Occupation {
        name: g.name.clone(),
        years: g.years,
        description: g.description.clone(),
    };
    let value = to_value(&occ);
    subject.occupations.push(occ);
    value
}
