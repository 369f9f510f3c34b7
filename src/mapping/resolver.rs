//! Mapping resolver: event definitions + mode -> lookup tables

use super::{
    AnalysisMode, ButtonMapping, EventDefinition, HoldMapping, MappingTables, ModifierCombo,
    RawBinding,
};
use crate::controller::buttons::{Modifier, BUTTON_COUNT};
use std::collections::hash_map::Entry;
use tracing::{debug, info, warn};

/// Binding after validation.
enum Resolved {
    Tap(usize),
    Hold(usize),
    Combo(Modifier, usize),
}

/// Builds the lookup tables for `mode`.
///
/// Definitions are processed in order; when two bindings collide the first
/// one wins and the later one is skipped with a warning. Malformed bindings
/// are skipped individually.
pub fn resolve(definitions: &[EventDefinition], mode: AnalysisMode) -> MappingTables {
    let mut tables = MappingTables {
        mode,
        ..Default::default()
    };
    let mut skipped = 0usize;

    for definition in definitions {
        if definition.name.trim().is_empty() {
            warn!("Skipping event definition without a name");
            skipped += definition.bindings.len();
            continue;
        }
        tables
            .definitions
            .entry(definition.name.clone())
            .or_insert_with(|| definition.clone());

        for binding in &definition.bindings {
            let resolved = match validate(binding, mode) {
                Ok(Some(resolved)) => resolved,
                Ok(None) => continue,
                Err(reason) => {
                    warn!(
                        "Skipping binding {:?} of '{}': {}",
                        binding, definition.name, reason
                    );
                    skipped += 1;
                    continue;
                }
            };

            let label = definition.display_label().to_string();
            let inserted = match resolved {
                Resolved::Tap(index) => match tables.buttons.entry(index) {
                    Entry::Vacant(slot) => {
                        slot.insert(ButtonMapping {
                            button_index: index,
                            event_name: definition.name.clone(),
                            label,
                        });
                        true
                    }
                    Entry::Occupied(_) => false,
                },
                Resolved::Hold(index) => match tables.holds.entry(index) {
                    Entry::Vacant(slot) => {
                        slot.insert(HoldMapping {
                            button_index: index,
                            event_name: definition.name.clone(),
                        });
                        true
                    }
                    Entry::Occupied(_) => false,
                },
                Resolved::Combo(modifier, index) => match tables.combos.entry((modifier, index)) {
                    Entry::Vacant(slot) => {
                        slot.insert(ModifierCombo {
                            modifier,
                            button_index: index,
                            event_name: definition.name.clone(),
                            label,
                        });
                        true
                    }
                    Entry::Occupied(_) => false,
                },
            };

            if !inserted {
                warn!(
                    "Duplicate binding {:?} for '{}' in {} mode, keeping the first one",
                    binding, definition.name, mode
                );
                skipped += 1;
            }
        }
    }

    info!(
        "Resolved {} mapping: {} taps, {} combos, {} holds ({} bindings skipped)",
        mode,
        tables.buttons.len(),
        tables.combos.len(),
        tables.holds.len(),
        skipped
    );
    tables
}

/// `Ok(None)` means "valid, but for another mode".
fn validate(binding: &RawBinding, mode: AnalysisMode) -> Result<Option<Resolved>, String> {
    let binding_mode: AnalysisMode = binding
        .mode
        .as_deref()
        .ok_or_else(|| "missing mode".to_string())?
        .parse()?;
    if binding_mode != mode {
        debug!("Binding {:?} belongs to {} mode", binding, binding_mode);
        return Ok(None);
    }

    let raw_index = binding
        .button_index
        .ok_or_else(|| "missing button index".to_string())?;
    let index = usize::try_from(raw_index)
        .ok()
        .filter(|i| *i < BUTTON_COUNT)
        .ok_or_else(|| format!("button index {} out of range", raw_index))?;

    match binding.modifier.as_deref().map(str::trim) {
        None | Some("") => {
            if binding.hold {
                Ok(Some(Resolved::Hold(index)))
            } else {
                Ok(Some(Resolved::Tap(index)))
            }
        }
        Some(name) => {
            let modifier: Modifier = name.parse()?;
            if modifier.button_index() == index {
                return Err(format!("{} cannot modify itself", modifier));
            }
            Ok(Some(Resolved::Combo(modifier, index)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::buttons::{A, LB, X};

    fn binding(index: i64, modifier: Option<&str>, hold: bool, mode: &str) -> RawBinding {
        RawBinding {
            button_index: Some(index),
            modifier: modifier.map(str::to_string),
            hold,
            mode: Some(mode.to_string()),
        }
    }

    fn definition(name: &str, bindings: Vec<RawBinding>) -> EventDefinition {
        EventDefinition {
            name: name.to_string(),
            bindings,
            ..Default::default()
        }
    }

    #[test]
    fn buckets_bindings_by_kind() {
        let defs = vec![
            definition("shot_end", vec![binding(0, None, false, "live")]),
            definition("pressing", vec![binding(2, None, true, "live")]),
            definition("corner", vec![binding(0, Some("lb"), false, "live")]),
        ];
        let tables = resolve(&defs, AnalysisMode::Live);

        assert_eq!(tables.button(A).map(|m| m.event_name.as_str()), Some("shot_end"));
        assert_eq!(tables.hold(X).map(|m| m.event_name.as_str()), Some("pressing"));
        assert_eq!(
            tables.combo(Modifier::Lb, A).map(|m| m.event_name.as_str()),
            Some("corner")
        );
        assert!(tables.button(X).is_none());
    }

    #[test]
    fn filters_by_mode() {
        let defs = vec![definition(
            "goal",
            vec![binding(3, None, false, "post_match"), binding(1, None, false, "live")],
        )];
        let live = resolve(&defs, AnalysisMode::Live);
        let post = resolve(&defs, AnalysisMode::PostMatch);

        assert!(live.button(3).is_none());
        assert!(live.button(1).is_some());
        assert!(post.button(3).is_some());
        assert!(post.button(1).is_none());
    }

    #[test]
    fn malformed_bindings_are_skipped_individually() {
        let defs = vec![definition(
            "foul",
            vec![
                RawBinding {
                    button_index: None,
                    mode: Some("live".into()),
                    ..Default::default()
                },
                binding(42, None, false, "live"),
                binding(-1, None, false, "live"),
                binding(1, Some("turbo"), false, "live"),
                binding(LB as i64, Some("lb"), false, "live"),
                RawBinding {
                    button_index: Some(1),
                    ..Default::default()
                },
                binding(2, None, false, "live"),
            ],
        )];
        let tables = resolve(&defs, AnalysisMode::Live);

        assert_eq!(tables.buttons.len(), 1);
        assert_eq!(tables.button(X).map(|m| m.event_name.as_str()), Some("foul"));
        assert!(tables.combos.is_empty());
    }

    #[test]
    fn first_binding_wins_on_collision() {
        let defs = vec![
            definition("shot", vec![binding(0, None, false, "live")]),
            definition("goal", vec![binding(0, None, false, "live")]),
            definition("corner", vec![binding(0, Some("rb"), false, "live")]),
            definition("throw_in", vec![binding(0, Some("rb"), false, "live")]),
        ];
        let tables = resolve(&defs, AnalysisMode::Live);

        assert_eq!(tables.button(A).map(|m| m.event_name.as_str()), Some("shot"));
        assert_eq!(
            tables.combo(Modifier::Rb, A).map(|m| m.event_name.as_str()),
            Some("corner")
        );
    }

    #[test]
    fn labels_fall_back_to_event_name() {
        let mut labelled = definition("shot", vec![binding(0, None, false, "live")]);
        labelled.label = Some("Shot".to_string());
        let defs = vec![labelled, definition("goal", vec![binding(1, None, false, "live")])];
        let tables = resolve(&defs, AnalysisMode::Live);

        assert_eq!(tables.button(0).map(|m| m.label.as_str()), Some("Shot"));
        assert_eq!(tables.button(1).map(|m| m.label.as_str()), Some("goal"));
    }
}
