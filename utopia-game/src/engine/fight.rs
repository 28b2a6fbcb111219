//! Fights triggered by poor search results.
use crate::constants::{Artifact, DIE_FACES, Tool, Treasure, WorldEvent};
use crate::data::ContentTables;
use crate::error::InvariantViolation;
use crate::state::{
    EncounterRef, FightPad, GameState, Interrupt, RAW_MAX, RAW_MIN, ScratchPad, Status,
};

use super::search::location_def;

const MAX_LEVEL: u8 = 5;
const WAND_BONUS: u8 = 2;
const SPIRIT_BONUS: u8 = 1;

/// Encounter level for a raw result outside the find bands.
///
/// # Errors
///
/// Results in `0..=99` or beyond ±555 never lead to a fight.
pub fn encounter_level(raw: i32) -> Result<u8, InvariantViolation> {
    let level = match raw {
        100..=199 | -100..=-1 => 1,
        200..=299 | -200..=-101 => 2,
        300..=399 | -300..=-201 => 3,
        400..=499 | -400..=-301 => 4,
        500..=RAW_MAX | RAW_MIN..=-401 => 5,
        _ => return Err(InvariantViolation::ResultOutOfRange(raw)),
    };
    Ok(level)
}

/// Turn the search pad into a fight pad against the encounter the result calls for.
///
/// # Errors
///
/// Fails without a search pad, raw result or location.
pub(crate) fn setup_fight(
    state: &mut GameState,
    content: &ContentTables,
) -> Result<(), InvariantViolation> {
    let location_id = state.current_location()?;
    let location = location_def(content, location_id)?;
    let raw = state
        .search_pad()?
        .raw_result
        .ok_or(InvariantViolation::MissingResult)?;

    let mut level = encounter_level(raw)?;
    if state
        .events_at(location_id)
        .contains(&WorldEvent::ActiveMonsters)
    {
        level = (level + 2).min(MAX_LEVEL);
    }
    let encounter = location
        .encounter(level)
        .ok_or_else(|| InvariantViolation::MissingContent(format!("level {level} encounter")))?;
    let mut hit_range = content
        .hit_range(level)
        .ok_or_else(|| InvariantViolation::MissingContent(format!("level {level} hit range")))?;

    let hero = &state.character;
    if hero.treasure_is_active(Treasure::IcePlate) {
        hit_range = hit_range.shrink_enemy();
    }
    if hero.treasure_is_active(Treasure::TheMoltenShard) {
        hit_range = hit_range.widen_player();
    }
    let spirit_advantage = encounter.spirit && hero.artifact_is_active(Artifact::VoidGate);
    let offer_moonlace = hero.treasure_is_active(Treasure::ShimmeringMoonlace);

    let Some(ScratchPad::Search(mut search)) = state.scratch.take() else {
        return Err(InvariantViolation::MissingScratch);
    };
    search.die1 = None;
    search.die2 = None;
    search.interrupts.clear();
    if spirit_advantage {
        search.statuses.push(Status::SpiritAdvantage);
    }
    if offer_moonlace {
        search.interrupts.push(Interrupt::ShimmeringMoonlace);
    }
    state.scratch = Some(ScratchPad::Fight(FightPad {
        search,
        encounter_level: level,
        encounter: EncounterRef {
            location: location_id,
            level,
            name: encounter.name.clone(),
            spirit: encounter.spirit,
        },
        hit_range,
        defeated: false,
    }));
    state.push_log(format!(
        "You are attacked by {} (level {level})!",
        encounter.name
    ));
    Ok(())
}

/// Clear last round's wand decision and offer the wand again while it works.
///
/// # Errors
///
/// Fails without a fight pad.
pub(crate) fn begin_round(state: &mut GameState) -> Result<(), InvariantViolation> {
    let wand_ready = state.character.tool_is_active(Tool::ParalysisWand);
    let pad = state.fight_pad_mut()?;
    pad.search.reset_interrupt(Interrupt::ParalysisWand);
    pad.search.die1 = None;
    pad.search.die2 = None;
    if wand_ready {
        pad.search.interrupts.push(Interrupt::ParalysisWand);
    }
    Ok(())
}

/// Roll both dice and trade blows.
///
/// # Errors
///
/// Fails without a fight pad.
pub(crate) fn resolve_round(state: &mut GameState) -> Result<(), InvariantViolation> {
    let rolled = [state.roll_die(), state.roll_die()];
    let pad = state.fight_pad_mut()?;
    let mut bonus = 0;
    if pad.search.accepted(Interrupt::ParalysisWand) {
        bonus += WAND_BONUS;
    }
    if pad.search.has_status(Status::SpiritAdvantage) {
        bonus += SPIRIT_BONUS;
    }
    let dice = rolled.map(|d| (d + bonus).min(DIE_FACES));
    let damage = dice.iter().filter(|d| pad.hit_range.enemy_hits(**d)).count();
    let defeated = dice.iter().any(|d| pad.hit_range.player_hits(*d));
    pad.search.die1 = Some(dice[0]);
    pad.search.die2 = Some(dice[1]);
    pad.defeated = defeated;
    let name = pad.encounter.name.clone();

    let damage = i32::try_from(damage).unwrap_or(i32::MAX);
    state.character.harm(damage);
    state.push_log(format!("You roll {} and {}.", dice[0], dice[1]));
    if damage > 0 {
        state.push_log(format!(
            "{name} hits you for {damage} (hp {}).",
            state.character.hp
        ));
    }
    if defeated {
        state.push_log(format!("You defeat {name}!"));
    }
    log::debug!("round vs {name}: {dice:?} damage {damage} defeated {defeated}");
    Ok(())
}

/// One die for the spoils of a won fight.
///
/// # Errors
///
/// Fails without a fight pad or location.
pub(crate) fn loot(
    state: &mut GameState,
    content: &ContentTables,
) -> Result<(), InvariantViolation> {
    let location = location_def(content, state.current_location()?)?;
    let level = state.fight_pad()?.encounter_level;
    let die = state.roll_die();
    state.fight_pad_mut()?.search.die1 = Some(die);
    if die > level {
        state.push_log(format!("You roll {die} and find nothing of value."));
    } else if level == MAX_LEVEL && !state.character.has_treasure(location.treasure) {
        state.character.grant_treasure(location.treasure);
        state.push_log(format!("You roll {die} and claim {}!", location.treasure));
    } else {
        state.character.give_component(location.component, 1);
        state.push_log(format!("You roll {die} and salvage some {}.", location.component));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::state::SearchPad;

    fn searching_with_raw(location: u8, raw: i32) -> (GameState, std::sync::Arc<ContentTables>) {
        let content = ContentTables::load_from_static();
        let mut state = GameState::new("fight", &EngineConfig::default(), &content);
        let mut pad = SearchPad::new(0);
        pad.raw_result = Some(raw);
        state.location = Some(location);
        state.scratch = Some(ScratchPad::Search(pad));
        (state, content)
    }

    #[test]
    fn levels_follow_magnitude_bands() {
        assert_eq!(encounter_level(100), Ok(1));
        assert_eq!(encounter_level(199), Ok(1));
        assert_eq!(encounter_level(-1), Ok(1));
        assert_eq!(encounter_level(-100), Ok(1));
        assert_eq!(encounter_level(-101), Ok(2));
        assert_eq!(encounter_level(250), Ok(2));
        assert_eq!(encounter_level(-300), Ok(3));
        assert_eq!(encounter_level(-301), Ok(4));
        assert_eq!(encounter_level(499), Ok(4));
        assert_eq!(encounter_level(555), Ok(5));
        assert_eq!(encounter_level(-555), Ok(5));
        for raw in [0, 50, 99, 556, -556] {
            assert_eq!(
                encounter_level(raw),
                Err(InvariantViolation::ResultOutOfRange(raw))
            );
        }
    }

    #[test]
    fn active_monsters_raise_the_level() {
        let (mut state, content) = searching_with_raw(2, 150);
        state.location_events[1].push(WorldEvent::ActiveMonsters);
        setup_fight(&mut state, &content).unwrap();
        let fight = state.fight_pad().unwrap();
        assert_eq!(fight.encounter_level, 3);
        assert_eq!(fight.encounter.name, "Hornback Bison");

        let (mut state, content) = searching_with_raw(2, 450);
        state.location_events[1].push(WorldEvent::ActiveMonsters);
        setup_fight(&mut state, &content).unwrap();
        assert_eq!(state.fight_pad().unwrap().encounter_level, 5);
    }

    #[test]
    fn treasures_adjust_hit_ranges() {
        let (mut state, content) = searching_with_raw(1, 450);
        state.character.grant_treasure(Treasure::IcePlate);
        state.character.grant_treasure(Treasure::TheMoltenShard);
        setup_fight(&mut state, &content).unwrap();
        let range = state.fight_pad().unwrap().hit_range;
        assert_eq!((range.enemy_min, range.enemy_max), (1, 2));
        assert_eq!((range.player_min, range.player_max), (5, 6));
    }

    #[test]
    fn void_gate_helps_against_spirits_only() {
        let (mut state, content) = searching_with_raw(1, 520);
        state.character.grant_artifact(Artifact::VoidGate, true);
        setup_fight(&mut state, &content).unwrap();
        let fight = state.fight_pad().unwrap();
        assert!(fight.encounter.spirit);
        assert!(fight.search.has_status(Status::SpiritAdvantage));

        let (mut state, content) = searching_with_raw(1, 120);
        state.character.grant_artifact(Artifact::VoidGate, true);
        setup_fight(&mut state, &content).unwrap();
        assert!(!state.fight_pad().unwrap().search.has_status(Status::SpiritAdvantage));
    }

    #[test]
    fn moonlace_is_offered_before_the_first_roll() {
        let (mut state, content) = searching_with_raw(3, -220);
        state.character.grant_treasure(Treasure::ShimmeringMoonlace);
        setup_fight(&mut state, &content).unwrap();
        let fight = state.fight_pad().unwrap();
        assert_eq!(
            fight.search.interrupts.as_slice(),
            &[Interrupt::ShimmeringMoonlace]
        );
        assert_eq!(fight.encounter.name, "Land Shark");
    }

    #[test]
    fn wand_is_offered_each_round_until_spent() {
        let (mut state, content) = searching_with_raw(5, 150);
        setup_fight(&mut state, &content).unwrap();
        begin_round(&mut state).unwrap();
        assert!(state.fight_pad().unwrap().search.is_pending(Interrupt::ParalysisWand));
        {
            let pad = state.fight_pad_mut().unwrap();
            pad.search.interrupts.clear();
            pad.search.ignored.push(Interrupt::ParalysisWand);
        }
        begin_round(&mut state).unwrap();
        let pad = state.fight_pad().unwrap();
        assert!(pad.search.is_pending(Interrupt::ParalysisWand));
        assert!(pad.search.ignored.is_empty());

        state.character.use_item(Tool::ParalysisWand.into()).unwrap();
        begin_round(&mut state).unwrap();
        assert!(state.fight_pad().unwrap().search.interrupts.is_empty());
    }

    #[test]
    fn rounds_apply_damage_and_cap_dice() {
        let (mut state, content) = searching_with_raw(6, 500);
        setup_fight(&mut state, &content).unwrap();
        state
            .fight_pad_mut()
            .unwrap()
            .search
            .statuses
            .push(Status::Accepted {
                interrupt: Interrupt::ParalysisWand,
            });
        resolve_round(&mut state).unwrap();
        let pad = state.fight_pad().unwrap();
        let dice = [pad.search.die1.unwrap(), pad.search.die2.unwrap()];
        assert!(dice.iter().all(|d| (3..=6).contains(d)));
        let expected_damage = dice.iter().filter(|d| pad.hit_range.enemy_hits(**d)).count();
        assert_eq!(state.character.hp, 6 - i32::try_from(expected_damage).unwrap());
        assert_eq!(pad.defeated, dice.contains(&6));
    }

    #[test]
    fn looting_never_exceeds_one_reward() {
        let (mut state, content) = searching_with_raw(4, 530);
        setup_fight(&mut state, &content).unwrap();
        loot(&mut state, &content).unwrap();
        let die = state.fight_pad().unwrap().search.die1.unwrap();
        let hero = &state.character;
        let treasure = hero.has_treasure(Treasure::ScaleOfTheInfinityWurm);
        let component = hero.component_count(crate::constants::Component::Silica);
        if die <= 5 {
            assert!(treasure);
            assert_eq!(component, 0);
        } else {
            assert!(!treasure);
            assert_eq!(component, 0);
        }
    }
}
