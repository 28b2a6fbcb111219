use utopia_game::{
    AssignPhase, Command, Engine, LocalIdle, Phase, ResolutionEntry, SearchPhase, Slot, Snapshot,
};

const COMMAND_CAP: usize = 5_000;

/// Simple scripted player: fill slots in order, decline every interrupt,
/// search each location twice before moving on.
fn next_command(snap: &Snapshot, searches: &mut usize) -> Option<Command> {
    match snap.phase {
        Phase::GameOver => None,
        Phase::Idle => {
            let location = u8::try_from(*searches / 2 % 6).unwrap() + 1;
            *searches += 1;
            Some(Command::search(location))
        }
        Phase::Searching(SearchPhase::Assigning(AssignPhase::Waiting)) => {
            let pad = snap.state.search_pad().unwrap();
            let value = pad.die1.or(pad.die2).unwrap();
            let slot = Slot::REQUIRED
                .into_iter()
                .find(|s| pad.slot(*s).is_none())
                .unwrap();
            Some(Command::assign(value, slot.letter().to_string()))
        }
        Phase::Searching(SearchPhase::Idle(LocalIdle::Waiting)) => {
            if *searches % 2 == 1 {
                *searches += 1;
                Some(Command::Again)
            } else {
                Some(Command::Leave)
            }
        }
        _ => {
            let pad = snap.state.shared_pad().unwrap();
            let answers = pad
                .interrupts
                .iter()
                .map(|i| ResolutionEntry::decline(*i))
                .collect();
            Some(Command::resolve(answers))
        }
    }
}

fn play(engine: &mut Engine, limit: usize) -> Vec<Command> {
    let mut searches = 0;
    let mut played = Vec::new();
    while played.len() < limit {
        let Some(command) = next_command(&engine.snapshot(), &mut searches) else {
            break;
        };
        engine.submit(command.clone()).unwrap();
        played.push(command);
    }
    played
}

#[test]
fn scripted_games_reach_game_over() {
    for seed in ["alpha", "bravo", "charlie", "delta", "echo"] {
        let mut engine = Engine::new(Some(seed), 0).unwrap();
        let played = play(&mut engine, COMMAND_CAP);
        assert!(played.len() < COMMAND_CAP, "seed {seed} never ended");
        let snap = engine.snapshot();
        assert_eq!(snap.state_path, "gameOver");
        assert!(snap.state.game_over);
        assert!(snap.state.character.hp >= -2);
    }
}

#[test]
fn replaying_the_same_commands_gives_the_same_game() {
    let mut first = Engine::new(Some("replay"), 0).unwrap();
    let played = play(&mut first, COMMAND_CAP);

    let mut second = Engine::new(Some("replay"), 0).unwrap();
    for command in played {
        second.submit(command).unwrap();
    }
    assert_eq!(first.snapshot(), second.snapshot());
    assert_eq!(first.snapshot().log(), second.snapshot().log());
}

#[test]
fn a_saved_snapshot_continues_identically() {
    let mut straight = Engine::new(Some("resume"), 0).unwrap();
    let opening = play(&mut straight, 25);
    let json = serde_json::to_string(&straight.snapshot()).unwrap();
    let mut rest_engine = straight.clone();
    let mut searches = opening
        .iter()
        .filter(|c| matches!(c, Command::Search { .. } | Command::Again))
        .count();

    let snapshot: Snapshot = serde_json::from_str(&json).unwrap();
    let mut resumed = Engine::resume(snapshot).unwrap();
    assert_eq!(resumed.snapshot(), rest_engine.snapshot());

    for _ in 0..25 {
        let Some(command) = next_command(&rest_engine.snapshot(), &mut searches) else {
            break;
        };
        let a = rest_engine.submit(command.clone()).unwrap();
        let b = resumed.submit(command).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn different_seeds_draw_differently() {
    let a = Engine::new(Some("testing"), 0).unwrap();
    let b = Engine::new(Some("testing!"), 0).unwrap();
    assert_ne!(a.state().rng_state, b.state().rng_state);
}

#[test]
fn rejections_leave_no_trace_in_a_replay() {
    let mut noisy = Engine::new(Some("noise"), 0).unwrap();
    let mut quiet = Engine::new(Some("noise"), 0).unwrap();
    let mut searches_noisy = 0;
    let mut searches_quiet = 0;
    for _ in 0..40 {
        let snap = noisy.snapshot();
        assert!(noisy.submit(Command::camp(0)).is_err());
        assert!(noisy.submit(Command::search(9)).is_err());
        assert_eq!(noisy.snapshot(), snap);
        let Some(command) = next_command(&snap, &mut searches_noisy) else {
            break;
        };
        let expected = next_command(&quiet.snapshot(), &mut searches_quiet).unwrap();
        assert_eq!(command, expected);
        noisy.submit(command).unwrap();
        quiet.submit(expected).unwrap();
    }
    assert_eq!(noisy.snapshot(), quiet.snapshot());
}
