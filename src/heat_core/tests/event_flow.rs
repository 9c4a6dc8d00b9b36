use std::collections::HashMap;

use heat_core::{
    complete_heat, compute_event_standings, finalize_event, rng_from_seed, season_leaderboard, season_totals,
    start_round, EngineError, Event, EventConfig, EventStatus, Racer, RacerId, ValidationError,
};

fn racers() -> Vec<Racer> {
    ["A", "B", "C", "D", "E", "F", "G"]
        .iter()
        .map(|id| Racer::new(*id, format!("Racer {}", id)))
        .collect()
}

fn new_event(id: &str, total_rounds: u32) -> Event {
    let ids = racers().into_iter().map(|r| r.id).collect();
    let config = EventConfig {
        total_rounds,
        racers_per_heat: 4,
    };
    Event::new(id, "Club Night", "2024-08-10", config, ids).unwrap()
}

/// Finish every heat in the latest round, reversing the listed order.
fn run_round(mut event: Event) -> Event {
    let heats: Vec<(String, Vec<RacerId>)> = event
        .current_round()
        .unwrap()
        .heats
        .iter()
        .map(|h| (h.id.clone(), h.racer_ids.iter().rev().cloned().collect()))
        .collect();
    for (heat_id, order) in heats {
        event = complete_heat(&event, &heat_id, &order).unwrap();
    }
    event
}

#[test]
fn seven_racers_four_per_heat() {
    let mut rng = rng_from_seed(Some(2024));
    let event = start_round(&new_event("e1", 1), &mut rng).unwrap();

    let round = &event.rounds[0];
    let sizes: Vec<usize> = round.heats.iter().map(|h| h.racer_ids.len()).collect();
    assert_eq!(sizes, vec![4, 3]);

    // Name the four racers of the first heat A..D by seat so the finish is [C, A, D, B]
    let seats = &round.heats[0].racer_ids;
    let order = vec![seats[2].clone(), seats[0].clone(), seats[3].clone(), seats[1].clone()];
    let event = complete_heat(&event, &round.heats[0].id, &order).unwrap();

    let scored = &event.rounds[0].heats[0];
    let awarded: Vec<u32> = order.iter().map(|r| scored.points_for(r).unwrap()).collect();
    assert_eq!(awarded, vec![4, 3, 2, 1]);
    assert_eq!(event.status(), EventStatus::InProgress);

    let second = event.rounds[0].heats[1].clone();
    let event = complete_heat(&event, &second.id, &second.racer_ids).unwrap();
    assert_eq!(event.status(), EventStatus::Completed);

    let standings = compute_event_standings(&event);
    assert_eq!(standings.len(), 7);
    assert!(standings.windows(2).all(|w| w[0].points >= w[1].points));
    assert_eq!(standings.iter().map(|e| e.points).sum::<u32>(), 10 + 6);
}

#[test]
fn full_event_to_season_points() {
    let mut rng = rng_from_seed(Some(77));
    let mut event = new_event("e1", 3);

    for round in 1..=3 {
        event = start_round(&event, &mut rng).unwrap();
        assert_eq!(event.rounds.len(), round);
        event = run_round(event);
    }
    assert!(event.is_complete());

    let err = start_round(&event, &mut rng).unwrap_err();
    assert_eq!(err, EngineError::Validation(ValidationError::AllRoundsStarted(3)));

    let mut roster = racers();
    roster[0].season_points = 20;
    let finalized = finalize_event(&event, &roster).unwrap();

    let standings: HashMap<_, _> = finalized
        .standings
        .iter()
        .map(|e| (e.racer_id.clone(), e.points))
        .collect();
    for (before, after) in roster.iter().zip(&finalized.racers) {
        assert_eq!(after.season_points, before.season_points + standings[&before.id]);
    }

    // A second finalize must not count the event twice
    assert!(finalize_event(&finalized.event, &finalized.racers).is_err());

    let replayed = season_totals(&[finalized.event.clone()]);
    assert_eq!(replayed, standings);

    let board = season_leaderboard(&finalized.racers, None);
    assert_eq!(board.len(), 7);
    assert!(board.windows(2).all(|w| w[0].season_points >= w[1].season_points));
}

#[test]
fn snapshot_survives_json_round_trip_mid_event() {
    let mut rng = rng_from_seed(Some(5));
    let event = run_round(start_round(&new_event("e1", 2), &mut rng).unwrap());
    let event = start_round(&event, &mut rng).unwrap();

    let json = serde_json::to_string_pretty(&event).unwrap();
    let restored: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, event);
    assert!(restored.check_consistency().is_ok());
    assert_eq!(compute_event_standings(&restored), compute_event_standings(&event));
}
