use chrono::{Duration, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ds_game::game::{GamePlayer, MatchConfig, MatchState, Throw, ThrowLog, reconstruct};
use ds_game::game::{GameRecord, GameSnapshot, GameStatus};
use std::hint::black_box;
use uuid::Uuid;

/// Helper to create seated players
fn setup_players(n_players: usize) -> Vec<GamePlayer> {
    (1..=n_players)
        .map(|seat| GamePlayer {
            id: Uuid::new_v4(),
            name: format!("player{seat}"),
            seat: seat as u32,
        })
        .collect()
}

/// Helper to create a log of `n_throws` visits in turn order.
/// Scores cycle through a few values so legs get checked out along the way.
fn setup_throws(players: &[GamePlayer], n_throws: usize) -> Vec<Throw> {
    let start = Utc::now();
    let visits = [60, 100, 41, 140, 26, 85, 45];
    (0..n_throws)
        .map(|i| Throw {
            id: Uuid::new_v4(),
            game_id: Uuid::nil(),
            player_id: players[i % players.len()].id,
            visit_score: visits[i % visits.len()],
            darts_thrown: 3,
            created_at: start + Duration::milliseconds(i as i64),
        })
        .collect()
}

/// Benchmark full replay for growing logs
fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");
    let config = MatchConfig::new("X01", None, 5, 3, true).unwrap();
    let players = setup_players(2);

    for n_throws in [10, 100, 1_000] {
        let throws = setup_throws(&players, n_throws);
        group.bench_with_input(BenchmarkId::from_parameter(n_throws), &throws, |b, throws| {
            b.iter(|| reconstruct(black_box(&config), black_box(&players), black_box(throws)));
        });
    }
    group.finish();
}

/// Benchmark building the full match state, as every request does
fn bench_match_state(c: &mut Criterion) {
    let players = setup_players(4);
    let snapshot = GameSnapshot {
        record: GameRecord {
            id: Uuid::new_v4(),
            config: MatchConfig::new("X01", Some(301), 3, 1, true).unwrap(),
            status: GameStatus::InProgress,
            winner_id: None,
            created_at: Utc::now(),
        },
        throws: ThrowLog::new(setup_throws(&players, 200)),
        players,
    };

    c.bench_function("match_state_200_throws", |b| {
        b.iter(|| MatchState::from_snapshot(black_box(snapshot.clone())));
    });
}

criterion_group!(benches, bench_reconstruct, bench_match_state);
criterion_main!(benches);
