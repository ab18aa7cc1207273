use std::sync::Arc;

use clap::Parser;
use naval_battle::{
    init_logging, random_placement, Cell, GameConfig, IdentityService, InMemoryIdentity,
    InMemoryStore, MatchId, MatchSync, PlayerStatus, SyncConfig, BOARD_SIZE, FLEET,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tokio::time::{sleep, Duration};

/// Play one match between two random clients that only talk through a shared store.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RNG seed of the first player.
    seed1: u64,
    /// RNG seed of the second player.
    seed2: u64,
    #[arg(long, default_value_t = BOARD_SIZE)]
    board_size: usize,
}

/// Drive one client until the match is over. Returns the number of shots fired.
async fn play(sync: MatchSync, id: MatchId, me: String, mut rng: SmallRng) -> anyhow::Result<usize> {
    let mut shots = 0;
    loop {
        let view = sync.load_view(&id, &me).await?;
        match view.my_status {
            PlayerStatus::Placing => {
                let Some(&size) = view.remaining_fleet.first() else {
                    anyhow::bail!("{} is placing with an empty fleet", me);
                };
                let (origin, orient) = random_placement(&view.own_board, size, &mut rng)?;
                sync.place_ship(&id, &me, origin, size, orient).await?;
            }
            PlayerStatus::Playing => {
                let open: Vec<(usize, usize)> = view
                    .tracking_board
                    .iter()
                    .filter(|&(_, cell)| cell == Cell::Empty)
                    .map(|(pos, _)| pos)
                    .collect();
                let (r, c) = open[rng.random_range(0..open.len())];
                sync.fire(&id, &me, r, c).await?;
                shots += 1;
            }
            PlayerStatus::Waiting => sleep(Duration::from_millis(1)).await,
            PlayerStatus::Winner | PlayerStatus::Looser => return Ok(shots),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging();

    let config = SyncConfig {
        game: GameConfig::new(args.board_size, FLEET.to_vec())?,
        ..SyncConfig::from_env()
    };
    let store = InMemoryStore::new();
    let identity = InMemoryIdentity::new();
    let alice = identity.register("alice", "alice-secret").await?;
    identity.register("bob", "bob-secret").await?;

    let client = || {
        MatchSync::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(identity.clone()),
            config.clone(),
        )
    };
    let id = client().challenge(&alice, "bob").await?;

    let p1 = tokio::spawn(play(
        client(),
        id.clone(),
        "alice".into(),
        SmallRng::seed_from_u64(args.seed1),
    ));
    let p2 = tokio::spawn(play(
        client(),
        id.clone(),
        "bob".into(),
        SmallRng::seed_from_u64(args.seed2),
    ));
    let shots1 = p1.await??;
    let shots2 = p2.await??;

    let view = client().load_view(&id, "alice").await?;
    let result = json!({
        "match": id.as_str(),
        "winner": view.winner,
        "turns": view.turn,
        "player1": {"status": view.my_status.as_str(), "shots": shots1},
        "player2": {"status": view.opponent_status.as_str(), "shots": shots2},
    });
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
