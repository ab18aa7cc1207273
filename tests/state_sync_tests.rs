use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use naval_battle::{
    Cell, GameConfig, IdentityError, IdentityService, InMemoryIdentity, InMemoryStore, MatchDocument,
    MatchError, MatchId, MatchPatch, MatchRecord, MatchStatus, MatchStore, MatchSync,
    Orientation, PlayerId, PlayerStatus, Role, ScoreOrder, ShotOutcome, StoreError, SyncConfig,
    SyncError,
};
use serde_json::json;

const H: Orientation = Orientation::Horizontal;

/// Store that lets another writer slip in before the next `races` updates.
struct RacingStore {
    inner: InMemoryStore,
    races: AtomicUsize,
}

#[async_trait::async_trait]
impl MatchStore for RacingStore {
    async fn create_match(&self, document: MatchDocument) -> Result<MatchId, StoreError> {
        self.inner.create_match(document).await
    }

    async fn get_match(&self, id: &MatchId) -> Result<MatchRecord, StoreError> {
        self.inner.get_match(id).await
    }

    async fn update_match_fields(
        &self,
        id: &MatchId,
        expected_version: u64,
        patch: MatchPatch,
    ) -> Result<u64, StoreError> {
        let pending = self.races.load(Ordering::SeqCst);
        if pending > 0 {
            self.races.store(pending - 1, Ordering::SeqCst);
            self.inner
                .update_match_fields(id, expected_version, MatchPatch::default())
                .await?;
        }
        self.inner.update_match_fields(id, expected_version, patch).await
    }

    async fn query_matches_for_player(
        &self,
        player: &str,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        self.inner.query_matches_for_player(player, status).await
    }
}

struct Setup {
    matches: InMemoryStore,
    scores: InMemoryStore,
    identity: InMemoryIdentity,
    alice: PlayerId,
    bob: PlayerId,
}

fn config(fleet: Vec<usize>) -> SyncConfig {
    SyncConfig {
        game: GameConfig::new(8, fleet).unwrap(),
        ..SyncConfig::default()
    }
}

async fn setup() -> Setup {
    let identity = InMemoryIdentity::new();
    let alice = identity.register("Alice", "a").await.unwrap();
    let bob = identity.register("Bob", "b").await.unwrap();
    Setup {
        matches: InMemoryStore::new(),
        scores: InMemoryStore::new(),
        identity,
        alice,
        bob,
    }
}

impl Setup {
    fn client(&self, config: SyncConfig) -> MatchSync {
        MatchSync::new(
            Arc::new(self.matches.clone()),
            Arc::new(self.scores.clone()),
            Arc::new(self.identity.clone()),
            config,
        )
    }

    fn racing_client(&self, races: usize, config: SyncConfig) -> MatchSync {
        let store = RacingStore {
            inner: self.matches.clone(),
            races: AtomicUsize::new(races),
        };
        MatchSync::new(
            Arc::new(store),
            Arc::new(self.scores.clone()),
            Arc::new(self.identity.clone()),
            config,
        )
    }
}

/// Both single-cell fleets placed: Alice at (3,3), Bob at (5,5).
async fn started_match(s: &Setup, sync: &MatchSync) -> MatchId {
    let id = sync.challenge(&s.alice, "Bob").await.unwrap();
    sync.place_ship(&id, "Alice", (3, 3), 1, H).await.unwrap();
    let report = sync.place_ship(&id, "Bob", (5, 5), 1, H).await.unwrap();
    assert!(report.match_started);
    id
}

#[tokio::test]
async fn test_full_match_between_two_clients() {
    let s = setup().await;
    let alice = s.client(config(vec![1]));
    let bob = s.client(config(vec![1]));

    let id = alice.challenge(&s.alice, "Bob").await.unwrap();
    let view = bob.load_view(&id, "Bob").await.unwrap();
    assert_eq!(view.role, Role::Player2);
    assert_eq!(view.opponent, "Alice");
    assert_eq!(view.status, MatchStatus::Waiting);
    assert_eq!(view.my_status, PlayerStatus::Waiting);
    assert_eq!(view.version, 1);

    alice.place_ship(&id, "Alice", (3, 3), 1, H).await.unwrap();
    let view = bob.load_view(&id, "Bob").await.unwrap();
    assert_eq!(view.my_status, PlayerStatus::Placing);
    assert_eq!(view.remaining_fleet, vec![1]);
    assert_eq!(view.opponent_board.count(Cell::Ship), 0);

    bob.place_ship(&id, "Bob", (5, 5), 1, H).await.unwrap();
    let view = alice.load_view(&id, "Alice").await.unwrap();
    assert_eq!(view.status, MatchStatus::Active);
    assert!(view.is_my_turn());
    assert_eq!(view.own_board.get(3, 3).unwrap(), Cell::Ship);

    let shot = alice.fire(&id, "Alice", 5, 5).await.unwrap();
    assert_eq!(shot.outcome, ShotOutcome::Hit);
    assert!(shot.won);

    let view = bob.load_view(&id, "Bob").await.unwrap();
    assert_eq!(view.status, MatchStatus::Finished);
    assert_eq!(view.winner.as_deref(), Some("Alice"));
    assert_eq!(view.my_status, PlayerStatus::Looser);
    assert_eq!(view.opponent_status, PlayerStatus::Winner);
    assert_eq!(view.own_board.get(5, 5).unwrap(), Cell::Hit);

    let board = alice.leaderboard().await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].player_name, "Alice");
    assert_eq!(board[0].score, 0);

    // a second report of the same match writes nothing
    assert!(!bob.report_completion(&id).await.unwrap());
    assert_eq!(alice.leaderboard().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_misses_count_towards_the_score() {
    let s = setup().await;
    let sync = s.client(config(vec![1]));
    let id = started_match(&s, &sync).await;

    let miss = sync.fire(&id, "Alice", 0, 0).await.unwrap();
    assert_eq!(miss.next, Some(Role::Player2));
    assert!(matches!(
        sync.fire(&id, "Alice", 0, 1).await,
        Err(SyncError::Match(MatchError::NotYourTurn))
    ));
    sync.fire(&id, "Bob", 7, 7).await.unwrap();
    sync.fire(&id, "Alice", 5, 5).await.unwrap();

    let board = sync.leaderboard().await.unwrap();
    assert_eq!(board[0].score, 2);
}

#[tokio::test]
async fn test_rule_errors_leave_record_untouched() {
    let s = setup().await;
    let sync = s.client(config(vec![2]));
    let id = sync.challenge(&s.alice, "Bob").await.unwrap();
    let before = s.matches.raw_fields(&id).await.unwrap();

    assert!(matches!(
        sync.place_ship(&id, "Alice", (0, 7), 2, H).await,
        Err(SyncError::Match(MatchError::PlacementConflict(_)))
    ));
    assert!(matches!(
        sync.place_ship(&id, "Bob", (0, 0), 2, H).await,
        Err(SyncError::Match(MatchError::NotYourTurn))
    ));
    assert!(matches!(
        sync.load_view(&id, "Mallory").await,
        Err(SyncError::Match(MatchError::UnknownPlayer))
    ));
    assert_eq!(s.matches.raw_fields(&id).await.unwrap(), before);
    assert_eq!(sync.load_view(&id, "Alice").await.unwrap().version, 1);
}

#[tokio::test]
async fn test_unavailable_store_is_transient() {
    let s = setup().await;
    let sync = s.client(config(vec![1]));
    let id = sync.challenge(&s.alice, "Bob").await.unwrap();

    s.matches.set_available(false);
    let err = sync.place_ship(&id, "Alice", (0, 0), 1, H).await.unwrap_err();
    assert!(matches!(err, SyncError::StoreUnavailable(_)));
    assert!(err.is_transient());
    assert!(matches!(
        sync.challenge(&s.alice, "Bob").await,
        Err(SyncError::StoreUnavailable(_))
    ));

    s.matches.set_available(true);
    let view = sync.load_view(&id, "Alice").await.unwrap();
    assert_eq!(view.version, 1);
    assert_eq!(view.own_board.count(Cell::Ship), 0);
}

#[tokio::test]
async fn test_missing_match() {
    let s = setup().await;
    let sync = s.client(config(vec![1]));
    assert!(matches!(
        sync.load_view(&MatchId::new("match-999999"), "Alice").await,
        Err(SyncError::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn test_conflicting_write_is_replayed() {
    let s = setup().await;
    let sync = s.racing_client(2, config(vec![1]));
    let id = sync.challenge(&s.alice, "Bob").await.unwrap();

    let report = sync.place_ship(&id, "Alice", (2, 2), 1, H).await.unwrap();
    assert!(report.fleet_complete);

    let view = sync.load_view(&id, "Alice").await.unwrap();
    // two racing writes plus ours
    assert_eq!(view.version, 4);
    assert_eq!(view.own_board.count(Cell::Ship), 1);
    assert_eq!(view.opponent_status, PlayerStatus::Placing);
}

#[tokio::test]
async fn test_contention_gives_up() {
    let s = setup().await;
    let cfg = SyncConfig {
        max_write_retries: 2,
        ..config(vec![1])
    };
    let sync = s.racing_client(10, cfg);
    let id = sync.challenge(&s.alice, "Bob").await.unwrap();

    let err = sync.place_ship(&id, "Alice", (2, 2), 1, H).await.unwrap_err();
    assert!(matches!(err, SyncError::Contention { attempts: 3 }));
    assert!(err.is_transient());

    let view = sync.load_view(&id, "Alice").await.unwrap();
    assert_eq!(view.own_board.count(Cell::Ship), 0);
    assert_eq!(view.my_status, PlayerStatus::Placing);
}

#[tokio::test]
async fn test_concurrent_shot_is_checked_against_fresh_state() {
    let s = setup().await;
    let alice = s.client(config(vec![1]));
    let id = started_match(&s, &alice).await;

    // a stale second client replays its transition on the current record
    let racing = s.racing_client(1, config(vec![1]));
    let shot = racing.fire(&id, "Alice", 0, 0).await.unwrap();
    assert_eq!(shot.outcome, ShotOutcome::Miss);
    assert!(matches!(
        racing.fire(&id, "Alice", 0, 1).await,
        Err(SyncError::Match(MatchError::NotYourTurn))
    ));
    let view = alice.load_view(&id, "Bob").await.unwrap();
    assert!(view.is_my_turn());
    assert_eq!(view.turn, 1);
}

#[tokio::test]
async fn test_corrupt_documents_fail_closed() {
    let s = setup().await;
    let sync = s.client(config(vec![1]));
    let id = sync.challenge(&s.alice, "Bob").await.unwrap();

    let mut fields = s.matches.raw_fields(&id).await.unwrap();
    fields["boardPlayer1"][0]["state"] = json!("SUNK");
    s.matches.overwrite_raw_fields(&id, fields).await;
    assert!(matches!(
        sync.load_view(&id, "Alice").await,
        Err(SyncError::Corrupt { .. })
    ));

    let id = sync.challenge(&s.alice, "Bob").await.unwrap();
    let mut fields = s.matches.raw_fields(&id).await.unwrap();
    fields["trackingPlayer2"]
        .as_array_mut()
        .unwrap()
        .truncate(10);
    s.matches.overwrite_raw_fields(&id, fields).await;
    assert!(matches!(
        sync.place_ship(&id, "Alice", (0, 0), 1, H).await,
        Err(SyncError::Corrupt { .. })
    ));
}

#[tokio::test]
async fn test_score_written_later_when_sink_was_down() {
    let s = setup().await;
    let sync = s.client(config(vec![1]));
    let id = started_match(&s, &sync).await;

    s.scores.set_available(false);
    let err = sync.fire(&id, "Alice", 5, 5).await.unwrap_err();
    match &err {
        SyncError::ScoreNotRecorded { report, .. } => {
            assert_eq!(report.outcome, ShotOutcome::Hit);
            assert!(report.won);
            assert_eq!((report.row, report.col), (5, 5));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.is_transient());

    // the winning shot itself is committed
    let view = sync.load_view(&id, "Alice").await.unwrap();
    assert_eq!(view.my_status, PlayerStatus::Winner);

    s.scores.set_available(true);
    assert!(sync.report_completion(&id).await.unwrap());
    assert!(!sync.report_completion(&id).await.unwrap());
    assert_eq!(sync.leaderboard().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_report_completion_of_unfinished_match() {
    let s = setup().await;
    let sync = s.client(config(vec![1]));
    let id = started_match(&s, &sync).await;
    assert!(!sync.report_completion(&id).await.unwrap());
    assert!(sync.leaderboard().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_active_matches_newest_first() {
    let s = setup().await;
    let sync = s.client(config(vec![1]));
    let first = sync.challenge(&s.alice, "Bob").await.unwrap();
    let second = started_match(&s, &sync).await;

    let all = sync.active_matches("Bob", None).await.unwrap();
    let ids: Vec<_> = all.iter().map(|m| m.id.clone()).collect();
    assert_eq!(ids, vec![second.clone(), first.clone()]);
    assert_eq!(all[0].opponent, "Alice");
    assert_eq!(all[0].my_status, PlayerStatus::Waiting);

    let active = sync
        .active_matches("Alice", Some(MatchStatus::Active))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second);
    assert!(sync.active_matches("Carol", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_leaderboard_order_and_limit() {
    let s = setup().await;
    let sync = s.client(SyncConfig {
        leaderboard_limit: 1,
        ..config(vec![1])
    });
    for misses in [0, 1] {
        let id = started_match(&s, &sync).await;
        for i in 0..misses {
            sync.fire(&id, "Alice", 0, i).await.unwrap();
            sync.fire(&id, "Bob", 0, i).await.unwrap();
        }
        sync.fire(&id, "Alice", 5, 5).await.unwrap();
    }

    let top = sync.leaderboard().await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].score, 2);

    let low = sync.leaderboard_with(5, ScoreOrder::Ascending).await.unwrap();
    let scores: Vec<u32> = low.iter().map(|e| e.score).collect();
    assert_eq!(scores, vec![0, 2]);
}

#[tokio::test]
async fn test_challenge_validation() {
    let s = setup().await;
    let sync = s.client(config(vec![1]));
    assert!(matches!(
        sync.challenge(&s.alice, "Alice").await,
        Err(SyncError::SelfChallenge)
    ));
    assert!(matches!(
        sync.challenge(&s.alice, "Zed").await,
        Err(SyncError::UnknownOpponent(name)) if name == "Zed"
    ));
    assert!(matches!(
        sync.challenge(&PlayerId::new("ghost"), "Bob").await,
        Err(SyncError::Identity(IdentityError::NotFound))
    ));
    assert_eq!(sync.opponents(&s.bob).await.unwrap(), vec!["Alice".to_string()]);
}

#[tokio::test]
async fn test_two_players_holding_the_turn_is_corrupt() {
    let s = setup().await;
    let sync = s.client(config(vec![1]));
    let id = started_match(&s, &sync).await;

    let mut fields = s.matches.raw_fields(&id).await.unwrap();
    fields["player2Status"] = json!("playing");
    s.matches.overwrite_raw_fields(&id, fields).await;

    assert!(matches!(
        sync.load_view(&id, "Alice").await,
        Err(SyncError::Corrupt { .. })
    ));
    assert!(matches!(
        sync.fire(&id, "Bob", 0, 0).await,
        Err(SyncError::Corrupt { .. })
    ));
    assert!(matches!(
        sync.fire(&id, "Alice", 0, 1).await,
        Err(SyncError::Corrupt { .. })
    ));
}

#[tokio::test]
async fn test_winner_on_unfinished_match_is_corrupt() {
    let s = setup().await;
    let sync = s.client(config(vec![1]));
    let id = started_match(&s, &sync).await;

    let mut fields = s.matches.raw_fields(&id).await.unwrap();
    fields["winner"] = json!("Alice");
    s.matches.overwrite_raw_fields(&id, fields).await;
    assert!(matches!(
        sync.report_completion(&id).await,
        Err(SyncError::Corrupt { .. })
    ));
}

#[tokio::test]
async fn test_matches_from_separate_clients_score_separately() {
    let s = setup().await;
    let alice = s.client(config(vec![1]));
    let carol_id = s.identity.register("Carol", "c").await.unwrap();
    let carol = s.client(config(vec![1]));

    let first = alice.challenge(&s.alice, "Bob").await.unwrap();
    let second = carol.challenge(&carol_id, "Bob").await.unwrap();
    let created = |r: naval_battle::MatchRecord| r.document.created_at;
    let a = created(s.matches.get_match(&first).await.unwrap());
    let b = created(s.matches.get_match(&second).await.unwrap());
    assert!(b > a);

    for (id, sync, owner) in [(&first, &alice, "Alice"), (&second, &carol, "Carol")] {
        sync.place_ship(id, owner, (0, 0), 1, H).await.unwrap();
        sync.place_ship(id, "Bob", (5, 5), 1, H).await.unwrap();
        sync.fire(id, owner, 7, 7).await.unwrap();
        assert!(sync.fire(id, "Bob", 0, 0).await.unwrap().won);
    }

    let board = alice.leaderboard().await.unwrap();
    assert_eq!(board.len(), 2);
    assert!(board.iter().all(|e| e.player_name == "Bob"));
}
