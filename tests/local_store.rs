use newsview::db;
use newsview::model::InteractionState;
use newsview::store::{self, KeyValueStore, SqliteStore};

async fn open(dir: &std::path::Path) -> SqliteStore {
    let url = format!("sqlite://{}/newsview.db", dir.display());
    SqliteStore::connect(&url).await.unwrap()
}

#[tokio::test]
async fn stores_on_same_file_share_identity_and_snapshots() {
    let td = tempfile::tempdir().unwrap();
    let first = open(td.path()).await;
    let second = open(td.path()).await;

    let guest = store::resolve_identity(&first).await.unwrap();
    assert_eq!(store::resolve_identity(&second).await.unwrap(), guest);

    store::save_snapshot(
        &first,
        "a1",
        &InteractionState {
            liked: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    store::save_snapshot(
        &second,
        "a1",
        &InteractionState {
            saved: true,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let seen = store::load_snapshot(&first, "a1").await.unwrap().unwrap();
    assert!(seen.saved);
    assert!(!seen.liked, "last write replaces the whole snapshot");
}

#[tokio::test]
async fn forgotten_snapshot_leaves_identity_alone() {
    let td = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/kv.db", td.path().display());
    let pool = db::init_pool(&url).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    let kv = SqliteStore::new(pool.clone());

    for id in ["x", "y"] {
        store::save_snapshot(&kv, id, &InteractionState::default())
            .await
            .unwrap();
    }
    kv.set(store::GUEST_ID_KEY, "guest-1-a").await.unwrap();

    let rows = db::kv_list_prefix(&pool, "article_").await.unwrap();
    let keys: Vec<_> = rows.into_iter().map(|r| r.key).collect();
    assert_eq!(keys, vec!["article_x_interactions", "article_y_interactions"]);

    store::forget_snapshot(&kv, "x").await.unwrap();
    let left: Vec<_> = kv
        .snapshots()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.article_id)
        .collect();
    assert_eq!(left, vec!["y"]);
    assert_eq!(
        kv.get(store::GUEST_ID_KEY).await.unwrap().as_deref(),
        Some("guest-1-a")
    );
}
