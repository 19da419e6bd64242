use anyhow::Result;
use compiti_core::{now_timestamp, TaskPatch};
use compiti_server::store::{StoreError, StoreRouter, TaskStore, WELCOME_TITLE};
use sqlx::{ConnectOptions, Connection};
use sqlx::sqlite::SqliteConnectOptions;
use tempfile::TempDir;

// Funzione di utilità: un router su una directory temporanea (annidata, quindi ancora da creare)
fn temp_router() -> Result<(TempDir, StoreRouter)> {
    let td = TempDir::new()?;
    let router = StoreRouter::new(td.path().join("data").join("databases"));
    Ok((td, router))
}

// Test che verifica che il primo accesso crei directory, file, tabella e compito di benvenuto
#[tokio::test]
async fn open_creates_file_table_and_welcome_task() -> Result<()> {
    let (_td, router) = temp_router()?;
    assert!(!router.data_dir().exists());

    let mut store = router.open("alice").await?;
    let path = store.path().to_path_buf();
    assert!(router.data_dir().is_dir(), "data dir should have been created");
    assert!(path.exists(), "db file should have been created");
    assert_eq!(path, router.path_for("alice"));

    let tasks = store.list().await?;
    store.close().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, WELCOME_TITLE);
    assert!(!tasks[0].completed);

    // controllo diretto sul file: c'è solo la tabella tasks
    let mut conn = SqliteConnectOptions::new().filename(&path).connect().await?;
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table'")
        .fetch_all(&mut conn)
        .await?;
    assert_eq!(names, vec!["tasks".to_string()]);
    conn.close().await?;
    Ok(())
}

// L'inizializzazione è idempotente: riaprire non aggiunge un secondo benvenuto
#[tokio::test]
async fn reopening_does_not_seed_again() -> Result<()> {
    let (_td, router) = temp_router()?;

    let store = router.open("alice").await?;
    store.close().await;

    let mut store = router.open("alice").await?;
    assert!(!store.ensure_initialized().await?, "already initialized");
    assert_eq!(store.list().await?.len(), 1);
    store.close().await;
    Ok(())
}

// Svuotare la lista non fa ripartire il seeding alla visita successiva
#[tokio::test]
async fn emptied_store_is_not_reseeded() -> Result<()> {
    let (_td, router) = temp_router()?;

    let mut store = router.open("alice").await?;
    for task in store.list().await? {
        store.delete(&task.id).await?;
    }
    store.close().await;

    let mut store = router.open("alice").await?;
    assert!(store.list().await?.is_empty());
    store.close().await;
    Ok(())
}

// Due prime richieste concorrenti sullo stesso utente producono un solo benvenuto
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_first_access_seeds_once() -> Result<()> {
    let (_td, router) = temp_router()?;

    let (a, b) = tokio::join!(router.open("alice"), router.open("alice"));
    a?.close().await;
    b?.close().await;

    let mut store = router.open("alice").await?;
    assert_eq!(store.list().await?.len(), 1);
    store.close().await;
    Ok(())
}

// Un file senza schema viene comunque inizializzato alla prima apertura tramite connect + ensure
#[tokio::test]
async fn ensure_initialized_on_bare_connection() -> Result<()> {
    let td = TempDir::new()?;
    let path = td.path().join("tasks_bare.db");

    let mut store = TaskStore::connect(&path).await?;
    assert!(store.ensure_initialized().await?, "first call seeds");
    assert!(!store.ensure_initialized().await?, "second call is a no-op");
    assert_eq!(store.list().await?.len(), 1);
    store.close().await;
    Ok(())
}

#[tokio::test]
async fn create_fills_server_side_fields() -> Result<()> {
    let (_td, router) = temp_router()?;
    let mut store = router.open("alice").await?;

    let start = now_timestamp();
    let task = store.create(Some("Buy milk".to_string()), None).await?;
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.description, None);
    assert!(!task.completed);
    assert!(!task.id.is_empty());
    assert!(task.created_at >= start, "{} < {}", task.created_at, start);

    let other = store.create(Some("Call mum".to_string()), Some("evening".to_string())).await?;
    assert_ne!(other.id, task.id);
    assert_eq!(other.description.as_deref(), Some("evening"));
    store.close().await;
    Ok(())
}

#[tokio::test]
async fn create_without_title_is_a_validation_error() -> Result<()> {
    let (_td, router) = temp_router()?;
    let mut store = router.open("alice").await?;

    assert!(matches!(store.create(None, None).await, Err(StoreError::Validation(_))));
    assert!(matches!(
        store.create(Some("   ".to_string()), Some("x".to_string())).await,
        Err(StoreError::Validation(_))
    ));
    // nessuna riga aggiunta oltre al benvenuto
    assert_eq!(store.list().await?.len(), 1);
    store.close().await;
    Ok(())
}

#[tokio::test]
async fn list_is_newest_first() -> Result<()> {
    let (_td, router) = temp_router()?;
    let mut store = router.open("alice").await?;

    for i in 0..10 {
        store.create(Some(format!("task {}", i)), None).await?;
    }
    let tasks = store.list().await?;
    store.close().await;

    assert_eq!(tasks.len(), 11);
    assert_eq!(tasks[0].title, "task 9");
    assert_eq!(tasks[10].title, WELCOME_TITLE);
    for pair in tasks.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
    Ok(())
}

#[tokio::test]
async fn update_touches_one_group_of_fields() -> Result<()> {
    let (_td, router) = temp_router()?;
    let mut store = router.open("alice").await?;
    let task = store.create(Some("Old".to_string()), Some("old desc".to_string())).await?;

    let done = store.update(&task.id, TaskPatch::Completed(true)).await?;
    assert!(done.completed);
    assert_eq!(done.title, "Old");
    assert_eq!(done.description.as_deref(), Some("old desc"));
    assert_eq!(done.created_at, task.created_at);

    let edited = store
        .update(&task.id, TaskPatch::Content { title: "New".to_string(), description: Some("D".to_string()) })
        .await?;
    assert_eq!(edited.title, "New");
    assert_eq!(edited.description.as_deref(), Some("D"));
    assert!(edited.completed, "content edit leaves completed alone");

    // descrizione omessa: diventa null
    let cleared = store
        .update(&task.id, TaskPatch::Content { title: "New".to_string(), description: None })
        .await?;
    assert_eq!(cleared.description, None);

    let unchanged = store.update(&task.id, TaskPatch::Noop).await?;
    assert_eq!(unchanged, cleared);
    store.close().await;
    Ok(())
}

#[tokio::test]
async fn update_of_missing_task_is_not_found() -> Result<()> {
    let (_td, router) = temp_router()?;
    let mut store = router.open("alice").await?;

    let err = store.update("does-not-exist", TaskPatch::Completed(true)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(ref id) if id == "does-not-exist"));
    let err = store.update("does-not-exist", TaskPatch::Noop).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    store.close().await;
    Ok(())
}

#[tokio::test]
async fn delete_is_idempotent() -> Result<()> {
    let (_td, router) = temp_router()?;
    let mut store = router.open("alice").await?;
    let task = store.create(Some("Buy milk".to_string()), None).await?;

    store.delete(&task.id).await?;
    assert!(store.get(&task.id).await?.is_none());
    store.delete(&task.id).await?;
    store.delete("never-existed").await?;
    store.close().await;
    Ok(())
}

// Utenti diversi hanno file diversi e non vedono i compiti altrui
#[tokio::test]
async fn users_are_isolated() -> Result<()> {
    let (_td, router) = temp_router()?;

    let mut alice = router.open("alice").await?;
    let mine = alice.create(Some("alice only".to_string()), None).await?;
    alice.close().await;

    let mut bob = router.open("bob").await?;
    let bobs = bob.list().await?;
    assert!(bobs.iter().all(|t| t.id != mine.id));
    assert!(bob.get(&mine.id).await?.is_none());
    // anche bob ha il suo benvenuto, con un id diverso
    assert_eq!(bobs.len(), 1);
    bob.close().await;

    assert_ne!(router.path_for("alice"), router.path_for("bob"));
    Ok(())
}
