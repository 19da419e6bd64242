//! Un database SQLite per utente.
//!
//! [`StoreRouter`] ricava dal `user_id` il percorso del file e apre un [`TaskStore`],
//! cioè una singola connessione che vive solo per la durata di una richiesta.
//! Nessun pool: si apre, si eseguono gli statement (in autocommit) e si chiude.

use compiti_core::{new_task_id, now_timestamp, Task, TaskPatch};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Versione dello schema salvata in `PRAGMA user_version`.
/// 0 = database appena creato, ancora da inizializzare.
const SCHEMA_VERSION: i64 = 1;

const CREATE_TASKS: &str = r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id          TEXT PRIMARY KEY,
        title       TEXT NOT NULL,
        description TEXT,
        completed   BOOLEAN NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL
    );"#;

const SELECT_TASK_COLUMNS: &str = "SELECT id, title, description, completed, created_at FROM tasks";

pub const WELCOME_TITLE: &str = "Welcome to your task list";
pub const WELCOME_DESCRIPTION: &str =
    "Add, complete and delete tasks. Your list is private to this browser.";

/// Messaggio fisso per il titolo mancante, restituito così com'è al client.
pub const TITLE_REQUIRED: &str = "Title is required";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Validation(String),
    #[error("task not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Instrada un identificativo utente verso il suo file di database.
#[derive(Debug, Clone)]
pub struct StoreRouter {
    data_dir: PathBuf,
}

impl StoreRouter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Percorso deterministico del database di `user_id`: `<data_dir>/tasks_<user_id>.db`.
    /// Non valida l'id: chi chiama deve passare solo id già controllati (vedi `identity`).
    pub fn path_for(&self, user_id: &str) -> PathBuf {
        self.data_dir.join(format!("tasks_{}.db", user_id))
    }

    /// Come `path_for`, ma crea anche la directory che contiene i database (idempotente).
    pub fn resolve(&self, user_id: &str) -> StoreResult<PathBuf> {
        std::fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })?;
        Ok(self.path_for(user_id))
    }

    /// Apre il database dell'utente, creandolo e inizializzandolo se serve.
    /// Il TaskStore restituito va chiuso con `close` (o rilasciato col drop) a fine richiesta.
    pub async fn open(&self, user_id: &str) -> StoreResult<TaskStore> {
        let path = self.resolve(user_id)?;
        let mut store = TaskStore::connect(&path).await?;
        store.ensure_initialized().await?;
        Ok(store)
    }
}

/// Una connessione aperta sul database di un singolo utente.
#[derive(Debug)]
pub struct TaskStore {
    conn: SqliteConnection,
    path: PathBuf,
}

impl TaskStore {
    /// Apre (creando il file se manca) il database in `path`. Non crea lo schema.
    pub async fn connect(path: &Path) -> StoreResult<Self> {
        let conn = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .connect()
            .await?;
        Ok(Self { conn, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Crea la tabella e inserisce il compito di benvenuto, una volta sola per database.
    ///
    /// Idempotente: il lavoro viene fatto solo se `user_version` è ancora 0, dentro
    /// una transazione `BEGIN IMMEDIATE` così due prime richieste concorrenti non
    /// inseriscono due benvenuti. Una volta marcato il database, svuotarlo non
    /// fa ripartire il seeding. Restituisce true se ha inserito il benvenuto.
    pub async fn ensure_initialized(&mut self) -> StoreResult<bool> {
        if self.schema_version().await? >= SCHEMA_VERSION {
            return Ok(false);
        }

        sqlx::query("BEGIN IMMEDIATE").execute(&mut self.conn).await?;
        match self.initialize_locked().await {
            Ok(seeded) => {
                sqlx::query("COMMIT").execute(&mut self.conn).await?;
                if seeded {
                    info!(path = ?self.path, "created task store with welcome task");
                }
                Ok(seeded)
            }
            Err(e) => {
                if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut self.conn).await {
                    warn!(error = %rollback, path = ?self.path, "rollback of store initialization failed");
                }
                Err(e)
            }
        }
    }

    async fn schema_version(&mut self) -> StoreResult<i64> {
        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&mut self.conn)
            .await?;
        Ok(version)
    }

    // Da chiamare solo con la transazione aperta.
    async fn initialize_locked(&mut self) -> StoreResult<bool> {
        // un'altra richiesta potrebbe aver finito l'inizializzazione mentre aspettavamo il lock
        if self.schema_version().await? >= SCHEMA_VERSION {
            return Ok(false);
        }
        sqlx::query(CREATE_TASKS).execute(&mut self.conn).await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(&mut self.conn)
            .await?;
        let seeded = existing == 0;
        if seeded {
            self.insert(&new_task_id(), WELCOME_TITLE, Some(WELCOME_DESCRIPTION)).await?;
        }

        // PRAGMA non accetta parametri bind
        sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
            .execute(&mut self.conn)
            .await?;
        Ok(seeded)
    }

    /// Tutti i compiti, dal più recente al più vecchio.
    pub async fn list(&mut self) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "{} ORDER BY created_at DESC, rowid DESC",
            SELECT_TASK_COLUMNS
        ))
        .fetch_all(&mut self.conn)
        .await?;

        let tasks = rows.iter().map(task_from_row).collect::<Result<Vec<_>, _>>()?;
        debug!(path = ?self.path, count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    pub async fn get(&mut self, id: &str) -> StoreResult<Option<Task>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_TASK_COLUMNS))
            .bind(id)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(row.as_ref().map(task_from_row).transpose()?)
    }

    /// Inserisce un nuovo compito (non completato) e restituisce la riga appena scritta.
    pub async fn create(&mut self, title: Option<String>, description: Option<String>) -> StoreResult<Task> {
        let title = match title {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Err(StoreError::Validation(TITLE_REQUIRED.to_string())),
        };
        let id = new_task_id();
        self.insert(&id, &title, description.as_deref()).await?;
        debug!(path = ?self.path, task_id = %id, "created task");

        self.get(&id).await?.ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn insert(&mut self, id: &str, title: &str, description: Option<&str>) -> StoreResult<()> {
        sqlx::query("INSERT INTO tasks (id, title, description, completed, created_at) VALUES (?, ?, ?, 0, ?)")
            .bind(id)
            .bind(title)
            .bind(description)
            .bind(now_timestamp())
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    /// Applica la patch e rilegge la riga. Se l'id non esiste restituisce NotFound
    /// (anche per il no-op, che non scrive niente).
    pub async fn update(&mut self, id: &str, patch: TaskPatch) -> StoreResult<Task> {
        match &patch {
            TaskPatch::Completed(completed) => {
                sqlx::query("UPDATE tasks SET completed = ? WHERE id = ?")
                    .bind(*completed)
                    .bind(id)
                    .execute(&mut self.conn)
                    .await?;
            }
            TaskPatch::Content { title, description } => {
                sqlx::query("UPDATE tasks SET title = ?, description = ? WHERE id = ?")
                    .bind(title)
                    .bind(description)
                    .bind(id)
                    .execute(&mut self.conn)
                    .await?;
            }
            TaskPatch::Noop => {}
        }
        debug!(path = ?self.path, task_id = %id, ?patch, "updated task");

        self.get(id).await?.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Cancella il compito; un id inesistente non è un errore.
    pub async fn delete(&mut self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&mut self.conn)
            .await?;
        debug!(path = ?self.path, task_id = %id, removed = result.rows_affected(), "deleted task");
        Ok(())
    }

    /// Chiude la connessione. Gli statement sono già committati, quindi un errore
    /// qui viene solo loggato.
    pub async fn close(self) {
        let path = self.path;
        if let Err(e) = self.conn.close().await {
            warn!(error = %e, path = ?path, "closing task store failed");
        }
    }
}

fn task_from_row(row: &SqliteRow) -> Result<Task, sqlx::Error> {
    Ok(Task {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        completed: row.try_get("completed")?,
        created_at: row.try_get("created_at")?,
    })
}
