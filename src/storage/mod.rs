use crate::models::{Page, Project, ProjectCreate, User, UserCreate};
use anyhow::Context;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};

pub struct Storage {
    conn: Connection,
}

const USER_COLUMNS: &str =
    "id, email, username, full_name, hashed_password, is_active, created_at, updated_at";

const PROJECT_COLUMNS: &str = "id, user_id, title, description, pixel_data_json, width, height, \
     tags_json, is_public, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        full_name: row.get(3)?,
        hashed_password: row.get(4)?,
        is_active: row.get::<_, i32>(5)? != 0,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Decode a JSON text column, reporting bad contents as a conversion failure on `idx`.
fn json_column<T: serde::de::DeserializeOwned>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let pixel_json: Option<String> = row.get(4)?;
    let tags_json: String = row.get(7)?;
    Ok(Project {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        pixel_data: pixel_json.map(|raw| json_column(4, &raw)).transpose()?,
        width: row.get(5)?,
        height: row.get(6)?,
        tags: json_column(7, &tags_json)?,
        is_public: row.get::<_, i32>(8)? != 0,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// True when `err` comes from a UNIQUE constraint, e.g. a duplicate email or username.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<rusqlite::Error>()
        .and_then(rusqlite::Error::sqlite_error)
        .is_some_and(|e| e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
}

fn pixel_data_json(
    data: Option<&serde_json::Map<String, serde_json::Value>>,
) -> anyhow::Result<Option<String>> {
    data.map(|m| serde_json::to_string(m).context("serialize pixel data"))
        .transpose()
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  email TEXT NOT NULL UNIQUE,
  username TEXT NOT NULL UNIQUE,
  full_name TEXT,
  hashed_password TEXT NOT NULL,
  is_active INTEGER NOT NULL DEFAULT 1,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
  title TEXT NOT NULL,
  description TEXT,
  pixel_data_json TEXT,
  width INTEGER,
  height INTEGER,
  tags_json TEXT NOT NULL DEFAULT '[]',
  is_public INTEGER NOT NULL DEFAULT 0,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_projects_user ON projects(user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_projects_public ON projects(is_public, created_at DESC);

CREATE TABLE IF NOT EXISTS sessions (
  token TEXT PRIMARY KEY,
  user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
  expires_at INTEGER NOT NULL,
  created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    // ---- users ----

    pub fn create_user(
        &self,
        new: &UserCreate,
        hashed_password: &str,
        now_unix: i64,
    ) -> anyhow::Result<User> {
        self.conn
            .execute(
                r#"
INSERT INTO users(email, username, full_name, hashed_password, is_active, created_at, updated_at)
VALUES(?1, ?2, ?3, ?4, 1, ?5, ?5)
"#,
                params![new.email, new.username, new.full_name, hashed_password, now_unix],
            )
            .context("insert user")?;
        let id = self.conn.last_insert_rowid();
        self.find_user_by_id(id)?
            .context("user vanished after insert")
    }

    pub fn find_user_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id=?1");
        self.conn
            .query_row(&sql, params![id], user_from_row)
            .optional()
            .context("query user by id")
    }

    pub fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email=?1");
        self.conn
            .query_row(&sql, params![email], user_from_row)
            .optional()
            .context("query user by email")
    }

    /// Whether another account already uses `email` or `username`.
    pub fn user_conflicts(
        &self,
        email: Option<&str>,
        username: Option<&str>,
        exclude_id: Option<i64>,
    ) -> anyhow::Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                r#"
SELECT COUNT(*) FROM users
WHERE (email=?1 OR username=?2) AND id != COALESCE(?3, -1)
"#,
                params![email, username, exclude_id],
                |row| row.get(0),
            )
            .context("query user conflicts")?;
        Ok(count > 0)
    }

    pub fn save_user(&self, user: &User) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
UPDATE users SET email=?2, username=?3, full_name=?4, is_active=?5, updated_at=?6
WHERE id=?1
"#,
                params![
                    user.id,
                    user.email,
                    user.username,
                    user.full_name,
                    user.is_active as i32,
                    user.updated_at
                ],
            )
            .context("update user")?;
        Ok(())
    }

    /// Returns false when no account has that email.
    pub fn set_user_active(&self, email: &str, active: bool, now_unix: i64) -> anyhow::Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE users SET is_active=?2, updated_at=?3 WHERE email=?1",
                params![email, active as i32, now_unix],
            )
            .context("set user active")?;
        if !active {
            self.conn
                .execute(
                    "DELETE FROM sessions WHERE user_id IN (SELECT id FROM users WHERE email=?1)",
                    params![email],
                )
                .context("revoke sessions")?;
        }
        Ok(changed > 0)
    }

    pub fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let mut stmt = self.conn.prepare(&sql).context("prepare list users")?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read users")?;
        Ok(users)
    }

    // ---- sessions ----

    pub fn create_session(
        &self,
        token: &str,
        user_id: i64,
        expires_at: i64,
        now_unix: i64,
    ) -> anyhow::Result<()> {
        self.conn
            .execute(
                "INSERT INTO sessions(token, user_id, expires_at, created_at) VALUES(?1, ?2, ?3, ?4)",
                params![token, user_id, expires_at, now_unix],
            )
            .context("create session")?;
        Ok(())
    }

    /// The active user owning an unexpired `token`.
    pub fn find_session_user(&self, token: &str, now_unix: i64) -> anyhow::Result<Option<User>> {
        self.conn
            .query_row(
                r#"
SELECT u.id, u.email, u.username, u.full_name, u.hashed_password, u.is_active, u.created_at, u.updated_at
FROM users u JOIN sessions s ON s.user_id = u.id
WHERE s.token=?1 AND s.expires_at > ?2 AND u.is_active = 1
"#,
                params![token, now_unix],
                user_from_row,
            )
            .optional()
            .context("query session")
    }

    pub fn delete_session(&self, token: &str) -> anyhow::Result<()> {
        self.conn
            .execute("DELETE FROM sessions WHERE token=?1", params![token])
            .context("delete session")?;
        Ok(())
    }

    pub fn purge_expired_sessions(&self, now_unix: i64) -> anyhow::Result<usize> {
        let n = self
            .conn
            .execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now_unix])
            .context("purge sessions")?;
        Ok(n)
    }

    // ---- projects ----

    pub fn create_project(
        &self,
        user_id: i64,
        new: &ProjectCreate,
        now_unix: i64,
    ) -> anyhow::Result<Project> {
        let tags = new.tags.clone().unwrap_or_default();
        let tags_json = serde_json::to_string(&tags).context("serialize tags")?;
        self.conn
            .execute(
                r#"
INSERT INTO projects(user_id, title, description, pixel_data_json, width, height, tags_json, is_public, created_at, updated_at)
VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
"#,
                params![
                    user_id,
                    new.title,
                    new.description,
                    pixel_data_json(new.pixel_data.as_ref())?,
                    new.width,
                    new.height,
                    tags_json,
                    new.is_public as i32,
                    now_unix
                ],
            )
            .context("insert project")?;
        let id = self.conn.last_insert_rowid();
        self.get_project(id, user_id)?
            .context("project vanished after insert")
    }

    /// A project, only if it belongs to `user_id`.
    pub fn get_project(&self, id: i64, user_id: i64) -> anyhow::Result<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id=?1 AND user_id=?2");
        self.conn
            .query_row(&sql, params![id, user_id], project_from_row)
            .optional()
            .context("query project")
    }

    pub fn list_projects(&self, user_id: i64, page: Page) -> anyhow::Result<Vec<Project>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id=?1 \
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql).context("prepare list projects")?;
        let projects = stmt
            .query_map(params![user_id, page.limit, page.skip], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read projects")?;
        Ok(projects)
    }

    pub fn list_public_projects(&self, page: Page) -> anyhow::Result<Vec<Project>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE is_public=1 \
             ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
        );
        let mut stmt = self.conn.prepare(&sql).context("prepare list public projects")?;
        let projects = stmt
            .query_map(params![page.limit, page.skip], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read public projects")?;
        Ok(projects)
    }

    pub fn save_project(&self, project: &Project) -> anyhow::Result<()> {
        let tags_json = serde_json::to_string(&project.tags).context("serialize tags")?;
        self.conn
            .execute(
                r#"
UPDATE projects SET title=?3, description=?4, pixel_data_json=?5, width=?6, height=?7,
  tags_json=?8, is_public=?9, updated_at=?10
WHERE id=?1 AND user_id=?2
"#,
                params![
                    project.id,
                    project.user_id,
                    project.title,
                    project.description,
                    pixel_data_json(project.pixel_data.as_ref())?,
                    project.width,
                    project.height,
                    tags_json,
                    project.is_public as i32,
                    project.updated_at
                ],
            )
            .context("update project")?;
        Ok(())
    }

    /// Returns false when the project does not exist or belongs to someone else.
    pub fn delete_project(&self, id: i64, user_id: i64) -> anyhow::Result<bool> {
        let n = self
            .conn
            .execute(
                "DELETE FROM projects WHERE id=?1 AND user_id=?2",
                params![id, user_id],
            )
            .context("delete project")?;
        Ok(n > 0)
    }
}

// rusqlite is blocking: open per operation on the blocking pool.
#[derive(Debug, Clone)]
pub struct StorageHandle {
    path: PathBuf,
}

impl StorageHandle {
    /// Opens once up front so schema errors surface at startup.
    pub fn new(path: PathBuf) -> anyhow::Result<Self> {
        Storage::open(&path)?;
        Ok(Self { path })
    }

    pub fn open(&self) -> anyhow::Result<Storage> {
        Storage::open(&self.path)
    }

    pub async fn run<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Storage) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let storage = Storage::open(&path)?;
            f(&storage)
        })
        .await
        .context("storage task failed")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("test.sqlite3")).unwrap();
        (dir, storage)
    }

    fn new_user(email: &str, username: &str) -> UserCreate {
        UserCreate {
            email: email.to_string(),
            username: username.to_string(),
            full_name: Some("Test User".to_string()),
            password: "irrelevant".to_string(),
        }
    }

    fn new_project(title: &str, is_public: bool) -> ProjectCreate {
        ProjectCreate {
            title: title.to_string(),
            description: None,
            pixel_data: serde_json::from_str(r##"{"pixels":[["#000000"]]}"##).ok(),
            width: Some(1),
            height: Some(1),
            tags: Some(vec!["sprite".to_string()]),
            is_public,
        }
    }

    #[test]
    fn test_create_and_find_user() {
        let (_dir, s) = temp_storage();
        let user = s.create_user(&new_user("a@x.io", "alice"), "hash", 100).unwrap();
        assert!(user.is_active);
        assert_eq!(user.created_at, 100);

        let by_email = s.find_user_by_email("a@x.io").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.hashed_password, "hash");
        assert!(s.find_user_by_email("b@x.io").unwrap().is_none());
    }

    #[test]
    fn test_user_conflicts() {
        let (_dir, s) = temp_storage();
        let alice = s.create_user(&new_user("a@x.io", "alice"), "h", 1).unwrap();

        assert!(s.user_conflicts(Some("a@x.io"), Some("other"), None).unwrap());
        assert!(s.user_conflicts(Some("new@x.io"), Some("alice"), None).unwrap());
        assert!(!s.user_conflicts(Some("new@x.io"), Some("bob"), None).unwrap());
        // An account never conflicts with itself.
        assert!(!s.user_conflicts(Some("a@x.io"), None, Some(alice.id)).unwrap());
    }

    #[test]
    fn test_sessions_expire_and_follow_active_flag() {
        let (_dir, s) = temp_storage();
        let user = s.create_user(&new_user("a@x.io", "alice"), "h", 1).unwrap();
        s.create_session("tok", user.id, 200, 100).unwrap();

        assert_eq!(s.find_session_user("tok", 150).unwrap().unwrap().id, user.id);
        assert!(s.find_session_user("tok", 200).unwrap().is_none());
        assert!(s.find_session_user("other", 150).unwrap().is_none());

        assert!(s.set_user_active("a@x.io", false, 160).unwrap());
        assert!(s.find_session_user("tok", 150).unwrap().is_none());
        assert!(!s.set_user_active("missing@x.io", false, 160).unwrap());
    }

    #[test]
    fn test_purge_expired_sessions() {
        let (_dir, s) = temp_storage();
        let user = s.create_user(&new_user("a@x.io", "alice"), "h", 1).unwrap();
        s.create_session("old", user.id, 50, 1).unwrap();
        s.create_session("new", user.id, 500, 1).unwrap();

        assert_eq!(s.purge_expired_sessions(100).unwrap(), 1);
        assert!(s.find_session_user("new", 100).unwrap().is_some());
        s.delete_session("new").unwrap();
        assert!(s.find_session_user("new", 100).unwrap().is_none());
    }

    #[test]
    fn test_project_crud_is_owner_scoped() {
        let (_dir, s) = temp_storage();
        let alice = s.create_user(&new_user("a@x.io", "alice"), "h", 1).unwrap();
        let bob = s.create_user(&new_user("b@x.io", "bob"), "h", 1).unwrap();

        let mut p = s.create_project(alice.id, &new_project("Sprite", false), 10).unwrap();
        assert_eq!(p.tags, vec!["sprite".to_string()]);
        assert!(p.pixel_data.as_ref().unwrap().contains_key("pixels"));

        assert!(s.get_project(p.id, bob.id).unwrap().is_none());
        assert!(!s.delete_project(p.id, bob.id).unwrap());

        p.title = "Renamed".to_string();
        p.updated_at = 20;
        s.save_project(&p).unwrap();
        let reloaded = s.get_project(p.id, alice.id).unwrap().unwrap();
        assert_eq!(reloaded.title, "Renamed");
        assert_eq!(reloaded.updated_at, 20);
        assert_eq!(reloaded.created_at, 10);

        assert!(s.delete_project(p.id, alice.id).unwrap());
        assert!(s.get_project(p.id, alice.id).unwrap().is_none());
    }

    #[test]
    fn test_list_projects_newest_first_with_paging() {
        let (_dir, s) = temp_storage();
        let alice = s.create_user(&new_user("a@x.io", "alice"), "h", 1).unwrap();
        for (i, title) in ["one", "two", "three"].iter().enumerate() {
            s.create_project(alice.id, &new_project(title, i != 1), i as i64).unwrap();
        }

        let all = s.list_projects(alice.id, Page::default()).unwrap();
        let titles: Vec<_> = all.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["three", "two", "one"]);

        let page = s.list_projects(alice.id, Page { skip: 1, limit: 1 }).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "two");

        let public = s.list_public_projects(Page::default()).unwrap();
        let titles: Vec<_> = public.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["three", "one"]);
    }

    #[test]
    fn test_duplicate_users_are_unique_violations() {
        let (_dir, s) = temp_storage();
        let alice = s.create_user(&new_user("a@x.io", "alice"), "h", 1).unwrap();
        let bob = s.create_user(&new_user("b@x.io", "bob"), "h", 1).unwrap();

        let err = s.create_user(&new_user("a@x.io", "alice2"), "h", 2).unwrap_err();
        assert!(is_unique_violation(&err));
        let err = s.create_user(&new_user("c@x.io", "bob"), "h", 2).unwrap_err();
        assert!(is_unique_violation(&err));

        let mut renamed = bob.clone();
        renamed.username = alice.username.clone();
        let err = s.save_user(&renamed).unwrap_err();
        assert!(is_unique_violation(&err));

        assert!(!is_unique_violation(&anyhow::anyhow!("disk on fire")));
    }

    #[test]
    fn test_corrupt_json_columns_are_errors() {
        let (_dir, s) = temp_storage();
        let alice = s.create_user(&new_user("a@x.io", "alice"), "h", 1).unwrap();
        let tagged = s.create_project(alice.id, &new_project("Tags", false), 1).unwrap();
        let pixels = s.create_project(alice.id, &new_project("Pixels", false), 2).unwrap();

        s.conn
            .execute("UPDATE projects SET tags_json='[\"oops' WHERE id=?1", params![tagged.id])
            .unwrap();
        s.conn
            .execute("UPDATE projects SET pixel_data_json='{' WHERE id=?1", params![pixels.id])
            .unwrap();

        assert!(s.get_project(tagged.id, alice.id).is_err());
        assert!(s.get_project(pixels.id, alice.id).is_err());
        assert!(s.list_projects(alice.id, Page::default()).is_err());
    }
}
