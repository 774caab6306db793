//! Blog Storage
//! Mission: Persist posts and comments with SQLite, offset pagination

use crate::blog::models::{Comment, CommentData, Page, PageParams, Post, PostData};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

/// Post/comment storage with SQLite backend
pub struct BlogStore {
    db_path: String,
}

impl BlogStore {
    /// Create a new blog store and initialize the schema.
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
            )",
            [],
        )?;

        Ok(())
    }

    // ===== Posts =====

    pub fn create_post(&self, data: &PostData) -> Result<Post> {
        let conn = self.open()?;
        let created_at = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO posts (title, description, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![data.title, data.description, data.content, created_at],
        )
        .context("Failed to insert post")?;

        let id = conn.last_insert_rowid();
        info!(post_id = id, "Created post");

        Ok(Post {
            id,
            title: data.title.clone(),
            description: data.description.clone(),
            content: data.content.clone(),
            created_at,
        })
    }

    pub fn list_posts(&self, params: &PageParams) -> Result<Page<Post>> {
        let conn = self.open()?;

        let total: u64 =
            conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get::<_, i64>(0))? as u64;

        let page_size = params.effective_page_size();
        let order = order_clause(&params.sort_by, params.descending(), POST_SORT_COLUMNS);
        let sql = format!(
            "SELECT id, title, description, content, created_at FROM posts
             ORDER BY {order} LIMIT ?1 OFFSET ?2"
        );

        let mut stmt = conn.prepare(&sql)?;
        let posts = stmt
            .query_map(
                params![page_size as i64, params.page_no as i64 * page_size as i64],
                row_to_post,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(posts, params.page_no, page_size, total))
    }

    pub fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT id, title, description, content, created_at FROM posts WHERE id = ?1",
            params![id],
            row_to_post,
        )
        .optional()
        .context("Failed to query post")
    }

    pub fn update_post(&self, id: i64, data: &PostData) -> Result<Option<Post>> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE posts SET title = ?1, description = ?2, content = ?3 WHERE id = ?4",
            params![data.title, data.description, data.content, id],
        )?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_post(id)
    }

    pub fn delete_post(&self, id: i64) -> Result<bool> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        if rows > 0 {
            info!(post_id = id, "Deleted post");
        }
        Ok(rows > 0)
    }

    pub fn post_exists(&self, id: i64) -> Result<bool> {
        let conn = self.open()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ===== Comments =====

    pub fn create_comment(&self, post_id: i64, data: &CommentData) -> Result<Comment> {
        let conn = self.open()?;
        let created_at = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO comments (post_id, name, email, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![post_id, data.name, data.email, data.body, created_at],
        )
        .context("Failed to insert comment")?;

        let id = conn.last_insert_rowid();

        Ok(Comment {
            id,
            post_id,
            name: data.name.clone(),
            email: data.email.clone(),
            body: data.body.clone(),
            created_at,
        })
    }

    pub fn list_comments(&self, post_id: i64, params: &PageParams) -> Result<Page<Comment>> {
        let conn = self.open()?;

        let total: u64 = conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
            params![post_id],
            |row| row.get::<_, i64>(0),
        )? as u64;

        let page_size = params.effective_page_size();
        let order = order_clause(&params.sort_by, params.descending(), COMMENT_SORT_COLUMNS);
        let sql = format!(
            "SELECT id, post_id, name, email, body, created_at FROM comments
             WHERE post_id = ?1 ORDER BY {order} LIMIT ?2 OFFSET ?3"
        );

        let mut stmt = conn.prepare(&sql)?;
        let comments = stmt
            .query_map(
                params![
                    post_id,
                    page_size as i64,
                    params.page_no as i64 * page_size as i64
                ],
                row_to_comment,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(comments, params.page_no, page_size, total))
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT id, post_id, name, email, body, created_at FROM comments WHERE id = ?1",
            params![id],
            row_to_comment,
        )
        .optional()
        .context("Failed to query comment")
    }

    pub fn update_comment(&self, id: i64, data: &CommentData) -> Result<Option<Comment>> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE comments SET name = ?1, email = ?2, body = ?3 WHERE id = ?4",
            params![data.name, data.email, data.body, id],
        )?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_comment(id)
    }

    pub fn delete_comment(&self, id: i64) -> Result<bool> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}

const POST_SORT_COLUMNS: &[(&str, &str)] = &[
    ("id", "id"),
    ("title", "title"),
    ("description", "description"),
    ("createdAt", "created_at"),
];

const COMMENT_SORT_COLUMNS: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("email", "email"),
    ("createdAt", "created_at"),
];

/// Sort columns are whitelisted; anything unrecognized falls back to id.
fn order_clause(sort_by: &str, descending: bool, columns: &[(&str, &str)]) -> String {
    let column = columns
        .iter()
        .find(|(wire, _)| wire.eq_ignore_ascii_case(sort_by))
        .map(|(_, col)| *col)
        .unwrap_or("id");

    let dir = if descending { "DESC" } else { "ASC" };
    format!("{column} {dir}")
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
    })
}
