//! Blog Models
//! Mission: Post and comment data structures plus the pagination envelope

use serde::{Deserialize, Serialize};

/// A blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub content: String,
    pub created_at: String,
}

/// Post create/update body
#[derive(Debug, Deserialize)]
pub struct PostData {
    pub title: String,
    pub description: String,
    pub content: String,
}

/// A comment, always attached to a post
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub name: String,
    pub email: String,
    pub body: String,
    pub created_at: String,
}

/// Comment create/update body
#[derive(Debug, Deserialize)]
pub struct CommentData {
    pub name: String,
    pub email: String,
    pub body: String,
}

/// Listing query parameters. Defaults: first page, ten rows, id ascending.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageParams {
    pub page_no: u32,
    pub page_size: u32,
    pub sort_by: String,
    pub sort_dir: String,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page_no: 0,
            page_size: 10,
            sort_by: "id".to_string(),
            sort_dir: "asc".to_string(),
        }
    }
}

impl PageParams {
    pub fn descending(&self) -> bool {
        self.sort_dir.eq_ignore_ascii_case("desc")
    }

    /// Page size is clamped so a single request cannot sweep the table.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, 100)
    }
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page_no: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub last: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page_no: u32, page_size: u32, total_elements: u64) -> Self {
        let total_pages = if total_elements == 0 {
            0
        } else {
            total_elements.div_ceil(page_size as u64) as u32
        };
        let last = page_no + 1 >= total_pages;

        Self {
            content,
            page_no,
            page_size,
            total_elements,
            total_pages,
            last,
        }
    }
}
