use chrono::{DateTime, SecondsFormat, Utc};
use cipherpress_engine::Document;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::store::{DocumentStore, Record, StoreError};

pub const POSTS_COLLECTION: &str = "posts";

/// Words per minute assumed by the read-time estimate.
const READ_SPEED_WPM: usize = 200;
/// Maximum excerpt length in chars.
const EXCERPT_LEN: usize = 160;

/// Timestamps persist as fixed-width RFC 3339 strings (millisecond
/// precision, `Z` suffix) so the store's lexicographic ordering matches
/// chronological ordering.
mod rfc3339_millis {
    use super::*;
    use serde::{Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}

/// A published post as stored in the `posts` collection.
///
/// Field names match the stored document shape; `content` is the
/// serialized body markup, persisted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_photo_url: Option<String>,
    pub tags: Vec<String>,
    #[serde(with = "rfc3339_millis")]
    pub published_at: DateTime<Utc>,
    #[serde(with = "rfc3339_millis")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl Post {
    fn to_record(&self) -> Result<Record, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            // A struct always serializes to an object.
            _ => Ok(Record::new()),
        }
    }

    fn from_record(id: String, record: Record) -> Result<Self, serde_json::Error> {
        let mut post: Post = serde_json::from_value(Value::Object(record))?;
        post.id = id;
        Ok(post)
    }
}

/// What a caller supplies when publishing a new post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub author_photo_url: Option<String>,
    pub tags: Vec<String>,
}

/// Partial update of an existing post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum PostError {
    #[error("failed to create post: {0}")]
    Create(#[source] StoreError),
    #[error("failed to update post: {0}")]
    Update(#[source] StoreError),
    #[error("failed to delete post: {0}")]
    Delete(#[source] StoreError),
    #[error("failed to load posts: {0}")]
    Load(#[source] StoreError),
    #[error("stored post {id} is malformed: {source}")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Post operations over a [`DocumentStore`].
///
/// Search and the tag/author filters scan the full listing client-side,
/// which is fine at this collection's scale; pushing them into the store's
/// query layer is an explicit non-goal. There is no idempotency key on
/// create, so a duplicate submission creates a duplicate post; callers are
/// expected to disable re-entrant saves while one is outstanding.
pub struct PostService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> PostService<S> {
    pub fn new(store: S) -> Self {
        PostService { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Publish a new post, stamping timestamps and deriving read time and
    /// excerpt from the content.
    pub fn create_post(&mut self, input: PostInput) -> Result<Post, PostError> {
        self.create_post_at(input, Utc::now())
    }

    pub(crate) fn create_post_at(
        &mut self,
        input: PostInput,
        now: DateTime<Utc>,
    ) -> Result<Post, PostError> {
        let mut post = Post {
            id: String::new(),
            title: input.title.trim().to_string(),
            content: input.content,
            author_id: input.author_id,
            author_name: input.author_name,
            author_photo_url: input.author_photo_url,
            tags: input.tags,
            published_at: now,
            updated_at: now,
            read_time: None,
            excerpt: None,
        };
        post.read_time = Some(estimate_read_time(&post.content));
        post.excerpt = Some(make_excerpt(&post.content));

        let record = post.to_record().map_err(|e| PostError::Malformed {
            id: "<new>".to_string(),
            source: e,
        })?;
        let id = self
            .store
            .create(POSTS_COLLECTION, record)
            .map_err(PostError::Create)?;
        post.id = id;
        debug!("created post {} by {}", post.id, post.author_id);
        Ok(post)
    }

    /// Apply changes to an existing post, restamping `updatedAt`.
    pub fn update_post(&mut self, id: &str, changes: PostChanges) -> Result<(), PostError> {
        self.update_post_at(id, changes, Utc::now())
    }

    pub(crate) fn update_post_at(
        &mut self,
        id: &str,
        changes: PostChanges,
        now: DateTime<Utc>,
    ) -> Result<(), PostError> {
        let mut partial = Record::new();
        if let Some(title) = changes.title {
            partial.insert("title".to_string(), Value::String(title.trim().to_string()));
        }
        if let Some(content) = changes.content {
            partial.insert(
                "readTime".to_string(),
                Value::from(estimate_read_time(&content)),
            );
            partial.insert("excerpt".to_string(), Value::String(make_excerpt(&content)));
            partial.insert("content".to_string(), Value::String(content));
        }
        if let Some(tags) = changes.tags {
            partial.insert(
                "tags".to_string(),
                Value::Array(tags.into_iter().map(Value::String).collect()),
            );
        }
        partial.insert(
            "updatedAt".to_string(),
            Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        self.store
            .update(POSTS_COLLECTION, id, partial)
            .map_err(PostError::Update)?;
        debug!("updated post {id}");
        Ok(())
    }

    pub fn delete_post(&mut self, id: &str) -> Result<(), PostError> {
        self.store
            .delete(POSTS_COLLECTION, id)
            .map_err(PostError::Delete)?;
        debug!("deleted post {id}");
        Ok(())
    }

    pub fn get_post(&self, id: &str) -> Result<Option<Post>, PostError> {
        match self
            .store
            .get(POSTS_COLLECTION, id)
            .map_err(PostError::Load)?
        {
            Some(record) => Post::from_record(id.to_string(), record)
                .map(Some)
                .map_err(|e| PostError::Malformed {
                    id: id.to_string(),
                    source: e,
                }),
            None => Ok(None),
        }
    }

    /// All posts, newest first.
    pub fn all_posts(&self) -> Result<Vec<Post>, PostError> {
        let rows = self
            .store
            .list_desc(POSTS_COLLECTION, "publishedAt")
            .map_err(PostError::Load)?;
        rows.into_iter()
            .map(|(id, record)| {
                Post::from_record(id.clone(), record)
                    .map_err(|e| PostError::Malformed { id, source: e })
            })
            .collect()
    }

    pub fn posts_by_author(&self, author_id: &str) -> Result<Vec<Post>, PostError> {
        Ok(self
            .all_posts()?
            .into_iter()
            .filter(|post| post.author_id == author_id)
            .collect())
    }

    /// Case-insensitive search over title, content, author name and tags.
    pub fn search_posts(&self, term: &str) -> Result<Vec<Post>, PostError> {
        let term = term.trim().to_lowercase();
        let posts = self.all_posts()?;
        if term.is_empty() {
            return Ok(posts);
        }
        Ok(posts
            .into_iter()
            .filter(|post| {
                post.title.to_lowercase().contains(&term)
                    || post.content.to_lowercase().contains(&term)
                    || post.author_name.to_lowercase().contains(&term)
                    || post.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
            })
            .collect())
    }

    pub fn posts_by_tag(&self, tag: &str) -> Result<Vec<Post>, PostError> {
        let tag = tag.trim().to_lowercase();
        Ok(self
            .all_posts()?
            .into_iter()
            .filter(|post| post.tags.iter().any(|t| t.to_lowercase().contains(&tag)))
            .collect())
    }
}

/// Minutes to read the content's visible text, at least one.
pub fn estimate_read_time(content: &str) -> u32 {
    let words = Document::load(content).plain_text().split_whitespace().count();
    (words.div_ceil(READ_SPEED_WPM)).max(1) as u32
}

/// Visible-text excerpt, cut at a word boundary.
pub fn make_excerpt(content: &str) -> String {
    let text = Document::load(content).plain_text();
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= EXCERPT_LEN {
        return collapsed;
    }
    let head: String = collapsed.chars().take(EXCERPT_LEN).collect();
    let cut = head.rfind(' ').unwrap_or(head.len());
    let mut excerpt = head[..cut].trim_end().to_string();
    excerpt.push('…');
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn service() -> PostService<MemoryStore> {
        PostService::new(MemoryStore::new())
    }

    fn input(title: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            content: "<h2>What is Phishing?</h2><p>A social engineering attack.</p>".to_string(),
            author_id: "author-1".to_string(),
            author_name: "Ada Analyst".to_string(),
            author_photo_url: None,
            tags: vec!["phishing".to_string(), "email".to_string()],
        }
    }

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn create_then_get_roundtrips_every_field() {
        let mut svc = service();
        let created = svc.create_post_at(input("Phishing 101"), at(2026, 3, 1)).unwrap();

        let fetched = svc.get_post(&created.id).unwrap().unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.title, "Phishing 101");
        assert_eq!(fetched.read_time, Some(1));
        assert_eq!(
            fetched.excerpt.as_deref(),
            Some("What is Phishing? A social engineering attack.")
        );
    }

    #[test]
    fn content_is_persisted_verbatim() {
        let mut svc = service();
        let content = "<h2>Title</h2><pre><code language=\"go\">package main</code></pre>";
        let mut post_input = input("Opaque");
        post_input.content = content.to_string();

        let created = svc.create_post(post_input).unwrap();
        let fetched = svc.get_post(&created.id).unwrap().unwrap();

        assert_eq!(fetched.content, content);
    }

    #[test]
    fn all_posts_are_ordered_newest_first() {
        let mut svc = service();
        svc.create_post_at(input("oldest"), at(2026, 1, 1)).unwrap();
        svc.create_post_at(input("newest"), at(2026, 3, 1)).unwrap();
        svc.create_post_at(input("middle"), at(2026, 2, 1)).unwrap();

        let titles: Vec<String> = svc
            .all_posts()
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();

        assert_eq!(titles, vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn update_restamps_updated_at_and_recomputes_derived_fields() {
        let mut svc = service();
        let created = svc.create_post_at(input("v1"), at(2026, 1, 1)).unwrap();

        svc.update_post_at(
            &created.id,
            PostChanges {
                title: Some("v2".to_string()),
                content: Some("<p>short</p>".to_string()),
                tags: None,
            },
            at(2026, 1, 2),
        )
        .unwrap();

        let updated = svc.get_post(&created.id).unwrap().unwrap();
        assert_eq!(updated.title, "v2");
        assert_eq!(updated.excerpt.as_deref(), Some("short"));
        assert_eq!(updated.published_at, created.published_at);
        assert!(updated.updated_at > created.updated_at);
        // Untouched fields survive the shallow merge.
        assert_eq!(updated.tags, created.tags);
    }

    #[test]
    fn delete_removes_the_post() {
        let mut svc = service();
        let created = svc.create_post(input("ephemeral")).unwrap();

        svc.delete_post(&created.id).unwrap();

        assert_eq!(svc.get_post(&created.id).unwrap(), None);
        assert!(matches!(
            svc.delete_post(&created.id),
            Err(PostError::Delete(_))
        ));
    }

    #[test]
    fn posts_by_author_filters_the_listing() {
        let mut svc = service();
        svc.create_post(input("mine")).unwrap();
        let mut other = input("theirs");
        other.author_id = "author-2".to_string();
        svc.create_post(other).unwrap();

        let mine = svc.posts_by_author("author-1").unwrap();

        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "mine");
    }

    #[test]
    fn search_matches_title_content_author_and_tags() {
        let mut svc = service();
        svc.create_post(input("Phishing 101")).unwrap();

        assert_eq!(svc.search_posts("PHISHING").unwrap().len(), 1);
        assert_eq!(svc.search_posts("engineering").unwrap().len(), 1); // content
        assert_eq!(svc.search_posts("ada").unwrap().len(), 1); // author
        assert_eq!(svc.search_posts("email").unwrap().len(), 1); // tag
        assert_eq!(svc.search_posts("ransomware").unwrap().len(), 0);
    }

    #[test]
    fn empty_search_term_returns_everything() {
        let mut svc = service();
        svc.create_post(input("a")).unwrap();
        svc.create_post(input("b")).unwrap();

        assert_eq!(svc.search_posts("   ").unwrap().len(), 2);
    }

    #[test]
    fn posts_by_tag_is_substring_case_insensitive() {
        let mut svc = service();
        svc.create_post(input("tagged")).unwrap();

        assert_eq!(svc.posts_by_tag("Phish").unwrap().len(), 1);
        assert_eq!(svc.posts_by_tag("vpn").unwrap().len(), 0);
    }

    #[test]
    fn duplicate_submission_creates_duplicate_posts() {
        // There is no idempotency key at this boundary; the UI gates
        // re-entrant saves instead.
        let mut svc = service();
        svc.create_post(input("dup")).unwrap();
        svc.create_post(input("dup")).unwrap();

        assert_eq!(svc.all_posts().unwrap().len(), 2);
    }

    #[test]
    fn read_time_scales_with_word_count() {
        let long = format!("<p>{}</p>", "word ".repeat(450));
        assert_eq!(estimate_read_time(&long), 3);
        assert_eq!(estimate_read_time("<p>short</p>"), 1);
        assert_eq!(estimate_read_time(""), 1);
    }

    #[test]
    fn excerpt_truncates_at_word_boundary() {
        let body = format!("<p>{}</p>", "incident ".repeat(40));
        let excerpt = make_excerpt(&body);

        assert!(excerpt.ends_with("incident…"), "cut happens between words");
        assert!(excerpt.chars().count() <= EXCERPT_LEN + 1);
    }
}
