//! The full authoring path: sign up, compose from a template, publish,
//! find it again, and clean up.

use cipherpress_engine::{Cmd, Document, Draft};
use cipherpress_store::{
    AuthProvider, MemoryAuth, MemoryStore, PostChanges, PostInput, PostService, Session,
};
use pretty_assertions::assert_eq;

#[test]
fn publish_a_templated_post_end_to_end() {
    let mut auth = MemoryAuth::new();
    let session = Session::attach(&mut auth);
    let author = auth
        .sign_up("ada@example.com", "hunter22", "Ada Analyst")
        .unwrap();
    assert!(session.is_signed_in());

    // Compose from the incident-response template and add a detail.
    let mut draft = Draft::new();
    assert!(draft.apply_template("incident-response"));
    draft
        .document
        .apply(Cmd::InsertText {
            text: "Ransomware on the build farm. ".to_string(),
        })
        .unwrap();
    assert!(draft.can_save());

    // Publish.
    let mut posts = PostService::new(MemoryStore::new());
    let created = posts
        .create_post(PostInput {
            title: draft.title.clone(),
            content: draft.document.serialize(),
            author_id: author.uid.clone(),
            author_name: author.display_name.clone(),
            author_photo_url: author.photo_url.clone(),
            tags: draft.tags.clone(),
        })
        .unwrap();

    assert_eq!(created.title, "Security Incident Response Report");
    assert_eq!(
        created.tags,
        vec!["Incident Response", "Security Operations", "Forensics"]
    );
    assert!(created.read_time.is_some());

    // The stored content reloads into the same document.
    let fetched = posts.get_post(&created.id).unwrap().unwrap();
    let reloaded = Document::load(&fetched.content);
    assert_eq!(reloaded.serialize(), fetched.content);
    assert!(reloaded.plain_text().contains("Ransomware on the build farm."));

    // Listing, search and the author filter all find it.
    assert_eq!(posts.all_posts().unwrap().len(), 1);
    assert_eq!(posts.search_posts("ransomware").unwrap().len(), 1);
    assert_eq!(posts.posts_by_author(&author.uid).unwrap().len(), 1);
    assert_eq!(posts.posts_by_tag("forensics").unwrap().len(), 1);

    // The author edits the title; then deletes the post.
    posts
        .update_post(
            &created.id,
            PostChanges {
                title: Some("Build Farm Incident".to_string()),
                ..PostChanges::default()
            },
        )
        .unwrap();
    assert_eq!(
        posts.get_post(&created.id).unwrap().unwrap().title,
        "Build Farm Incident"
    );

    posts.delete_post(&created.id).unwrap();
    assert!(posts.all_posts().unwrap().is_empty());

    auth.sign_out();
    assert!(!session.is_signed_in());
}

#[test]
fn save_gate_blocks_empty_drafts() {
    let mut draft = Draft::new();
    draft.title = "Has a title".to_string();
    assert!(!draft.can_save());

    draft
        .document
        .apply(Cmd::InsertText {
            text: "now it has a body".to_string(),
        })
        .unwrap();
    assert!(draft.can_save());
}
