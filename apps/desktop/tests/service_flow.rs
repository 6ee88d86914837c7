//! End-to-end card service tests against an in-memory database.

use recall_core::types::{Answer, Rating};
use recall_desktop::db::{SqliteRepository, StoreError};
use recall_desktop::service::{CardService, CreateCardInput, UpdateCardInput};

fn service() -> CardService {
    CardService::new(SqliteRepository::open_in_memory().expect("in-memory database"))
}

fn input(question: &str, tags: &[&str]) -> CreateCardInput {
    CreateCardInput {
        question: question.to_string(),
        answer: Answer::text("the answer"),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

#[test]
fn created_card_is_immediately_due() {
    let service = service();
    let card = service.create_card(input("What is ownership?", &["rust"])).unwrap();

    let due = service.due_cards().unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, card.id);
}

#[test]
fn create_rejects_empty_question() {
    let service = service();
    let result = service.create_card(input("   ", &[]));
    assert!(matches!(result, Err(StoreError::Validation(_))));
}

#[test]
fn review_advances_the_schedule() {
    let service = service();
    let card = service.create_card(input("q", &[])).unwrap();

    let first = service.record_review(&card.id, Rating::Easy).unwrap();
    assert_eq!(first.repetitions, 1);
    assert_eq!(first.interval, 1);
    assert_eq!(first.performance_history.len(), 1);

    let second = service.record_review(&card.id, Rating::Perfect).unwrap();
    assert_eq!(second.repetitions, 2);
    assert_eq!(second.interval, 6);
    assert_eq!(second.performance_history.len(), 2);

    // After the first review the card is scheduled for tomorrow.
    assert!(second.due_date > chrono::Utc::now());
    assert!(service.due_cards().unwrap().is_empty());
}

#[test]
fn review_of_unknown_card_is_not_found() {
    let service = service();
    assert!(matches!(
        service.record_review("missing", Rating::Good),
        Err(StoreError::CardNotFound(_))
    ));
}

#[test]
fn schedule_lookup_signals_missing_schedule() {
    let service = service();
    let card = service.create_card(input("q", &[])).unwrap();
    assert_eq!(service.get_schedule(&card.id).unwrap().repetitions, 0);
    assert!(matches!(
        service.get_schedule("missing"),
        Err(StoreError::ScheduleNotFound(_))
    ));
}

#[test]
fn update_changes_fields_and_bumps_updated_at() {
    let service = service();
    let card = service.create_card(input("old question", &["a"])).unwrap();

    let updated = service
        .update_card(
            &card.id,
            UpdateCardInput {
                question: Some("new question".to_string()),
                tags: Some(vec!["b".to_string()]),
                ..UpdateCardInput::default()
            },
        )
        .unwrap();

    assert_eq!(updated.question, "new question");
    assert_eq!(updated.tags, vec!["b".to_string()]);
    assert_eq!(updated.answer, card.answer);
    assert!(updated.updated_at >= card.updated_at);

    assert!(matches!(
        service.update_card("missing", UpdateCardInput::default()),
        Err(StoreError::CardNotFound(_))
    ));
}

#[test]
fn delete_removes_card_and_schedule() {
    let service = service();
    let card = service.create_card(input("q", &[])).unwrap();

    service.delete_card(&card.id).unwrap();
    assert!(matches!(
        service.get_card(&card.id),
        Err(StoreError::CardNotFound(_))
    ));
    assert!(service.due_cards().unwrap().is_empty());
    assert!(matches!(
        service.delete_card(&card.id),
        Err(StoreError::CardNotFound(_))
    ));
}

#[test]
fn search_matches_question_answer_and_tags() {
    let service = service();
    service.create_card(input("Borrow checker rules", &["rust"])).unwrap();
    service
        .create_card(CreateCardInput {
            question: "Capital of France".to_string(),
            answer: Answer::text("Paris"),
            tags: vec!["geography".to_string()],
        })
        .unwrap();

    assert_eq!(service.search_cards("borrow").unwrap().len(), 1);
    assert_eq!(service.search_cards("paris").unwrap().len(), 1);
    assert_eq!(service.search_cards("RUST").unwrap().len(), 1);
    assert_eq!(service.search_cards("nothing").unwrap().len(), 0);
}

#[test]
fn dashboard_stats_reflect_activity() {
    let service = service();
    let card = service.create_card(input("q", &["rust"])).unwrap();
    service.record_review(&card.id, Rating::Good).unwrap();

    let stats = service.dashboard_stats();
    assert_eq!(stats.total_cards, 1);
    assert_eq!(stats.daily_review_count, 1);
    assert_eq!(stats.retention_rate, 100.0);
    assert_eq!(stats.weekly_progress.reviews_completed, 1);
    assert_eq!(stats.weekly_progress.average_rating, 3.0);
}

#[test]
fn empty_database_yields_zeroed_stats() {
    let service = service();
    let stats = service.dashboard_stats();
    assert_eq!(stats.total_cards, 0);
    assert_eq!(stats.daily_review_count, 0);
    assert_eq!(stats.retention_rate, 0.0);
    assert!(service.daily_stats(7).len() == 7);
}

#[test]
fn tag_suggestions_rank_created_tags() {
    let service = service();
    service.create_card(input("q1", &["Rust", "async"])).unwrap();
    service.create_card(input("q2", &["rust"])).unwrap();

    let suggestions = service.tag_suggestions("", 10).unwrap();
    assert_eq!(suggestions[0].tag, "rust");
    assert_eq!(suggestions[0].count, 2);

    let filtered = service.tag_suggestions("asy", 10).unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].tag, "async");
}

#[test]
fn initialize_tag_cache_seeds_from_cards() {
    let service = service();
    service.create_card(input("q1", &["history"])).unwrap();

    // A second service over the same data would normally seed at
    // startup; here we just re-seed in place and expect no change.
    service.initialize_tag_cache().unwrap();
    let before = service.tag_suggestions("", 10).unwrap();
    service.initialize_tag_cache().unwrap();
    assert_eq!(service.tag_suggestions("", 10).unwrap(), before);
}

#[test]
fn export_import_round_trips_cards() {
    let source = service();
    source.create_card(input("q1", &["a"])).unwrap();
    source.create_card(input("q2", &["b"])).unwrap();
    let json = source.export_cards().unwrap();

    let target = service();
    let imported = target.import_cards(&json).unwrap();
    assert_eq!(imported.len(), 2);
    assert_eq!(target.all_cards().unwrap().len(), 2);
    // Imported cards are immediately reviewable.
    assert_eq!(target.due_cards().unwrap().len(), 2);

    // Re-importing the same data skips existing ids.
    let again = target.import_cards(&json).unwrap();
    assert!(again.is_empty());
    assert_eq!(target.all_cards().unwrap().len(), 2);
}

#[test]
fn import_rejects_card_without_answer() {
    let service = service();
    let json = r#"[{"question": "q", "answer": {"type": "text", "content": ""}, "tags": []}]"#;
    assert!(matches!(
        service.import_cards(json),
        Err(StoreError::Validation(_))
    ));
}

#[test]
fn import_assigns_id_when_missing() {
    let service = service();
    let json = r#"[{"question": "q", "answer": {"type": "text", "content": "a"}}]"#;
    let imported = service.import_cards(json).unwrap();
    assert_eq!(imported.len(), 1);
    assert!(!imported[0].id.is_empty());
    assert!(service.get_card(&imported[0].id).is_ok());
}
