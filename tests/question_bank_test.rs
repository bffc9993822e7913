//! Tests for loading question sets from JSON files.

use std::fs;
use tempfile::TempDir;
use trivia_arena::{
    AnswerEvaluator, DeckStatus, JsonQuestionBank, QuestionBank, QuestionDeck, QuestionFormat,
};

const GEOGRAPHY: &str = r#"[
    {
        "question": "Largest ocean?",
        "type": "MULTIPLE_CHOICE",
        "options": ["Atlantic", "Pacific", "Indian"],
        "answer": "Pacific",
        "full_answer": "The Pacific covers about a third of the planet."
    },
    {
        "question": "Order these rivers by length, longest first",
        "type": "ORDER",
        "answer": ["Nile", "Amazon", "Yangtze"]
    },
    {
        "id": "q-everest",
        "question": "Height of Everest in metres?",
        "type": "NUMBER",
        "answer": "8849",
        "image": "everest.png"
    },
    {
        "question": "Which letter starts the capital of Japan?",
        "answer": "T"
    }
]"#;

fn bank_with(files: &[(&str, &str)]) -> (TempDir, JsonQuestionBank) {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    let bank = JsonQuestionBank::new(dir.path());
    (dir, bank)
}

#[tokio::test]
async fn test_loads_all_question_shapes() {
    let (_dir, bank) = bank_with(&[("geography.json", GEOGRAPHY)]);
    let questions = bank.fetch("geography").await.unwrap();
    assert_eq!(questions.len(), 4);

    assert_eq!(*questions[0].format(), QuestionFormat::MultipleChoice);
    assert_eq!(questions[0].choices().as_ref().unwrap().len(), 3);
    assert!(questions[0].explanation().is_some());

    assert_eq!(*questions[1].format(), QuestionFormat::Order);
    assert_eq!(questions[1].answer().canonical(), "Nile,Amazon,Yangtze");
    assert!(AnswerEvaluator::is_correct(
        &questions[1],
        "Nile , Amazon,Yangtze"
    ));

    assert_eq!(questions[2].id(), "q-everest");
    assert_eq!(questions[2].image().as_deref(), Some("everest.png"));
    assert!(AnswerEvaluator::is_correct(&questions[2], "8849m"));

    // Missing type falls back to exact matching.
    assert_eq!(*questions[3].format(), QuestionFormat::Exact);
    assert!(!questions[3].id().is_empty());
}

#[tokio::test]
async fn test_deck_truncates_to_requested_rounds() {
    let (_dir, bank) = bank_with(&[("geography.json", GEOGRAPHY)]);
    let deck = QuestionDeck::load(&bank, "geography", 2).await;
    assert_eq!(*deck.status(), DeckStatus::Loaded);
    assert_eq!(deck.rounds(), 2);
    assert_eq!(deck.question(1).unwrap().prompt(), "Largest ocean?");
    assert!(deck.question(3).is_none());
}

#[tokio::test]
async fn test_missing_file_yields_empty_deck() {
    let (_dir, bank) = bank_with(&[]);
    assert!(bank.fetch("nope").await.is_err());

    let deck = QuestionDeck::load(&bank, "nope", 5).await;
    assert_eq!(deck.requested_rounds(), 5);
    assert_eq!(deck.rounds(), 0);
    assert!(matches!(deck.status(), DeckStatus::LoadFailed { .. }));
}

#[tokio::test]
async fn test_malformed_file_yields_empty_deck() {
    let (_dir, bank) = bank_with(&[("broken.json", "{ not json")]);
    let err = bank.fetch("broken").await.unwrap_err();
    assert!(err.message.contains("parse"));

    let deck = QuestionDeck::load(&bank, "broken", 3).await;
    assert_eq!(deck.rounds(), 0);
}

#[tokio::test]
async fn test_rejects_ids_escaping_the_directory() {
    let dir = TempDir::new().unwrap();
    let inner = dir.path().join("sets");
    fs::create_dir(&inner).unwrap();
    fs::write(dir.path().join("secret.json"), GEOGRAPHY).unwrap();
    let bank = JsonQuestionBank::new(&inner);

    for id in ["../secret", "..", "a/b", "a\\b", ""] {
        assert!(bank.fetch(id).await.is_err(), "id {:?} should be refused", id);
    }
}
