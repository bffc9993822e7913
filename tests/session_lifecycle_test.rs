//! Tests for a full trivia match driven through the session state machine.

use trivia_arena::{
    BASE_POINTS, FIRST_CORRECT_BONUS, GameSession, InMemoryQuestionBank, Player, Question,
    QuestionFormat, RoundOutcome, SessionError, SessionSettings, SessionStatus,
};

fn question_set() -> Vec<Question> {
    vec![
        Question::new("Capital of France?", QuestionFormat::Exact, "Paris")
            .with_explanation("Paris has been the capital since 987."),
        Question::new("Pick the mammal", QuestionFormat::Letter, "B")
            .with_choices(["Shark", "Dolphin", "Trout"]),
        Question::new("How many legs does a spider have?", QuestionFormat::Number, "8"),
        Question::new(
            "Order by size, smallest first",
            QuestionFormat::Order,
            vec!["ant".to_string(), "cat".to_string(), "horse".to_string()],
        ),
    ]
}

fn new_session(rounds: u32) -> GameSession {
    let mut session = GameSession::new(
        "match-1".to_string(),
        SessionSettings::new(
            "Pub Night".to_string(),
            rounds,
            "hostpw".to_string(),
            "join-me".to_string(),
            "general".to_string(),
            Some("host".to_string()),
        ),
    );
    session.join(Player::new("ada", "Ada")).unwrap();
    session.join(Player::new("grace", "Grace")).unwrap();
    session
}

#[tokio::test]
async fn test_full_match_scores_and_ranks() {
    let bank = InMemoryQuestionBank::new().with_set("general", question_set());
    let mut session = new_session(4);
    session.start(&bank).await.unwrap();
    assert_eq!(session.rounds(), 4);

    // Round 1: both right, Ada first.
    session.next_round().unwrap();
    session.submit_answer("ada", "Paris").unwrap();
    session.submit_answer("grace", "Paris").unwrap();

    // Round 2: letter answer, only Grace right.
    session.next_round().unwrap();
    session.submit_answer("ada", "A").unwrap();
    session.submit_answer("grace", "B Dolphin").unwrap();

    // Round 3: numeric, Grace answers first.
    session.next_round().unwrap();
    session.submit_answer("grace", "8 legs").unwrap();
    session.submit_answer("ada", "08").unwrap();

    // Round 4: order, Ada alone.
    session.next_round().unwrap();
    session.submit_answer("ada", "ant, cat ,horse").unwrap();
    session.submit_answer("grace", "cat,ant,horse").unwrap();

    assert_eq!(session.next_round().unwrap(), RoundOutcome::Ended);
    assert_eq!(session.status(), SessionStatus::Ended);

    let standings = session.standings();
    let ada = standings.iter().find(|s| s.player_id() == "ada").unwrap();
    let grace = standings.iter().find(|s| s.player_id() == "grace").unwrap();
    assert_eq!(
        *ada.score(),
        (BASE_POINTS + FIRST_CORRECT_BONUS) * 2 + BASE_POINTS
    );
    assert_eq!(
        *grace.score(),
        BASE_POINTS + (BASE_POINTS + FIRST_CORRECT_BONUS) * 2
    );
    // Equal scores share first place.
    assert_eq!(*ada.rank(), 1);
    assert_eq!(*grace.rank(), 1);
}

#[tokio::test]
async fn test_missing_question_set_starts_then_ends_immediately() {
    let bank = InMemoryQuestionBank::new();
    let mut session = new_session(5);
    session.start(&bank).await.unwrap();

    assert_eq!(session.status(), SessionStatus::InProgress);
    assert_eq!(session.rounds(), 0);
    assert!(session.deck().is_some());

    assert_eq!(session.next_round().unwrap(), RoundOutcome::Ended);
    assert_eq!(session.status(), SessionStatus::Ended);
}

#[tokio::test]
async fn test_failed_start_leaves_session_untouched() {
    let bank = InMemoryQuestionBank::new().with_set("general", question_set());
    let mut session = GameSession::new(
        "solo".to_string(),
        SessionSettings::new(
            "Solo".to_string(),
            3,
            "pw".to_string(),
            "code".to_string(),
            "general".to_string(),
            None,
        ),
    );
    session.join(Player::new("ada", "Ada")).unwrap();

    let err = session.start(&bank).await.unwrap_err();
    assert!(matches!(err, SessionError::NotEnoughPlayers { .. }));
    assert_eq!(session.status(), SessionStatus::NotStarted);
    assert!(session.deck().is_none());
    assert!(session.started_at().is_none());
}

#[tokio::test]
async fn test_revealed_question_hides_answer() {
    let bank = InMemoryQuestionBank::new().with_set("general", question_set());
    let mut session = new_session(2);
    session.start(&bank).await.unwrap();

    let outcome = session.next_round().unwrap();
    let start = outcome.round().unwrap();
    let trimmed = serde_json::to_value(start.question()).unwrap();
    assert!(trimmed.get("answer").is_none());
    assert!(trimmed.get("full_answer").is_none());
    assert_eq!(trimmed["question"], "Capital of France?");

    let reveal = session.correct_answer().unwrap();
    assert_eq!(reveal.answer(), "Paris");
    assert_eq!(
        reveal.explanation().as_deref(),
        Some("Paris has been the capital since 987.")
    );
}

#[tokio::test]
async fn test_late_answer_rejected_after_window_closes() {
    let bank = InMemoryQuestionBank::new().with_set("general", question_set());
    let mut session = new_session(2);
    session.start(&bank).await.unwrap();
    session.next_round().unwrap();

    assert!(session.close_answers(1));
    assert_eq!(
        session.submit_answer("ada", "Paris"),
        Err(SessionError::AnswersClosed { round: 1 })
    );
    assert!(
        session
            .standings()
            .iter()
            .all(|standing| *standing.score() == 0)
    );
}

#[tokio::test]
async fn test_disconnected_player_reclaims_seat_mid_game() {
    let bank = InMemoryQuestionBank::new().with_set("general", question_set());
    let mut session = new_session(3);
    session.start(&bank).await.unwrap();
    session.next_round().unwrap();
    session.submit_answer("grace", "Paris").unwrap();

    session.leave("grace").unwrap();
    session.join(Player::new("grace-phone", "Grace")).unwrap();

    let grace = session.roster().get("grace-phone").unwrap();
    assert!(*grace.connected());
    assert_eq!(*grace.score(), BASE_POINTS + FIRST_CORRECT_BONUS);
    assert!(!session.roster().contains("grace"));
}
