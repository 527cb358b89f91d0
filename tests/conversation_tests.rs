use datachat::conversation::ConversationLog;
use datachat::model::{DataSelection, MessageKind, QueryAnswer, Role};

fn committed_selection() -> DataSelection {
    DataSelection {
        filename: "a.csv".to_string(),
        head: Some(10),
        committed: true,
        media: false,
        media_type: None,
        url: None,
        result: None,
    }
}

fn answer(text: &str, html: bool) -> QueryAnswer {
    QueryAnswer {
        answer: serde_json::Value::String(text.to_string()),
        html,
    }
}

#[test]
fn log_opens_with_greeting() {
    let log = ConversationLog::new();
    let messages = log.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::Ai);
    assert_eq!(messages[0].body, "Hello, how can I help you?");
}

#[test]
fn successful_query_rewrites_placeholder() {
    // Scenario C
    let mut log = ConversationLog::new();
    let selection = committed_selection();

    let pending = log.begin_query("hello", Some(&selection)).expect("query allowed");
    assert!(log.query_in_flight());
    assert_eq!(log.messages().len(), 3);
    assert_eq!(log.messages()[2].kind, MessageKind::Pending);

    log.complete_query(pending, &answer("hi", false));

    let messages = log.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].body, "Hello, how can I help you?");
    assert_eq!((messages[1].role, messages[1].body.as_str()), (Role::User, "hello"));
    assert_eq!((messages[2].role, messages[2].kind), (Role::Ai, MessageKind::Text));
    assert_eq!(messages[2].body, "hi");
    assert!(!log.query_in_flight());
}

#[test]
fn failed_query_removes_placeholder_keeps_user_message() {
    // Scenario D
    let mut log = ConversationLog::new();
    let selection = committed_selection();

    let pending = log.begin_query("hello", Some(&selection)).unwrap();
    log.abort_query(pending);

    let messages = log.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!((messages[1].role, messages[1].body.as_str()), (Role::User, "hello"));
    assert!(!log.query_in_flight(), "failed query is recoverable");
    assert!(log.begin_query("again", Some(&selection)).is_some());
}

#[test]
fn query_is_noop_without_committed_selection() {
    let mut log = ConversationLog::new();

    assert!(log.begin_query("hi", None).is_none(), "no selection");

    let mut uncommitted = committed_selection();
    uncommitted.committed = false;
    assert!(log.begin_query("hi", Some(&uncommitted)).is_none());

    let mut media = committed_selection();
    media.media = true;
    assert!(log.begin_query("hi", Some(&media)).is_none());

    assert_eq!(log.messages().len(), 1, "log unchanged by rejected queries");
}

#[test]
fn one_query_in_flight_at_a_time() {
    let mut log = ConversationLog::new();
    let selection = committed_selection();

    let pending = log.begin_query("first", Some(&selection)).unwrap();
    assert!(log.begin_query("second", Some(&selection)).is_none());
    assert_eq!(log.messages().len(), 3, "second query must not touch the log");

    log.complete_query(pending, &answer("done", false));
    assert!(log.begin_query("second", Some(&selection)).is_some());
}

#[test]
fn log_growth_is_even_on_success_odd_on_failure() {
    let mut log = ConversationLog::new();
    let selection = committed_selection();
    let baseline = log.messages().len();

    let pending = log.begin_query("q1", Some(&selection)).unwrap();
    log.complete_query(pending, &answer("a1", false));
    assert_eq!(log.messages().len(), baseline + 2);

    let pending = log.begin_query("q2", Some(&selection)).unwrap();
    log.abort_query(pending);
    assert_eq!(log.messages().len(), baseline + 3);
}

#[test]
fn html_answers_keep_their_kind() {
    let mut log = ConversationLog::new();
    let selection = committed_selection();

    let pending = log.begin_query("plot it", Some(&selection)).unwrap();
    log.complete_query(pending, &answer("<img src='chart.png'/>", true));

    assert_eq!(log.messages().last().unwrap().kind, MessageKind::Html);
}

#[test]
fn numeric_answers_render_as_text() {
    let mut log = ConversationLog::new();
    let selection = committed_selection();

    let pending = log.begin_query("how many rows?", Some(&selection)).unwrap();
    log.complete_query(
        pending,
        &QueryAnswer {
            answer: serde_json::json!(42),
            html: false,
        },
    );

    let last = log.messages().last().unwrap();
    assert_eq!(last.kind, MessageKind::Text);
    assert_eq!(last.body, "42");
}

#[test]
fn ids_strictly_increase_and_never_collide() {
    let mut log = ConversationLog::new();
    let selection = committed_selection();

    let pending = log.begin_query("q", Some(&selection)).unwrap();
    log.complete_query(pending, &answer("a", false));
    let pending2 = log.begin_query("q2", Some(&selection)).unwrap();
    log.abort_query(pending2);

    let ids: Vec<u64> = log.messages().iter().map(|m| m.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(ids, sorted, "ids strictly increase along the log");
    assert!(
        !ids.contains(&pending),
        "placeholder id retired when the final id was assigned"
    );
}

#[test]
fn recall_returns_only_user_messages() {
    let mut log = ConversationLog::new();
    let selection = committed_selection();

    let pending = log.begin_query("show top rows", Some(&selection)).unwrap();
    log.complete_query(pending, &answer("here", false));

    let user_id = log.messages()[1].id;
    let ai_id = log.messages()[2].id;
    assert_eq!(log.recall(user_id), Some("show top rows"));
    assert_eq!(log.recall(ai_id), None, "AI messages are not recallable");
    assert_eq!(log.recall(999), None);
}
