use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use stayfinder_agent::llm::ToolChoice;
use stayfinder_agent::{
    AgentRuntime, AgentSettings, ChatMessage, CompletionRequest, Conversation, LlmClient,
    LlmError, Role, ToolCallRequest, ToolError, ToolRegistry, TurnError,
};
use stayfinder_core::BookingDesk;

#[derive(Clone, Debug)]
struct RecordedRequest {
    messages: Vec<ChatMessage>,
    tool_names: Vec<&'static str>,
    tool_choice: Option<ToolChoice>,
}

#[derive(Default)]
struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<ChatMessage, LlmError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedLlm {
    fn new(replies: Vec<Result<ChatMessage, LlmError>>) -> Arc<Self> {
        Arc::new(Self { replies: Mutex::new(replies.into()), requests: Mutex::new(Vec::new()) })
    }

    fn push_reply(&self, reply: Result<ChatMessage, LlmError>) {
        self.replies.lock().expect("replies lock").push_back(reply);
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<ChatMessage, LlmError> {
        self.requests.lock().expect("requests lock").push(RecordedRequest {
            messages: request.messages.to_vec(),
            tool_names: request.tools.iter().map(|spec| spec.name.as_str()).collect(),
            tool_choice: request.tool_choice,
        });
        let next = self.replies.lock().expect("replies lock").pop_front();
        next.unwrap_or(Err(LlmError::EmptyResponse))
    }
}

fn runtime_with(llm: Arc<ScriptedLlm>, settings: AgentSettings) -> AgentRuntime {
    let tools = ToolRegistry::with_booking_tools().expect("built-in tools register");
    AgentRuntime::new(llm, tools, BookingDesk::seeded(), settings)
}

fn runtime(llm: Arc<ScriptedLlm>) -> AgentRuntime {
    runtime_with(llm, AgentSettings::default())
}

fn tool_calls(calls: &[(&str, &str, &str)]) -> ChatMessage {
    ChatMessage::assistant_tool_calls(
        calls
            .iter()
            .map(|(id, name, arguments)| ToolCallRequest::function(*id, *name, *arguments))
            .collect(),
    )
}

fn book_alice() -> &'static str {
    r#"{"hotel_id":1,"guest_name":"Alice","check_in":"2024-06-01","check_out":"2024-06-04","num_guests":2}"#
}

fn roles(messages: &[ChatMessage]) -> Vec<Role> {
    messages.iter().map(|message| message.role).collect()
}

fn tool_payload(message: &ChatMessage) -> Value {
    let content = message.content.as_deref().expect("tool message content");
    serde_json::from_str(content).expect("tool content is JSON")
}

#[tokio::test]
async fn plain_reply_is_returned_without_dispatch() {
    let greeting = ChatMessage::assistant("Hello! Where would you like to stay?");
    let llm = ScriptedLlm::new(vec![Ok(greeting)]);
    let mut runtime = runtime(llm.clone());
    let mut conversation = Conversation::new();

    let reply = runtime.handle_turn(&mut conversation, "hi").await.expect("turn succeeds");

    assert_eq!(reply, "Hello! Where would you like to stay?");
    assert_eq!(roles(conversation.messages()), vec![Role::System, Role::User, Role::Assistant]);

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].tool_names,
        vec!["search_hotels", "book_hotel", "get_booking_details"]
    );
    assert_eq!(requests[0].tool_choice, Some(ToolChoice::Auto));
    assert_eq!(requests[0].messages.len(), 2);
}

#[tokio::test]
async fn two_tool_calls_append_two_tool_messages_before_final_completion() {
    let llm = ScriptedLlm::new(vec![
        Ok(tool_calls(&[
            ("call_ny", "search_hotels", r#"{"location":"New York"}"#),
            ("call_mia", "search_hotels", r#"{"location":"miami","max_price":200}"#),
        ])),
        Ok(ChatMessage::assistant("I found three options.")),
    ]);
    let mut runtime = runtime(llm.clone());
    let mut conversation = Conversation::new();

    let reply = runtime
        .handle_turn(&mut conversation, "Hotels in New York or Miami?")
        .await
        .expect("turn succeeds");
    assert_eq!(reply, "I found three options.");

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);

    let final_request = &requests[1];
    assert!(final_request.tool_names.is_empty());
    assert_eq!(final_request.tool_choice, None);
    assert_eq!(
        roles(&final_request.messages),
        vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Tool]
    );
    assert_eq!(final_request.messages[2].tool_calls.len(), 2);
    assert_eq!(final_request.messages[3].tool_call_id.as_deref(), Some("call_ny"));
    assert_eq!(final_request.messages[4].tool_call_id.as_deref(), Some("call_mia"));

    let new_york = tool_payload(&final_request.messages[3]);
    let names = new_york
        .as_array()
        .expect("array")
        .iter()
        .map(|hotel| hotel["name"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Grand Plaza Hotel", "Budget Inn"]);

    let miami = tool_payload(&final_request.messages[4]);
    assert_eq!(miami[0]["name"], "Seaside Resort");

    assert_eq!(conversation.len(), 6);
    assert_eq!(conversation.last().map(|message| message.role), Some(Role::Assistant));
}

#[tokio::test]
async fn booking_persists_across_turns_and_seeds_system_once() {
    let llm = ScriptedLlm::new(vec![
        Ok(tool_calls(&[("call_book", "book_hotel", book_alice())])),
        Ok(ChatMessage::assistant("Booked! Your booking id is 1.")),
    ]);
    let mut runtime = runtime(llm.clone());
    let mut conversation = Conversation::new();

    runtime.handle_turn(&mut conversation, "Book Grand Plaza for Alice").await.expect("turn 1");
    assert_eq!(runtime.desk().ledger().len(), 1);

    let booked = tool_payload(&conversation.messages()[3]);
    assert_eq!(booked["success"], true);
    assert_eq!(booked["booking"]["nights"], 3);
    assert_eq!(booked["message"], "Booking confirmed! Total: $750");

    llm.push_reply(Ok(tool_calls(&[("call_get", "get_booking_details", r#"{"booking_id":1}"#)])));
    llm.push_reply(Ok(ChatMessage::assistant("Booking 1 is for Alice.")));

    let reply = runtime.handle_turn(&mut conversation, "Show booking 1").await.expect("turn 2");
    assert_eq!(reply, "Booking 1 is for Alice.");

    let found = tool_payload(&conversation.messages()[7]);
    assert_eq!(found["booking"], booked["booking"]);
    assert_eq!(conversation.count_role(Role::System), 1);
    assert_eq!(llm.requests().len(), 4);
}

#[tokio::test]
async fn unknown_tool_fails_the_turn_but_keeps_history() {
    let llm = ScriptedLlm::new(vec![Ok(tool_calls(&[("call_x", "cancel_booking", "{}")]))]);
    let mut runtime = runtime(llm.clone());
    let mut conversation = Conversation::new();

    let error = runtime
        .handle_turn(&mut conversation, "cancel my booking")
        .await
        .expect_err("unknown tool");
    assert_eq!(error, TurnError::Tool(ToolError::UnknownOperation("cancel_booking".to_string())));
    assert_eq!(roles(conversation.messages()), vec![Role::System, Role::User, Role::Assistant]);

    llm.push_reply(Ok(ChatMessage::assistant("Sorry, I can't cancel bookings.")));
    let reply = runtime.handle_turn(&mut conversation, "ok").await.expect("next turn recovers");
    assert_eq!(reply, "Sorry, I can't cancel bookings.");
    assert_eq!(conversation.len(), 5);
}

#[tokio::test]
async fn malformed_arguments_and_dates_are_typed_errors() {
    let llm = ScriptedLlm::new(vec![Ok(tool_calls(&[("call_1", "search_hotels", "{location:")]))]);
    let mut runtime = runtime(llm.clone());
    let mut conversation = Conversation::new();

    let error = runtime.handle_turn(&mut conversation, "search").await.expect_err("bad json");
    assert!(matches!(error, TurnError::Tool(ToolError::InvalidArguments { .. })));

    let bad_date = r#"{"hotel_id":1,"guest_name":"Alice","check_in":"06/01/2024","check_out":"2024-06-04","num_guests":2}"#;
    llm.push_reply(Ok(tool_calls(&[("call_2", "book_hotel", bad_date)])));
    let error = runtime.handle_turn(&mut conversation, "book").await.expect_err("bad date");
    assert!(matches!(error, TurnError::Tool(ToolError::Domain(_))));
    assert!(runtime.desk().ledger().is_empty());
}

#[tokio::test]
async fn calls_after_a_failing_call_are_not_executed() {
    let llm = ScriptedLlm::new(vec![Ok(tool_calls(&[
        ("call_bad", "book_hotel", r#"{"hotel_id":1}"#),
        ("call_ok", "book_hotel", book_alice()),
    ]))]);
    let mut runtime = runtime(llm);
    let mut conversation = Conversation::new();

    runtime.handle_turn(&mut conversation, "book twice").await.expect_err("missing fields");

    assert!(runtime.desk().ledger().is_empty());
    assert_eq!(conversation.count_role(Role::Tool), 0);
}

#[tokio::test]
async fn completion_failure_is_surfaced() {
    let llm = ScriptedLlm::new(vec![Err(LlmError::Status {
        status: 401,
        body: "invalid api key".to_string(),
    })]);
    let mut runtime = runtime(llm);
    let mut conversation = Conversation::new();

    let error = runtime.handle_turn(&mut conversation, "hi").await.expect_err("status error");

    assert!(matches!(error, TurnError::Completion(LlmError::Status { status: 401, .. })));
    assert_eq!(roles(conversation.messages()), vec![Role::System, Role::User]);
}

#[tokio::test]
async fn tool_requests_in_the_final_completion_are_ignored() {
    let mut trailing = tool_calls(&[("call_late", "book_hotel", book_alice())]);
    trailing.content = Some("All done.".to_string());
    let llm = ScriptedLlm::new(vec![
        Ok(tool_calls(&[("call_1", "search_hotels", r#"{"location":"Los Angeles"}"#)])),
        Ok(trailing),
    ]);
    let mut runtime = runtime(llm.clone());
    let mut conversation = Conversation::new();

    let reply = runtime.handle_turn(&mut conversation, "LA hotels").await.expect("turn succeeds");

    assert_eq!(reply, "All done.");
    assert!(runtime.desk().ledger().is_empty());
    assert_eq!(llm.requests().len(), 2);
}

#[tokio::test]
async fn extra_tool_rounds_keep_offering_tools_until_the_cap() {
    let llm = ScriptedLlm::new(vec![
        Ok(tool_calls(&[("call_1", "search_hotels", r#"{"location":"New York"}"#)])),
        Ok(tool_calls(&[("call_2", "book_hotel", book_alice())])),
        Ok(ChatMessage::assistant("Searched and booked.")),
    ]);
    let settings = AgentSettings { max_tool_rounds: 2, ..AgentSettings::default() };
    let mut runtime = runtime_with(llm.clone(), settings);
    let mut conversation = Conversation::new();

    let reply = runtime.handle_turn(&mut conversation, "find and book").await.expect("turn");

    assert_eq!(reply, "Searched and booked.");
    let requests = llm.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].tool_choice, Some(ToolChoice::Auto));
    assert_eq!(requests[1].tool_choice, Some(ToolChoice::Auto));
    assert_eq!(requests[1].tool_names.len(), 3);
    assert_eq!(requests[2].tool_choice, None);
    assert!(requests[2].tool_names.is_empty());
    assert_eq!(runtime.desk().ledger().len(), 1);
}

#[tokio::test]
async fn null_final_content_becomes_empty_reply() {
    let mut silent = ChatMessage::assistant("");
    silent.content = None;
    let llm = ScriptedLlm::new(vec![Ok(silent)]);
    let mut runtime = runtime(llm);
    let mut conversation = Conversation::new();

    let reply = runtime.handle_turn(&mut conversation, "...").await.expect("turn succeeds");
    assert_eq!(reply, "");
}

#[tokio::test]
async fn tool_results_follow_call_order() {
    let llm = ScriptedLlm::new(vec![
        Ok(tool_calls(&[
            ("call_1", "search_hotels", r#"{"location":"New York"}"#),
            ("call_2", "book_hotel", book_alice()),
            ("call_3", "get_booking_details", r#"{"booking_id":1}"#),
        ])),
        Ok(ChatMessage::assistant("Done.")),
    ]);
    let mut runtime = runtime(llm);
    let mut conversation = Conversation::new();

    runtime.handle_turn(&mut conversation, "do it all").await.expect("turn succeeds");

    let answered = conversation.messages()[3..6]
        .iter()
        .map(|message| message.tool_call_id.clone().unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(answered, vec!["call_1", "call_2", "call_3"]);
    let lookup = tool_payload(&conversation.messages()[5]);
    assert_eq!(lookup["booking"]["guest_name"], "Alice");
}
