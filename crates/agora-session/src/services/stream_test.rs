use agora_types::ChatMessage;
use agora_types::ChatScope;
use agora_types::LogLine;
use agora_types::SocketFrame;

use super::*;

fn chat_frame(sender: &str, scope: ChatScope, content: &str) -> SocketFrame {
    return SocketFrame::Chat(ChatMessage {
        sender: sender.to_string(),
        scope,
        content: content.to_string(),
        ..Default::default()
    });
}

#[test]
fn public_chat_frames_append_to_the_broadcast_transcript() {
    let store = SessionStore::in_memory();

    StreamService::apply(
        &store,
        chat_frame("Isabella Rodriguez", ChatScope::Public, "good morning"),
    )
    .unwrap();
    StreamService::apply(
        &store,
        chat_frame("Klaus Mueller", ChatScope::Public, "morning!"),
    )
    .unwrap();

    let session = store.read();
    assert_eq!(session.public_messages.len(), 2);
    assert_eq!(session.public_messages[0].content, "good morning");
    assert_eq!(session.public_messages[1].sender, "Klaus Mueller");
    assert!(session.private_messages.is_empty());
}

#[test]
fn a_private_frame_appends_one_entry_and_preserves_order() {
    let store = SessionStore::in_memory();

    let mut session = store.read();
    session.push_private_message(
        "Klaus Mueller",
        ChatMessage {
            sender: "operator".to_string(),
            content: "how are you?".to_string(),
            ..Default::default()
        },
    );
    store.write(session).unwrap();

    StreamService::apply(
        &store,
        chat_frame("Klaus Mueller", ChatScope::Private, "quite well"),
    )
    .unwrap();

    let session = store.read();
    let transcript = &session.private_messages["Klaus Mueller"];
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].content, "how are you?");
    assert_eq!(transcript[1].content, "quite well");
    assert!(session.public_messages.is_empty());
}

#[test]
fn log_frames_append_rendered_lines() {
    let store = SessionStore::in_memory();

    StreamService::apply(
        &store,
        SocketFrame::Log(LogLine {
            level: "INFO".to_string(),
            message: "step 3 complete".to_string(),
        }),
    )
    .unwrap();

    assert_eq!(store.read().logs, vec!["[INFO] step 3 complete"]);
}
