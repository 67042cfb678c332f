//! Terminal rendering of inbound server events.

use kobo_server::domain::Language;
use kobo_server::infrastructure::dto::websocket::{
    CommentThreadDto, CursorPosition, CursorSelection, ReplyDto, ServerEvent, UserDto,
};
use kobo_shared::time::timestamp_to_rfc3339;

const BAR: &str = "============================================================";
const RULE: &str = "------------------------------------------------------------";

/// Event formatter for terminal display
pub struct EventFormatter;

impl EventFormatter {
    /// Render an inbound event.
    ///
    /// # Returns
    ///
    /// `None` when the event needs no output (e.g. an empty comment list).
    pub fn format_event(event: &ServerEvent, current_user_id: &str) -> Option<String> {
        match event {
            ServerEvent::RoomJoined {
                room_id,
                code,
                language,
                users,
                host_user_id,
            } => Some(Self::format_room_joined(
                room_id,
                code,
                *language,
                users,
                host_user_id,
                current_user_id,
            )),
            ServerEvent::CommentInit { comments } => Self::format_comment_init(comments),
            ServerEvent::UserJoined { user_id, username } => {
                Some(format!("\n+ {} ({}) joined\n", username, user_id))
            }
            ServerEvent::UserLeft { user_id } => Some(format!("\n- {} left\n", user_id)),
            ServerEvent::HostChanged { host_user_id } => {
                if host_user_id == current_user_id {
                    Some("\n* You are now the host\n".to_string())
                } else {
                    Some(format!("\n* {} is now the host\n", host_user_id))
                }
            }
            ServerEvent::CodeUpdate { code } => Some(Self::format_code_update(code)),
            ServerEvent::LanguageUpdate { language } => {
                Some(format!("\n* Language switched to {}\n", language))
            }
            ServerEvent::CursorUpdate {
                user_id,
                position,
                selection,
            } => Self::format_cursor_update(user_id, position.as_ref(), selection.as_ref()),
            ServerEvent::ExecutionResult { output, error } => Some(
                Self::format_execution_result(output.as_deref(), error.as_deref()),
            ),
            ServerEvent::Kicked { reason, .. } => Some(format!("\n! {}\n", reason)),
            ServerEvent::JoinDenied { reason } => Some(format!("\n! Join denied: {}\n", reason)),
            ServerEvent::CommentAdded { comment } => Some(Self::format_comment_added(comment)),
            ServerEvent::CommentReplied { comment_id, reply } => {
                Some(Self::format_comment_replied(comment_id, reply))
            }
            ServerEvent::CommentResolved { comment_id } => {
                Some(format!("\n* Thread {} resolved\n", comment_id))
            }
            ServerEvent::CommentUnresolved { comment_id } => {
                Some(format!("\n* Thread {} reopened\n", comment_id))
            }
        }
    }

    /// Format a frame that did not parse as a known event
    pub fn format_raw(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }

    /// Format the room snapshot shown right after joining
    fn format_room_joined(
        room_id: &str,
        code: &str,
        language: Language,
        users: &[UserDto],
        host_user_id: &str,
        current_user_id: &str,
    ) -> String {
        let mut output = String::new();
        output.push_str("\n\n");
        output.push_str(BAR);
        output.push('\n');
        output.push_str(&format!("Room '{}' (language: {})\n", room_id, language));
        output.push_str("Members:\n");
        for user in users {
            let mut markers = Vec::new();
            if user.user_id == current_user_id {
                markers.push("me");
            }
            if user.user_id == host_user_id {
                markers.push("host");
            }
            let suffix = if markers.is_empty() {
                String::new()
            } else {
                format!(" ({})", markers.join(", "))
            };
            output.push_str(&format!("  {} [{}]{}\n", user.username, user.user_id, suffix));
        }
        if code.is_empty() {
            output.push_str("(empty document)\n");
        } else {
            output.push_str("Current document:\n");
            output.push_str(code);
            if !code.ends_with('\n') {
                output.push('\n');
            }
        }
        output.push_str(BAR);
        output.push('\n');
        output
    }

    fn format_comment_init(comments: &[CommentThreadDto]) -> Option<String> {
        if comments.is_empty() {
            return None;
        }
        let mut output = String::new();
        output.push_str("\nComment threads:\n");
        for comment in comments {
            output.push_str(&Self::format_thread(comment));
        }
        Some(output)
    }

    fn format_thread(comment: &CommentThreadDto) -> String {
        let state = if comment.resolved { " [resolved]" } else { "" };
        let mut text = format!(
            "  L{} @{}: {}{} (thread {})\n",
            comment.line_number, comment.author_name, comment.message, state, comment.id
        );
        for reply in &comment.replies {
            text.push_str(&format!("    @{}: {}\n", reply.author_name, reply.message));
        }
        text
    }

    fn format_code_update(code: &str) -> String {
        let mut output = String::new();
        output.push('\n');
        output.push('\n');
        output.push_str(RULE);
        output.push('\n');
        output.push_str("Document updated:\n");
        output.push_str(code);
        if !code.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(RULE);
        output.push('\n');
        output
    }

    fn format_cursor_update(
        user_id: &str,
        position: Option<&CursorPosition>,
        selection: Option<&CursorSelection>,
    ) -> Option<String> {
        // 選択範囲があればそちらを優先して表示する
        match (position, selection) {
            (_, Some(selection)) => Some(format!(
                "\n* {} selected {}:{} to {}:{}\n",
                user_id,
                selection.start_line_number,
                selection.start_column,
                selection.end_line_number,
                selection.end_column
            )),
            (Some(position), None) => Some(format!(
                "\n* {} moved to {}:{}\n",
                user_id, position.line_number, position.column
            )),
            (None, None) => None,
        }
    }

    fn format_execution_result(output: Option<&str>, error: Option<&str>) -> String {
        match (output, error) {
            (Some(output), _) => {
                let mut text = String::new();
                text.push_str("\n\n");
                text.push_str(BAR);
                text.push('\n');
                text.push_str("Execution output:\n");
                text.push_str(output);
                if !output.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(BAR);
                text.push('\n');
                text
            }
            (None, Some(error)) => format!("\n! Execution failed: {}\n", error),
            (None, None) => "\n! Execution produced no result\n".to_string(),
        }
    }

    fn format_comment_added(comment: &CommentThreadDto) -> String {
        format!(
            "\n@{} commented on line {} at {}: {}\n  (reply with /reply {})\n",
            comment.author_name,
            comment.line_number,
            timestamp_to_rfc3339(comment.created_at),
            comment.message,
            comment.id
        )
    }

    fn format_comment_replied(comment_id: &str, reply: &ReplyDto) -> String {
        format!(
            "\n@{} replied in thread {} at {}: {}\n",
            reply.author_name,
            comment_id,
            timestamp_to_rfc3339(reply.created_at),
            reply.message
        )
    }
}
