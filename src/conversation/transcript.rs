use crate::entities::Role;

/// Handle to an assistant reply bubble that is still being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyId(pub u64);

/// Rendered view of the conversation.
pub trait Transcript {
    /// Appends a finished message.
    fn push_message(&mut self, role: Role, text: &str);

    /// Shows a typing placeholder for an upcoming assistant reply.
    fn begin_reply(&mut self) -> ReplyId;

    /// Re-renders the placeholder with the text received so far.
    fn update_reply(&mut self, id: ReplyId, text: &str);

    /// Drops the typing decoration and shows the final text.
    fn finish_reply(&mut self, id: ReplyId, text: &str);

    /// Removes a placeholder whose reply failed.
    fn discard_reply(&mut self, id: ReplyId);
}
