//! Transmission / radio / report classifier (§4.4.9). Sets a pending
//! message tag; the next non-empty line is consumed as the body and fires
//! `MessageReceived`.

use crate::display::PendingMessage;
use crate::events::UiCallbacks;
use crate::fields::{param, positional_params};
use crate::session::Parser;
use crate::types::{Message, MessageKind};

const INCOMING: &str = "Incoming transmission from";
const CONTINUING: &str = "Continuing transmission from";

pub fn is_entry(text: &str) -> bool {
    text.starts_with(INCOMING) || text.starts_with(CONTINUING)
}

pub fn handle_entry<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    let base_kind = if text.starts_with(INCOMING) {
        MessageKind::Incoming
    } else {
        MessageKind::Continuing
    };
    let (kind, sender, channel) = classify(text, base_kind);
    session.set_pending_message(PendingMessage { kind, sender, channel });
}

fn after_from(text: &str) -> Option<&str> {
    text.find("from ").map(|idx| &text[idx + "from ".len()..])
}

fn classify(text: &str, base_kind: MessageKind) -> (MessageKind, Option<String>, Option<u32>) {
    if text.ends_with("comm-link:") {
        let sender = (|| {
            let start = text.find("from ")? + "from ".len();
            let end = text.find(" on Federation")?;
            (end > start).then(|| text[start..end].trim().to_string())
        })();
        return (MessageKind::Fedlink, sender, None);
    }

    let params = positional_params(text);
    if param(&params, 5) == Some("Fighters:") {
        return (MessageKind::Fighter, None, None);
    }
    if param(&params, 5) == Some("Computers:") {
        return (MessageKind::Computer, None, None);
    }

    if let Some(idx) = text.find(" on channel ") {
        let sender = after_from(text)
            .map(|rest| rest.split(" on channel ").next().unwrap_or("").trim().to_string());
        let channel = text[idx + " on channel ".len()..]
            .split_whitespace()
            .next()
            .and_then(|tok| tok.trim_end_matches(['.', ':']).parse::<u32>().ok());
        return (MessageKind::Radio, sender, channel);
    }

    let sender = after_from(text).map(|rest| rest.trim_end_matches(['.', ':']).to_string());
    (base_kind, sender, None)
}

/// Consumes the line following a transmission header as the message body.
pub fn handle_body_line<U: UiCallbacks>(session: &mut Parser<U>, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    let Some(pending) = session.display.context.current_message.take() else {
        return;
    };
    let message = Message {
        kind: pending.kind,
        timestamp_ms: crate::events::now_ms(),
        content: text.to_string(),
        sender: pending.sender,
        channel: pending.channel,
    };
    session.fire_message_received(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::events::UiCallbacks as _;
    use crate::store::Store;

    #[derive(Default)]
    struct NoopUi;
    impl UiCallbacks for NoopUi {}

    fn new_parser() -> Parser<NoopUi> {
        Parser::new(ParserConfig::default(), Store::open_in_memory().unwrap(), NoopUi)
    }

    #[test]
    fn radio_transmission_extracts_sender_and_channel() {
        let mut parser = new_parser();
        handle_entry(&mut parser, "Incoming transmission from Zaphod on channel 5:");
        assert!(parser.display.context.current_message.is_some());

        handle_body_line(&mut parser, "Hello, is anyone out there?");
        assert!(parser.display.context.current_message.is_none());
        assert_eq!(parser.messages.len(), 1);
        assert_eq!(parser.messages[0].sender.as_deref(), Some("Zaphod"));
        assert_eq!(parser.messages[0].channel, Some(5));
        assert_eq!(parser.messages[0].kind, MessageKind::Radio);
    }

    #[test]
    fn blank_line_does_not_consume_pending_message() {
        let mut parser = new_parser();
        handle_entry(&mut parser, "Incoming transmission from a trader.");
        handle_body_line(&mut parser, "   ");
        assert!(parser.display.context.current_message.is_some());
    }
}
