//! Inbound event interpretation.

use whatsapp_cloud::InboundKind;

use crate::catalog::{parse_comedian_ref, parse_quantity, ComedianRef};

pub const START_VOTING: &str = "start_voting";
pub const CLEAR_SESSION: &str = "clear_session";
pub const PLAY_AGAIN: &str = "play_again";
pub const PAYMENT_CONFIRMED_PREFIX: &str = "payment_confirmed_";
pub const PAYMENT_CANCELLED_PREFIX: &str = "payment_cancelled_";

/// Text that abandons the current flow.
pub const CLEAR_TEXT: &str = "#";

/// Texts that ask for a payment status check.
const STATUS_WORDS: [&str; 3] = ["status", "hali", "check"];

/// What an inbound event asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `#` or the "Futa Session" button.
    Clear,
    /// `status` / `hali` / `check`.
    CheckStatus,
    /// Show the comedian list, starting over.
    StartVoting,
    /// "Cheza Tena" after a confirmation.
    PlayAgain,
    /// "Nimelipa" for a transaction.
    ConfirmPayment(String),
    /// "Ghairi" for a transaction.
    CancelPayment(String),
    SelectComedian(ComedianRef),
    SelectQuantity(i64),
    /// Any other text, trimmed.
    Text(String),
    /// A reply id or message type the bot does not know.
    Unknown(String),
}

/// Interpret an inbound event.
pub fn parse(kind: &InboundKind) -> Command {
    match kind {
        InboundKind::Text(body) => parse_text(body),
        InboundKind::ButtonReply { id, .. } | InboundKind::ListReply { id, .. } => parse_reply(id),
        InboundKind::Unsupported(kind) => Command::Unknown(kind.clone()),
    }
}

fn parse_text(body: &str) -> Command {
    let text = body.trim();
    let normalized = text.to_lowercase();

    if normalized == CLEAR_TEXT {
        Command::Clear
    } else if STATUS_WORDS.contains(&normalized.as_str()) {
        Command::CheckStatus
    } else {
        Command::Text(text.to_string())
    }
}

fn parse_reply(id: &str) -> Command {
    match id {
        START_VOTING => return Command::StartVoting,
        CLEAR_SESSION => return Command::Clear,
        PLAY_AGAIN => return Command::PlayAgain,
        _ => {}
    }

    if let Some(tx) = id.strip_prefix(PAYMENT_CONFIRMED_PREFIX).filter(|t| !t.is_empty()) {
        return Command::ConfirmPayment(tx.to_string());
    }
    if let Some(tx) = id.strip_prefix(PAYMENT_CANCELLED_PREFIX).filter(|t| !t.is_empty()) {
        return Command::CancelPayment(tx.to_string());
    }
    if let Some(comedian) = parse_comedian_ref(id) {
        return Command::SelectComedian(comedian);
    }
    if let Some(quantity) = parse_quantity(id) {
        return Command::SelectQuantity(quantity);
    }

    Command::Unknown(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(body: &str) -> Command {
        parse(&InboundKind::Text(body.to_string()))
    }

    fn button(id: &str) -> Command {
        parse(&InboundKind::ButtonReply {
            id: id.to_string(),
            title: String::new(),
        })
    }

    fn list(id: &str) -> Command {
        parse(&InboundKind::ListReply {
            id: id.to_string(),
            title: String::new(),
        })
    }

    #[test]
    fn test_text_commands() {
        assert_eq!(text("#"), Command::Clear);
        assert_eq!(text("  # "), Command::Clear);
        assert_eq!(text("Status"), Command::CheckStatus);
        assert_eq!(text("hali"), Command::CheckStatus);
        assert_eq!(text("CHECK"), Command::CheckStatus);
        assert_eq!(text(" Anza "), Command::Text("Anza".to_string()));
        assert_eq!(text("status yangu"), Command::Text("status yangu".to_string()));
    }

    #[test]
    fn test_buttons() {
        assert_eq!(button("start_voting"), Command::StartVoting);
        assert_eq!(button("clear_session"), Command::Clear);
        assert_eq!(button("play_again"), Command::PlayAgain);
        assert_eq!(
            button("payment_confirmed_9f2c"),
            Command::ConfirmPayment("9f2c".to_string())
        );
        assert_eq!(
            button("payment_cancelled_9f2c"),
            Command::CancelPayment("9f2c".to_string())
        );
        assert_eq!(
            button("payment_confirmed_"),
            Command::Unknown("payment_confirmed_".to_string())
        );
    }

    #[test]
    fn test_list_rows() {
        assert_eq!(list("comedian_3"), Command::SelectComedian(ComedianRef::Id(3)));
        assert_eq!(
            list("comedian_eliud"),
            Command::SelectComedian(ComedianRef::Slug("eliud".to_string()))
        );
        assert_eq!(list("quantity_10"), Command::SelectQuantity(10));
        assert_eq!(list("quantity_"), Command::Unknown("quantity_".to_string()));
    }

    #[test]
    fn test_unsupported() {
        assert_eq!(
            parse(&InboundKind::Unsupported("image".to_string())),
            Command::Unknown("image".to_string())
        );
    }
}
