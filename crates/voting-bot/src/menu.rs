//! Outbound messages of the voting flow (Swahili).

use chrono::NaiveDateTime;
use database::{Ad, Comedian, PaymentStatus, WelcomeVideo};
use whatsapp_cloud::{ListRow, ListSection, OutgoingMessage, ReplyButton};

use crate::catalog::{comedian_row_id, format_amount, Tier, TIERS};
use crate::command::{
    CLEAR_SESSION, PAYMENT_CANCELLED_PREFIX, PAYMENT_CONFIRMED_PREFIX, PLAY_AGAIN, START_VOTING,
};

const CONTEST_TITLE: &str = "Comedian Bora wa Mwezi";

const WELCOME_FIRST_TIME: &str = "Karibu kuchagua comedian bora wa mwezi. Sasa utaweza kushinda \
TV, Friji, Blenda na Simu kwa kushiriki kumpigia kura comedian wako pendwa.";

const WELCOME_RETURNING: &str = "Karibu tena! Endelea kumpigia kura comedian wako pendwa na \
ujishindie TV, Friji, Blenda na Simu.";

pub fn welcome(phone: &str, first_time: bool) -> OutgoingMessage {
    let body = if first_time {
        WELCOME_FIRST_TIME
    } else {
        WELCOME_RETURNING
    };

    OutgoingMessage::buttons(
        phone,
        Some(CONTEST_TITLE),
        body,
        vec![ReplyButton::new(START_VOTING, "Bonyeza Kupiga Kura")],
    )
}

pub fn welcome_video(phone: &str, video: &WelcomeVideo) -> OutgoingMessage {
    OutgoingMessage::video(phone, &video.video_url, Some(video.title.as_str()))
}

pub fn comedian_list(phone: &str, comedians: &[Comedian]) -> OutgoingMessage {
    let rows = comedians
        .iter()
        .map(|c| {
            ListRow::new(comedian_row_id(c.id), &c.name)
                .with_description(format!("Piga kura kwa {}", c.name))
        })
        .collect();

    OutgoingMessage::list(
        phone,
        Some("Chagua Comedian"),
        "Chagua comedian wako pendwa kutoka kwenye orodha hapa chini:",
        "Chagua Comedian",
        vec![ListSection::new("Comedians", rows)],
    )
}

pub fn no_comedians(phone: &str) -> OutgoingMessage {
    OutgoingMessage::text(
        phone,
        "Hakuna comedians kwa sasa. Tafadhali jaribu tena baadaye.",
    )
}

pub fn comedian_not_found(phone: &str) -> OutgoingMessage {
    OutgoingMessage::text(
        phone,
        "Comedian huyo hajapatikana. Tafadhali chagua kutoka kwenye orodha.",
    )
}

pub fn no_active_session(phone: &str) -> OutgoingMessage {
    OutgoingMessage::text(
        phone,
        "Hakuna kipindi cha kupiga kura kwa sasa. Tafadhali jaribu tena baadaye.",
    )
}

/// Picture of the chosen comedian, when one is set.
pub fn comedian_image(phone: &str, comedian: &Comedian) -> Option<OutgoingMessage> {
    comedian
        .image_url
        .as_deref()
        .map(|url| OutgoingMessage::image(phone, url, Some(comedian.name.as_str())))
}

/// Tier list. The sponsored tier is left out once the free vote is used.
pub fn quantity_list(phone: &str, comedian_name: &str, offer_free: bool) -> OutgoingMessage {
    let rows = TIERS
        .iter()
        .filter(|t| offer_free || !t.is_free())
        .map(|t| ListRow::new(t.row_id(), t.title()).with_description(t.description()))
        .collect();

    let header = format!("Kura kwa {}", comedian_name);
    OutgoingMessage::list(
        phone,
        Some(header.as_str()),
        "Chagua idadi ya kura unayotaka kupiga:",
        "Chagua Idadi",
        vec![ListSection::new("Idadi ya Kura", rows)],
    )
}

pub fn free_vote_used(phone: &str) -> OutgoingMessage {
    OutgoingMessage::text(
        phone,
        "Umeshatumia kura yako ya bure. Tafadhali chagua idadi nyingine ya kura.",
    )
}

pub fn ask_payment_phone(phone: &str, tier: &Tier) -> OutgoingMessage {
    OutgoingMessage::text(
        phone,
        format!(
            "Umechagua kura {} kwa TZS {}.\n\nTuma namba ya simu utakayolipia (mfano 255712345678).",
            tier.quantity,
            format_amount(tier.price)
        ),
    )
}

pub fn invalid_payment_phone(phone: &str) -> OutgoingMessage {
    OutgoingMessage::text(
        phone,
        "Namba ya simu si sahihi. Tuma tarakimu pekee, angalau 10 (mfano 255712345678).",
    )
}

fn payment_buttons(transaction_id: &str) -> Vec<ReplyButton> {
    vec![
        ReplyButton::new(format!("{}{}", PAYMENT_CONFIRMED_PREFIX, transaction_id), "Nimelipa"),
        ReplyButton::new(format!("{}{}", PAYMENT_CANCELLED_PREFIX, transaction_id), "Ghairi"),
    ]
}

pub fn payment_initiated(phone: &str, amount: i64, transaction_id: &str) -> OutgoingMessage {
    OutgoingMessage::buttons(
        phone,
        Some("Malipo"),
        format!(
            "Ombi la malipo la TZS {} limetumwa kwenye simu yako. Weka PIN kukamilisha malipo, \
             kisha bonyeza \"Nimelipa\".",
            format_amount(amount)
        ),
        payment_buttons(transaction_id),
    )
}

pub fn payment_pending(phone: &str, transaction_id: &str) -> OutgoingMessage {
    OutgoingMessage::buttons(
        phone,
        Some("Malipo"),
        "Malipo yako bado yanasubiri kuthibitishwa. Bonyeza \"Nimelipa\" ukishalipa au \
         \"Ghairi\" kusitisha.",
        payment_buttons(transaction_id),
    )
}

pub fn payment_start_failed(phone: &str) -> OutgoingMessage {
    OutgoingMessage::text(
        phone,
        "Imeshindikana kuanzisha malipo. Tafadhali jaribu tena.",
    )
}

/// Outcome notice for a payment that ended without being paid.
pub fn payment_closed(phone: &str, status: PaymentStatus) -> OutgoingMessage {
    let body = match status {
        PaymentStatus::Cancelled => "Malipo yameghairiwa.",
        PaymentStatus::Expired => "Muda wa malipo umeisha. Tuma ujumbe wowote kuanza upya.",
        _ => "Malipo hayakufanikiwa. Tafadhali jaribu tena.",
    };
    OutgoingMessage::text(phone, body)
}

pub fn payment_already_final(phone: &str, status: PaymentStatus) -> OutgoingMessage {
    let body = if status.is_settled() {
        "Malipo haya tayari yamethibitishwa.".to_string()
    } else {
        format!("Malipo haya tayari yamefungwa ({}).", status)
    };
    OutgoingMessage::text(phone, body)
}

pub fn no_pending_payment(phone: &str) -> OutgoingMessage {
    OutgoingMessage::text(phone, "Huna malipo yanayosubiri kwa sasa.")
}

pub fn vote_error(phone: &str) -> OutgoingMessage {
    OutgoingMessage::text(phone, "Kuna hitilafu katika malipo. Tafadhali jaribu tena.")
}

/// Sponsor creative shown with a free vote.
pub fn ad(phone: &str, ad: &Ad) -> OutgoingMessage {
    let caption = format!(
        "{}\n{}\n\nImedhaminiwa na {}",
        ad.title, ad.description, ad.sponsor_name
    );
    match ad.image_url.as_deref() {
        Some(url) => OutgoingMessage::image(phone, url, Some(caption.as_str())),
        None => OutgoingMessage::text(phone, caption),
    }
}

/// Vote confirmation with the ticket codes and the announcement date.
pub fn confirmation(
    phone: &str,
    comedian_name: &str,
    quantity: i64,
    ticket_codes: &[String],
    winner_announcement_date: &str,
) -> OutgoingMessage {
    let body = format!(
        "Votes Details\nUmempigia kura {}\n\nUmepata tickets {} ambazo ni:\n{}\n\n\
         Washindi watatangazwa tarehe {}\n\nVigezo na Masharti kuzingatiwa",
        quantity,
        ticket_codes.len(),
        ticket_codes.join("\n"),
        announcement_date(winner_announcement_date)
    );

    let header = format!("Ahsante kwa kumpigia kura {}", comedian_name);
    OutgoingMessage::buttons(
        phone,
        Some(header.as_str()),
        body,
        vec![ReplyButton::new(PLAY_AGAIN, "Cheza Tena")],
    )
}

/// Ticket codes alone, when the vote's comedian or session is gone.
pub fn tickets_issued(phone: &str, quantity: i64, ticket_codes: &[String]) -> OutgoingMessage {
    OutgoingMessage::buttons(
        phone,
        None,
        format!(
            "Kura zako {} zimepokelewa.\n\nUmepata tickets {} ambazo ni:\n{}",
            quantity,
            ticket_codes.len(),
            ticket_codes.join("\n")
        ),
        vec![ReplyButton::new(PLAY_AGAIN, "Cheza Tena")],
    )
}

pub fn session_cleared(phone: &str) -> OutgoingMessage {
    OutgoingMessage::text(phone, "Session imefutwa. Unaweza kuanza upya.")
}

pub fn session_expired(phone: &str) -> OutgoingMessage {
    OutgoingMessage::text(phone, "Session yako imeisha muda. Tafadhali anza upya.")
}

/// Prompt for input that does not fit the current step.
pub fn ongoing_session(phone: &str) -> OutgoingMessage {
    OutgoingMessage::buttons(
        phone,
        Some("Session Inaendelea"),
        "Umeingilia session ambayo tayari inaendelea.\n\nTafadhali bonyeza \"Anza\" ili uanze \
         upya, au bonyeza \"#\" ili ufute session hii.",
        vec![
            ReplyButton::new(START_VOTING, "Anza"),
            ReplyButton::new(CLEAR_SESSION, "Futa Session"),
        ],
    )
}

/// Render a stored `YYYY-MM-DD HH:MM:SS` timestamp as `dd.mm.YYYY`.
pub fn announcement_date(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
