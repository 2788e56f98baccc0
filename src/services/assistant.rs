use std::sync::Arc;

use chrono::NaiveDate;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BookingConfirmation, ParsedIntent, User};
use crate::services::ai::ChatMessage;
use crate::services::{availability, booking, intent};
use crate::state::AppState;

const SYSTEM_CONTEXT: &str = r#"Bạn là trợ lý đặt sân thể thao của hệ thống Sportbook tại Đà Nẵng. Hãy trả lời ngắn gọn, thân thiện, bằng tiếng Việt.

Nhiệm vụ của bạn:
- Tư vấn sân còn trống dựa trên danh sách sân trống được cung cấp bên dưới.
- Khi khách hàng đã chọn sân cụ thể và đồng ý đặt, hãy trả lời CHỈ bằng một JSON duy nhất theo mẫu:
{"field_id": <id sân>, "booking_date": "YYYY-MM-DD", "time_slot": "HH:MM - HH:MM"}
- Không bịa ra sân hoặc khung giờ không có trong danh sách sân trống.
- Nếu khách chưa quyết định, tiếp tục tư vấn bằng văn bản bình thường, không kèm JSON."#;

const HISTORY_LIMIT: i64 = 10;
/// Transcript window per session; older turns are dropped.
const SESSION_WINDOW: usize = 20;

/// Answer one chat message. Booking requests that match the utterance
/// grammar are resolved directly without an LLM round trip; everything
/// else goes to the model with the user's history and today's open slots
/// as context. A directive in the model's reply is resolved and replaced
/// by the booking outcome.
pub async fn answer(
    state: &Arc<AppState>,
    user: &User,
    question: &str,
    session_id: &str,
    today: NaiveDate,
) -> Result<String, AppError> {
    match intent::parse_utterance(question, today) {
        Ok(ParsedIntent::Utterance(utterance)) => {
            let result = {
                let db = state.db.lock().unwrap();
                booking::resolve_utterance(&db, &utterance, user.id)
            };
            let reply = match result {
                Ok(confirmation) => confirmation_text(&confirmation),
                Err(e) => refusal_text(&e),
            };
            remember(state, session_id, question, &reply);
            return Ok(reply);
        }
        Ok(ParsedIntent::Directive(directive)) => {
            let result = {
                let db = state.db.lock().unwrap();
                booking::resolve_directive(&db, &directive, user.id)
            };
            let reply = match result {
                Ok(confirmation) => confirmation_text(&confirmation),
                Err(e) => refusal_text(&e),
            };
            remember(state, session_id, question, &reply);
            return Ok(reply);
        }
        Ok(ParsedIntent::None) => {}
        Err(e) => {
            let reply = refusal_text(&e);
            remember(state, session_id, question, &reply);
            return Ok(reply);
        }
    }

    let (history_block, availability_block) = {
        let db = state.db.lock().unwrap();
        let history = queries::booking_history_for_user(&db, user.id, HISTORY_LIMIT)?;
        let history_lines: Vec<String> = history
            .iter()
            .map(|h| {
                format!(
                    "- #{} {} {} | {} ({}) | {} | {}",
                    h.booking_id,
                    h.booking_date,
                    h.time_slot,
                    h.field_name,
                    h.center_name,
                    h.status,
                    h.price
                )
            })
            .collect();

        let open = availability::availability(&db, today, None)?;
        let open_json =
            serde_json::to_string(&open).unwrap_or_else(|_| "[]".to_string());
        (history_lines.join("\n"), open_json)
    };

    let system = format!(
        "{SYSTEM_CONTEXT}\n\nHôm nay là {today}.\nKhách hàng: {} (id {}).\n\nLịch sử đặt sân gần đây:\n{}\n\nSân còn trống hôm nay (JSON):\n{}",
        user.full_name,
        user.id,
        if history_block.is_empty() {
            "(chưa có)"
        } else {
            &history_block
        },
        availability_block,
    );

    let mut messages = {
        let sessions = state.chat_sessions.lock().unwrap();
        sessions.get(session_id).cloned().unwrap_or_default()
    };
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: question.to_string(),
    });

    let reply = match state.llm.chat(&system, &messages).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, "LLM call failed");
            let fallback =
                "Xin lỗi, trợ lý đang tạm gián đoạn. Anh/chị vui lòng thử lại sau ít phút nhé."
                    .to_string();
            remember(state, session_id, question, &fallback);
            return Ok(fallback);
        }
    };

    let final_reply = match intent::parse_directive(&reply) {
        Some(directive) => {
            let result = {
                let db = state.db.lock().unwrap();
                booking::resolve_directive(&db, &directive, user.id)
            };
            match result {
                Ok(confirmation) => confirmation_text(&confirmation),
                Err(e) => refusal_text(&e),
            }
        }
        None => reply,
    };

    remember(state, session_id, question, &final_reply);
    Ok(final_reply)
}

fn confirmation_text(c: &BookingConfirmation) -> String {
    format!(
        "Đã đặt sân thành công! {} ({}), ngày {}, khung giờ {}, giá {}. Mã đặt sân: #{}.",
        c.field_name, c.center_name, c.booking_date, c.time_slot, c.price, c.booking_id
    )
}

fn refusal_text(e: &AppError) -> String {
    format!("Rất tiếc, không thể đặt sân: {e}. Anh/chị muốn thử khung giờ khác không?")
}

fn remember(state: &Arc<AppState>, session_id: &str, question: &str, reply: &str) {
    let mut sessions = state.chat_sessions.lock().unwrap();
    let transcript = sessions.entry(session_id.to_string()).or_default();
    transcript.push(ChatMessage {
        role: "user".to_string(),
        content: question.to_string(),
    });
    transcript.push(ChatMessage {
        role: "assistant".to_string(),
        content: reply.to_string(),
    });
    if transcript.len() > SESSION_WINDOW {
        let excess = transcript.len() - SESSION_WINDOW;
        transcript.drain(..excess);
    }
}
