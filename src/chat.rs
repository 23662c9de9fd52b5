//! FAQ chat widget: keyword intent matching over canned Spanish answers,
//! plus conversation/message persistence.
//!
//! Answers are selected synchronously by the first matching rule; there is
//! no model call and no streaming.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::MessageRole;

/// Returned when no rule matches the patient's message.
pub const DEFAULT_ANSWER: &str = "Lo siento, no tengo una respuesta para esa pregunta. \
     Puedes comunicarte con soporte o preguntar sobre citas, recetas, documentos o pagos.";

struct FaqRule {
    pattern: Regex,
    answer: &'static str,
}

/// Intent patterns and their canned answers. Matching is case-insensitive
/// so accented capitals also hit.
const RAW_RULES: &[(&str, &str)] = &[
    (
        r"agend\w*|reserv\w*|nueva cita|sacar (una )?cita",
        "Para agendar una cita, busca a tu médico por especialidad, elige un \
         horario disponible y confirma la reserva. La cita quedará pendiente \
         hasta que el médico la confirme.",
    ),
    (
        r"cancelar|reprogramar|cambiar.*cita",
        "Puedes cancelar una cita pendiente o confirmada desde la sección \
         Mis citas. Una vez cancelada no puede reactivarse; agenda una nueva \
         si lo necesitas.",
    ),
    (
        r"receta|prescripci[oó]n|medicamento",
        "Tus recetas aparecen en la sección Recetas después de cada consulta. \
         Puedes descargarlas en PDF con la firma y el sello de tu médico.",
    ),
    (
        r"documento|archivo|subir|radiograf[ií]a|estudio",
        "Puedes adjuntar documentos (PDF, Word, imágenes o texto, máximo 10 MB) \
         a cada cita desde su detalle, para que tu médico los revise antes de \
         la consulta.",
    ),
    (
        r"pago|costo|cuest\w*|precio|factura|seguro",
        "El costo de la consulta lo define cada médico y se muestra antes de \
         confirmar la cita. Si cuentas con seguro médico, registra tu póliza \
         en tu perfil.",
    ),
    (
        r"horario|disponibilidad|atenci[oó]n",
        "Los horarios disponibles de cada médico se muestran en su perfil al \
         momento de agendar. La agenda se actualiza en tiempo real.",
    ),
    (
        r"perfil|datos personales|contacto de emergencia",
        "Completa tu perfil en la sección Mi perfil: datos de contacto, \
         contacto de emergencia y seguro médico. Un perfil completo agiliza \
         tus consultas.",
    ),
];

fn faq_rules() -> &'static [FaqRule] {
    static RULES: OnceLock<Vec<FaqRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        RAW_RULES
            .iter()
            .filter_map(|(pattern, answer)| {
                Regex::new(&format!("(?i){pattern}"))
                    .ok()
                    .map(|pattern| FaqRule { pattern, answer })
            })
            .collect()
    })
}

/// First matching rule wins; falls back to [`DEFAULT_ANSWER`].
pub fn answer_for(message: &str) -> &'static str {
    faq_rules()
        .iter()
        .find(|rule| rule.pattern.is_match(message))
        .map(|rule| rule.answer)
        .unwrap_or(DEFAULT_ANSWER)
}

/// Conversation title from the first patient message. Truncates at 50
/// characters with "..." on a UTF-8 boundary.
pub fn generate_title(first_message: &str) -> String {
    let trimmed = first_message.trim();
    if trimmed.is_empty() {
        return "Nueva conversación".to_string();
    }

    let boundary = trimmed
        .char_indices()
        .take(50)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(trimmed.len());

    if boundary >= trimmed.len() {
        trimmed.to_string()
    } else {
        format!("{}...", &trimmed[..boundary])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSuggestion {
    pub text: String,
    pub category: String,
}

/// Suggestions shown in the empty chat state.
pub fn default_suggestions() -> Vec<PromptSuggestion> {
    vec![
        PromptSuggestion {
            text: "¿Cómo agendo una cita?".into(),
            category: "citas".into(),
        },
        PromptSuggestion {
            text: "¿Dónde veo mis recetas?".into(),
            category: "recetas".into(),
        },
        PromptSuggestion {
            text: "¿Cómo subo un documento para mi médico?".into(),
            category: "documentos".into(),
        },
        PromptSuggestion {
            text: "¿Puedo cancelar una cita confirmada?".into(),
            category: "citas".into(),
        },
        PromptSuggestion {
            text: "¿Cuánto cuesta una consulta?".into(),
            category: "pagos".into(),
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub last_message_at: String,
    pub message_count: u32,
    pub last_message_preview: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationDetail {
    pub id: String,
    pub title: String,
    pub started_at: String,
    pub messages: Vec<ChatMessage>,
}

/// Record a patient message and its FAQ answer. Creates the conversation
/// (titled from the message) when no id is supplied. Returns the assistant
/// message.
pub fn send_message(
    conn: &Connection,
    conversation_id: Option<&str>,
    content: &str,
) -> Result<ChatMessage, DatabaseError> {
    let conversation_id = match conversation_id {
        Some(id) => {
            // Must exist; a stale id from the client is a 404.
            conn.query_row(
                "SELECT id FROM conversations WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                    entity_type: "Conversation".into(),
                    id: id.into(),
                },
                other => DatabaseError::from(other),
            })?
        }
        None => {
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO conversations (id, title) VALUES (?1, ?2)",
                params![id, generate_title(content)],
            )?;
            id
        }
    };

    insert_message(conn, &conversation_id, MessageRole::Patient, content)?;
    let answer = answer_for(content);
    insert_message(conn, &conversation_id, MessageRole::Assistant, answer)
}

fn insert_message(
    conn: &Connection,
    conversation_id: &str,
    role: MessageRole,
    content: &str,
) -> Result<ChatMessage, DatabaseError> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO messages (id, conversation_id, role, content) VALUES (?1, ?2, ?3, ?4)",
        params![id, conversation_id, role.as_str(), content],
    )?;
    conn.query_row(
        "SELECT id, conversation_id, role, content, timestamp FROM messages WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        },
    )
    .map_err(DatabaseError::from)
    .and_then(|(id, conversation_id, role_raw, content, timestamp)| {
        Ok(ChatMessage {
            id,
            conversation_id,
            role: MessageRole::from_str(&role_raw)?,
            content,
            timestamp,
        })
    })
}

/// Conversation list with derived summary fields, newest activity first.
pub fn list_conversation_summaries(
    conn: &Connection,
) -> Result<Vec<ConversationSummary>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT
            c.id,
            c.title,
            COALESCE(MAX(m.timestamp), c.started_at) AS last_message_at,
            COUNT(m.id) AS message_count,
            COALESCE(
                (SELECT SUBSTR(m2.content, 1, 80) FROM messages m2
                 WHERE m2.conversation_id = c.id
                 ORDER BY m2.timestamp DESC LIMIT 1),
                ''
            ) AS last_message_preview
         FROM conversations c
         LEFT JOIN messages m ON m.conversation_id = c.id
         GROUP BY c.id
         ORDER BY last_message_at DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(ConversationSummary {
            id: row.get(0)?,
            title: row.get(1)?,
            last_message_at: row.get(2)?,
            message_count: row.get::<_, i64>(3)? as u32,
            last_message_preview: row.get(4)?,
        })
    })?;

    let mut summaries = Vec::new();
    for row in rows {
        summaries.push(row?);
    }
    Ok(summaries)
}

pub fn get_conversation(
    conn: &Connection,
    id: &str,
) -> Result<ConversationDetail, DatabaseError> {
    let (title, started_at) = conn
        .query_row(
            "SELECT title, started_at FROM conversations WHERE id = ?1",
            params![id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                entity_type: "Conversation".into(),
                id: id.into(),
            },
            other => DatabaseError::from(other),
        })?;

    // rowid breaks ties between messages written in the same second
    let mut stmt = conn.prepare(
        "SELECT id, conversation_id, role, content, timestamp
         FROM messages WHERE conversation_id = ?1
         ORDER BY timestamp ASC, rowid ASC",
    )?;
    let rows = stmt.query_map(params![id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut messages = Vec::new();
    for row in rows {
        let (mid, conversation_id, role_raw, content, timestamp) = row?;
        messages.push(ChatMessage {
            id: mid,
            conversation_id,
            role: MessageRole::from_str(&role_raw)?,
            content,
            timestamp,
        });
    }

    Ok(ConversationDetail {
        id: id.to_string(),
        title,
        started_at,
        messages,
    })
}
