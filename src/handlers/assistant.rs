use axum::{
    extract::{Form, State},
    response::Redirect,
};
use axum_extra::extract::Multipart;
use log::{info, warn};
use serde::Deserialize;

use super::local_path;
use crate::{
    ai::assistant::{Attachment, Conversation, Outcome, UserTurn},
    error::{AppError, AppResult},
    session::VendorSession,
    state::AppState,
};

const DEFAULT_RETURN: &str = "/inventory";
const BUSY: &str = "Please wait, I am still answering your last message.";

#[derive(Debug, Default)]
struct AssistantForm {
    message: String,
    image: Option<Attachment>,
    return_to: String,
}

async fn parse_assistant_multipart(mut multipart: Multipart) -> AppResult<AssistantForm> {
    let unreadable = |_| AppError::validation("Could not read the message. Is the photo too large?");
    let mut form = AssistantForm::default();

    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        if name == "image" {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(unreadable)?;
            if data.is_empty() {
                continue;
            }
            let mime_type = image_mime_type(content_type.as_deref(), file_name.as_deref())
                .ok_or_else(|| AppError::validation("Please attach a photo of the bill (JPEG, PNG or WebP)."))?;
            form.image = Some(Attachment {
                mime_type,
                data: data.to_vec(),
            });
        } else {
            let value = field.text().await.map_err(unreadable)?;
            match name.as_str() {
                "message" => form.message = value,
                "return_to" => form.return_to = value,
                _ => {}
            }
        }
    }

    Ok(form)
}

/// Declared content type first, then the file extension.
fn image_mime_type(content_type: Option<&str>, file_name: Option<&str>) -> Option<String> {
    if let Some(ct) = content_type.map(str::trim).filter(|ct| ct.starts_with("image/")) {
        return Some(ct.to_string());
    }

    let extension = file_name?.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => return None,
    };
    Some(mime.to_string())
}

fn back_to_panel(path: &str) -> Redirect {
    Redirect::to(&format!("{}#assistant", local_path(path, DEFAULT_RETURN)))
}

pub async fn send_message(
    State(state): State<AppState>,
    session: VendorSession,
    multipart: Multipart,
) -> Redirect {
    let workspace = state.sessions.workspace(&session.vendor_id);

    let form = match parse_assistant_multipart(multipart).await {
        Ok(form) => form,
        Err(e) => {
            workspace.set_assistant_notice(e.to_string());
            return back_to_panel(DEFAULT_RETURN);
        }
    };

    let Ok(mut conversation) = workspace.assistant.try_lock() else {
        workspace.set_assistant_notice(BUSY);
        return back_to_panel(&form.return_to);
    };

    let turn = UserTurn {
        text: form.message,
        image: form.image,
    };
    match conversation.send(state.model.as_ref(), turn).await {
        Ok(Outcome::Replied) => {}
        Ok(Outcome::UpdateRequested(items)) => {
            let result = state
                .products()
                .bulk_upsert(&session.vendor_id, &items)
                .await
                .map(|_| ());
            if result.is_ok() {
                info!("Assistant updated {} bill line(s) for {}", items.len(), session.vendor_id);
            }
            conversation.finish_update(result);
        }
        Err(e) => {
            warn!("Assistant message rejected: {}", e);
            workspace.set_assistant_notice(e.to_string());
        }
    }

    back_to_panel(&form.return_to)
}

#[derive(Debug, Deserialize)]
pub struct ResetForm {
    #[serde(default)]
    return_to: String,
}

/// Starts the conversation over, dropping any bill in progress.
pub async fn reset_conversation(
    State(state): State<AppState>,
    session: VendorSession,
    Form(form): Form<ResetForm>,
) -> Redirect {
    let workspace = state.sessions.workspace(&session.vendor_id);
    match workspace.assistant.try_lock() {
        Ok(mut conversation) => *conversation = Conversation::new(),
        Err(_) => workspace.set_assistant_notice(BUSY),
    }
    back_to_panel(&form.return_to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_mime_type() {
        assert_eq!(image_mime_type(Some("image/png"), None).as_deref(), Some("image/png"));
        assert_eq!(
            image_mime_type(Some("application/octet-stream"), Some("BILL.JPG")).as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(image_mime_type(None, Some("bill.pdf")), None);
        assert_eq!(image_mime_type(None, Some("bill")), None);
    }
}
