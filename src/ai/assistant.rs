//! The floating assistant: a per-vendor conversation that answers questions
//! and turns a photographed wholesale bill into an inventory update.
//!
//! Bill ingestion takes two user turns. The photo is sent first and the model
//! is told to ask which price column to use; the answer is sent together with
//! the retained photo, and only that reply may carry the structured block.
//!
//! ```text
//! AwaitingBillOrQuestion --image--> AwaitingPricingAnswer --text--> ReadyToEmitStructuredUpdate
//!          ^                                                                  |
//!          +--------------------------- update applied ------------------------+
//! ```

use log::{info, warn};

use super::{
    reply::{format_sources, parse_reply, AssistantReply},
    GenerateRequest, GenerativeModel, Part, Role, Turn,
};
use crate::{
    error::{AppError, AppResult},
    models::BillItem,
};

pub const GREETING: &str = "Hello! I am your Pharma Assistant. You can upload a photo of a wholesale bill to automatically update your inventory, or ask me any questions!";
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";
pub const PARSE_ERROR_NOTE: &str = "(Error: I tried to update the inventory but the data format was incorrect.)";
pub const WITHHELD_NOTE: &str =
    "(I have not changed your inventory yet. Tell me which price to use and I will prepare the update.)";
const BILL_ONLY_PROMPT: &str = "Here is a bill. Please analyze it.";
const EMPTY_REPLY: &str = "I couldn't process that.";
const HISTORY_LIMIT: usize = 10;

const BASE_INSTRUCTION: &str = r#"You are an intelligent assistant for a pharmacy inventory and point-of-sale app.

**General Capabilities**:
- Explain App Features (Inventory, Point of Sale, Sales & Orders, AI Manager).
- Medicine Search: use the googleSearch tool if asked about side effects or generic info.
"#;

const BILL_RECEIVED_INSTRUCTION: &str = r#"
**BILL SCANNING, STEP 1**
The user has uploaded an image of a wholesale bill or invoice.
1. Identify its columns, such as Item Name, Quantity, Rate/MRP and Free Qty.
2. Do NOT generate any JSON yet. Ask the user which price to use, for example:
   "I see columns for [List Columns]. Which column should I use as the Selling Price? Or do you want to apply a margin (e.g., +20%) to the Cost Price?"
"#;

const EMIT_UPDATE_INSTRUCTION: &str = r#"
**BILL SCANNING, STEP 2**
The attached image is the bill from earlier and the user's message answers your pricing question.
Output the inventory update as a single JSON code block like this:
```json
[
  { "name": "Exact Item Name", "stock": 50, "price": 10.5, "usage": "Infer usage (e.g. Fever)", "lowStockThreshold": 2 }
]
```
Set 'stock' to the quantity bought and 'price' to the selling price the user asked for. Infer 'usage' from medical knowledge of the drug name.
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    AwaitingBillOrQuestion,
    AwaitingPricingAnswer,
    ReadyToEmitStructuredUpdate,
}

impl Phase {
    fn system_instruction(self) -> String {
        match self {
            Phase::AwaitingBillOrQuestion => BASE_INSTRUCTION.to_string(),
            Phase::AwaitingPricingAnswer => format!("{BASE_INSTRUCTION}{BILL_RECEIVED_INSTRUCTION}"),
            Phase::ReadyToEmitStructuredUpdate => format!("{BASE_INSTRUCTION}{EMIT_UPDATE_INSTRUCTION}"),
        }
    }

    /// Short status line for the panel.
    pub fn hint(self) -> &'static str {
        match self {
            Phase::AwaitingBillOrQuestion => "Ask a question or attach a bill photo",
            Phase::AwaitingPricingAnswer => "Answer the pricing question to continue",
            Phase::ReadyToEmitStructuredUpdate => "Waiting for the inventory update",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserTurn {
    pub text: String,
    pub image: Option<Attachment>,
}

/// What the caller has to do after [`Conversation::send`].
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// The reply is already in the transcript.
    Replied,
    /// Apply these lines to the inventory, then call
    /// [`Conversation::finish_update`] with the result.
    UpdateRequested(Vec<BillItem>),
}

#[derive(Debug)]
struct PendingUpdate {
    item_count: usize,
    text: String,
}

#[derive(Debug)]
pub struct Conversation {
    phase: Phase,
    messages: Vec<ChatMessage>,
    bill: Option<Attachment>,
    pending: Option<PendingUpdate>,
}

impl Default for Conversation {
    fn default() -> Self {
        Conversation {
            phase: Phase::default(),
            messages: vec![ChatMessage {
                role: Role::Model,
                text: GREETING.to_string(),
            }],
            bill: None,
            pending: None,
        }
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn has_bill(&self) -> bool {
        self.bill.is_some()
    }

    /// Runs one user turn against the model.
    ///
    /// Model failures are reported in the transcript and leave the phase and
    /// any retained bill untouched; only an empty turn is an error.
    pub async fn send(&mut self, model: &dyn GenerativeModel, turn: UserTurn) -> AppResult<Outcome> {
        let text = turn.text.trim().to_string();
        if text.is_empty() && turn.image.is_none() {
            return Err(AppError::validation("Type a message or attach a bill photo."));
        }
        if self.pending.is_some() {
            return Err(AppError::validation("Please wait for the current update to finish."));
        }

        let (next_phase, image) = match (turn.image, self.phase, &self.bill) {
            (Some(image), _, _) => (Phase::AwaitingPricingAnswer, Some(image)),
            (None, Phase::AwaitingPricingAnswer | Phase::ReadyToEmitStructuredUpdate, Some(bill)) => {
                (Phase::ReadyToEmitStructuredUpdate, Some(bill.clone()))
            }
            (None, _, _) => (Phase::AwaitingBillOrQuestion, None),
        };
        let fresh_upload = next_phase == Phase::AwaitingPricingAnswer;

        let history = self.history();
        self.messages.push(ChatMessage {
            role: Role::User,
            text: if fresh_upload {
                format!("{} [Sent an Image]", text).trim_start().to_string()
            } else {
                text.clone()
            },
        });

        let mut parts = Vec::with_capacity(2);
        if let Some(image) = &image {
            parts.push(Part::Image {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            });
        }
        parts.push(Part::Text(if text.is_empty() {
            BILL_ONLY_PROMPT.to_string()
        } else {
            text
        }));

        let request = GenerateRequest {
            system_instruction: Some(next_phase.system_instruction()),
            history,
            parts,
            web_search: true,
        };

        let response = match model.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Assistant call failed: {}", e);
                self.say(APOLOGY.to_string());
                return Ok(Outcome::Replied);
            }
        };

        self.phase = next_phase;
        if fresh_upload {
            self.bill = image;
        }

        let reply_text = if response.text.trim().is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            response.text
        };
        let sources = format_sources(&response.citations);

        match parse_reply(&reply_text) {
            Ok(AssistantReply::Text(text)) => {
                self.say(format!("{}{}", text, sources));
                Ok(Outcome::Replied)
            }
            Ok(AssistantReply::TextWithUpdate { items, remaining_text }) => {
                if self.phase != Phase::ReadyToEmitStructuredUpdate {
                    info!("Withholding inventory update received before pricing was confirmed");
                    self.say(format!("{}\n\n{}{}", remaining_text, WITHHELD_NOTE, sources));
                    return Ok(Outcome::Replied);
                }
                self.pending = Some(PendingUpdate {
                    item_count: items.len(),
                    text: format!("{}{}", remaining_text, sources),
                });
                Ok(Outcome::UpdateRequested(items))
            }
            Err(e) => {
                warn!("Assistant returned an unreadable update: {}", e);
                self.say(format!("{}\n\n{}{}", reply_text, PARSE_ERROR_NOTE, sources));
                Ok(Outcome::Replied)
            }
        }
    }

    /// Records how applying an [`Outcome::UpdateRequested`] went. A success
    /// closes the bill; a failure keeps it so the user can ask again.
    pub fn finish_update(&mut self, result: AppResult<()>) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        match result {
            Ok(()) => {
                self.say(format!(
                    "✅ **Success!** I have added/updated {} items from the bill to your inventory.\n\n{}",
                    pending.item_count, pending.text
                ));
                self.phase = Phase::AwaitingBillOrQuestion;
                self.bill = None;
            }
            Err(e) => {
                warn!("Applying bill update failed: {}", e);
                self.say(format!("{}\n\n{}", pending.text, APOLOGY));
            }
        }
    }

    fn say(&mut self, text: String) {
        self.messages.push(ChatMessage {
            role: Role::Model,
            text: text.trim().to_string(),
        });
    }

    fn history(&self) -> Vec<Turn> {
        let skip = self.messages.len().saturating_sub(HISTORY_LIMIT);
        self.messages[skip..]
            .iter()
            .map(|m| Turn {
                role: m.role,
                text: m.text.clone(),
            })
            .collect()
    }
}
