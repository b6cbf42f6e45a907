// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Procedure bodies.
//!
//! Each procedure reads only its [`RequestContext`] and input, keeps no state
//! between calls, and turns storage failures into internal errors that carry
//! the original cause. An offline storage handle (build passes) yields the
//! configured fallbacks instead of touching the database.

use herald_config::model::{OnEmptyPolicy, WelcomeConfig};
use herald_core::{HeraldError, Message, WelcomeMessage};
use herald_storage::StorageHandle;
use herald_storage::queries::messages;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::RequestContext;

/// Input for `addMessage`. Keys other than `text` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddMessageInput {
    pub text: String,
}

impl AddMessageInput {
    pub fn validate(&self) -> Result<(), HeraldError> {
        if self.text.is_empty() {
            return Err(HeraldError::Validation("Message cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMessageOutput {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GreetingInput {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    pub text: String,
}

/// Procedure implementations plus the welcome-message policy they need.
#[derive(Debug, Clone)]
pub struct Procedures {
    welcome: WelcomeConfig,
}

impl Procedures {
    pub fn new(welcome: WelcomeConfig) -> Self {
        Self { welcome }
    }

    /// Most recent message text.
    pub async fn get_welcome_message(
        &self,
        ctx: &RequestContext,
    ) -> Result<WelcomeMessage, HeraldError> {
        let db = match &ctx.storage {
            StorageHandle::Live(db) => db,
            StorageHandle::Offline => {
                return Ok(WelcomeMessage {
                    text: self.welcome.build_text.clone(),
                });
            }
        };

        let latest = messages::latest_message(db)
            .await
            .map_err(|e| HeraldError::internal("failed to fetch welcome message", e))?;
        match (latest, &self.welcome.on_empty) {
            (Some(message), _) => Ok(WelcomeMessage { text: message.text }),
            (None, OnEmptyPolicy::Fail) => Err(HeraldError::NotFound("no messages found".to_string())),
            (None, OnEmptyPolicy::Fallback(text)) => {
                warn!("no messages stored, serving fallback welcome text");
                Ok(WelcomeMessage { text: text.clone() })
            }
        }
    }

    /// Store a new message. Input must already be validated.
    pub async fn add_message(
        &self,
        ctx: &RequestContext,
        input: AddMessageInput,
    ) -> Result<AddMessageOutput, HeraldError> {
        let StorageHandle::Live(db) = &ctx.storage else {
            return Err(HeraldError::Config(
                "storage is not available at build time".to_string(),
            ));
        };

        let stored = messages::insert_message(db, &input.text)
            .await
            .map_err(|e| HeraldError::internal("failed to add message", e))?;
        info!(id = stored.id, identifier = %ctx.identifier, "message added");
        Ok(AddMessageOutput {
            success: true,
            message: format!("Added: {}", stored.text),
        })
    }

    /// All messages, newest first.
    pub async fn list_messages(&self, ctx: &RequestContext) -> Result<Vec<Message>, HeraldError> {
        let StorageHandle::Live(db) = &ctx.storage else {
            return Ok(Vec::new());
        };
        let all = messages::list_messages(db)
            .await
            .map_err(|e| HeraldError::internal("failed to list messages", e))?;
        debug!(count = all.len(), "listed messages");
        Ok(all)
    }

    pub fn greeting(&self, input: GreetingInput) -> Greeting {
        let name = input.name.as_deref().unwrap_or("world");
        Greeting {
            text: format!("Hello {name} from the server!"),
        }
    }
}
