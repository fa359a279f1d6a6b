//! Wire format for out-of-process candidates.
//!
//! `<candidate> describe` prints a [`crate::signature::Manifest`].
//! `<candidate> call <operation>` reads a [`CallRequest`] on stdin and prints a
//! [`CallResponse`] on stdout.

use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::FitnessData;

pub const DESCRIBE_COMMAND: &str = "describe";
pub const CALL_COMMAND: &str = "call";

/// Named arguments for one operation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    pub fitness_data: FitnessData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<f64>,
}

impl CallRequest {
    pub fn new(fitness_data: &FitnessData) -> Self {
        Self {
            fitness_data: fitness_data.clone(),
            user_name: None,
            calories_burned: None,
        }
    }

    pub fn user(mut self, user_name: &str) -> Self {
        self.user_name = Some(user_name.to_string());
        self
    }

    pub fn calories(mut self, calories_burned: f64) -> Self {
        self.calories_burned = Some(calories_burned);
        self
    }
}

/// Candidate reply to a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallResponse {
    Ok(CallReply),
    /// The candidate raised a fault; the string describes it.
    Error(String),
}

/// Successful call result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallReply {
    /// The request's dataset after the call, for mutating operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitness_data: Option<FitnessData>,
    /// The operation's return value.
    #[serde(default)]
    pub value: Value,
}

impl CallResponse {
    /// Convert an `error` reply into an `Err`.
    pub fn into_reply(self) -> Result<CallReply> {
        match self {
            CallResponse::Ok(reply) => Ok(reply),
            CallResponse::Error(message) => Err(anyhow!(message)),
        }
    }
}

impl CallReply {
    /// Decode the return value into the operation's result type.
    pub fn decode_value<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.value.clone())
            .with_context(|| format!("unexpected return value {}", self.value))
    }
}
