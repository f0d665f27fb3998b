use serde::{ Deserialize, Serialize };

/// Request body for the hosted inference API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub inputs: Inputs,
    pub options: PayloadOptions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inputs {
    pub text: String,
    pub generated_responses: Vec<String>,
    pub past_user_inputs: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayloadOptions {
    pub wait_for_model: bool,
}

impl Payload {
    pub fn new(text: &str) -> Self {
        Self {
            inputs: Inputs {
                text: text.to_string(),
                generated_responses: Vec::new(),
                past_user_inputs: Vec::new(),
            },
            options: PayloadOptions { wait_for_model: true },
        }
    }

    /// Builds the payload and folds prior turns into it.
    pub fn with_context(text: &str, context: &[Option<String>]) -> Self {
        let mut payload = Self::new(text);
        payload.fold_context(context);
        payload
    }

    /// Even positions are earlier bot replies, odd positions earlier user inputs.
    /// Absent and empty turns are skipped but still occupy their position.
    pub fn fold_context(&mut self, context: &[Option<String>]) {
        for (index, turn) in context.iter().enumerate() {
            let Some(turn) = turn.as_deref().filter(|t| !t.is_empty()) else {
                continue;
            };
            if index % 2 == 0 {
                self.inputs.generated_responses.push(turn.to_string());
            } else {
                self.inputs.past_user_inputs.push(turn.to_string());
            }
        }
    }
}

/// Response body of the inference API. Some deployments wrap it in a one-element array.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum InferenceResponse {
    Single(Generated),
    Batch(Vec<Generated>),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Generated {
    #[serde(default)]
    pub generated_text: Option<String>,
}

impl InferenceResponse {
    pub fn into_text(self) -> Option<String> {
        match self {
            InferenceResponse::Single(g) => g.generated_text,
            InferenceResponse::Batch(items) => items.into_iter().next().and_then(|g| g.generated_text),
        }
    }
}
