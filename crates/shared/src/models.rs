use serde::{Deserialize, Serialize};

/// A LessWrong post selected for translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub url: String,
    pub title: String,
    pub html: String,
}

/// Output of a full translation session. `parts` holds one translated
/// chunk per input chunk, in the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub title: String,
    pub summary: String,
    pub parts: Vec<String>,
}
