use super::actions::Action;

/// Discord rejects messages above 2000 characters; leave some headroom.
pub const MESSAGE_LIMIT: usize = 1990;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// One outgoing message: Markdown text plus rows of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub buttons: Vec<Vec<Button>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        if !buttons.is_empty() {
            self.buttons.push(buttons);
        }
        self
    }

    pub fn has_button(&self, action: Action) -> bool {
        self.buttons.iter().flatten().any(|b| b.action == action)
    }

    /// Split into transport-sized messages. Buttons stay on the last one.
    pub fn into_chunks(self) -> Vec<Reply> {
        let mut parts: Vec<Reply> = split_message(&self.text, MESSAGE_LIMIT)
            .into_iter()
            .map(|chunk| Reply::text(chunk))
            .collect();
        match parts.last_mut() {
            Some(last) => last.buttons = self.buttons,
            None => parts.push(Reply {
                text: String::new(),
                buttons: self.buttons,
            }),
        }
        parts
    }
}

/// Split text into chunks of at most `max_bytes`, preferring line breaks,
/// then spaces, and never cutting a UTF-8 character.
pub fn split_message(text: &str, max_bytes: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= max_bytes {
            chunks.push(remaining);
            break;
        }
        let mut limit = max_bytes;
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }
        let window = &remaining[..limit];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .map(|i| i + 1)
            .unwrap_or(limit);
        let split_at = if split_at == 0 {
            remaining
                .char_indices()
                .nth(1)
                .map_or(remaining.len(), |(i, _)| i)
        } else {
            split_at
        };
        chunks.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }
    chunks
}
