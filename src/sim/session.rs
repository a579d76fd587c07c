/// Session record: what the player told us and how far they got.
///
/// Created empty with the flow controller, written by the screen that owns
/// each field, read by anyone who personalizes. Never reset mid-run.

use super::level::LightColor;

const NAME_PLACEHOLDER: &str = "{name}";

#[derive(Clone, Debug, Default)]
pub struct SessionState {
    name: Option<String>,
    color: Option<LightColor>,
    completed: Vec<usize>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Store a trimmed name. Blank input clears it.
    pub fn set_name(&mut self, raw: &str) {
        let trimmed = raw.trim();
        self.name = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
    }

    pub fn color(&self) -> Option<&LightColor> {
        self.color.as_ref()
    }

    /// The chosen color, or `fallback` when no choice was made.
    pub fn color_or(&self, fallback: &LightColor) -> LightColor {
        self.color.clone().unwrap_or_else(|| fallback.clone())
    }

    pub fn set_color(&mut self, color: LightColor) {
        self.color = Some(color);
    }

    /// Record a finished level. Repeats are ignored.
    pub fn mark_completed(&mut self, level: usize) {
        if !self.completed.contains(&level) {
            self.completed.push(level);
        }
    }

    pub fn completed_levels(&self) -> &[usize] {
        &self.completed
    }

    /// Fill the `{name}` slot: ", Name" with a name, nothing without.
    pub fn personalize(&self, text: &str) -> String {
        let replacement = match self.name() {
            Some(n) => format!(", {n}"),
            None => String::new(),
        };
        text.replace(NAME_PLACEHOLDER, &replacement)
    }
}
