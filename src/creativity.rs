/// How adventurous the remote model should be, forwarded as `temperature`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Creativity {
    Focused,
    Balanced,
    #[default]
    Creative,
}

impl Creativity {
    /// Form value sent to the chat endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            Creativity::Focused => "0.2",
            Creativity::Balanced => "0.5",
            Creativity::Creative => "1",
        }
    }

    pub fn value(&self) -> f32 {
        match self {
            Creativity::Focused => 0.2,
            Creativity::Balanced => 0.5,
            Creativity::Creative => 1.0,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "0.2" | "focused" => Some(Creativity::Focused),
            "0.5" | "balanced" => Some(Creativity::Balanced),
            "1" | "1.0" | "creative" => Some(Creativity::Creative),
            _ => None,
        }
    }

    pub fn all() -> Vec<Creativity> {
        vec![Creativity::Focused, Creativity::Balanced, Creativity::Creative]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Creativity::Focused => "🎯 Focused (0.2)",
            Creativity::Balanced => "⚖️ Balanced (0.5)",
            Creativity::Creative => "🚀 Creative (1.0)",
        }
    }

    /// Cycle to the next level, wrapping around
    pub fn next(&self) -> Self {
        match self {
            Creativity::Focused => Creativity::Balanced,
            Creativity::Balanced => Creativity::Creative,
            Creativity::Creative => Creativity::Focused,
        }
    }
}
