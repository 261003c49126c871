//! Page model. Each page's kind is fixed when the page list is built.

use serde::{Deserialize, Serialize};

/// One of the two paragraph options on a pair page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    Option1,
    Option2,
}

impl Choice {
    /// The option that was not chosen.
    pub fn opposite(self) -> Self {
        match self {
            Self::Option1 => Self::Option2,
            Self::Option2 => Self::Option1,
        }
    }

    /// 1 for the left option, 2 for the right one.
    pub fn number(self) -> u8 {
        match self {
            Self::Option1 => 1,
            Self::Option2 => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Option1),
            2 => Some(Self::Option2),
            _ => None,
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Where the customized rewrite sits relative to the generic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairOrder {
    GenericFirst,
    CustomFirst,
}

impl PairOrder {
    pub fn describe(self) -> &'static str {
        match self {
            Self::GenericFirst => "Generic rewrite first, customized rewrite second.",
            Self::CustomFirst => "Customized rewrite first, generic rewrite second.",
        }
    }
}

/// Generated paragraphs for a test-session page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairContent {
    pub paragraph1: String,
    pub paragraph2: String,
    pub order: PairOrder,
}

impl PairContent {
    /// The personalized rewrite, whichever side it is on.
    pub fn custom(&self) -> &str {
        match self.order {
            PairOrder::GenericFirst => &self.paragraph2,
            PairOrder::CustomFirst => &self.paragraph1,
        }
    }

    pub fn generic(&self) -> &str {
        match self.order {
            PairOrder::GenericFirst => &self.paragraph1,
            PairOrder::CustomFirst => &self.paragraph2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    Welcome {
        text: String,
    },
    Instructions {
        text: String,
    },
    TrainingPair {
        option1: String,
        option2: String,
        icon: Option<String>,
    },
    /// `interaction` is 1-based. `content` stays `None` until the rewrite
    /// phase delivers.
    GeneratedPair {
        interaction: usize,
        content: Option<PairContent>,
    },
    Closing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub title: String,
    pub kind: PageKind,
}

impl Page {
    /// Whether `advance` needs a recorded selection on this page.
    pub fn requires_selection(&self) -> bool {
        matches!(
            self.kind,
            PageKind::TrainingPair { .. } | PageKind::GeneratedPair { .. }
        )
    }

    /// Both paragraph texts, if this is a pair page with content.
    pub fn paragraphs(&self) -> Option<(&str, &str)> {
        match &self.kind {
            PageKind::TrainingPair {
                option1, option2, ..
            } => Some((option1.as_str(), option2.as_str())),
            PageKind::GeneratedPair {
                content: Some(c), ..
            } => Some((c.paragraph1.as_str(), c.paragraph2.as_str())),
            _ => None,
        }
    }

    /// Text of one option, if this is a pair page with content.
    pub fn option_text(&self, choice: Choice) -> Option<&str> {
        self.paragraphs().map(|(p1, p2)| match choice {
            Choice::Option1 => p1,
            Choice::Option2 => p2,
        })
    }

    /// Formatted pair used as profiler input.
    pub fn pair_context(&self) -> Option<String> {
        let (p1, p2) = self.paragraphs()?;
        Some(format!(
            "{} \n\nParagraph 1:\n{}\n\nParagraph 2:\n{}",
            self.title, p1, p2
        ))
    }

    pub fn interaction(&self) -> Option<usize> {
        match self.kind {
            PageKind::GeneratedPair { interaction, .. } => Some(interaction),
            _ => None,
        }
    }

    pub fn is_awaiting_content(&self) -> bool {
        matches!(self.kind, PageKind::GeneratedPair { content: None, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training(title: &str, a: &str, b: &str) -> Page {
        Page {
            index: 2,
            title: title.to_string(),
            kind: PageKind::TrainingPair {
                option1: a.to_string(),
                option2: b.to_string(),
                icon: None,
            },
        }
    }

    #[test]
    fn opposite_flips() {
        assert_eq!(Choice::Option1.opposite(), Choice::Option2);
        assert_eq!(Choice::Option2.opposite(), Choice::Option1);
    }

    #[test]
    fn number_mapping() {
        assert_eq!(Choice::from_number(1), Some(Choice::Option1));
        assert_eq!(Choice::from_number(2), Some(Choice::Option2));
        assert_eq!(Choice::from_number(3), None);
        assert_eq!(Choice::Option2.to_string(), "2");
    }

    #[test]
    fn selection_required_only_on_pairs() {
        let welcome = Page {
            index: 0,
            title: "Welcome".into(),
            kind: PageKind::Welcome { text: "hi".into() },
        };
        let closing = Page {
            index: 9,
            title: "Close".into(),
            kind: PageKind::Closing,
        };
        assert!(!welcome.requires_selection());
        assert!(!closing.requires_selection());
        assert!(training("t", "a", "b").requires_selection());
    }

    #[test]
    fn option_text_maps_choices() {
        let page = training("Water Cycle", "A", "B");
        assert_eq!(page.option_text(Choice::Option1), Some("A"));
        assert_eq!(page.option_text(Choice::Option2), Some("B"));
    }

    #[test]
    fn pair_context_format() {
        let page = training("Water Cycle", "A", "B");
        assert_eq!(
            page.pair_context().unwrap(),
            "Water Cycle \n\nParagraph 1:\nA\n\nParagraph 2:\nB"
        );
    }

    #[test]
    fn generated_placeholder_has_no_text() {
        let page = Page {
            index: 6,
            title: "GPT Interaction 1".into(),
            kind: PageKind::GeneratedPair {
                interaction: 1,
                content: None,
            },
        };
        assert!(page.is_awaiting_content());
        assert!(page.option_text(Choice::Option1).is_none());
        assert_eq!(page.interaction(), Some(1));
    }
}
