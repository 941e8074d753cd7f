// Keyboard focus across the widgets of one generation

use crate::engine::widget::WidgetSettings;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    #[default]
    Unfocused,
    /// Index into the generation's widget list
    FocusedOn(usize),
}

impl FocusState {
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Unfocused => None,
            Self::FocusedOn(index) => Some(*index),
        }
    }

    pub fn is_focused(&self) -> bool {
        matches!(self, Self::FocusedOn(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    Next,
    Prev,
    Clear,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: FocusState,
    /// The key was used for focus and must not travel further
    pub consumed: bool,
}

#[derive(Debug, Clone)]
struct Target {
    index: usize,
    focus_char: Option<char>,
}

/// Focus state machine. Built fresh for every generation and starts
/// `Unfocused`.
#[derive(Debug, Clone, Default)]
pub struct FocusTracker {
    /// Focusable widgets in declared order
    targets: Vec<Target>,
    state: FocusState,
}

impl FocusTracker {
    pub fn new<'a>(widgets: impl IntoIterator<Item = &'a WidgetSettings>) -> Self {
        let targets = widgets
            .into_iter()
            .enumerate()
            .filter(|(_, settings)| settings.is_focusable())
            .map(|(index, settings)| Target {
                index,
                focus_char: settings.focus_char,
            })
            .collect();

        Self {
            targets,
            state: FocusState::Unfocused,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn focused(&self) -> Option<usize> {
        self.state.index()
    }

    pub fn focusable_count(&self) -> usize {
        self.targets.len()
    }

    fn position_of(&self, state: FocusState) -> Option<usize> {
        let index = state.index()?;
        self.targets.iter().position(|t| t.index == index)
    }

    fn at(&self, position: usize) -> FocusState {
        FocusState::FocusedOn(self.targets[position].index)
    }

    /// Pure transition table: (state, event) -> (next state, consumed).
    pub fn transition(&self, state: FocusState, event: FocusEvent) -> Transition {
        let count = self.targets.len();
        let unchanged = Transition {
            next: state,
            consumed: false,
        };

        match event {
            FocusEvent::Next | FocusEvent::Prev if count == 0 => Transition {
                next: FocusState::Unfocused,
                consumed: false,
            },
            FocusEvent::Next => {
                let position = match self.position_of(state) {
                    Some(current) => (current + 1) % count,
                    None => 0,
                };
                Transition {
                    next: self.at(position),
                    consumed: true,
                }
            }
            FocusEvent::Prev => {
                let position = match self.position_of(state) {
                    Some(current) => (current + count - 1) % count,
                    None => count - 1,
                };
                Transition {
                    next: self.at(position),
                    consumed: true,
                }
            }
            FocusEvent::Clear => Transition {
                next: FocusState::Unfocused,
                consumed: true,
            },
            FocusEvent::Char(c) => match self.targets.iter().find(|t| t.focus_char == Some(c)) {
                Some(target) => Transition {
                    next: FocusState::FocusedOn(target.index),
                    consumed: true,
                },
                None => unchanged,
            },
        }
    }

    /// Apply `event` to the tracker's own state. Returns whether it was
    /// consumed.
    pub fn apply(&mut self, event: FocusEvent) -> bool {
        let transition = self.transition(self.state, event);
        if transition.next != self.state {
            tracing::debug!(from = ?self.state, to = ?transition.next, "focus changed");
        }
        self.state = transition.next;
        transition.consumed
    }

    pub fn next(&mut self) -> bool {
        self.apply(FocusEvent::Next)
    }

    pub fn prev(&mut self) -> bool {
        self.apply(FocusEvent::Prev)
    }

    pub fn none(&mut self) -> bool {
        self.apply(FocusEvent::Clear)
    }

    pub fn focus_on(&mut self, c: char) -> bool {
        self.apply(FocusEvent::Char(c))
    }
}
