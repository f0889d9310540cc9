//! Event matchers.
//!
//! A [`Matcher`] is a side-effect free predicate over an optional event.
//! Matchers are plain values so that the event bus can compare them when
//! rejecting duplicate registrations.

use crate::event::{AggregateType, Event, EventType};

/// A composable predicate selecting events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Matcher {
    /// Matches every event, including an absent one.
    Any,
    /// Matches events of one event type.
    Event(EventType),
    /// Matches events belonging to one aggregate type.
    Aggregate(AggregateType),
    /// Matches if any inner matcher matches.
    AnyOf(Vec<Matcher>),
    /// Matches if every inner matcher matches.
    AllOf(Vec<Matcher>),
}

impl Matcher {
    /// Matches every event.
    #[must_use]
    pub fn any() -> Self {
        Self::Any
    }

    /// Matches events of `event_type`.
    #[must_use]
    pub fn event(event_type: EventType) -> Self {
        Self::Event(event_type)
    }

    /// Matches events of `aggregate_type`.
    #[must_use]
    pub fn aggregate(aggregate_type: AggregateType) -> Self {
        Self::Aggregate(aggregate_type)
    }

    /// Matches if any of `matchers` matches.
    #[must_use]
    pub fn any_of(matchers: impl IntoIterator<Item = Matcher>) -> Self {
        Self::AnyOf(matchers.into_iter().collect())
    }

    /// Matches if all of `matchers` match.
    #[must_use]
    pub fn all_of(matchers: impl IntoIterator<Item = Matcher>) -> Self {
        Self::AllOf(matchers.into_iter().collect())
    }

    /// Matches events of any of `event_types`.
    #[must_use]
    pub fn any_event_of(event_types: impl IntoIterator<Item = EventType>) -> Self {
        Self::any_of(event_types.into_iter().map(Self::Event))
    }

    /// Evaluates the matcher. Composites short-circuit left to right; an
    /// empty composite matches nothing.
    #[must_use]
    pub fn matches(&self, event: Option<&Event>) -> bool {
        match self {
            Self::Any => true,
            Self::Event(event_type) => event.is_some_and(|e| &e.event_type == event_type),
            Self::Aggregate(aggregate_type) => {
                event.is_some_and(|e| &e.aggregate_type == aggregate_type)
            }
            Self::AnyOf(matchers) => matchers.iter().any(|m| m.matches(event)),
            Self::AllOf(matchers) => {
                !matchers.is_empty() && matchers.iter().all(|m| m.matches(event))
            }
        }
    }
}
