/// Trait for status enums that move through a forward-only state machine.
///
/// Implementations encode the legal transition table; engines consult
/// `can_transition_to` before mutating a status field so illegal edges are
/// rejected in one place.
pub trait LifecycleState: Clone + std::fmt::Debug + PartialEq {
    /// Terminal states admit no further transitions.
    fn is_terminal(&self) -> bool;

    /// Whether moving from `self` to `next` is a legal edge.
    fn can_transition_to(&self, next: &Self) -> bool;
}
