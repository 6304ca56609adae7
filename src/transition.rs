//! Guarded State Transitions
//!
//! Both lifecycles (tour, guide) share one transition mechanism: a rule
//! names the states it may start from and the state it lands in, and the
//! store applies the rule as a single atomic check-and-mutate. Two racing
//! conflicting transitions therefore resolve to exactly one winner; the
//! loser re-reads a state the rule no longer admits and receives
//! [`CoreError::InvalidTransition`].
//!
//! The two deletion protocols share this module but diverge in one policy:
//! a repeated tour deletion request is a conflict, a repeated guide deletion
//! request overwrites the previous one. [`RepeatPolicy`] names that
//! divergence instead of burying it in duplicated guard code.

use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};

/// A lifecycle state that can name itself for errors and events.
pub trait StateName {
    /// Stable lowercase name, e.g. `"pending_deletion"`.
    fn state_name(&self) -> &'static str;
}

/// A named transition: allowed origin states and the destination state.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRule<S: 'static> {
    /// Operation name, e.g. `"approve"`. Used in errors and events.
    pub name: &'static str,
    /// States this transition may start from.
    pub from: &'static [S],
    /// State this transition lands in.
    pub to: S,
}

impl<S: StateName + PartialEq + Copy> TransitionRule<S> {
    /// Check the precondition against the current state.
    ///
    /// Must be called under the same store lock that performs the mutation,
    /// so the admitted state cannot change before the write lands.
    pub fn admit(&self, entity: &'static str, id: Uuid, current: S) -> CoreResult<()> {
        if self.from.contains(&current) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                entity,
                id,
                current: current.state_name(),
                attempted: self.name,
            })
        }
    }

    /// Admit the transition and return the destination state.
    pub fn apply(&self, entity: &'static str, id: Uuid, current: S) -> CoreResult<S> {
        self.admit(entity, id, current)?;
        Ok(self.to)
    }
}

/// Policy for re-issuing a request that is already outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatPolicy {
    /// A repeated request is a business conflict (tour deletion).
    Conflict,
    /// A repeated request overwrites the outstanding one (guide deletion).
    Overwrite,
}
