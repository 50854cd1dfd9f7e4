//! Commands for the session context.

use fragments_core::command::Command;
use serde::Deserialize;
use uuid::Uuid;

/// Command to create a session in `start` status.
#[derive(Debug, Clone)]
pub struct CreateSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Identifier for the new session.
    pub session_id: Uuid,
}

/// Command to leave the start screen and begin playing.
#[derive(Debug, Clone)]
pub struct StartGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target session.
    pub session_id: Uuid,
}

/// Command to move one fragment in a single step.
#[derive(Debug, Clone)]
pub struct MoveFragment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target session.
    pub session_id: Uuid,
    /// Source index.
    pub from: usize,
    /// Destination index.
    pub to: usize,
}

/// One step of a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DragGesture {
    /// Pick up the fragment at `index`.
    Begin {
        /// Index of the fragment.
        index: usize,
    },
    /// Hover the dragged fragment over `target`.
    Propose {
        /// Index hovered over.
        target: usize,
    },
    /// Drop the dragged fragment.
    Commit,
}

/// Command carrying one drag gesture step.
#[derive(Debug, Clone)]
pub struct ApplyGesture {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target session.
    pub session_id: Uuid,
    /// The gesture step.
    pub gesture: DragGesture,
}

/// Command to restore the order the turn began with.
#[derive(Debug, Clone)]
pub struct ResetOrder {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target session.
    pub session_id: Uuid,
}

/// Command to submit the current order to the oracle.
#[derive(Debug, Clone)]
pub struct SubmitTurn {
    /// The correlation ID for tracing; also identifies the submission.
    pub correlation_id: Uuid,
    /// The target session.
    pub session_id: Uuid,
}

/// Command to discard all progress and return to `start`.
#[derive(Debug, Clone)]
pub struct ResetSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The target session.
    pub session_id: Uuid,
}

macro_rules! impl_command {
    ($($command:ty => $name:literal),+ $(,)?) => {
        $(
            impl Command for $command {
                fn command_type(&self) -> &'static str {
                    $name
                }

                fn correlation_id(&self) -> Uuid {
                    self.correlation_id
                }

                fn session_id(&self) -> Uuid {
                    self.session_id
                }
            }
        )+
    };
}

impl_command! {
    CreateSession => "session.create",
    StartGame => "session.start_game",
    MoveFragment => "session.move_fragment",
    ApplyGesture => "session.apply_gesture",
    ResetOrder => "session.reset_order",
    SubmitTurn => "session.submit_turn",
    ResetSession => "session.reset",
}
