pub mod game;

pub use game::{
    DuelGameController, DuelOutcome, DuelRoundRecord, DuelStatus, VisibleState,
};
