//! Load score: the live 0–100 pressure signal and its history.

pub mod engine;
pub mod history;

pub use engine::{LoadInputs, ScoreEngine};
pub use history::{ScoreHistory, ScorePoint, MAX_HISTORY};
