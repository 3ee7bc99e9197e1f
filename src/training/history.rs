use serde::{Deserialize, Serialize};

/// Training loss per boosting round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub rounds: Vec<usize>,
    /// Training RMSE after each round
    pub losses: Vec<f64>,
}

impl TrainingHistory {
    pub fn record(&mut self, round: usize, loss: f64) {
        self.rounds.push(round);
        self.losses.push(loss);
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}
