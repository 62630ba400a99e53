use crate::errors::AppError;
use crate::models::{parse_date, BetInput, BetRecord, LedgerData};
use uuid::Uuid;

impl BetInput {
    /// Normalizes user input in place and rejects values the ledger cannot hold.
    pub fn validate(mut self) -> Result<Self, AppError> {
        let date = self.date.trim();
        if parse_date(date).is_none() {
            return Err(AppError::bad_request(format!(
                "date must be YYYY-MM-DD, got '{date}'"
            )));
        }
        self.date = date.to_string();

        if !self.stake.is_finite() || self.stake < 0.0 {
            return Err(AppError::bad_request("stake must be a non-negative number"));
        }
        if let Some(payout) = self.payout {
            if !payout.is_finite() || payout < 0.0 {
                return Err(AppError::bad_request("payout must be a non-negative number"));
            }
        }

        self.race_name = self
            .race_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        Ok(self)
    }
}

impl LedgerData {
    pub fn records(&self) -> &[BetRecord] {
        &self.entries
    }

    pub fn find(&self, id: &str) -> Option<&BetRecord> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn append(&mut self, input: BetInput) -> BetRecord {
        let record = into_record(Uuid::new_v4().to_string(), input);
        self.entries.push(record.clone());
        self.sort();
        record
    }

    pub fn append_many(&mut self, inputs: Vec<BetInput>) -> usize {
        let count = inputs.len();
        self.entries.extend(
            inputs
                .into_iter()
                .map(|input| into_record(Uuid::new_v4().to_string(), input)),
        );
        self.sort();
        count
    }

    pub fn update(&mut self, id: &str, input: BetInput) -> Option<BetRecord> {
        let entry = self.entries.iter_mut().find(|entry| entry.id == id)?;
        *entry = into_record(entry.id.clone(), input);
        let updated = entry.clone();
        self.sort();
        Some(updated)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub(crate) fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.date.cmp(&b.date));
    }
}

fn into_record(id: String, input: BetInput) -> BetRecord {
    BetRecord {
        id,
        date: input.date,
        race_name: input.race_name,
        stake: input.stake,
        payout: input.payout,
    }
}
