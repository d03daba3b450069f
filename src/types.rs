use chrono::{DateTime, Utc};

pub type Amount = f64;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Person {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub participants: Vec<Person>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Currency {
    pub id: i64,
    pub name: String,
    pub exchange_rate: f64,
    pub is_base: bool,
}

/// A transaction as shown to the user, with the derived participant lists and volumes.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    /// Event participants minus the excluded ones, plus the extra ones.
    pub participants: Vec<Person>,
    pub extra_participants: Vec<Person>,
    pub excluded_participants: Vec<Person>,
    pub contributors: Vec<Person>,
    pub total_volume: Amount,
    pub average_volume: Amount,
}

/// The contribution (if any) of one participant of a transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct Participation {
    pub person: Person,
    pub contribution_id: Option<i64>,
    pub currency: Option<Currency>,
    pub amount: Option<Amount>,
    pub base_amount: Option<Amount>,
}

/// Everything stored about an event, loaded at once so that reports can be
/// computed without going back to the database.
#[derive(Clone, Debug)]
pub struct EventSnapshot {
    pub event: Event,
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Clone, Debug)]
pub struct TransactionRecord {
    pub id: i64,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub extra_participants: Vec<Person>,
    pub excluded_participants: Vec<Person>,
    pub contributions: Vec<ContributionRecord>,
}

#[derive(Clone, Debug)]
pub struct ContributionRecord {
    pub id: i64,
    pub person: Person,
    pub amount: Amount,
    pub currency: Currency,
}

#[derive(Clone, Debug)]
pub struct ParticipantOverview {
    pub person: Person,
    pub participations: Vec<ParticipationOverview>,
    pub participation_count: usize,
    pub total_contributed: Amount,
    pub average_contributed: Amount,
    pub total_in_participations: Amount,
    /// Sum of the per-transaction averages, not an average of totals.
    pub average_in_participations: Amount,
}

#[derive(Clone, Debug)]
pub struct ParticipationOverview {
    pub transaction_id: i64,
    pub transaction_description: String,
    pub contributed: Amount,
    pub total_amount: Amount,
    pub average_amount: Amount,
}

#[derive(Clone, Debug)]
pub struct TransactionOverview {
    pub transaction_id: i64,
    pub transaction_description: String,
    pub participants: Vec<TransactionParticipant>,
    pub total_amount: Amount,
    pub average_amount: Amount,
}

#[derive(Clone, Debug)]
pub struct TransactionParticipant {
    pub person_id: i64,
    pub person_name: String,
    pub amount: Amount,
}

/// An instruction: *debtor* pays *amount* to *creditor*.
#[derive(Clone, Debug, PartialEq)]
pub struct MoneyExchange {
    pub debtor: String,
    pub creditor: String,
    pub amount: Amount,
}

#[derive(Clone, Debug)]
pub struct Balance {
    pub person: Person,
    pub contributed: Amount,
    pub share: Amount,
    /// Positive when the person paid more than their share.
    pub amount: Amount,
}

#[derive(Clone, Debug)]
pub struct Settlement {
    pub balances: Vec<Balance>,
    pub exchanges: Vec<MoneyExchange>,
    pub total_credits: Amount,
    pub total_debits: Amount,
    /// Set when credits and debits differ once rounded to cents.
    pub mismatch: bool,
}

#[derive(Clone, Debug)]
pub struct Totals {
    pub event_name: String,
    pub total_amount: Amount,
    pub participants: Vec<ParticipantOverview>,
    pub settlement: Settlement,
}

impl Person {
    pub fn new(id: i64, name: &str) -> Person {
        Person {
            id,
            name: name.to_string(),
        }
    }
}

impl Currency {
    pub fn new(id: i64, name: &str, exchange_rate: f64, is_base: bool) -> Currency {
        Currency {
            id,
            name: name.to_string(),
            exchange_rate,
            is_base,
        }
    }
}

impl MoneyExchange {
    pub fn new(debtor: &str, creditor: &str, amount: Amount) -> MoneyExchange {
        MoneyExchange {
            debtor: debtor.to_string(),
            creditor: creditor.to_string(),
            amount,
        }
    }
}

impl ContributionRecord {
    /// The contributed amount converted to the base currency of the event.
    pub fn base_amount(&self) -> Amount {
        self.amount * self.currency.exchange_rate
    }
}

impl TransactionRecord {
    pub fn is_extra(&self, person_id: i64) -> bool {
        self.extra_participants.iter().any(|p| p.id == person_id)
    }

    pub fn is_excluded(&self, person_id: i64) -> bool {
        self.excluded_participants.iter().any(|p| p.id == person_id)
    }

    pub fn contribution_of(&self, person_id: i64) -> Option<&ContributionRecord> {
        self.contributions.iter().find(|c| c.person.id == person_id)
    }

    pub fn total_volume(&self) -> Amount {
        self.contributions.iter().map(|c| c.base_amount()).sum()
    }

    /// Event members that are not excluded, followed by the extra participants.
    pub fn effective_participants(&self, event_participants: &[Person]) -> Vec<Person> {
        event_participants
            .iter()
            .filter(|p| !self.is_excluded(p.id))
            .chain(self.extra_participants.iter().filter(|p| {
                !event_participants.iter().any(|member| member.id == p.id)
            }))
            .cloned()
            .collect()
    }
}
