//! Produce the plain text reports printed by the binary.
//! All amounts are shown in the base currency of the event, with two decimals.

use crate::types::{Balance, MoneyExchange, ParticipantOverview, Totals};

pub fn format_totals(totals: &Totals) -> String {
    let mut lines = vec![
        format!("Totals for {}", totals.event_name),
        format!("Total amount: {:.2}", totals.total_amount),
        String::new(),
    ];

    lines.extend(totals.participants.iter().map(format_participant));
    lines.push(String::new());

    lines.extend(totals.settlement.balances.iter().map(format_balance));
    lines.push(String::new());

    if totals.settlement.mismatch {
        lines.push(format!(
            "Credits ({:.2}) different than debits ({:.2})",
            totals.settlement.total_credits, totals.settlement.total_debits
        ));
    }
    lines.push(format_exchanges(&totals.settlement.exchanges));

    lines.join("\n")
}

fn format_participant(participant: &ParticipantOverview) -> String {
    format!(
        "{}: {:.2} in {} transactions. Totals: {:.2}, average: {:.2}.",
        participant.person.name,
        participant.total_contributed,
        participant.participation_count,
        participant.total_in_participations,
        participant.average_in_participations
    )
}

fn format_balance(balance: &Balance) -> String {
    format!(
        "{}: {:.2} out of {:.2} = {:.2} {}.",
        balance.person.name,
        balance.contributed,
        balance.share,
        balance.amount.abs(),
        if balance.amount > 0.0 { "debit" } else { "credit" }
    )
}

pub fn format_exchanges(exchanges: &[MoneyExchange]) -> String {
    if exchanges.is_empty() {
        "All clean!".to_string()
    } else {
        exchanges
            .iter()
            .map(format_exchange)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn format_exchange(exchange: &MoneyExchange) -> String {
    format!(
        "{} pays {} {:.2}.",
        exchange.debtor, exchange.creditor, exchange.amount
    )
}

pub fn format_simple_list<T: AsRef<str>>(elements: &[T]) -> String {
    if elements.is_empty() {
        "Nothing to show!".to_string()
    } else {
        elements
            .iter()
            .map(|e| format!("- {}", e.as_ref()))
            .fold(String::new(), |a, b| a + &b + "\n")
    }
}

#[cfg(test)]
mod tests {
    use crate::report::{tests::make_snapshot, totals};

    use super::*;

    #[test]
    fn test_format_totals() {
        let result = format_totals(&totals(&make_snapshot()));

        let expected = "Totals for Trip\n\
                        Total amount: 400.00\n\
                        \n\
                        p1: 200.00 in 1 transactions. Totals: 200.00, average: 100.00.\n\
                        p2: 100.00 in 2 transactions. Totals: 400.00, average: 200.00.\n\
                        p3: 100.00 in 1 transactions. Totals: 200.00, average: 100.00.\n\
                        \n\
                        p1: 200.00 out of 100.00 = 100.00 debit.\n\
                        p2: 100.00 out of 200.00 = 100.00 credit.\n\
                        p3: 100.00 out of 100.00 = 0.00 credit.\n\
                        \n\
                        p2 pays p1 100.00.";
        assert_eq!(expected, result);
    }

    #[test]
    fn test_format_mismatch() {
        let mut totals = totals(&make_snapshot());
        totals.settlement.mismatch = true;
        totals.settlement.total_credits = 100.0;
        totals.settlement.total_debits = 100.5;

        let result = format_totals(&totals);
        assert!(result.contains("\nCredits (100.00) different than debits (100.50)\np2 pays"));
    }

    #[test]
    fn test_format_exchanges() {
        let exchanges = vec![
            MoneyExchange::new("aa", "bb", 34.0),
            MoneyExchange::new("aacc", "bb", 21.126),
        ];

        assert_eq!("aa pays bb 34.00.\naacc pays bb 21.13.", format_exchanges(&exchanges));
        assert_eq!("All clean!", format_exchanges(&[]));
    }

    #[test]
    fn test_format_simple_list() {
        let elements = vec!["g1", "g2", "g3"];
        let result = format_simple_list(&elements);

        assert_eq!("- g1\n- g2\n- g3\n", result);
        assert_eq!("Nothing to show!", format_simple_list::<&str>(&[]));
    }
}
