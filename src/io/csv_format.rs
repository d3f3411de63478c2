//! CSV format handling for operation records, invoice output and event output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to domain operations
//! - Invoice book serialization
//! - Event log serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::core::AdvanceBook;
use crate::types::{
    Address, EventRecord, Invoice, InvoiceId, Operation, OperationRecord, ProtocolEvent, Role,
    Timestamp,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Column header of the invoice book output
pub const INVOICE_HEADER: [&str; 13] = [
    "id",
    "seller",
    "buyer",
    "amount",
    "due_date",
    "status",
    "created_at",
    "paid_at",
    "cleared_at",
    "principal",
    "interest",
    "total_repayment",
    "repaid",
];

/// Column header of the event log output
pub const EVENT_HEADER: [&str; 7] = [
    "sequence", "time", "event", "invoice", "account", "amount", "details",
];

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns:
/// type, time, caller, invoice, target, role, amount, due, meta
///
/// Only `type`, `time` and `caller` are present on every row; which of the
/// other columns are required depends on the operation type.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub op_type: String,
    pub time: Timestamp,
    pub caller: String,
    pub invoice: Option<InvoiceId>,
    pub target: Option<String>,
    pub role: Option<String>,
    pub amount: Option<String>,
    pub due: Option<Timestamp>,
    pub meta: Option<String>,
}

/// Convert a CsvRecord to an OperationRecord
///
/// This function:
/// - Parses the operation type (case-insensitive)
/// - Checks that every column the operation needs is present
/// - Parses amounts into Decimal, roles into Role, fees into integer bps
///
/// Amount range and precision are not checked here; the engine rejects
/// them like any other invalid argument.
///
/// # Arguments
///
/// * `csv_record` - The deserialized CSV record
///
/// # Returns
///
/// Result containing either:
/// - Ok(OperationRecord) - Successfully converted record
/// - Err(String) - Error message describing the conversion failure
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<OperationRecord, String> {
    let op_type = csv_record.op_type.trim().to_lowercase();
    let caller = csv_record.caller.trim();
    if caller.is_empty() {
        return Err(format!("{} operation requires a caller", op_type));
    }

    let operation = match op_type.as_str() {
        "grant" => Operation::GrantRole {
            role: parse_role(&csv_record, &op_type)?,
            account: required_address(&csv_record.target, "target", &op_type)?,
        },
        "revoke" => Operation::RevokeRole {
            role: parse_role(&csv_record, &op_type)?,
            account: required_address(&csv_record.target, "target", &op_type)?,
        },
        "fund" => Operation::Fund {
            account: required_address(&csv_record.target, "target", &op_type)?,
            amount: parse_amount(&csv_record.amount, &op_type)?,
        },
        "set_fee" => {
            let raw = required_field(&csv_record.amount, "amount", &op_type)?;
            let fee_bps = raw
                .parse::<u32>()
                .map_err(|_| format!("Invalid fee '{}': expected integer basis points", raw))?;
            Operation::SetFee { fee_bps }
        }
        "deposit" => Operation::Deposit {
            amount: parse_amount(&csv_record.amount, &op_type)?,
        },
        "withdraw" => Operation::Withdraw {
            shares: parse_amount(&csv_record.amount, &op_type)?,
        },
        "create" => Operation::CreateInvoice {
            buyer: required_address(&csv_record.target, "target", &op_type)?,
            amount: parse_amount(&csv_record.amount, &op_type)?,
            due_date: csv_record
                .due
                .ok_or_else(|| format!("{} operation requires a due date", op_type))?,
            metadata_hash: csv_record
                .meta
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        },
        "advance" => Operation::RequestAdvance {
            invoice_id: required_invoice(&csv_record, &op_type)?,
            amount: parse_amount(&csv_record.amount, &op_type)?,
        },
        "pay" => Operation::PayInvoice {
            invoice_id: required_invoice(&csv_record, &op_type)?,
            amount: parse_amount(&csv_record.amount, &op_type)?,
        },
        _ => {
            return Err(format!(
                "Invalid operation type: '{}' at time {}",
                csv_record.op_type, csv_record.time
            ))
        }
    };

    Ok(OperationRecord {
        at: csv_record.time,
        caller: Address::from(caller),
        operation,
    })
}

fn required_field<'a>(
    value: &'a Option<String>,
    column: &str,
    op_type: &str,
) -> Result<&'a str, String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("{} operation requires {}", op_type, column)),
    }
}

fn required_address(
    value: &Option<String>,
    column: &str,
    op_type: &str,
) -> Result<Address, String> {
    required_field(value, column, op_type).map(Address::from)
}

fn required_invoice(csv_record: &CsvRecord, op_type: &str) -> Result<InvoiceId, String> {
    csv_record
        .invoice
        .ok_or_else(|| format!("{} operation requires an invoice id", op_type))
}

fn parse_role(csv_record: &CsvRecord, op_type: &str) -> Result<Role, String> {
    let raw = required_field(&csv_record.role, "role", op_type)?;
    Role::from_str(raw)
}

fn parse_amount(value: &Option<String>, op_type: &str) -> Result<Decimal, String> {
    let raw = required_field(value, "amount", op_type)?;
    Decimal::from_str(raw).map_err(|_| format!("Invalid amount '{}' for {}", raw, op_type))
}

fn format_amount(amount: Decimal) -> String {
    format!("{:.6}", amount)
}

fn format_optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write the invoice book to CSV format
///
/// One row per invoice, sorted by id, with its advance terms when it has
/// been financed. Amounts are written with six decimal places; absent
/// timestamps and advance columns are left empty.
///
/// # Arguments
///
/// * `invoices` - Invoices to write
/// * `advances` - Advance book used to fill the advance columns
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_invoices_csv(
    invoices: &[&Invoice],
    advances: &AdvanceBook,
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(INVOICE_HEADER)
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_invoices = invoices.to_vec();
    sorted_invoices.sort_by_key(|invoice| invoice.id);

    for invoice in sorted_invoices {
        let advance = advances.get_advance(invoice.id).ok();
        writer
            .write_record(&[
                invoice.id.to_string(),
                invoice.seller.to_string(),
                invoice.buyer.to_string(),
                format_amount(invoice.amount),
                invoice.due_date.to_string(),
                invoice.status.to_string(),
                invoice.created_at.to_string(),
                format_optional(invoice.paid_at),
                format_optional(invoice.cleared_at),
                format_optional(advance.map(|a| format_amount(a.principal))),
                format_optional(advance.map(|a| format_amount(a.interest))),
                format_optional(advance.map(|a| format_amount(a.total_repayment))),
                format_optional(advance.map(|a| a.repaid)),
            ])
            .map_err(|e| format!("Failed to write invoice record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write the event log to CSV format
///
/// Columns: sequence, time, event, invoice, account, amount, details.
/// `details` carries the event's remaining fields as `key=value` pairs
/// separated by `;`.
pub fn write_events_csv(events: &[EventRecord], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(EVENT_HEADER)
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for record in events {
        let (invoice, account, amount, details) = event_columns(&record.event);
        writer
            .write_record(&[
                record.sequence.to_string(),
                record.at.to_string(),
                record.event.name().to_string(),
                format_optional(invoice),
                format_optional(account),
                format_optional(amount.map(format_amount)),
                details,
            ])
            .map_err(|e| format!("Failed to write event record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

fn event_columns(
    event: &ProtocolEvent,
) -> (Option<InvoiceId>, Option<&Address>, Option<Decimal>, String) {
    match event {
        ProtocolEvent::RoleGranted { role, account }
        | ProtocolEvent::RoleRevoked { role, account } => {
            (None, Some(account), None, format!("role={}", role))
        }
        ProtocolEvent::Funded { account, amount } => {
            (None, Some(account), Some(*amount), String::new())
        }
        ProtocolEvent::FeeUpdated { fee_bps } => (None, None, None, format!("fee_bps={}", fee_bps)),
        ProtocolEvent::VaultDeposited {
            depositor,
            amount,
            shares,
        }
        | ProtocolEvent::VaultWithdrawn {
            depositor,
            shares,
            amount,
        } => (
            None,
            Some(depositor),
            Some(*amount),
            format!("shares={}", format_amount(*shares)),
        ),
        ProtocolEvent::InvoiceCreated {
            invoice_id,
            seller,
            buyer,
            amount,
            due_date,
        } => (
            Some(*invoice_id),
            Some(seller),
            Some(*amount),
            format!("buyer={};due_date={}", buyer, due_date),
        ),
        ProtocolEvent::InvoiceFinanced {
            invoice_id,
            seller,
            principal,
            interest,
            total_repayment,
        } => (
            Some(*invoice_id),
            Some(seller),
            Some(*principal),
            format!(
                "interest={};total_repayment={}",
                format_amount(*interest),
                format_amount(*total_repayment)
            ),
        ),
        ProtocolEvent::InvoiceSettled {
            invoice_id,
            payer,
            amount,
            vault_repayment,
            protocol_fee,
            seller_proceeds,
        } => (
            Some(*invoice_id),
            Some(payer),
            Some(*amount),
            format!(
                "vault_repayment={};protocol_fee={};seller_proceeds={}",
                format_amount(*vault_repayment),
                format_amount(*protocol_fee),
                format_amount(*seller_proceeds)
            ),
        ),
        ProtocolEvent::ReputationUpdated {
            seller,
            score,
            tier,
            invoices_cleared,
            total_volume,
        } => (
            None,
            Some(seller),
            Some(*total_volume),
            format!(
                "score={};tier={};invoices_cleared={}",
                score, tier, invoices_cleared
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolConfig;
    use crate::core::SettlementEngine;
    use crate::types::Tier;
    use rstest::rstest;

    fn csv_record(
        op_type: &str,
        invoice: Option<u64>,
        target: Option<&str>,
        role: Option<&str>,
        amount: Option<&str>,
        due: Option<u64>,
    ) -> CsvRecord {
        CsvRecord {
            op_type: op_type.to_string(),
            time: 10,
            caller: "alice".to_string(),
            invoice,
            target: target.map(String::from),
            role: role.map(String::from),
            amount: amount.map(String::from),
            due,
            meta: Some("0xabc".to_string()),
        }
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[rstest]
    #[case::grant(
        csv_record("grant", None, Some("bob"), Some("issuer"), None, None),
        Operation::GrantRole { role: Role::Issuer, account: Address::from("bob") }
    )]
    #[case::revoke_uppercase(
        csv_record("REVOKE", None, Some("bob"), Some("borrower"), None, None),
        Operation::RevokeRole { role: Role::Borrower, account: Address::from("bob") }
    )]
    #[case::fund(
        csv_record("fund", None, Some("lp"), None, Some(" 100.5 "), None),
        Operation::Fund { account: Address::from("lp"), amount: d("100.5") }
    )]
    #[case::set_fee(
        csv_record("set_fee", None, None, None, Some("75"), None),
        Operation::SetFee { fee_bps: 75 }
    )]
    #[case::deposit(
        csv_record("deposit", None, None, None, Some("5000"), None),
        Operation::Deposit { amount: d("5000") }
    )]
    #[case::withdraw(
        csv_record("withdraw", None, None, None, Some("12.25"), None),
        Operation::Withdraw { shares: d("12.25") }
    )]
    #[case::create(
        csv_record("create", None, Some("buyer"), None, Some("1000"), Some(99)),
        Operation::CreateInvoice {
            buyer: Address::from("buyer"),
            amount: d("1000"),
            due_date: 99,
            metadata_hash: "0xabc".to_string(),
        }
    )]
    #[case::advance(
        csv_record("advance", Some(3), None, None, Some("800"), None),
        Operation::RequestAdvance { invoice_id: 3, amount: d("800") }
    )]
    #[case::pay(
        csv_record("Pay", Some(3), None, None, Some("1000"), None),
        Operation::PayInvoice { invoice_id: 3, amount: d("1000") }
    )]
    fn test_convert_csv_record_valid(#[case] record: CsvRecord, #[case] expected: Operation) {
        let converted = convert_csv_record(record).unwrap();

        assert_eq!(converted.at, 10);
        assert_eq!(converted.caller, Address::from("alice"));
        assert_eq!(converted.operation, expected);
    }

    #[rstest]
    #[case::invalid_type(
        csv_record("transfer", None, None, None, Some("1"), None),
        "Invalid operation type"
    )]
    #[case::grant_missing_role(
        csv_record("grant", None, Some("bob"), None, None, None),
        "requires role"
    )]
    #[case::unknown_role(
        csv_record("grant", None, Some("bob"), Some("root"), None, None),
        "Unknown role"
    )]
    #[case::fund_missing_target(
        csv_record("fund", None, None, None, Some("1"), None),
        "requires target"
    )]
    #[case::fractional_fee(
        csv_record("set_fee", None, None, None, Some("7.5"), None),
        "Invalid fee"
    )]
    #[case::deposit_blank_amount(
        csv_record("deposit", None, None, None, Some("  "), None),
        "requires amount"
    )]
    #[case::invalid_amount(
        csv_record("deposit", None, None, None, Some("lots"), None),
        "Invalid amount"
    )]
    #[case::create_missing_due(
        csv_record("create", None, Some("buyer"), None, Some("1"), None),
        "requires a due date"
    )]
    #[case::advance_missing_invoice(
        csv_record("advance", None, None, None, Some("1"), None),
        "requires an invoice id"
    )]
    fn test_convert_csv_record_errors(#[case] record: CsvRecord, #[case] expected_error: &str) {
        let error = convert_csv_record(record).unwrap_err();
        assert!(
            error.contains(expected_error),
            "'{}' does not contain '{}'",
            error,
            expected_error
        );
    }

    #[test]
    fn test_convert_csv_record_requires_caller() {
        let mut record = csv_record("deposit", None, None, None, Some("1"), None);
        record.caller = "  ".to_string();
        assert!(convert_csv_record(record).unwrap_err().contains("requires a caller"));
    }

    fn run(ops: Vec<CsvRecord>) -> SettlementEngine {
        let mut engine = SettlementEngine::new(ProtocolConfig::default()).unwrap();
        for record in ops {
            engine.process(convert_csv_record(record).unwrap()).unwrap();
        }
        engine
    }

    fn by(caller: &str, time: u64, mut record: CsvRecord) -> CsvRecord {
        record.caller = caller.to_string();
        record.time = time;
        record
    }

    #[rstest]
    #[case::empty(vec![], "id,seller,buyer,amount,due_date,status,created_at,paid_at,cleared_at,principal,interest,total_repayment,repaid\n")]
    #[case::issued_invoice_has_empty_advance_columns(
        vec![
            by("admin", 0, csv_record("grant", None, Some("alice"), Some("issuer"), None, None)),
            by("alice", 20, csv_record("create", None, Some("buyer"), None, Some("12.5"), Some(2_592_020))),
        ],
        "id,seller,buyer,amount,due_date,status,created_at,paid_at,cleared_at,principal,interest,total_repayment,repaid\n\
         1,alice,buyer,12.500000,2592020,issued,20,,,,,,\n"
    )]
    #[case::financed_invoice(
        vec![
            by("admin", 0, csv_record("grant", None, Some("alice"), Some("issuer"), None, None)),
            by("admin", 0, csv_record("fund", None, Some("lp"), None, Some("5000"), None)),
            by("lp", 0, csv_record("deposit", None, None, None, Some("5000"), None)),
            by("alice", 1000, csv_record("create", None, Some("buyer"), None, Some("1000"), Some(2_593_000))),
            by("alice", 1000, csv_record("advance", Some(1), None, None, Some("800"), None)),
        ],
        "id,seller,buyer,amount,due_date,status,created_at,paid_at,cleared_at,principal,interest,total_repayment,repaid\n\
         1,alice,buyer,1000.000000,2593000,financed,1000,,,800.000000,6.575342,806.575342,false\n"
    )]
    fn test_write_invoices_csv(#[case] ops: Vec<CsvRecord>, #[case] expected_output: &str) {
        let engine = run(ops);
        let mut output = Vec::new();

        write_invoices_csv(&engine.invoices(), engine.state().advances(), &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), expected_output);
    }

    #[rstest]
    #[case::role_granted(
        ProtocolEvent::RoleGranted { role: Role::Issuer, account: Address::from("alice") },
        "1,5,role_granted,,alice,,role=issuer"
    )]
    #[case::fee_updated(
        ProtocolEvent::FeeUpdated { fee_bps: 75 },
        "1,5,fee_updated,,,,fee_bps=75"
    )]
    #[case::vault_withdrawn(
        ProtocolEvent::VaultWithdrawn {
            depositor: Address::from("lp"),
            shares: d("1000"),
            amount: d("1001.315068"),
        },
        "1,5,vault_withdrawn,,lp,1001.315068,shares=1000.000000"
    )]
    #[case::invoice_settled(
        ProtocolEvent::InvoiceSettled {
            invoice_id: 1,
            payer: Address::from("buyer"),
            amount: d("1000"),
            vault_repayment: d("806.575342"),
            protocol_fee: d("5"),
            seller_proceeds: d("188.424658"),
        },
        "1,5,invoice_settled,1,buyer,1000.000000,vault_repayment=806.575342;protocol_fee=5.000000;seller_proceeds=188.424658"
    )]
    #[case::reputation_updated(
        ProtocolEvent::ReputationUpdated {
            seller: Address::from("alice"),
            score: 550,
            tier: Tier::C,
            invoices_cleared: 1,
            total_volume: d("1000"),
        },
        "1,5,reputation_updated,,alice,1000.000000,score=550;tier=C;invoices_cleared=1"
    )]
    fn test_write_events_csv(#[case] event: ProtocolEvent, #[case] expected_row: &str) {
        let records = vec![EventRecord {
            sequence: 1,
            at: 5,
            event,
        }];
        let mut output = Vec::new();

        write_events_csv(&records, &mut output).unwrap();

        let expected = format!(
            "sequence,time,event,invoice,account,amount,details\n{}\n",
            expected_row
        );
        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }
}
