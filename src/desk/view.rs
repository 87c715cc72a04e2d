//! plain-text rendering of bills and of the bill form

use std::fmt::{self, Display, Formatter};
use crate::desk::editor::ItemEditor;
use crate::desk::model::bill::{BillRecord, BillResponse};
use crate::desk::model::UserId;
use crate::desk::util::time::format_date;
use crate::desk::workflow::{Outcome, WorkflowState};

pub(crate) fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub(crate) struct BillListView<'a> {
    user_id: UserId,
    bills: &'a [BillRecord],
}

pub(crate) fn render_bill_list(user_id: UserId, bills: &[BillRecord]) -> BillListView<'_> {
    BillListView { user_id, bills }
}

impl Display for BillListView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.bills.is_empty() {
            return writeln!(f, "No bills found for this user.");
        }
        writeln!(f, "Bills for User {}", self.user_id)?;
        writeln!(f, "{:<8} {:<12} {:>14}  {}", "ID", "Date", "Total Amount", "Status")?;
        for bill in self.bills {
            writeln!(
                f,
                "{:<8} {:<12} {:>14}  {}",
                bill.id,
                format_date(&bill.purchase_date),
                money(bill.total_amount),
                bill.status
            )?;
        }
        Ok(())
    }
}

pub(crate) struct BillDetailsView<'a>(&'a BillRecord);

pub(crate) fn render_bill_details(bill: &BillRecord) -> BillDetailsView<'_> {
    BillDetailsView(bill)
}

impl Display for BillDetailsView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let bill = self.0;
        writeln!(f, "Bill Details")?;
        writeln!(f, "[{}]", bill.status)?;
        if let Some(message) = bill.response_message.as_deref().filter(|m| !m.is_empty()) {
            writeln!(f, "{}", message)?;
        }
        writeln!(f, "Transaction ID: {}", bill.id)?;
        writeln!(f, "Date: {}", format_date(&bill.purchase_date))?;
        writeln!(f, "User ID: {}", bill.user_id)?;
        writeln!(f, "Total Amount: {}", money(bill.total_amount))?;
        writeln!(f, "\nItems")?;
        writeln!(f, "{:<24} {:>12} {:>8} {:>12}", "Product", "Unit Price", "Quantity", "Subtotal")?;
        for item in &bill.items {
            writeln!(
                f,
                "{:<24} {:>12} {:>8} {:>12}",
                item.product_name,
                money(item.unit_price),
                item.quantity,
                money(item.subtotal())
            )?;
        }
        writeln!(f, "{:>46} {:>12}", "Total:", money(bill.total_amount))
    }
}

/// The form rows with their running total, under the banner of the last
/// submission.
pub(crate) struct FormView<'a> {
    editor: &'a ItemEditor,
    state: &'a WorkflowState,
}

pub(crate) fn render_form<'a>(editor: &'a ItemEditor, state: &'a WorkflowState) -> FormView<'a> {
    FormView { editor, state }
}

impl Display for FormView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.state {
            WorkflowState::Settled(outcome) => write!(f, "{}", render_outcome(outcome))?,
            WorkflowState::Submitting => writeln!(f, "Processing...")?,
            WorkflowState::Idle => {}
        }
        writeln!(f, "Items")?;
        writeln!(f, "{:>3}  {:<24} {:>12} {:>8}", "#", "Product Name", "Unit Price", "Quantity")?;
        for (i, row) in self.editor.items().rows().iter().enumerate() {
            writeln!(
                f,
                "{:>3}  {:<24} {:>12} {:>8}",
                i + 1,
                row.product_name,
                row.unit_price,
                row.quantity
            )?;
        }
        writeln!(f, "Total Amount: {}", money(self.editor.compute_total()))
    }
}

pub(crate) struct OutcomeView<'a>(&'a Outcome);

pub(crate) fn render_outcome(outcome: &Outcome) -> OutcomeView<'_> {
    OutcomeView(outcome)
}

impl Display for OutcomeView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Outcome::Approved(response) | Outcome::Declined(response) => write_response(f, response),
            Outcome::Failed { message } => writeln!(f, "Error: {}", message),
        }
    }
}

fn write_response(f: &mut Formatter<'_>, response: &BillResponse) -> fmt::Result {
    writeln!(f, "Status: {}\n{}", response.status, response.message())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crate::desk::model::bill::{BillItem, BillStatus};
    use crate::desk::editor::DraftItemList;
    use crate::desk::model::draft::DraftLineItem;
    use super::*;

    fn record() -> BillRecord {
        BillRecord {
            id: 42,
            user_id: 12345,
            purchase_date: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            total_amount: 35.0,
            status: BillStatus::Approved,
            response_message: Some("Transaction approved".to_string()),
            items: vec![
                BillItem {
                    product_name: "A".to_string(),
                    unit_price: 10.0,
                    quantity: 2,
                },
                BillItem {
                    product_name: "B".to_string(),
                    unit_price: 5.0,
                    quantity: 3,
                },
            ],
        }
    }

    #[test]
    fn money_rounds_to_cents() {
        assert_eq!(money(35.0), "$35.00");
        assert_eq!(money(2.0 / 3.0), "$0.67");
        assert_eq!(money(12.345678), "$12.35");
    }

    #[test]
    fn empty_list() {
        assert_eq!(render_bill_list(1, &[]).to_string(), "No bills found for this user.\n");
    }

    #[test]
    fn list_rows() {
        let out = render_bill_list(12345, &[record()]).to_string();
        assert!(out.starts_with("Bills for User 12345\n"));
        let row = out.lines().nth(2).unwrap();
        assert!(row.starts_with("42"));
        assert!(row.contains("2024-05-01"));
        assert!(row.contains("$35.00"));
        assert!(row.ends_with("APPROVED"));
    }

    #[test]
    fn details_show_subtotals() {
        let out = render_bill_details(&record()).to_string();
        assert!(out.contains("Transaction approved"));
        assert!(out.contains("Transaction ID: 42"));
        assert!(out.contains("$20.00"));
        assert!(out.contains("$15.00"));
        assert!(out.lines().last().unwrap().ends_with("$35.00"));
    }

    #[test]
    fn form_shows_running_total_and_outcome() {
        let editor = ItemEditor::new(DraftItemList::from_rows(vec![
            DraftLineItem::new("A", "10.00", "2"),
            DraftLineItem::new("B", "", "3"),
        ]));
        let out = render_form(&editor, &WorkflowState::Idle).to_string();
        assert!(out.ends_with("Total Amount: $20.00\n"));

        let failed = WorkflowState::Settled(Outcome::Failed {
            message: "Network Error".to_string(),
        });
        assert!(render_form(&editor, &failed).to_string().starts_with("Error: Network Error\n"));
        assert!(render_form(&editor, &WorkflowState::Submitting)
            .to_string()
            .starts_with("Processing..."));
    }

    #[test]
    fn outcome_banner() {
        let response = serde_json::from_value::<BillResponse>(serde_json::json!({
            "status": "DECLINED",
            "responseMessage": "insufficient limit",
        }))
        .unwrap();
        assert_eq!(
            render_outcome(&Outcome::Declined(response)).to_string(),
            "Status: DECLINED\ninsufficient limit\n"
        );
    }
}
