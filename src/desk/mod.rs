//! the bill desk: bill list, bill details and the bill form

pub(crate) mod editor;
pub(crate) mod form;
pub(crate) mod model;
mod scheduler;
pub(crate) mod service;
mod util;
pub(crate) mod view;
pub(crate) mod workflow;

use std::io::{self, Write};
use anyhow::{anyhow, Context, Error};
use log::info;
use tokio::io::{stdin, BufReader};
use crate::desk::editor::DraftItemList;
use crate::desk::form::{Form, FormExit};
use crate::desk::model::config::ClientConfig;
use crate::desk::model::draft::DraftLineItem;
use crate::desk::model::bill::BillRecord;
use crate::desk::model::UserId;
use crate::desk::service::error::ServiceError;
use crate::desk::service::http::HttpBillService;
use crate::desk::service::BillService;
use crate::desk::view::{render_bill_details, render_bill_list};
use crate::desk::workflow::WorkflowSettings;

fn connect(config: &ClientConfig) -> Result<HttpBillService, Error> {
    HttpBillService::new(&config.base_url, config.request_timeout).context("failed to build http client")
}

async fn fetch_bills<S: BillService>(service: &S, user_id: UserId) -> Result<Vec<BillRecord>, Error> {
    match service.fetch_bills_by_user(user_id).await {
        Ok(bills) => Ok(bills),
        Err(ServiceError::Status { code, message }) => Err(anyhow!("failed to fetch bills, status {}: {}", code, message)),
        Err(e) => Err(Error::new(e).context("failed to fetch bills")),
    }
}

async fn write_bill_list<S: BillService, W: Write>(service: &S, user_id: UserId, out: &mut W) -> Result<(), Error> {
    let bills = fetch_bills(service, user_id).await?;
    write!(out, "{}", render_bill_list(user_id, &bills))?;
    Ok(())
}

async fn write_bill_details<S: BillService, W: Write>(
    service: &S,
    user_id: UserId,
    bill_id: i64,
    out: &mut W,
) -> Result<(), Error> {
    let bills = fetch_bills(service, user_id).await?;
    let bill = bills
        .iter()
        .find(|bill| bill.id == bill_id)
        .ok_or_else(|| anyhow!("bill {} not found for user {}", bill_id, user_id))?;
    write!(out, "{}", render_bill_details(bill))?;
    Ok(())
}

/// Print the bills of the configured user
pub(crate) async fn list(config: &ClientConfig) -> Result<(), Error> {
    let service = connect(config)?;
    write_bill_list(&service, config.user_id, &mut io::stdout()).await
}

/// Print one bill of the configured user
pub(crate) async fn show(config: &ClientConfig, bill_id: i64) -> Result<(), Error> {
    let service = connect(config)?;
    write_bill_details(&service, config.user_id, bill_id, &mut io::stdout()).await
}

/// Open the bill form with the given rows. Returns to the bill list once an
/// approved bill signals completion.
pub(crate) async fn create(config: &ClientConfig, rows: Vec<DraftLineItem>, submit_now: bool) -> Result<(), Error> {
    let service = connect(config)?;
    let form = Form::open(&service, WorkflowSettings::from(config), DraftItemList::from_rows(rows));
    let mut out = io::stdout();
    let exit = match submit_now {
        true => form.submit_once(&mut out).await?,
        false => form.run(BufReader::new(stdin()), &mut out).await?,
    };
    match exit {
        FormExit::Completed => {
            info!("bill created, returning to bill list");
            writeln!(out)?;
            write_bill_list(&service, config.user_id, &mut out).await
        }
        FormExit::Abandoned => Ok(()),
    }
}
