//! access to the remote bill service

pub(crate) mod error;
pub(crate) mod http;

use crate::desk::model::bill::{BillRecord, BillResponse, BillSubmissionRequest};
use crate::desk::model::UserId;
use crate::desk::service::error::ServiceError;

/// What the service said about a submitted bill, when it said anything.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CreateBillReply {
    /// a body with a `status`, whatever the HTTP status was
    Decided(BillResponse),
    /// an error payload without a decision
    Rejected { code: u16, message: Option<String> },
}

pub(crate) trait BillService {
    async fn fetch_bills_by_user(&self, user_id: UserId) -> Result<Vec<BillRecord>, ServiceError>;

    /// `Err` only when no response was obtained.
    async fn create_bill(&self, request: &BillSubmissionRequest) -> Result<CreateBillReply, ServiceError>;
}

impl<S: BillService> BillService for &S {
    async fn fetch_bills_by_user(&self, user_id: UserId) -> Result<Vec<BillRecord>, ServiceError> {
        (**self).fetch_bills_by_user(user_id).await
    }

    async fn create_bill(&self, request: &BillSubmissionRequest) -> Result<CreateBillReply, ServiceError> {
        (**self).create_bill(request).await
    }
}
