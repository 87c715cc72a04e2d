use std::time::Duration;
use log::{error, info, warn};
use reqwest::{Client, StatusCode};
use crate::desk::model::bill::{BillDecision, BillRecord, BillResponse, BillSubmissionRequest};
use crate::desk::model::{ErrorBody, UserId};
use crate::desk::service::error::ServiceError;
use crate::desk::service::{BillService, CreateBillReply};

const FETCH_FAILED_MSG: &str = "Failed to fetch bills";

/// Bill service reached over HTTP(S)
pub(crate) struct HttpBillService {
    client: Client,
    base_url: String,
}

impl HttpBillService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ServiceError::transport)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl BillService for HttpBillService {
    async fn fetch_bills_by_user(&self, user_id: UserId) -> Result<Vec<BillRecord>, ServiceError> {
        let res = self
            .client
            .get(format!("{}/user/{}", self.base_url, user_id))
            .send()
            .await
            .map_err(|e| {
                error!("fetch_bills_by_user failed, {}", e);
                ServiceError::transport(e)
            })?;
        match res.status() {
            status if status.is_success() => {
                let bills = res
                    .json::<Vec<BillRecord>>()
                    .await
                    .map_err(|e| ServiceError::Decode { message: e.to_string() })?;
                info!("fetched {} bills for user={}", bills.len(), user_id);
                Ok(bills)
            }
            status => {
                let body = res.json::<ErrorBody>().await.unwrap_or_default();
                warn!("fetch_bills_by_user got status {}", status);
                Err(ServiceError::Status {
                    code: status.as_u16(),
                    message: body.message.unwrap_or_else(|| FETCH_FAILED_MSG.to_string()),
                })
            }
        }
    }

    async fn create_bill(&self, request: &BillSubmissionRequest) -> Result<CreateBillReply, ServiceError> {
        let res = self
            .client
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("create_bill failed, {}", e);
                ServiceError::transport(e)
            })?;
        let status = res.status();
        let body = res.bytes().await.map_err(ServiceError::transport)?;
        Ok(classify_create_reply(status, &body))
    }
}

/// A body carrying a `status` is a decision even on a non-2xx response,
/// anything else is an error payload.
fn classify_create_reply(status: StatusCode, body: &[u8]) -> CreateBillReply {
    if let Ok(decision) = serde_json::from_slice::<BillDecision>(body) {
        let response = serde_json::from_slice::<BillResponse>(body).unwrap_or_else(|e| {
            warn!("create_bill decision with unreadable bill fields, {}", e);
            BillResponse::from(decision)
        });
        return CreateBillReply::Decided(response);
    }
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message);
    warn!("create_bill got status {} without a decision", status);
    CreateBillReply::Rejected {
        code: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use actix_web::dev::ServerHandle;
    use actix_web::{web, App, HttpResponse, HttpServer};
    use serde_json::json;
    use crate::desk::model::bill::{BillItem, BillStatus};
    use super::*;

    /// spin up a throwaway bill service, returns its base url
    fn serve(routes: fn(&mut web::ServiceConfig)) -> (String, ServerHandle) {
        let server = HttpServer::new(move || App::new().configure(routes))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .expect("failed to bind test server");
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (format!("http://{}/api/bills", addr), handle)
    }

    fn service(url: &str) -> HttpBillService {
        HttpBillService::new(url, Duration::from_secs(5)).unwrap()
    }

    fn request() -> BillSubmissionRequest {
        BillSubmissionRequest {
            user_id: 12345,
            items: vec![BillItem {
                product_name: "A".to_string(),
                unit_price: 10.0,
                quantity: 2,
            }],
            total_amount: 20.0,
        }
    }

    async fn echo_approval(body: web::Json<serde_json::Value>) -> HttpResponse {
        HttpResponse::Created().json(json!({
            "id": 9,
            "userId": body["userId"],
            "purchaseDate": "2024-05-01T10:00:00",
            "totalAmount": body["totalAmount"],
            "status": "APPROVED",
            "responseMessage": "Transaction approved",
            "items": body["items"],
        }))
    }

    async fn decline() -> HttpResponse {
        HttpResponse::UnprocessableEntity().json(json!({
            "status": "DECLINED",
            "responseMessage": "insufficient limit",
        }))
    }

    async fn broken() -> HttpResponse {
        HttpResponse::BadRequest().json(json!({"message": "totalAmount mismatch"}))
    }

    async fn bills() -> HttpResponse {
        HttpResponse::Ok().json(json!([{
            "id": 1,
            "userId": 12345,
            "purchaseDate": "2024-05-01T10:00:00",
            "totalAmount": 35.0,
            "status": "APPROVED",
            "responseMessage": "ok",
            "items": [
                {"productName": "A", "unitPrice": 10.0, "quantity": 2},
                {"productName": "B", "unitPrice": 5.0, "quantity": 3},
            ],
        }]))
    }

    async fn missing_user() -> HttpResponse {
        HttpResponse::NotFound().json(json!({"message": "user not found"}))
    }

    async fn crash() -> HttpResponse {
        HttpResponse::InternalServerError().body("boom")
    }

    #[actix_web::test]
    async fn approved_bill_is_decided() {
        let (url, handle) = serve(|cfg| {
            cfg.route("/api/bills", web::post().to(echo_approval));
        });
        let reply = service(&url).create_bill(&request()).await.unwrap();
        match reply {
            CreateBillReply::Decided(response) => {
                assert_eq!(response.status, BillStatus::Approved);
                assert_eq!(response.user_id, Some(12345));
                assert_eq!(response.total_amount, Some(20.0));
                assert_eq!(response.items, Some(request().items));
            }
            other => panic!("expected a decision, got {:?}", other),
        }
        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn decline_on_error_status_is_still_decided() {
        let (url, handle) = serve(|cfg| {
            cfg.route("/api/bills", web::post().to(decline));
        });
        let reply = service(&url).create_bill(&request()).await.unwrap();
        match reply {
            CreateBillReply::Decided(response) => {
                assert_eq!(response.status, BillStatus::Declined);
                assert_eq!(response.message(), "insufficient limit");
            }
            other => panic!("expected a decision, got {:?}", other),
        }
        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn error_payload_is_rejected_with_message() {
        let (url, handle) = serve(|cfg| {
            cfg.route("/api/bills", web::post().to(broken));
        });
        let reply = service(&url).create_bill(&request()).await.unwrap();
        assert_eq!(
            reply,
            CreateBillReply::Rejected {
                code: 400,
                message: Some("totalAmount mismatch".to_string()),
            }
        );
        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn unreadable_error_body_is_rejected_without_message() {
        let (url, handle) = serve(|cfg| {
            cfg.route("/api/bills", web::post().to(crash));
        });
        let reply = service(&url).create_bill(&request()).await.unwrap();
        assert_eq!(reply, CreateBillReply::Rejected { code: 500, message: None });
        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn refused_connection_is_transport_error() {
        // nothing listens on the discard port
        let err = service("http://127.0.0.1:9/api/bills")
            .create_bill(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Transport { .. }));
        assert!(!err.to_string().is_empty());
    }

    #[actix_web::test]
    async fn fetch_bills_and_errors() {
        let (url, handle) = serve(|cfg| {
            cfg.route("/api/bills/user/12345", web::get().to(bills))
                .route("/api/bills/user/1", web::get().to(missing_user))
                .route("/api/bills/user/2", web::get().to(crash));
        });
        let service = service(&url);

        let bills = service.fetch_bills_by_user(12345).await.unwrap();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].items.iter().map(BillItem::subtotal).sum::<f64>(), 35.0);

        let err = service.fetch_bills_by_user(1).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::Status {
                code: 404,
                message: "user not found".to_string()
            }
        );

        let err = service.fetch_bills_by_user(2).await.unwrap_err();
        assert_eq!(err.to_string(), FETCH_FAILED_MSG);
        handle.stop(true).await;
    }

    #[test]
    fn classify_without_network() {
        assert_eq!(
            classify_create_reply(StatusCode::OK, b"{}"),
            CreateBillReply::Rejected { code: 200, message: None }
        );
        assert!(matches!(
            classify_create_reply(StatusCode::OK, br#"{"status":"APPROVED"}"#),
            CreateBillReply::Decided(_)
        ));
    }

    #[test]
    fn status_alone_decides() {
        let body = br#"{"id":9,"status":"APPROVED","responseMessage":"Transaction approved","purchaseDate":"2024-05-01"}"#;
        match classify_create_reply(StatusCode::CREATED, body) {
            CreateBillReply::Decided(response) => {
                assert_eq!(response.status, BillStatus::Approved);
                assert_eq!(response.id, Some(9));
                assert_eq!(response.message(), "Transaction approved");
                assert!(response.purchase_date.is_none());
            }
            other => panic!("expected a decision, got {:?}", other),
        }

        let body = br#"{"id":"nine","status":"DECLINED","responseMessage":"no","items":{}}"#;
        match classify_create_reply(StatusCode::UNPROCESSABLE_ENTITY, body) {
            CreateBillReply::Decided(response) => {
                assert_eq!(response.status, BillStatus::Declined);
                assert_eq!(response.message(), "no");
                assert!(response.id.is_none());
            }
            other => panic!("expected a decision, got {:?}", other),
        }
    }
}
