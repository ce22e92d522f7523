//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::item::ItemService;
use crate::loan::LoanService;
use crate::notification::NotificationService;
use crate::payment::PaymentService;
use crate::request::LoanRequestService;
use crate::tasks::Housekeeper;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub item_service: Arc<ItemService>,
    pub request_service: Arc<LoanRequestService>,
    pub loan_service: Arc<LoanService>,
    pub payment_service: Arc<PaymentService>,
    pub notification_service: Arc<NotificationService>,
    pub auth_service: Arc<AuthService>,
    pub housekeeper: Housekeeper,
}

impl AppState {
    pub fn new(
        item_service: Arc<ItemService>,
        request_service: Arc<LoanRequestService>,
        loan_service: Arc<LoanService>,
        payment_service: Arc<PaymentService>,
        notification_service: Arc<NotificationService>,
        auth_service: Arc<AuthService>,
        housekeeper: Housekeeper,
    ) -> Self {
        Self {
            item_service,
            request_service,
            loan_service,
            payment_service,
            notification_service,
            auth_service,
            housekeeper,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<ItemService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.item_service.clone()
    }
}

impl FromRef<AppState> for Arc<LoanRequestService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.request_service.clone()
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<PaymentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.payment_service.clone()
    }
}

impl FromRef<AppState> for Arc<NotificationService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.notification_service.clone()
    }
}
