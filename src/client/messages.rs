//! Wire types of the exchange web app

use serde::{Deserialize, Serialize};

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub err: String,
}

/// Response of POST /orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: i64,
}

/// Form of POST /signup
#[derive(Debug, Clone, Serialize)]
pub struct SignupForm<'a> {
    pub name: &'a str,
    pub bank_id: &'a str,
    pub password: &'a str,
}

/// Form of POST /signin
#[derive(Debug, Clone, Serialize)]
pub struct SigninForm<'a> {
    pub bank_id: &'a str,
    pub password: &'a str,
}

/// Form of POST /orders
#[derive(Debug, Clone, Serialize)]
pub struct OrderForm {
    #[serde(rename = "type")]
    pub side: &'static str,
    pub amount: i64,
    pub price: i64,
}
