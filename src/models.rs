use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Car {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_per_day: f64,
    pub available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCar {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_per_day: f64,
    pub available: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub id_card_url: Option<String>,
    pub driving_license_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub name: String,
    pub email: String,
    // Upload handling lives outside this crate; these are already-stored URLs
    pub id_card_url: Option<String>,
    pub driving_license_url: Option<String>,
}

/// Lifecycle of a rental. A rental is created open and closes exactly once,
/// when the car comes back.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Open,
    Closed,
}

impl RentalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Open => "open",
            RentalStatus::Closed => "closed",
        }
    }
}

impl ToSql for RentalStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for RentalStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "open" => Ok(RentalStatus::Open),
            "closed" => Ok(RentalStatus::Closed),
            other => Err(FromSqlError::Other(
                format!("unknown rental status '{other}'").into(),
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Rental {
    pub id: i64,
    pub car_id: i64,
    pub customer_id: i64,
    pub start_date: String,
    /// Scheduled end while open (None for an open-ended rental), actual end
    /// once closed.
    pub end_date: Option<String>,
    /// Quoted cost while open (0.0 when open-ended), settled cost once closed.
    pub total_cost: f64,
    pub deposit_amount: f64,
    pub is_paid: bool,
    pub payment_method: Option<String>,
    pub status: RentalStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRental {
    pub car_id: i64,
    pub customer_id: i64,
    pub start_date: String,
    /// Expected rental length; omitted means open-ended.
    pub days: Option<i64>,
    pub deposit_amount: Option<f64>,
    pub is_paid: Option<bool>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RentalWithDetails {
    pub rental: Rental,
    pub car: Car,
    pub customer: CustomerSummary,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Sale {
    pub id: i64,
    pub rental_id: i64,
    pub customer_id: i64,
    pub car_id: i64,
    pub total_cost: f64,
    pub sale_date: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Insurance {
    pub id: i64,
    pub car_id: i64,
    pub provider: String,
    pub policy_number: String,
    pub start_date: String,
    pub end_date: String,
    pub coverage: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInsurance {
    pub provider: String,
    pub policy_number: String,
    pub start_date: String,
    pub end_date: String,
    pub coverage: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LegalDocument {
    pub id: i64,
    pub car_id: i64,
    pub doc_type: String,
    pub number: Option<String>,
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLegalDocument {
    pub doc_type: String,
    pub number: Option<String>,
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceStatus {
    Pending,
    Completed,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::Pending => "pending",
            MaintenanceStatus::Completed => "completed",
        }
    }
}

impl ToSql for MaintenanceStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for MaintenanceStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "pending" => Ok(MaintenanceStatus::Pending),
            "completed" => Ok(MaintenanceStatus::Completed),
            other => Err(FromSqlError::Other(
                format!("unknown maintenance status '{other}'").into(),
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Maintenance {
    pub id: i64,
    pub car_id: i64,
    pub maint_type: String,
    pub due_date: String,
    pub status: MaintenanceStatus,
    pub cost: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMaintenance {
    pub car_id: i64,
    pub maint_type: String,
    pub due_date: String,
    pub status: Option<MaintenanceStatus>,
    pub cost: Option<f64>,
    pub notes: Option<String>,
}

/// Upcoming-maintenance row with the car it belongs to.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MaintenanceWithCar {
    pub maintenance: Maintenance,
    pub car_make: String,
    pub car_model: String,
    pub car_year: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Staff => "staff",
        }
    }
}

impl ToSql for UserRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for UserRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "admin" => Ok(UserRole::Admin),
            "manager" => Ok(UserRole::Manager),
            "staff" => Ok(UserRole::Staff),
            other => Err(FromSqlError::Other(
                format!("unknown user role '{other}'").into(),
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
}

/// Flat projection handed to the request layer for rendering an invoice.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Invoice {
    pub rental_id: i64,
    pub sale_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub car_make: String,
    pub car_model: String,
    pub car_year: i32,
    pub start_date: String,
    pub end_date: String,
    pub total_cost: f64,
    pub deposit_amount: f64,
    pub is_paid: bool,
    pub payment_method: String,
    pub sale_date: String,
}

/// Dashboard counters. Point-in-time snapshots, not one consistent read.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Stats {
    pub vehicles: i64,
    pub customers: i64,
    pub rentals_active: i64,
    pub invoices: i64,
    pub revenue: f64,
    pub insurance_expiring: i64,
    pub docs_expiring: i64,
    pub maintenance_due: i64,
    pub users_active: i64,
}
