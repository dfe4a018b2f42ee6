//! Filter vocabulary of the list endpoints.
//!
//! Every status enum renders to the exact upper-case (or, for production
//! orders, camel-case) token the API expects in its query string.

use chrono::{Local, NaiveDate};
use std::fmt;

use crate::http::transport::QueryParams;

pub const STATUS: &str = "Status";
pub const QUOTE_STATUS: &str = "QuoteStatus";
pub const ORDER_STATUS: &str = "OrderStatus";
pub const COMBINED_INVOICE_STATUS: &str = "CombinedInvoiceStatus";
pub const COMBINED_RECEIVING_STATUS: &str = "CombinedReceivingStatus";
pub const FULFILMENT_STATUS: &str = "FulFilmentStatus";
pub const MODIFIED_SINCE: &str = "ModifiedSince";

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Overall sale status (`Status`).
    SaleStatus {
        Draft => "DRAFT",
        Estimating => "ESTIMATING",
        Estimated => "ESTIMATED",
        Ordering => "ORDERING",
        Ordered => "ORDERED",
        Backordered => "BACKORDERED",
    }
}

wire_enum! {
    /// Stage status of a sale quote or order, or of a purchase order.
    StageStatus {
        Draft => "DRAFT",
        Authorised => "AUTHORISED",
        NotAvailable => "NOT AVAILABLE",
    }
}

wire_enum! {
    /// `CombinedInvoiceStatus` of sales and purchases.
    InvoiceStatus {
        NotAvailable => "NOT AVAILABLE",
        NotInvoiced => "NOT INVOICED",
        Invoiced => "INVOICED",
        Authorised => "AUTHORISED",
    }
}

wire_enum! {
    FulfilmentStatus {
        NotFulfilled => "NOT FULFILLED",
        Fulfilled => "FULFILLED",
        Partial => "PARTIAL",
    }
}

wire_enum! {
    /// `CombinedReceivingStatus` of purchases.
    ReceivingStatus {
        NotReceived => "NOT RECEIVED",
        Received => "RECEIVED",
        Partial => "PARTIAL",
    }
}

wire_enum! {
    /// Stock adjustments and stock takes.
    TaskStatus {
        Draft => "DRAFT",
        Completed => "COMPLETED",
    }
}

wire_enum! {
    TransferStatus {
        Draft => "DRAFT",
        InTransit => "IN TRANSIT",
        Ordered => "ORDERED",
        Picking => "PICKING",
    }
}

wire_enum! {
    /// Finished goods (assembly) status.
    AssemblyStatus {
        Draft => "DRAFT",
        Authorised => "AUTHORISED",
        InProgress => "IN PROGRESS",
    }
}

wire_enum! {
    ProductionStatus {
        Draft => "Draft",
        Planned => "Planned",
        Released => "Released",
        InProgress => "InProgress",
    }
}

/// Renders a `ModifiedSince` lower bound.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Local date `days` days before today.
pub fn since_days_ago(days: u32) -> NaiveDate {
    let today = Local::now().date_naive();
    today
        .checked_sub_days(chrono::Days::new(days.into()))
        .unwrap_or(NaiveDate::MIN)
}

/// Ordered query-parameter builder that skips unset filters.
#[derive(Debug, Default, Clone)]
pub struct Params(QueryParams);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    pub fn opt(self, key: &str, value: Option<impl fmt::Display>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    /// Adds a text filter unless it is blank.
    pub fn text(self, key: &str, value: Option<&str>) -> Self {
        self.opt(key, value.map(str::trim).filter(|v| !v.is_empty()))
    }

    pub fn since(self, date: Option<NaiveDate>) -> Self {
        self.opt(MODIFIED_SINCE, date.map(format_date))
    }

    pub fn build(self) -> QueryParams {
        self.0
    }
}

/// Filters accepted by the sale list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SaleFilter {
    pub status: Option<SaleStatus>,
    pub quote_status: Option<StageStatus>,
    pub order_status: Option<StageStatus>,
    pub combined_invoice_status: Option<InvoiceStatus>,
    pub fulfilment_status: Option<FulfilmentStatus>,
    pub modified_since: Option<NaiveDate>,
}

impl SaleFilter {
    pub fn to_params(&self) -> QueryParams {
        Params::new()
            .opt(STATUS, self.status)
            .opt(QUOTE_STATUS, self.quote_status)
            .opt(ORDER_STATUS, self.order_status)
            .opt(COMBINED_INVOICE_STATUS, self.combined_invoice_status)
            .opt(FULFILMENT_STATUS, self.fulfilment_status)
            .since(self.modified_since)
            .build()
    }
}

/// Filters accepted by the purchase list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurchaseFilter {
    pub order_status: Option<StageStatus>,
    pub combined_invoice_status: Option<InvoiceStatus>,
    pub combined_receiving_status: Option<ReceivingStatus>,
    pub modified_since: Option<NaiveDate>,
}

impl PurchaseFilter {
    pub fn to_params(&self) -> QueryParams {
        Params::new()
            .opt(ORDER_STATUS, self.order_status)
            .opt(COMBINED_INVOICE_STATUS, self.combined_invoice_status)
            .opt(COMBINED_RECEIVING_STATUS, self.combined_receiving_status)
            .since(self.modified_since)
            .build()
    }
}

/// Single `Status` filter plus the modification lower bound, shared by the
/// inventory task lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter<S> {
    pub status: Option<S>,
    pub modified_since: Option<NaiveDate>,
}

impl<S> Default for StatusFilter<S> {
    fn default() -> Self {
        Self {
            status: None,
            modified_since: None,
        }
    }
}

impl<S: fmt::Display + Copy> StatusFilter<S> {
    pub fn status(status: S) -> Self {
        Self {
            status: Some(status),
            modified_since: None,
        }
    }

    pub fn since(mut self, date: NaiveDate) -> Self {
        self.modified_since = Some(date);
        self
    }

    pub fn to_params(&self) -> QueryParams {
        Params::new()
            .opt(STATUS, self.status)
            .since(self.modified_since)
            .build()
    }
}
