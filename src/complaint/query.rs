//! List query parameters for complaints.

use crate::orm::complaints::{self, Category, Priority, Status};
use sea_orm::sea_query::{CaseStatement, Expr, SimpleExpr};
use sea_orm::{ColumnTrait, Iterable, Order, Value};
use serde::Deserialize;

/// Columns a listing may be ordered by. Anything else is rejected at
/// deserialization, so no caller-supplied name reaches the query builder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Priority,
    Status,
    Category,
    Title,
}

impl SortField {
    /// Expression to order by. Enum columns rank by declaration order
    /// (LOW before URGENT, PENDING before CLOSED) rather than by their
    /// stored names.
    pub fn order_expr(&self) -> SimpleExpr {
        match self {
            SortField::CreatedAt => Expr::col(complaints::Column::CreatedAt).into(),
            SortField::UpdatedAt => Expr::col(complaints::Column::UpdatedAt).into(),
            SortField::Title => Expr::col(complaints::Column::Title).into(),
            SortField::Priority => declaration_rank::<Priority>(complaints::Column::Priority),
            SortField::Status => declaration_rank::<Status>(complaints::Column::Status),
            SortField::Category => declaration_rank::<Category>(complaints::Column::Category),
        }
    }
}

/// `CASE column WHEN <first variant> THEN 0 WHEN <second> THEN 1 ... END`
fn declaration_rank<T>(column: complaints::Column) -> SimpleExpr
where
    T: Iterable + Into<Value>,
{
    let mut rank: i32 = 0;
    let mut case = CaseStatement::new();
    for variant in T::iter() {
        case = case.case(column.eq(variant), rank);
        rank += 1;
    }
    case.finally(rank).into()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// `GET /complaints` query string.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<Status>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<i32>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}
