//! Search, ordering, and pagination for the list views.
//!
//! Every list is a case-insensitive substring filter on one column, sorted by
//! the entity's default ordering and cut into pages of [`PAGINATE_BY`].

use crate::entities::{car, driver, manufacturer};
use common::{PAGINATE_BY, PageInfo, PageRequest, Paginator};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Select, SelectTwo, SelectorTrait,
};
use tracing::{debug, instrument};

/// One page of a list together with the paginator state.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            info: self.info,
        }
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `LOWER(table.column) LIKE LOWER('%needle%')`, with LIKE wildcards in the
/// needle matched literally. Column and needle are folded by the same function.
pub fn icontains<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(needle));
    Expr::cust_with_exprs(
        "LOWER($1) LIKE LOWER($2) ESCAPE '\\'",
        [Expr::col((column.entity_name(), column)).into(), Expr::val(pattern).into()],
    )
}

fn filter_if<S: QueryFilter>(select: S, needle: &str, condition: impl FnOnce(&str) -> SimpleExpr) -> S {
    if needle.is_empty() {
        select
    } else {
        select.filter(condition(needle))
    }
}

/// Manufacturers whose name contains `name`, ordered by name.
pub fn manufacturers(name: &str) -> Select<manufacturer::Entity> {
    let select = manufacturer::Entity::find().order_by_asc(manufacturer::Column::Name);
    filter_if(select, name, |needle| icontains(manufacturer::Column::Name, needle))
}

/// Cars whose model contains `model`, each with its manufacturer.
pub fn cars(model: &str) -> SelectTwo<car::Entity, manufacturer::Entity> {
    let select = car::Entity::find()
        .find_also_related(manufacturer::Entity)
        .order_by_asc(car::Column::Id);
    filter_if(select, model, |needle| icontains(car::Column::Model, needle))
}

/// Drivers whose username contains `username`, ordered by id.
pub fn drivers(username: &str) -> Select<driver::Entity> {
    let select = driver::Entity::find().order_by_asc(driver::Column::Id);
    filter_if(select, username, |needle| icontains(driver::Column::Username, needle))
}

/// Counts the rows matched by `select`, clamps `request` into range, and
/// fetches that page.
#[instrument(skip(db, select))]
pub async fn fetch_page<'db, C, S>(
    db: &'db C,
    select: S,
    request: PageRequest,
) -> Result<Page<<S::Selector as SelectorTrait>::Item>, DbErr>
where
    C: ConnectionTrait,
    S: PaginatorTrait<'db, C>,
{
    let paginator = select.paginate(db, PAGINATE_BY);
    let count = paginator.num_items().await?;
    let pages = Paginator::new(count, PAGINATE_BY);
    let number = pages.page_number(request);
    debug!("Fetching page {} of {} ({} items)", number, pages.num_pages(), count);

    let items = paginator.fetch_page(number - 1).await?;
    Ok(Page {
        items,
        info: pages.page_info(number),
    })
}
