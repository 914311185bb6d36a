//! Invoice endpoints: archive, rendering, templates and documents

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use chrono_tz::Tz;
use kimai_domain::constants::DEFAULT_PAGE_SIZE;
use kimai_domain::query::InvoiceArchiveQuery;
use kimai_domain::utils::date::{end_of_day, start_of_day};
use kimai_domain::{
    Invoice, InvoiceDocument, InvoiceQuery, InvoiceStatus, InvoiceTemplate, InvoiceTemplateInput,
    KimaiError,
};
use serde::Deserialize;

use crate::commands::timesheets::page_headers;
use crate::context::AppContext;
use crate::http::{ApiError, ApiJson, ApiQuery, ApiResult, CurrentUser};
use crate::utils::execute_logged;

const SURFACE: &str = "http";

/// Invoice run parameters; dates are local days of the current user and
/// default to the current month.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InvoiceRequest {
    pub customer: Option<i64>,
    pub template: Option<i64>,
    pub begin: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub projects: Vec<i64>,
    pub activities: Vec<i64>,
    pub users: Vec<i64>,
    pub mark_as_exported: bool,
    /// Document id, the template's document when missing
    pub document: Option<String>,
}

impl InvoiceRequest {
    fn into_query(self, defaults: InvoiceQuery, tz: Tz) -> InvoiceQuery {
        InvoiceQuery {
            customer: self.customer,
            template: self.template,
            begin: self.begin.map(|day| start_of_day(day, tz)).or(defaults.begin),
            end: self.end.map(|day| end_of_day(day, tz)).or(defaults.end),
            projects: self.projects,
            activities: self.activities,
            users: self.users,
            mark_as_exported: self.mark_as_exported,
        }
    }
}

/// Archive filter; `customers` and `status` are comma separated.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ArchiveParams {
    pub customers: Option<String>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ArchiveParams {
    fn into_query(self) -> kimai_domain::Result<InvoiceArchiveQuery> {
        let customers = split(self.customers.as_deref())
            .map(|id| {
                id.parse::<i64>()
                    .map_err(|_| KimaiError::InvalidInput(format!("Invalid customer: {id}")))
            })
            .collect::<kimai_domain::Result<Vec<_>>>()?;
        let status = split(self.status.as_deref())
            .map(|s| s.parse::<InvoiceStatus>().map_err(KimaiError::InvalidInput))
            .collect::<kimai_domain::Result<Vec<_>>>()?;

        Ok(InvoiceArchiveQuery {
            customers,
            status,
            page: self.page.unwrap_or(1).max(1),
            page_size: self.size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
        })
    }
}

fn split(value: Option<&str>) -> impl Iterator<Item = &str> {
    value.unwrap_or_default().split(',').map(str::trim).filter(|part| !part.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: InvoiceStatus,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub name: String,
}

pub async fn archive(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<ArchiveParams>,
) -> ApiResult<(HeaderMap, Json<Vec<Invoice>>)> {
    let page = execute_logged("invoices::archive", SURFACE, || async {
        let query = params.into_query()?;
        ctx.invoices.list_invoices(&user, &query).await
    })
    .await?;
    Ok((page_headers(&page), Json(page.items)))
}

/// Render the invoice without storing it.
pub async fn preview(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiJson(request): ApiJson<InvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let document = request.document.clone();
    let query = request.into_query(ctx.invoices.default_query(user.tz()), user.tz());
    let rendered = execute_logged("invoices::preview", SURFACE, || {
        ctx.invoices.render(&user, &query, document.as_deref())
    })
    .await?;

    let content_type = HeaderValue::from_str(&rendered.content_type)
        .map_err(|err| ApiError(KimaiError::Internal(err.to_string())))?;
    Ok(([(header::CONTENT_TYPE, content_type)], rendered.content))
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiJson(request): ApiJson<InvoiceRequest>,
) -> ApiResult<Json<Invoice>> {
    let document = request.document.clone();
    let query = request.into_query(ctx.invoices.default_query(user.tz()), user.tz());
    let invoice = execute_logged("invoices::create", SURFACE, || {
        ctx.invoices.create_invoice(&user, &query, document.as_deref())
    })
    .await?;
    Ok(Json(invoice))
}

pub async fn change_status(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(change): ApiJson<StatusChange>,
) -> ApiResult<Json<Invoice>> {
    let invoice = execute_logged("invoices::status", SURFACE, || {
        ctx.invoices.change_status(&user, id, change.status)
    })
    .await?;
    Ok(Json(invoice))
}

pub async fn delete(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    execute_logged("invoices::delete", SURFACE, || ctx.invoices.delete_invoice(&user, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ---- templates ---- */

pub async fn list_templates(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<InvoiceTemplate>>> {
    let templates =
        execute_logged("invoices::templates", SURFACE, || ctx.invoices.list_templates(&user))
            .await?;
    Ok(Json(templates))
}

pub async fn get_template(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<InvoiceTemplate>> {
    let template =
        execute_logged("invoices::template", SURFACE, || ctx.invoices.get_template(&user, id))
            .await?;
    Ok(Json(template))
}

pub async fn create_template(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiJson(input): ApiJson<InvoiceTemplateInput>,
) -> ApiResult<Json<InvoiceTemplate>> {
    let template = execute_logged("invoices::create_template", SURFACE, || {
        ctx.invoices.create_template(&user, input)
    })
    .await?;
    Ok(Json(template))
}

pub async fn update_template(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(input): ApiJson<InvoiceTemplateInput>,
) -> ApiResult<Json<InvoiceTemplate>> {
    let template = execute_logged("invoices::update_template", SURFACE, || {
        ctx.invoices.update_template(&user, id, input)
    })
    .await?;
    Ok(Json(template))
}

pub async fn delete_template(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    execute_logged("invoices::delete_template", SURFACE, || {
        ctx.invoices.delete_template(&user, id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn copy_template(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<InvoiceTemplate>> {
    let template =
        execute_logged("invoices::copy_template", SURFACE, || ctx.invoices.copy_template(&user, id))
            .await?;
    Ok(Json(template))
}

/* ---- documents ---- */

pub async fn list_documents(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<InvoiceDocument>>> {
    let documents =
        execute_logged("invoices::documents", SURFACE, || ctx.invoices.list_documents(&user))
            .await?;
    Ok(Json(documents))
}

/// The raw request body is the file, `?name=` its original file name.
pub async fn upload_document(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    ApiQuery(params): ApiQuery<UploadParams>,
    body: Bytes,
) -> ApiResult<Json<InvoiceDocument>> {
    let document = execute_logged("invoices::upload_document", SURFACE, || {
        ctx.invoices.upload_document(&user, &params.name, &body)
    })
    .await?;
    Ok(Json(document))
}

pub async fn delete_document(
    State(ctx): State<Arc<AppContext>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    execute_logged("invoices::delete_document", SURFACE, || {
        ctx.invoices.delete_document(&user, &id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
