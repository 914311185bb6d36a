//! Integration tests for `InvoiceService`

mod support;

use std::sync::Arc;

use kimai_core::InvoiceService;
use kimai_domain::{
    InvoiceConfig, InvoiceQuery, InvoiceStatus, InvoiceTemplate, InvoiceTemplateInput, KimaiError,
};
use support::{at, clock, now, Fixture, MemoryDocuments, SummaryRenderer};

struct Setup {
    fx: Fixture,
    documents: Arc<MemoryDocuments>,
    service: InvoiceService,
    template: InvoiceTemplate,
}

async fn setup() -> Setup {
    let fx = Fixture::new().await;
    let documents = Arc::new(MemoryDocuments::with_built_in("summary.txt", "${invoice.number}"));
    let service = InvoiceService::new(
        fx.repos.clone(),
        documents.clone(),
        vec![Arc::new(SummaryRenderer)],
        InvoiceConfig::default(),
        clock(),
    );
    let mut template = InvoiceTemplate::new("Default", "summary");
    template.vat = 19.0;
    let template = fx.repos.invoice_templates.create(template).await.unwrap();
    Setup { fx, documents, service, template }
}

fn query(setup: &Setup) -> InvoiceQuery {
    InvoiceQuery {
        customer: Some(setup.fx.customer.id),
        template: Some(setup.template.id),
        begin: Some(at(1, 0, 0)),
        end: Some(at(31, 23, 59)),
        ..InvoiceQuery::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn model_requires_a_template() {
    let s = setup().await;
    let mut q = query(&s);
    q.template = None;
    let err = s.service.create_model(&s.fx.admin, &q).await.unwrap_err();
    assert_eq!(err, KimaiError::InvalidInput("Missing template".into()));
}

#[tokio::test(flavor = "multi_thread")]
async fn model_sums_billable_records() {
    let s = setup().await;
    s.fx.memory.insert_timesheet(s.fx.record(s.fx.user.id, at(4, 8, 0), 3600));
    s.fx.memory.insert_timesheet(s.fx.record(s.fx.user.id, at(5, 8, 0), 1800));
    let mut unbillable = s.fx.record(s.fx.user.id, at(6, 8, 0), 3600);
    unbillable.billable = false;
    s.fx.memory.insert_timesheet(unbillable);

    let model = s.service.create_model(&s.fx.admin, &query(&s)).await.unwrap();
    assert_eq!(model.items.len(), 2);
    assert_eq!(model.duration, 5400);
    assert!((model.subtotal - 150.0).abs() < 1e-9);
    assert!((model.tax - 28.5).abs() < 1e-9);
    assert!((model.total - 178.5).abs() < 1e-9);
    assert_eq!(model.invoice_number, "240313");
    assert_eq!(model.due_date, now().date_naive() + chrono::Duration::days(30));
    assert_eq!(model.items[0].project_name, "Website");
}

#[tokio::test(flavor = "multi_thread")]
async fn create_invoice_archives_and_marks_exported() {
    let s = setup().await;
    s.fx.memory.insert_timesheet(s.fx.record(s.fx.user.id, at(4, 8, 0), 3600));
    let mut q = query(&s);
    q.mark_as_exported = true;

    let invoice = s.service.create_invoice(&s.fx.admin, &q, None).await.unwrap();
    assert_eq!(invoice.status, InvoiceStatus::New);
    assert_eq!(invoice.filename, "240313-Acme.txt");
    assert_eq!(s.documents.archived(), vec!["240313-Acme.txt".to_string()]);
    assert!(s.fx.memory.timesheets().iter().all(|t| t.exported));

    let customer = s.fx.repos.customers.find(s.fx.customer.id).await.unwrap().unwrap();
    assert_eq!(customer.invoice_template_id, Some(s.template.id));
}

#[tokio::test(flavor = "multi_thread")]
async fn invoice_numbers_get_a_suffix_when_taken() {
    let s = setup().await;
    s.fx.memory.insert_timesheet(s.fx.record(s.fx.user.id, at(4, 8, 0), 3600));
    s.fx.memory.insert_timesheet(s.fx.record(s.fx.user.id, at(5, 8, 0), 3600));
    let q = query(&s);

    let first = s.service.create_invoice(&s.fx.admin, &q, None).await.unwrap();
    let second = s.service.create_invoice(&s.fx.admin, &q, None).await.unwrap();
    assert_eq!(first.invoice_number, "240313");
    assert_eq!(second.invoice_number, "240313-1");
}

#[tokio::test(flavor = "multi_thread")]
async fn paid_status_sets_payment_date_once() {
    let s = setup().await;
    s.fx.memory.insert_timesheet(s.fx.record(s.fx.user.id, at(4, 8, 0), 3600));
    let invoice = s.service.create_invoice(&s.fx.admin, &query(&s), None).await.unwrap();

    let paid = s.service.change_status(&s.fx.admin, invoice.id, InvoiceStatus::Paid).await.unwrap();
    assert_eq!(paid.payment_date, Some(now()));
    let pending =
        s.service.change_status(&s.fx.admin, invoice.id, InvoiceStatus::Pending).await.unwrap();
    assert_eq!(pending.payment_date, Some(now()));

    s.service.delete_invoice(&s.fx.admin, invoice.id).await.unwrap();
    assert!(s.documents.archived().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn users_cannot_create_invoices() {
    let s = setup().await;
    let err = s.service.create_invoice(&s.fx.user, &query(&s), None).await.unwrap_err();
    assert!(matches!(err, KimaiError::AccessDenied(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn copy_template_finds_a_free_name() {
    let s = setup().await;
    let first = s.service.copy_template(&s.fx.admin, s.template.id).await.unwrap();
    let second = s.service.copy_template(&s.fx.admin, s.template.id).await.unwrap();
    assert_eq!(first.name, "Default (1)");
    assert_eq!(second.name, "Default (2)");
    assert_eq!(second.renderer, "summary");
}

#[tokio::test(flavor = "multi_thread")]
async fn template_names_are_unique() {
    let s = setup().await;
    let input = InvoiceTemplateInput {
        name: Some("Default".into()),
        renderer: Some("summary".into()),
        ..InvoiceTemplateInput::default()
    };
    let err = s.service.create_template(&s.fx.admin, input).await.unwrap_err();
    assert!(matches!(err, KimaiError::Conflict(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn due_days_are_bounded() {
    let s = setup().await;
    let input = InvoiceTemplateInput {
        name: Some("Far future".into()),
        renderer: Some("summary".into()),
        due_days: Some(u32::MAX),
        ..InvoiceTemplateInput::default()
    };
    let err = s.service.create_template(&s.fx.admin, input).await.unwrap_err();
    assert_eq!(err, KimaiError::InvalidInput("Due days must be between 0 and 999".into()));

    let input = InvoiceTemplateInput { due_days: Some(1000), ..InvoiceTemplateInput::default() };
    let err = s.service.update_template(&s.fx.admin, s.template.id, input).await.unwrap_err();
    assert!(matches!(err, KimaiError::InvalidInput(_)));

    let input = InvoiceTemplateInput { due_days: Some(999), ..InvoiceTemplateInput::default() };
    let updated = s.service.update_template(&s.fx.admin, s.template.id, input).await.unwrap();
    assert_eq!(updated.due_days, 999);
}

#[tokio::test(flavor = "multi_thread")]
async fn stored_template_with_unreachable_due_date_is_rejected() {
    let s = setup().await;
    let mut template = s.template.clone();
    template.due_days = u32::MAX;
    s.fx.repos.invoice_templates.update(&template).await.unwrap();

    let err = s.service.create_model(&s.fx.admin, &query(&s)).await.unwrap_err();
    assert_eq!(err, KimaiError::InvalidInput(format!("Invalid due days: {}", u32::MAX)));
}

#[tokio::test(flavor = "multi_thread")]
async fn uploaded_documents_are_sanitised_and_checked() {
    let s = setup().await;
    let doc = s
        .service
        .upload_document(&s.fx.admin, "My Fancy Invoice Template ä.txt", b"${invoice.total}")
        .await
        .unwrap();
    assert_eq!(doc.name, "myfancyinvoicetempla.txt");
    assert!(!doc.built_in);

    let err = s.service.upload_document(&s.fx.admin, "invoice.docx", b"x").await.unwrap_err();
    assert_eq!(err, KimaiError::InvalidInput("Unsupported file extension: docx".into()));
}

#[tokio::test(flavor = "multi_thread")]
async fn document_deletion_rules() {
    let s = setup().await;

    let err = s.service.delete_document(&s.fx.admin, "summary").await.unwrap_err();
    assert_eq!(
        err,
        KimaiError::InvalidInput("Document is built-in and cannot be deleted".into())
    );

    let doc = s.service.upload_document(&s.fx.admin, "custom.txt", b"x").await.unwrap();
    let input = InvoiceTemplateInput {
        name: Some("Custom".into()),
        renderer: Some(doc.id.clone()),
        ..InvoiceTemplateInput::default()
    };
    let template = s.service.create_template(&s.fx.admin, input).await.unwrap();
    let err = s.service.delete_document(&s.fx.admin, &doc.id).await.unwrap_err();
    assert_eq!(err, KimaiError::InvalidInput("Document is used and cannot be deleted".into()));

    s.service.delete_template(&s.fx.admin, template.id).await.unwrap();
    s.service.delete_document(&s.fx.admin, &doc.id).await.unwrap();

    let err = s.service.delete_document(&s.fx.admin, "missing").await.unwrap_err();
    assert!(matches!(err, KimaiError::NotFound(_)));
}
