//! Invoice creation from stored timesheets down to the archived file.

mod support;

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use kimai_core::{FixedClock, InvoiceService};
use kimai_domain::query::{ExportFilter, TimesheetQuery, UserFilter};
use kimai_domain::{InvoiceConfig, InvoiceQuery, InvoiceTemplate, LocaleConfig};
use kimai_infra::{default_renderers, FilesystemDocumentStore};
use support::{finished, seed, Seeded, TestDatabase};

struct Pipeline {
    db: TestDatabase,
    seeded: Seeded,
    service: InvoiceService,
    template: InvoiceTemplate,
}

async fn pipeline() -> Pipeline {
    let db = TestDatabase::new();
    let seeded = seed(&db).await;

    let begin = Utc.with_ymd_and_hms(2024, 5, 6, 7, 0, 0).unwrap();
    db.repos.timesheets.create(finished(&seeded, &seeded.user, begin, 3600, 100.0)).await.unwrap();

    let mut template = InvoiceTemplate::new("Monthly", "default");
    template.vat = 19.0;
    template.title = "Invoice".into();
    let template = db.repos.invoice_templates.create(template).await.unwrap();

    let documents = FilesystemDocumentStore::new(
        db.dir.path().join("documents"),
        db.dir.path().join("archive"),
    );
    let service = InvoiceService::new(
        db.repos.clone(),
        Arc::new(documents),
        default_renderers(&LocaleConfig::default()),
        InvoiceConfig::default(),
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap())),
    );

    Pipeline { db, seeded, service, template }
}

fn query(p: &Pipeline) -> InvoiceQuery {
    let begin = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    InvoiceQuery {
        customer: Some(p.seeded.customer.id),
        template: Some(p.template.id),
        begin: Some(begin),
        end: Some(begin + Duration::days(30)),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn json_preview_contains_totals() {
    let p = pipeline().await;

    let rendered = p.service.render(&p.seeded.admin, &query(&p), Some("export")).await.unwrap();
    assert_eq!(rendered.extension, "json");

    let json: serde_json::Value = serde_json::from_slice(&rendered.content).unwrap();
    assert_eq!(json["invoice.total_plain"], "119.00");
    assert_eq!(json["customer.name"], "ACME Corp");
    assert_eq!(json["entries"].as_array().map(Vec::len), Some(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn created_invoice_is_archived_and_exported() {
    let p = pipeline().await;
    let mut query = query(&p);
    query.mark_as_exported = true;

    let invoice = p.service.create_invoice(&p.seeded.admin, &query, None).await.unwrap();
    assert_eq!(invoice.filename, format!("{}-ACME_Corp.txt", invoice.invoice_number));
    assert!((invoice.total - 119.0).abs() < 1e-9);

    let archived = p.db.dir.path().join("archive").join(&invoice.filename);
    let content = std::fs::read_to_string(archived).expect("archived invoice");
    assert!(content.contains(&invoice.invoice_number));
    assert!(content.contains("ACME Corp"));

    let exported = TimesheetQuery {
        user: UserFilter::All,
        exported: ExportFilter::Exported,
        ..Default::default()
    };
    assert_eq!(p.db.repos.timesheets.list(&exported).await.unwrap().total, 1);

    let customer = p.db.repos.customers.find(p.seeded.customer.id).await.unwrap().unwrap();
    assert_eq!(customer.invoice_template_id, Some(p.template.id));

    p.service.delete_invoice(&p.seeded.admin, invoice.id).await.unwrap();
    assert!(!p.db.dir.path().join("archive").join(&invoice.filename).exists());
}
