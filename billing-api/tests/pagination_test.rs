mod common;

use billing_api::models::{Invoice, InvoiceStatus, Payment, PaymentMethod, PaymentStatus};

use common::{dec, TestContext};

#[tokio::test]
async fn customer_listing_pages_in_id_order_without_overlap() {
    let ctx = TestContext::new(true);
    for i in 0..25 {
        ctx.seed_customer(&format!("CUST-{:03}", i)).await;
    }

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;
    loop {
        let page = ctx
            .stores
            .customers
            .list(10, cursor.as_deref())
            .await
            .unwrap();
        pages += 1;
        seen.extend(page.items.iter().map(|c| c.id.clone()));
        cursor = page.next_cursor;
        if cursor.is_none() {
            break;
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 25);
    let mut sorted = seen.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(seen, sorted);
}

#[tokio::test]
async fn invoice_listing_filters_by_customer() {
    let ctx = TestContext::new(true);
    for i in 0..6 {
        let customer_id = if i % 2 == 0 { "CUST-A" } else { "CUST-B" };
        let invoice = Invoice {
            id: format!("INV-{:03}", i),
            customer_id: customer_id.to_string(),
            amount: dec("10"),
            due_date: common::base_time(),
            payment_status: InvoiceStatus::Pending,
            payment_date: None,
        };
        ctx.stores.invoices.put(&invoice).await.unwrap();
    }

    let page = ctx
        .stores
        .invoices
        .list(Some("CUST-A"), 10, None)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.items.iter().all(|i| i.customer_id == "CUST-A"));
}

#[tokio::test]
async fn payment_listing_filters_by_status_across_pages() {
    let ctx = TestContext::new(true);
    for i in 0..30 {
        let status = if i % 3 == 0 {
            PaymentStatus::Failed
        } else {
            PaymentStatus::Success
        };
        let payment = Payment {
            id: format!("PAY-{:03}", i),
            invoice_id: format!("INV-{:03}", i),
            customer_id: format!("CUST-{:03}", i),
            amount: dec("10"),
            payment_method: PaymentMethod::CreditCard,
            payment_date: common::base_time(),
            status,
        };
        ctx.stores.payments.put(&payment).await.unwrap();
    }

    let mut failed = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = ctx
            .stores
            .payments
            .list(Some(PaymentStatus::Failed), 4, cursor.as_deref())
            .await
            .unwrap();
        failed.extend(page.items);
        cursor = page.next_cursor;
        if cursor.is_none() {
            break;
        }
    }

    assert_eq!(failed.len(), 10);
    assert!(failed.iter().all(|p| p.status == PaymentStatus::Failed));
}
