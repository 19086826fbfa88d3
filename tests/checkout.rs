//! Checkout Tests
//!
//! End to end: settings on disk, catalog promotions, cart promotions, taxes.

use std::{io::Write, sync::Arc};

use rusty_money::{Money, iso::GBP};
use tempfile::NamedTempFile;
use testresult::TestResult;
use trellis::{
    checkout::price_order,
    clock::{Clock, FixedClock},
    config::Settings,
    orders::adjustments::AdjustmentKind,
    report::write_order,
};

const SETTINGS: &str = r#"
channel: WEB
currency: GBP

taxation:
  strategy: order_items_based
  default_zone: UK
  rates:
    - code: UK_VAT
      name: VAT
      amount: "20%"
      category: standard
      zone: UK
    - code: UK_SHIPPING_VAT
      name: Shipping VAT
      amount: "20%"
      category: shipping
      zone: UK

taxons:
  - code: clothing
    name: Clothing
    children:
      - code: caps
        name: Caps

products:
  - code: CAP
    name: Cap
    taxons: [caps]
    variants:
      - code: CAP_RED
        name: Red cap
        price: "10.00 GBP"
        tax_category: standard
  - code: MUG
    name: Mug
    taxons: [kitchen]
    variants:
      - code: MUG_BLUE
        name: Blue mug
        price: "5.00 GBP"
        tax_category: standard

catalog_promotions:
  - code: CLOTHING_SALE
    name: Clothing sale
    channels: [WEB]
    scopes:
      - type: for_taxons
        taxons: [clothing]
    actions:
      - type: percentage_discount
        percentage: "20%"

promotions:
  - code: FIRST_ORDER
    name: First order discount
    channels: [WEB]
    rules:
      - type: nth_order
        nth: 1
    actions:
      - type: order_fixed_discount
        amounts:
          WEB: "3.00 GBP"
  - code: FREE_SHIPPING_HALF
    name: Half price shipping
    channels: [WEB]
    coupon_based: true
    coupons:
      - code: SHIPHALF
    actions:
      - type: shipping_percentage_discount
        percentage: "50%"

order:
  number: "000001"
  customer:
    email: new@example.com
  coupon_code: SHIPHALF
  items:
    - variant: CAP_RED
      quantity: 2
    - variant: MUG_BLUE
      quantity: 1
  shipments:
    - method: ups
      charge: "4.00 GBP"
      tax_category: shipping
"#;

fn clock() -> Result<Arc<dyn Clock>, jiff::Error> {
    Ok(Arc::new(FixedClock("2024-06-01T00:00:00Z".parse()?)))
}

fn settings_file(contents: &str) -> Result<NamedTempFile, std::io::Error> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;

    Ok(file)
}

#[test]
fn prices_an_order_end_to_end() -> TestResult {
    let file = settings_file(SETTINGS)?;
    let settings = Settings::from_path(file.path())?;
    let order = price_order(&settings, &clock()?)?;

    // Caps are in a child of the clothing taxon: 10.00 -> 8.00.
    let cap = order.items().first().ok_or("missing cap")?;
    assert_eq!(cap.unit_price(), &Money::from_minor(800, GBP));

    // The mug is outside the clothing taxon and keeps its price.
    let mug = order.items().get(1).ok_or("missing mug")?;
    assert_eq!(mug.unit_price(), &Money::from_minor(500, GBP));

    // Items 1600 + 500 = 2100, less 300 split 229 / 71 by item total.
    assert_eq!(order.adjustments_total_recursively(AdjustmentKind::OrderPromotion), -300);
    assert_eq!(cap.total_minor(), 1371 + 274);
    assert_eq!(mug.total_minor(), 429 + 86);
    assert_eq!(order.items_total_minor(), 1800 + 360);

    // Shipping 400 halved to 200, then taxed at 20%.
    assert_eq!(
        order.adjustments_total_recursively(AdjustmentKind::OrderShippingPromotion),
        -200
    );
    assert_eq!(order.shipping_total_minor(), 240);

    // Items tax: 20% of (1600 - 229) + 20% of (500 - 71) = 274 + 86.
    // Shipping tax: 20% of 200.
    assert_eq!(order.adjustments_total_recursively(AdjustmentKind::Tax), 360 + 40);
    assert_eq!(order.total(), Money::from_minor(1800 + 360 + 240, GBP));
    assert_eq!(
        order.promotions(),
        ["FIRST_ORDER".to_string(), "FREE_SHIPPING_HALF".to_string()]
    );

    Ok(())
}

#[test]
fn returning_customers_miss_the_first_order_promotion() -> TestResult {
    let yaml = SETTINGS.replace(
        "    email: new@example.com",
        "    id: 9\n    email: jo@example.com",
    ) + "history:\n  - email: jo@example.com\n";

    let settings = Settings::from_yaml(&yaml)?;
    let order = price_order(&settings, &clock()?)?;

    assert_eq!(order.promotions(), ["FREE_SHIPPING_HALF".to_string()]);
    assert_eq!(order.adjustments_total_recursively(AdjustmentKind::OrderPromotion), 0);

    Ok(())
}

#[test]
fn report_is_written() -> TestResult {
    let settings = Settings::from_yaml(SETTINGS)?;
    let order = price_order(&settings, &clock()?)?;

    let mut out = Vec::new();
    write_order(&mut out, &order)?;
    let report = String::from_utf8(out)?;

    assert!(report.contains("Red cap"));
    assert!(report.contains("FIRST_ORDER"));

    Ok(())
}

#[test]
fn missing_settings_file_is_an_error() {
    assert!(Settings::from_path("/nonexistent/trellis.yml").is_err());
}
