use chrono::NaiveDate;
use pricebook_core::{IntervalInput, IntervalValidationError, RequestError};
use rust_decimal::Decimal;

fn input(start: &str, end: &str, price: &str) -> IntervalInput {
    IntervalInput {
        id: None,
        start_date: Some(start.to_string()),
        end_date: Some(end.to_string()),
        price: Some(price.to_string()),
    }
}

#[test]
fn well_formed_input_becomes_new_interval() {
    let interval = input("2019-01-20", "2019-01-30", "200.5")
        .into_interval()
        .unwrap();

    assert_eq!(interval.id(), None);
    assert_eq!(
        interval.start_date(),
        NaiveDate::from_ymd_opt(2019, 1, 20).unwrap()
    );
    assert_eq!(interval.price(), Decimal::new(2005, 1));
}

#[test]
fn input_with_id_becomes_update() {
    let mut raw = input("2019-01-01", "2019-01-10", "15");
    raw.id = Some("4".to_string());

    assert_eq!(raw.into_interval().unwrap().id(), Some(4));
}

#[test]
fn missing_parameter_is_reported() {
    let mut raw = input("2019-01-01", "2019-01-10", "15");
    raw.price = None;

    let err = raw.into_interval().unwrap_err();
    assert_eq!(err, RequestError::MissingParameters);
    assert_eq!(err.to_string(), "Invalid parameters");
}

#[test]
fn malformed_fields_have_specific_messages() {
    let err = input("01/01/2019", "2019-01-10", "15")
        .into_interval()
        .unwrap_err();
    assert_eq!(err.to_string(), "Start Date has a bad format");

    let err = input("2019-01-01", "2019-13-01", "15")
        .into_interval()
        .unwrap_err();
    assert_eq!(err.to_string(), "End Date has a bad format");

    let err = input("2019-01-01", "2019-01-10", "fifteen")
        .into_interval()
        .unwrap_err();
    assert_eq!(err.to_string(), "Price is not a float number");
}

#[test]
fn entity_rules_surface_as_validation_errors() {
    let err = input("2019-01-10", "2019-01-01", "10")
        .into_interval()
        .unwrap_err();
    assert!(matches!(
        err,
        RequestError::Validation(IntervalValidationError::EndBeforeStart { .. })
    ));

    let err = input("2019-01-01", "2019-01-10", "-1")
        .into_interval()
        .unwrap_err();
    assert_eq!(err.to_string(), "negative price");
}

#[test]
fn input_deserializes_from_camel_case_form_fields() {
    let raw: IntervalInput = serde_json::from_value(serde_json::json!({
        "startDate": "2019-01-01",
        "endDate": "2019-01-03",
        "price": "9.99"
    }))
    .unwrap();

    let interval = raw.into_interval().unwrap();
    assert_eq!(interval.price(), Decimal::new(999, 2));
}

#[test]
fn price_in_exponent_form_is_accepted() {
    let interval = input("2019-01-01", "2019-01-10", "1.5e2")
        .into_interval()
        .unwrap();
    assert_eq!(interval.price(), Decimal::from(150));

    let err = input("2019-01-01", "2019-01-10", "1e")
        .into_interval()
        .unwrap_err();
    assert_eq!(err.to_string(), "Price is not a float number");
}
